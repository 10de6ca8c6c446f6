//! Clinical feature record for heart disease prediction.
//!
//! Based on the UCI Cleveland heart disease dataset (13 attributes + target).
//! Values here are always on the *internal* (clinical) scale: categorical
//! fields use the dataset's own codes, not the front-end's 0-based codes.

use serde::{Deserialize, Serialize};

/// Number of clinical features consumed by the classifier.
pub const FEATURE_COUNT: usize = 13;

/// Identifier of one clinical feature, in canonical model order.
///
/// The discriminant is the column position in the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    Age = 0,
    Sex = 1,
    ChestPain = 2,
    RestingBloodPressure = 3,
    Cholesterol = 4,
    FastingBloodSugar = 5,
    RestingEcg = 6,
    MaxHeartRate = 7,
    ExerciseAngina = 8,
    StDepression = 9,
    Slope = 10,
    MajorVessels = 11,
    Thalassemia = 12,
}

impl FeatureId {
    /// All features in canonical order.
    pub const ALL: [FeatureId; FEATURE_COUNT] = [
        Self::Age,
        Self::Sex,
        Self::ChestPain,
        Self::RestingBloodPressure,
        Self::Cholesterol,
        Self::FastingBloodSugar,
        Self::RestingEcg,
        Self::MaxHeartRate,
        Self::ExerciseAngina,
        Self::StDepression,
        Self::Slope,
        Self::MajorVessels,
        Self::Thalassemia,
    ];

    /// Column position in the feature vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Dataset column name, also the JSON key used by clients.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sex => "sex",
            Self::ChestPain => "cp",
            Self::RestingBloodPressure => "trestbps",
            Self::Cholesterol => "chol",
            Self::FastingBloodSugar => "fbs",
            Self::RestingEcg => "restecg",
            Self::MaxHeartRate => "thalach",
            Self::ExerciseAngina => "exang",
            Self::StDepression => "oldpeak",
            Self::Slope => "slope",
            Self::MajorVessels => "ca",
            Self::Thalassemia => "thal",
        }
    }

    /// Human-readable name surfaced as a contributing factor.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::Sex => "Sex",
            Self::ChestPain => "Chest Pain",
            Self::RestingBloodPressure => "Blood Pressure",
            Self::Cholesterol => "Cholesterol",
            Self::FastingBloodSugar => "Fasting Blood Sugar",
            Self::RestingEcg => "ECG Result",
            Self::MaxHeartRate => "Max Heart Rate",
            Self::ExerciseAngina => "Exercise Angina",
            Self::StDepression => "ST Depression",
            Self::Slope => "Slope",
            Self::MajorVessels => "Major Vessels",
            Self::Thalassemia => "Thalassemia",
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Dataset column names in canonical order.
#[must_use]
pub fn feature_names() -> Vec<String> {
    FeatureId::ALL.iter().map(|f| f.key().to_string()).collect()
}

/// One patient's clinical features on the internal encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalFeatures {
    /// Age in years
    pub age: f64,

    /// 1 = male, 0 = female
    pub sex: f64,

    /// Chest pain type: 1 typical angina, 2 atypical, 3 non-anginal, 4 asymptomatic
    pub chest_pain: f64,

    /// Resting blood pressure in mmHg
    pub resting_bp: f64,

    /// Serum cholesterol in mg/dL
    pub cholesterol: f64,

    /// Fasting blood sugar > 120 mg/dL: 1 = true, 0 = false
    pub fasting_blood_sugar: f64,

    /// Resting ECG: 0 normal, 1 ST-T abnormality, 2 left ventricular hypertrophy
    pub resting_ecg: f64,

    /// Maximum heart rate achieved
    pub max_heart_rate: f64,

    /// Exercise induced angina: 1 = yes, 0 = no
    pub exercise_angina: f64,

    /// ST depression induced by exercise relative to rest
    pub st_depression: f64,

    /// Slope of the peak exercise ST segment: 1 up, 2 flat, 3 down
    pub slope: f64,

    /// Number of major vessels (0-3) colored by fluoroscopy
    pub major_vessels: f64,

    /// Thalassemia: 3 normal, 6 fixed defect, 7 reversible defect
    pub thalassemia: f64,
}

impl ClinicalFeatures {
    /// Value of a single feature.
    #[must_use]
    pub fn get(&self, feature: FeatureId) -> f64 {
        match feature {
            FeatureId::Age => self.age,
            FeatureId::Sex => self.sex,
            FeatureId::ChestPain => self.chest_pain,
            FeatureId::RestingBloodPressure => self.resting_bp,
            FeatureId::Cholesterol => self.cholesterol,
            FeatureId::FastingBloodSugar => self.fasting_blood_sugar,
            FeatureId::RestingEcg => self.resting_ecg,
            FeatureId::MaxHeartRate => self.max_heart_rate,
            FeatureId::ExerciseAngina => self.exercise_angina,
            FeatureId::StDepression => self.st_depression,
            FeatureId::Slope => self.slope,
            FeatureId::MajorVessels => self.major_vessels,
            FeatureId::Thalassemia => self.thalassemia,
        }
    }

    /// Convert features to a vector for ML inference, in canonical order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        FeatureId::ALL.iter().map(|&f| self.get(f)).collect()
    }

    /// Create features from a vector in canonical order.
    ///
    /// # Errors
    /// Returns error if vector length is not 13.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        let values: [f64; FEATURE_COUNT] = v
            .try_into()
            .map_err(|_| format!("Expected {FEATURE_COUNT} features, got {}", v.len()))?;
        Ok(Self::from_array(values))
    }

    /// Create features from a fixed-size array in canonical order.
    #[must_use]
    pub fn from_array(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: v[0],
            sex: v[1],
            chest_pain: v[2],
            resting_bp: v[3],
            cholesterol: v[4],
            fasting_blood_sugar: v[5],
            resting_ecg: v[6],
            max_heart_rate: v[7],
            exercise_angina: v[8],
            st_depression: v[9],
            slope: v[10],
            major_vessels: v[11],
            thalassemia: v[12],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_matches_discriminants() {
        for (i, f) in FeatureId::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert_eq!(feature_names()[2], "cp");
        assert_eq!(feature_names()[12], "thal");
    }

    #[test]
    fn test_vec_roundtrip_preserves_order() {
        let v = vec![63.0, 1.0, 1.0, 145.0, 233.0, 1.0, 2.0, 150.0, 0.0, 2.3, 3.0, 0.0, 6.0];
        let features = ClinicalFeatures::from_vec(&v).expect("Should parse");
        assert!((features.st_depression - 2.3).abs() < f64::EPSILON);
        assert!((features.get(FeatureId::Thalassemia) - 6.0).abs() < f64::EPSILON);
        assert_eq!(features.to_vec(), v);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(ClinicalFeatures::from_vec(&[1.0; 9]).is_err());
    }
}
