//! Diagnosis result types.
//!
//! Represents the output of the heart disease prediction path.

use serde::{Deserialize, Serialize};

use super::explain::ContributorList;

/// Binary class predicted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// No heart disease (dataset severity 0)
    Negative,
    /// Heart disease present (dataset severity 1-4)
    Positive,
}

impl Label {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    /// Interpret a class index produced by a classifier.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Raw classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,

    /// Estimated probability of `Label::Positive` (0.0 to 1.0)
    pub probability: f64,
}

/// Response of the prediction path, serialized as-is to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub prediction: u8,

    /// Probability of class 1
    pub probability: f64,

    /// Display names of up to three contributing factors
    pub contributors: Vec<String>,
}

impl Diagnosis {
    #[must_use]
    pub fn new(prediction: Prediction, contributors: &ContributorList) -> Self {
        Self {
            prediction: prediction.label.as_u8(),
            probability: prediction.probability,
            contributors: contributors.display_names(),
        }
    }
}
