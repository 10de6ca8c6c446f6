//! Feature codec: front-end categorical codes to the clinical encoding.
//!
//! The front-end numbers every categorical option from 0, while the model was
//! trained on the Cleveland dataset's own codes. Three fields differ:
//!
//! | field | external | internal |
//! |-------|----------|----------|
//! | `cp` | 0, 1, 2, 3 | 1, 2, 3, 4 |
//! | `slope` | 0, 1, 2 | 1, 2, 3 |
//! | `thal` | 0, 1, 2 | 3, 6, 7 |
//!
//! All other fields pass through unchanged.

use serde_json::Value;

use super::features::{ClinicalFeatures, FeatureId, FEATURE_COUNT};

/// Errors raised while turning a client payload into a feature record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' is not a finite number: {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("Field '{field}' value {value} is outside its categorical domain {domain}")]
    OutOfDomain {
        field: &'static str,
        value: f64,
        domain: &'static str,
    },
}

/// A client record on the external (front-end) encoding.
///
/// Values are held in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalRecord {
    values: [f64; FEATURE_COUNT],
}

impl ExternalRecord {
    /// Build a record from values already in canonical order.
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Raw external value of a field.
    #[must_use]
    pub fn get(&self, feature: FeatureId) -> f64 {
        self.values[feature.index()]
    }

    /// Parse a raw request body.
    ///
    /// # Errors
    /// Returns `ValidationError` if the body is not JSON or any field is invalid.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Extract all 13 fields from a JSON object.
    ///
    /// Each field may be a JSON number or a numeric string (HTML forms submit
    /// strings). Extra keys are ignored.
    ///
    /// # Errors
    /// Returns `ValidationError` on the first missing or non-numeric field.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let mut values = [0.0; FEATURE_COUNT];
        for feature in FeatureId::ALL {
            let field = feature.key();
            let raw = match object.get(field) {
                None | Some(Value::Null) => return Err(ValidationError::MissingField(field)),
                Some(v) => v,
            };
            values[feature.index()] = parse_number(field, raw)?;
        }

        Ok(Self { values })
    }
}

fn parse_number(field: &'static str, raw: &Value) -> Result<f64, ValidationError> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        }),
    }
}

/// What a table does with a code that has no explicit entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    /// Add a fixed offset to the external code.
    Offset(f64),
    /// Map to a fixed internal code.
    Constant(f64),
}

/// Static remap table for one categorical field.
#[derive(Debug)]
pub struct CategoryTable {
    pub feature: FeatureId,
    /// Documented external codes, for error messages.
    pub domain: &'static str,
    /// `(external, internal)` pairs.
    pub entries: &'static [(f64, f64)],
    pub fallback: Fallback,
}

/// Result of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapped {
    pub value: f64,
    /// False when the fallback entry was used.
    pub in_domain: bool,
}

impl CategoryTable {
    /// Map an external code to the internal encoding.
    #[must_use]
    pub fn map(&self, external: f64) -> Mapped {
        if let Some(&(_, internal)) = self.entries.iter().find(|(code, _)| *code == external) {
            return Mapped {
                value: internal,
                in_domain: true,
            };
        }

        let value = match self.fallback {
            Fallback::Offset(offset) => external + offset,
            Fallback::Constant(c) => c,
        };
        Mapped {
            value,
            in_domain: false,
        }
    }
}

pub static CHEST_PAIN_TABLE: CategoryTable = CategoryTable {
    feature: FeatureId::ChestPain,
    domain: "{0, 1, 2, 3}",
    entries: &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0)],
    fallback: Fallback::Offset(1.0),
};

pub static SLOPE_TABLE: CategoryTable = CategoryTable {
    feature: FeatureId::Slope,
    domain: "{0, 1, 2}",
    entries: &[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)],
    fallback: Fallback::Offset(1.0),
};

/// 3 = normal, 6 = fixed defect, 7 = reversible defect.
pub static THALASSEMIA_TABLE: CategoryTable = CategoryTable {
    feature: FeatureId::Thalassemia,
    domain: "{0, 1, 2}",
    entries: &[(0.0, 3.0), (1.0, 6.0), (2.0, 7.0)],
    fallback: Fallback::Constant(7.0),
};

/// Every categorical field that needs remapping.
pub static CATEGORY_TABLES: [&CategoryTable; 3] =
    [&CHEST_PAIN_TABLE, &SLOPE_TABLE, &THALASSEMIA_TABLE];

/// How to treat categorical codes outside the documented domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryPolicy {
    /// Apply the table's fallback and log a warning.
    #[default]
    Lenient,
    /// Reject the record.
    Strict,
}

/// Converts external records into the model's feature encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureCodec {
    policy: CategoryPolicy,
}

impl FeatureCodec {
    #[must_use]
    pub fn new(policy: CategoryPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Encode a record. Pure: the same input always yields the same output.
    ///
    /// # Errors
    /// Returns `ValidationError::OutOfDomain` under `CategoryPolicy::Strict`.
    pub fn encode(&self, record: &ExternalRecord) -> Result<ClinicalFeatures, ValidationError> {
        let mut values = record.values;

        for table in CATEGORY_TABLES {
            let idx = table.feature.index();
            let external = values[idx];
            let mapped = table.map(external);

            if !mapped.in_domain {
                match self.policy {
                    CategoryPolicy::Strict => {
                        return Err(ValidationError::OutOfDomain {
                            field: table.feature.key(),
                            value: external,
                            domain: table.domain,
                        });
                    }
                    CategoryPolicy::Lenient => tracing::warn!(
                        field = table.feature.key(),
                        external,
                        mapped = mapped.value,
                        "Categorical code outside documented domain, using fallback mapping"
                    ),
                }
            }

            values[idx] = mapped.value;
        }

        Ok(ClinicalFeatures::from_array(values))
    }
}
