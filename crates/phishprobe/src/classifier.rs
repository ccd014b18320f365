//! Classifier boundary.
//!
//! The trained model lives outside this crate. This module turns a
//! [`FeatureRecord`] into the numeric vector the model was trained on and
//! interprets what comes back.

use crate::error::{ProbeError, Result};
use crate::schema::{Feature, FeatureRecord, FeatureValue};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Label the model assigns to phishing URLs.
pub const PHISHING_LABEL: u8 = 0;

/// TLD to training-set frequency, used to encode the `TLD` feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TldFrequencyTable {
    frequencies: HashMap<String, f64>,
}

impl TldFrequencyTable {
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// Parse a CSV whose first column is the TLD and which has a
    /// `Frequency` column; the header row is required.
    pub fn parse(csv: &str) -> Result<Self> {
        let mut lines = csv.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines.next().ok_or(ProbeError::TldTable {
            line: 1,
            reason: "empty table".into(),
        })?;
        let freq_col = split_row(header)
            .iter()
            .position(|h| h.eq_ignore_ascii_case("frequency"))
            .ok_or(ProbeError::TldTable {
                line: 1,
                reason: "no Frequency column in header".into(),
            })?;
        if freq_col == 0 {
            return Err(ProbeError::TldTable {
                line: 1,
                reason: "first column must hold the TLD".into(),
            });
        }

        let mut frequencies = HashMap::new();
        for (idx, line) in lines {
            let cells = split_row(line);
            let line_no = idx + 1;
            let raw = cells.get(freq_col).ok_or_else(|| ProbeError::TldTable {
                line: line_no,
                reason: format!("expected at least {} columns", freq_col + 1),
            })?;
            let freq: f64 = raw.parse().map_err(|_| ProbeError::TldTable {
                line: line_no,
                reason: format!("frequency {raw:?} is not a number"),
            })?;
            frequencies.insert(cells[0].to_string(), freq);
        }
        Ok(Self { frequencies })
    }

    /// Frequency of `tld`, 0 when unseen.
    pub fn frequency(&self, tld: &str) -> f64 {
        self.frequencies.get(tld).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

fn split_row(line: &str) -> Vec<&str> {
    line.split(',').map(|c| c.trim().trim_matches('"')).collect()
}

/// The required features as numbers, in the classifier's column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub names: Vec<&'static str>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Project a record onto the required features. `TLD` becomes its
    /// frequency; any other non-numeric value becomes 0.
    pub fn project(record: &FeatureRecord, tlds: &TldFrequencyTable) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = Feature::required()
            .map(|feature| {
                let value = match (feature, record.get(feature)) {
                    (Feature::Tld, FeatureValue::Text(tld)) => tlds.frequency(tld),
                    (_, v) => v.as_f64().unwrap_or(0.0),
                };
                (feature.name(), value)
            })
            .unzip();
        Self { names, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.names.iter().copied().zip(self.values.iter().copied())
    }
}

/// Model output for one vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: u8,
    /// Class probabilities indexed by label, when the model provides them.
    pub probabilities: Option<Vec<f64>>,
}

/// A trained model.
pub trait Classifier: Send + Sync {
    fn predict(&self, vector: &FeatureVector) -> anyhow::Result<Prediction>;
}

/// How sure the model is of its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence > 0.75 {
            ConfidenceBand::High
        } else if confidence > 0.5 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    fn word(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Medium => "Medium",
            ConfidenceBand::Low => "Low",
        }
    }
}

/// Human-facing reading of a prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub is_phishing: bool,
    /// Probability of the predicted label; 1.0 without probabilities.
    pub confidence: f64,
    pub band: ConfidenceBand,
    pub phishing_probability: Option<f64>,
    pub legitimate_probability: Option<f64>,
}

impl Verdict {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let is_phishing = prediction.label == PHISHING_LABEL;
        let probs = prediction.probabilities.as_deref().unwrap_or(&[]);
        let phishing = probs.first().copied();
        let legitimate = probs.get(1).copied();
        let confidence = if is_phishing { phishing } else { legitimate }.unwrap_or(1.0);
        Self {
            is_phishing,
            confidence,
            band: ConfidenceBand::of(confidence),
            phishing_probability: phishing,
            legitimate_probability: legitimate,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_phishing {
            "Phishing"
        } else {
            "Legitimate"
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.is_phishing { "Risk" } else { "Confidence" };
        write!(
            f,
            "{} (confidence {:.1}% - {} {suffix})",
            self.label(),
            self.confidence * 100.0,
            self.band.word()
        )
    }
}
