//! Analysis Report Models
//!
//! The structured gemstone assessment returned by the model. Field names on
//! the wire are camelCase and every field is required; unknown extra fields
//! are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Lowest confidence rendered as "High"
const HIGH_CONFIDENCE: f64 = 80.0;
/// Lowest confidence rendered as "Moderate"
const MODERATE_CONFIDENCE: f64 = 50.0;

/// Complete assessment of one specimen photograph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub identification: Identification,
    pub visual_evaluation: VisualEvaluation,
    pub valuation: Valuation,
    /// Follow-up laboratory tests (RI, UV fluorescence, ...)
    pub recommendations: Vec<String>,
    /// Disclaimers, including image-quality caveats
    pub warnings: Vec<String>,
}

/// What the stone most likely is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// Most likely species or variety
    pub primary: String,
    /// Likely geographic or synthetic origin
    pub origin: String,
    /// Confidence score, 0-100, kept as the model wrote it (`82` stays `82`)
    pub confidence: Number,
    /// Visual features supporting the identification
    pub features: Vec<String>,
    /// Materials the stone could be confused with
    pub simulants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEvaluation {
    pub color: String,
    pub clarity: String,
    pub cut: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    /// Free-text per-carat price range (USD)
    pub price_range: String,
    /// Free-text description of what drives the price
    pub factors: String,
}

impl Identification {
    /// Confidence as a float for comparisons
    pub fn confidence_value(&self) -> f64 {
        self.confidence.as_f64().unwrap_or(f64::NAN)
    }
}

impl AnalysisReport {
    /// Check invariants the provider's schema cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let confidence = self.identification.confidence_value();
        if !(0.0..=100.0).contains(&confidence) {
            return Err(format!(
                "confidence must be between 0 and 100, got {}",
                self.identification.confidence
            ));
        }

        if self.identification.primary.trim().is_empty() {
            return Err("identification.primary is empty".to_string());
        }

        Ok(())
    }

    /// Coarse label for the confidence score
    pub fn confidence_label(&self) -> &'static str {
        let confidence = self.identification.confidence_value();
        if confidence >= HIGH_CONFIDENCE {
            "High"
        } else if confidence >= MODERATE_CONFIDENCE {
            "Moderate"
        } else {
            "Low"
        }
    }

    /// The first `n` identifying features
    pub fn headline_features(&self, n: usize) -> &[String] {
        let features = &self.identification.features;
        &features[..features.len().min(n)]
    }
}
