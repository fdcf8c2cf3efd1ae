#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum RiskLevel {
    #[strum(serialize = "HIGH RISK")]
    High,
    #[strum(serialize = "MED RISK")]
    Medium,
    #[strum(serialize = "SAFE")]
    Safe,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> RiskLevel {
        if score >= 100.0 {
            return RiskLevel::High;
        }
        if score >= 20.0 {
            return RiskLevel::Medium;
        }

        return RiskLevel::Safe;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    pub created_at: String,
}

impl Document {
    /// Documents still being processed server side have no score yet.
    pub fn risk_level(&self) -> Option<RiskLevel> {
        return self.risk_score.map(RiskLevel::from_score);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    pub document_id: String,
    #[serde(default)]
    pub status: String,
}
