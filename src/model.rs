//! Wire contracts shared with the anomaly-detection backend.

use serde::{Deserialize, Serialize};

/// Risk classification attached to a log entry or analysis result.
///
/// The backend emits exactly these two labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Safe,
    Critical,
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLabel::Safe => write!(f, "Safe"),
            RiskLabel::Critical => write!(f, "Critical"),
        }
    }
}

/// One activity record as returned by `GET /logs/`, newest-first.
///
/// `timestamp` is kept as the raw wire string: the backend serializes it
/// without a zone marker, and a malformed value must degrade to an
/// "invalid time" label in the one affected row rather than failing the
/// whole response decode. Parsing happens at derive time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub activity_type: String,
    pub timestamp: String,
    #[serde(default)]
    pub hour_of_day: f64,
    pub value_metric: f64,
    pub is_anomaly: bool,
    // The log endpoint calls this field `risk_score`; the analyze endpoint
    // calls the same label `risk_level`. One canonical field, both wire
    // names accepted.
    #[serde(rename = "risk_score", alias = "risk_level")]
    pub risk: RiskLabel,
}

/// A synthetic activity record submitted to `POST /analyze/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub user_id: String,
    pub activity_type: String,
    pub hour_of_day: f64,
    pub value_metric: f64,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            user_id: "user_123".to_string(),
            activity_type: "login".to_string(),
            hour_of_day: 14.5,
            value_metric: 500.0,
        }
    }
}

impl AnalysisRequest {
    /// Numeric coercion before the POST: a non-finite value becomes 0.0.
    /// Nothing here blocks a submission.
    pub fn sanitized(mut self) -> Self {
        if !self.hour_of_day.is_finite() {
            self.hour_of_day = 0.0;
        }
        if !self.value_metric.is_finite() {
            self.value_metric = 0.0;
        }
        self
    }
}

/// Verdict returned by `POST /analyze/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_anomaly: bool,
    #[serde(rename = "risk_level", alias = "risk_score")]
    pub risk: RiskLabel,
    #[serde(default)]
    pub message: String,
}

/// Liveness blob from `GET /` on the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ai: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_decodes_risk_score() {
        let json = r#"{
            "id": 7,
            "user_id": "user_123",
            "activity_type": "login",
            "timestamp": "2026-08-06T10:15:00.123456",
            "hour_of_day": 10.25,
            "value_metric": 512.0,
            "is_anomaly": false,
            "risk_score": "Safe"
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, 7);
        assert_eq!(entry.risk, RiskLabel::Safe);
        assert!(!entry.is_anomaly);
    }

    #[test]
    fn test_log_entry_accepts_risk_level_alias() {
        // Some backend builds name the field risk_level instead.
        let json = r#"{
            "id": 1,
            "user_id": "u",
            "timestamp": "",
            "value_metric": 1.0,
            "is_anomaly": true,
            "risk_level": "Critical"
        }"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.risk, RiskLabel::Critical);
        assert_eq!(entry.activity_type, "");
    }

    #[test]
    fn test_analysis_result_decodes_risk_level() {
        let json = r#"{"is_anomaly": true, "risk_level": "Critical", "message": "Suspicious activity detected!"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.risk, RiskLabel::Critical);
        assert_eq!(result.message, "Suspicious activity detected!");
    }

    #[test]
    fn test_analysis_request_defaults_match_simulator_form() {
        let req = AnalysisRequest::default();
        assert_eq!(req.user_id, "user_123");
        assert_eq!(req.activity_type, "login");
        assert_eq!(req.hour_of_day, 14.5);
        assert_eq!(req.value_metric, 500.0);
    }

    #[test]
    fn test_sanitized_coerces_non_finite_to_zero() {
        let req = AnalysisRequest {
            hour_of_day: f64::NAN,
            value_metric: f64::INFINITY,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(req.hour_of_day, 0.0);
        assert_eq!(req.value_metric, 0.0);
    }

    #[test]
    fn test_request_serializes_all_fields() {
        let json = serde_json::to_value(AnalysisRequest::default()).unwrap();
        assert_eq!(json["user_id"], "user_123");
        assert_eq!(json["activity_type"], "login");
        assert_eq!(json["hour_of_day"], 14.5);
        assert_eq!(json["value_metric"], 500.0);
    }
}
