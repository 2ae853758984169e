use serde::{Deserialize, Serialize};

/// Flat per-trial record handed to the persistence collaborator.
///
/// Optional fields are absent rather than sentinel-valued: `rt_ms` on
/// response timeouts, `probe_resp`/`probe_rt_ms` on non-probe trials, and
/// the task-specific columns of the other task variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub block_num: usize,
    pub trial_num: usize,
    pub practicing: bool,
    pub stimulus: String,
    /// No-go digit (go/no-go task only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Whether this trial was an n-back target (n-back task only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_target: Option<bool>,
    /// Lag depth of the block (n-back task only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nback: Option<u8>,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt_ms: Option<f64>,
    pub accuracy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_resp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_rt_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_from_the_serialized_record() {
        let record = TrialRecord {
            block_num: 3,
            trial_num: 7,
            practicing: false,
            stimulus: "5".to_string(),
            target: Some("3".to_string()),
            is_target: None,
            nback: None,
            response: "go".to_string(),
            rt_ms: Some(412.5),
            accuracy: true,
            probe_resp: None,
            probe_rt_ms: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"rt_ms\":412.5"));
        assert!(!json.contains("probe_resp"));
        assert!(!json.contains("is_target"));

        let back: TrialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
