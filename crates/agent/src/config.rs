//! Agent runtime configuration

use serde::{Deserialize, Serialize};

use crate::escalation::EscalationConfig;

/// Tunables for the turn engine. Deserialized from the deployment's
/// settings file; every field has a working default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard cap on turns per call, for demo lines. 0 disables.
    pub max_turns: u32,
    pub escalation: EscalationConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 0,
            escalation: EscalationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: AgentConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_turns, 0);
        assert_eq!(config.escalation.failure_threshold, 3);
        assert!(config.escalation.transfer_number.is_none());
    }

    #[test]
    fn test_partial_override() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"max_turns": 40, "escalation": {"transfer_number": "+15550123"}}"#,
        )
        .unwrap();
        assert_eq!(config.max_turns, 40);
        assert_eq!(config.escalation.transfer_number.as_deref(), Some("+15550123"));
        assert_eq!(config.escalation.failure_threshold, 3);
        assert!(!config.escalation.emergency_keywords.is_empty());
    }
}
