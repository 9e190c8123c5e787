use serde::{Deserialize, Serialize};

/// What a hard error in one opcode does to the rest of the script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the script at the first hard error.
    #[default]
    AbortScript,
    /// Report the error as a diagnostic and carry on with the next command.
    ContinueScript,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub error_policy: ErrorPolicy,
    /// Seed for random picks (`RTAR`); entropy-seeded when absent.
    pub rng_seed: Option<u64>,
    /// Maximum calls, nested queries included, a single run may execute.
    pub instruction_limit: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::AbortScript,
            rng_seed: None,
            instruction_limit: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VmConfig =
            serde_json::from_str(r#"{"error_policy": "continue_script"}"#).unwrap();
        assert_eq!(config.error_policy, ErrorPolicy::ContinueScript);
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.instruction_limit, 100_000);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: VmConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VmConfig::default());
    }
}
