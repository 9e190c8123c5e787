use caos_runtime::VmConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Loopback script listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_host: String,
    /// First port tried; the listener takes the first free one up to `last_port`.
    pub first_port: u16,
    pub last_port: u16,
    /// A request is complete once the received bytes end with this.
    pub terminator: String,
    pub max_request_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            first_port: 20001,
            last_port: 20049,
            terminator: "rscr\n".to_string(),
            max_request_bytes: 1 << 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vm: VmConfig,
    pub network: NetworkConfig,
}

impl EngineConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let network = &self.network;
        if network.first_port > network.last_port {
            return Err(ConfigError::Invalid(format!(
                "port range {}..={} is empty",
                network.first_port, network.last_port
            )));
        }
        if network.terminator.is_empty() {
            return Err(ConfigError::Invalid("terminator must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caos_runtime::ErrorPolicy;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.network.first_port, 20001);
        assert_eq!(config.network.last_port, 20049);
        assert_eq!(config.network.terminator, "rscr\n");
        assert_eq!(config.vm.error_policy, ErrorPolicy::AbortScript);
    }

    #[test]
    fn test_nested_overrides() {
        let json = r#"{
            "vm": { "error_policy": "continue_script", "rng_seed": 9 },
            "network": { "first_port": 30000, "last_port": 30010 }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.vm.error_policy, ErrorPolicy::ContinueScript);
        assert_eq!(config.vm.rng_seed, Some(9));
        assert_eq!(config.network.first_port, 30000);
        assert_eq!(config.network.bind_host, "127.0.0.1");
    }

    #[test]
    fn test_rejects_empty_port_range() {
        let json = r#"{"network": {"first_port": 5, "last_port": 4}}"#;
        let err = EngineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(EngineConfig::from_json_str("{"), Err(ConfigError::Json(_))));
    }
}
