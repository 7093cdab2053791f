use serde::{Deserialize, Serialize};

use crate::error::BusError;

fn default_client_id_prefix() -> String {
    "beltline-sub".to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_request_capacity() -> usize {
    10
}

/// Broker connection settings. Read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    /// Subscription filter, e.g. `IOT252/#`.
    pub topic: String,
    /// A random UUID is appended to form the client id.
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Bound on outgoing client requests queued for the event loop.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

impl BusConfig {
    pub fn new(host: &str, port: u16, topic: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            topic: topic.to_string(),
            client_id_prefix: default_client_id_prefix(),
            keep_alive_secs: default_keep_alive_secs(),
            request_capacity: default_request_capacity(),
        }
    }

    /// A fresh, unique client id: `<prefix>-<uuid v4>`.
    pub fn client_id(&self) -> String {
        format!("{}-{}", self.client_id_prefix, uuid::Uuid::new_v4())
    }

    pub fn validate(&self) -> Result<(), BusError> {
        if self.host.trim().is_empty() {
            return Err(BusError::Config("host is empty".into()));
        }
        if self.port == 0 {
            return Err(BusError::Config("port is 0".into()));
        }
        if self.topic.trim().is_empty() {
            return Err(BusError::Config("topic is empty".into()));
        }
        if self.keep_alive_secs == 0 {
            return Err(BusError::Config("keep_alive_secs is 0".into()));
        }
        if self.request_capacity == 0 {
            return Err(BusError::Config("request_capacity is 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_are_unique_and_prefixed() {
        let config = BusConfig::new("10.116.116.20", 7000, "IOT252/#");
        let a = config.client_id();
        let b = config.client_id();
        assert!(a.starts_with("beltline-sub-"));
        assert_ne!(a, b);
        assert_eq!(a.len(), "beltline-sub-".len() + 36);
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config: BusConfig =
            serde_json::from_str(r#"{"host":"broker","port":1883,"topic":"a/#"}"#).unwrap();
        assert_eq!(config, BusConfig::new("broker", 1883, "a/#"));
        assert_eq!(config.keep_alive_secs, 30);
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        let ok = BusConfig::new("broker", 1883, "a/#");
        assert!(ok.validate().is_ok());

        for bad in [
            BusConfig { host: " ".into(), ..ok.clone() },
            BusConfig { port: 0, ..ok.clone() },
            BusConfig { topic: String::new(), ..ok.clone() },
            BusConfig { keep_alive_secs: 0, ..ok.clone() },
            BusConfig { request_capacity: 0, ..ok.clone() },
        ] {
            assert!(matches!(bad.validate(), Err(BusError::Config(_))), "{bad:?}");
        }
    }
}
