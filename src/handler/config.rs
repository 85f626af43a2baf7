use std::fmt;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_TOPIC: &str = "メキシコ";
const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 2500;
const DEFAULT_RESPONSE_TYPE: &str = "in_channel";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration, loaded once at cold start.
#[derive(Clone)]
pub struct Config {
    pub slack_signing_secret: String,
    pub search_api_key: String,
    pub search_engine_id: String,
    /// Prefixed to every user query
    pub search_topic: String,
    pub search_endpoint: String,
    pub search_timeout: Duration,
    pub response_type: String,
    /// `None` leaves `unfurl_links` out of the message entirely
    pub unfurl_links: Option<bool>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("slack_signing_secret", &"<redacted>")
            .field("search_api_key", &"<redacted>")
            .field("search_engine_id", &self.search_engine_id)
            .field("search_topic", &self.search_topic)
            .field("search_endpoint", &self.search_endpoint)
            .field("search_timeout", &self.search_timeout)
            .field("response_type", &self.response_type)
            .field("unfurl_links", &self.unfurl_links)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let search_timeout = match lookup("SEARCH_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid {
                    name: "SEARCH_TIMEOUT_MS",
                    value: raw,
                })?,
            None => Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
        };

        let response_type = match lookup("SLACK_RESPONSE_TYPE") {
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                if !matches!(trimmed.as_str(), "in_channel" | "ephemeral") {
                    return Err(ConfigError::Invalid {
                        name: "SLACK_RESPONSE_TYPE",
                        value: raw,
                    });
                }
                trimmed
            }
            None => DEFAULT_RESPONSE_TYPE.to_string(),
        };

        let unfurl_links = match lookup("SLACK_UNFURL_LINKS") {
            Some(raw) => parse_unfurl_links(&raw).ok_or(ConfigError::Invalid {
                name: "SLACK_UNFURL_LINKS",
                value: raw,
            })?,
            None => Some(false),
        };

        Ok(Config {
            slack_signing_secret: required("SLACK_SIGNING_SECRET")?,
            search_api_key: required("SEARCH_API_KEY")?,
            search_engine_id: required("SEARCH_ID")?,
            search_topic: lookup("SEARCH_TOPIC")
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            search_endpoint: lookup("SEARCH_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            search_timeout,
            response_type,
            unfurl_links,
        })
    }
}

fn parse_unfurl_links(raw: &str) -> Option<Option<bool>> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Some(Some(true)),
        "false" | "0" => Some(Some(false)),
        "omit" => Some(None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SLACK_SIGNING_SECRET", "shh"),
        ("SEARCH_API_KEY", "api-key"),
        ("SEARCH_ID", "cx-id"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.slack_signing_secret, "shh");
        assert_eq!(config.search_api_key, "api-key");
        assert_eq!(config.search_engine_id, "cx-id");
        assert_eq!(config.search_topic, "メキシコ");
        assert_eq!(config.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(config.search_timeout, Duration::from_millis(2500));
        assert_eq!(config.response_type, "in_channel");
        assert_eq!(config.unfurl_links, Some(false));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SLACK_SIGNING_SECRET")));

        let mut vars = REQUIRED.to_vec();
        vars[2] = ("SEARCH_ID", "  ");
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SEARCH_ID")));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SEARCH_TOPIC", "Oaxaca"),
            ("SEARCH_TIMEOUT_MS", "900"),
            ("SLACK_RESPONSE_TYPE", "ephemeral"),
            ("SLACK_UNFURL_LINKS", "omit"),
        ]);
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.search_topic, "Oaxaca");
        assert_eq!(config.search_timeout, Duration::from_millis(900));
        assert_eq!(config.response_type, "ephemeral");
        assert_eq!(config.unfurl_links, None);
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("SEARCH_TIMEOUT_MS", "soon"),
            ("SEARCH_TIMEOUT_MS", "0"),
            ("SLACK_RESPONSE_TYPE", "broadcast"),
            ("SLACK_UNFURL_LINKS", "maybe"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.push((name, value));
            match Config::from_lookup(lookup_from(&vars)) {
                Err(ConfigError::Invalid { name: n, .. }) => assert_eq!(n, name),
                other => panic!("expected invalid {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("shh"));
        assert!(!debug.contains("api-key"));
        assert!(debug.contains("cx-id"));
    }
}
