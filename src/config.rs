//! Process-wide settings, read once at startup (strict YAML parsing).
//!
//! Nothing here is hot-reloadable: `main` builds a [`Config`], hands the
//! recorder section to the recorder and the writer section to the writer
//! factory, and never looks at it again.

use std::fs;

use serde::Deserialize;

use crate::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub recorder: RecorderConfig,

    #[serde(default)]
    pub writer: WriterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            recorder: RecorderConfig::default(),
            writer: WriterConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(MetricsError::Config(format!(
                "listen must be a socket address, got {:?}",
                self.listen
            )));
        }
        self.recorder.validate()?;
        self.writer.validate()?;
        Ok(())
    }
}

// ─── Recorder ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Measurement every request point is written under.
    #[serde(default = "default_measurement")]
    pub measurement: String,

    /// Value of the `host` tag.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub submit: SubmitMode,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            measurement: default_measurement(),
            host: default_host(),
            submit: SubmitMode::default(),
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.measurement.trim().is_empty() {
            return Err(MetricsError::Config("recorder.measurement must not be empty".into()));
        }
        if self.host.trim().is_empty() {
            return Err(MetricsError::Config("recorder.host must not be empty".into()));
        }
        Ok(())
    }
}

/// Where the writer call runs relative to the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Await the writer before the response leaves the middleware.
    Inline,
    /// Spawn the write onto the runtime and return the response at once.
    #[default]
    Background,
}

// ─── Writer ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriterConfig {
    Http {
        #[serde(default = "default_http_url")]
        url: String,
        #[serde(default = "default_database")]
        database: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    Queue {
        #[serde(default = "default_redis_url")]
        url: String,
        #[serde(default = "default_queue_key")]
        key: String,
    },
    Disabled,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::Http {
            url: default_http_url(),
            database: default_database(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Http { url, database, timeout_ms, .. } => {
                reqwest::Url::parse(url)
                    .map_err(|e| MetricsError::Config(format!("writer.url: {e}")))?;
                if database.trim().is_empty() {
                    return Err(MetricsError::Config("writer.database must not be empty".into()));
                }
                if !(1..=60_000).contains(timeout_ms) {
                    return Err(MetricsError::Config(
                        "writer.timeout_ms must be between 1 and 60000".into(),
                    ));
                }
            }
            Self::Queue { url, key } => {
                redis::Client::open(url.as_str())
                    .map_err(|e| MetricsError::Config(format!("writer.url: {e}")))?;
                if key.trim().is_empty() {
                    return Err(MetricsError::Config("writer.key must not be empty".into()));
                }
            }
            Self::Disabled => {}
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────

pub fn load_from_file(path: &str) -> Result<Config> {
    let s = fs::read_to_string(path)?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_measurement() -> String {
    "django_request".into()
}
fn default_host() -> String {
    "localhost".into()
}
fn default_http_url() -> String {
    "http://127.0.0.1:8086".into()
}
fn default_database() -> String {
    "metrics".into()
}
fn default_timeout_ms() -> u64 {
    2_000
}
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".into()
}
fn default_queue_key() -> String {
    "request_metrics".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_from_str("{}").expect("defaults parse");
        assert_eq!(cfg.listen, "0.0.0.0:3000");
        assert_eq!(cfg.recorder.measurement, "django_request");
        assert_eq!(cfg.recorder.submit, SubmitMode::Background);
        assert!(matches!(cfg.writer, WriterConfig::Http { timeout_ms: 2_000, .. }));
    }

    #[test]
    fn queue_writer_with_custom_host() {
        let cfg = load_from_str(
            r#"
recorder:
  host: web-7
  submit: inline
writer:
  kind: queue
  url: "redis://cache:6379/2"
"#,
        )
        .expect("must parse");
        assert_eq!(cfg.recorder.host, "web-7");
        assert_eq!(cfg.recorder.submit, SubmitMode::Inline);
        match cfg.writer {
            WriterConfig::Queue { key, .. } => assert_eq!(key, "request_metrics"),
            other => panic!("unexpected writer {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_from_str("recorder:\n  hots: web-1\n").expect_err("typo must fail");
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn blank_host_is_rejected() {
        let err = load_from_str("recorder:\n  host: \"  \"\n").expect_err("blank host");
        assert!(err.to_string().contains("recorder.host"));
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        let err = load_from_str("writer:\n  kind: http\n  timeout_ms: 0\n").expect_err("zero timeout");
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn disabled_writer_needs_no_settings() {
        let cfg = load_from_str("writer:\n  kind: disabled\n").expect("must parse");
        assert!(matches!(cfg.writer, WriterConfig::Disabled));
    }
}
