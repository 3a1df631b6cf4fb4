//! Service configuration.
//!
//! # Purpose
//! Reads the intake service configuration from environment variables, with an
//! optional YAML file (named by `INCIDENT_INTAKE_CONFIG`) overriding the
//! non-secret settings.
//!
//! # Notes
//! Credentials are only read from the environment and are wrapped in
//! [`Secret`] so they never show up in `Debug` output or logs.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::jira::JiraSettings;
use crate::dispatch::opsgenie::OpsgenieSettings;

pub const CONFIG_PATH_ENV: &str = "INCIDENT_INTAKE_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

/// A credential value with a redacted `Debug` rendering.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub signing_secret: Secret,
    pub bot_token: Option<Secret>,
    /// Legacy verification token; checked against the payload `token` when set.
    pub verification_token: Option<Secret>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct OpsgenieConfig {
    pub api_key: Option<Secret>,
    pub api_base: String,
}

impl OpsgenieConfig {
    pub fn settings(&self) -> Option<OpsgenieSettings> {
        let api_key = self.api_key.as_ref()?;
        Some(OpsgenieSettings {
            api_base: self.api_base.clone(),
            api_key: api_key.expose().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub server: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<Secret>,
    pub project_key: String,
    pub issue_type: String,
    /// Custom field receiving the incident start time; empty disables it.
    pub start_time_field: Option<String>,
}

impl JiraConfig {
    /// Resolved settings, or `None` unless server, email and key are all set.
    pub fn settings(&self) -> Option<JiraSettings> {
        Some(JiraSettings {
            server: self.server.clone()?,
            email: self.email.clone()?,
            api_key: self.api_key.as_ref()?.expose().to_string(),
            project_key: self.project_key.clone(),
            issue_type: self.issue_type.clone(),
            start_time_field: self.start_time_field.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub slack: SlackConfig,
    /// Replay window for request timestamps; `0` disables the check.
    pub max_timestamp_age_secs: u64,
    pub dispatch_timeout_ms: u64,
    pub opsgenie: OpsgenieConfig,
    pub jira: JiraConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntakeConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage_backend: Option<String>,
    postgres: Option<PostgresOverride>,
    slack_api_base: Option<String>,
    max_timestamp_age_secs: Option<u64>,
    dispatch_timeout_ms: Option<u64>,
    opsgenie_api_base: Option<String>,
    jira_server: Option<String>,
    jira_email: Option<String>,
    jira_project_key: Option<String>,
    jira_issue_type: Option<String>,
    jira_start_time_field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PostgresOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_parse("INCIDENT_INTAKE_BIND", "0.0.0.0:8000")?;
        let metrics_bind = env_parse("INCIDENT_INTAKE_METRICS_BIND", "0.0.0.0:9090")?;
        let storage = env_parse("INCIDENT_INTAKE_STORAGE_BACKEND", "memory")?;
        let postgres = match env_opt("INCIDENT_INTAKE_PG_URL").or_else(|| env_opt("DATABASE_URL"))
        {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("INCIDENT_INTAKE_PG_MAX_CONNECTIONS", "10")?,
                connect_timeout_ms: env_parse("INCIDENT_INTAKE_PG_CONNECT_TIMEOUT_MS", "5000")?,
                acquire_timeout_ms: env_parse("INCIDENT_INTAKE_PG_ACQUIRE_TIMEOUT_MS", "5000")?,
            }),
            None => None,
        };
        let signing_secret = env_opt("SLACK_SIGNING_SECRET")
            .map(Secret::new)
            .context("SLACK_SIGNING_SECRET is required")?;

        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            slack: SlackConfig {
                signing_secret,
                bot_token: env_opt("SLACK_BOT_TOKEN").map(Secret::new),
                verification_token: env_opt("SLACK_VERIFICATION_TOKEN").map(Secret::new),
                api_base: env_or("SLACK_API_BASE", "https://slack.com/api"),
            },
            max_timestamp_age_secs: env_parse("INCIDENT_INTAKE_MAX_TIMESTAMP_AGE_SECS", "300")?,
            dispatch_timeout_ms: env_parse("INCIDENT_INTAKE_DISPATCH_TIMEOUT_MS", "10000")?,
            opsgenie: OpsgenieConfig {
                api_key: env_opt("OPSGENIE_API_KEY").map(Secret::new),
                api_base: env_or("OPSGENIE_API_BASE", "https://api.opsgenie.com"),
            },
            jira: JiraConfig {
                server: env_opt("JIRA_SERVER"),
                email: env_opt("JIRA_EMAIL"),
                api_key: env_opt("JIRA_API_KEY").map(Secret::new),
                project_key: env_or("JIRA_PROJECT_KEY", "SO"),
                issue_type: env_or("JIRA_ISSUE_TYPE", "Service Outage"),
                start_time_field: match std::env::var("JIRA_START_TIME_FIELD") {
                    Ok(value) => non_empty(value),
                    Err(_) => Some("customfield_12608".to_string()),
                },
            },
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read {CONFIG_PATH_ENV}: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: IntakeConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse intake config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage_backend {
            self.storage = value.parse().with_context(|| "parse storage_backend")?;
        }
        if let Some(pg) = override_cfg.postgres {
            let current = self.postgres.take();
            let url = match (pg.url, current.as_ref()) {
                (Some(url), _) => url,
                (None, Some(existing)) => existing.url.clone(),
                (None, None) => bail!("postgres.url is required when overriding postgres"),
            };
            self.postgres = Some(PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or(current.as_ref().map(|c| c.max_connections))
                    .unwrap_or(10),
                connect_timeout_ms: pg
                    .connect_timeout_ms
                    .or(current.as_ref().map(|c| c.connect_timeout_ms))
                    .unwrap_or(5000),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or(current.as_ref().map(|c| c.acquire_timeout_ms))
                    .unwrap_or(5000),
            });
        }
        if let Some(value) = override_cfg.slack_api_base {
            self.slack.api_base = value;
        }
        if let Some(value) = override_cfg.max_timestamp_age_secs {
            self.max_timestamp_age_secs = value;
        }
        if let Some(value) = override_cfg.dispatch_timeout_ms {
            self.dispatch_timeout_ms = value;
        }
        if let Some(value) = override_cfg.opsgenie_api_base {
            self.opsgenie.api_base = value;
        }
        if let Some(value) = override_cfg.jira_server {
            self.jira.server = non_empty(value);
        }
        if let Some(value) = override_cfg.jira_email {
            self.jira.email = non_empty(value);
        }
        if let Some(value) = override_cfg.jira_project_key {
            self.jira.project_key = value;
        }
        if let Some(value) = override_cfg.jira_issue_type {
            self.jira.issue_type = value;
        }
        if let Some(value) = override_cfg.jira_start_time_field {
            self.jira.start_time_field = non_empty(value);
        }
        Ok(())
    }

    /// Timestamp replay window, or `None` when disabled.
    pub fn max_timestamp_age(&self) -> Option<Duration> {
        (self.max_timestamp_age_secs > 0).then(|| Duration::from_secs(self.max_timestamp_age_secs))
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(non_empty)
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env_or(key, default);
    raw.parse::<T>()
        .map_err(|err| anyhow::anyhow!("{err}"))
        .with_context(|| format!("parse {key}"))
}
