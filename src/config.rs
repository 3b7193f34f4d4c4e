//! Environment-driven settings for the planner and the HTTP service.
//!
//! | Variable                | Default                                            |
//! |-------------------------|----------------------------------------------------|
//! | `GEMINI_API_KEY`        | none (planning fails with a configuration error)   |
//! | `GEMINI_MODEL`          | `gemini-2.5-flash`                                 |
//! | `GEMINI_BASE_URL`       | `https://generativelanguage.googleapis.com/v1beta` |
//! | `GEMINI_TIMEOUT_SECS`   | `120`                                              |
//! | `PLANNER_MAX_RETRIES`   | `4`                                                |
//! | `PLANNER_BASE_DELAY_MS` | `600`                                              |
//! | `HOST`                  | `0.0.0.0`                                          |
//! | `PORT`                  | `3000`                                             |
//! | `MAX_UPLOAD_BYTES`      | `10485760`                                         |

use std::{str::FromStr, time::Duration};

use crate::{
    error::{PlannerError, Result},
    services::{
        gemini_client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT},
        retry::RetryPolicy,
    },
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Missing is allowed here; it is reported when a plan is requested.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let retry_defaults = defaults.retry;

        Ok(Self {
            api_key: non_empty(&lookup, "GEMINI_API_KEY"),
            model: non_empty(&lookup, "GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty(&lookup, "GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: parse_var::<u64, _>(&lookup, "GEMINI_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            retry: RetryPolicy {
                max_retries: parse_var(&lookup, "PLANNER_MAX_RETRIES")?
                    .unwrap_or(retry_defaults.max_retries),
                base_delay: parse_var::<u64, _>(&lookup, "PLANNER_BASE_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(retry_defaults.base_delay),
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: non_empty(&lookup, "HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name)
        .map(|raw| {
            raw.parse::<T>().map_err(|err| {
                PlannerError::Configuration(format!("{name} has invalid value `{raw}`: {err}"))
            })
        })
        .transpose()
}
