use crate::error::{FixtureError, Result};
use crate::measure::Extractor;
use crate::shutdown::ShutdownSignal;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const OUTPUT_ENV: &str = "BENCH_OUTPUT";

pub const AGENT_PORT: u16 = 8126;
pub const UPSTREAM_PORT: u16 = 80;

const DEFAULT_LOG_FILTER: &str = "bench_stubs=info,warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Trace agent, records `Content-Length`.
    Agent,
    /// Same as `Agent`, run under the headers scenario.
    AgentHeaders,
    /// Backend, records total header bytes.
    Upstream,
    /// `Upstream` with at most one line per second.
    UpstreamThrottled,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Agent => "agent",
            Variant::AgentHeaders => "agent-headers",
            Variant::Upstream => "upstream",
            Variant::UpstreamThrottled => "upstream-throttled",
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Variant::Agent | Variant::AgentHeaders => AGENT_PORT,
            Variant::Upstream | Variant::UpstreamThrottled => UPSTREAM_PORT,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port()))
    }

    pub fn extractor(&self) -> Extractor {
        match self {
            Variant::Agent | Variant::AgentHeaders => Extractor::ContentLength,
            Variant::Upstream | Variant::UpstreamThrottled => Extractor::HeaderBytes,
        }
    }

    pub fn response_body(&self) -> &'static [u8] {
        match self {
            Variant::Agent | Variant::AgentHeaders => b"{}",
            Variant::Upstream | Variant::UpstreamThrottled => b"",
        }
    }

    pub fn min_write_interval(&self) -> Option<Duration> {
        match self {
            Variant::UpstreamThrottled => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "agent" => Ok(Variant::Agent),
            "agent-headers" => Ok(Variant::AgentHeaders),
            "upstream" => Ok(Variant::Upstream),
            "upstream-throttled" => Ok(Variant::UpstreamThrottled),
            other => Err(FixtureError::UnknownVariant(other.to_string())),
        }
    }
}

/// Optional TOML file that can replace the signal set and log filter.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    pub signals: Option<Vec<ShutdownSignal>>,
    pub log_filter: Option<String>,
}

impl Overrides {
    pub fn from_file(path: &Path) -> Result<Self> {
        let load = || -> std::result::Result<Self, Box<dyn std::error::Error + Send + Sync>> {
            let content = std::fs::read_to_string(path)?;
            let overrides: Overrides = toml::from_str(&content)?;
            Ok(overrides)
        };
        load().map_err(|source| FixtureError::Overrides {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A variant plus the knobs that were inconsistent between the stubs.
#[derive(Debug, Clone)]
pub struct Profile {
    pub variant: Variant,
    pub signals: Vec<ShutdownSignal>,
    pub log_filter: String,
}

impl Profile {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            signals: vec![ShutdownSignal::Interrupt, ShutdownSignal::Terminate],
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(signals) = overrides.signals {
            self.signals = signals;
        }
        if let Some(log_filter) = overrides.log_filter {
            self.log_filter = log_filter;
        }
        self
    }

    /// `<variant> [overrides.toml]`, program name already stripped.
    pub fn from_args<I>(mut args: I) -> Result<Self>
    where
        I: Iterator<Item = String>,
    {
        let variant: Variant = args.next().ok_or(FixtureError::MissingVariant)?.parse()?;
        let profile = Profile::new(variant);

        match args.next() {
            Some(path) => Ok(profile.apply(Overrides::from_file(Path::new(&path))?)),
            None => Ok(profile),
        }
    }
}

/// Process environment the stubs depend on.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        let output_path = lookup(OUTPUT_ENV)
            .map(PathBuf::from)
            .ok_or(FixtureError::MissingOutputPath)?;
        Ok(Self { output_path })
    }
}
