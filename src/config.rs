use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::domain::BatterySpec;
use crate::optimizer::{SolveOptions, SolverBackend, Tolerances};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "PVBESS__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    pub battery: BatterySpec,
    pub series: SeriesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 300,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub preference: Vec<SolverBackend>,
    /// Wall-clock limit for one solve behind the HTTP API
    pub solve_timeout_secs: u64,
    pub strict_tolerance: f64,
    pub accept_tolerance: f64,
    pub activity_epsilon_mw: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let options = SolveOptions::default();
        Self {
            preference: options.solver_preference,
            solve_timeout_secs: 120,
            strict_tolerance: options.tolerances.strict,
            accept_tolerance: options.tolerances.accept,
            activity_epsilon_mw: options.activity_epsilon_mw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub step_hours: f64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self { step_hours: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "pv_bess_dispatch=info,tower_http=info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml` if present, then `PVBESS__*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        config.battery.validate().context("invalid [battery] section")?;
        config.solve_options().validate().context("invalid [solver] or [series] section")?;
        Ok(config)
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            step_hours: self.series.step_hours,
            solver_preference: self.solver.preference.clone(),
            activity_epsilon_mw: self.solver.activity_epsilon_mw,
            tolerances: Tolerances {
                strict: self.solver.strict_tolerance,
                accept: self.solver.accept_tolerance,
            },
        }
    }
}
