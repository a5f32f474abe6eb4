//! Configuration loading traits and types.
//!
//! Every binary of the workspace reads a single TOML file. The generic
//! [`ConfigLoader`] handles file access and parsing; [`SimConfig`] carries the
//! simulation settings and validates them.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ftrm_common::config::{ConfigError, ConfigLoader, SimConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = SimConfig::load(Path::new("ftrm.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_MUX_INPUTS, DEFAULT_SEED, DEFAULT_SWEEP_ITERATIONS, DEFAULT_SWEEP_START,
    DEFAULT_SWEEP_STEP, DEFAULT_SWEEP_STOP, DEFAULT_SWITCH_NAME, DEFAULT_WORKERS,
};
use crate::fault::CellKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Misconfigured defect distribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbabilityError {
    /// A single probability outside `[0, 1]` (or NaN).
    #[error("probability {name} = {value} is outside [0, 1]")]
    OutOfRange { name: &'static str, value: f64 },

    /// Defect probabilities add up to more than one.
    #[error("defect probabilities sum to {sum} (> 1)")]
    SumExceedsOne { sum: f64 },
}

impl From<ProbabilityError> for ConfigError {
    fn from(e: ProbabilityError) -> Self {
        Self::ValidationError(e.to_string())
    }
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "ftrm-sim"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "ftrm-sim".to_string(),
        }
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Simulation Config ──────────────────────────────────────────────

/// `[simulation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Cell architecture for every selection cell.
    pub cell_kind: CellKind,
    /// Seed of the defect sampler.
    pub seed: u64,
    /// Worker threads used by the fault simulator.
    pub workers: usize,
    /// rr-graph switch name designating routing muxes.
    pub switch_name: String,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            cell_kind: CellKind::default(),
            seed: DEFAULT_SEED,
            workers: DEFAULT_WORKERS,
            switch_name: DEFAULT_SWITCH_NAME.to_string(),
        }
    }
}

/// `[probabilities]` section: absolute per-memristor defect probabilities.
///
/// The remainder `1 - (p_sa0 + p_sa1 + p_ud)` is the fault-free probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Probabilities {
    pub p_sa0: f64,
    pub p_sa1: f64,
    pub p_ud: f64,
}

impl Probabilities {
    /// Same probability for every defect kind.
    pub const fn uniform(p: f64) -> Self {
        Self {
            p_sa0: p,
            p_sa1: p,
            p_ud: p,
        }
    }

    /// Only undefined defects.
    pub const fn undefined_only(p: f64) -> Self {
        Self {
            p_sa0: 0.0,
            p_sa1: 0.0,
            p_ud: p,
        }
    }

    /// Sum of all defect probabilities.
    pub fn total(&self) -> f64 {
        self.p_sa0 + self.p_sa1 + self.p_ud
    }

    /// Check that each probability lies in `[0, 1]` and the sum is at most 1.
    ///
    /// # Errors
    /// `ProbabilityError::OutOfRange` for a value outside `[0, 1]` or NaN,
    /// `ProbabilityError::SumExceedsOne` when the defects leave no room for FF.
    pub fn validate(&self) -> Result<(), ProbabilityError> {
        for (name, value) in [("p_sa0", self.p_sa0), ("p_sa1", self.p_sa1), ("p_ud", self.p_ud)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProbabilityError::OutOfRange { name, value });
            }
        }
        let sum = self.total();
        if sum > 1.0 + f64::EPSILON {
            return Err(ProbabilityError::SumExceedsOne { sum });
        }
        Ok(())
    }
}

/// How a sweep maps the swept probability onto the three defect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Only undefined defects are injected (`p_ud = p`).
    #[default]
    UndefinedOnly,
    /// All three defect kinds share the swept probability.
    Uniform,
}

impl SweepMode {
    /// Probabilities for one swept value.
    pub const fn probabilities(self, p: f64) -> Probabilities {
        match self {
            Self::UndefinedOnly => Probabilities::undefined_only(p),
            Self::Uniform => Probabilities::uniform(p),
        }
    }
}

impl std::str::FromStr for SweepMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undefined_only" | "undefined-only" | "ud" => Ok(Self::UndefinedOnly),
            "uniform" | "equal" => Ok(Self::Uniform),
            other => Err(format!(
                "unknown sweep mode '{other}' (expected undefined_only|uniform)"
            )),
        }
    }
}

/// `[sweep]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub start: f64,
    /// Exclusive upper bound, as for a half-open range.
    pub stop: f64,
    pub step: f64,
    /// Trials per swept value.
    pub iterations: u32,
    /// Number of sources of the simulated mux.
    pub mux_inputs: usize,
    pub mode: SweepMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_SWEEP_START,
            stop: DEFAULT_SWEEP_STOP,
            step: DEFAULT_SWEEP_STEP,
            iterations: DEFAULT_SWEEP_ITERATIONS,
            mux_inputs: DEFAULT_MUX_INPUTS,
            mode: SweepMode::default(),
        }
    }
}

impl SweepConfig {
    /// Swept probability values `start, start + step, ...` below `stop`.
    ///
    /// Values are computed as `start + i * step` so rounding does not
    /// accumulate.
    pub fn points(&self) -> Vec<f64> {
        if self.step <= 0.0 || self.stop <= self.start {
            return Vec::new();
        }
        let count = ((self.stop - self.start) / self.step).ceil() as usize;
        (0..count)
            .map(|i| self.start + i as f64 * self.step)
            .filter(|p| *p < self.stop)
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.step <= 0.0 {
            return Err(format!("sweep step must be positive (got {})", self.step));
        }
        if self.start < 0.0 || self.stop > 1.0 + f64::EPSILON || self.stop <= self.start {
            return Err(format!(
                "sweep range [{}, {}) must be a non-empty subrange of [0, 1]",
                self.start, self.stop
            ));
        }
        if self.iterations == 0 {
            return Err("sweep iterations must be > 0".to_string());
        }
        if self.mux_inputs == 0 {
            return Err("sweep mux_inputs must be > 0".to_string());
        }
        if let SweepMode::Uniform = self.mode {
            let worst = self.points().last().copied().unwrap_or(0.0);
            Probabilities::uniform(worst)
                .validate()
                .map_err(|e| format!("sweep end point: {e}"))?;
        }
        Ok(())
    }
}

/// Complete configuration file of the simulator.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "ftrm-sim"
///
/// [simulation]
/// cell_kind = "voter"
/// seed = 7
///
/// [probabilities]
/// p_ud = 0.01
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    pub shared: SharedConfig,
    pub simulation: SimulationSection,
    pub probabilities: Probabilities,
    pub sweep: SweepConfig,
}

impl SimConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.simulation.workers == 0 {
            return Err(ConfigError::ValidationError(
                "simulation.workers must be > 0".to_string(),
            ));
        }
        if self.simulation.switch_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "simulation.switch_name cannot be empty".to_string(),
            ));
        }
        self.probabilities.validate()?;
        self.sweep.validate().map_err(ConfigError::ValidationError)?;
        Ok(())
    }
}
