//! PV + battery investment analysis.
//!
//! The core is a mixed-integer dispatch optimizer: given hourly PV output, an
//! electricity price series and a battery description, it finds the
//! charge/discharge schedule that maximises market revenue net of battery
//! throughput cost, then derives financial and operational metrics from it.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod optimizer;
pub mod sizing;
pub mod telemetry;

pub use domain::{AlignedSeries, BatterySpec, DispatchSchedule, TimeSeriesAligner};
pub use error::{DispatchError, DispatchResult};
pub use optimizer::{solve, solve_with, OptimizationResult, SolveOptions, SolveStatus, SolverBackend};
