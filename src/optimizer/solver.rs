//! Backend selection and invocation.
//!
//! Backends are good_lp solver features compiled in through cargo features.
//! HiGHS is the primary MILP backend, COIN-OR CBC the secondary, and the
//! pure-Rust microlp is the generic fallback that is always built by default.

use std::panic::{self, AssertUnwindSafe};

use good_lp::{Constraint, Expression, ResolutionError, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::model::{DispatchModel, DispatchVariables};
use crate::error::{DispatchError, DispatchResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SolverBackend {
    /// HiGHS (fast open-source MILP)
    Highs,
    /// COIN-OR Branch and Cut
    Cbc,
    /// Pure-Rust simplex with branch and bound
    Microlp,
}

impl SolverBackend {
    /// Fixed priority order used when no preference is configured
    pub const PRIORITY: [SolverBackend; 3] = [Self::Highs, Self::Cbc, Self::Microlp];

    pub fn is_available(self) -> bool {
        match self {
            Self::Highs => cfg!(feature = "highs"),
            Self::Cbc => cfg!(feature = "cbc"),
            Self::Microlp => cfg!(feature = "microlp"),
        }
    }

    /// Every backend compiled into this build, in priority order
    pub fn available() -> Vec<SolverBackend> {
        Self::iter().filter(|b| b.is_available()).collect()
    }

    /// First available backend from `preference`, then any available one.
    pub fn select(preference: &[SolverBackend]) -> DispatchResult<SolverBackend> {
        preference
            .iter()
            .chain(Self::PRIORITY.iter())
            .copied()
            .find(|b| b.is_available())
            .ok_or_else(|| {
                DispatchError::Solver(
                    "no MILP-capable backend compiled in (enable `highs`, `cbc` or `microlp`)"
                        .to_string(),
                )
            })
    }
}

/// Raw variable values as read back from a backend
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    pub charge: Vec<f64>,
    pub discharge: Vec<f64>,
    pub charging: Vec<f64>,
    pub discharging: Vec<f64>,
    pub soc: Vec<f64>,
    pub grid: Vec<f64>,
    /// Objective as evaluated by the backend on its own solution (EUR)
    pub objective: f64,
}

/// Runs `model` on `backend`, maximising `objective`.
///
/// A panic inside the backend is caught and reported as a solver error; the
/// backend state is dropped with the unwinding frame.
pub fn run(
    backend: SolverBackend,
    model: DispatchModel,
    objective: Expression,
) -> DispatchResult<RawSolution> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || dispatch(backend, model, objective)));
    outcome.unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(DispatchError::Solver(format!("{backend} backend panicked: {reason}")))
    })
}

#[allow(unused_variables)]
fn dispatch(
    backend: SolverBackend,
    model: DispatchModel,
    objective: Expression,
) -> DispatchResult<RawSolution> {
    let DispatchModel {
        problem,
        vars,
        constraints,
    } = model;
    let reported = objective.clone();
    let unsolved = problem.maximise(objective);

    match backend {
        #[cfg(feature = "highs")]
        SolverBackend::Highs => {
            collect(unsolved.using(good_lp::solvers::highs::highs), constraints, &vars, reported)
        }
        #[cfg(feature = "cbc")]
        SolverBackend::Cbc => {
            let mut cbc = unsolved.using(good_lp::solvers::coin_cbc::coin_cbc);
            cbc.set_parameter("log", "0");
            collect(cbc, constraints, &vars, reported)
        }
        #[cfg(feature = "microlp")]
        SolverBackend::Microlp => {
            collect(unsolved.using(good_lp::solvers::microlp::microlp), constraints, &vars, reported)
        }
        #[allow(unreachable_patterns)]
        other => Err(DispatchError::Solver(format!(
            "backend `{other}` is not compiled into this build"
        ))),
    }
}

#[allow(dead_code)]
fn collect<M>(
    model: M,
    constraints: Vec<Constraint>,
    vars: &DispatchVariables,
    objective: Expression,
) -> DispatchResult<RawSolution>
where
    M: SolverModel<Error = ResolutionError>,
{
    let model = constraints.into_iter().fold(model, |m, c| m.with(c));
    let solution = model.solve().map_err(classify)?;
    let read = |vs: &[Variable]| vs.iter().map(|v| solution.value(*v)).collect::<Vec<f64>>();

    Ok(RawSolution {
        charge: read(&vars.charge),
        discharge: read(&vars.discharge),
        charging: read(&vars.charging),
        discharging: read(&vars.discharging),
        soc: read(&vars.soc),
        grid: read(&vars.grid),
        objective: solution.eval(objective),
    })
}

/// Maps a backend termination onto the error taxonomy
pub(crate) fn classify(err: ResolutionError) -> DispatchError {
    match err {
        ResolutionError::Infeasible => DispatchError::Infeasible("infeasible".to_string()),
        ResolutionError::Unbounded => DispatchError::Infeasible("unbounded".to_string()),
        other => DispatchError::Solver(other.to_string()),
    }
}
