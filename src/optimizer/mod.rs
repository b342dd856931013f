pub mod extract;
pub mod milp;
pub mod model;
pub mod objective;
pub mod solver;
pub mod types;

pub use extract::{Extracted, ResultExtractor};
pub use milp::{solve, solve_with};
pub use model::{DispatchModel, DispatchModelBuilder, DispatchVariables};
pub use objective::{ObjectiveBuilder, ObjectiveValue};
pub use solver::{RawSolution, SolverBackend};
pub use types::*;
