//! Decision variables and physical constraints of the dispatch MILP.
//!
//! For every step t of the horizon:
//! - `charge[t]`, `discharge[t]` in [0, P] (MW)
//! - `charging[t]`, `discharging[t]` binary indicators
//! - `grid[t]` free (MW, positive = export)
//! - `soc[t]` in [min_soc, capacity] (MWh), with one extra state soc[T]
//!
//! Constraints:
//! 1. soc[0] = min_soc
//! 2. soc[t+1] = soc[t] + dt * (eff * charge[t] - discharge[t] / eff)
//! 3. charge[t] <= P * charging[t], discharge[t] <= P * discharging[t]
//! 4. grid[t] = generation[t] + discharge[t] - charge[t]
//! 5. charging[t] + discharging[t] <= 1
//!
//! The big-M of the indicator coupling is the power limit itself, which is the
//! true bound of the flow. Simultaneous charge and discharge is therefore
//! excluded by (3) + (5) without a bilinear term.

use good_lp::{constraint, variable, Constraint, ProblemVariables, Variable};

use crate::domain::{AlignedSeries, BatterySpec};

/// Handles to every decision variable, indexed by step
#[derive(Debug, Clone)]
pub struct DispatchVariables {
    pub charge: Vec<Variable>,
    pub discharge: Vec<Variable>,
    pub charging: Vec<Variable>,
    pub discharging: Vec<Variable>,
    pub soc: Vec<Variable>,
    pub grid: Vec<Variable>,
}

impl DispatchVariables {
    pub fn horizon(&self) -> usize {
        self.charge.len()
    }

    /// Binary indicator count, the main driver of solve time
    pub fn binary_count(&self) -> usize {
        self.charging.len() + self.discharging.len()
    }
}

/// A fully declared model, ready for an objective and a backend
pub struct DispatchModel {
    pub problem: ProblemVariables,
    pub vars: DispatchVariables,
    pub constraints: Vec<Constraint>,
}

pub struct DispatchModelBuilder<'a> {
    series: &'a AlignedSeries,
    battery: &'a BatterySpec,
    step_hours: f64,
}

impl<'a> DispatchModelBuilder<'a> {
    pub fn new(series: &'a AlignedSeries, battery: &'a BatterySpec, step_hours: f64) -> Self {
        Self {
            series,
            battery,
            step_hours,
        }
    }

    pub fn build(self) -> DispatchModel {
        let n = self.series.len();
        let power = self.battery.power_limit_mw;
        let capacity = self.battery.capacity_mwh;
        let min_soc = self.battery.min_soc_mwh();
        let eff = self.battery.efficiency;

        let mut problem = ProblemVariables::new();
        let charge = problem.add_vector(variable().min(0.0).max(power), n);
        let discharge = problem.add_vector(variable().min(0.0).max(power), n);
        let charging = problem.add_vector(variable().binary(), n);
        let discharging = problem.add_vector(variable().binary(), n);
        let soc = problem.add_vector(variable().min(min_soc).max(capacity), n + 1);
        let grid = problem.add_vector(variable(), n);

        // Energy moved into / out of storage per MW of flow over one step
        let stored_per_mw = self.step_hours * eff;
        let drawn_per_mw = self.step_hours / eff;

        let mut constraints = Vec::with_capacity(5 * n + 1);
        constraints.push(constraint!(soc[0] == min_soc));

        for (t, generation) in self.series.generation_mw.iter().copied().enumerate() {
            constraints.push(constraint!(
                soc[t + 1] == soc[t] + stored_per_mw * charge[t] - drawn_per_mw * discharge[t]
            ));
            constraints.push(constraint!(charge[t] <= power * charging[t]));
            constraints.push(constraint!(discharge[t] <= power * discharging[t]));
            constraints.push(constraint!(charging[t] + discharging[t] <= 1.0));
            constraints.push(constraint!(
                grid[t] == discharge[t] - charge[t] + generation
            ));
        }

        tracing::debug!(
            horizon = n,
            binaries = 2 * n,
            constraints = constraints.len(),
            "dispatch model declared"
        );

        DispatchModel {
            problem,
            vars: DispatchVariables {
                charge,
                discharge,
                charging,
                discharging,
                soc,
                grid,
            },
            constraints,
        }
    }
}
