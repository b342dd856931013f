use good_lp::Expression;
use serde::{Deserialize, Serialize};

use super::model::DispatchVariables;
use crate::domain::BatterySpec;

/// Net profit split into its two linear parts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveValue {
    /// Σ dt · price[t] · grid[t]
    pub market_revenue_eur: f64,
    /// throughput_cost · Σ dt · (charge[t] + discharge[t])
    pub throughput_cost_eur: f64,
    pub net_profit_eur: f64,
}

/// Composes the maximised net-profit objective.
///
/// Coefficients are kept so the same objective can be evaluated on extracted
/// values, independent of what a backend reports.
#[derive(Debug, Clone)]
pub struct ObjectiveBuilder {
    revenue_coefficients: Vec<f64>,
    throughput_coefficient: f64,
}

impl ObjectiveBuilder {
    pub fn new(price_eur_per_mwh: &[f64], battery: &BatterySpec, step_hours: f64) -> Self {
        Self {
            revenue_coefficients: price_eur_per_mwh.iter().map(|p| p * step_hours).collect(),
            throughput_coefficient: battery.throughput_cost_eur_per_mwh * step_hours,
        }
    }

    pub fn expression(&self, vars: &DispatchVariables) -> Expression {
        let mut profit = Expression::from(0.0);
        for (t, coef) in self.revenue_coefficients.iter().copied().enumerate() {
            profit += coef * vars.grid[t];
            profit += -self.throughput_coefficient * vars.charge[t];
            profit += -self.throughput_coefficient * vars.discharge[t];
        }
        profit
    }

    pub fn evaluate(&self, grid_mw: &[f64], charge_mw: &[f64], discharge_mw: &[f64]) -> ObjectiveValue {
        let market_revenue_eur: f64 = self
            .revenue_coefficients
            .iter()
            .zip(grid_mw)
            .map(|(c, g)| c * g)
            .sum();
        let cycled_mw: f64 = charge_mw.iter().chain(discharge_mw).sum();
        let throughput_cost_eur = self.throughput_coefficient * cycled_mw;

        ObjectiveValue {
            market_revenue_eur,
            throughput_cost_eur,
            net_profit_eur: market_revenue_eur - throughput_cost_eur,
        }
    }
}
