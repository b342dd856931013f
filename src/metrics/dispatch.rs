//! Financial and operational metrics of an accepted schedule.

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::domain::{BatterySpec, DispatchSchedule};

/// Market flows of one step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalRevenue {
    pub index: usize,
    /// `grid · price · dt` when exporting
    pub export_revenue_eur: f64,
    /// `|grid| · price · dt` when importing
    pub import_cost_eur: f64,
    pub net_revenue_eur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_revenue_eur: f64,
    pub export_revenue_eur: f64,
    pub import_cost_eur: f64,
    /// throughput cost × total MWh cycled
    pub degradation_cost_eur: f64,
    pub net_profit_eur: f64,
    pub total_generation_mwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalMetrics {
    pub hours_charging: f64,
    pub hours_discharging: f64,
    /// Steps with any battery activity above epsilon
    pub active_steps: usize,
    /// Fraction of steps with battery activity, 0..=1
    pub utilization: f64,
    pub utilization_percent: f64,
    pub total_charged_mwh: f64,
    pub total_discharged_mwh: f64,
    pub cycled_energy_mwh: f64,
    /// Discharged energy over nameplate capacity (annual for a one-year horizon)
    pub annual_cycles: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageMetrics {
    /// Energy-weighted price over charging steps, `None` if the battery never charged
    pub avg_charging_price: Option<f64>,
    /// Energy-weighted price over discharging steps
    pub avg_discharging_price: Option<f64>,
    pub price_spread: Option<f64>,
    /// Exact: Σ discharge·price·dt − Σ charge·price·dt over active steps
    pub arbitrage_revenue_eur: f64,
    /// Coarse: positive spread × discharged energy
    pub spread_estimate_eur: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegativePriceMetrics {
    pub negative_price_hours: f64,
    pub energy_charged_mwh: f64,
    /// PV energy produced while prices were negative
    pub potential_curtailment_mwh: f64,
    /// |Σ charge·price·dt| over negative-price steps
    pub estimated_savings_eur: f64,
}

/// Everything derived from an accepted schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMetrics {
    pub financial: FinancialSummary,
    pub operation: OperationalMetrics,
    pub arbitrage: ArbitrageMetrics,
    pub negative_prices: NegativePriceMetrics,
    pub intervals: Vec<IntervalRevenue>,
}

impl DispatchMetrics {
    /// `epsilon_mw` filters solver noise when counting active steps and
    /// selecting the steps behind the price averages.
    pub fn compute(schedule: &DispatchSchedule, battery: &BatterySpec, epsilon_mw: f64) -> Self {
        let dt = schedule.step_hours;

        let intervals: Vec<IntervalRevenue> = izip!(&schedule.grid_power_mw, &schedule.price_eur_per_mwh)
            .enumerate()
            .map(|(index, (&grid, &price))| {
                let export_revenue_eur = if grid > 0.0 { grid * price * dt } else { 0.0 };
                let import_cost_eur = if grid < 0.0 { grid.abs() * price * dt } else { 0.0 };
                IntervalRevenue {
                    index,
                    export_revenue_eur,
                    import_cost_eur,
                    net_revenue_eur: export_revenue_eur - import_cost_eur,
                }
            })
            .collect();

        let export_revenue_eur: f64 = intervals.iter().map(|i| i.export_revenue_eur).sum();
        let import_cost_eur: f64 = intervals.iter().map(|i| i.import_cost_eur).sum();
        let total_revenue_eur = export_revenue_eur - import_cost_eur;
        let cycled_energy_mwh = schedule.cycled_energy_mwh();
        let degradation_cost_eur = battery.throughput_cost_eur_per_mwh * cycled_energy_mwh;

        let financial = FinancialSummary {
            total_revenue_eur,
            export_revenue_eur,
            import_cost_eur,
            degradation_cost_eur,
            net_profit_eur: total_revenue_eur - degradation_cost_eur,
            total_generation_mwh: schedule.generation_mw.iter().sum::<f64>() * dt,
        };

        let operation = operational(schedule, battery, epsilon_mw);
        let arbitrage = arbitrage(schedule, epsilon_mw);
        let negative_prices = negative_prices(schedule);

        Self {
            financial,
            operation,
            arbitrage,
            negative_prices,
            intervals,
        }
    }
}

fn operational(s: &DispatchSchedule, battery: &BatterySpec, epsilon_mw: f64) -> OperationalMetrics {
    let dt = s.step_hours;
    let charging_steps = s.charge_mw.iter().filter(|c| **c > epsilon_mw).count();
    let discharging_steps = s.discharge_mw.iter().filter(|d| **d > epsilon_mw).count();
    let active_steps = s
        .charge_mw
        .iter()
        .zip(&s.discharge_mw)
        .filter(|(c, d)| **c > epsilon_mw || **d > epsilon_mw)
        .count();
    let utilization = active_steps as f64 / s.len().max(1) as f64;

    let total_discharged_mwh = s.total_discharged_mwh();
    let annual_cycles = if battery.capacity_mwh > 0.0 {
        total_discharged_mwh / battery.capacity_mwh
    } else {
        0.0
    };

    OperationalMetrics {
        hours_charging: charging_steps as f64 * dt,
        hours_discharging: discharging_steps as f64 * dt,
        active_steps,
        utilization,
        utilization_percent: utilization * 100.0,
        total_charged_mwh: s.total_charged_mwh(),
        total_discharged_mwh,
        cycled_energy_mwh: s.cycled_energy_mwh(),
        annual_cycles,
    }
}

fn arbitrage(s: &DispatchSchedule, epsilon_mw: f64) -> ArbitrageMetrics {
    let dt = s.step_hours;

    // (Σ flow, Σ flow·price) over steps where the flow is above epsilon
    let weighted = |flows: &[f64]| {
        flows
            .iter()
            .zip(&s.price_eur_per_mwh)
            .filter(|(f, _)| **f > epsilon_mw)
            .fold((0.0_f64, 0.0_f64), |(e, v), (f, p)| (e + f, v + f * p))
    };
    let (charged, charge_value) = weighted(&s.charge_mw);
    let (discharged, discharge_value) = weighted(&s.discharge_mw);

    let avg_charging_price = (charged > 0.0).then(|| charge_value / charged);
    let avg_discharging_price = (discharged > 0.0).then(|| discharge_value / discharged);
    let price_spread = avg_discharging_price
        .zip(avg_charging_price)
        .map(|(d, c)| d - c);

    let spread_estimate_eur = match price_spread {
        Some(spread) if spread > 0.0 => spread * s.total_discharged_mwh(),
        _ => 0.0,
    };

    ArbitrageMetrics {
        avg_charging_price,
        avg_discharging_price,
        price_spread,
        arbitrage_revenue_eur: (discharge_value - charge_value) * dt,
        spread_estimate_eur,
    }
}

fn negative_prices(s: &DispatchSchedule) -> NegativePriceMetrics {
    let dt = s.step_hours;
    let mut metrics = NegativePriceMetrics {
        negative_price_hours: 0.0,
        energy_charged_mwh: 0.0,
        potential_curtailment_mwh: 0.0,
        estimated_savings_eur: 0.0,
    };
    let mut charge_value = 0.0;

    for (price, charge, generation) in izip!(&s.price_eur_per_mwh, &s.charge_mw, &s.generation_mw) {
        if *price < 0.0 {
            metrics.negative_price_hours += dt;
            metrics.energy_charged_mwh += charge * dt;
            metrics.potential_curtailment_mwh += generation * dt;
            charge_value += charge * price * dt;
        }
    }
    metrics.estimated_savings_eur = charge_value.abs();
    metrics
}
