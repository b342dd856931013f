#![allow(dead_code)]

use pv_bess_dispatch::{BatterySpec, OptimizationResult};

/// Numerical slack for values read back from a MILP backend
pub const TOL: f64 = 1e-5;

/// 24 h PV profile peaking at 400 kW around midday, in kW
pub fn midday_profile_kw() -> Vec<f64> {
    let mut profile = vec![0.0; 6];
    profile.extend([0.0, 50.0, 100.0, 200.0, 300.0, 400.0, 300.0, 200.0, 100.0, 50.0, 10.0, 0.0]);
    profile.extend(vec![0.0; 6]);
    profile
}

pub fn kw_to_mw(values: &[f64]) -> Vec<f64> {
    values.iter().map(|kw| kw / 1000.0).collect()
}

/// 30 EUR/MWh in hours 8-16, 150 in hours 17-21, 60 otherwise
pub fn evening_peak_prices() -> Vec<f64> {
    (0..24)
        .map(|h| match h {
            8..=16 => 30.0,
            17..=21 => 150.0,
            _ => 60.0,
        })
        .collect()
}

/// Checks every physical invariant of an accepted schedule
pub fn assert_invariants(result: &OptimizationResult, battery: &BatterySpec) {
    let s = &result.schedule;
    let n = s.len();
    let dt = s.step_hours;
    let min_soc = battery.min_soc_mwh();

    assert_eq!(s.soc_mwh.len(), n + 1);
    assert!((s.soc_mwh[0] - min_soc).abs() < TOL, "initial soc {}", s.soc_mwh[0]);

    for t in 0..n {
        let (c, d) = (s.charge_mw[t], s.discharge_mw[t]);
        assert!(c >= -TOL && c <= battery.power_limit_mw + TOL, "charge[{t}] = {c}");
        assert!(d >= -TOL && d <= battery.power_limit_mw + TOL, "discharge[{t}] = {d}");
        assert!(c * d <= TOL, "simultaneous flow at {t}: {c} / {d}");
        assert!(!(s.charging[t] && s.discharging[t]), "both flags set at {t}");

        let expected = s.soc_mwh[t] + dt * (battery.efficiency * c - d / battery.efficiency);
        assert!((s.soc_mwh[t + 1] - expected).abs() < TOL, "soc dynamics at {t}");

        let balance = s.generation_mw[t] + d - c;
        assert!((s.grid_power_mw[t] - balance).abs() < TOL, "grid balance at {t}");
    }

    for soc in &s.soc_mwh {
        assert!(*soc >= min_soc - TOL && *soc <= battery.capacity_mwh + TOL, "soc {soc} out of bounds");
    }
}

/// Σ price · grid · dt − cost · Σ (charge + discharge) · dt, recomputed from the schedule
pub fn recomputed_objective(result: &OptimizationResult) -> f64 {
    let s = &result.schedule;
    let revenue: f64 = s
        .grid_power_mw
        .iter()
        .zip(&s.price_eur_per_mwh)
        .map(|(g, p)| g * p * s.step_hours)
        .sum();
    let cycled: f64 = s.charge_mw.iter().chain(&s.discharge_mw).sum::<f64>() * s.step_hours;
    revenue - result.battery.throughput_cost_eur_per_mwh * cycled
}
