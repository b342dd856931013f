use serde::{Deserialize, Serialize};

/// Physically valid battery schedule over the horizon.
///
/// Flow vectors have length T; `soc_mwh` has length T + 1 and `soc_mwh[t]`
/// is the state at the start of step t.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSchedule {
    pub step_hours: f64,
    pub generation_mw: Vec<f64>,
    pub price_eur_per_mwh: Vec<f64>,
    pub charge_mw: Vec<f64>,
    pub discharge_mw: Vec<f64>,
    pub charging: Vec<bool>,
    pub discharging: Vec<bool>,
    pub soc_mwh: Vec<f64>,
    /// Positive = export, negative = import
    pub grid_power_mw: Vec<f64>,
}

/// One step of a schedule, flattened into a CSV row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispatchInterval {
    pub index: usize,
    pub generation_mw: f64,
    pub price_eur_per_mwh: f64,
    pub charge_mw: f64,
    pub discharge_mw: f64,
    /// Positive = discharge, negative = charge
    pub battery_flow_mw: f64,
    pub soc_start_mwh: f64,
    pub soc_end_mwh: f64,
    pub grid_power_mw: f64,
}

impl DispatchSchedule {
    pub fn len(&self) -> usize {
        self.charge_mw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charge_mw.is_empty()
    }

    pub fn horizon_hours(&self) -> f64 {
        self.len() as f64 * self.step_hours
    }

    pub fn interval(&self, t: usize) -> Option<DispatchInterval> {
        (t < self.len()).then(|| DispatchInterval {
            index: t,
            generation_mw: self.generation_mw[t],
            price_eur_per_mwh: self.price_eur_per_mwh[t],
            charge_mw: self.charge_mw[t],
            discharge_mw: self.discharge_mw[t],
            battery_flow_mw: self.discharge_mw[t] - self.charge_mw[t],
            soc_start_mwh: self.soc_mwh[t],
            soc_end_mwh: self.soc_mwh[t + 1],
            grid_power_mw: self.grid_power_mw[t],
        })
    }

    pub fn intervals(&self) -> impl Iterator<Item = DispatchInterval> + '_ {
        (0..self.len()).filter_map(|t| self.interval(t))
    }

    pub fn total_charged_mwh(&self) -> f64 {
        self.charge_mw.iter().sum::<f64>() * self.step_hours
    }

    pub fn total_discharged_mwh(&self) -> f64 {
        self.discharge_mw.iter().sum::<f64>() * self.step_hours
    }

    /// Charge plus discharge energy, the base of the throughput penalty
    pub fn cycled_energy_mwh(&self) -> f64 {
        self.total_charged_mwh() + self.total_discharged_mwh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> DispatchSchedule {
        DispatchSchedule {
            step_hours: 0.5,
            generation_mw: vec![1.0, 0.0],
            price_eur_per_mwh: vec![20.0, 80.0],
            charge_mw: vec![1.0, 0.0],
            discharge_mw: vec![0.0, 0.8],
            charging: vec![true, false],
            discharging: vec![false, true],
            soc_mwh: vec![0.0, 0.45, 0.0],
            grid_power_mw: vec![0.0, 0.8],
        }
    }

    #[test]
    fn test_energy_totals_use_step_length() {
        let s = schedule();
        assert_eq!(s.horizon_hours(), 1.0);
        assert!((s.total_charged_mwh() - 0.5).abs() < 1e-12);
        assert!((s.total_discharged_mwh() - 0.4).abs() < 1e-12);
        assert!((s.cycled_energy_mwh() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_intervals_carry_soc_bounds() {
        let s = schedule();
        let steps: Vec<_> = s.intervals().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].soc_start_mwh, 0.45);
        assert_eq!(steps[1].soc_end_mwh, 0.0);
        assert!((steps[0].battery_flow_mw + 1.0).abs() < 1e-12);
        assert!(s.interval(2).is_none());
    }
}
