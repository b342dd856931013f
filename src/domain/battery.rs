use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

fn default_efficiency() -> f64 {
    0.9
}

fn default_min_soc_fraction() -> f64 {
    0.05
}

fn default_throughput_cost() -> f64 {
    10.0
}

/// Physical and economic description of the battery for one optimization run.
///
/// Power and energy are in MW / MWh. `efficiency` is one-way: it applies once
/// when charging and once when discharging, so round-trip efficiency is
/// `efficiency²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySpec {
    /// Maximum charge and discharge rate (MW)
    pub power_limit_mw: f64,

    /// Nameplate energy capacity (MWh)
    pub capacity_mwh: f64,

    /// One-way conversion efficiency, 0 < e <= 1
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,

    /// Reserved minimum state of charge as a fraction of capacity, 0 <= f < 1
    #[serde(default = "default_min_soc_fraction")]
    pub min_soc_fraction: f64,

    /// Degradation penalty per MWh cycled (charge + discharge)
    #[serde(default = "default_throughput_cost")]
    pub throughput_cost_eur_per_mwh: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            power_limit_mw: 4.0,
            capacity_mwh: 16.0,
            efficiency: default_efficiency(),
            min_soc_fraction: default_min_soc_fraction(),
            throughput_cost_eur_per_mwh: default_throughput_cost(),
        }
    }
}

impl BatterySpec {
    /// Create a validated spec with default efficiency, reserve and throughput cost.
    pub fn new(power_limit_mw: f64, capacity_mwh: f64) -> DispatchResult<Self> {
        let spec = Self {
            power_limit_mw,
            capacity_mwh,
            ..Self::default()
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_efficiency(mut self, efficiency: f64) -> DispatchResult<Self> {
        self.efficiency = efficiency;
        self.validate()?;
        Ok(self)
    }

    pub fn with_min_soc_fraction(mut self, fraction: f64) -> DispatchResult<Self> {
        self.min_soc_fraction = fraction;
        self.validate()?;
        Ok(self)
    }

    pub fn with_throughput_cost(mut self, eur_per_mwh: f64) -> DispatchResult<Self> {
        self.throughput_cost_eur_per_mwh = eur_per_mwh;
        self.validate()?;
        Ok(self)
    }

    /// Validate that every field lies in its documented domain.
    ///
    /// Zero power or zero capacity is accepted: both produce a degenerate but
    /// valid model in which the battery never moves.
    pub fn validate(&self) -> DispatchResult<()> {
        let fields = [
            ("power_limit_mw", self.power_limit_mw),
            ("capacity_mwh", self.capacity_mwh),
            ("efficiency", self.efficiency),
            ("min_soc_fraction", self.min_soc_fraction),
            ("throughput_cost_eur_per_mwh", self.throughput_cost_eur_per_mwh),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DispatchError::validation(format!(
                "{name} must be a finite number, got {value}"
            )));
        }

        if self.power_limit_mw < 0.0 {
            return Err(DispatchError::validation(format!(
                "power_limit_mw must be non-negative, got {}",
                self.power_limit_mw
            )));
        }

        if self.capacity_mwh < 0.0 {
            return Err(DispatchError::validation(format!(
                "capacity_mwh must be non-negative, got {}",
                self.capacity_mwh
            )));
        }

        if self.efficiency <= 0.0 || self.efficiency > 1.0 {
            return Err(DispatchError::validation(format!(
                "efficiency must be in (0, 1], got {}",
                self.efficiency
            )));
        }

        if self.min_soc_fraction < 0.0 || self.min_soc_fraction >= 1.0 {
            return Err(DispatchError::validation(format!(
                "min_soc_fraction must be in [0, 1), got {}",
                self.min_soc_fraction
            )));
        }

        if self.throughput_cost_eur_per_mwh < 0.0 {
            return Err(DispatchError::validation(format!(
                "throughput_cost_eur_per_mwh must be non-negative, got {}",
                self.throughput_cost_eur_per_mwh
            )));
        }

        Ok(())
    }

    /// Reserved energy that the battery never goes below (MWh)
    pub fn min_soc_mwh(&self) -> f64 {
        self.min_soc_fraction * self.capacity_mwh
    }

    /// Energy between the reserve and full (MWh)
    pub fn usable_capacity_mwh(&self) -> f64 {
        self.capacity_mwh - self.min_soc_mwh()
    }

    pub fn round_trip_efficiency(&self) -> f64 {
        self.efficiency * self.efficiency
    }

    /// Hours needed to discharge the nameplate capacity at full power
    pub fn duration_hours(&self) -> Option<f64> {
        (self.power_limit_mw > 0.0).then(|| self.capacity_mwh / self.power_limit_mw)
    }
}
