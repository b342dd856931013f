//! PV-only reference case and the bridge from it to the battery case.

use serde::{Deserialize, Serialize};

use crate::domain::{AlignedSeries, TimeSeriesAligner};
use crate::error::DispatchResult;
use crate::optimizer::OptimizationResult;

/// Capture rate below which storage is recommended
pub const DEFAULT_RECOMMENDATION_THRESHOLD: f64 = 0.70;

const HIGH_SEVERITY_CAPTURE_RATE: f64 = 0.60;

/// Revenue of selling all PV output at market price, without storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PvBaseline {
    pub total_revenue_eur: f64,
    pub total_generation_mwh: f64,
    pub avg_revenue_per_mwh: f64,
    /// Generation-weighted average price, `None` without any generation
    pub capture_price: Option<f64>,
    /// Simple average price over all steps
    pub baseload_price: f64,
    pub cannibalization_eur_per_mwh: Option<f64>,
    /// `generation · baseload − revenue`
    pub cannibalization_loss_eur: f64,
    pub capture_rate: f64,
    pub negative_price_hours: f64,
    /// Absolute revenue lost by exporting during negative prices
    pub negative_price_revenue_loss_eur: f64,
}

impl PvBaseline {
    pub fn compute(series: &AlignedSeries, step_hours: f64) -> Self {
        let dt = step_hours;
        let mut revenue = 0.0;
        let mut generation_sum = 0.0;
        let mut negative_steps = 0usize;
        let mut negative_revenue = 0.0;

        for (g, p) in series.iter() {
            revenue += g * p * dt;
            generation_sum += g;
            if p < 0.0 {
                negative_steps += 1;
                negative_revenue += g * p * dt;
            }
        }

        let total_generation_mwh = generation_sum * dt;
        let baseload_price = series.price_eur_per_mwh.iter().sum::<f64>() / series.len().max(1) as f64;
        let capture_price = (generation_sum > 0.0).then(|| {
            series.iter().map(|(g, p)| g * p).sum::<f64>() / generation_sum
        });
        let capture_rate = match capture_price {
            Some(capture) if baseload_price > 0.0 => capture / baseload_price,
            _ => 0.0,
        };

        Self {
            total_revenue_eur: revenue,
            total_generation_mwh,
            avg_revenue_per_mwh: if total_generation_mwh > 0.0 {
                revenue / total_generation_mwh
            } else {
                0.0
            },
            capture_price,
            baseload_price,
            cannibalization_eur_per_mwh: capture_price.map(|c| baseload_price - c),
            cannibalization_loss_eur: total_generation_mwh * baseload_price - revenue,
            capture_rate,
            negative_price_hours: negative_steps as f64 * dt,
            negative_price_revenue_loss_eur: negative_revenue.abs(),
        }
    }
}

/// Aligns the raw series and computes the PV-only baseline
pub fn pv_baseline(
    generation_mw: &[f64],
    price_eur_per_mwh: &[f64],
    step_hours: f64,
) -> DispatchResult<PvBaseline> {
    let series = TimeSeriesAligner::align(generation_mw, price_eur_per_mwh)?;
    Ok(PvBaseline::compute(&series, step_hours))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryRecommendation {
    pub recommend: bool,
    pub severity: Severity,
    pub capture_rate: f64,
    pub threshold: f64,
    pub reason: String,
}

pub fn recommend_battery(baseline: &PvBaseline, threshold: f64) -> BatteryRecommendation {
    let rate = baseline.capture_rate;
    let recommend = rate < threshold;
    let severity = if rate < HIGH_SEVERITY_CAPTURE_RATE {
        Severity::High
    } else if rate < DEFAULT_RECOMMENDATION_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    };

    let reason = if recommend {
        format!(
            "capture rate {:.1}% is below {:.0}%: cannibalization costs {:.0} EUR over {} negative-price hours",
            rate * 100.0,
            threshold * 100.0,
            baseline.cannibalization_loss_eur,
            baseline.negative_price_hours
        )
    } else {
        format!(
            "capture rate {:.1}% is healthy; storage can still add arbitrage and negative-price value",
            rate * 100.0
        )
    };

    BatteryRecommendation {
        recommend,
        severity,
        capture_rate: rate,
        threshold,
        reason,
    }
}

/// Revenue walk from PV-only to PV + battery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBridge {
    pub baseline_revenue_eur: f64,
    pub optimized_net_profit_eur: f64,
    pub uplift_eur: f64,
    pub arbitrage_gain_eur: f64,
    pub negative_price_savings_eur: f64,
    /// Uplift not explained by the two named components, floored at zero
    pub other_eur: f64,
}

impl ValueBridge {
    pub fn between(baseline: &PvBaseline, result: &OptimizationResult) -> Self {
        let baseline_revenue_eur = baseline.total_revenue_eur;
        let optimized_net_profit_eur = result.objective_value;
        let uplift_eur = optimized_net_profit_eur - baseline_revenue_eur;
        let arbitrage_gain_eur = result.metrics.arbitrage.arbitrage_revenue_eur;
        let negative_price_savings_eur = result.metrics.negative_prices.estimated_savings_eur;

        Self {
            baseline_revenue_eur,
            optimized_net_profit_eur,
            uplift_eur,
            arbitrage_gain_eur,
            negative_price_savings_eur,
            other_eur: (uplift_eur - arbitrage_gain_eur - negative_price_savings_eur).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_baseline_capture_and_cannibalization() {
        // Output concentrated in the cheap hours
        let baseline = pv_baseline(&[0.0, 2.0, 2.0, 0.0], &[100.0, 20.0, 40.0, 80.0], 1.0).unwrap();

        assert!((baseline.total_revenue_eur - 120.0).abs() < 1e-9);
        assert!((baseline.total_generation_mwh - 4.0).abs() < 1e-9);
        assert!((baseline.capture_price.unwrap() - 30.0).abs() < 1e-9);
        assert!((baseline.baseload_price - 60.0).abs() < 1e-9);
        assert!((baseline.cannibalization_eur_per_mwh.unwrap() - 30.0).abs() < 1e-9);
        assert!((baseline.cannibalization_loss_eur - 120.0).abs() < 1e-9);
        assert!((baseline.capture_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_negative_price_loss() {
        let baseline = pv_baseline(&[1.0, 3.0], &[50.0, -10.0], 1.0).unwrap();
        assert_eq!(baseline.negative_price_hours, 1.0);
        assert!((baseline.negative_price_revenue_loss_eur - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_generation_has_no_capture_price() {
        let baseline = pv_baseline(&[0.0, 0.0], &[50.0, 60.0], 1.0).unwrap();
        assert_eq!(baseline.capture_price, None);
        assert_eq!(baseline.capture_rate, 0.0);
        assert_eq!(baseline.avg_revenue_per_mwh, 0.0);
    }

    #[rstest]
    #[case(0.50, true, Severity::High)]
    #[case(0.65, true, Severity::Medium)]
    #[case(0.85, false, Severity::Low)]
    fn test_recommendation_severity(
        #[case] capture_rate: f64,
        #[case] recommend: bool,
        #[case] severity: Severity,
    ) {
        let mut baseline = pv_baseline(&[1.0], &[50.0], 1.0).unwrap();
        baseline.capture_rate = capture_rate;
        let rec = recommend_battery(&baseline, DEFAULT_RECOMMENDATION_THRESHOLD);
        assert_eq!(rec.recommend, recommend);
        assert_eq!(rec.severity, severity);
    }
}
