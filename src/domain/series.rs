use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Generation and price series truncated to a common horizon.
///
/// Ordering is preserved and nothing is interpolated; calendar alignment is
/// the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub generation_mw: Vec<f64>,
    pub price_eur_per_mwh: Vec<f64>,
    /// Samples cut from the end of the generation input
    pub dropped_generation: usize,
    /// Samples cut from the end of the price input
    pub dropped_price: usize,
}

impl AlignedSeries {
    /// Horizon length T
    pub fn len(&self) -> usize {
        self.generation_mw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generation_mw.is_empty()
    }

    /// `(generation_mw, price_eur_per_mwh)` per step
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.generation_mw
            .iter()
            .copied()
            .zip(self.price_eur_per_mwh.iter().copied())
    }

    pub fn was_truncated(&self) -> bool {
        self.dropped_generation > 0 || self.dropped_price > 0
    }
}

/// Truncates both series to `T = min(len(generation), len(price))`.
pub struct TimeSeriesAligner;

impl TimeSeriesAligner {
    pub fn align(generation_mw: &[f64], price_eur_per_mwh: &[f64]) -> DispatchResult<AlignedSeries> {
        let horizon = generation_mw.len().min(price_eur_per_mwh.len());
        if horizon == 0 {
            return Err(DispatchError::validation(format!(
                "empty horizon after alignment (generation: {} samples, price: {} samples)",
                generation_mw.len(),
                price_eur_per_mwh.len()
            )));
        }

        let generation = &generation_mw[..horizon];
        let price = &price_eur_per_mwh[..horizon];

        if let Some((idx, value)) = generation
            .iter()
            .enumerate()
            .find(|(_, g)| !g.is_finite() || **g < 0.0)
        {
            return Err(DispatchError::validation(format!(
                "generation_mw[{idx}] must be finite and non-negative, got {value}"
            )));
        }

        if let Some((idx, value)) = price.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(DispatchError::validation(format!(
                "price_eur_per_mwh[{idx}] must be finite, got {value}"
            )));
        }

        let aligned = AlignedSeries {
            generation_mw: generation.to_vec(),
            price_eur_per_mwh: price.to_vec(),
            dropped_generation: generation_mw.len() - horizon,
            dropped_price: price_eur_per_mwh.len() - horizon,
        };

        if aligned.was_truncated() {
            tracing::warn!(
                horizon,
                dropped_generation = aligned.dropped_generation,
                dropped_price = aligned.dropped_price,
                "series lengths differ, truncating to common horizon"
            );
        }

        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_truncates_longer_series() {
        let aligned = TimeSeriesAligner::align(&[1.0, 2.0, 3.0], &[10.0, 20.0]).unwrap();
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.generation_mw, vec![1.0, 2.0]);
        assert_eq!(aligned.price_eur_per_mwh, vec![10.0, 20.0]);
        assert_eq!(aligned.dropped_generation, 1);
        assert_eq!(aligned.dropped_price, 0);
        assert!(aligned.was_truncated());
    }

    #[test]
    fn test_align_preserves_order() {
        let aligned = TimeSeriesAligner::align(&[3.0, 1.0, 2.0], &[-5.0, 7.0, 0.0, 9.0]).unwrap();
        let pairs: Vec<_> = aligned.iter().collect();
        assert_eq!(pairs, vec![(3.0, -5.0), (1.0, 7.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_empty_horizon_is_rejected() {
        let err = TimeSeriesAligner::align(&[], &[1.0]).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_negative_generation_is_rejected() {
        let err = TimeSeriesAligner::align(&[0.5, -0.1], &[1.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("generation_mw[1]"));
    }

    #[test]
    fn test_values_beyond_horizon_are_not_checked() {
        // The trailing NaN is cut off before validation
        let aligned = TimeSeriesAligner::align(&[0.5, f64::NAN], &[1.0]).unwrap();
        assert_eq!(aligned.len(), 1);
    }

    #[test]
    fn test_non_finite_price_is_rejected() {
        assert!(TimeSeriesAligner::align(&[0.5], &[f64::INFINITY]).is_err());
    }
}
