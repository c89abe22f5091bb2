// Smoothing filters - pluggable algorithms applied to a plotted value sequence
use crate::domain::error::ChartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_ALGORITHM: &str = "jake";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlgorithmId(pub String);

impl AlgorithmId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pure sequence transform. The output has the same length as the input.
pub trait SmoothingFilter: Send + Sync {
    fn id(&self) -> AlgorithmId;

    /// Human readable name shown in the algorithm list
    fn name(&self) -> &str;

    fn process(&self, values: &[f64]) -> Vec<f64>;
}

/// Centred moving average. The window shrinks at both ends and skips NaN gaps.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    half_width: usize,
}

impl MovingAverage {
    /// Even windows are widened by one so the average stays centred
    pub fn new(window: usize) -> Self {
        Self {
            half_width: window.max(1) / 2,
        }
    }

    #[cfg(test)]
    pub fn window(&self) -> usize {
        self.half_width * 2 + 1
    }
}

impl SmoothingFilter for MovingAverage {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::new(DEFAULT_ALGORITHM)
    }

    fn name(&self) -> &str {
        "jake's filter"
    }

    fn process(&self, values: &[f64]) -> Vec<f64> {
        (0..values.len())
            .map(|i| {
                let start = i.saturating_sub(self.half_width);
                let end = (i + self.half_width + 1).min(values.len());

                let (sum, count) = values[start..end]
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0_f64, 0usize), |(sum, count), v| (sum + *v, count + 1));

                if count == 0 { f64::NAN } else { sum / count as f64 }
            })
            .collect()
    }
}

/// Registered algorithms in registration order
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: Vec<Arc<dyn SmoothingFilter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock registry: one moving-average algorithm
    pub fn with_defaults(window: usize) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MovingAverage::new(window)));
        registry
    }

    /// Registering an id twice replaces the earlier algorithm in place
    pub fn register(&mut self, filter: Arc<dyn SmoothingFilter>) {
        let id = filter.id();
        match self.filters.iter().position(|f| f.id() == id) {
            Some(idx) => self.filters[idx] = filter,
            None => self.filters.push(filter),
        }
    }

    pub fn get(&self, id: &AlgorithmId) -> Result<Arc<dyn SmoothingFilter>, ChartError> {
        self.filters
            .iter()
            .find(|f| &f.id() == id)
            .cloned()
            .ok_or_else(|| ChartError::UnknownAlgorithm(id.to_string()))
    }

    pub fn contains(&self, id: &AlgorithmId) -> bool {
        self.filters.iter().any(|f| &f.id() == id)
    }

    pub fn first_id(&self) -> Option<AlgorithmId> {
        self.filters.first().map(|f| f.id())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SmoothingFilter>> {
        self.filters.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl SmoothingFilter for Doubler {
        fn id(&self) -> AlgorithmId {
            AlgorithmId::new("double")
        }

        fn name(&self) -> &str {
            "doubler"
        }

        fn process(&self, values: &[f64]) -> Vec<f64> {
            values.iter().map(|v| v * 2.0).collect()
        }
    }

    #[test]
    fn test_moving_average_smooths_spike() {
        let filter = MovingAverage::new(3);
        let out = filter.process(&[0.0, 0.0, 9.0, 0.0, 0.0]);

        assert_eq!(out, vec![0.0, 3.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn test_moving_average_edges_shrink() {
        let filter = MovingAverage::new(5);
        let out = filter.process(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(out[0], 2.0);
        assert_eq!(out[1], 2.5);
        assert_eq!(out[2], 3.0);
        assert_eq!(out[5], 5.0);
    }

    #[test]
    fn test_moving_average_preserves_length() {
        let filter = MovingAverage::new(5);
        for len in [1usize, 2, 5, 17, 1440] {
            let input: Vec<f64> = (0..len).map(|i| (i as f64).sin()).collect();
            assert_eq!(filter.process(&input).len(), len);
        }
        assert!(filter.process(&[]).is_empty());
    }

    #[test]
    fn test_moving_average_skips_gaps() {
        let filter = MovingAverage::new(3);
        let out = filter.process(&[f64::NAN, 4.0, f64::NAN, f64::NAN, f64::NAN]);

        assert_eq!(out[0], 4.0);
        assert_eq!(out[1], 4.0);
        assert_eq!(out[2], 4.0);
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
    }

    #[test]
    fn test_even_window_is_widened() {
        assert_eq!(MovingAverage::new(4).window(), 5);
        assert_eq!(MovingAverage::new(0).window(), 1);
        assert_eq!(MovingAverage::new(1).process(&[1.0, 5.0]), vec![1.0, 5.0]);
    }

    #[test]
    fn test_default_registry_has_one_algorithm() {
        let registry = FilterRegistry::with_defaults(5);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.first_id(), Some(AlgorithmId::new(DEFAULT_ALGORITHM)));
        assert_eq!(registry.get(&AlgorithmId::new("jake")).unwrap().name(), "jake's filter");
    }

    #[test]
    fn test_unknown_algorithm() {
        let registry = FilterRegistry::with_defaults(5);
        let err = registry.get(&AlgorithmId::new("kalman")).err().unwrap();
        assert!(matches!(err, ChartError::UnknownAlgorithm(id) if id == "kalman"));
    }

    #[test]
    fn test_register_additional_algorithm() {
        let mut registry = FilterRegistry::with_defaults(5);
        registry.register(Arc::new(Doubler));
        registry.register(Arc::new(Doubler));

        assert_eq!(registry.len(), 2);
        let ids: Vec<_> = registry.iter().map(|f| f.id().0).collect();
        assert_eq!(ids, vec!["jake", "double"]);
        assert_eq!(registry.get(&AlgorithmId::new("double")).unwrap().process(&[1.5]), vec![3.0]);
    }
}
