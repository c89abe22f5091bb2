// Metric domain model - the fixed set of plottable sensor columns
use super::error::ChartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricName {
    Illum,
    Cct,
    Swr,
}

impl MetricName {
    pub const ALL: [MetricName; 3] = [MetricName::Illum, MetricName::Cct, MetricName::Swr];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Illum => "illum",
            MetricName::Cct => "cct",
            MetricName::Swr => "swr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricName::Illum => "illuminance",
            MetricName::Cct => "color temperature",
            MetricName::Swr => "SWR",
        }
    }

    /// Fixed upper bound of the metric's y axis.
    /// Charts are never fitted to the data so overlaid days stay comparable.
    pub fn default_scale(&self) -> f64 {
        match self {
            MetricName::Illum => 3000.0,
            MetricName::Cct => 10000.0,
            MetricName::Swr => 2.0,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ChartError::UnknownMetric(s.to_string()))
    }
}
