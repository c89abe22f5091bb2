// Domain errors for catalog loading, panel events and chart assembly
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    /// The date catalog could not be loaded, or holds no dates
    #[error("sensor data unavailable: {0}")]
    DataUnavailable(String),

    /// A selected date has no rows in the backing table
    #[error("no rows recorded for {date}")]
    EmptySeries { date: String },

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown filter algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("date '{0}' is not in the catalog")]
    UnknownDate(String),

    #[error("'{0}' control is disabled")]
    ControlDisabled(&'static str),

    #[error("invalid value '{value}' for {field}")]
    InvalidSetting { field: &'static str, value: String },

    #[error("column '{column}': {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("backing table query failed: {0:#}")]
    Query(#[from] anyhow::Error),
}

impl ChartError {
    /// Short machine-readable tag used in notifications
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::DataUnavailable(_) => "data_unavailable",
            ChartError::EmptySeries { .. } => "empty_series",
            ChartError::UnknownMetric(_) => "unknown_metric",
            ChartError::UnknownAlgorithm(_) => "unknown_algorithm",
            ChartError::UnknownDate(_) => "unknown_date",
            ChartError::ControlDisabled(_) => "control_disabled",
            ChartError::InvalidSetting { .. } => "invalid_setting",
            ChartError::InvalidColumn { .. } => "invalid_column",
            ChartError::Query(_) => "query_failed",
        }
    }

    pub(crate) fn invalid_column(column: &str, reason: impl Into<String>) -> Self {
        ChartError::InvalidColumn {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
