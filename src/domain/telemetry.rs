// Telemetry data domain models
use super::error::ChartError;
use serde::Serialize;

/// One day's recording of a single metric.
/// `values[i]` was recorded at `times[i]`.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub date: String,
    pub times: Vec<String>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(date: String, times: Vec<String>, values: Vec<f64>) -> Result<Self, ChartError> {
        if times.len() != values.len() {
            return Err(ChartError::InvalidColumn {
                column: "time".to_string(),
                reason: format!(
                    "{} time labels but {} values for {}",
                    times.len(),
                    values.len(),
                    date
                ),
            });
        }

        Ok(Self {
            date,
            times,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn ticks(&self) -> TickSet {
        TickSet::from_time_labels(&self.times)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub index: usize,
    pub label: String,
}

/// Hour marks on the positional x axis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TickSet {
    ticks: Vec<Tick>,
}

impl TickSet {
    /// A tick sits at every row whose minute field is exactly "00",
    /// labelled with that row's hour field.
    pub fn from_time_labels<S: AsRef<str>>(times: &[S]) -> Self {
        let ticks = times
            .iter()
            .enumerate()
            .filter_map(|(index, time)| {
                let mut fields = time.as_ref().split(':');
                let hour = fields.next()?;
                let minute = fields.next()?;
                (minute == "00").then(|| Tick {
                    index,
                    label: hour.to_string(),
                })
            })
            .collect();

        Self { ticks }
    }

    #[cfg(test)]
    pub fn positions(&self) -> Vec<usize> {
        self.ticks.iter().map(|t| t.index).collect()
    }

    #[cfg(test)]
    pub fn labels(&self) -> Vec<&str> {
        self.ticks.iter().map(|t| t.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
