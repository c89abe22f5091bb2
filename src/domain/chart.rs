// Chart domain model - the figure handed to the canvas
use super::metric::MetricName;
use super::telemetry::TickSet;
use serde::Serialize;

pub const FILTERED_SUFFIX: &str = "_filtered";

/// Marker symbols offered by the line style panel
pub const MARKERS: &[&str] = &[
    ".", ",", "o", "v", "<", ">", "^", "1", "2", "3", "4", "s", "p", "*", "h", "H", "+", "x", "D",
    "d",
];

pub const LINE_DASHES: &[&str] = &["-", "--", "-.", ":"];

/// Named colors offered by the line style panel, roughly ordered by hue
pub const NAMED_COLORS: &[&str] = &[
    "black", "dimgray", "gray", "silver", "white", "maroon", "red", "tomato", "coral", "orange",
    "gold", "yellow", "olive", "yellowgreen", "green", "lime", "seagreen", "teal", "cyan",
    "deepskyblue", "steelblue", "navy", "blue", "slateblue", "indigo", "purple", "violet",
    "magenta", "deeppink", "crimson",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesRole {
    Raw,
    Filtered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: String,
    pub marker: Option<String>,
    pub dash: String,
}

impl SeriesStyle {
    pub fn line(color: &str) -> Self {
        Self {
            color: color.to_string(),
            marker: None,
            dash: "-".to_string(),
        }
    }

    pub fn for_role(side: AxisSide, role: SeriesRole) -> Self {
        let color = match (side, role) {
            (AxisSide::Left, SeriesRole::Raw) => "blue",
            (AxisSide::Left, SeriesRole::Filtered) => "green",
            (AxisSide::Right, SeriesRole::Raw) => "red",
            (AxisSide::Right, SeriesRole::Filtered) => "orange",
        };
        Self::line(color)
    }
}

/// One plotted line. Points sit at x = 0..values.len().
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub label: String,
    pub date: String,
    pub metric: MetricName,
    pub role: SeriesRole,
    pub style: SeriesStyle,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(
        date: &str,
        metric: MetricName,
        role: SeriesRole,
        style: SeriesStyle,
        values: Vec<f64>,
    ) -> Self {
        Self {
            label: Self::label_for(date, metric, role),
            date: date.to_string(),
            metric,
            role,
            style,
            values,
        }
    }

    pub fn label_for(date: &str, metric: MetricName, role: SeriesRole) -> String {
        match role {
            SeriesRole::Raw => format!("{} {}", date, metric),
            SeriesRole::Filtered => format!("{} {}{}", date, metric, FILTERED_SUFFIX),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub side: AxisSide,
    pub metric: MetricName,
    pub y_label: String,
    pub y_min: f64,
    pub y_max: f64,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub side: AxisSide,
}

/// Left axis first, optional right (twin) axis second; both share the x range and ticks.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub x_label: String,
    pub x_ticks: TickSet,
    pub axes: Vec<Axis>,
    pub legend: Vec<LegendEntry>,
}

impl Figure {
    pub fn new() -> Self {
        Self {
            x_label: "time".to_string(),
            x_ticks: TickSet::default(),
            axes: Vec::new(),
            legend: Vec::new(),
        }
    }

    /// Returns the axis on `side`, creating it with a fixed [0, y_max] range if absent
    pub fn axis_mut(&mut self, side: AxisSide, metric: MetricName, y_max: f64) -> &mut Axis {
        let position = match self.axes.iter().position(|a| a.side == side) {
            Some(position) => position,
            None => {
                let axis = Axis {
                    side,
                    metric,
                    y_label: metric.as_str().to_string(),
                    y_min: 0.0,
                    y_max,
                    series: Vec::new(),
                };
                match side {
                    AxisSide::Left => {
                        self.axes.insert(0, axis);
                        0
                    }
                    AxisSide::Right => {
                        self.axes.push(axis);
                        self.axes.len() - 1
                    }
                }
            }
        };
        &mut self.axes[position]
    }

    #[cfg(test)]
    pub fn axis(&self, side: AxisSide) -> Option<&Axis> {
        self.axes.iter().find(|a| a.side == side)
    }

    pub fn set_x_ticks(&mut self, ticks: TickSet) {
        self.x_ticks = ticks;
    }

    #[cfg(test)]
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.axes.iter().flat_map(|a| a.series.iter())
    }

    pub fn series_count(&self) -> usize {
        self.axes.iter().map(|a| a.series.len()).sum()
    }

    /// Single legend over every series on both axes
    pub fn compose_legend(&mut self) {
        self.legend = self
            .axes
            .iter()
            .flat_map(|axis| {
                axis.series.iter().map(move |s| LegendEntry {
                    label: s.label.clone(),
                    color: s.style.color.clone(),
                    side: axis.side,
                })
            })
            .collect();
    }
}

impl Default for Figure {
    fn default() -> Self {
        Self::new()
    }
}
