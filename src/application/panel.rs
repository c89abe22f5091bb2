// Panel state - current selections and the enablement rules derived from them
use crate::application::chart_assembler::DrawRequest;
use crate::application::filter::{AlgorithmId, DEFAULT_ALGORITHM, FilterRegistry};
use crate::domain::chart::{LINE_DASHES, MARKERS, NAMED_COLORS, SeriesStyle};
use crate::domain::error::ChartError;
use crate::domain::metric::MetricName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateItem {
    pub date: String,
    pub checked: bool,
}

/// Selectable dates, kept in ascending order
#[derive(Debug, Clone, Default)]
pub struct DateCatalog {
    items: Vec<DateItem>,
    unavailable: Option<String>,
}

impl DateCatalog {
    pub fn from_dates(mut dates: Vec<String>) -> Self {
        dates.sort();
        dates.dedup();
        let unavailable = dates.is_empty().then(|| "no dates recorded".to_string());

        Self {
            items: dates
                .into_iter()
                .map(|date| DateItem {
                    date,
                    checked: false,
                })
                .collect(),
            unavailable,
        }
    }

    /// An empty, inert catalog
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.unavailable.is_none() && !self.items.is_empty()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable.as_deref()
    }

    pub fn items(&self) -> &[DateItem] {
        &self.items
    }

    pub fn toggle(&mut self, date: &str, checked: bool) -> Result<(), ChartError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.date == date)
            .ok_or_else(|| ChartError::UnknownDate(date.to_string()))?;
        item.checked = checked;
        Ok(())
    }

    /// Checked dates in catalog order, whatever order they were clicked in
    pub fn selected(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.checked)
            .map(|item| item.date.clone())
            .collect()
    }
}

/// A metric as it is read from the backing table and scaled on its axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSpec {
    pub metric: MetricName,
    pub column: String,
    pub scale: f64,
}

impl MetricSpec {
    pub fn standard(metric: MetricName) -> Self {
        Self {
            metric,
            column: metric.as_str().to_string(),
            scale: metric.default_scale(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSelection {
    Single(MetricName),
    Dual(MetricName, MetricName),
}

impl AxisSelection {
    pub fn left(&self) -> MetricName {
        match self {
            AxisSelection::Single(left) | AxisSelection::Dual(left, _) => *left,
        }
    }

    pub fn right(&self) -> Option<MetricName> {
        match self {
            AxisSelection::Single(_) => None,
            AxisSelection::Dual(_, right) => Some(*right),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxisSelector {
    specs: Vec<MetricSpec>,
    left: MetricName,
    right: MetricName,
    right_enabled: bool,
}

impl AxisSelector {
    /// Metrics missing from `specs` fall back to their standard column and scale
    pub fn new(specs: Vec<MetricSpec>) -> Self {
        let specs = MetricName::ALL
            .into_iter()
            .map(|metric| {
                specs
                    .iter()
                    .find(|s| s.metric == metric)
                    .cloned()
                    .unwrap_or_else(|| MetricSpec::standard(metric))
            })
            .collect();

        Self {
            specs,
            left: MetricName::Illum,
            right: MetricName::Illum,
            right_enabled: false,
        }
    }

    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }

    pub fn spec(&self, metric: MetricName) -> MetricSpec {
        self.specs
            .iter()
            .find(|s| s.metric == metric)
            .cloned()
            .unwrap_or_else(|| MetricSpec::standard(metric))
    }

    pub fn default_scale(&self, metric: MetricName) -> f64 {
        self.spec(metric).scale
    }

    pub fn left(&self) -> MetricName {
        self.left
    }

    pub fn right(&self) -> MetricName {
        self.right
    }

    pub fn right_enabled(&self) -> bool {
        self.right_enabled
    }

    /// Left only, or left then right when the right axis is enabled.
    /// Both sides may name the same metric.
    pub fn selected_axes(&self) -> AxisSelection {
        if self.right_enabled {
            AxisSelection::Dual(self.left, self.right)
        } else {
            AxisSelection::Single(self.left)
        }
    }
}

impl Default for AxisSelector {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct FilterToggle {
    enabled: bool,
    algorithm: AlgorithmId,
}

impl FilterToggle {
    pub fn new(algorithm: AlgorithmId) -> Self {
        Self {
            enabled: false,
            algorithm,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn algorithm(&self) -> &AlgorithmId {
        &self.algorithm
    }
}

impl Default for FilterToggle {
    fn default() -> Self {
        Self::new(AlgorithmId::new(DEFAULT_ALGORITHM))
    }
}

/// Line style overrides; inert unless switched on in configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualSettings {
    pub enabled: bool,
    pub color: String,
    pub marker: String,
    pub dash: String,
}

impl VisualSettings {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            color: "blue".to_string(),
            marker: MARKERS[0].to_string(),
            dash: LINE_DASHES[0].to_string(),
        }
    }

    pub fn style_override(&self) -> Option<SeriesStyle> {
        self.enabled.then(|| SeriesStyle {
            color: self.color.clone(),
            marker: Some(self.marker.clone()),
            dash: self.dash.clone(),
        })
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Which controls accept input in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Enablement {
    pub date_list: bool,
    pub right_metric: bool,
    pub filter_algorithm: bool,
    pub visual: bool,
    pub draw: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    ToggleDate {
        date: String,
        checked: bool,
    },
    SetLeftMetric {
        metric: MetricName,
    },
    SetRightMetric {
        metric: MetricName,
    },
    SetRightAxisEnabled {
        enabled: bool,
    },
    SetFilterEnabled {
        enabled: bool,
    },
    SetFilterAlgorithm {
        algorithm: AlgorithmId,
    },
    SetVisual {
        color: Option<String>,
        marker: Option<String>,
        dash: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub catalog: DateCatalog,
    pub axes: AxisSelector,
    pub filter: FilterToggle,
    pub visual: VisualSettings,
}

impl PanelState {
    pub fn new(catalog: DateCatalog, axes: AxisSelector, filter: FilterToggle, visual: VisualSettings) -> Self {
        Self {
            catalog,
            axes,
            filter,
            visual,
        }
    }

    pub fn enablement(&self) -> Enablement {
        let available = self.catalog.is_available();
        Enablement {
            date_list: available,
            right_metric: self.axes.right_enabled,
            filter_algorithm: self.filter.enabled,
            visual: self.visual.enabled,
            draw: available,
        }
    }

    /// Rejected events leave the state untouched
    pub fn apply(&mut self, event: PanelEvent, filters: &FilterRegistry) -> Result<Enablement, ChartError> {
        let enablement = self.enablement();

        match event {
            PanelEvent::ToggleDate { date, checked } => {
                if !enablement.date_list {
                    return Err(ChartError::ControlDisabled("date_list"));
                }
                self.catalog.toggle(&date, checked)?;
            }
            PanelEvent::SetLeftMetric { metric } => self.axes.left = metric,
            PanelEvent::SetRightMetric { metric } => {
                if !enablement.right_metric {
                    return Err(ChartError::ControlDisabled("right_metric"));
                }
                self.axes.right = metric;
            }
            PanelEvent::SetRightAxisEnabled { enabled } => self.axes.right_enabled = enabled,
            PanelEvent::SetFilterEnabled { enabled } => self.filter.enabled = enabled,
            PanelEvent::SetFilterAlgorithm { algorithm } => {
                if !enablement.filter_algorithm {
                    return Err(ChartError::ControlDisabled("filter_algorithm"));
                }
                if !filters.contains(&algorithm) {
                    return Err(ChartError::UnknownAlgorithm(algorithm.to_string()));
                }
                self.filter.algorithm = algorithm;
            }
            PanelEvent::SetVisual { color, marker, dash } => {
                if !enablement.visual {
                    return Err(ChartError::ControlDisabled("visual"));
                }
                let color = validate_choice("color", color, NAMED_COLORS)?;
                let marker = validate_choice("marker", marker, MARKERS)?;
                let dash = validate_choice("dash", dash, LINE_DASHES)?;

                if let Some(color) = color {
                    self.visual.color = color;
                }
                if let Some(marker) = marker {
                    self.visual.marker = marker;
                }
                if let Some(dash) = dash {
                    self.visual.dash = dash;
                }
            }
        }

        Ok(self.enablement())
    }

    /// Snapshot of the current selections for one draw
    pub fn draw_request(&self, filters: &FilterRegistry) -> Result<DrawRequest, ChartError> {
        if !self.catalog.is_available() {
            return Err(ChartError::DataUnavailable(
                self.catalog
                    .unavailable_reason()
                    .unwrap_or("date catalog is empty")
                    .to_string(),
            ));
        }

        let selection = self.axes.selected_axes();
        let filter = if self.filter.enabled {
            Some(filters.get(&self.filter.algorithm)?)
        } else {
            None
        };

        Ok(DrawRequest {
            dates: self.catalog.selected(),
            left: self.axes.spec(selection.left()),
            right: selection.right().map(|m| self.axes.spec(m)),
            filter,
            style_override: self.visual.style_override(),
        })
    }
}

fn validate_choice(
    field: &'static str,
    value: Option<String>,
    allowed: &[&str],
) -> Result<Option<String>, ChartError> {
    match value {
        Some(v) if !allowed.contains(&v.as_str()) => Err(ChartError::InvalidSetting { field, value: v }),
        other => Ok(other),
    }
}
