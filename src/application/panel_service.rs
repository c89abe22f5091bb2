// Panel service - applies user events and runs draws against the canvas
use crate::application::chart_assembler::ChartAssembler;
use crate::application::filter::{AlgorithmId, FilterRegistry};
use crate::application::panel::{DateItem, Enablement, PanelEvent, PanelState, VisualSettings};
use crate::domain::chart::{Figure, LINE_DASHES, MARKERS, NAMED_COLORS};
use crate::domain::error::ChartError;
use crate::domain::metric::MetricName;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct MetricView {
    pub name: MetricName,
    pub label: &'static str,
    pub column: String,
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmView {
    pub id: AlgorithmId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisualView {
    #[serde(flatten)]
    pub settings: VisualSettings,
    pub colors: &'static [&'static str],
    pub markers: &'static [&'static str],
    pub dashes: &'static [&'static str],
}

/// Everything a front end needs to render the control column
#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    pub dates: Vec<DateItem>,
    pub catalog_error: Option<String>,
    pub metrics: Vec<MetricView>,
    pub algorithms: Vec<AlgorithmView>,
    pub left_metric: MetricName,
    pub right_metric: MetricName,
    pub right_axis_enabled: bool,
    pub filter_enabled: bool,
    pub filter_algorithm: AlgorithmId,
    pub visual: VisualView,
    pub enablement: Enablement,
}

pub struct ChartPanel {
    state: PanelState,
    filters: FilterRegistry,
    assembler: ChartAssembler,
    /// Last successfully drawn figure
    canvas: Option<Figure>,
}

impl ChartPanel {
    pub fn new(state: PanelState, filters: FilterRegistry, assembler: ChartAssembler) -> Self {
        Self {
            state,
            filters,
            assembler,
            canvas: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.canvas.as_ref()
    }

    pub fn view(&self) -> PanelView {
        let state = &self.state;
        PanelView {
            dates: state.catalog.items().to_vec(),
            catalog_error: state.catalog.unavailable_reason().map(str::to_string),
            metrics: state
                .axes
                .specs()
                .iter()
                .map(|spec| MetricView {
                    name: spec.metric,
                    label: spec.metric.label(),
                    column: spec.column.clone(),
                    scale: state.axes.default_scale(spec.metric),
                })
                .collect(),
            algorithms: self
                .filters
                .iter()
                .map(|f| AlgorithmView {
                    id: f.id(),
                    name: f.name().to_string(),
                })
                .collect(),
            left_metric: state.axes.left(),
            right_metric: state.axes.right(),
            right_axis_enabled: state.axes.right_enabled(),
            filter_enabled: state.filter.enabled(),
            filter_algorithm: state.filter.algorithm().clone(),
            visual: VisualView {
                settings: state.visual.clone(),
                colors: NAMED_COLORS,
                markers: MARKERS,
                dashes: LINE_DASHES,
            },
            enablement: state.enablement(),
        }
    }

    pub fn apply(&mut self, event: PanelEvent) -> Result<PanelView, ChartError> {
        tracing::debug!("Panel event: {:?}", event);
        self.state.apply(event, &self.filters)?;
        Ok(self.view())
    }

    /// Rebuilds the figure from the current selections.
    /// On failure the previously drawn figure stays on the canvas.
    pub async fn draw(&mut self) -> Result<&Figure, ChartError> {
        let start = Instant::now();
        let request = self.state.draw_request(&self.filters)?;

        match self.assembler.assemble(&request).await {
            Ok(figure) => {
                tracing::info!(
                    "Drew {} series for {} dates in {}ms",
                    figure.series_count(),
                    request.dates.len(),
                    start.elapsed().as_millis()
                );
                let figure: &Figure = self.canvas.insert(figure);
                Ok(figure)
            }
            Err(e) => {
                tracing::error!("Draw failed, keeping previous chart: {}", e);
                Err(e)
            }
        }
    }
}
