// Chart assembler - Use case for building the daily overlay chart
use crate::application::filter::SmoothingFilter;
use crate::application::panel::MetricSpec;
use crate::application::table::{Table, TableSource, get_dataframe};
use crate::domain::chart::{AxisSide, Figure, Series, SeriesRole, SeriesStyle};
use crate::domain::error::ChartError;
use crate::domain::telemetry::TimeSeries;
use crate::infrastructure::config::TableSettings;
use std::sync::Arc;

/// Everything one draw reads from the panel, captured up front
#[derive(Clone)]
pub struct DrawRequest {
    /// In catalog order
    pub dates: Vec<String>,
    pub left: MetricSpec,
    pub right: Option<MetricSpec>,
    pub filter: Option<Arc<dyn SmoothingFilter>>,
    /// Replaces the style of the raw left series when set
    pub style_override: Option<SeriesStyle>,
}

#[derive(Clone)]
pub struct ChartAssembler {
    source: Arc<dyn TableSource>,
    table: TableSettings,
}

impl ChartAssembler {
    pub fn new(source: Arc<dyn TableSource>, table: TableSettings) -> Self {
        Self { source, table }
    }

    /// Builds a fresh figure for `request`.
    ///
    /// Dates without rows are skipped; a date with no right metric rows only
    /// loses its right axis series. Any other failure aborts the whole figure
    /// so the caller never sees a half-drawn chart.
    pub async fn assemble(&self, request: &DrawRequest) -> Result<Figure, ChartError> {
        let mut figure = Figure::new();
        let table = get_dataframe(self.source.clone(), &self.table.name);

        for date in &request.dates {
            let day = table.filter(&self.table.date_column, date);

            let left = match self.fetch(&day, date, &request.left).await {
                Ok(series) => series,
                Err(ChartError::EmptySeries { date }) => {
                    tracing::warn!("No rows for {}, skipping", date);
                    continue;
                }
                Err(e) => return Err(e),
            };

            // x positions are row indices; the ticks of the last plotted day label them
            let ticks = left.ticks();
            if ticks.is_empty() {
                tracing::warn!("No on-the-hour rows for {}, x axis left unlabelled", date);
            }
            tracing::debug!("Plotting {} rows for {} ({} hour ticks)", left.len(), date, ticks.len());
            figure.set_x_ticks(ticks);

            Self::plot(&mut figure, AxisSide::Left, &request.left, &left, request)?;

            if let Some(right_spec) = &request.right {
                match self.fetch(&day, date, right_spec).await {
                    Ok(right) => Self::plot(&mut figure, AxisSide::Right, right_spec, &right, request)?,
                    Err(ChartError::EmptySeries { date }) => {
                        tracing::warn!("No {} rows for {}, right axis skipped", right_spec.metric, date);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        figure.compose_legend();
        Ok(figure)
    }

    /// One metric for one day, paired with its own time labels
    async fn fetch(&self, day: &Table, date: &str, spec: &MetricSpec) -> Result<TimeSeries, ChartError> {
        let frame = day
            .select(&[self.table.time_column.as_str(), spec.column.as_str()])
            .materialize()
            .await?;

        if frame.is_empty() {
            return Err(ChartError::EmptySeries {
                date: date.to_string(),
            });
        }

        TimeSeries::new(
            date.to_string(),
            frame.text_column(&self.table.time_column)?,
            frame.numeric_column(&spec.column)?,
        )
    }

    fn plot(
        figure: &mut Figure,
        side: AxisSide,
        spec: &MetricSpec,
        series: &TimeSeries,
        request: &DrawRequest,
    ) -> Result<(), ChartError> {
        let filtered = match &request.filter {
            Some(filter) => {
                let filtered = filter.process(&series.values);
                if filtered.len() != series.len() {
                    return Err(ChartError::invalid_column(
                        &spec.column,
                        format!(
                            "{} returned {} values for {} rows on {}",
                            filter.name(),
                            filtered.len(),
                            series.len(),
                            series.date
                        ),
                    ));
                }
                Some(filtered)
            }
            None => None,
        };

        let axis = figure.axis_mut(side, spec.metric, spec.scale);

        let raw_style = match (side, &request.style_override) {
            (AxisSide::Left, Some(style)) => style.clone(),
            _ => SeriesStyle::for_role(side, SeriesRole::Raw),
        };
        axis.series.push(Series::new(
            &series.date,
            spec.metric,
            SeriesRole::Raw,
            raw_style,
            series.values.clone(),
        ));

        if let Some(filtered) = filtered {
            axis.series.push(Series::new(
                &series.date,
                spec.metric,
                SeriesRole::Filtered,
                SeriesStyle::for_role(side, SeriesRole::Filtered),
                filtered,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::filter::{FilterRegistry, MovingAverage};
    use crate::application::table::{Frame, TableQuery};
    use crate::domain::metric::MetricName;
    use crate::infrastructure::memory_table::{MemoryTable, sample_table};
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FailingSource;

    #[async_trait]
    impl TableSource for FailingSource {
        async fn distinct_sorted(&self, _query: &TableQuery, _column: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("cluster unreachable")
        }

        async fn materialize(&self, _query: &TableQuery) -> anyhow::Result<Frame> {
            anyhow::bail!("cluster unreachable")
        }
    }

    fn assembler(source: Arc<dyn TableSource>) -> ChartAssembler {
        ChartAssembler::new(source, TableSettings::default())
    }

    fn request(dates: &[&str], right: Option<MetricName>, filtered: bool) -> DrawRequest {
        DrawRequest {
            dates: dates.iter().map(|d| d.to_string()).collect(),
            left: MetricSpec::standard(MetricName::Illum),
            right: right.map(MetricSpec::standard),
            filter: filtered.then(|| Arc::new(MovingAverage::new(5)) as Arc<dyn SmoothingFilter>),
            style_override: None,
        }
    }

    #[tokio::test]
    async fn test_no_dates_gives_empty_figure() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));

        let figure = assembler.assemble(&request(&[], None, false)).await.unwrap();

        assert_eq!(figure.series_count(), 0);
        assert!(figure.axes.is_empty());
        assert!(figure.legend.is_empty());
    }

    #[tokio::test]
    async fn test_two_dates_single_axis() {
        let source = Arc::new(sample_table(&["2020-01-01", "2020-01-02"]));
        let assembler = assembler(source.clone());

        let figure = assembler
            .assemble(&request(&["2020-01-01", "2020-01-02"], None, false))
            .await
            .unwrap();

        assert_eq!(figure.axes.len(), 1);
        assert_eq!(figure.series_count(), 2);
        let labels: Vec<_> = figure.legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["2020-01-01 illum", "2020-01-02 illum"]);

        let axis = figure.axis(AxisSide::Left).unwrap();
        assert_eq!((axis.y_min, axis.y_max), (0.0, MetricName::Illum.default_scale()));
        assert_eq!(axis.y_label, "illum");

        // one fetch per date for the single axis
        assert_eq!(source.materialize_count(), 2);
    }

    #[tokio::test]
    async fn test_dual_axis_with_filter() {
        let source = Arc::new(sample_table(&["2020-01-01", "2020-01-02"]));
        let assembler = assembler(source.clone());

        let figure = assembler
            .assemble(&request(&["2020-01-01", "2020-01-02"], Some(MetricName::Cct), true))
            .await
            .unwrap();

        assert_eq!(figure.series_count(), 8);
        assert_eq!(figure.legend.len(), 8);
        assert_eq!(source.materialize_count(), 4);

        let labels: HashSet<_> = figure.legend.iter().map(|e| e.label.clone()).collect();
        assert_eq!(labels.len(), 8);

        let left = figure.axis(AxisSide::Left).unwrap();
        let right = figure.axis(AxisSide::Right).unwrap();
        assert_eq!(right.y_max, MetricName::Cct.default_scale());

        let colors = |axis: &crate::domain::chart::Axis, role: SeriesRole| -> HashSet<String> {
            axis.series
                .iter()
                .filter(|s| s.role == role)
                .map(|s| s.style.color.clone())
                .collect()
        };
        assert_eq!(colors(left, SeriesRole::Raw), HashSet::from(["blue".to_string()]));
        assert_eq!(colors(left, SeriesRole::Filtered), HashSet::from(["green".to_string()]));
        assert_eq!(colors(right, SeriesRole::Raw), HashSet::from(["red".to_string()]));
        assert_eq!(colors(right, SeriesRole::Filtered), HashSet::from(["orange".to_string()]));

        assert!(figure.legend.iter().any(|e| e.label == "2020-01-02 cct_filtered"));
        assert!(figure.series().all(|s| s.values.len() == 64));
    }

    #[tokio::test]
    async fn test_same_metric_on_both_axes() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));

        let figure = assembler
            .assemble(&request(&["2020-01-01"], Some(MetricName::Illum), false))
            .await
            .unwrap();

        assert_eq!(figure.axes.len(), 2);
        assert_eq!(figure.series_count(), 2);
    }

    #[tokio::test]
    async fn test_hour_ticks_from_time_labels() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));

        let figure = assembler
            .assemble(&request(&["2020-01-01"], None, false))
            .await
            .unwrap();

        // rows start at 05:58, so 06:00 is row 2 and 07:00 is row 62
        assert_eq!(figure.x_ticks.positions(), vec![2, 62]);
        assert_eq!(figure.x_ticks.labels(), vec!["06", "07"]);
    }

    #[tokio::test]
    async fn test_empty_date_is_skipped() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01", "2020-01-03"])));

        let figure = assembler
            .assemble(&request(&["2020-01-01", "2020-01-02", "2020-01-03"], Some(MetricName::Swr), true))
            .await
            .unwrap();

        assert_eq!(figure.series_count(), 8);
        assert!(figure.series().all(|s| s.date != "2020-01-02"));
    }

    #[tokio::test]
    async fn test_backend_failure_aborts_draw() {
        let assembler = assembler(Arc::new(FailingSource));

        let err = assembler
            .assemble(&request(&["2020-01-01"], None, false))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ChartError::Query(_)));
    }

    #[tokio::test]
    async fn test_filtered_series_matches_source_length() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));
        let registry = FilterRegistry::with_defaults(7);
        let mut req = request(&["2020-01-01"], None, false);
        req.filter = registry.first_id().map(|id| registry.get(&id).unwrap());

        let figure = assembler.assemble(&req).await.unwrap();
        let left = figure.axis(AxisSide::Left).unwrap();

        assert_eq!(left.series.len(), 2);
        assert_eq!(left.series[0].values.len(), left.series[1].values.len());
        assert_eq!(left.series[1].role, SeriesRole::Filtered);
    }

    #[tokio::test]
    async fn test_style_override_applies_to_raw_left_series() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));
        let mut req = request(&["2020-01-01"], Some(MetricName::Cct), false);
        req.style_override = Some(SeriesStyle {
            color: "magenta".to_string(),
            marker: Some("o".to_string()),
            dash: "--".to_string(),
        });

        let figure = assembler.assemble(&req).await.unwrap();

        assert_eq!(figure.axis(AxisSide::Left).unwrap().series[0].style.color, "magenta");
        assert_eq!(figure.axis(AxisSide::Right).unwrap().series[0].style.color, "red");
    }

    #[tokio::test]
    async fn test_null_cells_become_gaps() {
        use serde_json::json;

        let frame = Frame::new(
            vec!["date".to_string(), "time".to_string(), "illum".to_string()],
            vec![
                vec![json!("2020-01-01"), json!("12:00:00"), json!(100.0)],
                vec![json!("2020-01-01"), json!("12:01:00"), serde_json::Value::Null],
            ],
        );
        let assembler = assembler(Arc::new(MemoryTable::new().with_table("nt_srs", frame)));

        let figure = assembler
            .assemble(&request(&["2020-01-01"], None, false))
            .await
            .unwrap();

        let values = &figure.axis(AxisSide::Left).unwrap().series[0].values;
        assert_eq!(values[0], 100.0);
        assert!(values[1].is_nan());
    }

    /// Each metric column has its own row count, as with sparse InfluxDB fields
    struct SparseSource;

    #[async_trait]
    impl TableSource for SparseSource {
        async fn distinct_sorted(&self, _query: &TableQuery, _column: &str) -> anyhow::Result<Vec<String>> {
            Ok(vec!["2020-01-01".to_string(), "2020-01-02".to_string()])
        }

        async fn materialize(&self, query: &TableQuery) -> anyhow::Result<Frame> {
            use serde_json::json;

            let times = match query.columns.get(1).map(String::as_str) {
                Some("illum") => vec!["06:00:00", "06:01:00", "06:02:00"],
                Some("cct") => vec!["06:00:00", "06:02:00"],
                _ => vec![],
            };
            let rows = times
                .into_iter()
                .enumerate()
                .map(|(i, t)| vec![json!(t), json!(i as f64)])
                .collect();
            Ok(Frame::new(query.columns.clone(), rows))
        }
    }

    struct Truncating;

    impl SmoothingFilter for Truncating {
        fn id(&self) -> crate::application::filter::AlgorithmId {
            crate::application::filter::AlgorithmId::new("truncating")
        }

        fn name(&self) -> &str {
            "truncating"
        }

        fn process(&self, values: &[f64]) -> Vec<f64> {
            values.iter().skip(1).copied().collect()
        }
    }

    #[tokio::test]
    async fn test_right_axis_uses_its_own_rows() {
        let assembler = assembler(Arc::new(SparseSource));

        let figure = assembler
            .assemble(&request(&["2020-01-01", "2020-01-02"], Some(MetricName::Cct), false))
            .await
            .unwrap();

        let left = figure.axis(AxisSide::Left).unwrap();
        let right = figure.axis(AxisSide::Right).unwrap();
        assert_eq!(left.series.len(), 2);
        assert_eq!(right.series.len(), 2);
        assert!(left.series.iter().all(|s| s.values.len() == 3));
        assert!(right.series.iter().all(|s| s.values.len() == 2));
        assert_eq!(figure.x_ticks.positions(), vec![0]);
    }

    #[tokio::test]
    async fn test_empty_right_metric_keeps_left_series() {
        let assembler = assembler(Arc::new(SparseSource));

        let figure = assembler
            .assemble(&request(&["2020-01-01"], Some(MetricName::Swr), true))
            .await
            .unwrap();

        assert!(figure.axis(AxisSide::Right).is_none());
        assert_eq!(figure.series_count(), 2);
        assert_eq!(figure.legend.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_changing_length_is_rejected() {
        let assembler = assembler(Arc::new(sample_table(&["2020-01-01"])));
        let mut req = request(&["2020-01-01"], None, false);
        req.filter = Some(Arc::new(Truncating));

        let err = assembler.assemble(&req).await.unwrap_err();

        assert!(matches!(err, ChartError::InvalidColumn { ref column, .. } if column == "illum"));
    }
}
