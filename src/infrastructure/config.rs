use crate::application::panel::MetricSpec;
use crate::domain::error::ChartError;
use crate::domain::metric::MetricName;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub source: SourceSettings,
    pub influx: Option<InfluxSettings>,
    #[serde(default)]
    pub table: TableSettings,
    #[serde(default)]
    pub metrics: HashMap<String, MetricOverride>,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default)]
    pub visual: VisualDefaults,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSettings {
    #[default]
    Influx,
    /// JSON snapshot served from memory
    File { path: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    /// IANA zone for the hour labels, e.g. "Europe/Berlin". Unset means UTC.
    #[serde(default)]
    pub tz: Option<String>,
}

/// Where the daily rows live and which columns key them
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TableSettings {
    pub name: String,
    pub date_column: String,
    pub time_column: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            name: "nt_srs".to_string(),
            date_column: "date".to_string(),
            time_column: "time".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MetricOverride {
    pub column: Option<String>,
    pub scale: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterSettings {
    pub window: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { window: 5 }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VisualDefaults {
    pub enabled: bool,
}

impl DashboardConfig {
    /// Per-metric column and scale, with overrides applied
    pub fn metric_specs(&self) -> Result<Vec<MetricSpec>, ChartError> {
        let mut specs: Vec<MetricSpec> = MetricName::ALL.into_iter().map(MetricSpec::standard).collect();

        for (name, overrides) in &self.metrics {
            let metric: MetricName = name.parse()?;
            let spec = specs
                .iter_mut()
                .find(|s| s.metric == metric)
                .ok_or_else(|| ChartError::UnknownMetric(name.clone()))?;

            if let Some(column) = &overrides.column {
                spec.column = column.clone();
            }
            if let Some(scale) = overrides.scale {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(ChartError::InvalidSetting {
                        field: "metrics.scale",
                        value: scale.to_string(),
                    });
                }
                spec.scale = scale;
            }
        }

        Ok(specs)
    }
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix("DAILY_CHART").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [influx]
            host = "http://localhost:8086/"
            token = "secret"
            database = "sensors"
            retention_policy = "autogen"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.influx.as_ref().and_then(|i| i.tz.clone()), None);
        assert_eq!(config.source, SourceSettings::Influx);
        assert_eq!(config.table, TableSettings::default());
        assert_eq!(config.filter.window, 5);
        assert!(!config.visual.enabled);

        let specs = config.metric_specs().unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0], MetricSpec::standard(MetricName::Illum));
    }

    #[test]
    fn test_metric_overrides() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [source]
            kind = "file"
            path = "data/nt_srs.json"

            [table]
            name = "daily"

            [metrics.cct]
            scale = 8000.0

            [metrics.swr]
            column = "swr_ratio"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.source,
            SourceSettings::File {
                path: "data/nt_srs.json".to_string()
            }
        );
        assert_eq!(config.table.name, "daily");
        assert_eq!(config.table.date_column, "date");

        let specs = config.metric_specs().unwrap();
        let cct = specs.iter().find(|s| s.metric == MetricName::Cct).unwrap();
        let swr = specs.iter().find(|s| s.metric == MetricName::Swr).unwrap();
        assert_eq!(cct.scale, 8000.0);
        assert_eq!(swr.column, "swr_ratio");
        assert_eq!(swr.scale, MetricName::Swr.default_scale());
    }

    #[test]
    fn test_influx_timezone() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [influx]
            host = "http://localhost:8086"
            token = "secret"
            database = "sensors"
            retention_policy = "autogen"
            tz = "Asia/Tokyo"
            "#,
        )
        .unwrap();

        assert_eq!(config.influx.unwrap().tz.as_deref(), Some("Asia/Tokyo"));
    }

    #[test]
    fn test_unknown_metric_override_rejected() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [metrics.lux]
            scale = 10.0
            "#,
        )
        .unwrap();

        assert!(matches!(config.metric_specs(), Err(ChartError::UnknownMetric(_))));
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [metrics.illum]
            scale = 0.0
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.metric_specs(),
            Err(ChartError::InvalidSetting { field: "metrics.scale", .. })
        ));
    }
}
