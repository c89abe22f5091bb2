// Date catalog service - Use case for listing the recorded days
use crate::application::panel::DateCatalog;
use crate::application::table::{TableSource, get_dataframe};
use crate::domain::error::ChartError;
use crate::infrastructure::config::TableSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct DateCatalogService {
    source: Arc<dyn TableSource>,
    table: TableSettings,
}

impl DateCatalogService {
    pub fn new(source: Arc<dyn TableSource>, table: TableSettings) -> Self {
        Self { source, table }
    }

    pub async fn list_dates(&self) -> Result<Vec<String>, ChartError> {
        let dates = get_dataframe(self.source.clone(), &self.table.name)
            .distinct_sorted(&self.table.date_column)
            .await
            .map_err(|e| ChartError::DataUnavailable(format!("{:#}", e)))?;

        if dates.is_empty() {
            return Err(ChartError::DataUnavailable(format!(
                "table {} holds no dates",
                self.table.name
            )));
        }

        Ok(dates)
    }

    /// Never fails: an unreachable or empty table yields an inert catalog
    pub async fn load_catalog(&self) -> DateCatalog {
        match self.list_dates().await {
            Ok(dates) => {
                tracing::info!("Loaded {} dates from {}", dates.len(), self.table.name);
                DateCatalog::from_dates(dates)
            }
            Err(e) => {
                tracing::warn!("Date catalog unavailable, drawing disabled: {}", e);
                DateCatalog::unavailable(e.to_string())
            }
        }
    }
}
