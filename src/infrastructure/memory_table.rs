// In-process table source, loaded from a JSON snapshot or built in tests
use crate::application::table::{Frame, TableQuery, TableSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryTable {
    tables: HashMap<String, Frame>,
    #[cfg(test)]
    materialized: AtomicUsize,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, frame: Frame) -> Self {
        self.tables.insert(name.to_string(), frame);
        self
    }

    /// Load a `{"columns": [...], "rows": [[...], ...]}` snapshot as table `name`
    pub fn from_json_file(name: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table snapshot {}", path.display()))?;
        let frame: Frame = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse table snapshot {}", path.display()))?;

        tracing::info!("Loaded {} rows for table {} from {}", frame.len(), name, path.display());
        Ok(Self::new().with_table(name, frame))
    }

    /// Number of `materialize` calls served so far
    #[cfg(test)]
    pub fn materialize_count(&self) -> usize {
        self.materialized.load(Ordering::Relaxed)
    }

    fn matching_rows<'a>(&'a self, query: &TableQuery) -> Result<(&'a Frame, Vec<&'a Vec<Value>>)> {
        let frame = self
            .tables
            .get(&query.table)
            .ok_or_else(|| anyhow!("unknown dataframe '{}'", query.table))?;

        let mut predicates = Vec::with_capacity(query.predicates.len());
        for p in &query.predicates {
            predicates.push((frame.column_index(&p.column)?, p.value.as_str()));
        }

        let rows = frame
            .rows
            .iter()
            .filter(|row| {
                predicates
                    .iter()
                    .all(|(idx, value)| row.get(*idx).map(cell_text).as_deref() == Some(*value))
            })
            .collect();

        Ok((frame, rows))
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableSource for MemoryTable {
    async fn distinct_sorted(&self, query: &TableQuery, column: &str) -> Result<Vec<String>> {
        let (frame, rows) = self.matching_rows(query)?;
        let idx = frame.column_index(column)?;

        let values: BTreeSet<String> = rows
            .into_iter()
            .filter_map(|row| row.get(idx))
            .filter(|cell| !cell.is_null())
            .map(cell_text)
            .collect();

        Ok(values.into_iter().collect())
    }

    async fn materialize(&self, query: &TableQuery) -> Result<Frame> {
        #[cfg(test)]
        self.materialized.fetch_add(1, Ordering::Relaxed);
        let (frame, rows) = self.matching_rows(query)?;

        let columns = if query.columns.is_empty() {
            frame.columns.clone()
        } else {
            query.columns.clone()
        };
        let mut indices = Vec::with_capacity(columns.len());
        for column in &columns {
            indices.push(frame.column_index(column)?);
        }

        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(Frame::new(columns, rows))
    }
}

/// Fixture shared by the test modules: one row per minute between 05:58 and 07:01
/// for each date, with illum rising by one per row.
#[cfg(test)]
pub(crate) fn sample_table(dates: &[&str]) -> MemoryTable {
    use serde_json::json;

    let columns = ["date", "time", "illum", "cct", "swr"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    let mut rows = Vec::new();
    for date in dates {
        for (i, minute) in (5 * 60 + 58..=7 * 60 + 1).enumerate() {
            rows.push(vec![
                json!(date),
                json!(format!("{:02}:{:02}:00", minute / 60, minute % 60)),
                json!(i as f64),
                json!(5000.0 + i as f64),
                json!(0.5),
            ]);
        }
    }

    MemoryTable::new().with_table("nt_srs", Frame::new(columns, rows))
}
