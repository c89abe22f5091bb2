// Backing table abstraction - a lazy query handle over a dataframe source
use crate::domain::error::ChartError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Equality predicate on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    pub predicates: Vec<Predicate>,
    /// Empty means every column
    pub columns: Vec<String>,
}

/// Materialized, row-oriented query result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ChartError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ChartError::invalid_column(name, "not present in result"))
    }

    fn cells(&self, name: &str) -> Result<impl Iterator<Item = &Value>, ChartError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&NULL)))
    }

    /// Column as labels; numbers are rendered, nulls become empty strings
    pub fn text_column(&self, name: &str) -> Result<Vec<String>, ChartError> {
        self.cells(name)?
            .map(|cell| match cell {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Null => Ok(String::new()),
                other => Err(ChartError::invalid_column(
                    name,
                    format!("expected a label, found {}", other),
                )),
            })
            .collect()
    }

    /// Column as numbers; nulls become NaN gaps, numeric strings are parsed
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, ChartError> {
        self.cells(name)?
            .map(|cell| match cell {
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| ChartError::invalid_column(name, format!("{} is not finite", n))),
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                    ChartError::invalid_column(name, format!("'{}' is not a number", s))
                }),
                Value::Null => Ok(f64::NAN),
                other => Err(ChartError::invalid_column(
                    name,
                    format!("expected a number, found {}", other),
                )),
            })
            .collect()
    }
}

#[async_trait]
pub trait TableSource: Send + Sync {
    /// Distinct values of `column` among the rows matching `query`, sorted ascending
    async fn distinct_sorted(&self, query: &TableQuery, column: &str) -> anyhow::Result<Vec<String>>;

    /// Rows matching `query`, projected onto its columns, in recording order
    async fn materialize(&self, query: &TableQuery) -> anyhow::Result<Frame>;
}

/// Immutable handle; `filter` and `select` return narrowed copies
#[derive(Clone)]
pub struct Table {
    source: Arc<dyn TableSource>,
    query: TableQuery,
}

pub fn get_dataframe(source: Arc<dyn TableSource>, name: &str) -> Table {
    Table {
        source,
        query: TableQuery {
            table: name.to_string(),
            ..TableQuery::default()
        },
    }
}

impl Table {
    #[cfg(test)]
    pub fn query(&self) -> &TableQuery {
        &self.query
    }

    pub fn filter(&self, column: &str, value: &str) -> Table {
        let mut query = self.query.clone();
        query.predicates.push(Predicate {
            column: column.to_string(),
            value: value.to_string(),
        });
        Table {
            source: self.source.clone(),
            query,
        }
    }

    pub fn select(&self, columns: &[&str]) -> Table {
        let mut query = self.query.clone();
        query.columns = columns.iter().map(|c| c.to_string()).collect();
        Table {
            source: self.source.clone(),
            query,
        }
    }

    pub async fn distinct_sorted(&self, column: &str) -> anyhow::Result<Vec<String>> {
        self.source.distinct_sorted(&self.query, column).await
    }

    pub async fn materialize(&self) -> anyhow::Result<Frame> {
        self.source.materialize(&self.query).await
    }
}
