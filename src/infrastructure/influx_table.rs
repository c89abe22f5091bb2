// InfluxDB table source implementation
use crate::application::table::{Frame, TableQuery, TableSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// InfluxDB's point timestamp column; served as "HH:MM:SS" labels
const TIMESTAMP_COLUMN: &str = "time";

static NULL: Value = Value::Null;

#[derive(Debug, Clone)]
pub struct InfluxTableSource {
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    /// Zone the timestamps are returned in; None leaves them in UTC
    tz: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl InfluxTableSource {
    pub fn new(host: String, token: String, database: String, retention_policy: String) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            retention_policy,
            tz: None,
            client: reqwest::Client::new(),
        }
    }

    /// Render hour labels in `tz` instead of UTC
    pub fn with_timezone(mut self, tz: Option<String>) -> Self {
        self.tz = tz;
        self
    }

    fn build_query_url(&self, query: &str) -> String {
        let encoded_query = urlencoding::encode(query);
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host, self.database, self.retention_policy, encoded_query
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        tracing::debug!("Executing InfluxQL: {}", query);
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        // Check for errors in the response
        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("InfluxDB query error: {}", error);
            }
        }

        Ok(data)
    }
}

#[async_trait]
impl TableSource for InfluxTableSource {
    async fn distinct_sorted(&self, query: &TableQuery, column: &str) -> Result<Vec<String>> {
        let response = self.execute_query(&show_tag_values(query, column)).await?;
        Ok(tag_values(&response))
    }

    async fn materialize(&self, query: &TableQuery) -> Result<Frame> {
        let response = self
            .execute_query(&select_statement(query, self.tz.as_deref()))
            .await?;
        to_frame(&response, &query.columns)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn where_clause(query: &TableQuery) -> String {
    if query.predicates.is_empty() {
        return String::new();
    }

    let conditions: Vec<String> = query
        .predicates
        .iter()
        .map(|p| format!("{} = {}", quote_ident(&p.column), quote_literal(&p.value)))
        .collect();
    format!(" WHERE {}", conditions.join(" AND "))
}

fn show_tag_values(query: &TableQuery, column: &str) -> String {
    format!(
        "SHOW TAG VALUES FROM {} WITH KEY = {}{}",
        quote_ident(&query.table),
        quote_ident(column),
        where_clause(query)
    )
}

fn select_statement(query: &TableQuery, tz: Option<&str>) -> String {
    // InfluxDB returns the timestamp with every SELECT, so it is never listed
    let fields: Vec<String> = query
        .columns
        .iter()
        .filter(|c| c.as_str() != TIMESTAMP_COLUMN)
        .map(|c| quote_ident(c))
        .collect();
    let projection = if fields.is_empty() { "*".to_string() } else { fields.join(",") };

    // tz() makes InfluxDB return local timestamps with their offset
    let tz_clause = tz.map(|tz| format!(" tz({})", quote_literal(tz))).unwrap_or_default();

    format!(
        "SELECT {} FROM {}{}{}",
        projection,
        quote_ident(&query.table),
        where_clause(query),
        tz_clause
    )
}

/// SHOW TAG VALUES rows are `[key, value]`
fn tag_values(response: &InfluxQLResponse) -> Vec<String> {
    let values: BTreeSet<String> = response
        .results
        .iter()
        .flat_map(|r| r.series.iter().flatten())
        .flat_map(|s| s.values.iter())
        .filter_map(|row| row.get(1).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    values.into_iter().collect()
}

fn timestamp_label(cell: &Value) -> Value {
    match cell.as_str().map(chrono::DateTime::parse_from_rfc3339) {
        Some(Ok(time)) => Value::String(time.format("%H:%M:%S").to_string()),
        _ => cell.clone(),
    }
}

fn to_frame(response: &InfluxQLResponse, requested: &[String]) -> Result<Frame> {
    let series: Vec<&InfluxQLSeries> = response
        .results
        .iter()
        .flat_map(|r| r.series.iter().flatten())
        .collect();

    let columns: Vec<String> = if requested.is_empty() {
        series
            .first()
            .map(|s| s.columns.clone())
            .unwrap_or_default()
    } else {
        requested.to_vec()
    };

    let mut rows = Vec::new();
    for s in series {
        let mut indices = Vec::with_capacity(columns.len());
        for column in &columns {
            let idx = s
                .columns
                .iter()
                .position(|c| c == column)
                .with_context(|| format!("InfluxDB result has no column '{}'", column))?;
            indices.push(idx);
        }

        for value_row in &s.values {
            let row: Vec<Value> = indices
                .iter()
                .zip(&columns)
                .map(|(&idx, column)| {
                    let cell = value_row.get(idx).unwrap_or(&NULL);
                    if column == TIMESTAMP_COLUMN {
                        timestamp_label(cell)
                    } else {
                        cell.clone()
                    }
                })
                .collect();
            rows.push(row);
        }
    }

    Ok(Frame::new(columns, rows))
}
