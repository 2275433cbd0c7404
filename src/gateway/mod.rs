//! Data gateway: one request per logical table, rows out
//!
//! The gateway hides the remote envelope shape; callers only ever see a
//! sequence of rows.

pub mod envelope;
mod http;

pub use envelope::{decode_rows, Envelope, EnvelopeKey};
pub use http::HttpGateway;

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Result, Row};

/// Equality filters applied by the remote side, column → scalar
pub type Filter = BTreeMap<String, Value>;

/// Request body sent for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    pub table_name: String,
    /// Requested projection; advisory only
    pub columns: Vec<String>,
    pub filters: Filter,
}

impl TableQuery {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            filters: Filter::new(),
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    pub fn filters(mut self, filters: &Filter) -> Self {
        self.filters
            .extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Source of table rows
pub trait RowSource: Send + Sync {
    /// Fetch rows for one table. Only transport failures are errors; an
    /// unreadable or unrecognized response yields an empty sequence.
    fn fetch_rows(&self, query: &TableQuery) -> impl Future<Output = Result<Vec<Row>>> + Send;
}
