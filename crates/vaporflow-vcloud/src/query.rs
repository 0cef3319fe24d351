//! Generic query facility over the remote inventory API
//!
//! Resolves human-readable names to opaque identifiers via filtered,
//! field-limited queries. Results are materialized eagerly so that
//! callers can index into the returned list directly. A query result is
//! a snapshot and rows may already be stale by the time they are
//! consumed.

use crate::error::Result;
use crate::service::{Record, ServiceInterface};
use std::sync::Arc;
use tracing::debug;

/// Options for one query request
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Comma-separated list of fields to return; platform default set when omitted
    pub fields: Option<String>,

    /// Equality/AND filter expression (`name==X;vdcName==Y`), passed through verbatim
    pub filter: Option<String>,
}

impl QueryOptions {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            fields: None,
            filter: Some(filter.into()),
        }
    }

    pub fn with_fields(fields: impl Into<String>) -> Self {
        Self {
            fields: Some(fields.into()),
            filter: None,
        }
    }
}

/// Runs filtered queries against the inventory API
pub struct QueryRunner {
    api: Arc<dyn ServiceInterface>,
}

impl QueryRunner {
    pub fn new(api: Arc<dyn ServiceInterface>) -> Self {
        Self { api }
    }

    /// Entity types the query API supports, as (type, format) pairs
    pub async fn available_query_types(&self) -> Result<Vec<(String, String)>> {
        self.api.available_query_types().await
    }

    /// Run one query and return the fully materialized record list
    ///
    /// Paginates internally; an empty list is a valid, non-error outcome.
    pub async fn run(&self, type_name: &str, options: &QueryOptions) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let result = self
                .api
                .execute_query(
                    type_name,
                    options.fields.as_deref(),
                    options.filter.as_deref(),
                    page,
                )
                .await?;

            debug!(
                type_name,
                page,
                num_pages = result.num_pages,
                record_count = result.records.len(),
                "Fetched query page"
            );

            let num_pages = result.num_pages.max(1);
            records.extend(result.records);

            if page >= num_pages {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}
