//! Transport seam to the remote control plane
//!
//! The real HTTP/XML session lives outside this crate; everything here
//! talks to it through [`ServiceInterface`]. Mutating calls return once
//! the request is accepted by the platform, not once the platform's
//! asynchronous task has applied it. Timeouts and cancellation belong to
//! the implementor.

use crate::error::Result;
use crate::resource_id::ResourceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One flat-ish record returned by the query API
pub type Record = serde_json::Map<String, Value>;

/// A single page of query results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    /// Records on this page
    pub records: Vec<Record>,

    /// 1-based page number of this page
    pub page: u32,

    /// Total number of pages for the query
    pub num_pages: u32,
}

/// Remote control plane session
///
/// Payload shapes passed through these methods must match the platform's
/// expected wire shape exactly; resource models are the sole place those
/// shapes are assembled.
#[async_trait]
pub trait ServiceInterface: Send + Sync {
    /// Fetch the full live attribute snapshot of a resource
    async fn get_resource(&self, id: &ResourceId) -> Result<Value>;

    /// Set the memory allocation of a VM, in MB
    async fn put_memory(&self, id: &ResourceId, memory_in_mb: u64) -> Result<()>;

    /// Set the virtual CPU count of a VM
    async fn put_cpu(&self, id: &ResourceId, cpu_count: u64) -> Result<()>;

    /// Update a VM's name and any additional top-level fields in `options`
    async fn put_vm(&self, id: &ResourceId, name: &str, options: Value) -> Result<()>;

    /// Write a single metadata key/value pair onto a resource
    async fn put_vapp_metadata_value(&self, id: &ResourceId, key: &str, value: &Value)
        -> Result<()>;

    /// Replace the full network connection section of a VM
    async fn put_network_connection_system_section(
        &self,
        id: &ResourceId,
        section: Value,
    ) -> Result<()>;

    /// Overwrite the guest customization section of a VM
    async fn put_guest_customization_section(
        &self,
        id: &ResourceId,
        name: &str,
        preamble: &str,
    ) -> Result<()>;

    /// Create an additional disk of `size_in_mb` on the VM at `vm_href`
    async fn create_disk(&self, vm_href: &str, size_in_mb: u64) -> Result<()>;

    /// Overwrite a service section of an edge gateway's configuration
    async fn post_edge_gateway_configuration(
        &self,
        id: &ResourceId,
        configuration: Value,
    ) -> Result<()>;

    /// List the entity types the query API supports, as (type, format) pairs
    async fn available_query_types(&self) -> Result<Vec<(String, String)>>;

    /// Execute one page of a filtered query
    ///
    /// `filter` is passed through verbatim; malformed expressions surface
    /// as a remote request failure.
    async fn execute_query(
        &self,
        type_name: &str,
        fields: Option<&str>,
        filter: Option<&str>,
        page: u32,
    ) -> Result<QueryPage>;
}
