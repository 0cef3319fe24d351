//! Edge gateway resource model
//!
//! Unlike the VM's per-field diffing, edge gateway updates are a bulk
//! overwrite: the caller supplies the complete desired sub-tree for a
//! service kind (firewall, load balancer, NAT) and it is posted intact.

use crate::error::{Result, VcloudError};
use crate::query::{QueryOptions, QueryRunner};
use crate::resource_id::{ResourceId, ResourceKind};
use crate::service::ServiceInterface;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// An edge gateway on the remote platform
pub struct EdgeGateway {
    id: ResourceId,
    api: Arc<dyn ServiceInterface>,
}

impl EdgeGateway {
    /// Wrap an existing edge gateway identifier
    pub fn new(api: Arc<dyn ServiceInterface>, id: &str) -> Result<Self> {
        Ok(Self {
            id: ResourceId::parse(ResourceKind::EdgeGateway, id)?,
            api,
        })
    }

    /// Locate an edge gateway by name via the query API
    pub async fn get_by_name(api: Arc<dyn ServiceInterface>, name: &str) -> Result<Self> {
        let runner = QueryRunner::new(api.clone());
        let records = runner
            .run(
                "edgeGateway",
                &QueryOptions::with_filter(format!("name=={name}")),
            )
            .await?;

        let record = records
            .first()
            .ok_or_else(|| VcloudError::NotFound(format!("edge gateway '{name}' not found")))?;
        let href = record.get("href").and_then(Value::as_str).ok_or_else(|| {
            VcloudError::Attributes(format!("edge gateway '{name}' record has no href"))
        })?;

        Ok(Self {
            id: ResourceId::from_href(ResourceKind::EdgeGateway, href)?,
            api,
        })
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Fetch the current full attribute snapshot
    pub async fn attributes(&self) -> Result<Value> {
        self.api.get_resource(&self.id).await
    }

    /// Overwrite a service-configuration sub-tree on the gateway
    ///
    /// The fragment passes through verbatim; no field-level diff is
    /// attempted. The platform applies it as an asynchronous task, so
    /// this call returns once the request is accepted.
    pub async fn update_configuration(&self, configuration: &Value) -> Result<()> {
        info!(edge_gateway = %self.id, "Posting edge gateway service configuration");
        self.api
            .post_edge_gateway_configuration(&self.id, configuration.clone())
            .await
    }
}
