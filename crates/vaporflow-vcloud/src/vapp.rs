//! vApp resource model

use crate::error::{Result, VcloudError};
use crate::query::{QueryOptions, QueryRunner};
use crate::resource_id::{ResourceId, ResourceKind};
use crate::service::ServiceInterface;
use serde_json::Value;
use std::sync::Arc;

/// A vApp on the remote platform
///
/// Read accessors re-fetch the full live attribute snapshot on every call;
/// two accessor calls are not guaranteed to observe the same snapshot.
pub struct Vapp {
    id: ResourceId,
    api: Arc<dyn ServiceInterface>,
}

impl Vapp {
    /// Wrap an existing vApp identifier
    ///
    /// Fails immediately if `id` is not a well-formed vApp identifier.
    pub fn new(api: Arc<dyn ServiceInterface>, id: &str) -> Result<Self> {
        Ok(Self {
            id: ResourceId::parse(ResourceKind::Vapp, id)?,
            api,
        })
    }

    /// Locate a vApp by name via the query API
    pub async fn get_by_name(api: Arc<dyn ServiceInterface>, name: &str) -> Result<Self> {
        let runner = QueryRunner::new(api.clone());
        let records = runner
            .run("vApp", &QueryOptions::with_filter(format!("name=={name}")))
            .await?;

        let record = records
            .first()
            .ok_or_else(|| VcloudError::NotFound(format!("vApp '{name}' not found")))?;
        let href = record
            .get("href")
            .and_then(Value::as_str)
            .ok_or_else(|| VcloudError::Attributes(format!("vApp '{name}' record has no href")))?;

        Ok(Self {
            id: ResourceId::from_href(ResourceKind::Vapp, href)?,
            api,
        })
    }

    /// Locate a vApp by name within a specific VDC
    pub async fn get_by_name_and_vdc_name(
        api: Arc<dyn ServiceInterface>,
        name: &str,
        vdc_name: &str,
    ) -> Result<Self> {
        let runner = QueryRunner::new(api.clone());
        let records = runner
            .run(
                "vApp",
                &QueryOptions::with_filter(format!("name=={name};vdcName=={vdc_name}")),
            )
            .await?;

        let record = records.first().ok_or_else(|| {
            VcloudError::NotFound(format!("vApp '{name}' not found in vdc '{vdc_name}'"))
        })?;
        let href = record
            .get("href")
            .and_then(Value::as_str)
            .ok_or_else(|| VcloudError::Attributes(format!("vApp '{name}' record has no href")))?;

        Ok(Self {
            id: ResourceId::from_href(ResourceKind::Vapp, href)?,
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

    /// Current name, from a fresh snapshot
    pub async fn name(&self) -> Result<String> {
        let attributes = self.attributes().await?;
        attributes
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VcloudError::Attributes(format!("vApp {} snapshot has no name", self.id)))
    }

    /// Current href, from a fresh snapshot
    pub async fn href(&self) -> Result<String> {
        let attributes = self.attributes().await?;
        attributes
            .get("href")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VcloudError::Attributes(format!("vApp {} snapshot has no href", self.id)))
    }

    /// Name of the VDC containing this vApp, resolved via the query API
    pub async fn vdc_name(&self) -> Result<String> {
        let name = self.name().await?;
        let runner = QueryRunner::new(self.api.clone());
        let records = runner
            .run("vApp", &QueryOptions::with_filter(format!("name=={name}")))
            .await?;

        records
            .first()
            .and_then(|record| record.get("vdcName"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VcloudError::NotFound(format!("vdcName for vApp '{name}' not found")))
    }
}
