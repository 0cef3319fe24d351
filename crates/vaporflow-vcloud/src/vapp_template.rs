//! vApp template resource model

use crate::error::{Result, VcloudError};
use crate::query::{QueryOptions, QueryRunner};
use crate::resource_id::{ResourceId, ResourceKind};
use crate::service::ServiceInterface;
use serde_json::Value;
use std::sync::Arc;

/// A vApp template stored in a catalog
pub struct VappTemplate {
    id: ResourceId,
    api: Arc<dyn ServiceInterface>,
}

impl VappTemplate {
    /// Wrap an existing template identifier
    pub fn new(api: Arc<dyn ServiceInterface>, id: &str) -> Result<Self> {
        Ok(Self {
            id: ResourceId::parse(ResourceKind::VappTemplate, id)?,
            api,
        })
    }

    /// Locate a template by catalog and name
    ///
    /// Exactly one match is required: zero matches is a not-found error,
    /// several matches is ambiguous and refused.
    pub async fn get(
        api: Arc<dyn ServiceInterface>,
        catalog_name: &str,
        template_name: &str,
    ) -> Result<Self> {
        let runner = QueryRunner::new(api.clone());
        let records = runner
            .run(
                "vAppTemplate",
                &QueryOptions::with_filter(format!(
                    "name=={template_name};catalogName=={catalog_name}"
                )),
            )
            .await?;

        if records.len() > 1 {
            return Err(VcloudError::Ambiguous(format!(
                "{} templates named '{template_name}' in catalog '{catalog_name}'",
                records.len()
            )));
        }

        let record = records.first().ok_or_else(|| {
            VcloudError::NotFound(format!(
                "template '{template_name}' not found in catalog '{catalog_name}'"
            ))
        })?;
        let href = record.get("href").and_then(Value::as_str).ok_or_else(|| {
            VcloudError::Attributes(format!("template '{template_name}' record has no href"))
        })?;

        Ok(Self {
            id: ResourceId::from_href(ResourceKind::VappTemplate, href)?,
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
}
