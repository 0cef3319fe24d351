//! VM resource model
//!
//! Each update operation independently fetches a fresh live snapshot,
//! compares it to the desired value and calls through to the transport
//! only when they differ. Metadata, guest customization and storage
//! profile are the exceptions and are written unconditionally. There is
//! no snapshot cache: consecutive accessor calls may observe different
//! remote state.

use crate::error::{Result, VcloudError};
use crate::query::{QueryOptions, QueryRunner};
use crate::resource_id::{ResourceId, ResourceKind};
use crate::service::ServiceInterface;
use crate::vapp::Vapp;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tracing::debug;
use vaporflow_core::{TemplateProcessor, Variables};

/// Memory allocations below this floor are silently skipped
const MIN_MEMORY_SIZE_MB: u64 = 64;

/// RASD resource type of a CPU item in the virtual hardware section
const RASD_TYPE_CPU: &str = "3";
/// RASD resource type of a memory item in the virtual hardware section
const RASD_TYPE_MEMORY: &str = "4";

/// One extra disk to create on a VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskSpec {
    /// Disk size in MB
    pub size: u64,
}

/// Desired configuration of one network interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Network name to attach to
    pub name: String,

    /// Static address; presence implies MANUAL allocation unless `mode` overrides
    #[serde(default)]
    pub ip_address: Option<String>,

    /// Explicit allocation mode (MANUAL/DHCP/POOL)
    #[serde(default)]
    pub mode: Option<String>,
}

/// Bootstrap configuration for the guest customization preamble
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapSpec {
    /// Template file rendered into the preamble; no path means empty preamble
    #[serde(default)]
    pub script_path: Option<PathBuf>,

    /// External command fed the rendered preamble on stdin; its stdout
    /// becomes the final payload
    #[serde(default)]
    pub script_post_processor: Option<PathBuf>,

    /// Variables exposed to the script template under `vars`
    #[serde(default)]
    pub vars: Variables,
}

/// A VM on the remote platform, associated with its owning vApp
///
/// The vApp is an association, not ownership: it outlives individual VM
/// update calls and is only mutated where explicitly noted (metadata).
pub struct Vm {
    id: ResourceId,
    vapp: Vapp,
    api: Arc<dyn ServiceInterface>,
}

impl Vm {
    /// Wrap an existing VM identifier
    ///
    /// Fails immediately if `id` is not a well-formed VM identifier.
    pub fn new(api: Arc<dyn ServiceInterface>, id: &str, vapp: Vapp) -> Result<Self> {
        Ok(Self {
            id: ResourceId::parse(ResourceKind::Vm, id)?,
            vapp,
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

    /// Current memory allocation in MB, from a fresh snapshot
    pub async fn memory(&self) -> Result<u64> {
        self.virtual_hardware_quantity(RASD_TYPE_MEMORY).await
    }

    /// Current virtual CPU count, from a fresh snapshot
    pub async fn cpu(&self) -> Result<u64> {
        self.virtual_hardware_quantity(RASD_TYPE_CPU).await
    }

    /// Current name, from a fresh snapshot
    pub async fn name(&self) -> Result<String> {
        let attributes = self.attributes().await?;
        attributes
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VcloudError::Attributes(format!("VM {} snapshot has no name", self.id)))
    }

    /// Current href, from a fresh snapshot
    pub async fn href(&self) -> Result<String> {
        let attributes = self.attributes().await?;
        attributes
            .get("href")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VcloudError::Attributes(format!("VM {} snapshot has no href", self.id)))
    }

    /// Name of the owning vApp (live fetch via the vApp)
    pub async fn vapp_name(&self) -> Result<String> {
        self.vapp.name().await
    }

    /// Set memory to `new_memory` MB if it differs from the current value
    ///
    /// No-op when `new_memory` is absent or below the 64MB floor.
    pub async fn update_memory_size_in_mb(&self, new_memory: Option<u64>) -> Result<()> {
        let Some(new_memory) = new_memory else {
            return Ok(());
        };
        if new_memory < MIN_MEMORY_SIZE_MB {
            return Ok(());
        }

        if self.memory().await? != new_memory {
            debug!(vm = %self.id, memory_in_mb = new_memory, "Updating VM memory");
            self.api.put_memory(&self.id, new_memory).await?;
        }
        Ok(())
    }

    /// Set the CPU count if it differs from the current value
    ///
    /// No-op when `new_cpu_count` is absent or zero.
    pub async fn update_cpu_count(&self, new_cpu_count: Option<u64>) -> Result<()> {
        let Some(new_cpu_count) = new_cpu_count else {
            return Ok(());
        };
        if new_cpu_count == 0 {
            return Ok(());
        }

        if self.cpu().await? != new_cpu_count {
            debug!(vm = %self.id, cpu_count = new_cpu_count, "Updating VM cpu count");
            self.api.put_cpu(&self.id, new_cpu_count).await?;
        }
        Ok(())
    }

    /// Rename the VM if the current name differs
    pub async fn update_name(&self, new_name: &str) -> Result<()> {
        if self.name().await? != new_name {
            debug!(vm = %self.id, new_name, "Updating VM name");
            self.api.put_vm(&self.id, new_name, json!({})).await?;
        }
        Ok(())
    }

    /// Write every metadata pair to both the owning vApp and the VM
    ///
    /// Unconditional: metadata is always refreshed, never diffed. One write
    /// per key per target, in map iteration order.
    pub async fn update_metadata(
        &self,
        metadata: Option<&serde_json::Map<String, Value>>,
    ) -> Result<()> {
        let Some(metadata) = metadata else {
            return Ok(());
        };

        for (key, value) in metadata {
            self.api
                .put_vapp_metadata_value(self.vapp.id(), key, value)
                .await?;
            self.api
                .put_vapp_metadata_value(&self.id, key, value)
                .await?;
        }
        Ok(())
    }

    /// Create one disk per entry, in list order
    ///
    /// Additive only: pre-existing disks are never reconciled or removed.
    pub async fn add_extra_disks(&self, extra_disks: Option<&[DiskSpec]>) -> Result<()> {
        let Some(extra_disks) = extra_disks else {
            return Ok(());
        };

        let href = self.href().await?;
        for extra_disk in extra_disks {
            debug!(
                vm = %self.id,
                size_in_mb = extra_disk.size,
                "Adding an extra disk to VM"
            );
            self.api.create_disk(&href, extra_disk.size).await?;
        }
        Ok(())
    }

    /// Replace the full network connection section
    ///
    /// Null entries are dropped before indexing; entry `i`'s connection
    /// index is its position in the compacted list. Allocation mode
    /// defaults to MANUAL when an address is given, DHCP otherwise.
    pub async fn configure_network_interfaces(
        &self,
        networks: Option<&[Option<NetworkSpec>]>,
    ) -> Result<()> {
        let Some(networks) = networks else {
            return Ok(());
        };

        let connections: Vec<Value> = networks
            .iter()
            .flatten()
            .enumerate()
            .map(|(index, network)| {
                let mode = network.mode.clone().unwrap_or_else(|| {
                    if network.ip_address.is_some() {
                        "MANUAL".to_string()
                    } else {
                        "DHCP".to_string()
                    }
                });
                let mut connection = json!({
                    "network": network.name,
                    "needsCustomization": true,
                    "NetworkConnectionIndex": index,
                    "IsConnected": true,
                    "IpAddressAllocationMode": mode,
                });
                if let Some(ip_address) = &network.ip_address {
                    connection["IpAddress"] = json!(ip_address);
                }
                connection
            })
            .collect();

        let section = json!({
            "PrimaryNetworkConnectionIndex": 0,
            "NetworkConnection": connections,
        });

        debug!(vm = %self.id, connections = connections_len(&section), "Replacing network connection section");
        self.api
            .put_network_connection_system_section(&self.id, section)
            .await
    }

    /// Overwrite the guest customization section
    ///
    /// With no bootstrap script path the preamble is empty text. Otherwise
    /// the script is rendered as a template with `vapp_name` and `vars`
    /// (bootstrap vars plus the resolved extra-disks list), optionally
    /// piped through the post-processor. Always written, never diffed.
    pub async fn configure_guest_customization_section(
        &self,
        name: &str,
        bootstrap: Option<&BootstrapSpec>,
        extra_disks: Option<&[DiskSpec]>,
    ) -> Result<()> {
        let script = bootstrap.and_then(|b| b.script_path.as_deref().map(|path| (b, path)));

        let preamble = match script {
            None => String::new(),
            Some((bootstrap, script_path)) => {
                self.generate_preamble(
                    script_path,
                    bootstrap.script_post_processor.as_deref(),
                    &bootstrap.vars,
                    extra_disks,
                )
                .await?
            }
        };

        self.api
            .put_guest_customization_section(&self.id, name, &preamble)
            .await
    }

    /// Point the VM at a named storage profile
    ///
    /// Resolves the profile href through the owning vApp's VDC (vApp query
    /// for vdcName, then profile query by name and vdcName), then writes
    /// unconditionally.
    pub async fn update_storage_profile(&self, storage_profile: &str) -> Result<()> {
        let vapp_name = self.vapp.name().await?;
        let href = self
            .storage_profile_href_by_name(storage_profile, &vapp_name)
            .await?;

        let name = self.name().await?;
        self.api
            .put_vm(
                &self.id,
                &name,
                json!({
                    "StorageProfile": {
                        "name": storage_profile,
                        "href": href,
                    }
                }),
            )
            .await
    }

    async fn generate_preamble(
        &self,
        script_path: &Path,
        post_processor: Option<&Path>,
        vars: &Variables,
        extra_disks: Option<&[DiskSpec]>,
    ) -> Result<String> {
        let mut preamble_vars = vars.clone();
        preamble_vars.insert(
            "extra_disks".to_string(),
            serde_json::to_value(extra_disks.unwrap_or(&[]))?,
        );

        // Isolated context: only vapp_name and the supplied vars are visible
        let mut processor = TemplateProcessor::new();
        processor.add_variable("vapp_name", json!(self.vapp.name().await?));
        processor.add_variable("vars", serde_json::to_value(&preamble_vars)?);

        let rendered = processor.render_file(script_path)?;

        match post_processor {
            Some(command) => post_process(command, &rendered).await,
            None => Ok(rendered),
        }
    }

    async fn storage_profile_href_by_name(
        &self,
        storage_profile_name: &str,
        vapp_name: &str,
    ) -> Result<String> {
        let runner = QueryRunner::new(self.api.clone());

        let vapp_records = runner
            .run("vApp", &QueryOptions::with_filter(format!("name=={vapp_name}")))
            .await?;
        let vdc_name = vapp_records
            .first()
            .and_then(|record| record.get("vdcName"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VcloudError::NotFound(format!("vdcName for vApp '{vapp_name}' not found"))
            })?;

        let profile_records = runner
            .run(
                "orgVdcStorageProfile",
                &QueryOptions::with_filter(format!(
                    "name=={storage_profile_name};vdcName=={vdc_name}"
                )),
            )
            .await?;

        profile_records
            .first()
            .and_then(|record| record.get("href"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                VcloudError::NotFound(format!(
                    "storage profile '{storage_profile_name}' not found in vdc '{vdc_name}'"
                ))
            })
    }

    async fn virtual_hardware_quantity(&self, rasd_type: &str) -> Result<u64> {
        let attributes = self.attributes().await?;
        let items = attributes
            .get("ovf:VirtualHardwareSection")
            .and_then(|section| section.get("ovf:Item"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                VcloudError::Attributes(format!(
                    "VM {} snapshot has no virtual hardware section",
                    self.id
                ))
            })?;

        let item = items
            .iter()
            .find(|item| {
                item.get("rasd:ResourceType").and_then(Value::as_str) == Some(rasd_type)
            })
            .ok_or_else(|| {
                VcloudError::Attributes(format!(
                    "VM {} has no hardware item of type {rasd_type}",
                    self.id
                ))
            })?;

        quantity(item.get("rasd:VirtualQuantity")).ok_or_else(|| {
            VcloudError::Attributes(format!(
                "VM {} hardware item {rasd_type} has no readable quantity",
                self.id
            ))
        })
    }
}

/// The platform reports hardware quantities as strings; tolerate both
fn quantity(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn connections_len(section: &Value) -> usize {
    section
        .get("NetworkConnection")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

/// Pipe `input` through an external command, returning its captured stdout
async fn post_process(command: &Path, input: &str) -> Result<String> {
    use tokio::io::AsyncWriteExt;

    let mut child = tokio::process::Command::new(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        VcloudError::PostProcessor(format!("{}: could not open stdin", command.display()))
    })?;
    stdin.write_all(input.as_bytes()).await?;
    drop(stdin);

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(VcloudError::PostProcessor(format!(
            "{}: {}",
            command.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
