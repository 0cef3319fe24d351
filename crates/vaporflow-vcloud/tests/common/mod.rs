#![allow(dead_code)]

//! In-memory ServiceInterface double shared by the integration tests.
//!
//! Records every mutating call so tests can assert exactly which writes
//! happened, and serves seeded attribute snapshots and query results.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use vaporflow_vcloud::error::{Result, VcloudError};
use vaporflow_vcloud::{QueryPage, Record, ResourceId, ServiceInterface};

/// One recorded mutating call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PutMemory {
        id: String,
        memory_in_mb: u64,
    },
    PutCpu {
        id: String,
        cpu_count: u64,
    },
    PutVm {
        id: String,
        name: String,
        options: Value,
    },
    PutMetadata {
        id: String,
        key: String,
        value: Value,
    },
    PutNetworkSection {
        id: String,
        section: Value,
    },
    PutGuestCustomization {
        id: String,
        name: String,
        preamble: String,
    },
    CreateDisk {
        href: String,
        size_in_mb: u64,
    },
    PostEdgeConfiguration {
        id: String,
        configuration: Value,
    },
}

#[derive(Default)]
pub struct MockService {
    attributes: Mutex<HashMap<String, Value>>,
    query_results: Mutex<HashMap<(String, Option<String>), Vec<Record>>>,
    query_types: Mutex<Vec<(String, String)>>,
    page_size: Mutex<usize>,
    fail_requests: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl MockService {
    pub fn new() -> Self {
        let mock = Self::default();
        *mock.page_size.lock().unwrap() = 25;
        mock
    }

    /// Seed the live attribute snapshot served for a resource id
    pub fn set_attributes(&self, id: &str, attributes: Value) {
        self.attributes
            .lock()
            .unwrap()
            .insert(id.to_string(), attributes);
    }

    /// Seed the result set for a (type, filter) query
    pub fn add_query_result(&self, type_name: &str, filter: Option<&str>, records: Vec<Value>) {
        let records = records
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("query records must be objects, got {other}"),
            })
            .collect();
        self.query_results
            .lock()
            .unwrap()
            .insert((type_name.to_string(), filter.map(str::to_string)), records);
    }

    pub fn set_query_types(&self, types: Vec<(&str, &str)>) {
        *self.query_types.lock().unwrap() = types
            .into_iter()
            .map(|(t, f)| (t.to_string(), f.to_string()))
            .collect();
    }

    pub fn set_page_size(&self, page_size: usize) {
        *self.page_size.lock().unwrap() = page_size;
    }

    /// Make every subsequent request fail like a transport error
    pub fn fail_requests(&self) {
        *self.fail_requests.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.check_healthy()?;
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    fn check_healthy(&self) -> Result<()> {
        if *self.fail_requests.lock().unwrap() {
            return Err(VcloudError::Api("503 service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceInterface for MockService {
    async fn get_resource(&self, id: &ResourceId) -> Result<Value> {
        self.check_healthy()?;
        self.attributes
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| VcloudError::Api(format!("404 no such resource: {id}")))
    }

    async fn put_memory(&self, id: &ResourceId, memory_in_mb: u64) -> Result<()> {
        self.record(Call::PutMemory {
            id: id.to_string(),
            memory_in_mb,
        })
    }

    async fn put_cpu(&self, id: &ResourceId, cpu_count: u64) -> Result<()> {
        self.record(Call::PutCpu {
            id: id.to_string(),
            cpu_count,
        })
    }

    async fn put_vm(&self, id: &ResourceId, name: &str, options: Value) -> Result<()> {
        self.record(Call::PutVm {
            id: id.to_string(),
            name: name.to_string(),
            options,
        })
    }

    async fn put_vapp_metadata_value(
        &self,
        id: &ResourceId,
        key: &str,
        value: &Value,
    ) -> Result<()> {
        self.record(Call::PutMetadata {
            id: id.to_string(),
            key: key.to_string(),
            value: value.clone(),
        })
    }

    async fn put_network_connection_system_section(
        &self,
        id: &ResourceId,
        section: Value,
    ) -> Result<()> {
        self.record(Call::PutNetworkSection {
            id: id.to_string(),
            section,
        })
    }

    async fn put_guest_customization_section(
        &self,
        id: &ResourceId,
        name: &str,
        preamble: &str,
    ) -> Result<()> {
        self.record(Call::PutGuestCustomization {
            id: id.to_string(),
            name: name.to_string(),
            preamble: preamble.to_string(),
        })
    }

    async fn create_disk(&self, vm_href: &str, size_in_mb: u64) -> Result<()> {
        self.record(Call::CreateDisk {
            href: vm_href.to_string(),
            size_in_mb,
        })
    }

    async fn post_edge_gateway_configuration(
        &self,
        id: &ResourceId,
        configuration: Value,
    ) -> Result<()> {
        self.record(Call::PostEdgeConfiguration {
            id: id.to_string(),
            configuration,
        })
    }

    async fn available_query_types(&self) -> Result<Vec<(String, String)>> {
        self.check_healthy()?;
        Ok(self.query_types.lock().unwrap().clone())
    }

    async fn execute_query(
        &self,
        type_name: &str,
        fields: Option<&str>,
        filter: Option<&str>,
        page: u32,
    ) -> Result<QueryPage> {
        self.check_healthy()?;

        let results = self.query_results.lock().unwrap();
        let records = results
            .get(&(type_name.to_string(), filter.map(str::to_string)))
            .cloned()
            .unwrap_or_default();
        drop(results);

        // The platform prunes unrequested columns but always keeps href
        let records: Vec<Record> = match fields {
            None => records,
            Some(fields) => {
                let keep: Vec<&str> = fields.split(',').map(str::trim).collect();
                records
                    .into_iter()
                    .map(|record| {
                        record
                            .into_iter()
                            .filter(|(key, _)| key == "href" || keep.contains(&key.as_str()))
                            .collect()
                    })
                    .collect()
            }
        };

        let page_size = *self.page_size.lock().unwrap();
        let num_pages = records.len().div_ceil(page_size).max(1) as u32;
        let start = (page as usize - 1) * page_size;
        let page_records = records
            .into_iter()
            .skip(start)
            .take(page_size)
            .collect();

        Ok(QueryPage {
            records: page_records,
            page,
            num_pages,
        })
    }
}
