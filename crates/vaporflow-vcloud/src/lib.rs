//! vaporflow vCloud resource layer
//!
//! Resource models and a generic query facility for a vCloud-style
//! control plane, applied as a single reconciliation pass: callers load a
//! validated config tree (vaporflow-core), locate resources by name, and
//! invoke update operations that diff desired against live state and only
//! mutate when they differ.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 caller workflow                 │
//! │   load_config → resolve names → apply updates   │
//! └──────────────────────┬─────────────────────────┘
//!                        │
//! ┌──────────────────────▼─────────────────────────┐
//! │              vaporflow-vcloud                   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │ QueryRunner  │  │ Vm / Vapp / Edge...  │    │
//! │  └──────┬───────┘  └──────────┬───────────┘    │
//! │         └──────────┬──────────┘                │
//! │         trait ServiceInterface                  │
//! └────────────────────┬───────────────────────────┘
//!                      │
//!            HTTP/XML session (external)
//! ```
//!
//! All operations are sequential awaits; there is no task polling, no
//! retry and no locking. A read-then-write pair is not transactional.

pub mod edge_gateway;
pub mod error;
pub mod query;
pub mod resource_id;
pub mod service;
pub mod vapp;
pub mod vapp_template;
pub mod vm;

pub use edge_gateway::EdgeGateway;
pub use error::{Result, VcloudError};
pub use query::{QueryOptions, QueryRunner};
pub use resource_id::{ResourceId, ResourceKind};
pub use service::{QueryPage, Record, ServiceInterface};
pub use vapp::Vapp;
pub use vapp_template::VappTemplate;
pub use vm::{BootstrapSpec, DiskSpec, NetworkSpec, Vm};
