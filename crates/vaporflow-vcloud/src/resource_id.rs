//! Typed remote resource identifiers
//!
//! Every remote entity is addressed by an opaque identifier with a
//! kind-specific prefix (`vm-<hex>`, `vapp-<hex>`, ...). Construction
//! validates the format up front; no network round trip is involved.

use crate::error::{Result, VcloudError};
use regex::Regex;
use std::fmt;

/// Category of remote manageable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vm,
    Vapp,
    VappTemplate,
    EdgeGateway,
    Network,
}

impl ResourceKind {
    /// Identifier prefix used by the platform for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            ResourceKind::Vm => "vm",
            ResourceKind::Vapp => "vapp",
            ResourceKind::VappTemplate => "vappTemplate",
            ResourceKind::EdgeGateway => "edgeGateway",
            ResourceKind::Network => "network",
        }
    }
}

/// Validated identifier for a specific remote resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    kind: ResourceKind,
    id: String,
}

impl ResourceId {
    /// Parse an identifier string for the given kind
    ///
    /// Succeeds iff the string matches `^<prefix>-[0-9a-f-]+$`.
    pub fn parse(kind: ResourceKind, id: &str) -> Result<Self> {
        let pattern = format!("^{}-[0-9a-f-]+$", regex::escape(kind.prefix()));
        let re = Regex::new(&pattern)
            .map_err(|e| VcloudError::Format(format!("identifier pattern: {e}")))?;

        if !re.is_match(id) {
            return Err(VcloudError::Format(format!(
                "{} id '{}' is not in the correct format",
                kind.prefix(),
                id
            )));
        }

        Ok(Self {
            kind,
            id: id.to_string(),
        })
    }

    /// Extract the identifier from a resource href (its last path segment)
    pub fn from_href(kind: ResourceKind, href: &str) -> Result<Self> {
        let tail = href
            .rsplit('/')
            .next()
            .ok_or_else(|| VcloudError::Format(format!("empty href for {}", kind.prefix())))?;
        Self::parse(kind, tail)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
