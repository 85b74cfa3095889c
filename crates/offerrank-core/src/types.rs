//! Shared types used across offerrank crates.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Maintenance mode of the host that produced an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceMode {
    #[default]
    None,
    Scheduled,
    Draining,
    Drained,
}

/// Attributes of the host behind an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAttributes {
    pub host: String,
    #[serde(default)]
    pub mode: MaintenanceMode,
    /// Arbitrary host attributes (rack, zone, ...), each with one or more values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl HostAttributes {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            mode: MaintenanceMode::None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_mode(mut self, mode: MaintenanceMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A single resource offer plus the attributes of the host that made it.
///
/// Equality and hashing only consider the identity fields (offer id,
/// hostname, agent id); attributes are descriptive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostOffer {
    pub offer_id: String,
    pub hostname: String,
    pub agent_id: String,
    pub attributes: HostAttributes,
}

impl HostOffer {
    /// Build an offer whose agent id is derived from the hostname.
    pub fn new(offer_id: impl Into<String>, hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        Self {
            offer_id: offer_id.into(),
            agent_id: format!("{hostname}-agent"),
            attributes: HostAttributes::new(hostname.clone()),
            hostname,
        }
    }

    pub fn with_attributes(mut self, attributes: HostAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether the host has been fully drained by an operator.
    pub fn is_drained(&self) -> bool {
        self.attributes.mode == MaintenanceMode::Drained
    }
}

impl PartialEq for HostOffer {
    fn eq(&self, other: &Self) -> bool {
        self.offer_id == other.offer_id
            && self.hostname == other.hostname
            && self.agent_id == other.agent_id
    }
}

impl Eq for HostOffer {}

impl Hash for HostOffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offer_id.hash(state);
        self.hostname.hash(state);
        self.agent_id.hash(state);
    }
}

/// Identifies the group of identical tasks a scheduling attempt is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskGroupKey {
    pub role: String,
    pub environment: String,
    pub name: String,
}

impl TaskGroupKey {
    pub fn new(
        role: impl Into<String>,
        environment: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            environment: environment.into(),
            name: name.into(),
        }
    }

    /// Parse a `role/environment/name` job key.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, '/');
        let role = parts.next().filter(|s| !s.is_empty())?;
        let environment = parts.next().filter(|s| !s.is_empty())?;
        let name = parts.next().filter(|s| !s.is_empty() && !s.contains('/'))?;
        Some(Self::new(role, environment, name))
    }
}

impl fmt::Display for TaskGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.role, self.environment, self.name)
    }
}

/// Resources a single task of the group asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceRequest {
    pub num_cpus: f64,
    pub ram_mb: u64,
    pub disk_mb: u64,
    pub num_ports: u32,
}
