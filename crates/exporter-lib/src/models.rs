//! Core data models for the resource exporter

use std::fmt;

/// Which side of a container's resource requirements a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Request,
    Limit,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Request, ResourceKind::Limit];

    /// Value of the `type` label
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Request => "request",
            ResourceKind::Limit => "limit",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared CPU and memory for one container in one poll snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerResources {
    pub namespace: String,
    pub pod_name: String,
    pub container_name: String,
    pub cpu_request_millicores: i64,
    pub cpu_limit_millicores: i64,
    pub memory_request_bytes: i64,
    pub memory_limit_bytes: i64,
}

impl ContainerResources {
    pub fn cpu_millicores(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Request => self.cpu_request_millicores,
            ResourceKind::Limit => self.cpu_limit_millicores,
        }
    }

    pub fn memory_bytes(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Request => self.memory_request_bytes,
            ResourceKind::Limit => self.memory_limit_bytes,
        }
    }
}
