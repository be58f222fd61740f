//! Gauge registry for container resource metrics
//!
//! Holds the two exported gauge families in an owned Prometheus registry.
//! The handle is cloned into the poller (the only writer) and the HTTP
//! server (readers); clones share the same underlying gauges.
//!
//! Series are never removed: a pod deleted from the cluster keeps its last
//! observed values until the process restarts.

use crate::models::{ContainerResources, ResourceKind};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

const METRIC_NAMESPACE: &str = "container";
const METRIC_SUBSYSTEM: &str = "resources";

/// Label names shared by both families, in label-value order
pub const LABEL_NAMES: [&str; 4] = ["type", "namespace", "pod_name", "container_name"];

/// The exported gauge families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFamily {
    /// `container_resources_cpu_milli`
    CpuMilli,
    /// `container_resources_memory_bytes`
    MemoryBytes,
}

impl ResourceFamily {
    /// Fully qualified metric name
    pub fn metric_name(&self) -> &'static str {
        match self {
            ResourceFamily::CpuMilli => "container_resources_cpu_milli",
            ResourceFamily::MemoryBytes => "container_resources_memory_bytes",
        }
    }

    fn opts(&self) -> Opts {
        let (name, help) = match self {
            ResourceFamily::CpuMilli => ("cpu_milli", "Container CPU resources in millicpus"),
            ResourceFamily::MemoryBytes => ("memory_bytes", "Container memory resources in bytes"),
        };
        Opts::new(name, help)
            .namespace(METRIC_NAMESPACE)
            .subsystem(METRIC_SUBSYSTEM)
    }
}

/// Label tuple identifying one series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLabels<'a> {
    pub kind: ResourceKind,
    pub namespace: &'a str,
    pub pod_name: &'a str,
    pub container_name: &'a str,
}

impl<'a> ResourceLabels<'a> {
    pub fn new(
        kind: ResourceKind,
        namespace: &'a str,
        pod_name: &'a str,
        container_name: &'a str,
    ) -> Self {
        Self {
            kind,
            namespace,
            pod_name,
            container_name,
        }
    }

    fn values(&self) -> [&'a str; 4] {
        [
            self.kind.as_str(),
            self.namespace,
            self.pod_name,
            self.container_name,
        ]
    }
}

/// Handle to the exporter's gauge registry
#[derive(Clone)]
pub struct ResourceMetrics {
    registry: Registry,
    cpu_milli: GaugeVec,
    memory_bytes: GaugeVec,
}

impl ResourceMetrics {
    /// Create the registry and register both gauge families
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let cpu_milli = GaugeVec::new(ResourceFamily::CpuMilli.opts(), &LABEL_NAMES)?;
        registry.register(Box::new(cpu_milli.clone()))?;

        let memory_bytes = GaugeVec::new(ResourceFamily::MemoryBytes.opts(), &LABEL_NAMES)?;
        registry.register(Box::new(memory_bytes.clone()))?;

        Ok(Self {
            registry,
            cpu_milli,
            memory_bytes,
        })
    }

    fn family(&self, family: ResourceFamily) -> &GaugeVec {
        match family {
            ResourceFamily::CpuMilli => &self.cpu_milli,
            ResourceFamily::MemoryBytes => &self.memory_bytes,
        }
    }

    /// Overwrite the value of one series
    pub fn set(&self, family: ResourceFamily, labels: &ResourceLabels<'_>, value: f64) {
        self.family(family)
            .with_label_values(&labels.values())
            .set(value);
    }

    /// Set the four series of a container from a poll snapshot
    pub fn record(&self, resources: &ContainerResources) {
        for kind in ResourceKind::ALL {
            let labels = ResourceLabels::new(
                kind,
                &resources.namespace,
                &resources.pod_name,
                &resources.container_name,
            );
            self.set(
                ResourceFamily::CpuMilli,
                &labels,
                resources.cpu_millicores(kind) as f64,
            );
            self.set(
                ResourceFamily::MemoryBytes,
                &labels,
                resources.memory_bytes(kind) as f64,
            );
        }
    }

    /// Current value of a series, without creating it
    pub fn value(&self, family: ResourceFamily, labels: &ResourceLabels<'_>) -> Option<f64> {
        let wanted = labels.values();

        self.registry
            .gather()
            .into_iter()
            .filter(|mf| mf.get_name() == family.metric_name())
            .flat_map(|mf| mf.get_metric().to_vec())
            .find(|metric| {
                LABEL_NAMES.iter().zip(wanted).all(|(name, value)| {
                    metric
                        .get_label()
                        .iter()
                        .any(|pair| pair.get_name() == *name && pair.get_value() == value)
                })
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Number of series currently held across both families
    pub fn series_count(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .map(|mf| mf.get_metric().len())
            .sum()
    }

    /// Encode the registry in the Prometheus text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
