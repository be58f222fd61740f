//! Pod resource polling
//!
//! Lists every pod in the cluster on a fixed interval and flattens each
//! container's declared requests and limits into the gauge registry.

mod r#loop;


pub use r#loop::{PollSummary, Poller};

use crate::models::ContainerResources;
use crate::quantity::Quantity;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as KubeQuantity;
use kube::api::{Api, ListParams};
use std::collections::BTreeMap;
use tracing::warn;

pub use async_trait::async_trait;

const CPU: &str = "cpu";
const MEMORY: &str = "memory";

/// Source of the cluster-wide pod list
#[async_trait]
pub trait PodLister: Send + Sync {
    /// List all pods across all namespaces
    async fn list_pods(&self) -> Result<Vec<Pod>>;
}

#[async_trait]
impl PodLister for kube::Client {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::all(self.clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .context("Failed to list pods")?;

        Ok(list.items)
    }
}

/// Flatten a pod into one record per container
pub fn pod_resources(pod: &Pod) -> Vec<ContainerResources> {
    let namespace = pod.metadata.namespace.as_deref().unwrap_or_default();
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();

    let Some(spec) = pod.spec.as_ref() else {
        return Vec::new();
    };

    spec.containers
        .iter()
        .map(|container| container_resources(namespace, pod_name, container))
        .collect()
}

fn container_resources(
    namespace: &str,
    pod_name: &str,
    container: &Container,
) -> ContainerResources {
    let requirements = container.resources.as_ref();
    let requests = requirements.and_then(|r| r.requests.as_ref());
    let limits = requirements.and_then(|r| r.limits.as_ref());

    let lookup = |list: Option<&BTreeMap<String, KubeQuantity>>, resource: &str| {
        resource_quantity(list, resource, namespace, pod_name, &container.name)
    };

    ContainerResources {
        namespace: namespace.to_string(),
        pod_name: pod_name.to_string(),
        container_name: container.name.clone(),
        cpu_request_millicores: lookup(requests, CPU).milli_value(),
        cpu_limit_millicores: lookup(limits, CPU).milli_value(),
        memory_request_bytes: lookup(requests, MEMORY).value(),
        memory_limit_bytes: lookup(limits, MEMORY).value(),
    }
}

/// Missing entries read as zero; unparsable ones are logged and read as zero
fn resource_quantity(
    list: Option<&BTreeMap<String, KubeQuantity>>,
    resource: &str,
    namespace: &str,
    pod_name: &str,
    container_name: &str,
) -> Quantity {
    let Some(raw) = list.and_then(|l| l.get(resource)) else {
        return Quantity::ZERO;
    };

    Quantity::parse(&raw.0).unwrap_or_else(|e| {
        warn!(
            namespace = %namespace,
            pod_name = %pod_name,
            container_name = %container_name,
            resource = %resource,
            error = %e,
            "Unparsable resource quantity, recording zero"
        );
        Quantity::ZERO
    })
}
