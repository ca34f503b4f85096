//! Kubernetes manifests derived from a `service.yml`.
//!
//! Every service becomes a `Deployment` plus a `Service`, emitted as one
//! multi-document YAML stream.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use super::descriptor::{PortMapping, ServiceDefinition, ServiceDescriptor};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resource<S> {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: S,
}

#[derive(Debug, Clone, Serialize)]
struct Metadata {
    name: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentSpec {
    replicas: u32,
    selector: Selector,
    template: PodTemplate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct PodTemplate {
    metadata: Metadata,
    spec: PodSpec,
}

#[derive(Debug, Serialize)]
struct PodSpec {
    containers: Vec<Container>,
}

#[derive(Debug, Serialize)]
struct Container {
    name: String,
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    command: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<ContainerPort>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<EnvVar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContainerPort {
    container_port: u16,
}

#[derive(Debug, Serialize)]
struct EnvVar {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct ServiceSpec {
    #[serde(rename = "type")]
    service_type: &'static str,
    selector: BTreeMap<String, String>,
    ports: Vec<ServicePort>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    name: String,
    port: u16,
    target_port: u16,
}

/// Render the manifest stream for every service in `descriptor`.
pub fn render_manifest(descriptor: &ServiceDescriptor) -> Result<String> {
    let mut documents = Vec::new();

    for (name, service) in &descriptor.services {
        let mappings = service
            .ports
            .iter()
            .map(PortMapping::parse)
            .collect::<Result<Vec<_>>>()?;

        documents.push(serde_yaml::to_string(&deployment(name, service, &mappings))?);
        if !mappings.is_empty() {
            documents.push(serde_yaml::to_string(&service_resource(name, &mappings))?);
        }
    }

    Ok(documents.join("---\n"))
}

fn labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), name.to_string())])
}

fn deployment(
    name: &str,
    service: &ServiceDefinition,
    mappings: &[PortMapping],
) -> Resource<DeploymentSpec> {
    let metadata = Metadata {
        name: name.to_string(),
        labels: labels(name),
    };

    let container = Container {
        name: name.to_string(),
        image: service
            .image
            .clone()
            .unwrap_or_else(|| format!("{}:latest", name)),
        command: service
            .command
            .as_ref()
            .map(|c| vec!["/bin/sh".to_string(), "-c".to_string(), c.clone()])
            .unwrap_or_default(),
        ports: mappings
            .iter()
            .map(|m| ContainerPort {
                container_port: m.container,
            })
            .collect(),
        env: service
            .env_vars
            .iter()
            .map(|(name, value)| EnvVar {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
    };

    Resource {
        api_version: "apps/v1",
        kind: "Deployment",
        metadata: metadata.clone(),
        spec: DeploymentSpec {
            replicas: 1,
            selector: Selector {
                match_labels: labels(name),
            },
            template: PodTemplate {
                metadata,
                spec: PodSpec {
                    containers: vec![container],
                },
            },
        },
    }
}

fn service_resource(name: &str, mappings: &[PortMapping]) -> Resource<ServiceSpec> {
    let mut ports = Vec::new();
    for mapping in mappings {
        let exposed = [("http", mapping.http), ("https", mapping.https)];
        let mut any = false;
        for (scheme, port) in exposed {
            if let Some(port) = port {
                any = true;
                ports.push(ServicePort {
                    name: format!("{}-{}", scheme, mapping.container),
                    port,
                    target_port: mapping.container,
                });
            }
        }
        if !any {
            ports.push(ServicePort {
                name: format!("tcp-{}", mapping.container),
                port: mapping.container,
                target_port: mapping.container,
            });
        }
    }

    Resource {
        api_version: "v1",
        kind: "Service",
        metadata: Metadata {
            name: name.to_string(),
            labels: labels(name),
        },
        spec: ServiceSpec {
            service_type: "ClusterIP",
            selector: labels(name),
            ports,
        },
    }
}
