//! # Manifest Emission
//!
//! Serializes composite instances into a docker-compose document. Every
//! instance becomes one service:
//!
//! ```yaml
//! primary-namenode:
//!   image: local-hadoop
//!   container_name: primary-namenode
//!   networks:
//!     hadoop.net:
//!       aliases: [primary-namenode, journalnode1, zookeeper1, yarn-history]
//!   ports: ["9870:9870", "8188:8188"]
//!   volumes: [...]
//!   environment: {HADOOP_HOME: /opt/hadoop, ...}
//!   tty: true
//! ```
//!
//! `ports`, `volumes` and `environment` are omitted when empty, and an
//! instance without hosts joins the network with no aliases. Extra options
//! are written verbatim after the generated keys. Services are keyed by name
//! in sorted order so the same topology always produces the same bytes.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;

use crate::config::ClusterConfig;
use crate::defaults::COMPOSE_VERSION;
use crate::error::{Error, Result};
use crate::instance::CompositeInstance;

/// Service keys generated from instance fields, which extra options may not
/// override.
const GENERATED_KEYS: [&str; 6] = [
    "image",
    "container_name",
    "networks",
    "ports",
    "volumes",
    "environment",
];

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    version: &'static str,
    services: BTreeMap<&'a str, Service<'a>>,
    networks: BTreeMap<&'a str, Option<()>>,
}

#[derive(Debug, Serialize)]
struct NetworkAttachment<'a> {
    aliases: &'a [String],
}

#[derive(Debug, Serialize)]
struct Service<'a> {
    image: &'a str,
    container_name: &'a str,
    networks: BTreeMap<&'a str, Option<NetworkAttachment<'a>>>,
    #[serde(skip_serializing_if = "is_empty_list")]
    ports: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    volumes: &'a [String],
    #[serde(skip_serializing_if = "is_empty_map")]
    environment: &'a BTreeMap<String, String>,
    #[serde(flatten)]
    more_options: &'a BTreeMap<String, Value>,
}

fn is_empty_list(items: &&[String]) -> bool {
    items.is_empty()
}

fn is_empty_map(map: &&BTreeMap<String, String>) -> bool {
    map.is_empty()
}

fn service<'a>(instance: &'a CompositeInstance, network: &'a str) -> Result<Service<'a>> {
    let image = instance.image().ok_or_else(|| {
        Error::config(format!("instance '{}' has no image", instance.name()))
    })?;
    if let Some(key) = instance
        .more_options()
        .keys()
        .find(|key| GENERATED_KEYS.contains(&key.as_str()))
    {
        return Err(Error::config(format!(
            "instance '{}' sets option '{}', which is generated from its fields",
            instance.name(),
            key
        )));
    }

    let attachment = (!instance.hosts().is_empty()).then(|| NetworkAttachment {
        aliases: instance.hosts(),
    });

    Ok(Service {
        image,
        container_name: instance.name(),
        networks: BTreeMap::from([(network, attachment)]),
        ports: instance.ports(),
        volumes: instance.volumes(),
        environment: instance.environment(),
        more_options: instance.more_options(),
    })
}

/// Renders `instances` followed by `auxiliary` resources as a compose
/// document.
///
/// Fails without producing any text if two services share a name, an
/// instance has no image, or an extra option collides with a generated key.
pub fn emit(
    instances: &[CompositeInstance],
    auxiliary: &[CompositeInstance],
    config: &ClusterConfig,
) -> Result<String> {
    let network = config.network.as_str();
    let mut services = BTreeMap::new();

    for instance in instances.iter().chain(auxiliary) {
        let service = service(instance, network)?;
        if services.insert(instance.name(), service).is_some() {
            return Err(Error::config(format!(
                "service '{}' is defined more than once",
                instance.name()
            )));
        }
    }

    let manifest = Manifest {
        version: COMPOSE_VERSION,
        services,
        networks: BTreeMap::from([(network, None)]),
    };
    serde_yaml::to_string(&manifest).map_err(|e| Error::Serialization {
        message: format!("failed to serialize compose manifest: {}", e),
    })
}
