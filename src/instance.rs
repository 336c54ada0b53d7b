//! Composite instances and the fold that builds them.
//!
//! A composite instance is one physical container: the merge of every
//! fragment placed on it, folded left to right with these rules:
//!
//! | field          | rule                                               |
//! |----------------|----------------------------------------------------|
//! | `image`        | first non-empty declaration wins                   |
//! | `volumes`      | union, first-appearance order                      |
//! | `ports`        | union, first-appearance order                      |
//! | `hosts`        | union, first-appearance order                      |
//! | `environment`  | last fragment wins per key                         |
//! | `more_options` | last fragment wins per key                         |
//!
//! The image rule is deliberately the opposite of the environment rule: the
//! primary role of an instance is listed first and declares the image, while
//! more specific fragments listed later override generic environment
//! defaults. Later images that disagree with the winner are recorded in
//! `image_conflicts` instead of failing the build.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::fragment::{push_unique, Fragment};

/// One container's fully merged configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeInstance {
    name: String,
    image: Option<String>,
    volumes: Vec<String>,
    environment: BTreeMap<String, String>,
    ports: Vec<String>,
    hosts: Vec<String>,
    more_options: BTreeMap<String, Value>,
    roles: Vec<String>,
    image_conflicts: Vec<String>,
}

/// Folds `fragments` left to right into a composite instance named `name`.
///
/// Pure: the same inputs always produce an identical instance. An empty
/// fragment list yields an instance with no image and empty collections.
pub fn build(name: impl Into<String>, fragments: &[Fragment]) -> CompositeInstance {
    let mut instance = CompositeInstance {
        name: name.into(),
        image: None,
        volumes: Vec::new(),
        environment: BTreeMap::new(),
        ports: Vec::new(),
        hosts: Vec::new(),
        more_options: BTreeMap::new(),
        roles: Vec::new(),
        image_conflicts: Vec::new(),
    };

    for fragment in fragments {
        match (instance.image.as_deref(), fragment.declared_image()) {
            (None, Some(image)) => instance.image = Some(image.to_string()),
            (Some(winner), Some(image)) if winner != image => {
                push_unique(&mut instance.image_conflicts, image.to_string());
            }
            _ => {}
        }

        for volume in fragment.volumes() {
            push_unique(&mut instance.volumes, volume.clone());
        }
        for port in fragment.ports() {
            push_unique(&mut instance.ports, port.clone());
        }
        for host in fragment.hosts() {
            push_unique(&mut instance.hosts, host.clone());
        }
        for (key, value) in fragment.environment() {
            instance.environment.insert(key.clone(), value.clone());
        }
        for (key, value) in fragment.more_options() {
            instance.more_options.insert(key.clone(), value.clone());
        }
        push_unique(&mut instance.roles, fragment.role().to_string());
    }

    instance
}

impl CompositeInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn volumes(&self) -> &[String] {
        &self.volumes
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Network aliases; empty means the instance joins without aliases.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn more_options(&self) -> &BTreeMap<String, Value> {
        &self.more_options
    }

    /// Distinct roles folded into this instance, in fragment order.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Non-empty images declared after the winner that differ from it.
    pub fn image_conflicts(&self) -> &[String] {
        &self.image_conflicts
    }

    /// Host side of every published port mapping.
    pub fn host_ports(&self) -> impl Iterator<Item = &str> {
        self.ports
            .iter()
            .map(|mapping| mapping.split(':').next().unwrap_or(mapping.as_str()))
    }
}
