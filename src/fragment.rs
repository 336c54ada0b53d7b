//! Capability fragments: immutable slices of container configuration.
//!
//! A fragment is what one logical role (a namenode, a journal node, a Hive
//! server, ...) contributes to the physical container it is placed on. Roles
//! share defaults by composition: a base fragment (for example the common
//! Hadoop volumes) is listed next to the role fragment and the instance
//! builder's union / last-wins rules combine them.
//!
//! Fragments are built with consuming setter methods and are never mutated
//! once handed to [`crate::instance::build`].

use std::collections::BTreeMap;

use serde_yaml::Value;

/// One role's contribution to a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    role: String,
    image: Option<String>,
    volumes: Vec<String>,
    environment: BTreeMap<String, String>,
    ports: Vec<String>,
    hosts: Vec<String>,
    more_options: BTreeMap<String, Value>,
}

impl Fragment {
    /// Creates an empty fragment for `role`.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Self::default()
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Adds a bind mount of `host` onto `container`.
    pub fn volume(mut self, host: impl AsRef<str>, container: impl AsRef<str>) -> Self {
        push_unique(
            &mut self.volumes,
            format!("{}:{}", host.as_ref(), container.as_ref()),
        );
        self
    }

    /// Adds a raw `host:container` volume string.
    pub fn volume_spec(mut self, spec: impl Into<String>) -> Self {
        push_unique(&mut self.volumes, spec.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.environment.insert(key.into(), value.to_string());
        self
    }

    /// Publishes container port `container` on host port `host`.
    pub fn port(mut self, host: u16, container: u16) -> Self {
        push_unique(&mut self.ports, format!("{}:{}", host, container));
        self
    }

    /// Adds a raw `host:container` port mapping.
    pub fn port_spec(mut self, spec: impl Into<String>) -> Self {
        push_unique(&mut self.ports, spec.into());
        self
    }

    /// Adds a network alias.
    pub fn host(mut self, alias: impl Into<String>) -> Self {
        push_unique(&mut self.hosts, alias.into());
        self
    }

    /// Adds an extra manifest field passed through verbatim.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.more_options.insert(key.into(), value.into());
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    /// The declared image, ignoring empty strings.
    pub fn declared_image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
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

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn more_options(&self) -> &BTreeMap<String, Value> {
        &self.more_options
    }
}

/// Appends `item` unless already present, keeping first-appearance order.
pub(crate) fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
