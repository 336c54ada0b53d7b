//! # Docker Hadoop Cluster Generator
//!
//! This library stages a self-contained Hadoop ecosystem cluster (HDFS with
//! high availability, YARN, optionally Hive, Spark, Presto and Hue) on disk
//! and describes it in a single `docker-compose.yml`.
//!
//! ## Quick Example
//!
//! ```
//! use docker_hadoop::catalog::build_topology;
//! use docker_hadoop::config::{ClusterConfig, FeatureSelection};
//!
//! let config = ClusterConfig::new("templates", "target");
//! let selection = FeatureSelection {
//!     hive: true,
//!     datanodes: 2,
//!     ..FeatureSelection::default()
//! };
//!
//! let topology = build_topology(&config, &selection).unwrap();
//! assert!(topology.get("datanode2").is_some());
//! assert!(topology.get("cluster-db").is_some());
//! ```
//!
//! ## Core Concepts
//!
//! - **Fragments (`fragment`)**: what one logical role contributes to a
//!   container (image, volumes, environment, ports, aliases, extra options).
//! - **Composite Instances (`instance`)**: one container, built by folding
//!   every fragment placed on it.
//! - **Catalog (`catalog`)**: maps a feature selection to the full set of
//!   composite instances.
//! - **Components (`component`)**: the provisionable units of the pipeline,
//!   each with a capability set, artifacts and a template data slice.
//! - **Phases (`phases`)**: the five-phase provisioning pipeline.
//! - **Manifest (`manifest`)**: serializes instances into the compose
//!   document.
//!
//! ## Execution Flow
//!
//! The main entry point is [`phases::orchestrator::execute`]:
//!
//! 1.  **Download**: fetch missing archives in parallel.
//! 2.  **Decompress**: unpack archives whose destination is missing.
//! 3.  **Static Copy**: copy non-template files into the target tree.
//! 4.  **Template Render**: render templates against the merged data model.
//! 5.  **Manifest Emit**: write `docker-compose.yml`.
//!
//! Each phase starts only after the previous one finished without error.

pub mod catalog;
pub mod component;
pub mod config;
pub mod data;
pub mod defaults;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fragment;
pub mod instance;
pub mod manifest;
pub mod output;
pub mod phases;
pub mod provisioner;
pub mod template;

#[cfg(test)]
mod merge_proptest;
