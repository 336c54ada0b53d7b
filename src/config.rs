//! # Cluster Configuration and Feature Selection
//!
//! This module defines the two inputs of a run:
//!
//! - **`ClusterConfig`**: process-wide settings (where templates live, where the
//!   cluster is staged, image names, worker-pool size, download timeout). One
//!   instance is built per run and passed into the catalog, the pipeline and
//!   the manifest emitter.
//!
//! - **`FeatureSelection`**: which optional components are enabled, replica
//!   counts, dependency versions, force-refresh flags and pre-supplied
//!   archives. It can be loaded from a YAML file and is then layered with CLI
//!   flags by the `generate` command.
//!
//! `FeatureSelection::validate` is the single place configuration errors are
//! raised. It runs before any filesystem or network I/O.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Docker image names used by the generated services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Images {
    /// Image shared by every Hadoop-family instance.
    pub hadoop: String,
    /// Image of the cluster-starter service.
    pub cluster_starter: String,
    /// Image of the shared metadata database.
    pub cluster_db: String,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            hadoop: defaults::HADOOP_IMAGE.to_string(),
            cluster_starter: defaults::CLUSTER_STARTER_IMAGE.to_string(),
            cluster_db: defaults::CLUSTER_DB_IMAGE.to_string(),
        }
    }
}

/// Process-wide settings for one run.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Directory holding one template subdirectory per component.
    pub templates_root: PathBuf,
    /// Directory the cluster is staged into; the manifest lands here.
    pub target_root: PathBuf,
    /// Extension (without the dot) marking files to render.
    pub template_extension: String,
    /// Shared network every service joins.
    pub network: String,
    /// File name of the manifest written at the target root.
    pub compose_file: String,
    pub images: Images,
    /// Worker-pool size for phase fan-out; 0 uses one thread per CPU.
    pub jobs: usize,
    /// Timeout applied to each artifact download.
    pub download_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            templates_root: defaults::default_templates_root(),
            target_root: defaults::default_target_root(),
            template_extension: defaults::TEMPLATE_EXTENSION.to_string(),
            network: defaults::NETWORK_NAME.to_string(),
            compose_file: defaults::COMPOSE_FILE_NAME.to_string(),
            images: Images::default(),
            jobs: 0,
            download_timeout: Duration::from_secs(defaults::DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

impl ClusterConfig {
    /// Creates a configuration with the given template and target roots and
    /// defaults for everything else.
    pub fn new(templates_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            templates_root: templates_root.into(),
            target_root: target_root.into(),
            ..Self::default()
        }
    }

    /// Path of the manifest written by the final phase.
    pub fn manifest_path(&self) -> PathBuf {
        self.target_root.join(&self.compose_file)
    }
}

/// Dependency versions used in download URLs and rendered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Versions {
    pub hadoop: String,
    pub hive: String,
    pub spark: String,
    pub scala: String,
    pub java: String,
    pub zookeeper: String,
    pub hue: String,
    pub presto: String,
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            hadoop: defaults::HADOOP_VERSION.to_string(),
            hive: defaults::HIVE_VERSION.to_string(),
            spark: defaults::SPARK_VERSION.to_string(),
            scala: defaults::SCALA_VERSION.to_string(),
            java: defaults::JAVA_VERSION.to_string(),
            zookeeper: defaults::ZOOKEEPER_VERSION.to_string(),
            hue: defaults::HUE_VERSION.to_string(),
            presto: defaults::PRESTO_VERSION.to_string(),
        }
    }
}

/// Per-artifact flags forcing download and decompression to re-run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ForceRefresh {
    pub hadoop: bool,
    pub hive: bool,
    pub spark: bool,
    pub presto: bool,
}

/// Local archives that replace the corresponding download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProvidedArtifacts {
    pub hadoop: Option<PathBuf>,
    pub hive: Option<PathBuf>,
    pub spark: Option<PathBuf>,
    pub presto: Option<PathBuf>,
}

/// The enabled optional components and replica counts for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeatureSelection {
    /// Hive server and metastore on the primary namenode.
    pub hive: bool,
    /// Download Spark without running any Spark service.
    pub spark: bool,
    /// Spark history server on the secondary namenode.
    pub spark_history: bool,
    /// Spark thrift server on the secondary namenode.
    pub spark_thrift: bool,
    /// Standalone Hue service.
    pub hue: bool,
    /// Presto coordinator on the primary namenode plus workers on datanodes.
    pub presto: bool,
    /// Enables every optional component.
    pub all: bool,
    /// Number of datanode instances, at least 1.
    pub datanodes: u32,
    /// Number of Presto workers requested.
    pub presto_workers: u32,
    pub versions: Versions,
    pub force_refresh: ForceRefresh,
    pub provided: ProvidedArtifacts,
}

impl Default for FeatureSelection {
    fn default() -> Self {
        Self {
            hive: false,
            spark: false,
            spark_history: false,
            spark_thrift: false,
            hue: false,
            presto: false,
            all: false,
            datanodes: defaults::DATANODES,
            presto_workers: 0,
            versions: Versions::default(),
            force_refresh: ForceRefresh::default(),
            provided: ProvidedArtifacts::default(),
        }
    }
}

impl FeatureSelection {
    /// Returns the selection with `all` expanded into every individual flag.
    ///
    /// Every consumer works on the effective selection, so no flag
    /// interaction depends on whether it was enabled directly or through
    /// `all`.
    pub fn effective(&self) -> FeatureSelection {
        let mut effective = self.clone();
        if self.all {
            effective.hive = true;
            effective.spark = true;
            effective.spark_history = true;
            effective.spark_thrift = true;
            effective.hue = true;
            effective.presto = true;
        }
        effective
    }

    /// Whether Spark binaries are needed.
    pub fn needs_spark(&self) -> bool {
        let s = self.effective();
        s.spark || s.spark_history || s.spark_thrift
    }

    /// Whether the shared metadata database is needed.
    pub fn needs_cluster_db(&self) -> bool {
        let s = self.effective();
        s.hive || s.hue
    }

    /// Validates replica counts and flag consistency.
    pub fn validate(&self) -> Result<()> {
        let s = self.effective();

        if s.datanodes == 0 {
            return Err(Error::Config {
                message: "datanode count must be at least 1, got 0".to_string(),
                hint: Some("Pass --datanodes 1 or more".to_string()),
            });
        }

        if s.presto_workers > 0 && !s.presto {
            return Err(Error::Config {
                message: format!(
                    "{} Presto workers requested but Presto is not enabled",
                    s.presto_workers
                ),
                hint: Some("Add --presto or --all".to_string()),
            });
        }

        if !matches!(s.versions.java.as_str(), "8" | "11") {
            return Err(Error::Config {
                message: format!("unsupported Java version '{}'", s.versions.java),
                hint: Some("Only Java 8 and 11 are supported".to_string()),
            });
        }

        let provided = [
            ("hadoop", s.provided.hadoop.as_deref(), true),
            ("hive", s.provided.hive.as_deref(), s.hive),
            ("spark", s.provided.spark.as_deref(), s.needs_spark()),
            ("presto", s.provided.presto.as_deref(), s.presto),
        ];
        for (name, path, enabled) in provided {
            let Some(path) = path else { continue };
            if !enabled {
                return Err(Error::Config {
                    message: format!(
                        "a {} archive was provided but {} is not enabled",
                        name, name
                    ),
                    hint: None,
                });
            }
            if !path.is_file() {
                return Err(Error::Config {
                    message: format!(
                        "provided {} archive '{}' does not exist",
                        name,
                        path.display()
                    ),
                    hint: None,
                });
            }
        }

        Ok(())
    }
}

/// Loads a feature selection from a YAML file.
///
/// Missing keys take their defaults, so a file may list only what it enables.
/// Unknown keys are rejected.
pub fn load_selection(path: &Path) -> Result<FeatureSelection> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
    parse_selection(&content)
}

/// Parses a feature selection from YAML text.
pub fn parse_selection(yaml: &str) -> Result<FeatureSelection> {
    if yaml.trim().is_empty() {
        return Ok(FeatureSelection::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}
