//! # Pipeline Components
//!
//! A component is one unit of provisioning work: a directory of templates and
//! static files under the templates root, optionally one or more archives to
//! download and unpack, and a slice of the template data model.
//!
//! What a component needs from the pipeline is declared as a set of
//! [`Capability`] values. Each phase selects the components that declare its
//! capability, so adding a component never means teaching the phases about a
//! new type.
//!
//! ## Layout
//!
//! For a component whose directory is `hadoop`:
//!
//! ```text
//! <templates_root>/hadoop/conf/core-site.xml.template   (rendered)
//! <templates_root>/hadoop/conf/log4j.properties         (copied)
//! <target_root>/hadoop/hadoop.tar.gz                    (downloaded)
//! <target_root>/hadoop/hadoop-bin/                      (extracted)
//! <target_root>/hadoop/conf/core-site.xml               (rendered output)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use url::Url;

use crate::catalog::{
    datanode_host, journalnode_host, presto_worker_host, presto_worker_placements, zookeeper_host,
};
use crate::config::{ClusterConfig, FeatureSelection};
use crate::data::merge_all;
use crate::defaults::*;
use crate::error::Result;

/// A unit of pipeline work a component can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Fetch one or more remote archives.
    Download,
    /// Unpack the fetched (or provided) archives.
    Decompress,
    /// Copy non-template files verbatim into the target tree.
    StaticCopy,
    /// Render template files into the target tree.
    TemplateRender,
}

use Capability::*;

/// Every component of the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Scripts,
    ClusterStarter,
    Hadoop,
    Hive,
    Spark,
    SparkHistory,
    SparkThrift,
    Presto,
    Hue,
}

impl ComponentKind {
    /// Directory name under both the templates root and the target root.
    pub fn dir_name(self) -> &'static str {
        match self {
            ComponentKind::Scripts => "scripts",
            ComponentKind::ClusterStarter => "cluster-starter",
            ComponentKind::Hadoop => "hadoop",
            ComponentKind::Hive => "hive",
            ComponentKind::Spark => "spark",
            ComponentKind::SparkHistory => "spark-history",
            ComponentKind::SparkThrift => "spark-thrift",
            ComponentKind::Presto => "presto",
            ComponentKind::Hue => "hue",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            ComponentKind::Scripts => &[TemplateRender],
            ComponentKind::ClusterStarter
            | ComponentKind::SparkHistory
            | ComponentKind::SparkThrift
            | ComponentKind::Hue => &[StaticCopy, TemplateRender],
            ComponentKind::Hadoop
            | ComponentKind::Hive
            | ComponentKind::Spark
            | ComponentKind::Presto => &[Download, Decompress, StaticCopy, TemplateRender],
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A remote archive a component owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub source_url: Url,
    /// Where the archive is downloaded to.
    pub archive_path: PathBuf,
    /// Directory the archive is unpacked into.
    pub extract_destination: PathBuf,
    /// Re-run download and decompress even if their outputs exist.
    pub force_refresh: bool,
    /// Local archive used instead of downloading.
    pub provided: Option<PathBuf>,
}

impl Artifact {
    /// The archive decompression reads from.
    pub fn archive_source(&self) -> &Path {
        self.provided.as_deref().unwrap_or(&self.archive_path)
    }
}

/// One provisioning unit with its declared capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Source directory of templates and static files.
    pub template_dir: PathBuf,
    /// Destination directory in the target tree.
    pub target_dir: PathBuf,
    pub artifacts: Vec<Artifact>,
    /// This component's slice of the template data model.
    pub data: Value,
}

impl Component {
    pub fn has(&self, capability: Capability) -> bool {
        self.kind.capabilities().contains(&capability)
    }

    pub fn name(&self) -> &'static str {
        self.kind.dir_name()
    }
}

/// Builds the pipeline components enabled by `selection`, in provisioning
/// order.
pub fn build_pipeline_components(
    config: &ClusterConfig,
    selection: &FeatureSelection,
) -> Result<Vec<Component>> {
    selection.validate()?;
    let s = selection.effective();
    let factory = Factory {
        config,
        selection: &s,
    };

    let mut components = vec![
        factory.component(ComponentKind::Scripts, Vec::new(), json!({})),
        factory.cluster_starter(),
        factory.hadoop()?,
    ];
    if s.hive {
        components.push(factory.hive()?);
    }
    if s.needs_spark() {
        components.push(factory.spark()?);
    }
    if s.spark_history {
        components.push(factory.spark_history());
    }
    if s.spark_thrift {
        components.push(factory.spark_thrift());
    }
    if s.presto {
        components.push(factory.presto()?);
    }
    if s.hue {
        components.push(factory.hue());
    }
    Ok(components)
}

/// Deep-merges the data of every component into the template data model.
pub fn template_data(config: &ClusterConfig, components: &[Component]) -> Value {
    let cluster = json!({
        "cluster": {"name": CLUSTER_NAME, "network": config.network}
    });
    merge_all(components.iter().map(|c| &c.data).chain(std::iter::once(&cluster)))
}

struct Factory<'a> {
    config: &'a ClusterConfig,
    selection: &'a FeatureSelection,
}

impl Factory<'_> {
    fn component(&self, kind: ComponentKind, artifacts: Vec<Artifact>, data: Value) -> Component {
        Component {
            kind,
            template_dir: self.config.templates_root.join(kind.dir_name()),
            target_dir: self.config.target_root.join(kind.dir_name()),
            artifacts,
            data,
        }
    }

    /// The single archive of a downloadable component: fetched to
    /// `<dir>/<dir>.tar.gz` and unpacked into `<dir>/<dir>-bin`.
    fn artifact(
        &self,
        kind: ComponentKind,
        url: String,
        force_refresh: bool,
        provided: Option<&PathBuf>,
    ) -> Result<Artifact> {
        let dir = self.config.target_root.join(kind.dir_name());
        Ok(Artifact {
            source_url: Url::parse(&url)?,
            archive_path: dir.join(format!("{}.tar.gz", kind.dir_name())),
            extract_destination: dir.join(format!("{}-bin", kind.dir_name())),
            force_refresh,
            provided: provided.cloned(),
        })
    }

    fn cluster_starter(&self) -> Component {
        self.component(
            ComponentKind::ClusterStarter,
            Vec::new(),
            json!({
                "additional": {
                    "image": {"cluster-starter": self.config.images.cluster_starter}
                }
            }),
        )
    }

    fn hadoop(&self) -> Result<Component> {
        let versions = &self.selection.versions;
        let url = format!(
            "{base}/hadoop/releases/download/v{v}/hadoop-{v}.tar.gz",
            base = ARTIFACT_BASE_URL,
            v = versions.hadoop
        );
        let artifact = self.artifact(
            ComponentKind::Hadoop,
            url,
            self.selection.force_refresh.hadoop,
            self.selection.provided.hadoop.as_ref(),
        )?;

        let quorum: Vec<u32> = (1..=QUORUM_SIZE).collect();
        let data = json!({
            "primary_namenode": {
                "host": "primary-namenode",
                "rpc-port": NAMENODE_RPC_PORT,
                "http-port": NAMENODE_HTTP_PORT
            },
            "secondary_namenode": {
                "host": "secondary-namenode",
                "rpc-port": NAMENODE_RPC_PORT,
                "http-port": NAMENODE_HTTP_PORT
            },
            "journalnode": {
                "host": quorum.iter().map(|&i| journalnode_host(i)).collect::<Vec<_>>(),
                "port": JOURNALNODE_PORT
            },
            "zookeeper": {
                "host": quorum.iter().map(|&i| zookeeper_host(i)).collect::<Vec<_>>(),
                "port": ZOOKEEPER_PORT
            },
            "yarn_history": {"host": "yarn-history", "port": YARN_HISTORY_PORT},
            "resource_manager": {
                "host": "resource-manager",
                "port": RESOURCE_MANAGER_PORT,
                "web-port": RESOURCE_MANAGER_WEB_PORT,
                "resource-tracker-port": RESOURCE_TRACKER_PORT,
                "scheduler-port": SCHEDULER_PORT
            },
            "datanode": {
                "host": (1..=self.selection.datanodes).map(datanode_host).collect::<Vec<_>>(),
                "rpc-port": DATANODE_HTTP_PORT,
                "nodemanager-port": NODEMANAGER_PORT
            },
            "additional": {
                "users": predefined_users(),
                "groups": predefined_groups(),
                "dependency-versions": {
                    "hadoop": versions.hadoop,
                    "java": versions.java,
                    "zookeeper": versions.zookeeper
                },
                "agent": {"port": AGENT_PORT},
                "image": {"hadoop": self.config.images.hadoop}
            }
        });
        Ok(self.component(ComponentKind::Hadoop, vec![artifact], data))
    }

    fn hive(&self) -> Result<Component> {
        let version = &self.selection.versions.hive;
        let url = format!(
            "{base}/hive/releases/download/v{v}/apache-hive-{v}.tar.gz",
            base = ARTIFACT_BASE_URL,
            v = version
        );
        let artifact = self.artifact(
            ComponentKind::Hive,
            url,
            self.selection.force_refresh.hive,
            self.selection.provided.hive.as_ref(),
        )?;
        let data = json!({
            "hive_server": {
                "host": "hive-server",
                "thrift-port": HIVE_SERVER_THRIFT_PORT,
                "http-port": HIVE_SERVER_HTTP_PORT
            },
            "hive_metastore": {
                "host": "hive-metastore",
                "thrift-port": HIVE_METASTORE_PORT,
                "metastore-db-host": "cluster-db",
                "metastore-db-port": CLUSTER_DB_PORT,
                "metastore-db-name": "metastore",
                "metastore-db-user": "hive",
                "metastore-db-password": "hive"
            },
            "additional": {"dependency-versions": {"hive": version}}
        });
        Ok(self.component(ComponentKind::Hive, vec![artifact], data))
    }

    fn spark(&self) -> Result<Component> {
        let versions = &self.selection.versions;
        let build = format!("{}-{}-{}", versions.spark, versions.scala, versions.hadoop);
        let url = format!(
            "{base}/spark/releases/download/v{build}/spark-{build}.tar.gz",
            base = ARTIFACT_BASE_URL,
            build = build
        );
        let artifact = self.artifact(
            ComponentKind::Spark,
            url,
            self.selection.force_refresh.spark,
            self.selection.provided.spark.as_ref(),
        )?;
        let data = json!({
            "additional": {
                "dependency-versions": {"spark": versions.spark, "scala": versions.scala}
            }
        });
        Ok(self.component(ComponentKind::Spark, vec![artifact], data))
    }

    fn spark_history(&self) -> Component {
        self.component(
            ComponentKind::SparkHistory,
            Vec::new(),
            json!({"spark_history": {"host": "spark-history", "port": SPARK_HISTORY_PORT}}),
        )
    }

    fn spark_thrift(&self) -> Component {
        self.component(
            ComponentKind::SparkThrift,
            Vec::new(),
            json!({
                "spark_thrift": {
                    "host": "spark-thrift",
                    "thrift-port": SPARK_THRIFT_PORT,
                    "http-port": SPARK_THRIFT_HTTP_PORT
                }
            }),
        )
    }

    fn presto(&self) -> Result<Component> {
        let version = &self.selection.versions.presto;
        let url = format!(
            "{base}/presto/releases/download/v{v}/presto-server-{v}.tar.gz",
            base = ARTIFACT_BASE_URL,
            v = version
        );
        let artifact = self.artifact(
            ComponentKind::Presto,
            url,
            self.selection.force_refresh.presto,
            self.selection.provided.presto.as_ref(),
        )?;
        let workers: Vec<Value> = (1..=presto_worker_placements(self.selection))
            .map(|id| json!({"host": presto_worker_host(id), "port": PRESTO_WORKER_PORT}))
            .collect();
        let data = json!({
            "presto_server": {"host": "presto-server", "port": PRESTO_COORDINATOR_PORT},
            "presto_worker": workers,
            "additional": {"dependency-versions": {"presto": version}}
        });
        Ok(self.component(ComponentKind::Presto, vec![artifact], data))
    }

    fn hue(&self) -> Component {
        self.component(
            ComponentKind::Hue,
            Vec::new(),
            json!({
                "hue": {
                    "host": "hue",
                    "port": HUE_PORT,
                    "db-user": "hue",
                    "db-password": "hue",
                    "db-name": "hue",
                    "db-host": "cluster-db",
                    "db-port": CLUSTER_DB_PORT
                },
                "additional": {"dependency-versions": {"hue": self.selection.versions.hue}}
            }),
        )
    }
}

fn predefined_groups() -> Value {
    json!({
        "admin": 150,
        "hadoop": 151,
        "hadoopsvc": 152,
        "usersvc": 154,
        "dataplatform_user": 155,
        "hadoopUser": 156,
        "bi_user_group": 157,
        "ml_user_group": 158,
        "de_user_group": 159
    })
}

fn predefined_users() -> Value {
    json!({
        "hdfs": {"uid": 180, "groups": ["admin"], "isSvc": true, "proxyGroup": "*"},
        "webhdfs": {"uid": 181, "groups": ["admin"], "isSvc": true, "proxyGroup": "*"},
        "hive": {"uid": 182, "groups": ["hadoopsvc", "hadoopUser"], "isSvc": true, "proxyGroup": "hadoopUser"},
        "hue": {"uid": 183, "groups": ["hadoopsvc", "hadoopUser"], "isSvc": true, "proxyGroup": "hadoopUser"},
        "spark": {"uid": 184, "groups": ["hadoopsvc", "hadoopUser"], "isSvc": true, "proxyGroup": "hadoopUser"},
        "bi_user": {"uid": 185, "groups": ["dataplatform_user", "hadoopUser", "bi_user_group"], "isSvc": false},
        "bi_svc": {"uid": 186, "groups": ["usersvc", "hadoopUser"], "isSvc": true, "proxyGroup": "bi_user_group"},
        "ml_user": {"uid": 187, "groups": ["dataplatform_user", "hadoopUser", "ml_user_group"], "isSvc": false},
        "ml_svc": {"uid": 188, "groups": ["usersvc", "hadoopUser"], "isSvc": true, "proxyGroup": "ml_user_group"},
        "de_user": {"uid": 189, "groups": ["dataplatform_user", "hadoopUser", "de_user_group"], "isSvc": false},
        "de_svc": {"uid": 190, "groups": ["usersvc", "hadoopUser"], "isSvc": true, "proxyGroup": "de_user_group"}
    })
}
