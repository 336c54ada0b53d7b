//! Default values for docker-hadoop configuration.
//!
//! This module centralizes the constants shared by the catalog, the pipeline
//! and the CLI so that ports, image names and versions are declared once.

use std::path::PathBuf;

/// Extension marking a file as a template to render.
pub const TEMPLATE_EXTENSION: &str = "template";

/// Name of the shared docker network every service joins.
pub const NETWORK_NAME: &str = "hadoop.net";

/// Name of the manifest written at the target root.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Compose file format version.
pub const COMPOSE_VERSION: &str = "3";

/// HDFS nameservice used in the rendered Hadoop configuration.
pub const CLUSTER_NAME: &str = "nameservice";

pub const HADOOP_IMAGE: &str = "local-hadoop";
pub const CLUSTER_STARTER_IMAGE: &str = "cluster-starter";
pub const HUE_IMAGE_REPOSITORY: &str = "gethue/hue";
pub const CLUSTER_DB_IMAGE: &str = "postgres:13.1";

pub const HADOOP_VERSION: &str = "3.3.0";
pub const HIVE_VERSION: &str = "3.1.2";
pub const SPARK_VERSION: &str = "3.1.1";
pub const SCALA_VERSION: &str = "2.13";
pub const JAVA_VERSION: &str = "8";
pub const ZOOKEEPER_VERSION: &str = "3.6.2";
pub const HUE_VERSION: &str = "4.9.0";
pub const PRESTO_VERSION: &str = "0.252";

/// Number of journal node / zookeeper peers forming the quorum.
pub const QUORUM_SIZE: u32 = 3;

pub const NAMENODE_HTTP_PORT: u16 = 9870;
pub const SECONDARY_NAMENODE_HTTP_HOST_PORT: u16 = 9871;
pub const NAMENODE_RPC_PORT: u16 = 9000;
pub const JOURNALNODE_PORT: u16 = 8485;
pub const ZOOKEEPER_PORT: u16 = 2181;
pub const RESOURCE_MANAGER_PORT: u16 = 8032;
pub const RESOURCE_MANAGER_WEB_PORT: u16 = 8088;
pub const RESOURCE_TRACKER_PORT: u16 = 8031;
pub const SCHEDULER_PORT: u16 = 8030;
pub const YARN_HISTORY_PORT: u16 = 8188;
pub const DATANODE_HTTP_PORT: u16 = 9864;
pub const NODEMANAGER_PORT: u16 = 8042;
pub const HIVE_SERVER_THRIFT_PORT: u16 = 10000;
pub const HIVE_SERVER_HTTP_PORT: u16 = 10001;
pub const HIVE_SERVER_WEB_PORT: u16 = 10002;
pub const HIVE_METASTORE_PORT: u16 = 9083;
pub const SPARK_HISTORY_PORT: u16 = 18080;
pub const SPARK_THRIFT_PORT: u16 = 10010;
pub const SPARK_THRIFT_HTTP_PORT: u16 = 10011;
pub const PRESTO_COORDINATOR_PORT: u16 = 8081;
pub const PRESTO_WORKER_PORT: u16 = 8091;
pub const HUE_PORT: u16 = 8888;
pub const CLUSTER_DB_PORT: u16 = 5432;
pub const AGENT_PORT: u16 = 3333;

/// Release host for the prebuilt Hadoop-family archives.
pub const ARTIFACT_BASE_URL: &str = "https://github.com/dev-moonduck";

/// Default number of datanode instances.
pub const DATANODES: u32 = 1;

/// Default download timeout, in seconds.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Returns the default directory holding the component templates.
pub fn default_templates_root() -> PathBuf {
    PathBuf::from("templates")
}

/// Returns the default directory the cluster is staged into.
pub fn default_target_root() -> PathBuf {
    PathBuf::from("target")
}
