//! # Component Catalog and Topology Construction
//!
//! This module encodes the fixed packing policy that places logical roles on
//! a small set of named containers:
//!
//! - `cluster-starter`: the service that kicks off role scripts through each
//!   node's agent.
//! - `primary-namenode`: active namenode, journal node 1, zookeeper 1 and the
//!   YARN history server; Hive server and metastore when Hive is enabled; the
//!   Presto coordinator when Presto is enabled.
//! - `secondary-namenode`: standby namenode, journal node 2, zookeeper 2 and
//!   the resource manager; Spark history and thrift servers when enabled.
//! - `datanode1..N`: one datanode role each. The first datanodes carry the
//!   quorum peers not already on the namenodes, and Presto workers attach to
//!   them when Presto is enabled.
//! - `hue`: standalone Hue service.
//! - `cluster-db` (auxiliary): the shared metadata database, present iff Hive
//!   or Hue is enabled. Its init scripts are a union of per-feature fragments.
//!
//! Every role is expressed as a list of fragments (a shared base plus the role
//! itself) folded by [`crate::instance::build`].

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::config::{ClusterConfig, FeatureSelection};
use crate::defaults::*;
use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::instance::{build, CompositeInstance};

/// How many requested Presto workers are withheld from placement.
///
/// Workers are placed on `datanode1` up to the exclusive bound
/// `min(workers, datanodes)`, which historically leaves one requested worker
/// unplaced. Unplaced workers are dropped with a warning.
pub const PRESTO_WORKER_PLACEMENT_OFFSET: u32 = 1;

pub const CLUSTER_STARTER: &str = "cluster-starter";
pub const PRIMARY_NAMENODE: &str = "primary-namenode";
pub const SECONDARY_NAMENODE: &str = "secondary-namenode";
pub const HUE: &str = "hue";
pub const CLUSTER_DB: &str = "cluster-db";

pub fn datanode_host(id: u32) -> String {
    format!("datanode{}", id)
}

pub fn journalnode_host(id: u32) -> String {
    format!("journalnode{}", id)
}

pub fn zookeeper_host(id: u32) -> String {
    format!("zookeeper{}", id)
}

pub fn presto_worker_host(id: u32) -> String {
    format!("presto-worker{}", id)
}

/// Host port of replica `id` (1-indexed) for a role published from `base`.
pub fn replica_port(base: u16, id: u32) -> Result<u16> {
    u32::from(base)
        .checked_add(id.saturating_sub(1))
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| Error::config(format!("replica {} overflows the port range from {}", id, base)))
}

/// Number of Presto workers actually placed for `selection`.
pub fn presto_worker_placements(selection: &FeatureSelection) -> u32 {
    let selection = selection.effective();
    if !selection.presto {
        return 0;
    }
    selection
        .presto_workers
        .min(selection.datanodes)
        .saturating_sub(PRESTO_WORKER_PLACEMENT_OFFSET)
}

/// The quorum peer carried by datanode `id`, if any.
fn datanode_quorum_peer(id: u32) -> Option<u32> {
    // Peers 1 and 2 live on the namenodes.
    let peer = id + 2;
    (peer <= QUORUM_SIZE).then_some(peer)
}

/// Every composite instance of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    /// Cluster instances, in packing order.
    pub instances: Vec<CompositeInstance>,
    /// Supporting resources such as the shared database.
    pub auxiliary: Vec<CompositeInstance>,
}

impl Topology {
    /// All instances followed by all auxiliary resources.
    pub fn all(&self) -> impl Iterator<Item = &CompositeInstance> {
        self.instances.iter().chain(self.auxiliary.iter())
    }

    /// Looks up an instance or auxiliary resource by name.
    pub fn get(&self, name: &str) -> Option<&CompositeInstance> {
        self.all().find(|instance| instance.name() == name)
    }

    /// Checks names are unique, host ports are published once and every
    /// instance has an image.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut ports: HashMap<&str, &str> = HashMap::new();

        for instance in self.all() {
            if !names.insert(instance.name()) {
                return Err(Error::config(format!(
                    "instance name '{}' is used more than once",
                    instance.name()
                )));
            }
            if instance.image().is_none() {
                return Err(Error::config(format!(
                    "instance '{}' has no image",
                    instance.name()
                )));
            }
            for port in instance.host_ports() {
                if let Some(owner) = ports.insert(port, instance.name()) {
                    return Err(Error::Config {
                        message: format!(
                            "host port {} is published by both '{}' and '{}'",
                            port,
                            owner,
                            instance.name()
                        ),
                        hint: Some("Reduce the number of datanodes or Presto workers".to_string()),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds the topology for `selection`.
///
/// Fails fast with a configuration error before any I/O if the selection is
/// invalid or the resulting topology would collide.
pub fn build_topology(config: &ClusterConfig, selection: &FeatureSelection) -> Result<Topology> {
    selection.validate()?;
    let selection = selection.effective();
    let roles = Roles { config };

    let mut instances = vec![build(CLUSTER_STARTER, &[roles.cluster_starter()])];

    let mut primary = roles.hadoop(roles.primary_namenode());
    primary.extend(roles.hadoop(roles.journalnode(1)));
    primary.extend(roles.hadoop(roles.zookeeper(1)));
    primary.extend(roles.hadoop(roles.yarn_history()));
    if selection.hive {
        primary.extend(roles.hive(roles.hive_server()));
        primary.extend(roles.hive(roles.hive_metastore()));
    }
    if selection.presto {
        primary.extend(roles.presto(roles.presto_coordinator()));
    }
    instances.push(build(PRIMARY_NAMENODE, &primary));

    let mut secondary = roles.hadoop(roles.secondary_namenode());
    secondary.extend(roles.hadoop(roles.journalnode(2)));
    secondary.extend(roles.hadoop(roles.zookeeper(2)));
    secondary.extend(roles.hadoop(roles.resource_manager()));
    if selection.spark_history {
        secondary.extend(roles.spark(roles.spark_history()));
    }
    if selection.spark_thrift {
        secondary.extend(roles.spark(roles.spark_thrift()));
    }
    instances.push(build(SECONDARY_NAMENODE, &secondary));

    let workers = presto_worker_placements(&selection);
    if selection.presto && workers < selection.presto_workers {
        warn!(
            "Placing {} of {} requested Presto workers on {} datanode(s); {} dropped",
            workers,
            selection.presto_workers,
            selection.datanodes,
            selection.presto_workers - workers
        );
    }

    for id in 1..=selection.datanodes {
        let mut fragments = roles.hadoop(roles.datanode(id)?);
        if let Some(peer) = datanode_quorum_peer(id) {
            fragments.extend(roles.hadoop(roles.journalnode(peer)));
            fragments.extend(roles.hadoop(roles.zookeeper(peer)));
        }
        if id <= workers {
            fragments.extend(roles.presto(roles.presto_worker(id)?));
        }
        instances.push(build(datanode_host(id), &fragments));
    }

    if selection.hue {
        instances.push(build(HUE, &[roles.hue(&selection.versions.hue)]));
    }

    let mut auxiliary = Vec::new();
    if selection.needs_cluster_db() {
        let mut fragments = vec![roles.cluster_db()];
        if selection.hive {
            fragments.push(roles.hive_init_sql());
        }
        if selection.hue {
            fragments.push(roles.hue_init_sql());
        }
        auxiliary.push(build(CLUSTER_DB, &fragments));
    }

    let topology = Topology {
        instances,
        auxiliary,
    };

    for instance in topology.all() {
        if !instance.image_conflicts().is_empty() {
            warn!(
                "Instance '{}' uses image {:?}; ignoring later declarations {:?}",
                instance.name(),
                instance.image(),
                instance.image_conflicts()
            );
        }
        debug!("Instance '{}' carries roles {:?}", instance.name(), instance.roles());
    }

    topology.validate()?;
    Ok(topology)
}

/// Fragment factories for every role, parameterized by the run's config.
struct Roles<'a> {
    config: &'a ClusterConfig,
}

fn script(name: &str) -> (String, String) {
    (format!("./scripts/{}", name), format!("/scripts/{}", name))
}

impl Roles<'_> {
    /// Shared base of every Hadoop-family role.
    fn hadoop_base(&self) -> Fragment {
        let mut fragment = Fragment::new("hadoop-base")
            .image(&self.config.images.hadoop)
            .volume("./hadoop/hadoop-bin", "/opt/hadoop")
            .volume("./hadoop/conf", "/etc/hadoop/conf")
            .env("HADOOP_HOME", "/opt/hadoop")
            .env("HADOOP_CONF_DIR", "/etc/hadoop/conf")
            .option("tty", true);
        for name in ["agent.py", "entrypoint.sh", "initialize.sh"] {
            let (host, container) = script(name);
            fragment = fragment.volume(host, container);
        }
        fragment
    }

    fn hadoop(&self, role: Fragment) -> Vec<Fragment> {
        vec![self.hadoop_base(), role]
    }

    fn hive(&self, role: Fragment) -> Vec<Fragment> {
        let base = Fragment::new("hive-base")
            .volume("./hive/hive-bin", "/opt/hive")
            .volume("./hive/conf", "/opt/hive/conf")
            .env("HIVE_HOME", "/opt/hive")
            .env("HIVE_CONF_DIR", "/opt/hive/conf");
        vec![self.hadoop_base(), base, role]
    }

    fn spark(&self, role: Fragment) -> Vec<Fragment> {
        let base = Fragment::new("spark-base")
            .volume("./spark/spark-bin", "/opt/spark")
            .volume("./spark/conf", "/opt/spark/conf")
            .env("SPARK_HOME", "/opt/spark")
            .env("SPARK_CONF_DIR", "/opt/spark/conf");
        vec![self.hadoop_base(), base, role]
    }

    fn presto(&self, role: Fragment) -> Vec<Fragment> {
        let base = Fragment::new("presto-base")
            .volume("./presto/presto-bin", "/opt/presto")
            .env("PRESTO_HOME", "/opt/presto");
        vec![self.hadoop_base(), base, role]
    }

    fn with_script(fragment: Fragment, name: &str) -> Fragment {
        let (host, container) = script(name);
        fragment.volume(host, container)
    }

    fn primary_namenode(&self) -> Fragment {
        let fragment = Fragment::new("namenode")
            .host(PRIMARY_NAMENODE)
            .port(NAMENODE_HTTP_PORT, NAMENODE_HTTP_PORT);
        Self::with_script(fragment, "run_active_nn.sh")
    }

    fn secondary_namenode(&self) -> Fragment {
        let fragment = Fragment::new("standby-namenode")
            .host(SECONDARY_NAMENODE)
            .port(SECONDARY_NAMENODE_HTTP_HOST_PORT, NAMENODE_HTTP_PORT);
        Self::with_script(fragment, "run_standby_nn.sh")
    }

    fn journalnode(&self, id: u32) -> Fragment {
        let fragment = Fragment::new("journalnode").host(journalnode_host(id));
        Self::with_script(fragment, "run_journal.sh")
    }

    fn zookeeper(&self, id: u32) -> Fragment {
        let fragment = Fragment::new("zookeeper")
            .host(zookeeper_host(id))
            .volume("./hadoop/conf/zoo.cfg", "/opt/zookeeper/conf/zoo.cfg")
            .env("MY_NODE_NUM", id);
        Self::with_script(fragment, "run_zookeeper.sh")
    }

    fn yarn_history(&self) -> Fragment {
        let fragment = Fragment::new("yarn-history")
            .host("yarn-history")
            .port(YARN_HISTORY_PORT, YARN_HISTORY_PORT);
        Self::with_script(fragment, "run_yarn_hs.sh")
    }

    fn resource_manager(&self) -> Fragment {
        let fragment = Fragment::new("resource-manager")
            .host("resource-manager")
            .port(RESOURCE_MANAGER_WEB_PORT, RESOURCE_MANAGER_WEB_PORT);
        Self::with_script(fragment, "run_rm.sh")
    }

    fn datanode(&self, id: u32) -> Result<Fragment> {
        let fragment = Fragment::new("datanode")
            .host(datanode_host(id))
            .port(replica_port(DATANODE_HTTP_PORT, id)?, DATANODE_HTTP_PORT);
        let fragment = Self::with_script(fragment, "run_datanode.sh");
        Ok(Self::with_script(fragment, "run_nodemanager.sh"))
    }

    fn hive_server(&self) -> Fragment {
        let fragment = Fragment::new("hive-server")
            .host("hive-server")
            .port(HIVE_SERVER_THRIFT_PORT, HIVE_SERVER_THRIFT_PORT)
            .port(HIVE_SERVER_HTTP_PORT, HIVE_SERVER_HTTP_PORT)
            .port(HIVE_SERVER_WEB_PORT, HIVE_SERVER_WEB_PORT);
        Self::with_script(fragment, "run_hive_server.sh")
    }

    fn hive_metastore(&self) -> Fragment {
        let fragment = Fragment::new("hive-metastore")
            .host("hive-metastore")
            .port(HIVE_METASTORE_PORT, HIVE_METASTORE_PORT);
        Self::with_script(fragment, "run_metastore.sh")
    }

    fn spark_history(&self) -> Fragment {
        let fragment = Fragment::new("spark-history")
            .host("spark-history")
            .port(SPARK_HISTORY_PORT, SPARK_HISTORY_PORT)
            .volume("./spark-history", "/opt/spark-history");
        Self::with_script(fragment, "run_spark_history.sh")
    }

    fn spark_thrift(&self) -> Fragment {
        let fragment = Fragment::new("spark-thrift")
            .host("spark-thrift")
            .port(SPARK_THRIFT_PORT, SPARK_THRIFT_PORT)
            .port(SPARK_THRIFT_HTTP_PORT, SPARK_THRIFT_HTTP_PORT)
            .volume("./spark-thrift", "/opt/spark-thrift");
        Self::with_script(fragment, "run_spark_thrift.sh")
    }

    fn presto_coordinator(&self) -> Fragment {
        let fragment = Fragment::new("presto-coordinator")
            .host("presto-server")
            .port(PRESTO_COORDINATOR_PORT, PRESTO_COORDINATOR_PORT)
            .volume("./presto/coordinator", "/opt/presto/etc")
            .env("PRESTO_ROLE", "coordinator");
        Self::with_script(fragment, "run_presto.sh")
    }

    fn presto_worker(&self, id: u32) -> Result<Fragment> {
        let fragment = Fragment::new("presto-worker")
            .host(presto_worker_host(id))
            .port(replica_port(PRESTO_WORKER_PORT, id)?, PRESTO_WORKER_PORT)
            .volume("./presto/worker", "/opt/presto/etc")
            .env("PRESTO_ROLE", "worker")
            .env("PRESTO_NODE_ID", presto_worker_host(id));
        Ok(Self::with_script(fragment, "run_presto.sh"))
    }

    fn cluster_starter(&self) -> Fragment {
        Fragment::new(CLUSTER_STARTER)
            .image(&self.config.images.cluster_starter)
            .host(CLUSTER_STARTER)
    }

    fn hue(&self, version: &str) -> Fragment {
        Fragment::new(HUE)
            .image(format!("{}:{}", HUE_IMAGE_REPOSITORY, version))
            .host(HUE)
            .port(HUE_PORT, HUE_PORT)
            .volume("./hue/conf/hue.ini", "/usr/share/hue/desktop/conf/hue.ini")
            .volume("./hue/conf/log.conf", "/usr/share/hue/desktop/conf/log.conf")
            .env("HUE_HOME", "/usr/share/hue")
            .option("mem_limit", "2g")
    }

    fn cluster_db(&self) -> Fragment {
        Fragment::new(CLUSTER_DB)
            .image(&self.config.images.cluster_db)
            .host(CLUSTER_DB)
            .port(CLUSTER_DB_PORT, CLUSTER_DB_PORT)
            .env("POSTGRES_HOST_AUTH_METHOD", "trust")
            .env("POSTGRES_PASSWORD", "postgres")
            .option("restart", "always")
    }

    fn hive_init_sql(&self) -> Fragment {
        Fragment::new("hive-metastore-db").volume(
            "./hive/sql/create_db.sql",
            "/docker-entrypoint-initdb.d/create_hive_db.sql",
        )
    }

    fn hue_init_sql(&self) -> Fragment {
        Fragment::new("hue-db").volume(
            "./hue/sql/create_db.sql",
            "/docker-entrypoint-initdb.d/create_hue_db.sql",
        )
    }
}
