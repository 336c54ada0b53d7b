//! # Topology Command Implementation
//!
//! Prints the containers a feature selection produces as a tree: each
//! container with its image, the roles folded into it, its network aliases
//! and its published ports.
//!
//! Read-only: nothing is downloaded or written.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;
use std::io;

use docker_hadoop::catalog::{build_topology, Topology};
use docker_hadoop::config::ClusterConfig;
use docker_hadoop::instance::CompositeInstance;
use docker_hadoop::output::{mark, Mark, OutputConfig};

use super::selection::SelectionArgs;

/// Print the containers a selection would produce
#[derive(Args, Debug)]
pub struct TopologyArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Show only container names.
    #[arg(long)]
    pub names_only: bool,
}

pub fn execute(args: TopologyArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let selection = args.selection.resolve()?;
    let topology = build_topology(&ClusterConfig::default(), &selection)?;

    println!(
        "{} {} containers",
        mark(&out, Mark::Tree),
        topology.all().count()
    );
    let root = build_tree(&topology, args.names_only);
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display topology: {}", e))?;
    Ok(())
}

fn build_tree(topology: &Topology, names_only: bool) -> TreeNode {
    let children = topology
        .all()
        .map(|instance| {
            if names_only {
                TreeNode::leaf(instance.name())
            } else {
                instance_node(instance)
            }
        })
        .collect();
    TreeNode {
        label: "docker-compose".to_string(),
        children,
    }
}

fn instance_node(instance: &CompositeInstance) -> TreeNode {
    let label = format!(
        "{} [{}]",
        instance.name(),
        instance.image().unwrap_or("no image")
    );
    let mut children = vec![TreeNode::group("roles", instance.roles())];
    if !instance.hosts().is_empty() {
        children.push(TreeNode::group("aliases", instance.hosts()));
    }
    if !instance.ports().is_empty() {
        children.push(TreeNode::group("ports", instance.ports()));
    }
    TreeNode { label, children }
}

#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: vec![],
        }
    }

    fn group(label: &str, items: &[String]) -> Self {
        Self {
            label: label.to_string(),
            children: items.iter().map(TreeNode::leaf).collect(),
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &ptree::Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
