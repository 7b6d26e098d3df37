//! Gridcast CLI - build job targets from a topology file and run jobs on them

mod echo;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridcast_core::application::{
    ComputeConfig, ComputeService, EmptyBroadcastPolicy, NodeExecution,
};
use gridcast_core::domain::{
    all_nodes, BroadcastJobTarget, ClusterNode, JobDescriptor, JobTarget, NodeId,
};
use gridcast_core::port::id_provider::UuidProvider;
use gridcast_core::port::time_provider::SystemTimeProvider;
use gridcast_core::port::{StaticTopology, TopologyProvider};

use echo::EchoDispatcher;

#[derive(Parser)]
#[command(name = "gridcast")]
#[command(about = "Gridcast compute job targets", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Topology file: {"local": "<id>", "members": [{"id", "name", "address"}...]}
    #[arg(long, global = true, env = "GRIDCAST_TOPOLOGY", default_value = "topology.json")]
    topology: PathBuf,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List topology members
    Nodes,

    /// Run a job on every selected node
    Broadcast {
        /// Node ids (comma separated); all members when omitted
        #[arg(long, value_delimiter = ',')]
        nodes: Option<Vec<String>>,

        #[command(flatten)]
        job: JobArgs,

        /// Fail a broadcast to zero nodes instead of returning no results
        #[arg(long, env = "GRIDCAST_REJECT_EMPTY")]
        reject_empty: bool,

        /// Max concurrent dispatches (at least 1)
        #[arg(long, env = "GRIDCAST_MAX_PARALLEL", value_parser = clap::value_parser!(u64).range(1..))]
        max_parallel: Option<u64>,
    },

    /// Run a job once, on one node
    Submit {
        /// Run on exactly this node
        #[arg(long, conflicts_with = "any", required_unless_present = "any")]
        node: Option<String>,

        /// Run on any one of these nodes (comma separated)
        #[arg(long, value_delimiter = ',')]
        any: Option<Vec<String>>,

        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(clap::Args)]
struct JobArgs {
    /// Job class name
    #[arg(short, long)]
    job: String,

    /// Deployment units (comma separated)
    #[arg(long, value_delimiter = ',')]
    units: Vec<String>,

    /// Job arguments as JSON
    #[arg(long, default_value = "null")]
    args: String,
}

impl JobArgs {
    fn into_descriptor(self) -> Result<JobDescriptor> {
        let args: serde_json::Value =
            serde_json::from_str(&self.args).context("Invalid JSON args")?;
        Ok(JobDescriptor::new(self.job)
            .with_units(self.units)
            .with_args(args))
    }
}

#[derive(Serialize, Tabled)]
struct NodeRow {
    id: String,
    name: String,
    address: String,
    local: bool,
}

#[derive(Serialize, Tabled)]
struct ExecutionRow {
    node: String,
    job_id: String,
    route: String,
    state: String,
    result: String,
}

impl From<&NodeExecution> for ExecutionRow {
    fn from(e: &NodeExecution) -> Self {
        Self {
            node: e.node.id.to_string(),
            job_id: e.status.id.clone(),
            route: e
                .route
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            state: e.status.state.to_string(),
            result: match &e.outcome {
                Ok(value) => value.to_string(),
                Err(err) => err.to_string(),
            },
        }
    }
}

fn init_logging() {
    let log_format = std::env::var("GRIDCAST_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gridcast=info,gridcast_core=info"));

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_topology(path: &Path) -> Result<StaticTopology> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file {}", path.display()))?;
    StaticTopology::from_json(&raw).context("Invalid topology file")
}

/// Resolve node ids against the topology. Unknown ids are kept as bare nodes
/// so the compute service reports them as departed.
fn resolve_nodes(topology: &dyn TopologyProvider, ids: &[String]) -> Vec<ClusterNode> {
    ids.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|id| {
            topology
                .member(&NodeId::new(id))
                .unwrap_or_else(|| ClusterNode::new(id))
        })
        .collect()
}

fn broadcast_config(reject_empty: bool, max_parallel: Option<u64>) -> ComputeConfig {
    ComputeConfig {
        empty_broadcast: if reject_empty {
            EmptyBroadcastPolicy::Reject
        } else {
            EmptyBroadcastPolicy::Allow
        },
        max_parallel_dispatch: max_parallel.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
    }
}

/// Named nodes, or every topology member when no names are given
fn broadcast_target(topology: &dyn TopologyProvider, nodes: Option<Vec<String>>) -> BroadcastJobTarget {
    match nodes {
        Some(ids) => all_nodes(resolve_nodes(topology, &ids)),
        None => all_nodes(topology.all_members()),
    }
}

fn submit_target(
    topology: &dyn TopologyProvider,
    node: Option<String>,
    any: Option<Vec<String>>,
) -> Result<JobTarget> {
    match node {
        Some(id) => {
            let node = resolve_nodes(topology, &[id])
                .into_iter()
                .next()
                .context("Node id cannot be empty")?;
            Ok(JobTarget::node(node))
        }
        None => Ok(JobTarget::try_any_node(
            any.map(|ids| resolve_nodes(topology, &ids)),
        )?),
    }
}

/// Compute service wired to the echo dispatcher for `topology`
fn compute_service(topology: Arc<StaticTopology>, config: ComputeConfig) -> ComputeService {
    let dispatcher = Arc::new(EchoDispatcher::new(topology.local_member().id));
    ComputeService::new(
        topology,
        dispatcher,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    )
    .with_config(config)
}

fn print_executions(executions: &[NodeExecution], as_json: bool) -> Result<()> {
    let rows: Vec<ExecutionRow> = executions.iter().map(ExecutionRow::from).collect();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("{}", "No nodes selected".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!(version = gridcast_core::VERSION, topology = %cli.topology.display(), "gridcast starting");

    let topology = Arc::new(load_topology(&cli.topology)?);
    let local = topology.local_member();

    match cli.command {
        Commands::Nodes => {
            let rows: Vec<NodeRow> = topology
                .all_members()
                .into_iter()
                .map(|n| NodeRow {
                    local: n.id == local.id,
                    id: n.id.to_string(),
                    name: n.name,
                    address: n.address.unwrap_or_else(|| "-".to_string()),
                })
                .collect();

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Broadcast {
            nodes,
            job,
            reject_empty,
            max_parallel,
        } => {
            let service = compute_service(
                topology.clone(),
                broadcast_config(reject_empty, max_parallel),
            );
            let target = broadcast_target(topology.as_ref(), nodes);

            let result = service
                .broadcast(&target, job.into_descriptor()?)
                .await
                .context("Broadcast failed")?;

            print_executions(result.executions(), cli.json)?;

            if !cli.json {
                let summary = format!(
                    "{} succeeded, {} failed",
                    result.succeeded(),
                    result.failed()
                );
                if result.failed() == 0 {
                    println!("{}", summary.green().bold());
                } else {
                    println!("{}", summary.red().bold());
                }
            }
        }

        Commands::Submit { node, any, job } => {
            let service = compute_service(topology.clone(), ComputeConfig::default());
            let target = submit_target(topology.as_ref(), node, any)?;

            let execution = service
                .submit(&target, job.into_descriptor()?)
                .await
                .context("Submit failed")?;

            print_executions(std::slice::from_ref(&execution), cli.json)?;
        }
    }

    Ok(())
}
