use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use sepnode_community::logger::init_logger;
use sepnode_community::metrics::{community_count_ratio, modularity, nmi};
use sepnode_community::{anneal, assign_communities, classify_with_config, validate, Graph, RunConfig, VInt, ViolationTriple};

#[derive(Parser, Debug)]
#[command(name = "sepnode", version, about = "Community detection through separation nodes")]
struct Cli {
    /// Append logs to this file as well as stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify separators, grow communities and report them as JSON.
    Classify {
        graph: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        reads: Option<usize>,
        /// Score edges on all cores.
        #[arg(long)]
        parallel: bool,
    },
    /// Anneal towards a feasible separator set using ground truth.
    Anneal {
        graph: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Serialize)]
struct ClassifyReport {
    nodes: usize,
    edges: usize,
    separators: Vec<VInt>,
    communities: Vec<Vec<VInt>>,
    modularity: f64,
    violations: Option<ViolationTriple>,
    nmi: Option<f64>,
    community_ratio: Option<f64>,
}

#[derive(Serialize)]
struct AnnealReport {
    nodes: usize,
    separators: Vec<VInt>,
    objective: f64,
    violations: ViolationTriple,
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_yaml_file(path),
        None => Ok(RunConfig::default()),
    }
}

fn load_graph(path: &PathBuf) -> Result<Graph> {
    let graph = Graph::from_graph_file(path).with_context(|| format!("Failed to load graph {}", path.display()))?;
    info!("Loaded graph with {} nodes and {} edges", graph.v_size(), graph.e_size());
    Ok(graph)
}

fn run_classify(graph: &Graph, config: &RunConfig) -> Result<ClassifyReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let classification = classify_with_config(graph, config, &mut rng)?;
    let partition = assign_communities(graph, &classification)?;
    let membership = partition.membership(graph.v_size());

    let mut report = ClassifyReport {
        nodes: graph.v_size(),
        edges: graph.e_size(),
        separators: classification.separators(),
        communities: partition
            .communities()
            .iter()
            .map(|community| community.iter().copied().collect())
            .collect(),
        modularity: modularity(graph, &membership)?,
        violations: None,
        nmi: None,
        community_ratio: None,
    };
    if let Some(ground_truth) = graph.ground_truth() {
        report.violations = Some(validate(graph, &classification)?);
        report.nmi = Some(nmi(&membership, ground_truth.community_index())?);
        report.community_ratio = Some(community_count_ratio(partition.len(), ground_truth.community_count())?);
    }
    Ok(report)
}

fn run_anneal(graph: &Graph, config: &RunConfig) -> Result<AnnealReport> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let outcome = anneal(graph, None, config.anneal_iterations, config.temperature, &mut rng)?;
    Ok(AnnealReport {
        nodes: graph.v_size(),
        separators: outcome.state.separators(),
        objective: outcome.objective,
        violations: outcome.violations,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_file.as_deref()).map_err(|err| anyhow::anyhow!("Failed to init logger: {}", err))?;

    let json = match cli.command {
        Command::Classify {
            graph,
            config,
            seed,
            reads,
            parallel,
        } => {
            let mut config = load_config(config.as_ref())?;
            config.parallel |= parallel;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(reads) = reads {
                config.reads = reads;
            }
            let graph = load_graph(&graph)?;
            serde_json::to_string_pretty(&run_classify(&graph, &config)?)?
        }
        Command::Anneal {
            graph,
            config,
            iterations,
            temperature,
            seed,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(iterations) = iterations {
                config.anneal_iterations = iterations;
            }
            if let Some(temperature) = temperature {
                config.temperature = temperature;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            let graph = load_graph(&graph)?;
            serde_json::to_string_pretty(&run_anneal(&graph, &config)?)?
        }
    };
    println!("{}", json);
    Ok(())
}
