//! topomorph-bench - benchmark driver over a dataset directory
//!
//! Usage:
//!   topomorph-bench <workflow> [--config <bench.json>] [--dataset <dir>] [--threads N|auto]
//!                   [--delete N] [--vertices N] [--edges N] [--seed N]
//!                   [--separator S] [--edges-only] [--output]
//!
//! Workflows:
//!   moralize    load the DAG from CSV (acyclicity enforced) and moralize it
//!   update      load from CSV, evict the first `delete` ids of id.rand
//!   add         build a seeded random graph
//!   traverse    load from CSV, renumber all properties in iteration order
//!   csr-export  load from CSV, write vertex.CSR / edge.CSR into the dataset

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use topomorph::graph::generate;
use topomorph::storage::{self, load_edges_csv, load_vertices_csv, require_id_batch};
use topomorph::{evict, export_csr, moralize_with, BenchConfig, PropertyGraph, ThreadCount};

type Graph = PropertyGraph<u64, u64>;

const WORKFLOWS: [&str; 5] = ["moralize", "update", "add", "traverse", "csr-export"];

fn usage() {
    eprintln!("Usage: topomorph-bench <workflow> [options]");
    eprintln!();
    eprintln!("Workflows: {}", WORKFLOWS.join(", "));
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>     JSON run configuration (flags below override it)");
    eprintln!("  --dataset <dir>     Directory with vertex.csv, edge.csv, id.rand");
    eprintln!("  --threads <n|auto>  Worker threads (default 1; auto = hardware parallelism)");
    eprintln!("  --delete <n>        Ids to evict from id.rand (default 10)");
    eprintln!("  --vertices <n>      Random graph vertices (default 100)");
    eprintln!("  --edges <n>         Random graph edge attempts (default 1000)");
    eprintln!("  --seed <n>          Random seed (default 111)");
    eprintln!("  --separator <c>     CSV separator (default ',')");
    eprintln!("  --edges-only        Skip vertex.csv; edges create their endpoints");
    eprintln!("  --output            Print per-vertex out-degrees of the result");
}

struct Args {
    workflow: String,
    config: BenchConfig,
    output: bool,
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], name: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    flag_value(args, name)
        .map(|raw| raw.parse::<T>().with_context(|| format!("invalid value for {}: {:?}", name, raw)))
        .transpose()
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let Some(workflow) = args.get(1).cloned() else {
        bail!("missing workflow");
    };
    if !WORKFLOWS.contains(&workflow.as_str()) {
        bail!("unknown workflow {:?}", workflow);
    }

    let mut config = match flag_value(args, "--config") {
        Some(path) => BenchConfig::read_from(&PathBuf::from(path))
            .with_context(|| format!("reading config {}", path))?,
        None => BenchConfig::default(),
    };

    if let Some(dataset) = flag_value(args, "--dataset") {
        config.dataset = PathBuf::from(dataset);
    }
    if let Some(separator) = flag_value(args, "--separator") {
        config.separator = separator.to_string();
    }
    if let Some(threads) = parse_flag::<ThreadCount>(args, "--threads")? {
        config.threads = threads.get();
    }
    if let Some(delete) = parse_flag(args, "--delete")? {
        config.delete = delete;
    }
    if let Some(vertices) = parse_flag(args, "--vertices")? {
        config.vertices = vertices;
    }
    if let Some(edges) = parse_flag(args, "--edges")? {
        config.edges = edges;
    }
    if let Some(seed) = parse_flag(args, "--seed")? {
        config.seed = seed;
    }
    if args.iter().any(|a| a == "--edges-only") {
        config.edges_only = true;
    }
    config.validate()?;

    Ok(Args {
        workflow,
        config,
        output: args.iter().any(|a| a == "--output"),
    })
}

fn load_graph(config: &BenchConfig, dag_check: bool) -> anyhow::Result<Graph> {
    let started = Instant::now();
    let mut graph = Graph::directed();

    if !config.edges_only {
        let path = config.vertex_csv();
        load_vertices_csv(&mut graph, &path, &config.vertex_csv_options()?)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    let path = config.edge_csv();
    load_edges_csv(&mut graph, &path, &config.edge_csv_options(dag_check)?)
        .with_context(|| format!("loading {}", path.display()))?;

    println!("== {} vertices  {} edges", graph.num_vertices(), graph.num_edges());
    println!("== load time: {:.6} sec", started.elapsed().as_secs_f64());
    Ok(graph)
}

fn print_degrees(graph: &Graph) {
    for (id, degree) in graph.degree_summary() {
        println!("== vertex {}: edge#-{}", id, degree);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = &args.config;
    let threads = config.thread_count()?;
    tracing::info!("Running {} on {:?} with {} threads", args.workflow, config.dataset, threads);

    match args.workflow.as_str() {
        "moralize" => {
            let dag = load_graph(config, true)?;
            let started = Instant::now();
            let moral = moralize_with(&dag, threads)?;
            println!("== moralization time: {:.6} sec", started.elapsed().as_secs_f64());
            println!("== {} vertices  {} edges", moral.num_vertices(), moral.num_edges());
            if args.output {
                print_degrees(&moral);
            }
        }
        "update" => {
            let graph = load_graph(config, false)?;
            let path = config.id_batch();
            let ids = require_id_batch(&path, config.delete)
                .with_context(|| format!("reading {}", path.display()))?;

            let started = Instant::now();
            let report = evict(&graph, &ids, threads)?;
            println!("== eviction time: {:.6} sec", started.elapsed().as_secs_f64());
            println!(
                "== deleted {}  missing {}  remaining {} vertices  {} edges",
                report.deleted,
                report.missing,
                graph.num_vertices(),
                graph.num_edges()
            );
            if args.output {
                print_degrees(&graph);
            }
        }
        "add" => {
            let started = Instant::now();
            let graph = generate::random_graph(config.vertices, config.edges, config.seed);
            println!("== construction time: {:.6} sec", started.elapsed().as_secs_f64());
            println!("== {} vertices  {} edges", graph.num_vertices(), graph.num_edges());
            if args.output {
                print_degrees(&graph);
            }
        }
        "traverse" => {
            let mut graph = load_graph(config, false)?;
            let started = Instant::now();
            let (vertices, edges) = graph.renumber(|i| i, |i| i);
            println!("== traversal time: {:.6} sec", started.elapsed().as_secs_f64());
            println!("== visited {} vertices  {} edges", vertices, edges);
        }
        "csr-export" => {
            let graph = load_graph(config, false)?;
            let csr = export_csr(&graph);
            csr.write_files(config.vertex_csr(), config.edge_csr())?;
            println!(
                "== wrote {} and {}",
                config.dataset.join(storage::VERTEX_CSR).display(),
                config.dataset.join(storage::EDGE_CSR).display()
            );
        }
        other => bail!("unknown workflow {:?}", other),
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("[topomorph-bench] {:#}", e);
            eprintln!();
            usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("[topomorph-bench] Error: {:#}", e);
        std::process::exit(1);
    }
}
