//! memnet CLI: build memory graphs and query them.
//!
//! Usage:
//!   memnet status
//!   memnet embed [--check]
//!   memnet build --method knn --k 12
//!   memnet sweep --k 5,8,12,16
//!   memnet query --query "..." [--view knn__k12]... [--fusion union]
//!   memnet evaluate --scenarios scenarios.yaml
//!   memnet inject-hubs [--hub-k 100] [--dry-run]

use clap::{Parser, Subcommand};
use memnet::{
    format_for_prompt, BuildMethod, FusionKind, JsonFileStore, MemnetConfig, MemoryEngine, OpenStore, QueryRequest,
    Scenario, SimilaritySource, ViewSpec,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memnet", version, about = "Memory graph retrieval by spreading activation")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding nodes, embeddings and networks
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show node, embedding and view counts
    Status,
    /// Re-embed all nodes
    Embed {
        /// Only report whether embeddings are aligned with nodes
        #[arg(long)]
        check: bool,
    },
    /// Build one graph view
    Build {
        /// knn, cooc or fusion
        #[arg(long, default_value = "knn")]
        method: BuildMethod,
        #[arg(long, default_value_t = 12)]
        k: usize,
        /// k-NN share for fusion views
        #[arg(long)]
        alpha: Option<f64>,
        /// embedding or tfidf
        #[arg(long)]
        similarity: Option<SimilaritySource>,
    },
    /// Build knn, cooc and fusion views for several k and print a summary
    Sweep {
        #[arg(long, value_delimiter = ',')]
        k: Vec<usize>,
        #[arg(long)]
        similarity: Option<SimilaritySource>,
    },
    /// Print the stored topology stats of a view
    Stats {
        /// View name, e.g. knn__k12 or knn:12
        view: String,
    },
    /// Retrieve memories for a query
    Query {
        /// Free-text query
        #[arg(long, conflicts_with = "keyword", required_unless_present = "keyword")]
        query: Option<String>,
        /// Keyword seed (repeatable)
        #[arg(long)]
        keyword: Vec<String>,
        /// View to activate (repeatable)
        #[arg(long)]
        view: Vec<String>,
        /// union, intersection_boost, weighted or mean
        #[arg(long)]
        fusion: Option<FusionKind>,
        #[arg(long)]
        seeds: Option<usize>,
        #[arg(long)]
        hops: Option<usize>,
        #[arg(long)]
        decay: Option<f64>,
        #[arg(long)]
        top: Option<usize>,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
        /// Print prompt-ready lines
        #[arg(long, conflicts_with = "json")]
        prompt: bool,
    },
    /// Run canned scenarios over the swept views, fusions and baselines
    Evaluate {
        /// YAML list of scenarios (id, input, seed_keywords)
        #[arg(long)]
        scenarios: PathBuf,
        /// Print the contexts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the identity hubs on the primary view
    InjectHubs {
        #[arg(long)]
        hub_k: Option<usize>,
        /// Report without saving
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memnet=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_engine(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<MemoryEngine, String> {
    let mut config =
        MemnetConfig::load_or_default(config_path.as_deref()).map_err(|e| format!("Failed to load config: {}", e))?;
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    let root = config.resolved_data_dir();
    let store = JsonFileStore::open(&root).map_err(|e| format!("Failed to open {}: {}", root.display(), e))?;

    let embedder = match config.embedding.embedder() {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "embedding provider unavailable");
            None
        }
    };
    let engine = MemoryEngine::new(Arc::new(store), config);
    Ok(match embedder {
        Some(e) => engine.with_embedder(Arc::from(e)),
        None => engine,
    })
}

fn cmd_status(engine: &MemoryEngine) -> i32 {
    match engine.embedding_status() {
        Ok(status) => {
            println!("nodes:      {}", status.nodes);
            println!("embeddings: {}", status.embeddings);
            if let Some(dim) = status.dimension {
                println!("dimension:  {}", dim);
            }
            println!("aligned:    {}", if status.aligned() { "yes" } else { "NO" });
            println!("views:      {}", if status.views.is_empty() { "-".to_string() } else { status.views.join(", ") });
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_embed(engine: &MemoryEngine, check: bool) -> i32 {
    if check {
        return match engine.embedding_status() {
            Ok(status) if status.aligned() => {
                println!("OK: {} nodes, {} embeddings", status.nodes, status.embeddings);
                0
            }
            Ok(status) => {
                println!("MISMATCH: {} nodes, {} embeddings", status.nodes, status.embeddings);
                1
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }
    match engine.rebuild_embeddings().await {
        Ok(n) => {
            println!("Embedded {} nodes", n);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_build(engine: &MemoryEngine, spec: ViewSpec, similarity: SimilaritySource) -> i32 {
    match engine.build_view(&spec, similarity) {
        Ok(stats) => {
            println!("{}", stats.summary_line());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_sweep(engine: &MemoryEngine, ks: &[usize], similarity: SimilaritySource) -> i32 {
    match engine.sweep(ks, similarity) {
        Ok(summary) => {
            for stats in &summary {
                println!("{}", stats.summary_line());
            }
            let passing: Vec<String> = summary
                .iter()
                .filter(|s| s.gate_pass)
                .filter_map(|s| s.view.map(|v| v.name()))
                .collect();
            println!("{} of {} views pass the gate: {}", passing.len(), summary.len(), passing.join(", "));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_stats(engine: &MemoryEngine, view: &str) -> i32 {
    match engine.view_stats(view) {
        Ok(stats) => match serde_json::to_string_pretty(&stats) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_query(engine: &MemoryEngine, request: QueryRequest, json: bool, prompt: bool) -> i32 {
    let response = match engine.query(&request).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        return match serde_json::to_string_pretty(&response) {
            Ok(out) => {
                println!("{}", out);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }
    if prompt {
        println!("{}", format_for_prompt(&response.results));
        return 0;
    }

    println!(
        "seeds ({}): {}",
        response.seed_source,
        response
            .seeds
            .iter()
            .map(|(id, s)| format!("{}={:.3}", id, s))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("views: {} | fusion: {}", response.views.join(", "), response.fusion);
    let gates: Vec<String> = response
        .gates
        .iter()
        .map(|g| {
            let verdict = match g.gate_pass {
                Some(true) => "pass",
                Some(false) => "FAIL",
                None => "unknown",
            };
            format!("{}={}", g.view, verdict)
        })
        .collect();
    println!("gate: {}", gates.join(" "));
    if response.results.is_empty() {
        println!("No results.");
        return 0;
    }
    println!("{:<4} {:<8} {:>7}  {:<9}  CONTENT", "#", "ID", "SCORE", "TYPE");
    for (i, r) in response.results.iter().enumerate() {
        println!("{:<4} {:<8} {:>7.4}  {:<9}  {}", i + 1, r.id.as_str(), r.score, r.node_type.as_str(), r.content);
    }
    0
}

fn cmd_evaluate(engine: &MemoryEngine, scenarios: &std::path::Path, json: bool) -> i32 {
    let scenarios = match Scenario::load_all(scenarios) {
        Ok(s) if s.is_empty() => {
            eprintln!("Error: no scenarios in {}", scenarios.display());
            return 1;
        }
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let evaluation = match engine.evaluate(&scenarios) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if json {
        return match serde_json::to_string_pretty(&evaluation.contexts) {
            Ok(out) => {
                println!("{}", out);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }
    print!("{}", evaluation.render());
    0
}

async fn cmd_inject_hubs(engine: &MemoryEngine, hub_k: Option<usize>, dry_run: bool) -> i32 {
    match engine.inject_hubs(hub_k, dry_run).await {
        Ok(injection) => {
            print!("{}", injection.report.render());
            if dry_run {
                println!("[dry run] nothing saved");
            } else {
                println!(
                    "Saved {} nodes, {} edges ({} hubs, {} replaced)",
                    injection.graph.node_count(),
                    injection.graph.edge_count(),
                    injection.hub_ids.len(),
                    injection.removed
                );
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let engine = match open_engine(cli.config, cli.data_dir) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    let default_similarity = engine.config().graph.similarity;

    let code = match cli.command {
        Commands::Status => cmd_status(&engine),
        Commands::Embed { check } => runtime.block_on(cmd_embed(&engine, check)),
        Commands::Build {
            method,
            k,
            alpha,
            similarity,
        } => {
            let spec = match method {
                BuildMethod::Fusion => ViewSpec::fusion(k, alpha.unwrap_or(engine.config().graph.alpha)),
                m => ViewSpec::new(m, k),
            };
            cmd_build(&engine, spec, similarity.unwrap_or(default_similarity))
        }
        Commands::Sweep { k, similarity } => {
            let ks = if k.is_empty() { engine.config().graph.sweep_k.clone() } else { k };
            cmd_sweep(&engine, &ks, similarity.unwrap_or(default_similarity))
        }
        Commands::Stats { view } => cmd_stats(&engine, &view),
        Commands::Query {
            query,
            keyword,
            view,
            fusion,
            seeds,
            hops,
            decay,
            top,
            json,
            prompt,
        } => {
            let request = QueryRequest {
                text: query,
                keywords: keyword,
                views: view,
                seeds,
                hops,
                decay,
                top_n: top,
                fusion,
            };
            runtime.block_on(cmd_query(&engine, request, json, prompt))
        }
        Commands::Evaluate { scenarios, json } => cmd_evaluate(&engine, &scenarios, json),
        Commands::InjectHubs { hub_k, dry_run } => runtime.block_on(cmd_inject_hubs(&engine, hub_k, dry_run)),
    };
    std::process::exit(code);
}
