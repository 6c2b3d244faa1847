use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::exit;
use tracing::info;
use treesim::config::{OutputFormat, RunConfig};
use treesim::join::lookup::LookupIndex;
use treesim::join::{JoinDriver, JoinResultElement};
use treesim::parsing::{self, LabelDict};
use treesim::validation;

/// Tree similarity join/lookup utility.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Dataset file of trees in bracket notation
    #[arg(short, long, value_name = "FILE")]
    dataset_path: PathBuf,

    /// Optional TOML file of CLI defaults (threshold, algo, output format)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How to print join/lookup results; overrides the config file
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Text => OutputFormat::Text,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a similarity self-join at the given distance threshold.
    Join {
        /// Falls back to the config file's `default_threshold`, then 1.0
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Falls back to the config file's `default_algo`, then naive
        #[arg(short, long, value_enum)]
        algo: Option<JoinAlgo>,
    },
    /// Print per-tree and collection statistics.
    Stats,
    /// Build a lookup index over the dataset and query it with one tree.
    Lookup {
        /// Bracket-notation tree to query the index with
        #[arg(short, long)]
        query: String,
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Try the LGM upper bound before exact verification
        #[arg(long, default_value_t = false)]
        upper_bound: bool,
    },
    /// Compare a candidates CSV against a ground-truth results CSV.
    Validate {
        /// CSV of `(tree_id_1, tree_id_2)` candidate pairs to check
        #[arg(short, long, value_name = "FILE")]
        candidates: PathBuf,
        /// CSV of `(tree_id_1, tree_id_2, distance)` ground-truth results
        #[arg(short, long, value_name = "FILE")]
        results: PathBuf,
        /// Distance threshold the ground truth was computed at
        #[arg(short, long)]
        threshold: usize,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum JoinAlgo {
    Naive,
    TJoin,
    Guha,
    Tang,
}

impl std::str::FromStr for JoinAlgo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(JoinAlgo::Naive),
            "tjoin" => Ok(JoinAlgo::TJoin),
            "guha" => Ok(JoinAlgo::Guha),
            "tang" => Ok(JoinAlgo::Tang),
            other => Err(format!("unknown join algorithm: {other}")),
        }
    }
}

fn print_join_results(results: &[JoinResultElement], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for r in results {
                println!("  ({}, {}) at distance {}", r.tree_id_1, r.tree_id_2, r.distance);
            }
        }
        OutputFormat::Json => match serde_json::to_string(results) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("failed to serialize results: {e}"),
        },
    }
}

fn main() -> Result<(), clap::Error> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if !cli.dataset_path.exists() || !cli.dataset_path.is_file() {
        eprintln!("This file does not exists or is not a valid file!");
        exit(1);
    }

    let run_config = match &cli.config {
        Some(path) => match RunConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Got unexpected error reading config: {}", e);
                exit(1);
            }
        },
        None => RunConfig::default(),
    };
    let format: OutputFormat = cli
        .format
        .map(OutputFormat::from)
        .or(run_config.output_format)
        .unwrap_or_default();

    let mut label_dict = LabelDict::new();
    let trees = match parsing::parse_dataset(&cli.dataset_path, &mut label_dict) {
        Ok(trees) => trees,
        Err(e) => {
            eprintln!("Got unexpected error: {}", e);
            exit(1);
        }
    };
    info!(count = trees.len(), "parsed dataset");

    match cli.command.unwrap_or(Command::Stats) {
        Command::Stats => {
            let stats: Vec<_> = trees.iter().map(treesim::statistics::gather).collect();
            println!("{}", treesim::statistics::summarize(&stats));
        }
        Command::Join { threshold, algo } => {
            let threshold = threshold.or(run_config.default_threshold).unwrap_or(1.0);
            let algo = algo
                .or_else(|| {
                    run_config
                        .default_algo
                        .as_deref()
                        .and_then(|a| a.parse().ok())
                })
                .unwrap_or(JoinAlgo::Naive);
            let mut driver: Box<dyn JoinDriver> = match algo {
                JoinAlgo::Naive => Box::new(treesim::join::naive::NaiveJoin::default()),
                JoinAlgo::TJoin => Box::new(treesim::join::tjoin::TJoin::default()),
                JoinAlgo::Guha => {
                    let seed = run_config.guha_seed.unwrap_or(0xC0FF_EE42);
                    Box::new(treesim::join::guha::GuhaJoin::new(seed))
                }
                JoinAlgo::Tang => Box::new(treesim::join::tang::TangJoin::default()),
            };
            let result: Vec<JoinResultElement> = driver.execute_join(&trees, &label_dict, threshold);
            println!("{} result pairs at threshold {}", result.len(), threshold);
            print_join_results(&result, format);
        }
        Command::Lookup {
            query,
            threshold,
            upper_bound,
        } => {
            let threshold = threshold.or(run_config.default_threshold).unwrap_or(1.0);
            let query_tree = parsing::parse_single(query, &mut label_dict);
            let mut index = if upper_bound {
                LookupIndex::with_upper_bound()
            } else {
                LookupIndex::new()
            };
            index.build(&trees, &label_dict);
            let result = index.lookup(&query_tree, &label_dict, threshold);
            println!("{} matches within {}", result.len(), threshold);
            match format {
                OutputFormat::Text => {
                    for m in &result {
                        println!("  tree {} at distance {}", m.tree_id, m.distance);
                    }
                }
                OutputFormat::Json => match serde_json::to_string(&result) {
                    Ok(s) => println!("{s}"),
                    Err(e) => eprintln!("failed to serialize results: {e}"),
                },
            }
        }
        Command::Validate {
            candidates,
            results,
            threshold,
        } => match validation::validate(&candidates, &results, threshold) {
            Ok(not_found) if not_found.is_empty() => {
                println!("candidates cover every ground-truth pair");
            }
            Ok(not_found) => {
                eprintln!("{} ground-truth pairs missing from candidates", not_found.len());
                exit(1);
            }
            Err(e) => {
                eprintln!("Got unexpected error: {}", e);
                exit(1);
            }
        },
    }
    Ok(())
}
