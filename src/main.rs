mod api;
mod report;
mod server;
mod storage;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use postlens::clustering::PostingTimeClusterer;
use postlens::config::AppConfig;
use postlens::engagement::EngagementPredictor;
use postlens::models::ModelStore;
use postlens::performance::PerformanceRanker;
use postlens::{parse_records, PostRecord};

#[derive(Parser)]
#[command(name = "postlens", about = "Instagram post analytics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the analysis HTTP service.
    Serve(ServeArgs),
    /// Run one analysis over a local JSON file of post records.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8000)]
    port: u16,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    /// JSON array of post records; stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Task::Recommend)]
    task: Task,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Task {
    Recommend,
    TopPosts,
    PostingTime,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => server::serve(args).await,
        Command::Analyze(args) => run_analyze(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let (config, _) = AppConfig::load(args.config)?;
    let models = ModelStore::load(&config.models);
    let records = read_records(args.input.as_deref())?;
    if records.is_empty() {
        return Err("no post records in input".to_string());
    }

    match args.task {
        Task::Recommend => {
            let recommendations = EngagementPredictor::new(&models.engagement, &config.analysis)
                .recommend(&records)
                .map_err(|err| err.to_string())?;
            println!("Recommended post types ({} records analyzed):", records.len());
            for entry in recommendations {
                println!(
                    "  {}: score {} (avg likes {}, avg comments {})",
                    entry.post_type,
                    entry.engagement_score,
                    entry.expected_average_likes,
                    entry.expected_average_comments
                );
            }
        }
        Task::TopPosts => {
            let ranked = PerformanceRanker::new(&models.performance, &config.analysis)
                .rank(&records)
                .map_err(|err| err.to_string())?;
            println!("Top {} posts:", ranked.len());
            for (rank, post) in ranked.iter().enumerate() {
                println!(
                    "  #{} {} score {:.2} (likes {:.2} | comments {:.2} | reach {})",
                    rank + 1,
                    post.record.id,
                    post.performance_score,
                    post.predicted_likes,
                    post.predicted_comments,
                    post.predicted_reach
                        .map(|reach| format!("{:.2}", reach))
                        .unwrap_or_else(|| "n/a".to_string())
                );
            }
        }
        Task::PostingTime => {
            let outcome = PostingTimeClusterer::new(&config.clustering)
                .analyze(&records)
                .map_err(|err| err.to_string())?;
            if config.export.enabled {
                let path = report::write_csv(&outcome.table, &config.export.dir)?;
                println!("Cluster table exported to {}", path.display());
            }
            println!("Best peak posting times:");
            for peak in outcome.peak_times {
                println!("  cluster {}: {}", peak.cluster, peak.peak_hours);
            }
        }
    }

    Ok(())
}

fn read_records(input: Option<&Path>) -> Result<Vec<PostRecord>, String> {
    let payload = match input {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| format!("failed reading stdin: {}", err))?;
            buffer
        }
    };
    parse_records(&payload).map_err(|err| err.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
