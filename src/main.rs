/*!
 * Skyhaul CLI - bulk transfer for object storage
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use skyhaul::{
    config as env_config,
    core::DEFAULT_BATCH_SIZE,
    logging::init_logging,
    stats::{format_bytes, format_duration},
    CancelFlag, HaulError, JobSpec, ObjectStore, Operation, ProgressSink, ProgressSnapshot,
    Result, RetryPolicy, S3Client, S3Config, S3Uri, TransferOrchestrator, TransferReport,
};

#[derive(Parser)]
#[command(name = "skyhaul")]
#[command(version, about = "Concurrent bulk upload, download, and deletion for S3", long_about = None)]
struct Cli {
    /// Source: a local path, or s3://bucket/prefix for downloads
    #[arg(short = 's', long = "source", value_name = "PATH")]
    source: Option<String>,

    /// Destination: s3://bucket/prefix for uploads, or a local directory
    #[arg(short = 'd', long = "dest", value_name = "PATH")]
    destination: Option<String>,

    /// Delete all objects under the given s3://bucket/prefix
    #[arg(long, value_name = "URI", conflicts_with_all = ["source", "destination"])]
    delete: Option<String>,

    /// List objects under the given s3://bucket/prefix
    #[arg(long, value_name = "URI", conflicts_with_all = ["source", "destination", "delete"])]
    list: Option<String>,

    /// Stay at the top level instead of recursing into subdirectories or
    /// nested prefixes
    #[arg(long)]
    no_recursive: bool,

    /// Glob filter on file names, e.g. '*.png'
    #[arg(long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Enumerate and report without transferring anything
    #[arg(long)]
    dry_run: bool,

    /// Replace local files that already exist on download
    #[arg(long)]
    overwrite: bool,

    /// Concurrent workers (default: auto)
    #[arg(short = 'w', long, value_name = "N")]
    workers: Option<usize>,

    /// Entries per scheduling batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "N")]
    batch_size: usize,

    /// AWS region (falls back to the SDK's provider chain)
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Custom endpoint URL, e.g. for MinIO
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Maximum pooled connections
    #[arg(long, default_value_t = skyhaul::s3::DEFAULT_POOL_SIZE, value_name = "N")]
    pool_size: usize,

    /// Attempts per operation, including the first
    #[arg(long, default_value_t = skyhaul::core::DEFAULT_MAX_ATTEMPTS, value_name = "N")]
    retry_attempts: u32,

    /// Base delay before the first retry, in milliseconds
    #[arg(long, default_value_t = 500, value_name = "MS")]
    retry_delay_ms: u64,

    /// Check bucket access and exit
    #[arg(long)]
    validate: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Renders engine progress as an indicatif bar
struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressSink for BarSink {
    fn on_resolved(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn on_completed(&self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.completed);
        if snapshot.failed > 0 {
            self.bar.set_message(format!("{} failed", snapshot.failed));
        }
    }
}

#[tokio::main]
async fn main() {
    // .env is optional; flags and real env vars always win
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }

    match run(cli).await {
        Ok(success) => std::process::exit(if success { 0 } else { 1 }),
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let (operation, uri, local_path) = plan_operation(&cli)?;

    let mut config = S3Config::new(&uri.bucket);
    config.region = cli.region.clone();
    config.endpoint = cli.endpoint.clone();
    config.pool_size = cli.pool_size;

    let client = S3Client::new(config)
        .await
        .with_context(|| format!("cannot connect to bucket '{}'", uri.bucket))?;

    if cli.validate {
        client
            .verify_connection()
            .await
            .with_context(|| format!("bucket '{}' is not reachable", uri.bucket))?;
        println!(
            "{} bucket '{}' is reachable",
            style("ok:").green().bold(),
            uri.bucket
        );
        return Ok(true);
    }

    let pool_capacity = client.pool().capacity();
    let store: Arc<dyn ObjectStore> = Arc::new(client);

    let mut spec = JobSpec::new(operation, uri.prefix.clone());
    spec.local_path = local_path;
    spec.recursive = !cli.no_recursive;
    spec.filter = cli.filter.clone();
    spec.dry_run = cli.dry_run;
    spec.overwrite = cli.overwrite;
    spec.workers = cli.workers;
    spec.batch_size = cli.batch_size;

    let retry = RetryPolicy {
        max_attempts: cli.retry_attempts.max(1),
        base_delay: Duration::from_millis(cli.retry_delay_ms),
        ..RetryPolicy::default()
    };

    let sink = Arc::new(BarSink::new(cli.no_progress || operation == Operation::List));
    let mut orchestrator = TransferOrchestrator::new(store, spec, pool_capacity)
        .with_retry(retry)
        .with_sink(Arc::clone(&sink) as Arc<dyn ProgressSink>);

    spawn_cancel_handler(orchestrator.cancel_flag());

    let report = orchestrator.run().await?;
    sink.bar.finish_and_clear();

    print_summary(&report, cli.dry_run);
    Ok(report.all_succeeded())
}

/// Decide the operation, the bucket/prefix, and the local side from the
/// flags, falling back to the environment for missing pieces
fn plan_operation(cli: &Cli) -> Result<(Operation, S3Uri, Option<PathBuf>)> {
    if cli.validate {
        // Any s3:// argument names the bucket to check
        let uri = [&cli.destination, &cli.source, &cli.delete, &cli.list]
            .into_iter()
            .flatten()
            .find(|s| S3Uri::is_s3_uri(s))
            .ok_or_else(|| {
                HaulError::Config("--validate needs an s3://bucket argument".to_string())
            })?;
        return Ok((Operation::List, parse_uri(uri)?, None));
    }

    if let Some(uri) = &cli.list {
        return Ok((Operation::List, parse_uri(uri)?, None));
    }

    if let Some(uri) = &cli.delete {
        return Ok((Operation::Delete, parse_uri(uri)?, None));
    }

    let source = cli
        .source
        .clone()
        .or_else(|| env_config::default_source_dir().map(|p| p.display().to_string()));
    let destination = cli
        .destination
        .clone()
        .or_else(env_config::default_upload_uri);

    match (source, destination) {
        (Some(src), Some(dest)) if S3Uri::is_s3_uri(&src) && S3Uri::is_s3_uri(&dest) => {
            Err(HaulError::Config(
                "store-to-store transfer is not supported; one side must be local".to_string(),
            ))
        }
        (Some(src), dest) if S3Uri::is_s3_uri(&src) => {
            let local = dest
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((Operation::Download, parse_uri(&src)?, Some(local)))
        }
        (Some(src), Some(dest)) if S3Uri::is_s3_uri(&dest) => {
            Ok((Operation::Upload, parse_uri(&dest)?, Some(PathBuf::from(src))))
        }
        (Some(_), Some(_)) => Err(HaulError::Config(
            "one side must be an s3://bucket/prefix URI".to_string(),
        )),
        _ => Err(HaulError::Config(
            "nothing to do: give --source/--dest, --delete, or --list \
             (or set SKYHAUL_DATA_DIR and SKYHAUL_UPLOAD_URL)"
                .to_string(),
        )),
    }
}

fn parse_uri(raw: &str) -> Result<S3Uri> {
    S3Uri::parse(raw)
        .ok_or_else(|| HaulError::Config(format!("invalid S3 URI '{}': expected s3://bucket[/prefix]", raw)))
}

fn spawn_cancel_handler(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\n{} finishing in-flight transfers...",
                style("interrupted:").yellow().bold()
            );
            cancel.cancel();
        }
    });
}

fn print_summary(report: &TransferReport, dry_run: bool) {
    if report.operation == Operation::List {
        for object in &report.listing {
            let modified = object
                .last_modified
                .map(|t| {
                    chrono::DateTime::<chrono::Utc>::from(t)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| "-".to_string());
            println!("{:>12}  {:>19}  {}", format_bytes(object.size), modified, object.key);
        }
        println!(
            "\n{} objects, {}",
            report.listing.len(),
            format_bytes(report.total_bytes)
        );
        return;
    }

    let label = if dry_run {
        format!("{} (dry run)", report.operation)
    } else {
        report.operation.to_string()
    };

    println!("\n{}", style(format!("=== {} summary ===", label)).bold());
    println!("  total:      {}", report.total_entries);
    println!("  succeeded:  {}", style(report.succeeded).green());
    if report.retried > 0 {
        println!("  retried:    {}", style(report.retried).yellow());
    }
    if report.skipped > 0 {
        println!("  skipped:    {}", report.skipped);
    }
    if report.failed > 0 {
        println!("  failed:     {}", style(report.failed).red());
    }
    if report.cancelled > 0 {
        println!("  cancelled:  {}", style(report.cancelled).yellow());
    }
    println!("  data:       {}", format_bytes(report.total_bytes));
    println!("  duration:   {}", format_duration(report.duration));
    println!(
        "  throughput: {}/s, {:.1} files/s",
        format_bytes(report.bytes_per_sec() as u64),
        report.files_per_sec()
    );

    if !report.failed_entries.is_empty() {
        println!("\n{}", style("failures:").red().bold());
        for (entry, reason) in report.failed_entries.iter().take(10) {
            println!("  {} - {}", entry.source_key, reason);
        }
        if report.failed_entries.len() > 10 {
            println!("  ... and {} more", report.failed_entries.len() - 10);
        }
    }
}
