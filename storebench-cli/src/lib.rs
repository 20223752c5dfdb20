#![warn(missing_docs)]
//! StoreBench CLI Library
//!
//! Command-line front end for StoreBench instances. `run` drives a full
//! benchmark run from this process, `serve` keeps an instance online so a
//! primary (or an operator using `trigger`) can drive it over TCP.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     storebench_cli::run()
//! }
//! ```

mod config;
mod instance;
mod isolation;
mod orchestrator;
mod planner;
mod protocol;
mod reporting;

pub use config::*;
pub use instance::Instance;
pub use isolation::{INSTANCE_PREFIX, InstanceRestartList, instance_object_id};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, OrchestratorError, Phase, RemoteMonitoring, RunState,
    WorkloadOutcome,
};
pub use planner::{ExecutionPlan, build_plan};
pub use protocol::{Dispatcher, Role};
pub use reporting::{build_report, build_report_meta, collect_system_info, format_human_output};

use clap::{Parser, Subcommand};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use storebench_core::{MemoryStore, StateStore, SysinfoProbe, WorkloadRegistry};
use storebench_ipc::{Command, Mailbox, Messenger, TcpMessenger, serve_tcp};
use storebench_report::{OutputFormat, generate_json_report};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// StoreBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "storebench")]
#[command(author, version, about = "StoreBench - state and object store benchmarking")]
pub struct Cli {
    /// Optional subcommand; defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: discover storebench.toml upwards)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: human, json (default from configuration)
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Write the formatted output to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered workloads
    List,
    /// Run workloads in this process (default)
    Run(RunArgs),
    /// Keep an instance online and handle protocol messages
    Serve,
    /// Ask a running primary to start a run
    Trigger {
        /// Instance id of the primary, resolved through `[peers]`
        target: String,
        /// Run only this workload instead of the full suite
        #[arg(long)]
        workload: Option<String>,
    },
    /// Print a default storebench.toml
    Init,
}

/// Overrides for a local run
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Run workloads whose id matches this regex
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Skip workloads whose id matches this regex
    #[arg(long)]
    pub exclude: Option<String>,

    /// Operations per epoch
    #[arg(long, short = 'n')]
    pub iterations: Option<u64>,

    /// Timed repetitions per workload
    #[arg(long)]
    pub epochs: Option<u32>,

    /// Pause between epochs (e.g. "500ms", "30s")
    #[arg(long)]
    pub cooldown: Option<String>,

    /// Disable other enabled instances while running
    #[arg(long)]
    pub isolated: bool,

    /// Print the plan without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the StoreBench CLI with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the StoreBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("storebench=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("storebench=info")
            .init();
    }

    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Some(Commands::List) => {
            list_workloads(&config);
            Ok(())
        }
        Some(Commands::Init) => {
            print!("{}", StoreBenchConfig::default_toml());
            Ok(())
        }
        Some(Commands::Run(args)) => run_benchmarks(&cli, config, args),
        Some(Commands::Serve) => block_on(serve(config)),
        Some(Commands::Trigger { target, workload }) => {
            block_on(trigger(&config, target, workload.clone()))
        }
        None => run_benchmarks(&cli, config, &RunArgs::default()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StoreBenchConfig> {
    let config = match path {
        Some(path) => StoreBenchConfig::load(path)?,
        None => StoreBenchConfig::discover()?.unwrap_or_default(),
    };
    config.validate()?;
    Ok(config)
}

/// Benchmark instances run on a single-threaded scheduler so lag readings
/// reflect everything the instance does.
fn block_on<F: std::future::Future<Output = anyhow::Result<()>>>(
    future: F,
) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

fn list_workloads(config: &StoreBenchConfig) {
    let registry = WorkloadRegistry::builtin();
    let has_secondaries = !config.benchmark.secondaries.is_empty();

    println!("StoreBench Workloads:");
    for entry in registry.iter() {
        let note = if entry.distributed && !has_secondaries {
            " [distributed, no secondaries configured]"
        } else if entry.distributed {
            " [distributed]"
        } else {
            ""
        };
        println!("├── {}{} - {}", entry.id, note, entry.description);
    }
    println!("{} workloads registered.", registry.len());
}

fn apply_overrides(config: &mut StoreBenchConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(iterations) = args.iterations {
        config.benchmark.iterations = iterations;
    }
    if let Some(epochs) = args.epochs {
        config.benchmark.epochs = epochs;
    }
    if let Some(cooldown) = &args.cooldown {
        config.benchmark.cooldown = cooldown.clone();
    }
    if args.isolated {
        config.benchmark.isolated_run = true;
    }
    config.validate()
}

fn run_benchmarks(
    cli: &Cli,
    mut config: StoreBenchConfig,
    args: &RunArgs,
) -> anyhow::Result<()> {
    if config.benchmark.secondary_mode {
        anyhow::bail!("secondary instances are driven by their primary; use `storebench serve`");
    }
    apply_overrides(&mut config, args)?;

    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(&config.output.format)
        .parse()
        .map_err(anyhow::Error::msg)?;
    let filter = Regex::new(&args.filter)?;
    let exclude = args.exclude.as_deref().map(Regex::new).transpose()?;

    let registry = WorkloadRegistry::builtin();
    let plan = build_plan(
        &registry,
        Some(&filter),
        exclude.as_ref(),
        !config.benchmark.secondaries.is_empty(),
    );

    if args.dry_run {
        println!("StoreBench Plan:");
        for id in &plan.workloads {
            println!("├── {}", id);
        }
        for id in &plan.skipped {
            println!("├── {} (skipped: no secondaries configured)", id);
        }
        return Ok(());
    }
    if plan.workloads.is_empty() {
        println!("No workloads found.");
        return Ok(());
    }

    println!(
        "Running {} workloads, {} iterations x {} epochs...\n",
        plan.workloads.len(),
        config.benchmark.iterations,
        config.benchmark.epochs
    );

    let report = block_on_report(&config, registry, &plan)?;

    let output_dir = PathBuf::from(&config.output.directory);
    std::fs::create_dir_all(&output_dir)?;
    let report_path = output_dir.join(format!(
        "{}-{}.json",
        config.benchmark.namespace,
        report.meta.timestamp.format("%Y%m%dT%H%M%S")
    ));
    std::fs::write(&report_path, generate_json_report(&report)?)?;
    info!(path = %report_path.display(), "report saved");

    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };
    if let Some(path) = &cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if report.summary.failed > 0 {
        eprintln!("\n{} workload(s) failed", report.summary.failed);
        std::process::exit(1);
    }
    Ok(())
}

fn block_on_report(
    config: &StoreBenchConfig,
    registry: WorkloadRegistry,
    plan: &ExecutionPlan,
) -> anyhow::Result<storebench_report::Report> {
    let mut report = None;
    block_on(async {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let messenger: Arc<dyn Messenger> = Arc::new(TcpMessenger::new(
            config.benchmark.namespace.clone(),
            config.peer_addresses()?,
        ));
        let mut instance = Instance::new(
            config,
            registry,
            store,
            messenger,
            Arc::new(SysinfoProbe::new()),
        )?;
        // Secondaries report their measurements back through the listener.
        if let Some(addr) = config.listen_address()? {
            let mailbox = listen(addr, &mut instance).await?;
            instance.attach(mailbox);
        } else if !config.benchmark.secondaries.is_empty() {
            warn!("secondaries configured without [listen] address; their measurements will be lost");
        }

        let orchestrator = instance.orchestrator().clone();
        let started = Instant::now();
        let mut outcomes = Vec::new();
        let result = orchestrator
            .run_collecting(&plan.workloads, &mut outcomes)
            .await;
        let total_duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        report = Some(build_report(
            build_report_meta(orchestrator.config()),
            plan,
            &outcomes,
            result.as_ref().err(),
            total_duration_ms,
        ));
        instance.unload(|| info!("instance unloaded")).await;
        Ok(())
    })?;
    report.ok_or_else(|| anyhow::anyhow!("run produced no report"))
}

/// Bind `addr` and feed received messages into a new mailbox
async fn listen(addr: std::net::SocketAddr, instance: &mut Instance) -> anyhow::Result<Mailbox> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening for protocol messages");
    let (inbox, mailbox) = Mailbox::channel();
    instance.track(tokio::spawn(async move {
        if let Err(e) = serve_tcp(listener, inbox).await {
            error!(error = %e, "listener stopped");
        }
    }));
    Ok(mailbox)
}

async fn serve(config: StoreBenchConfig) -> anyhow::Result<()> {
    let addr = config
        .listen_address()?
        .ok_or_else(|| anyhow::anyhow!("`serve` needs a [listen] address"))?;
    let messenger: Arc<dyn Messenger> = Arc::new(TcpMessenger::new(
        config.benchmark.namespace.clone(),
        config.peer_addresses()?,
    ));
    let mut instance = Instance::new(
        &config,
        WorkloadRegistry::builtin(),
        Arc::new(MemoryStore::new()),
        messenger,
        Arc::new(SysinfoProbe::new()),
    )?;
    let mailbox = listen(addr, &mut instance).await?;
    instance.attach(mailbox);

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    instance.unload(|| info!("instance unloaded")).await;
    Ok(())
}

async fn trigger(
    config: &StoreBenchConfig,
    target: &str,
    workload: Option<String>,
) -> anyhow::Result<()> {
    let messenger = TcpMessenger::new(config.benchmark.namespace.clone(), config.peer_addresses()?);
    let command = match workload {
        Some(id) => Command::Workload(id),
        None => Command::Test,
    };
    let name = command.name().to_string();
    let ack = messenger.send(target, command).await?;
    match ack.error {
        Some(message) => anyhow::bail!("{} rejected {}: {}", target, name, message),
        None => {
            println!("{} accepted {}", target, name);
            Ok(())
        }
    }
}
