//! roffs binary
//!
//! Mounts a read-only view of SOURCE at MOUNTPOINT. Each directory shows
//! only the entries selected by at least one rule.
//!
//! ## Usage
//!
//! ```bash
//! # Rules from a file, one pipeline per line
//! roffs -c rules.conf /var/log /mnt/logs
//!
//! # Inline rules (repeatable)
//! roffs -r 'filter isDir' -r 'filter ext == ".log" | sort size desc | limit 5' /var/log /mnt/logs
//!
//! # More detail
//! RUST_LOG=roffs_kernel=debug roffs -c rules.conf /var/log /mnt/logs
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use roffs_fuse::{MountConfig, RoffsFs, mount};
use roffs_kernel::{LocalBackend, RhaiCompiler, RuleSet, RuleSource, ViewFs};

/// Read-only, rule-filtered FUSE view of a directory.
#[derive(Parser, Debug)]
#[command(name = "roffs", version)]
#[command(about = "Mount a read-only, rule-filtered view of a directory")]
#[command(group(ArgGroup::new("rule_source").required(true).multiple(true)))]
struct Args {
    /// Directory to expose
    source: PathBuf,

    /// Where to mount the view
    mountpoint: PathBuf,

    /// Rule file: one pipeline per line, `#` comments
    #[arg(short, long, group = "rule_source")]
    config: Option<PathBuf>,

    /// Inline rule pipeline; overrides --config (repeatable)
    #[arg(short, long = "rules", value_name = "PIPELINE", group = "rule_source")]
    rules: Vec<String>,

    /// Let other users access the mount
    #[arg(long)]
    allow_other: bool,

    /// Unmount automatically when roffs exits
    #[arg(long)]
    auto_unmount: bool,

    /// Kernel attribute/entry cache lifetime, in seconds
    #[arg(long, default_value_t = 1)]
    ttl: u64,

    /// Filesystem name shown in the mount table
    #[arg(long, default_value = "roffs")]
    fsname: String,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let source = RuleSource::resolve(args.config, args.rules).context("no rules given")?;
    let rules = RuleSet::load(&source, &RhaiCompiler::new()).context("loading rules")?;
    tracing::info!(rules = rules.len(), "rules compiled");

    let backend = LocalBackend::open(&args.source)
        .with_context(|| format!("opening source {}", args.source.display()))?;
    let view = Arc::new(ViewFs::new(backend, rules));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("roffs-io")
        .enable_all()
        .build()
        .context("starting runtime")?;

    let config = MountConfig {
        fsname: args.fsname,
        allow_other: args.allow_other,
        auto_unmount: args.auto_unmount,
        ttl: Duration::from_secs(args.ttl),
    };
    let fs = RoffsFs::new(view, runtime.handle().clone(), config.ttl);

    tracing::info!(
        source = %args.source.display(),
        mountpoint = %args.mountpoint.display(),
        "serving"
    );
    mount(fs, &args.mountpoint, &config)
        .with_context(|| format!("mounting at {}", args.mountpoint.display()))?;

    tracing::info!("roffs shutting down");
    Ok(())
}
