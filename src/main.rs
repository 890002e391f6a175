use anyhow::Result;
use clap::{Parser, Subcommand};
use sigwatch::config::Config;
use sigwatch::logger::EventLog;
use sigwatch::monitor::Monitor;
use sigwatch::{scanner, signatures};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sigwatch", version)]
#[command(about = "Signature-based malware detection with real-time directory monitoring")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sigwatch.toml")]
    config: PathBuf,

    /// Path to the JSON signature database (overrides config)
    #[arg(short, long)]
    signatures: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output diagnostics as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a directory tree and alert on known-malicious files in real time
    Monitor {
        /// Folder to monitor
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
    /// Recursively scan a folder once and report signature matches
    Scan {
        /// Folder to scan
        #[arg(short, long)]
        path: PathBuf,
    },
    /// Hash a file and add it to the signature database
    AddSignature {
        /// File to fingerprint
        #[arg(short, long)]
        file: PathBuf,
        /// Malware family name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        subscriber.json().init();
    } else {
        subscriber.with_target(false).init();
    }

    let mut config = Config::load_or_default(&args.config);
    if let Some(signatures_file) = args.signatures {
        config.general.signatures_file = signatures_file;
    }

    match args.command {
        Command::Monitor { path } => run_monitor(&path, &config).await,
        Command::Scan { path } => run_scan(&path, &config),
        Command::AddSignature { file, name } => {
            let digest = signatures::add_signature(&config.general.signatures_file, &file, &name)?;
            println!("Added signature: {} {}", name, digest);
            Ok(())
        }
    }
}

async fn run_monitor(path: &std::path::Path, config: &Config) -> Result<()> {
    let (alert_tx, mut alert_rx) = mpsc::channel(256);
    let monitor = Monitor::start(path, config, alert_tx)?;

    let alert_printer = tokio::spawn(async move {
        while let Some(alert) = alert_rx.recv().await {
            println!("{}", alert.log_line());
        }
    });

    info!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    monitor.shutdown().await;
    let _ = alert_printer.await;
    Ok(())
}

fn run_scan(path: &std::path::Path, config: &Config) -> Result<()> {
    let store = sigwatch::SignatureStore::load(&config.general.signatures_file)?;
    info!("Loaded {} signatures", store.len());

    let log = EventLog::open(&config.general.log_dir, &config.scanner.log_file)?;
    let outcome = scanner::scan_folder(path, &store, &log);

    println!(
        "Scanned {} files, {} infected",
        outcome.scanned,
        outcome.infected.len()
    );
    for infection in &outcome.infected {
        println!(
            "[ALERT] Infected file: {} [{}]",
            infection.path.display(),
            infection.signature_name
        );
    }
    Ok(())
}
