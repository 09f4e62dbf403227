//! mytop - live MySQL 8 monitoring console.
//!
//! Connects to a server, shows the session list with statement rates and
//! lets the operator drill into single sessions. `--simple` prints the
//! session list once and exits.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use mytop_core::cancel::CancelToken;
use mytop_core::config::ConsoleConfig;
use mytop_core::error::ConsoleError;
use mytop_core::simple::print_processlist;
use mytop_core::source::check_server;
use mytop_core::source::mysql::{MysqlConfig, MysqlSource};
use mytop_core::tui::Console;

/// Live MySQL 8 monitoring console.
#[derive(Parser)]
#[command(name = "mytop", about = "Live MySQL 8 monitoring console", version)]
struct Args {
    /// Server host name or address.
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server TCP port.
    #[arg(short = 'P', long, default_value_t = 3306)]
    port: u16,

    /// User name. Defaults to the driver's default user.
    #[arg(short, long)]
    user: Option<String>,

    /// Password.
    #[arg(short, long, env = "MYSQL_PWD", hide_env_values = true)]
    password: Option<String>,

    /// Unix socket path; used instead of host and port.
    #[arg(short = 'S', long, value_name = "PATH")]
    socket: Option<String>,

    /// Default schema of the connection.
    #[arg(short = 'D', long)]
    database: Option<String>,

    /// Sampling interval in seconds.
    #[arg(
        long,
        default_value = "1",
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Deadline for drill-down queries and network I/O, in seconds.
    #[arg(
        long,
        default_value = "10",
        value_name = "SECONDS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Print the session list once as plain text and exit.
    #[arg(long)]
    simple: bool,

    /// Write logs to this file. The console owns the terminal, so without
    /// it logs are discarded (except with --simple, which logs to stderr).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber. Default level is INFO.
fn init_logging(args: &Args) -> io::Result<()> {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["mytop", "mytop_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    match (&args.log_file, args.simple) {
        (Some(path), _) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, true) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
        // The alternate screen would be garbled by log lines.
        (None, false) => {}
    }
    Ok(())
}

fn run(args: Args) -> Result<(), ConsoleError> {
    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        on_signal.cancel();
    }) {
        warn!("Failed to set signal handler: {}", e);
    }

    let timeout = Duration::from_secs(args.timeout);
    let source = MysqlSource::connect(&MysqlConfig {
        host: args.host,
        port: args.port,
        user: args.user,
        password: args.password,
        socket: args.socket,
        database: args.database,
        io_timeout: timeout,
    })?;
    if args.simple {
        check_server(&source)?;
        let n = print_processlist(&source, &mut io::stdout().lock())?;
        debug!(sessions = n, "processlist printed");
        return Ok(());
    }

    let config = ConsoleConfig {
        tick_interval: Duration::from_secs(args.interval),
        fetch_timeout: timeout,
        ..Default::default()
    };
    Console::new(Arc::new(source), config, cancel).run()
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("mytop: cannot open log file: {e}");
        process::exit(1);
    }

    // The console has restored the terminal by the time run() returns.
    if let Err(e) = run(args) {
        error!(error = %e, "mytop failed");
        eprintln!("mytop: {e}");
        process::exit(1);
    }
}
