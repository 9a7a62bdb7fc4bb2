//! Command-line client for the global information of an rTorrent instance.

use clap::{Parser, Subcommand};
use log::debug;
use xmlrpc_codec::RTorrent;

use std::fmt::Display;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rtorrent", version)]
#[command(about = "rTorrent XMLRPC CLI", long_about = None)]
struct Cli {
    /// rTorrent endpoint
    #[arg(long, global = true, value_name = "URL", default_value = "http://myrtorrent/RPC2")]
    endpoint: String,

    /// Disable certificate checking on this endpoint, useful for testing
    #[arg(long, global = true)]
    disable_cert_check: bool,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Retrieves the IP for this rTorrent instance
    GetIp,
    /// Retrieves the name for this rTorrent instance
    GetName,
    /// Retrieves the up/down totals for this rTorrent instance
    GetTotals,
}

/// Prints the outcome of one query. Returns whether it succeeded.
fn report<T: Display, E: Display>(what: &str, result: Result<T, E>, unit: &str) -> bool {
    match result {
        Ok(value) => {
            println!("[INFO] rTorrent {}: {}{}", what, value, unit);
            true
        }
        Err(e) => {
            println!("[ERR] Error getting rTorrent {}: {}", what, e);
            false
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    debug!("using endpoint {}", cli.endpoint);
    let conn = match RTorrent::new(&cli.endpoint, cli.disable_cert_check) {
        Ok(conn) => conn,
        Err(e) => {
            println!("[ERR] Error creating rTorrent connection: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ok = match cli.command {
        Command::GetIp => report("IP", conn.ip(), ""),
        Command::GetName => report("name", conn.name(), ""),
        Command::GetTotals => {
            // report both, even if the first one fails
            let down = report("down total", conn.down_total(), " bytes");
            let up = report("up total", conn.up_total(), " bytes");
            down && up
        }
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
