//! PortsManager CLI - Find and stop the processes behind network ports
//!
//! A command-line tool for listing listening sockets with their owning
//! processes and terminating those processes.

mod commands;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portsmanager")]
#[command(author, version, about = "Find and stop the processes behind network ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Filter by process name (case-insensitive substring)
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Terminate a process by PID, or every process listening on a port
    Kill {
        /// Process ID to terminate
        #[arg(required_unless_present = "port", conflicts_with = "port")]
        pid: Option<u32>,

        /// Terminate the owners of this port instead
        #[arg(short, long)]
        port: Option<u16>,

        /// Kill immediately instead of asking the process to exit
        #[arg(short, long)]
        force: bool,

        /// Seconds to wait for the process to exit (defaults to the configured value)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let code = match cli.command {
        Some(Commands::List { port, name }) => commands::list::run(port, name, cli.json).await?,
        Some(Commands::Kill {
            pid,
            port,
            force,
            timeout,
        }) => {
            let target = match (pid, port) {
                (Some(pid), _) => commands::kill::Target::Pid(pid),
                (None, Some(port)) => commands::kill::Target::Port(port),
                (None, None) => anyhow::bail!("either a PID or --port is required"),
            };
            commands::kill::run(target, force, timeout, cli.json).await?
        }
        Some(Commands::Config) => commands::config::show(cli.json).await?,
        None => commands::list::run(None, None, cli.json).await?,
    };

    Ok(code)
}
