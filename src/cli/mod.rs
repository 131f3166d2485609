pub mod process;
pub mod status;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{kill_previous_daemons, restart_daemon};
use status::process_status_command;
use tracing::level_filters::LevelFilter;

use crate::{
    engine::start_engine,
    utils::{
        dir::create_application_default_path,
        logging::{CLI_PREFIX, enable_logging},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Codetime", version, long_about = None)]
#[command(about = "Tracks time spent in development applications", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Run the tracking engine directly in the current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Display the accumulated code time")]
    Status {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };

    match args.commands {
        Commands::Init { dir } => {
            let app_dir = dir.map_or_else(create_application_default_path, Ok)?;
            enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;
            restart_daemon()?;
            Ok(())
        }
        Commands::Serve { dir } => {
            let app_dir = dir.map_or_else(create_application_default_path, Ok)?;
            enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;
            start_engine(app_dir).await
        }
        Commands::Stop {} => {
            let process_name = env::current_exe()?;
            kill_previous_daemons(&process_name);
            Ok(())
        }
        Commands::Status { dir, json } => {
            let app_dir = dir.map_or_else(create_application_default_path, Ok)?;
            process_status_command(app_dir, json)
        }
    }
}
