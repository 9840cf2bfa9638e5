//! # ctoolkit CLI Entry Point
//!
//! This is the main executable for the `ctk` command-line tool.
//! It parses CLI arguments using clap and routes commands to the appropriate handlers.
//!
//! ## Command Structure
//!
//! - **Build**: `build`, `clean`, `run`, `debug`, `test`, `debug-test`
//! - **State**: `select variant`, `select subsystem`, `status`
//! - **Tools**: `tools check`, `tools install`

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctoolkit::build::{BuildSubsystem, BuildVariant};
use ctoolkit::commands::{self, Session, build::BuildAction, select::SelectTarget};

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "ctk")]
#[command(about = "Build, run and debug CMake C/C++ projects", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Workspace root [default: current directory]
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// One-shot overrides of the saved build state
#[derive(Args, Clone, Copy, Debug, Default)]
struct StateArgs {
    /// Build type for this invocation only
    #[arg(long, value_enum)]
    variant: Option<BuildVariant>,
    /// Build backend for this invocation only
    #[arg(long, value_enum)]
    subsystem: Option<BuildSubsystem>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build the project
    Build {
        #[command(flatten)]
        state: StateArgs,
    },
    /// Remove the build directory
    Clean,
    /// Build, then run the executable
    Run {
        /// Keep the existing build directory
        #[arg(long)]
        no_clean: bool,
        #[command(flatten)]
        state: StateArgs,
    },
    /// Clean build, then start the debugger
    Debug {
        #[command(flatten)]
        state: StateArgs,
    },
    /// Clean build and run with the Test build type
    Test {
        #[command(flatten)]
        state: StateArgs,
    },
    /// Clean build with the Test build type, then start the debugger
    DebugTest {
        #[command(flatten)]
        state: StateArgs,
    },
    /// Choose the build type or backend
    Select {
        #[command(subcommand)]
        target: SelectCommand,
    },
    /// Show platform, workspace and build state
    Status,
    /// Check or install required tools
    Tools {
        #[command(subcommand)]
        op: ToolsCommand,
    },
    /// Generate shell completions
    Completion { shell: Shell },
}

#[derive(Subcommand, Clone, Copy)]
enum SelectCommand {
    /// Debug, Test or Release
    Variant,
    /// Ninja or Make
    Subsystem,
}

#[derive(Subcommand, Clone, Copy)]
enum ToolsCommand {
    /// Report which required tools are on PATH
    Check,
    /// Install missing tools with the platform package manager
    Install,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ctoolkit=debug"
    } else {
        "ctoolkit=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Cancel in-flight waits on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            token.cancel();
        }
    });
    cancel
}

async fn run_build(session: &Session, action: BuildAction, state: StateArgs) -> Result<bool> {
    let state = session.effective_state(state.variant, state.subsystem);
    commands::build::handle(session, action, state, cancel_on_ctrl_c()).await
}

#[tokio::main]
async fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completion { shell } = cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let session = Session::open(&root)?;

    let succeeded = match cli.command {
        Commands::Build { state } => run_build(&session, BuildAction::Build, state).await?,
        Commands::Clean => run_build(&session, BuildAction::Clean, StateArgs::default()).await?,
        Commands::Run { no_clean, state } => {
            run_build(&session, BuildAction::Run { clean: !no_clean }, state).await?
        }
        Commands::Debug { state } => run_build(&session, BuildAction::Debug, state).await?,
        Commands::Test { state } => run_build(&session, BuildAction::Test, state).await?,
        Commands::DebugTest { state } => run_build(&session, BuildAction::DebugTest, state).await?,
        Commands::Select { target } => {
            let target = match target {
                SelectCommand::Variant => SelectTarget::Variant,
                SelectCommand::Subsystem => SelectTarget::Subsystem,
            };
            commands::select::handle(&session, target, cancel_on_ctrl_c()).await?;
            true
        }
        Commands::Status => {
            commands::status::handle(&session)?;
            true
        }
        Commands::Tools { op } => match op {
            ToolsCommand::Check => commands::tools::check(&session).await?,
            ToolsCommand::Install => commands::tools::install(&session).await?,
        },
        Commands::Completion { .. } => true,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
