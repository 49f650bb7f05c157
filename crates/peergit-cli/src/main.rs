//! Peergit CLI - work on a peer's git repositories.

use clap::{Args, Parser, Subcommand};
use commands::{CliError, Target};
use peergit_p2p::P2pError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

/// Peergit - edit, branch and commit in a peer's git repositories
#[derive(Parser, Debug)]
#[command(name = "peergit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Client state directory (default: ~/.peergit)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// A repository on a daemon.
#[derive(Args, Debug)]
struct RepoArgs {
    /// Saved daemon name or <peer-id>@<host:port>
    daemon: String,
    /// Repository alias on the daemon
    repo: String,
}

impl RepoArgs {
    fn target(&self) -> Target<'_> {
        Target {
            daemon: &self.daemon,
            repo: &self.repo,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage this client's identity
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },

    /// Manage saved daemons
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Ask a daemon's operator to trust this client
    Handshake {
        /// Saved daemon name or <peer-id>@<host:port>
        daemon: String,
    },

    /// List repositories linked on a daemon
    Repos {
        /// Saved daemon name or <peer-id>@<host:port>
        daemon: String,
    },

    /// Link a directory on the daemon under an alias
    Link {
        /// Saved daemon name or <peer-id>@<host:port>
        daemon: String,
        /// Alias to link
        alias: String,
        /// Directory on the daemon host
        path: String,
    },

    /// List files
    Ls(RepoArgs),

    /// Print a file
    Cat {
        #[command(flatten)]
        repo: RepoArgs,
        /// Path relative to the repository root
        file: String,
    },

    /// Write a file from stdin or a local file
    Write {
        #[command(flatten)]
        repo: RepoArgs,
        /// Path relative to the repository root
        file: String,
        /// Read content from this local file instead of stdin
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Rename a file
    Rename {
        #[command(flatten)]
        repo: RepoArgs,
        /// Current path
        old: String,
        /// New path
        new: String,
    },

    /// Create a branch
    Branch {
        #[command(flatten)]
        repo: RepoArgs,
        /// New branch name
        name: String,
    },

    /// List branches
    Branches(RepoArgs),

    /// Switch branch, parking and restoring uncommitted work
    Switch {
        #[command(flatten)]
        repo: RepoArgs,
        /// Branch to switch to
        branch: String,
    },

    /// Commit every change on a branch and push
    Commit {
        #[command(flatten)]
        repo: RepoArgs,
        /// Branch to commit on
        #[arg(short, long)]
        branch: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show working tree status
    Status(RepoArgs),

    /// Show recent history
    Log(RepoArgs),

    /// Show unstaged changes
    Diff {
        #[command(flatten)]
        repo: RepoArgs,
        /// Limit the diff to one file
        file: Option<String>,
    },

    /// Stash uncommitted work
    Stash(RepoArgs),

    /// Restore the most recent stash
    StashPop(RepoArgs),

    /// Discard every uncommitted change
    Reset(RepoArgs),
}

#[derive(Subcommand, Debug)]
enum IdentityCommands {
    /// Show this client's peer id
    Show,
}

#[derive(Subcommand, Debug)]
enum DaemonCommands {
    /// Save a daemon address under a name
    Add {
        /// Name to save it under
        name: String,
        /// <peer-id>@<host:port>, as printed by peergit-daemon
        addr: String,
    },

    /// List saved daemons
    List,
}

async fn run(cli: Cli) -> commands::Result<()> {
    let home = config::Home::resolve(cli.home)?;

    match cli.command {
        Commands::Identity { command } => match command {
            IdentityCommands::Show => commands::identity_show(&home),
        },
        Commands::Daemon { command } => match command {
            DaemonCommands::Add { name, addr } => commands::daemon_add(&home, &name, &addr),
            DaemonCommands::List => commands::daemon_list(&home),
        },
        Commands::Handshake { daemon } => commands::handshake(&home, &daemon).await,
        Commands::Repos { daemon } => commands::repos(&home, &daemon).await,
        Commands::Link { daemon, alias, path } => commands::link(&home, &daemon, &alias, &path).await,
        Commands::Ls(repo) => commands::ls(&home, &repo.target()).await,
        Commands::Cat { repo, file } => commands::cat(&home, &repo.target(), &file).await,
        Commands::Write { repo, file, from } => {
            commands::write(&home, &repo.target(), &file, from.as_deref()).await
        }
        Commands::Rename { repo, old, new } => commands::rename(&home, &repo.target(), &old, &new).await,
        Commands::Branch { repo, name } => commands::branch(&home, &repo.target(), &name).await,
        Commands::Branches(repo) => commands::branches(&home, &repo.target()).await,
        Commands::Switch { repo, branch } => commands::switch(&home, &repo.target(), &branch).await,
        Commands::Commit { repo, branch, message } => {
            commands::commit(&home, &repo.target(), &branch, &message).await
        }
        Commands::Status(repo) => commands::status(&home, &repo.target()).await,
        Commands::Log(repo) => commands::log(&home, &repo.target()).await,
        Commands::Diff { repo, file } => commands::diff(&home, &repo.target(), file.as_deref()).await,
        Commands::Stash(repo) => commands::stash(&home, &repo.target()).await,
        Commands::StashPop(repo) => commands::stash_pop(&home, &repo.target()).await,
        Commands::Reset(repo) => commands::reset(&home, &repo.target()).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("peergit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        if matches!(e, CliError::P2p(P2pError::NoResponse)) {
            eprintln!("Hint: run 'peergit handshake <daemon>' if this client is not trusted yet.");
        }
        std::process::exit(1);
    }
}
