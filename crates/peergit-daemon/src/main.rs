//! Peergit daemon - serves linked git repositories to trusted peers.

use anyhow::Context;
use clap::Parser;
use peergit_daemon::{
    init_logging, Approver, Daemon, DaemonConfig, LogFormat, StaticApprover, TerminalApprover,
};
use peergit_git::GitCli;
use peergit_store::parse_link_spec;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Peergit daemon - share git working copies with trusted peers
#[derive(Parser, Debug)]
#[command(name = "peergit-daemon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport listen address
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Directory for the identity key, trust store and registry
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Link a repository as alias:path (repeatable)
    #[arg(long = "repo", value_name = "ALIAS:PATH")]
    repos: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Remote pushed to after each commit
    #[arg(long, conflicts_with = "no_push")]
    push_remote: Option<String>,

    /// Commit without pushing
    #[arg(long)]
    no_push: bool,

    /// Refuse handshakes from peers that are not already trusted
    #[arg(long)]
    deny_new_peers: bool,

    /// Seconds a dialer has to complete the transport hello
    #[arg(long)]
    hello_timeout: Option<u64>,

    /// Path or name of the git binary
    #[arg(long)]
    git: Option<PathBuf>,
}

impl Args {
    /// Layers flags over the file configuration.
    fn apply(self, config: &mut DaemonConfig) -> anyhow::Result<()> {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(remote) = self.push_remote {
            config.push_remote = Some(remote);
        }
        if self.no_push {
            config.push_remote = None;
        }
        if self.deny_new_peers {
            config.deny_new_peers = true;
        }
        if let Some(secs) = self.hello_timeout {
            config.hello_timeout_secs = secs;
        }
        if let Some(git) = self.git {
            config.git_program = git;
        }
        for spec in &self.repos {
            let (alias, path) = parse_link_spec(spec).with_context(|| format!("invalid --repo '{spec}'"))?;
            config.repos.insert(alias, path);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    args.apply(&mut config)?;

    init_logging(&config.log_level, config.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting peergit daemon");
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        deny_new_peers = config.deny_new_peers,
        "Daemon configuration"
    );

    let approver: Arc<dyn Approver> = if config.deny_new_peers {
        Arc::new(StaticApprover::deny_all())
    } else {
        Arc::new(TerminalApprover::new())
    };
    let backend = Arc::new(GitCli::new(config.git_program.clone()));

    let daemon = Daemon::start(&config, backend, approver)
        .await
        .context("failed to start daemon")?;

    let addr = daemon.peer_addr()?;
    println!("peergit daemon listening");
    println!("  peer id: {}", addr.peer);
    println!("  address: {addr}");
    println!("Add it on a client with: peergit daemon add <name> {addr}");

    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Daemon stopped");
    Ok(())
}
