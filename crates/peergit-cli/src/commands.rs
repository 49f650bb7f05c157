//! CLI command implementations.

use crate::config::Home;
use peergit_identity::PeerId;
use peergit_p2p::{Client, P2pError, PeerAddr};
use peergit_protocol::{
    CommitRequest, CreateBranchRequest, DiffRequest, LinkRepoRequest, ListBranchesRequest, ListFilesRequest,
    ListReposRequest, LogRequest, ReadFileRequest, RenameFileRequest, ResetRequest, StashPopRequest,
    StashSaveRequest, StatusRequest, SwitchBranchRequest, WriteFileRequest,
};
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Identity error.
    #[error("identity error: {0}")]
    Identity(#[from] peergit_identity::IdentityError),

    /// Transport error, including a daemon that never answered.
    #[error(transparent)]
    P2p(#[from] P2pError),

    /// Unusable client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Neither a saved daemon name nor an address.
    #[error("unknown daemon '{0}'; save it with `peergit daemon add <name> <peer-id>@<host:port>`")]
    UnknownDaemon(String),

    /// The daemon answered with a failure.
    #[error("{0}")]
    Failed(String),
}

/// A specialized Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

/// A repository on a daemon, as given on the command line.
#[derive(Debug, Clone)]
pub struct Target<'a> {
    /// Saved daemon name or literal address.
    pub daemon: &'a str,
    /// Repository alias on that daemon.
    pub repo: &'a str,
}

fn client(home: &Home, daemon: &str) -> Result<Client> {
    let addr = home.daemon(daemon)?;
    Ok(Client::new(home.keypair()?, addr))
}

/// Prints an output-style response, failing on `success: false`.
fn finish(success: bool, output: &str) -> Result<()> {
    if !success {
        return Err(CliError::Failed(output.trim_end().to_string()));
    }
    if !output.is_empty() {
        println!("{}", output.trim_end());
    }
    Ok(())
}

/// Turns an error-style response into a result.
fn check(success: bool, error: Option<String>) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(CliError::Failed(error.unwrap_or_else(|| "request failed".to_string())))
    }
}

// ==================== Local ====================

/// Show this client's identity.
pub fn identity_show(home: &Home) -> Result<()> {
    let keypair = home.keypair()?;
    println!("Peer ID: {}", PeerId::from(keypair.public_key()));
    println!("Home:    {}", home.dir().display());
    Ok(())
}

/// Save a daemon address under a name.
pub fn daemon_add(home: &Home, name: &str, addr: &str) -> Result<()> {
    let addr: PeerAddr = addr.parse()?;
    let mut config = home.config()?;
    config.daemons.insert(name.to_string(), addr.clone());
    home.save_config(&config)?;

    tracing::info!(name = %name, daemon = %addr, "Saved daemon");
    println!("Saved daemon '{name}' ({})", addr.peer.short_id());
    Ok(())
}

/// List saved daemons.
pub fn daemon_list(home: &Home) -> Result<()> {
    let config = home.config()?;
    if config.daemons.is_empty() {
        println!("No daemons saved. Use 'peergit daemon add <name> <address>' to add one.");
        return Ok(());
    }
    for (name, addr) in &config.daemons {
        println!("{name:<16} {addr}");
    }
    Ok(())
}

// ==================== Session ====================

/// Ask a daemon's operator to trust this client.
pub async fn handshake(home: &Home, daemon: &str) -> Result<()> {
    let client = client(home, daemon)?;
    println!("Waiting for the operator of '{daemon}' to decide...");
    if client.handshake().await? {
        println!("Handshake approved. This client is now trusted.");
        Ok(())
    } else {
        Err(CliError::Failed("handshake rejected".into()))
    }
}

/// List repositories linked on a daemon.
pub async fn repos(home: &Home, daemon: &str) -> Result<()> {
    let response = client(home, daemon)?.call(&ListReposRequest::default()).await?;
    if response.repos.is_empty() {
        println!("No repositories linked.");
    }
    for alias in response.repos {
        println!("{alias}");
    }
    Ok(())
}

/// Link a directory on the daemon under an alias.
pub async fn link(home: &Home, daemon: &str, alias: &str, path: &str) -> Result<()> {
    let response = client(home, daemon)?
        .call(&LinkRepoRequest {
            alias: alias.to_string(),
            path: path.to_string(),
        })
        .await?;
    check(response.success, response.error)?;
    println!("Linked '{alias}' -> {path}");
    Ok(())
}

// ==================== Files ====================

/// List files in a repository.
pub async fn ls(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&ListFilesRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    check(response.success, response.error)?;
    for file in response.files {
        println!("{file}");
    }
    Ok(())
}

/// Print a file.
pub async fn cat(home: &Home, target: &Target<'_>, file: &str) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&ReadFileRequest {
            repo_path: target.repo.to_string(),
            file_path: file.to_string(),
        })
        .await?;
    check(response.success, response.error)?;
    print!("{}", response.content);
    Ok(())
}

/// Write a file from a local file, or from stdin when `from` is `None`.
pub async fn write(home: &Home, target: &Target<'_>, file: &str, from: Option<&Path>) -> Result<()> {
    let content = match from {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            content
        }
    };

    let response = client(home, target.daemon)?
        .call(&WriteFileRequest {
            repo_path: target.repo.to_string(),
            file_path: file.to_string(),
            content,
        })
        .await?;
    check(response.success, response.error)?;
    println!("Wrote {file}");
    Ok(())
}

/// Rename a file.
pub async fn rename(home: &Home, target: &Target<'_>, old: &str, new: &str) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&RenameFileRequest {
            repo_path: target.repo.to_string(),
            old_path: old.to_string(),
            new_path: new.to_string(),
        })
        .await?;
    check(response.success, response.error)?;
    println!("Renamed {old} -> {new}");
    Ok(())
}

// ==================== Branches ====================

/// Create a branch.
pub async fn branch(home: &Home, target: &Target<'_>, name: &str) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&CreateBranchRequest {
            repo_path: target.repo.to_string(),
            new_branch_name: name.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// List branches.
pub async fn branches(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&ListBranchesRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    check(response.success, response.error)?;
    for name in response.branches {
        println!("{name}");
    }
    Ok(())
}

/// Switch branch, parking and restoring uncommitted work.
pub async fn switch(home: &Home, target: &Target<'_>, name: &str) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&SwitchBranchRequest {
            repo_path: target.repo.to_string(),
            branch_name: name.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

// ==================== Working tree ====================

/// Commit every change on a branch and push it.
pub async fn commit(home: &Home, target: &Target<'_>, branch: &str, message: &str) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&CommitRequest {
            repo_path: target.repo.to_string(),
            message: message.to_string(),
            branch: branch.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Show working tree status.
pub async fn status(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&StatusRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Show recent history.
pub async fn log(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&LogRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Show unstaged changes.
pub async fn diff(home: &Home, target: &Target<'_>, file: Option<&str>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&DiffRequest {
            repo_path: target.repo.to_string(),
            file_path: file.map(ToString::to_string),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Stash uncommitted work.
pub async fn stash(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&StashSaveRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Restore the most recent stash.
pub async fn stash_pop(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&StashPopRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}

/// Discard every uncommitted change.
pub async fn reset(home: &Home, target: &Target<'_>) -> Result<()> {
    let response = client(home, target.daemon)?
        .call(&ResetRequest {
            repo_path: target.repo.to_string(),
        })
        .await?;
    finish(response.success, &response.output)
}
