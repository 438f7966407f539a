//! Pre-pass backup trigger.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Invoked once before a pass mutates anything.
#[async_trait]
pub trait BackupTrigger: Send + Sync {
    async fn run_backup(&self) -> Result<()>;
}

/// Runs an external backup program and waits for it to succeed.
#[derive(Debug, Clone)]
pub struct CommandBackup {
    program: String,
    args: Vec<String>,
}

impl CommandBackup {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl BackupTrigger for CommandBackup {
    async fn run_backup(&self) -> Result<()> {
        info!("Running backup: {} {}", self.program, self.args.join(" "));
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .with_context(|| format!("Failed to start backup program '{}'", self.program))?;
        if !status.success() {
            bail!("Backup program '{}' exited with {}", self.program, status);
        }
        info!("Backup finished");
        Ok(())
    }
}
