//! Docker compose startup run at the end of the wizard.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::info;

use crate::cli::specs::{
    CommandSpec, compose_pull_spec, compose_up_spec, run_spec_inherit,
};

/// Brings up the configured stack.
#[async_trait]
pub trait ServiceStarter: Send + Sync {
    async fn start(&self) -> Result<()>;

    /// Command the user can run by hand when `start` fails.
    fn manual_command(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct ComposeStack {
    root: PathBuf,
}

impl ComposeStack {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run_step(spec: &CommandSpec) -> Result<()> {
        let status = run_spec_inherit(spec)
            .await
            .with_context(|| format!("failed to run `{spec}`"))?;
        if !status.success() {
            bail!(
                "`{} {}` failed with exit code {}",
                spec.program,
                spec.args_display(),
                status.code().unwrap_or(-1)
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceStarter for ComposeStack {
    async fn start(&self) -> Result<()> {
        info!("Starting Tiger Agent services...");
        Self::run_step(&compose_pull_spec(&self.root)).await?;
        Self::run_step(&compose_up_spec(&self.root)).await
    }

    fn manual_command(&self) -> String {
        compose_up_spec(&self.root).to_string()
    }
}
