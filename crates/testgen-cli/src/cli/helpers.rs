use super::CliError;
use super::commands::SharedArgs;
use anyhow::Context;
use std::path::{Path, PathBuf};
use testgen_core::TestgenConfig;
use tracing_subscriber::EnvFilter;

pub(super) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // A second initialisation (in-process tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn current_working_dir() -> Result<PathBuf, CliError> {
    std::env::current_dir()
        .context("failed to read current working directory")
        .map_err(CliError::from)
}

/// Configuration from `--config` (or defaults) with flag overrides applied.
pub(super) fn load_config(shared: &SharedArgs) -> Result<TestgenConfig, CliError> {
    let working_dir = current_working_dir()?;
    let mut config = match &shared.config {
        Some(path) => TestgenConfig::from_json_path(&resolve_cli_path(&working_dir, path))
            .map_err(CliError::Pipeline)?,
        None => TestgenConfig::default(),
    };

    if let Some(project_root) = &shared.project_root {
        config.project_root = project_root.clone();
    }
    config.project_root = resolve_cli_path(&working_dir, &config.project_root);
    if let Some(max_haystack_len) = shared.max_haystack_len {
        config.max_haystack_len = max_haystack_len;
    }
    if let Some(max_match_len) = shared.max_match_len {
        config.max_match_len = max_match_len;
    }
    if shared.keep_unexpected_success_inputs {
        config.keep_unexpected_success_inputs = true;
    }
    if let Some(timeout_secs) = shared.oracle_timeout_secs {
        config.oracle.timeout_secs = timeout_secs;
    }

    config.validate().map_err(CliError::Pipeline)?;
    Ok(config)
}

pub(super) fn resolve_report_path(shared: &SharedArgs) -> Result<Option<PathBuf>, CliError> {
    let Some(report) = &shared.report else {
        return Ok(None);
    };
    let working_dir = current_working_dir()?;
    Ok(Some(resolve_cli_path(&working_dir, report)))
}

pub(super) fn resolve_cli_path(working_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}
