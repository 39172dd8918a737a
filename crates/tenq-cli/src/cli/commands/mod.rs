use anyhow::Context;
use tenq_core::PipelineConfig;

use super::args::*;
use crate::exit_codes::SUCCESS;

pub(crate) mod filings;
pub(crate) mod reports;
pub(crate) mod run;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args, &cli.global).await,
        Command::Filings(args) => filings::run(args, &cli.global).await,
        Command::Reports(args) => reports::run(args, &cli.global).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Defaults, then `--config`, then environment, then directory flags.
pub(crate) fn load_config(global: &GlobalArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = match &global.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::from_env(),
    };
    if let Some(dir) = &global.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(dir) = &global.cache_dir {
        config = config.with_cache_dir(dir);
    }
    Ok(config)
}
