use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tenq",
    version,
    about = "Generate-and-judge analysis of 10-Q filings: revenue, cashflow and debt reports"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// YAML config file (environment variables still override it)
    #[arg(long, global = true, env = "TENQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report root directory
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Filing cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Pick a filing, then generate, judge and store its reports; repeats until input closes
    Run(RunArgs),
    /// List cached filings
    Filings(FilingsArgs),
    /// Print stored reports for a company
    Reports(ReportsArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Stop after one filing
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilingsArgs {
    /// Case-insensitive substring of the cached file name
    pub term: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportsArgs {
    /// Company name as it appears in the output tree
    pub company: String,

    /// Only reports for this filing date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}
