use clap::Parser;
use tenq_core::PipelineError;

mod cli;
pub mod exit_codes;
mod operator;

use cli::args::Cli;
use cli::commands::dispatch;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            e.downcast_ref::<PipelineError>()
                .map_or(exit_codes::INTERNAL_ERROR, PipelineError::exit_code)
        }
    };
    std::process::exit(code);
}
