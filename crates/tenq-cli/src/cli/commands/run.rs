use std::sync::Arc;

use tenq_core::engine::IterationSink;
use tenq_core::providers::edgar::EdgarClient;
use tenq_core::{
    FilingStore, InteractiveSource, IterationOutcome, KindOutcome, Operator, PipelineController,
    PipelineError,
};

use crate::cli::args::{GlobalArgs, RunArgs};
use crate::exit_codes::SUCCESS;
use crate::operator::DialoguerOperator;

pub async fn run(args: RunArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let mut config = super::load_config(global)?;
    let mut operator = DialoguerOperator::new();

    for provider in config.missing_credentials() {
        let prompt = format!(
            "{} API key ({} is not set)",
            provider.as_str(),
            provider.api_key_env()
        );
        match operator.secret(&prompt) {
            Ok(key) => config.set_credential(provider, key.trim()),
            Err(e) => {
                eprintln!("{}", e);
                return Ok(e.exit_code());
            }
        }
    }
    if config.edgar.identity.trim().is_empty() {
        match operator.input("EDGAR identity (name and email, sent to the SEC)") {
            Ok(identity) => config.edgar.identity = identity,
            Err(e) => {
                eprintln!("{}", e);
                return Ok(e.exit_code());
            }
        }
    }

    let controller = match PipelineController::from_config(&config) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(e.exit_code());
        }
    };
    let edgar = match EdgarClient::from_config(&config.edgar) {
        Ok(edgar) => edgar,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(e.exit_code());
        }
    };

    let mut source = InteractiveSource::new(
        operator,
        Arc::new(edgar),
        FilingStore::new(&config.cache_dir),
    );

    if args.once {
        let outcome = controller.run_iteration(&mut source).await;
        print_outcome(&outcome);
        return Ok(once_exit_code(&outcome));
    }

    let sink: IterationSink = Arc::new(print_outcome);
    let stop = controller.run_forever(&mut source, Some(sink)).await;
    Ok(stop.exit_code())
}

/// Exit code of a single iteration: the first failed kind decides. Judge
/// rejections are a normal result.
fn once_exit_code(outcome: &IterationOutcome) -> i32 {
    match outcome {
        IterationOutcome::Completed(summary) => summary
            .first_error()
            .map_or(SUCCESS, PipelineError::exit_code),
        IterationOutcome::Aborted(e) => e.exit_code(),
    }
}

/// Per-kind results, with anomalies for rejected drafts and the text of new reports.
fn print_outcome(outcome: &IterationOutcome) {
    match outcome {
        IterationOutcome::Completed(summary) => {
            println!("\n{}", summary.reference);
            for (kind, result) in summary.outcomes() {
                println!("  {}: {}", kind, result);
                if let KindOutcome::Persisted { path } = result {
                    match std::fs::read_to_string(path) {
                        Ok(report) => println!("{}", report),
                        Err(e) => eprintln!("  could not read {}: {}", path.display(), e),
                    }
                }
            }
        }
        IterationOutcome::Aborted(e) if e.stops_run_loop() => eprintln!("stopping: {}", e),
        IterationOutcome::Aborted(e) => eprintln!("{}; starting over", e),
    }
}
