//! Process exit codes. Pipeline errors use `PipelineError::exit_code` (2..=7).

pub const SUCCESS: i32 = 0;
pub const NOT_FOUND: i32 = 1; // Query matched no cached filing or report
pub const INTERNAL_ERROR: i32 = 2; // Setup failed outside the pipeline taxonomy
