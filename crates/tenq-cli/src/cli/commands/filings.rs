use tenq_core::FilingStore;

use crate::cli::args::{FilingsArgs, GlobalArgs};
use crate::exit_codes::{NOT_FOUND, SUCCESS};

pub async fn run(args: FilingsArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let config = super::load_config(global)?;
    let store = FilingStore::new(&config.cache_dir);
    let term = args.term.unwrap_or_default();

    let matches = store.search(&term).await?;
    if matches.is_empty() {
        eprintln!(
            "No cached filings match '{}' in {}",
            term,
            store.root().display()
        );
        return Ok(NOT_FOUND);
    }

    for (i, name) in matches.iter().enumerate() {
        println!("{}: {}", i + 1, name);
    }
    Ok(SUCCESS)
}
