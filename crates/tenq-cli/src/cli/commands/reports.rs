use tenq_core::ReportStore;

use crate::cli::args::{GlobalArgs, ReportsArgs};
use crate::exit_codes::{NOT_FOUND, SUCCESS};

pub async fn run(args: ReportsArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let config = super::load_config(global)?;
    let store = ReportStore::new(&config.output_dir);

    let paths = store.list(&args.company, args.date.as_deref()).await?;
    if paths.is_empty() {
        eprintln!(
            "No reports for '{}'{} under {}",
            args.company,
            args.date
                .as_deref()
                .map(|d| format!(" on {}", d))
                .unwrap_or_default(),
            store.root().display()
        );
        return Ok(NOT_FOUND);
    }

    for path in paths {
        println!("== {} ==", path.display());
        println!("{}", store.load(&path).await?);
    }
    Ok(SUCCESS)
}
