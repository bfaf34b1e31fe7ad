use statlens_core::CacheMode;

use crate::cli::{AnalyzeArgs, Cli};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli, args: &AnalyzeArgs) -> Result<(), CliError> {
    let analyzer = super::build_analyzer(cli)?;
    let mode = if args.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    };

    let report = analyzer
        .analyze_with_mode(&args.query(), args.granularity(), mode)
        .await?;
    println!("{}", output::render_report(&report, cli.format, cli.pretty)?);
    Ok(())
}
