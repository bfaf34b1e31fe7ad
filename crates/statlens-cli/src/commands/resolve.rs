use statlens_core::SymbolResolver;

use crate::cli::{Cli, ResolveArgs};
use crate::error::CliError;
use crate::output;

/// Resolution never touches the provider, so no source is built.
pub fn run(cli: &Cli, args: &ResolveArgs) -> Result<(), CliError> {
    let config = super::build_config(cli)?;
    let resolver = SymbolResolver::new(config.default_suffix);

    let query = args.query();
    let ticker = resolver.resolve(&query)?;
    println!(
        "{}",
        output::render_resolution(&query, &ticker, cli.format, cli.pretty)?
    );
    Ok(())
}
