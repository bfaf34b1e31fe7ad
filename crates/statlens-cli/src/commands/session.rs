use statlens_core::{Analyzer, Granularity};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::cli::{Cli, OutputFormat, SessionArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli, args: &SessionArgs) -> Result<(), CliError> {
    let analyzer = super::build_analyzer(cli)?;
    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();

    let answered = serve(
        &analyzer,
        args.granularity(),
        cli.format,
        cli.pretty,
        reader,
        &mut writer,
    )
    .await?;
    info!(answered, "session closed");
    Ok(())
}

/// Answers every non-blank line with a report or one error line. Pipeline
/// failures never end the session; only I/O and serialization errors do.
async fn serve<R, W>(
    analyzer: &Analyzer,
    default_granularity: Granularity,
    format: OutputFormat,
    pretty: bool,
    mut reader: R,
    writer: &mut W,
) -> Result<usize, CliError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();
    let mut answered = 0;

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            break;
        }
        // Undecodable bytes become U+FFFD, which the resolver rejects as a symbol character.
        let line = String::from_utf8_lossy(&buffer);
        let Some((granularity, query)) = parse_line(&line, default_granularity) else {
            continue;
        };

        let rendered = match analyzer.analyze(query, granularity).await {
            Ok(report) => output::render_report(&report, format, pretty)?,
            Err(error) => {
                warn!(query, code = error.code(), "query failed");
                output::render_error(query, &error, format)
            }
        };
        writer.write_all(rendered.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        answered += 1;
    }

    Ok(answered)
}

/// `quarterly tcs` overrides the session granularity; a bare keyword is a query.
fn parse_line(line: &str, default_granularity: Granularity) -> Option<(Granularity, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (first, rest) = match line.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (line, ""),
    };
    let granularity = match first.to_ascii_lowercase().as_str() {
        "annual" => Some(Granularity::Annual),
        "quarterly" => Some(Granularity::Quarterly),
        _ => None,
    };

    match granularity {
        Some(granularity) if !rest.is_empty() => Some((granularity, rest)),
        _ => Some((default_granularity, line)),
    }
}
