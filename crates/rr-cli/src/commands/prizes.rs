//! Prizes command for printing prize winners by category.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use rr_core::RaceResults;

use super::results::underline;
use super::util::load_results;

/// Formats the winners of every prize category, in report order.
pub fn format_prizes(results: &RaceResults) -> String {
    let mut output = String::new();

    let title = format!("PRIZES: {}", results.race);
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", underline(&title)).unwrap();

    if results.prizes.is_empty() {
        writeln!(output, "No prize categories.").unwrap();
    }

    for list in &results.prizes {
        writeln!(output, "{}", list.name).unwrap();
        if list.winners.is_empty() {
            writeln!(output, "  (no eligible finishers)").unwrap();
        }
        for (place, bib) in list.winners.iter().enumerate() {
            let Some(winner) = results.overall.iter().find(|result| result.bib == *bib) else {
                continue;
            };
            writeln!(
                output,
                "  {}. {} ({})  {}",
                place + 1,
                winner.name,
                winner.bib,
                winner.performance
            )
            .unwrap();
        }
    }

    output
}

pub fn run<W: Write>(
    writer: &mut W,
    race: &Path,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let results = load_results(race, config_path)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&results.prizes)?)?;
    } else {
        write!(writer, "{}", format_prizes(&results))?;
    }
    Ok(())
}
