//! Check command for validating a race before publishing results.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use rr_core::{Performance, RaceResults};

use super::util::RaceInput;

/// Formats a short summary of a computed race and every note raised.
pub fn format_check(results: &RaceResults) -> String {
    let mut output = String::new();

    let count = |wanted: fn(&Performance) -> bool| {
        results
            .overall
            .iter()
            .filter(|result| wanted(&result.performance))
            .count()
    };
    let finishers = count(Performance::is_finished);
    let non_finishers = count(|p| *p == Performance::DidNotFinish);
    let non_starters = count(|p| *p == Performance::DidNotStart);

    writeln!(output, "{}: OK", results.race).unwrap();
    writeln!(output, "  Legs:         {}", results.segments).unwrap();
    writeln!(output, "  Entries:      {}", results.overall.len()).unwrap();
    writeln!(output, "  Finishers:    {finishers}").unwrap();
    writeln!(output, "  DNF:          {non_finishers}").unwrap();
    writeln!(output, "  DNS:          {non_starters}").unwrap();
    writeln!(output, "  Notes:        {}", results.notes.len()).unwrap();
    for note in &results.notes {
        writeln!(output, "  - {note}").unwrap();
    }
    output
}

pub fn run<W: Write>(writer: &mut W, race: &Path, config_path: Option<&Path>) -> Result<()> {
    let input = RaceInput::load(race, config_path)?;
    let results = input.compute()?;
    tracing::debug!(path = %input.path.display(), "race checked");
    write!(writer, "{}", format_check(&results))?;
    Ok(())
}
