//! Results command for printing overall standings.
//!
//! Several races can be given at once; they are computed in parallel and
//! printed in argument order.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use rr_core::{CategoryCode, OverallResult, RaceResults, RaceTime};

use super::util::load_results;

pub(crate) fn time_or_dash(time: Option<RaceTime>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.to_string())
}

pub(crate) fn underline(title: &str) -> String {
    "─".repeat(title.chars().count())
}

fn format_leg_lines(output: &mut String, result: &OverallResult) {
    for (index, segment) in result.segments.iter().enumerate() {
        let runner = result.runners.get(index).map_or("", String::as_str);
        let mass = if segment.in_mass_start && !segment.dnf {
            "  mass start"
        } else {
            ""
        };
        let split = if segment.dnf {
            "-".to_string()
        } else {
            time_or_dash(segment.duration)
        };
        writeln!(
            output,
            "{:11}leg {}  {:<12} {:>8} {:>8}{mass}",
            "",
            index + 1,
            runner,
            split,
            time_or_dash(segment.running_total)
        )
        .unwrap();
    }
}

/// Formats the overall standings of one race.
pub fn format_results(results: &RaceResults, notes: bool) -> String {
    let mut output = String::new();

    let title = format!("RESULTS: {}", results.race);
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", underline(&title)).unwrap();

    if results.overall.is_empty() {
        writeln!(output, "No entries.").unwrap();
    } else {
        writeln!(
            output,
            "{:<4} {:>4}  {:<12} {:<12} {:<4} {:>8}",
            "Pos", "Bib", "Name", "Club", "Cat", "Time"
        )
        .unwrap();
    }

    for result in &results.overall {
        let prizes = if result.prizes.is_empty() {
            String::new()
        } else {
            let codes: Vec<&str> = result.prizes.iter().map(CategoryCode::as_str).collect();
            format!("  {}", codes.join(", "))
        };
        writeln!(
            output,
            "{:<4} {:>4}  {:<12} {:<12} {:<4} {:>8}{prizes}",
            result.position,
            result.bib.value(),
            result.name,
            result.club,
            result.category.as_str(),
            result.performance.to_string()
        )
        .unwrap();
        if results.segments > 1 {
            format_leg_lines(&mut output, result);
        }
    }

    if notes && !results.notes.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "NOTES").unwrap();
        writeln!(output, "─────").unwrap();
        for note in &results.notes {
            writeln!(output, "- {note}").unwrap();
        }
    }

    output
}

pub fn run<W: Write>(
    writer: &mut W,
    races: &[PathBuf],
    config_path: Option<&Path>,
    json: bool,
    notes: bool,
) -> Result<()> {
    let computed: Vec<Result<RaceResults>> = races
        .par_iter()
        .map(|path| load_results(path, config_path))
        .collect();
    let computed = computed.into_iter().collect::<Result<Vec<_>>>()?;

    if json {
        let text = match computed.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            all => serde_json::to_string_pretty(all)?,
        };
        writeln!(writer, "{text}")?;
        return Ok(());
    }

    for (index, results) in computed.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}", format_results(results, notes))?;
    }
    Ok(())
}
