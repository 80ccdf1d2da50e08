//! Legs command for printing per-leg standings.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};
use rr_core::{LegResult, RaceResults};
use serde::Serialize;

use super::results::underline;
use super::util::load_results;

#[derive(Debug, Serialize)]
struct JsonLeg {
    leg: usize,
    standings: Vec<LegResult>,
}

/// 0-based segments to show: every leg, or the single requested 1-based leg.
fn selected_segments(results: &RaceResults, leg: Option<usize>) -> Result<Vec<usize>> {
    match leg {
        None => Ok((0..results.segments).collect()),
        Some(leg) if (1..=results.segments).contains(&leg) => Ok(vec![leg - 1]),
        Some(leg) => bail!(
            "leg {leg} does not exist; {} has {} leg(s)",
            results.race,
            results.segments
        ),
    }
}

/// Formats the standings for one 0-based segment.
pub fn format_leg(results: &RaceResults, segment: usize) -> String {
    let mut output = String::new();
    let standings = results.leg_standings(segment);

    let title = format!("LEG {}: {}", segment + 1, results.race);
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", underline(&title)).unwrap();

    if standings.is_empty() {
        writeln!(output, "No finishers.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<4} {:>4}  {:<12} {:<12} {:>8}",
        "Pos", "Bib", "Runner", "Team", "Time"
    )
    .unwrap();
    for leg in &standings {
        let mass = if leg.in_mass_start { "  *" } else { "" };
        writeln!(
            output,
            "{:<4} {:>4}  {:<12} {:<12} {:>8}{mass}",
            leg.position,
            leg.bib.value(),
            leg.name,
            leg.team,
            leg.duration.to_string()
        )
        .unwrap();
    }
    if standings.iter().any(|leg| leg.in_mass_start) {
        writeln!(output, "* started in a mass start").unwrap();
    }
    output
}

pub fn run<W: Write>(
    writer: &mut W,
    race: &Path,
    config_path: Option<&Path>,
    leg: Option<usize>,
    json: bool,
) -> Result<()> {
    let results = load_results(race, config_path)?;
    let segments = selected_segments(&results, leg)?;

    if json {
        let legs: Vec<JsonLeg> = segments
            .into_iter()
            .map(|segment| JsonLeg {
                leg: segment + 1,
                standings: results.leg_standings(segment),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&legs)?)?;
        return Ok(());
    }

    for (index, segment) in segments.into_iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        write!(writer, "{}", format_leg(&results, segment))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::relay_results;

    use insta::assert_snapshot;

    #[test]
    fn test_format_leg_marks_mass_start() {
        let output = format_leg(&relay_results(), 1);
        assert_snapshot!(output, @r"
        LEG 2: Round the Loch
        ─────────────────────
        Pos   Bib  Runner       Team             Time
        1=      1  Cy Dee       Fife A        0:20:00
        1=      2  Gi Hay       Fife B        0:20:00
        3       3  Kay Lee      Carnegie      0:25:00  *
        * started in a mass start
        ");
    }

    #[test]
    fn test_format_leg_without_mass_start() {
        let output = format_leg(&relay_results(), 0);
        assert!(!output.contains('*'));
        assert!(output.contains("1       1  Al Bee       Fife A        0:20:00"));
    }

    #[test]
    fn test_selected_segments() {
        let results = relay_results();
        assert_eq!(selected_segments(&results, None).unwrap(), [0, 1]);
        assert_eq!(selected_segments(&results, Some(2)).unwrap(), [1]);
        let err = selected_segments(&results, Some(3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "leg 3 does not exist; Round the Loch has 2 leg(s)"
        );
        assert!(selected_segments(&results, Some(0)).is_err());
    }
}
