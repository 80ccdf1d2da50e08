//! End-to-end tests driving the `rr` binary.
//!
//! Each test writes a race definition and its feeds into a temporary
//! directory and checks the command's output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn rr_binary() -> String {
    env!("CARGO_BIN_EXE_rr").to_string()
}

/// Runs `rr` with `HOME` pointed at the temp dir so no user config is read.
fn rr(home: &Path, args: &[&str]) -> Output {
    Command::new(rr_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run rr")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const CATEGORIES: &str = r#"
[gender_inclusions]
Open = ["Women", "Mixed"]

[[entry_categories]]
code = "O"
name = "Open"
gender = "Open"

[[entry_categories]]
code = "W"
name = "Women"
gender = "Women"

[[entry_categories]]
code = "M"
name = "Mixed"
gender = "Mixed"

[[prize_categories]]
code = "Open"
name = "Open"
gender = "Open"
prizes = 2

[[prize_categories]]
code = "Women"
name = "Women"
gender = "Women"
prizes = 1

[[prize_categories]]
code = "Mixed"
name = "Mixed"
gender = "Mixed"
prizes = 1
"#;

const RELAY_ENTRIES: &str = "\
# bib\tteam\tclub\tcategory\tleg 1\tleg 2
1\tFife A\tFife AC\tO\tAl Bee\tCy Dee
2\tFife B\tFife AC\tW\tEve Eff\tGi Hay
3\tCarnegie\tCarnegie H\tM\tIan Jay\tKay Lee
4\tLate Team\tUnattached\tO\tMo Nu\tOz Pi
";

const RELAY_RESULTS: &str = "\
1\t0:20:00
2\t0:21:00
1\t0:40:00
2\t0:41:00
3\t0:55:00\tlost the trail
3\t1:15:00
";

/// Writes a two-leg relay into `dir` and returns the race file path.
fn write_relay(dir: &Path, name: &str) -> PathBuf {
    let race = dir.join(format!("{name}.toml"));
    let toml = format!(
        "name = \"{name}\"\nentries = \"{name}-entries.tsv\"\nresults = \"{name}-results.tsv\"\n\
         mass_starts = [{{ leg = 2, time = \"0:50:00\" }}]\n\n[format]\nkind = \"relay\"\nlegs = 2\n{CATEGORIES}"
    );
    std::fs::write(&race, toml).unwrap();
    std::fs::write(dir.join(format!("{name}-entries.tsv")), RELAY_ENTRIES).unwrap();
    std::fs::write(dir.join(format!("{name}-results.tsv")), RELAY_RESULTS).unwrap();
    race
}

fn write_individual(dir: &Path, results: &str, extra: &str) -> PathBuf {
    let race = dir.join("parkrun.toml");
    std::fs::write(
        &race,
        format!("name = \"Parkrun\"\n{extra}\n{CATEGORIES}"),
    )
    .unwrap();
    std::fs::write(
        dir.join("entries.tsv"),
        "101\tAnn Lee\tFife AC\tW\n102\tBob Roy\tUnattached\tO\n103\tCat Fox\tFife AC\tO\n",
    )
    .unwrap();
    std::fs::write(dir.join("results.tsv"), results).unwrap();
    race
}

#[test]
fn test_results_text_output() {
    let temp = TempDir::new().unwrap();
    let race = write_relay(temp.path(), "loch");

    let output = rr(temp.path(), &["results", race.to_str().unwrap(), "--notes"]);
    assert!(output.status.success(), "rr results failed: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.starts_with("RESULTS: loch\n"));
    assert!(text.contains("1       1  Fife A       Fife AC      O     0:40:00  Open"));
    assert!(text.contains("leg 2  Kay Lee       0:25:00  1:20:00  mass start"));
    assert!(text.contains("        4  Late Team    Unattached   O         DNS"));
    assert!(text.contains("- loch-results.tsv line 5: bib 3 0:55:00: lost the trail"));
}

#[test]
fn test_results_json_output() {
    let temp = TempDir::new().unwrap();
    let race = write_relay(temp.path(), "loch");

    let output = rr(temp.path(), &["results", race.to_str().unwrap(), "--json"]);
    assert!(output.status.success(), "rr results failed: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["race"], "loch");
    assert_eq!(json["segments"], 2);
    let overall = json["overall"].as_array().unwrap();
    assert_eq!(overall.len(), 4);
    assert_eq!(overall[0]["position"], "1");
    assert_eq!(overall[0]["bib"], 1);
    assert_eq!(overall[0]["performance"]["status"], "finished");
    assert_eq!(overall[0]["performance"]["time"], "0:40:00");
    assert_eq!(overall[2]["segments"][1]["in_mass_start"], true);
    assert_eq!(overall[3]["performance"]["status"], "did_not_start");
}

#[test]
fn test_multiple_races_print_in_argument_order() {
    let temp = TempDir::new().unwrap();
    let names = ["zulu", "alpha", "mike"];
    let races: Vec<String> = names
        .iter()
        .map(|name| write_relay(temp.path(), name).to_str().unwrap().to_string())
        .collect();

    let mut args = vec!["results"];
    args.extend(races.iter().map(String::as_str));
    let output = rr(temp.path(), &args);
    assert!(output.status.success(), "rr results failed: {}", stderr(&output));

    let titles: Vec<String> = stdout(&output)
        .lines()
        .filter(|line| line.starts_with("RESULTS: "))
        .map(ToString::to_string)
        .collect();
    assert_eq!(titles, ["RESULTS: zulu", "RESULTS: alpha", "RESULTS: mike"]);
}

#[test]
fn test_prizes_command() {
    let temp = TempDir::new().unwrap();
    let race = write_relay(temp.path(), "loch");

    let output = rr(temp.path(), &["prizes", race.to_str().unwrap()]);
    assert!(output.status.success(), "rr prizes failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Open\n  1. Fife A (1)  0:40:00\n"));
    assert!(text.contains("Mixed\n  1. Carnegie (3)  1:20:00\n"));
}

#[test]
fn test_legs_command_single_leg() {
    let temp = TempDir::new().unwrap();
    let race = write_relay(temp.path(), "loch");

    let output = rr(temp.path(), &["legs", race.to_str().unwrap(), "--leg", "2"]);
    assert!(output.status.success(), "rr legs failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("LEG 2: loch\n"));
    assert!(!text.contains("LEG 1"));
    assert!(text.contains("* started in a mass start"));

    let output = rr(temp.path(), &["legs", race.to_str().unwrap(), "--leg", "3"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("leg 3 does not exist"));
}

#[test]
fn test_check_reports_recovery_notes() {
    let temp = TempDir::new().unwrap();
    let race = write_individual(
        temp.path(),
        "101\t0:18:00\n?\t0:19:30\n103\t?\n",
        "",
    );

    let output = rr(temp.path(), &["check", race.to_str().unwrap()]);
    assert!(output.status.success(), "rr check failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("Parkrun: OK\n"));
    assert!(text.contains("Finishers:    3"));
    assert!(text.contains("results.tsv line 2: bib 102 0:19:30: bib number guessed"));
    assert!(text.contains("results.tsv line 3: bib 103 0:19:30: no basis for interpolation, set to last recorded time"));
}

#[test]
fn test_out_of_order_times_fail_with_line_number() {
    let temp = TempDir::new().unwrap();
    let race = write_individual(temp.path(), "101\t0:18:00\n102\t0:17:00\n", "");

    let output = rr(temp.path(), &["results", race.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("failed to compute results"), "{err}");
    assert!(err.contains("results.tsv line 2"), "{err}");
}

#[test]
fn test_missing_entries_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let race = write_individual(temp.path(), "101\t0:18:00\n", "entries = \"missing.tsv\"");

    let output = rr(temp.path(), &["check", race.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing.tsv"));
}

#[test]
fn test_environment_overrides_race_file() {
    let temp = TempDir::new().unwrap();
    let race = write_individual(temp.path(), "101\t0:18:00\n", "");

    let output = Command::new(rr_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env("RR_START_OFFSET", "0:01:00")
        .args(["results", race.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "rr results failed: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["overall"][0]["performance"]["time"], "0:17:00");
}

#[test]
fn test_no_subcommand_shows_help() {
    let temp = TempDir::new().unwrap();
    let output = rr(temp.path(), &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}
