use std::path::PathBuf;

use vstdio_core::log::{LogEmitter, LogLevel, validate_log_line};
use vstdio_core::{SeekPolicy, StoreConfig};
use vstdio_harness::{ConformanceReport, FixtureSet, TestRunner, VerificationSummary};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn load_sets() -> Vec<FixtureSet> {
    FixtureSet::load_all(&fixture_dir()).expect("fixtures load")
}

#[test]
fn shipped_fixtures_all_pass() {
    let mut runner = TestRunner::new("fixture-suite");
    let mut results = Vec::new();
    for set in &load_sets() {
        results.extend(runner.run(set));
    }
    let summary = VerificationSummary::from_results(results);
    for failure in summary.failures() {
        eprintln!("{}:\n{}", failure.case_name, failure.diff.as_deref().unwrap_or(""));
    }
    assert!(summary.total >= 10);
    assert!(summary.all_passed());
}

#[test]
fn every_case_has_one_outcome_per_step() {
    for set in &load_sets() {
        for case in &set.cases {
            assert_eq!(case.steps.len(), case.expect.len(), "case {}", case.name);
        }
    }
}

#[test]
fn sparse_policy_changes_past_end_seek_outcome() {
    let set = FixtureSet::from_json(
        r#"{
            "version":"v1",
            "family":"stdio/stream",
            "cases":[{
                "name":"sparse_write",
                "reference":"POSIX lseek",
                "steps":[
                    {"op":"open","handle":"h","name":"s","mode":"w+"},
                    {"op":"write","handle":"h","data":"ab"},
                    {"op":"seek","handle":"h","origin":"end","offset":2},
                    {"op":"write","handle":"h","data":"Z"}
                ],
                "expect":["ok","ok:2","ok:4","ok:1"],
                "expected_contents":{"s":"ab\\x00\\x00Z"}
            }]
        }"#,
    )
    .unwrap();

    let sparse = StoreConfig::default().with_seek_policy(SeekPolicy::SparseWrite);
    assert!(TestRunner::new("sparse").with_config(sparse).run(&set)[0].passed);

    let bounded = TestRunner::new("bounded").run(&set);
    assert!(!bounded[0].passed);
    assert_eq!(bounded[0].actual[2], "err:OutOfBounds");
}

#[test]
fn run_log_is_valid_jsonl() {
    let (emitter, buffer) = LogEmitter::in_memory("harness", "suite");
    let mut runner = TestRunner::new("fixture-suite").with_logger(emitter);
    let mut cases = 0;
    for set in &load_sets() {
        cases += runner.run(set).len();
    }

    let entries: Vec<_> = buffer
        .lines()
        .iter()
        .enumerate()
        .map(|(i, line)| validate_log_line(line, i + 1).expect("valid log line"))
        .collect();
    let starts = entries.iter().filter(|e| e.event == "case_start").count();
    let ends = entries.iter().filter(|e| e.event == "case_end").count();
    assert_eq!(starts, cases);
    assert_eq!(ends, cases);
    assert!(entries.iter().any(|e| e.level == LogLevel::Warn && e.errno == Some(2)));

    // Trace ids are unique across the whole run.
    let mut ids: Vec<_> = entries.iter().map(|e| e.trace_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), entries.len());
}

#[test]
fn report_renders_from_suite() {
    let mut runner = TestRunner::new("fixture-suite");
    let results = load_sets().iter().flat_map(|s| runner.run(s)).collect();
    let report = ConformanceReport {
        title: String::from("vstdio Conformance Report"),
        seek_policy: String::from("bounded"),
        timestamp: vstdio_core::log::now_utc(),
        summary: VerificationSummary::from_results(results),
    };
    let md = report.to_markdown();
    assert!(md.contains("| overwrite_seek_reread | C11 7.21.9.2 | PASS |"));
    assert!(md.contains("- Failed: 0"));
}
