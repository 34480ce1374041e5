//! CLI entrypoint for the vstdio conformance harness.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vstdio_core::log::{LogEmitter, now_utc};
use vstdio_core::stdio::printf;
use vstdio_core::{FormatArg, SeekPolicy, StoreConfig};
use vstdio_harness::{
    ArgValue, ConformanceReport, FixtureSet, HarnessError, TestRunner, VerificationSummary,
};

/// Conformance tooling for vstdio.
#[derive(Debug, Parser)]
#[command(name = "vstdio-harness")]
#[command(about = "Conformance testing harness for vstdio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay fixture sets and compare every step outcome.
    Verify {
        /// Fixture JSON file, or a directory of them.
        #[arg(long)]
        fixture: PathBuf,
        /// Output report path (markdown; a `.json` twin is written next to it).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Seek policy (`bounded` or `sparse`). Defaults to `VSTDIO_SEEK_POLICY`.
        #[arg(long)]
        seek_policy: Option<String>,
    },
    /// Render one template and print the result.
    Render {
        /// Template text, e.g. `"%03d"`.
        #[arg(long)]
        template: String,
        /// Typed argument: `i:<int>`, `u:<int>`, `s:<text>`, `c:<byte>`, `f:<float>`.
        #[arg(long = "arg")]
        args: Vec<String>,
        /// Render into a fixed buffer of this capacity instead.
        #[arg(long)]
        capacity: Option<usize>,
    },
}

fn main() -> Result<(), HarnessError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            report,
            log,
            seek_policy,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let sets = FixtureSet::load_all(&fixture)?;

            let mut config = StoreConfig::from_env();
            if let Some(policy) = seek_policy {
                config = config.with_seek_policy(SeekPolicy::from_str_loose(&policy));
            }

            let mut runner = TestRunner::new("fixture-verify").with_config(config);
            if let Some(path) = &log {
                let run_id = format!("run-{}", std::process::id());
                runner = runner.with_logger(LogEmitter::to_file(path, "harness", &run_id)?);
            }

            let mut results = Vec::new();
            for set in &sets {
                results.extend(runner.run(set));
            }
            if let Some(mut emitter) = runner.take_logger() {
                emitter.flush()?;
            }

            let report_doc = ConformanceReport {
                title: String::from("vstdio Conformance Report"),
                seek_policy: config.seek_policy.as_str().to_string(),
                timestamp: now_utc(),
                summary: VerificationSummary::from_results(results),
            };

            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
            );
            for failure in report_doc.summary.failures() {
                eprintln!("FAIL {}", failure.case_name);
                if let Some(diff) = &failure.diff {
                    eprint!("{diff}");
                }
            }

            if let Some(report_path) = report {
                eprintln!("Writing report to {}", report_path.display());
                std::fs::write(&report_path, report_doc.to_markdown())?;
                std::fs::write(report_path.with_extension("json"), report_doc.to_json())?;
            }

            if !report_doc.summary.all_passed() {
                return Err(HarnessError::Failed {
                    failed: report_doc.summary.failed,
                    total: report_doc.summary.total,
                });
            }
        }
        Command::Render {
            template,
            args,
            capacity,
        } => {
            let values = args
                .iter()
                .map(|a| a.parse::<ArgValue>())
                .collect::<Result<Vec<_>, _>>()?;
            let format_args: Vec<FormatArg<'_>> =
                values.iter().map(ArgValue::as_format_arg).collect();

            let mut stdout = std::io::stdout().lock();
            match capacity {
                Some(cap) => {
                    let mut dst = vec![0u8; cap];
                    let res = printf::format_to_buffer(&mut dst, template.as_bytes(), &format_args)?;
                    stdout.write_all(&dst[..res.written])?;
                    writeln!(stdout)?;
                    eprintln!("written={} full_len={}", res.written, res.full_len);
                }
                None => {
                    let out = printf::render(template.as_bytes(), &format_args)?;
                    stdout.write_all(&out)?;
                    writeln!(stdout)?;
                }
            }
        }
    }
    Ok(())
}
