//! Test execution engine.

use std::collections::HashMap;

use serde_json::json;
use vstdio_core::log::{LogEmitter, LogEntry, LogLevel};
use vstdio_core::{FormatArg, Result as StdioResult, Stdio, StdioError, StoreConfig, StreamHandle};

use crate::diff;
use crate::fixtures::{ArgValue, FixtureCase, FixtureSet, Step};
use crate::verify::VerificationResult;

/// Runs a fixture set and collects verification results.
#[derive(Debug)]
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Store configuration every case runs under.
    pub config: StoreConfig,
    log: Option<LogEmitter>,
}

impl TestRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            config: StoreConfig::default(),
            log: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Log case boundaries and every stream event to `log`.
    #[must_use]
    pub fn with_logger(mut self, log: LogEmitter) -> Self {
        self.log = Some(log);
        self
    }

    /// Give back the logger, e.g. to flush it.
    pub fn take_logger(&mut self) -> Option<LogEmitter> {
        self.log.take()
    }

    /// Run all cases in a set and return results.
    pub fn run(&mut self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .map(|case| self.run_case(case))
            .collect()
    }

    fn run_case(&mut self, case: &FixtureCase) -> VerificationResult {
        let mut io = Stdio::with_config(self.config);
        if let Some(log) = self.log.take() {
            io = io.with_logger(log);
        }
        emit(&mut io, LogLevel::Info, "case_start", &self.campaign, case, None);

        let mut actual = execute_case(&mut io, case);
        actual.extend(check_contents(&io, case));

        let mut expected = case.expect.clone();
        expected.extend(
            case.expected_contents
                .iter()
                .map(|(name, content)| format!("contents {name}: {content}")),
        );

        let passed = actual == expected;
        emit(
            &mut io,
            if passed { LogLevel::Info } else { LogLevel::Error },
            "case_end",
            &self.campaign,
            case,
            Some(passed),
        );
        self.log = io.take_logger();

        VerificationResult {
            case_name: case.name.clone(),
            reference: case.reference.clone(),
            passed,
            diff: (!passed).then(|| diff::render_diff(&expected, &actual)),
            expected,
            actual,
        }
    }
}

fn emit(
    io: &mut Stdio,
    level: LogLevel,
    event: &str,
    campaign: &str,
    case: &FixtureCase,
    passed: Option<bool>,
) {
    let Some(log) = io.logger_mut() else {
        return;
    };
    let mut details = json!({ "campaign": campaign, "case": case.name });
    if let Some(passed) = passed {
        details["passed"] = json!(passed);
    }
    let _ = log.emit_entry(LogEntry::new("", level, event).with_details(details));
}

/// Run every step, producing one outcome string per step.
fn execute_case(io: &mut Stdio, case: &FixtureCase) -> Vec<String> {
    let mut handles: HashMap<String, StreamHandle> = HashMap::new();
    case.steps
        .iter()
        .map(|step| outcome(execute_step(io, &mut handles, step)))
        .collect()
}

fn execute_step(
    io: &mut Stdio,
    handles: &mut HashMap<String, StreamHandle>,
    step: &Step,
) -> StdioResult<String, StepError> {
    match step {
        Step::Install { name, content } => {
            io.store().install(name, content.as_bytes());
            Ok(String::new())
        }
        Step::Open { handle, name, mode } => {
            let h = io.fopen(name, mode)?;
            handles.insert(handle.clone(), h);
            Ok(String::new())
        }
        Step::Close { handle } => {
            io.fclose(lookup(handles, handle)?)?;
            Ok(String::new())
        }
        Step::Read { handle, count } => {
            let h = lookup(handles, handle)?;
            // Never allocate more than the stream could hand back.
            let available = h.len().unwrap_or(0);
            let mut dst = vec![0u8; (*count).min(available)];
            let n = io.fread(h, &mut dst)?;
            Ok(escape(&dst[..n]))
        }
        Step::Write { handle, data } => {
            let n = io.fwrite(lookup(handles, handle)?, data.as_bytes())?;
            Ok(n.to_string())
        }
        Step::Seek {
            handle,
            origin,
            offset,
        } => {
            let pos = io.fseek(lookup(handles, handle)?, (*origin).into(), *offset)?;
            Ok(pos.to_string())
        }
        Step::Tell { handle } => {
            let pos = io.ftell(lookup(handles, handle)?)?;
            Ok(pos.to_string())
        }
        Step::Printf {
            handle,
            template,
            args,
        } => {
            let args = to_format_args(args);
            let n = match handle {
                Some(label) => io.fprintf(lookup(handles, label)?, template.as_bytes(), &args)?,
                None => io.printf(template.as_bytes(), &args)?,
            };
            Ok(n.to_string())
        }
        Step::Snprintf {
            capacity,
            template,
            args,
        } => {
            let args = to_format_args(args);
            let mut dst = vec![0u8; *capacity];
            let res = io.snprintf(&mut dst, template.as_bytes(), &args)?;
            Ok(format!("{}|{}", escape(&dst[..res.written]), res.full_len))
        }
        Step::Puts { text } => Ok(io.puts(text)?.to_string()),
        Step::Stdout => Ok(escape(&io.take_stdout())),
    }
}

/// Why a step produced an `err:` outcome.
enum StepError {
    Stdio(StdioError),
    UnknownHandle,
}

impl From<StdioError> for StepError {
    fn from(err: StdioError) -> Self {
        Self::Stdio(err)
    }
}

fn lookup<'h>(
    handles: &'h mut HashMap<String, StreamHandle>,
    label: &str,
) -> StdioResult<&'h mut StreamHandle, StepError> {
    handles.get_mut(label).ok_or(StepError::UnknownHandle)
}

fn to_format_args(args: &[ArgValue]) -> Vec<FormatArg<'_>> {
    args.iter().map(ArgValue::as_format_arg).collect()
}

fn outcome(result: StdioResult<String, StepError>) -> String {
    match result {
        Ok(value) if value.is_empty() => String::from("ok"),
        Ok(value) => format!("ok:{value}"),
        Err(StepError::Stdio(err)) => format!("err:{}", err.kind_name()),
        Err(StepError::UnknownHandle) => String::from("err:UnknownHandle"),
    }
}

fn check_contents(io: &Stdio, case: &FixtureCase) -> Vec<String> {
    case.expected_contents
        .keys()
        .map(|name| {
            let content = io
                .store()
                .contents(name)
                .map_or_else(|| String::from("<missing>"), |c| escape(&c));
            format!("contents {name}: {content}")
        })
        .collect()
}

/// ASCII-escape a byte payload for outcome strings.
#[must_use]
pub fn escape(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vstdio_core::log::validate_log_line;

    fn fixture(json: &str) -> FixtureSet {
        FixtureSet::from_json(json).expect("valid fixture json")
    }

    #[test]
    fn runner_executes_stream_case() {
        let set = fixture(
            r#"{
                "version":"v1",
                "family":"stdio/stream",
                "cases":[{
                    "name":"overwrite",
                    "reference":"C11 7.21.9.2",
                    "steps":[
                        {"op":"install","name":"f","content":"0123456789"},
                        {"op":"open","handle":"h","name":"f","mode":"r+"},
                        {"op":"seek","handle":"h","origin":"set","offset":4},
                        {"op":"write","handle":"h","data":"AB"},
                        {"op":"tell","handle":"h"},
                        {"op":"seek","handle":"h","origin":"end","offset":1},
                        {"op":"read","handle":"h","count":3}
                    ],
                    "expect":["ok","ok","ok:4","ok:2","ok:6","err:OutOfBounds","ok:678"],
                    "expected_contents":{"f":"0123AB6789"}
                }]
            }"#,
        );
        let results = TestRunner::new("unit").run(&set);
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].diff);
        assert!(results[0].diff.is_none());
    }

    #[test]
    fn runner_reports_mismatch_with_diff() {
        let set = fixture(
            r#"{
                "version":"v1",
                "family":"stdio/printf",
                "cases":[{
                    "name":"wrong",
                    "reference":"C11 7.21.6.1",
                    "steps":[{"op":"snprintf","capacity":5,"template":"%s-%d","args":[{"s":"testing"},{"i":123}]}],
                    "expect":["ok:test|4"]
                }]
            }"#,
        );
        let results = TestRunner::new("unit").run(&set);
        assert!(!results[0].passed);
        assert_eq!(results[0].actual, vec!["ok:test|11"]);
        assert!(results[0].diff.as_ref().unwrap().contains("+ok:test|11"));
    }

    #[test]
    fn unknown_handle_is_an_outcome() {
        let set = fixture(
            r#"{
                "version":"v1",
                "family":"stdio/stream",
                "cases":[{
                    "name":"nohandle",
                    "reference":"-",
                    "steps":[{"op":"tell","handle":"ghost"}],
                    "expect":["err:UnknownHandle"]
                }]
            }"#,
        );
        assert!(TestRunner::new("unit").run(&set)[0].passed);
    }

    #[test]
    fn runner_logs_case_boundaries_and_errors() {
        let set = fixture(
            r#"{
                "version":"v1",
                "family":"stdio/stream",
                "cases":[{
                    "name":"missing",
                    "reference":"C11 7.21.5.3",
                    "steps":[{"op":"open","handle":"h","name":"nope","mode":"r"}],
                    "expect":["err:NotFound"]
                }]
            }"#,
        );
        let (emitter, buffer) = LogEmitter::in_memory("harness", "run-1");
        let mut runner = TestRunner::new("unit").with_logger(emitter);
        assert!(runner.run(&set)[0].passed);
        assert!(runner.take_logger().is_some());

        let events: Vec<String> = buffer
            .lines()
            .iter()
            .enumerate()
            .map(|(i, l)| validate_log_line(l, i + 1).unwrap().event)
            .collect();
        assert_eq!(events, vec!["case_start", "error", "case_end"]);
    }

    #[test]
    fn oversized_read_count_is_capped() {
        let set = fixture(
            r#"{
                "version":"v1",
                "family":"stdio/stream",
                "cases":[{
                    "name":"huge_read",
                    "reference":"C11 7.21.8.1",
                    "steps":[
                        {"op":"install","name":"f","content":"abc"},
                        {"op":"open","handle":"h","name":"f","mode":"r"},
                        {"op":"read","handle":"h","count":18446744073709551615},
                        {"op":"open","handle":"w","name":"g","mode":"w"},
                        {"op":"read","handle":"w","count":18446744073709551615},
                        {"op":"close","handle":"h"},
                        {"op":"read","handle":"h","count":18446744073709551615}
                    ],
                    "expect":["ok","ok","ok:abc","ok","err:ModeViolation","ok","err:Closed"]
                }]
            }"#,
        );
        let results = TestRunner::new("unit").run(&set);
        assert!(results[0].passed, "{:?}", results[0].diff);
    }

    #[test]
    fn escape_is_ascii() {
        assert_eq!(escape(b"a\nb\t\x01"), "a\\nb\\t\\x01");
    }
}
