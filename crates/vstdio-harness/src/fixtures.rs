//! Fixture loading and management.
//!
//! A fixture case is a script of [`Step`]s run against a fresh context,
//! paired with the outcome string expected from each step. Outcomes are
//! `ok:<value>`, plain `ok` when there is no value (or an empty payload),
//! or `err:<ErrorKind>`. Byte payloads are written with ASCII escapes
//! (`\n`, `\t`, `\xNN`).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vstdio_core::{FormatArg, Whence};

use crate::error::HarnessError;

/// One typed renderer argument, e.g. `{"i": 33}` or `{"s": "E1M1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgValue {
    I(i64),
    U(u64),
    S(String),
    C(u8),
    F(f64),
}

impl ArgValue {
    #[must_use]
    pub fn as_format_arg(&self) -> FormatArg<'_> {
        match self {
            Self::I(v) => FormatArg::Signed(*v),
            Self::U(v) => FormatArg::Unsigned(*v),
            Self::S(s) => FormatArg::Str(s.as_bytes()),
            Self::C(c) => FormatArg::Char(*c),
            Self::F(v) => FormatArg::Float(*v),
        }
    }
}

/// CLI form: `i:-5`, `u:7`, `s:text`, `c:A`, `f:1.5`.
impl FromStr for ArgValue {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || HarnessError::BadArg(s.to_string());
        let (tag, value) = s.split_once(':').ok_or_else(bad)?;
        match tag {
            "i" => value.parse().map(Self::I).map_err(|_| bad()),
            "u" => value.parse().map(Self::U).map_err(|_| bad()),
            "s" => Ok(Self::S(value.to_string())),
            "c" => match value.as_bytes() {
                [c] => Ok(Self::C(*c)),
                _ => Err(bad()),
            },
            "f" => value.parse().map(Self::F).map_err(|_| bad()),
            _ => Err(bad()),
        }
    }
}

/// Seek origin as written in fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Set,
    Cur,
    End,
}

impl From<Origin> for Whence {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Set => Self::Start,
            Origin::Cur => Self::Current,
            Origin::End => Self::End,
        }
    }
}

/// One scripted operation. Handles are referred to by a fixture-local label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Seed a named stream. Outcome `ok`.
    Install { name: String, content: String },
    /// Outcome `ok` or `err:<kind>`.
    Open {
        handle: String,
        name: String,
        mode: String,
    },
    Close { handle: String },
    /// Outcome `ok:<bytes read>`.
    Read { handle: String, count: usize },
    /// Outcome `ok:<count written>`.
    Write { handle: String, data: String },
    /// Outcome `ok:<new cursor>`.
    Seek {
        handle: String,
        origin: Origin,
        offset: i64,
    },
    /// Outcome `ok:<cursor>`.
    Tell { handle: String },
    /// Render to a handle, or to stdout when `handle` is absent.
    /// Outcome `ok:<count written>`.
    Printf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handle: Option<String>,
        template: String,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
    /// Outcome `ok:<stored text>|<full length>`.
    Snprintf {
        capacity: usize,
        template: String,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
    /// Outcome `ok:<count written>`.
    Puts { text: String },
    /// Drain stdout. Outcome `ok:<captured>`.
    Stdout,
}

/// A single fixture test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// C11/POSIX section the behaviour mirrors.
    pub reference: String,
    pub steps: Vec<Step>,
    /// One outcome per step.
    pub expect: Vec<String>,
    /// Final stream contents to check after all steps, escaped.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expected_contents: BTreeMap<String, String>,
}

/// A collection of fixture cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Area under test (`stdio/stream`, `stdio/printf`, ...).
    pub family: String,
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Load every `*.json` set in `path` (sorted), or `path` itself if it is
    /// a file.
    pub fn load_all(path: &Path) -> Result<Vec<Self>, HarnessError> {
        if path.is_file() {
            return Ok(vec![Self::from_file(path)?]);
        }
        let mut paths: Vec<_> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(HarnessError::NoFixtures(path.display().to_string()));
        }
        paths.iter().map(|p| Self::from_file(p)).collect()
    }
}
