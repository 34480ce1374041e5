//! Harness error type.

use thiserror::Error;
use vstdio_core::StdioError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stdio: {0}")]
    Stdio(#[from] StdioError),
    #[error("invalid argument {0:?}: expected i:<int>, u:<int>, s:<text>, c:<byte> or f:<float>")]
    BadArg(String),
    #[error("no fixture JSON files found in {0}")]
    NoFixtures(String),
    #[error("verification failed: {failed} of {total} cases")]
    Failed { failed: usize, total: usize },
}
