//! Question/answer sessions over one uploaded filing
//!
//! Parses filing metadata from the upload's filename, provisions the
//! knowledge store and agent on the back end, and drives each question
//! through the run lifecycle, dispatching tool calls along the way.

use finsight_agents::{BackendError, RunStatus};
use finsight_docintel::DocIntelError;
use thiserror::Error;

pub mod filing;
pub mod instructions;
pub mod provision;
pub mod session;

pub use filing::FilingMeta;
pub use session::{FilingSession, RunConfig};

/// Errors raised while provisioning or answering
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("document analysis error: {0}")]
    DocIntel(#[from] DocIntelError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "invalid filename '{0}', expected <ticker>--<form>--<date>_<timestamp>.<extension>"
    )]
    BadFileName(String),

    #[error("file extension '{0}' is not supported")]
    UnsupportedFile(String),

    #[error("document analysis endpoint or api key is not configured")]
    MissingDocIntel,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("run ended with status {status}")]
    RunFailed { status: RunStatus },

    #[error("run did not reach a terminal status within the poll budget")]
    PollBudgetExhausted,

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SessionError>;
