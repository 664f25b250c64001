use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error carried by [`Error::Engine`] and [`Error::Callback`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. Collaborators (sessions, callbacks) still report
/// failures as `anyhow::Error`; the controller wraps them here with the attempted operation.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable decoder session (never opened, torn down, or could not be opened), or the
    /// model files a configuration needs could not be found.
    #[error("{0}")]
    Configuration(String),

    /// An unset or malformed audio chunk.
    #[error("invalid audio input: {0}")]
    InvalidInput(String),

    /// The decoding engine rejected an operation.
    #[error("decoder engine failed to {operation}{}", search_suffix(.search))]
    Engine {
        operation: EngineOp,
        search: Option<String>,
        #[source]
        source: BoxError,
    },

    /// A registered callback returned an error.
    #[error("{slot} callback failed")]
    Callback {
        slot: CallbackSlot,
        #[source]
        source: BoxError,
    },

    /// The engine defines no configuration argument with this name.
    #[error("there is no decoder configuration argument with the name '{0}'")]
    UnknownArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn no_session() -> Self {
        Self::Configuration("controller has no decoder session".to_owned())
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn engine(operation: EngineOp, err: anyhow::Error) -> Self {
        Self::Engine {
            operation,
            search: None,
            source: err.into(),
        }
    }

    pub(crate) fn engine_for_search(
        operation: EngineOp,
        search: impl Into<String>,
        err: anyhow::Error,
    ) -> Self {
        Self::Engine {
            operation,
            search: Some(search.into()),
            source: err.into(),
        }
    }

    pub(crate) fn callback(slot: CallbackSlot, err: anyhow::Error) -> Self {
        Self::Callback {
            slot,
            source: err.into(),
        }
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => Self::Io(io),
            other => Self::InvalidInput(format!("failed to read WAV data: {other}")),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("failed to parse decoder configuration: {err}"))
    }
}

fn search_suffix(search: &Option<String>) -> String {
    match search {
        Some(name) => format!(" (search '{name}')"),
        None => String::new(),
    }
}

/// Session operations the controller issues, named in [`Error::Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOp {
    FeedRaw,
    StartUtterance,
    EndUtterance,
    AddSearch,
    SetSearch,
    SetConfig,
    Reinitialise,
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            EngineOp::FeedRaw => "feed raw audio",
            EngineOp::StartUtterance => "start an utterance",
            EngineOp::EndUtterance => "end the utterance",
            EngineOp::AddSearch => "add a search",
            EngineOp::SetSearch => "set the active search",
            EngineOp::SetConfig => "set a configuration argument",
            EngineOp::Reinitialise => "reinitialise",
        };
        f.write_str(op)
    }
}

/// The two callback slots a controller exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSlot {
    SpeechStart,
    Hypothesis,
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackSlot::SpeechStart => f.write_str("speech start"),
            CallbackSlot::Hypothesis => f.write_str("hypothesis"),
        }
    }
}
