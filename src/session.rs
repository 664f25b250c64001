use anyhow::Result;

use crate::config::ConfigValue;
use crate::search::Search;

/// Decoding engine driven by a [`crate::Controller`].
///
/// A session owns the native engine instance and its configuration. It knows nothing about
/// utterance boundaries beyond the start/end protocol below; the controller is responsible for
/// never violating that protocol:
/// - `start_utterance` is only called when no utterance is open
/// - `end_utterance` is only called when an utterance is open
/// - `feed_raw` is only called inside an open utterance
///
/// Failures are reported as `anyhow::Error`; the controller wraps them into
/// [`crate::Error::Engine`] together with the attempted operation.
pub trait DecoderSession {
    /// Feed mono 16-bit PCM samples into the live decode.
    fn feed_raw(&mut self, samples: &[i16]) -> Result<()>;

    /// Open a new utterance.
    fn start_utterance(&mut self) -> Result<()>;

    /// Finalize decoding of the open utterance.
    fn end_utterance(&mut self) -> Result<()>;

    /// Whether the most recently fed buffer contained speech.
    fn in_speech(&self) -> bool;

    /// Hypothesis for the utterance that was just ended.
    ///
    /// Only meaningful immediately after `end_utterance`. `None` for silence/noise-only
    /// utterances.
    fn hypothesis(&self) -> Option<String>;

    /// Name of the currently active search, if any.
    fn current_search_name(&self) -> Option<String>;

    /// Register (or replace) a search under `name` without activating it.
    fn add_search(&mut self, name: &str, search: &Search) -> Result<()>;

    /// Activate a previously registered search.
    fn set_search(&mut self, name: &str) -> Result<()>;

    /// Current value of a configuration argument, or `None` if the engine defines no argument
    /// with that name.
    fn config_value(&self, name: &str) -> Option<ConfigValue>;

    /// Set a configuration argument. Takes effect on the next `reinitialise`.
    fn set_config_value(&mut self, name: &str, value: &str) -> Result<()>;

    /// Rebuild the engine from its current configuration.
    ///
    /// Any open utterance is discarded by the engine.
    fn reinitialise(&mut self) -> Result<()>;
}
