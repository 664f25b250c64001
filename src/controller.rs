//! High-level API for driving a decoder session through utterances.
//!
//! `Controller` sits between a stream of audio chunks and a [`DecoderSession`]. Per chunk it:
//! - opens an utterance on the engine if none is open
//! - feeds the samples
//! - reads the engine's voice-activity flag and takes the one transition it calls for
//!
//! Every feed issues at most one "start" and at most one "end" on the engine, and "end" is never
//! issued without an open utterance.

use tracing::{debug, trace, warn};

use crate::audio::AudioChunk;
use crate::config::{ConfigValue, DecoderConfig};
use crate::dispatch::{Callbacks, ControlHandle, DispatchMode, Outcome};
use crate::error::EngineOp;
use crate::search::{DEFAULT_SEARCH, Search};
use crate::session::DecoderSession;
use crate::utterance::{Transition, UtteranceState};
use crate::{Error, Result};

/// Owns one decoder session and its utterance lifecycle.
///
/// Typical usage:
/// - Construct once with a session (model loading happens in the session).
/// - Register callbacks, pick a search.
/// - Call `feed` for every captured chunk, or `process_batch` for a recorded sequence.
///
/// The session is exclusively owned; `close` tears it down, after which every operation that
/// needs it fails with [`Error::Configuration`].
pub struct Controller<S: DecoderSession> {
    session: Option<S>,
    state: UtteranceState,
    callbacks: Callbacks,
    active_search: Option<String>,
    control: ControlHandle,
}

impl<S: DecoderSession> Controller<S> {
    /// Take ownership of an already opened session.
    pub fn new(session: S) -> Self {
        let active_search = session.current_search_name();
        Self {
            session: Some(session),
            state: UtteranceState::Ended,
            callbacks: Callbacks::default(),
            active_search,
            control: ControlHandle::default(),
        }
    }

    /// Open a session from `config` using `opener`.
    ///
    /// `opener` receives the rendered argument vector (see [`DecoderConfig::to_args`]).
    pub fn open<F>(config: &DecoderConfig, opener: F) -> Result<Self>
    where
        F: FnOnce(&[String]) -> anyhow::Result<S>,
    {
        let args = config.to_args();
        let session = opener(&args).map_err(|err| {
            Error::Configuration(format!(
                "decoder couldn't be initialised. Is your configuration right? ({err:#})"
            ))
        })?;
        debug!(n_args = args.len(), "decoder session opened");
        Ok(Self::new(session))
    }

    /// Tear down the session and hand it back.
    ///
    /// The utterance state returns to `Ended`; no engine call is made.
    pub fn close(&mut self) -> Option<S> {
        self.state = UtteranceState::Ended;
        self.active_search = None;
        self.session.take()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Access the underlying session (read-only; engine calls go through the controller).
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn state(&self) -> UtteranceState {
        self.state
    }

    /// Whether the most recently fed chunk contained speech.
    pub fn in_speech(&self) -> Result<bool> {
        Ok(self.session_ref()?.in_speech())
    }

    /// Name of the active search, mirrored from the engine.
    pub fn active_search(&self) -> Option<&str> {
        self.active_search.as_deref()
    }

    /// A handle callbacks can use to force-end the current utterance.
    pub fn control_handle(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Register the speech-start notification, replacing any previous one.
    pub fn set_speech_start_callback<F>(&mut self, callback: F)
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.set_speech_start(Box::new(callback));
    }

    /// Register the hypothesis notification, replacing any previous one.
    pub fn set_hypothesis_callback<F>(&mut self, callback: F)
    where
        F: FnMut(Option<&str>) -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.set_hypothesis(Box::new(callback));
    }

    pub fn clear_speech_start_callback(&mut self) {
        self.callbacks.clear_speech_start();
    }

    pub fn clear_hypothesis_callback(&mut self) {
        self.callbacks.clear_hypothesis();
    }

    pub fn has_speech_start_callback(&self) -> bool {
        self.callbacks.has_speech_start()
    }

    pub fn has_hypothesis_callback(&self) -> bool {
        self.callbacks.has_hypothesis()
    }

    /// Feed one chunk, delivering any result through callbacks.
    pub fn feed(&mut self, chunk: &AudioChunk) -> Result<Outcome> {
        self.feed_with_mode(chunk, DispatchMode::UseCallbacks)
    }

    /// Feed one chunk and take whatever transition the engine's voice-activity flag calls for.
    ///
    /// Preconditions are checked before anything is touched: a missing session or an unset
    /// chunk leave all state as it was.
    ///
    /// Engine failures leave the state at the last boundary the engine actually crossed; a
    /// retried feed never repeats a start or end the engine already accepted. Callback failures
    /// are reported after their transition has been recorded, and win over a failure of an end
    /// the callback requested.
    pub fn feed_with_mode(&mut self, chunk: &AudioChunk, mode: DispatchMode) -> Result<Outcome> {
        self.session_ref()?;
        chunk.validate()?;

        self.apply_control_requests()?;

        if self.state == UtteranceState::Ended {
            self.session_mut()?
                .start_utterance()
                .map_err(|err| engine_failure(EngineOp::StartUtterance, err))?;
            self.state = UtteranceState::Idle;
            debug!("utterance opened");
        }

        let session = self.session_mut()?;
        session
            .feed_raw(chunk.samples())
            .map_err(|err| engine_failure(EngineOp::FeedRaw, err))?;
        let in_speech = session.in_speech();
        trace!(n_samples = chunk.len(), in_speech, state = ?self.state, "fed chunk");

        match self.state.step(in_speech) {
            Transition::Stay => Ok(Outcome::NoValue),
            Transition::SpeechStarted => {
                self.state = UtteranceState::InUtterance;
                debug!("speech started");
                let notified = self.callbacks.notify_speech_start(mode);
                let applied = self.apply_control_requests();
                notified.and(applied).map(|()| Outcome::NoValue)
            }
            Transition::UtteranceEnded => {
                let session = self.session_mut()?;
                session
                    .end_utterance()
                    .map_err(|err| engine_failure(EngineOp::EndUtterance, err))?;
                let hypothesis = session.hypothesis();
                self.state = UtteranceState::Ended;
                debug!(has_hypothesis = hypothesis.is_some(), "utterance ended");

                let dispatched = self.callbacks.dispatch(hypothesis, mode);
                let applied = self.apply_control_requests();
                dispatched.and_then(|outcome| applied.map(|()| outcome))
            }
        }
    }

    /// End the current utterance, if one is open, without retrieving or dispatching a result.
    ///
    /// Calling this with no open utterance is a no-op. Useful to reset processing after a
    /// context change (e.g. the user interrupted).
    pub fn end_utterance(&mut self) -> Result<()> {
        let open = self.state.is_open();
        let session = self.session_mut()?;
        if !open {
            return Ok(());
        }

        session
            .end_utterance()
            .map_err(|err| engine_failure(EngineOp::EndUtterance, err))?;
        self.state = UtteranceState::Ended;
        debug!("utterance ended by caller");
        Ok(())
    }

    /// Register `search` under `name` (default [`DEFAULT_SEARCH`]) and make it active.
    ///
    /// The active search mirror is resynchronised from the engine whether or not this succeeds.
    pub fn set_search(&mut self, search: &Search, name: Option<&str>) -> Result<()> {
        let name = name.unwrap_or(DEFAULT_SEARCH);
        let session = self.session_mut()?;

        let res = session
            .add_search(name, search)
            .map_err(|err| Error::engine_for_search(EngineOp::AddSearch, name, err))
            .and_then(|()| {
                session
                    .set_search(name)
                    .map_err(|err| Error::engine_for_search(EngineOp::SetSearch, name, err))
            });
        self.sync_active_search();

        match &res {
            Ok(()) => debug!(search = name, kind = search.kind(), "search set"),
            Err(err) => warn!(search = name, error = %err, "failed to set search"),
        }
        res
    }

    /// Switch to a search previously registered with [`Controller::set_search`].
    pub fn set_active_search(&mut self, name: &str) -> Result<()> {
        let res = self.session_mut()?.set_search(name).map_err(|err| {
            Error::engine_for_search(
                EngineOp::SetSearch,
                name,
                err.context("perhaps there isn't a search with that name?"),
            )
        });
        self.sync_active_search();
        res
    }

    /// Current value of an engine configuration argument.
    pub fn config_argument(&self, name: &str) -> Result<ConfigValue> {
        self.session_ref()?
            .config_value(name)
            .ok_or_else(|| Error::UnknownArgument(name.to_owned()))
    }

    /// Set an engine configuration argument, optionally rebuilding the engine so it takes
    /// effect.
    ///
    /// Reinitialising discards any open utterance, so the state returns to `Ended`.
    pub fn set_config_argument(
        &mut self,
        name: &str,
        value: &str,
        reinitialise: bool,
    ) -> Result<()> {
        let session = self.session_mut()?;
        if session.config_value(name).is_none() {
            return Err(Error::UnknownArgument(name.to_owned()));
        }

        session
            .set_config_value(name, value)
            .map_err(|err| engine_failure(EngineOp::SetConfig, err))?;

        if reinitialise {
            session
                .reinitialise()
                .map_err(|err| engine_failure(EngineOp::Reinitialise, err))?;
            self.state = UtteranceState::Ended;
            self.sync_active_search();
            debug!(argument = name, "decoder reinitialised");
        }
        Ok(())
    }

    fn apply_control_requests(&mut self) -> Result<()> {
        if self.control.take_end_request() {
            debug!("applying requested end of utterance");
            self.end_utterance()?;
        }
        Ok(())
    }

    fn sync_active_search(&mut self) {
        self.active_search = self
            .session
            .as_ref()
            .and_then(S::current_search_name);
    }

    fn session_ref(&self) -> Result<&S> {
        self.session.as_ref().ok_or_else(Error::no_session)
    }

    fn session_mut(&mut self) -> Result<&mut S> {
        self.session.as_mut().ok_or_else(Error::no_session)
    }
}

impl<S: DecoderSession> std::fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("has_session", &self.session.is_some())
            .field("state", &self.state)
            .field("callbacks", &self.callbacks)
            .field("active_search", &self.active_search)
            .finish()
    }
}

fn engine_failure(operation: EngineOp, err: anyhow::Error) -> Error {
    warn!(%operation, error = %format!("{err:#}"), "decoder engine call failed");
    Error::engine(operation, err)
}
