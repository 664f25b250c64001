//! Result delivery.
//!
//! When an utterance ends, its hypothesis is either pushed to a registered callback or returned
//! to the caller, depending on the [`DispatchMode`]. The same split applies to the speech-start
//! notification, which never carries a value.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CallbackSlot;
use crate::{Error, Result};

/// Zero-argument notification fired when speech starts within an utterance.
pub type SpeechStartCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// One-argument notification fired with each finished utterance's hypothesis.
///
/// The argument is `None` when the engine recognized nothing (silence or noise).
pub type HypothesisCallback = Box<dyn FnMut(Option<&str>) -> anyhow::Result<()> + Send>;

/// How results are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Invoke registered callbacks; the operation itself yields [`Outcome::NoValue`].
    UseCallbacks,

    /// Never invoke callbacks; hypotheses are returned as [`Outcome::Hypothesis`].
    ReturnValue,
}

impl DispatchMode {
    pub fn from_use_callbacks(use_callbacks: bool) -> Self {
        if use_callbacks {
            DispatchMode::UseCallbacks
        } else {
            DispatchMode::ReturnValue
        }
    }
}

/// Result of feeding audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report: no utterance ended, or its result went to a callback.
    NoValue,

    /// An utterance ended in [`DispatchMode::ReturnValue`]; `None` if the engine produced no
    /// hypothesis for it.
    Hypothesis(Option<String>),
}

impl Outcome {
    pub fn is_no_value(&self) -> bool {
        matches!(self, Outcome::NoValue)
    }

    /// The recognized text, if an utterance ended with one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Hypothesis(text) => text.as_deref(),
            Outcome::NoValue => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Outcome::Hypothesis(text) => text,
            Outcome::NoValue => None,
        }
    }
}

/// The two callback slots, each either registered or unset.
#[derive(Default)]
pub struct Callbacks {
    speech_start: Option<SpeechStartCallback>,
    hypothesis: Option<HypothesisCallback>,
}

impl Callbacks {
    pub fn set_speech_start(&mut self, callback: SpeechStartCallback) {
        self.speech_start = Some(callback);
    }

    pub fn set_hypothesis(&mut self, callback: HypothesisCallback) {
        self.hypothesis = Some(callback);
    }

    pub fn clear_speech_start(&mut self) {
        self.speech_start = None;
    }

    pub fn clear_hypothesis(&mut self) {
        self.hypothesis = None;
    }

    pub fn has_speech_start(&self) -> bool {
        self.speech_start.is_some()
    }

    pub fn has_hypothesis(&self) -> bool {
        self.hypothesis.is_some()
    }

    /// Fire the speech-start notification if `mode` allows it and one is registered.
    pub(crate) fn notify_speech_start(&mut self, mode: DispatchMode) -> Result<()> {
        if mode != DispatchMode::UseCallbacks {
            return Ok(());
        }
        let Some(callback) = self.speech_start.as_mut() else {
            return Ok(());
        };
        callback().map_err(|err| Error::callback(CallbackSlot::SpeechStart, err))
    }

    /// Deliver a finished utterance's hypothesis according to `mode`.
    pub(crate) fn dispatch(
        &mut self,
        hypothesis: Option<String>,
        mode: DispatchMode,
    ) -> Result<Outcome> {
        match mode {
            DispatchMode::ReturnValue => Ok(Outcome::Hypothesis(hypothesis)),
            DispatchMode::UseCallbacks => {
                if let Some(callback) = self.hypothesis.as_mut() {
                    callback(hypothesis.as_deref())
                        .map_err(|err| Error::callback(CallbackSlot::Hypothesis, err))?;
                }
                Ok(Outcome::NoValue)
            }
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("speech_start", &self.has_speech_start())
            .field("hypothesis", &self.has_hypothesis())
            .finish()
    }
}

/// Lets callbacks (or other code holding a clone) ask the controller to force-end the current
/// utterance.
///
/// Requests are applied by the controller synchronously: right after the callback that made
/// them returns, and at the start of the next feed.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    end_requested: Arc<AtomicBool>,
}

impl ControlHandle {
    /// Request that the current utterance be ended without dispatching a result.
    pub fn end_utterance(&self) {
        self.end_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take_end_request(&self) -> bool {
        self.end_requested.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn return_mode_skips_callbacks() -> anyhow::Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::default();
        let sink = Arc::clone(&seen);
        callbacks.set_hypothesis(Box::new(move |hyp| {
            sink.lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push(hyp.map(str::to_owned));
            Ok(())
        }));

        let outcome = callbacks.dispatch(Some("go left".into()), DispatchMode::ReturnValue)?;
        assert_eq!(outcome.text(), Some("go left"));
        assert!(seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.is_empty());
        Ok(())
    }

    #[test]
    fn callback_mode_yields_no_value() -> anyhow::Result<()> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::default();
        let sink = Arc::clone(&seen);
        callbacks.set_hypothesis(Box::new(move |hyp| {
            sink.lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push(hyp.map(str::to_owned));
            Ok(())
        }));

        let outcome = callbacks.dispatch(None, DispatchMode::UseCallbacks)?;
        assert!(outcome.is_no_value());
        assert_eq!(
            *seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?,
            vec![None]
        );
        Ok(())
    }

    #[test]
    fn callback_mode_without_registration_is_no_value() -> anyhow::Result<()> {
        let mut callbacks = Callbacks::default();
        let outcome = callbacks.dispatch(Some("hello".into()), DispatchMode::UseCallbacks)?;
        assert_eq!(outcome, Outcome::NoValue);
        callbacks.notify_speech_start(DispatchMode::UseCallbacks)?;
        Ok(())
    }

    #[test]
    fn callback_failure_propagates() {
        let mut callbacks = Callbacks::default();
        callbacks.set_speech_start(Box::new(|| anyhow::bail!("caller bug")));

        let err = callbacks
            .notify_speech_start(DispatchMode::UseCallbacks)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Callback {
                slot: CallbackSlot::SpeechStart,
                ..
            }
        ));

        // Suppressed entirely outside callback mode.
        assert!(
            callbacks
                .notify_speech_start(DispatchMode::ReturnValue)
                .is_ok()
        );
    }

    #[test]
    fn control_handle_request_is_taken_once() {
        let handle = ControlHandle::default();
        let clone = handle.clone();
        assert!(!handle.take_end_request());
        clone.end_utterance();
        assert!(handle.take_end_request());
        assert!(!handle.take_end_request());
    }
}
