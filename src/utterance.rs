//! Utterance boundary tracking.
//!
//! The engine's start/end-of-utterance protocol is one-shot: starting twice, or ending with no
//! open utterance, corrupts decoder state. `UtteranceState` records which side of a boundary we
//! are on, and `UtteranceState::step` maps a voice-activity observation to the single action
//! (if any) the controller must take.

/// Where the controller is in the current utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtteranceState {
    /// An utterance is open on the engine, but no speech has been observed in it yet.
    Idle,

    /// Speech has been observed; decoding is active.
    InUtterance,

    /// The most recent utterance was finalized (or none was ever started). The engine has no
    /// open utterance.
    #[default]
    Ended,
}

/// The action a voice-activity observation calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Nothing changes.
    Stay,

    /// `Idle -> InUtterance`: notify that speech started.
    SpeechStarted,

    /// `InUtterance -> Ended`: end the utterance and dispatch its hypothesis.
    UtteranceEnded,
}

impl UtteranceState {
    /// Whether the engine currently has an open utterance.
    pub fn is_open(self) -> bool {
        !matches!(self, UtteranceState::Ended)
    }

    /// Transition for an observation made inside an open utterance.
    ///
    /// `Ended` never reaches here: `feed` opens an utterance first.
    pub(crate) fn step(self, in_speech: bool) -> Transition {
        match (self, in_speech) {
            (UtteranceState::Idle, true) => Transition::SpeechStarted,
            (UtteranceState::InUtterance, false) => Transition::UtteranceEnded,
            _ => Transition::Stay,
        }
    }
}
