//! `utterance`: an utterance-lifecycle controller for streaming speech decoders.
//!
//! This crate provides:
//! - A controller that turns a stream of audio chunks into engine start/end-of-utterance calls
//! - Result delivery through callbacks or return values
//! - Batch processing of recorded chunk sequences
//! - Search selection and engine configuration plumbing
//!
//! The decoding engine itself is a collaborator behind the [`DecoderSession`] trait; this crate
//! only guarantees that its one-shot utterance protocol is never violated.

// High-level API (most consumers should start here).
pub mod batch;
pub mod controller;

// Utterance boundaries and result delivery.
pub mod dispatch;
pub mod utterance;

// The engine seam.
pub mod search;
pub mod session;

// Audio input and decoder configuration.
pub mod audio;
pub mod config;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub mod error;

pub use audio::AudioChunk;
pub use controller::Controller;
pub use dispatch::{ControlHandle, DispatchMode, Outcome};
pub use error::{Error, Result};
pub use search::Search;
pub use session::DecoderSession;
pub use utterance::UtteranceState;
