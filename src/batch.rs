use tracing::debug;

use crate::audio::AudioChunk;
use crate::controller::Controller;
use crate::dispatch::{DispatchMode, Outcome};
use crate::session::DecoderSession;
use crate::Result;

impl<S: DecoderSession> Controller<S> {
    /// Feed an ordered sequence of chunks.
    ///
    /// Chunks are fed strictly in order. The first failing chunk stops the batch and its error
    /// is returned; chunks after it are never fed, and progress already made on the session is
    /// kept.
    ///
    /// Result:
    /// - `use_callbacks == true`: [`Outcome::NoValue`]; every result went to the callbacks.
    /// - `use_callbacks == false`: the *last* chunk's outcome. Results of earlier chunks are
    ///   computed and dropped, so a batch reports the utterance its final chunk completed.
    /// - An empty batch is [`Outcome::NoValue`].
    pub fn process_batch<'a, I>(&mut self, chunks: I, use_callbacks: bool) -> Result<Outcome>
    where
        I: IntoIterator<Item = &'a AudioChunk>,
    {
        let mode = DispatchMode::from_use_callbacks(use_callbacks);
        let mut last = Outcome::NoValue;
        let mut n_fed = 0usize;

        for chunk in chunks {
            last = self.feed_with_mode(chunk, mode).inspect_err(|err| {
                debug!(chunk = n_fed, error = %err, "batch stopped");
            })?;
            n_fed += 1;
        }

        debug!(n_chunks = n_fed, ?mode, "batch processed");
        match mode {
            DispatchMode::UseCallbacks => Ok(Outcome::NoValue),
            DispatchMode::ReturnValue => Ok(last),
        }
    }
}
