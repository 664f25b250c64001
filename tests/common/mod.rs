#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};

use anyhow::{Result, anyhow, bail, ensure};
use utterance::config::ConfigValue;
use utterance::{AudioChunk, DecoderSession, Search};

/// Samples louder than this count as speech.
const SPEECH_LEVEL: i16 = 1_000;

/// Every engine call the scripted session saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    Feed(usize),
    End,
    AddSearch(String),
    SetSearch(String),
    SetConfig(String, String),
    Reinitialise,
}

/// In-memory decoding engine for tests.
///
/// Voice activity is decided by sample level, and hypotheses are popped from a queue each time
/// an utterance ends. The session refuses (and counts) any call that breaks the engine's
/// start/end protocol.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    pub calls: Vec<Call>,
    pub violations: usize,
    hypotheses: VecDeque<Option<String>>,
    last_hypothesis: Option<String>,
    open: bool,
    in_speech: bool,
    feeds: usize,
    fail_feed_at: Option<usize>,
    fail_start: bool,
    fail_end: bool,
    searches: HashMap<String, Search>,
    current_search: Option<String>,
    config: BTreeMap<String, ConfigValue>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        let mut config = BTreeMap::new();
        config.insert("-samprate".to_owned(), ConfigValue::Float(16_000.0));
        config.insert("-lw".to_owned(), ConfigValue::Float(6.5));
        config.insert("-maxwpf".to_owned(), ConfigValue::Integer(-1));
        config.insert("-bestpath".to_owned(), ConfigValue::Boolean(true));
        config.insert("-hmm".to_owned(), ConfigValue::String(String::new()));

        let mut searches = HashMap::new();
        searches.insert(
            "_default".to_owned(),
            Search::LmFile("/models/en-us.lm.bin".into()),
        );

        Self {
            config,
            searches,
            current_search: Some("_default".to_owned()),
            ..Self::default()
        }
    }

    /// Queue hypotheses for upcoming utterance ends, in order.
    pub fn with_hypotheses<I>(mut self, hypotheses: I) -> Self
    where
        I: IntoIterator<Item = Option<&'static str>>,
    {
        self.hypotheses
            .extend(hypotheses.into_iter().map(|h| h.map(str::to_owned)));
        self
    }

    /// Fail the `n`th (zero-based) `feed_raw` call.
    pub fn failing_feed_at(mut self, n: usize) -> Self {
        self.fail_feed_at = Some(n);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_end(mut self) -> Self {
        self.fail_end = true;
        self
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn feeds(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Feed(_)))
            .count()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl DecoderSession for ScriptedSession {
    fn feed_raw(&mut self, samples: &[i16]) -> Result<()> {
        if !self.open {
            self.violations += 1;
            bail!("audio fed outside an utterance");
        }
        let n = self.feeds;
        self.feeds += 1;
        if self.fail_feed_at == Some(n) {
            bail!("scripted feed failure");
        }
        self.calls.push(Call::Feed(samples.len()));
        self.in_speech = samples.iter().any(|s| s.unsigned_abs() > SPEECH_LEVEL as u16);
        Ok(())
    }

    fn start_utterance(&mut self) -> Result<()> {
        if self.fail_start {
            bail!("scripted start failure");
        }
        if self.open {
            self.violations += 1;
            bail!("utterance already started");
        }
        self.calls.push(Call::Start);
        self.open = true;
        self.in_speech = false;
        Ok(())
    }

    fn end_utterance(&mut self) -> Result<()> {
        if self.fail_end {
            bail!("scripted end failure");
        }
        if !self.open {
            self.violations += 1;
            bail!("no utterance to end");
        }
        self.calls.push(Call::End);
        self.open = false;
        self.last_hypothesis = self.hypotheses.pop_front().flatten();
        Ok(())
    }

    fn in_speech(&self) -> bool {
        self.in_speech
    }

    fn hypothesis(&self) -> Option<String> {
        self.last_hypothesis.clone()
    }

    fn current_search_name(&self) -> Option<String> {
        self.current_search.clone()
    }

    fn add_search(&mut self, name: &str, search: &Search) -> Result<()> {
        self.calls.push(Call::AddSearch(name.to_owned()));
        if let Search::Keyphrase(phrase) = search {
            ensure!(!phrase.trim().is_empty(), "empty keyphrase");
        }
        self.searches.insert(name.to_owned(), search.clone());
        Ok(())
    }

    fn set_search(&mut self, name: &str) -> Result<()> {
        self.calls.push(Call::SetSearch(name.to_owned()));
        ensure!(self.searches.contains_key(name), "no search named '{name}'");
        self.current_search = Some(name.to_owned());
        Ok(())
    }

    fn config_value(&self, name: &str) -> Option<ConfigValue> {
        self.config.get(name).cloned()
    }

    fn set_config_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.calls
            .push(Call::SetConfig(name.to_owned(), value.to_owned()));
        let slot = self
            .config
            .get_mut(name)
            .ok_or_else(|| anyhow!("unknown argument '{name}'"))?;
        *slot = match &*slot {
            ConfigValue::Integer(_) => ConfigValue::Integer(value.parse()?),
            ConfigValue::Float(_) => ConfigValue::Float(value.parse()?),
            ConfigValue::Boolean(_) => match value {
                "yes" | "true" => ConfigValue::Boolean(true),
                "no" | "false" => ConfigValue::Boolean(false),
                other => bail!("not a boolean: '{other}'"),
            },
            ConfigValue::String(_) => ConfigValue::String(value.to_owned()),
            ConfigValue::StringList(_) => {
                ConfigValue::StringList(value.split(',').map(str::to_owned).collect())
            }
        };
        Ok(())
    }

    fn reinitialise(&mut self) -> Result<()> {
        self.calls.push(Call::Reinitialise);
        self.open = false;
        self.in_speech = false;
        Ok(())
    }
}

pub fn speech() -> AudioChunk {
    AudioChunk::new(vec![4_000; 160])
}

pub fn silence() -> AudioChunk {
    AudioChunk::new(vec![0; 160])
}

/// Chunks that complete one utterance per `(speech, silence)` pair.
pub fn utterances(n: usize) -> Vec<AudioChunk> {
    (0..n).flat_map(|_| [speech(), silence()]).collect()
}
