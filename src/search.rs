use std::fmt;
use std::path::PathBuf;

/// Search name used when callers don't provide one.
pub const DEFAULT_SEARCH: &str = "_default";

/// A decoding search configuration the engine can switch between.
///
/// Setting a search under an already used name replaces that search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    /// JSpeech Grammar Format grammar file.
    JsgfFile(PathBuf),

    /// JSpeech Grammar Format grammar source.
    JsgfString(String),

    /// Statistical language model file.
    LmFile(PathBuf),

    /// Finite state grammar file.
    FsgFile(PathBuf),

    /// A single keyphrase to listen for.
    Keyphrase(String),

    /// A file of keyphrases (one per line) to listen for.
    KeyphrasesFile(PathBuf),
}

impl Search {
    /// Short label for the kind of search, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Search::JsgfFile(_) => "jsgf-file",
            Search::JsgfString(_) => "jsgf-string",
            Search::LmFile(_) => "lm-file",
            Search::FsgFile(_) => "fsg-file",
            Search::Keyphrase(_) => "keyphrase",
            Search::KeyphrasesFile(_) => "keyphrases-file",
        }
    }
}

impl fmt::Display for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Search::JsgfFile(path)
            | Search::LmFile(path)
            | Search::FsgFile(path)
            | Search::KeyphrasesFile(path) => write!(f, "{} {}", self.kind(), path.display()),
            Search::JsgfString(_) => f.write_str(self.kind()),
            Search::Keyphrase(phrase) => write!(f, "{} '{}'", self.kind(), phrase),
        }
    }
}
