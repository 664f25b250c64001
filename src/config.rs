//! Decoder configuration: engine arguments and model discovery.
//!
//! Engines in this family are configured with command-line style arguments (`-hmm <dir>`,
//! `-dict <file>`, `-lm <file>`, ...). `DecoderConfig` is the library-level representation of
//! that argument set. Callers build one programmatically, from an argument list, from an
//! argument file, or from JSON, and hand it to [`crate::Controller::open`].

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Arguments that select a search, in the order we report them.
pub const SEARCH_ARGUMENTS: [&str; 5] = ["-lm", "-jsgf", "-kws", "-keyphrase", "-fsg"];

/// Files an acoustic model (HMM) directory must contain.
const HMM_REQUIRED_FILES: [&str; 6] = [
    "feat.params",
    "mdef",
    "noisedict",
    "sendump",
    "transition_matrices",
    "variances",
];

/// Argument naming an extra file of arguments.
const ARGFILE: &str = "-argfile";

/// Typed value of an engine configuration argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    StringList(Vec<String>),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Integer(v) => write!(f, "{v}"),
            ConfigValue::Float(v) => write!(f, "{v}"),
            ConfigValue::Boolean(true) => f.write_str("yes"),
            ConfigValue::Boolean(false) => f.write_str("no"),
            ConfigValue::String(v) => f.write_str(v),
            ConfigValue::StringList(v) => f.write_str(&v.join(",")),
        }
    }
}

/// An ordered set of engine arguments.
///
/// Names keep their leading dash (`"-hmm"`). Setting an existing name replaces its value in
/// place, so rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    args: Vec<(String, String)>,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an argument list such as `["-hmm", "/models/en", "-lm", "/models/en.lm"]`.
    ///
    /// An `-argfile` argument is expanded in place; later arguments override earlier ones.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::new();
        let mut iter = args.into_iter();
        while let Some(name) = iter.next() {
            let name = name.as_ref();
            if !name.starts_with('-') {
                return Err(Error::Configuration(format!(
                    "expected an argument name starting with '-', got '{name}'"
                )));
            }
            let Some(value) = iter.next() else {
                return Err(Error::Configuration(format!(
                    "argument '{name}' is missing a value"
                )));
            };

            if name == ARGFILE {
                config.merge_arg_file(value.as_ref())?;
            } else {
                config.set_string(name, value.as_ref());
            }
        }
        Ok(config)
    }

    /// Load a JSON-serialized configuration.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Merge arguments from an argument file.
    ///
    /// The file holds whitespace-separated `-name value` pairs, any number per line; `#` starts
    /// a comment that runs to the end of the line.
    pub fn merge_arg_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            Error::Configuration(format!(
                "failed to read argument file '{}': {err}",
                path.display()
            ))
        })?;

        let mut tokens = contents
            .lines()
            .enumerate()
            .flat_map(|(line_no, line)| {
                let line = line.split('#').next().unwrap_or_default();
                line.split_whitespace().map(move |token| (line_no + 1, token))
            });
        while let Some((line_no, name)) = tokens.next() {
            let malformed = |reason: &str| {
                Error::Configuration(format!(
                    "malformed argument file '{}' at line {line_no}: {reason}",
                    path.display()
                ))
            };
            if !name.starts_with('-') {
                return Err(malformed(&format!(
                    "expected an argument name starting with '-', got '{name}'"
                )));
            }
            let Some((_, value)) = tokens.next() else {
                return Err(malformed(&format!("argument '{name}' is missing a value")));
            };
            self.set_string(name, value);
        }
        Ok(())
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.args.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.args.push((name.to_owned(), value)),
        }
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.args.iter().position(|(n, _)| n == name)?;
        Some(self.args.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.args.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Render as a flat argument vector for opening a session.
    pub fn to_args(&self) -> Vec<String> {
        self.args
            .iter()
            .flat_map(|(n, v)| [n.clone(), v.clone()])
            .collect()
    }

    /// Which search arguments carry a non-empty value, in [`SEARCH_ARGUMENTS`] order.
    pub fn search_arguments_set(&self) -> Vec<&'static str> {
        SEARCH_ARGUMENTS
            .into_iter()
            .filter(|arg| self.get_string(arg).is_some_and(|v| !v.is_empty()))
            .collect()
    }

    /// Find a language model under `model_path` and set `-lm`.
    ///
    /// Only files ending in `.lm` or `.lm.bin` are considered. Directories are walked top-down
    /// in name order; within a directory the first match counts, and a later directory with a
    /// match replaces it.
    pub fn set_lm_path(&mut self, model_path: impl AsRef<Path>) -> Result<()> {
        let model_path = model_path.as_ref();
        let lm_file = walk_dirs(model_path)
            .filter_map(|dir| {
                files_in(&dir)
                    .into_iter()
                    .find(|name| name.ends_with(".lm") || name.ends_with(".lm.bin"))
                    .map(|name| dir.join(name))
            })
            .last();

        let Some(lm_file) = lm_file else {
            return Err(Error::Configuration(format!(
                "could not find the language model file in '{}'. Please specify the '-lm' \
                 argument manually or use a different model path",
                model_path.display()
            )));
        };

        tracing::debug!(lm = %lm_file.display(), "found language model");
        self.set_string("-lm", lm_file.to_string_lossy());
        Ok(())
    }

    /// Find the acoustic model directory and pronunciation dictionary under `model_path` and
    /// set `-hmm` and `-dict`.
    ///
    /// Directories are walked as in [`DecoderConfig::set_lm_path`]; when several candidates
    /// exist, the last one walked wins.
    pub fn set_hmm_and_dict_paths(&mut self, model_path: impl AsRef<Path>) -> Result<()> {
        let model_path = model_path.as_ref();

        let dict_file = walk_dirs(model_path)
            .filter_map(|dir| {
                files_in(&dir)
                    .into_iter()
                    .filter(|name| name.ends_with(".dict"))
                    .last()
                    .map(|name| dir.join(name))
            })
            .last();

        let hmm_dir = walk_dirs(model_path).filter(|dir| is_hmm_dir(dir)).last();

        let (Some(hmm_dir), Some(dict_file)) = (hmm_dir, dict_file) else {
            return Err(Error::Configuration(format!(
                "could not find HMM directory and/or dictionary file in '{}'. Please specify \
                 '-hmm' and '-dict' config arguments manually or use a different model path",
                model_path.display()
            )));
        };

        tracing::debug!(
            hmm = %hmm_dir.display(),
            dict = %dict_file.display(),
            "found acoustic model and dictionary"
        );
        self.set_string("-hmm", hmm_dir.to_string_lossy());
        self.set_string("-dict", dict_file.to_string_lossy());
        Ok(())
    }
}

/// `root` and every directory below it, parents before children, siblings in name order.
fn walk_dirs(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
}

/// Names of the regular files directly inside `dir`, in name order.
fn files_in(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
        .collect()
}

fn is_hmm_dir(dir: &Path) -> bool {
    HMM_REQUIRED_FILES
        .iter()
        .all(|required| dir.join(required).is_file())
}
