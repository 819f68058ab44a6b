use crate::error::{Error, Result};
use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::path::Path;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

pub const DEFAULT_CORPUS: &str = "english";

/// Characters of headroom per minute of test: 240 wpm at 5 chars/word.
pub const CHARS_PER_MINUTE_BUDGET: f64 = 1200.0;

/// A named set of text excerpts to draw sample text from
#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    pub excerpts: Vec<String>,
}

impl Corpus {
    /// Build a corpus, dropping blank excerpts. Fails if nothing usable remains.
    pub fn new(name: impl Into<String>, excerpts: Vec<String>) -> Result<Self> {
        let name = name.into();
        let excerpts: Vec<String> = excerpts
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        if excerpts.is_empty() {
            return Err(Error::EmptyCorpus(name));
        }

        Ok(Self { name, excerpts })
    }

    pub fn builtin(name: &str) -> Result<Self> {
        let file = CORPUS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| Error::UnknownCorpus(name.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| Error::EmptyCorpus(name.to_string()))?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Corpus = serde_json::from_str(json)?;
        Self::new(raw.name, raw.excerpts)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// Number of characters a test of `duration_secs` must offer so the typist
/// never runs out of text before the timer does.
pub fn char_budget(duration_secs: u32) -> usize {
    (duration_secs as f64 / 60.0 * CHARS_PER_MINUTE_BUDGET).ceil() as usize
}

/// Builds target text by joining randomly chosen corpus excerpts
pub struct TextGenerator {
    corpus: Corpus,
    rng: StdRng,
}

impl TextGenerator {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            corpus,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(corpus: Corpus, seed: u64) -> Self {
        Self {
            corpus,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate text at least `char_budget(duration_secs)` code points long.
    /// May overshoot by up to one excerpt.
    pub fn generate(&mut self, duration_secs: u32) -> String {
        let budget = char_budget(duration_secs);
        let mut text = String::new();
        let mut len = 0;

        while len < budget {
            let Some(excerpt) = self.corpus.excerpts.choose(&mut self.rng) else {
                break;
            };
            if !text.is_empty() {
                text.push(' ');
                len += 1;
            }
            text.push_str(excerpt);
            len += excerpt.chars().count();
        }

        tracing::debug!(
            corpus = %self.corpus.name,
            duration_secs,
            budget,
            generated = len,
            "generated target text"
        );

        text
    }
}
