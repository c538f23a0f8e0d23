use anyhow::{anyhow, Result};
use log::{debug, info};
use rustfst::prelude::*;
use std::fmt;
use std::io::prelude::*;
use std::str::FromStr;
use std::sync::Arc;

use crate::model::{ArpaReader, NGramEntry};
use crate::symbols::StateTable;
use crate::{LmError, StdVectorFst};

/// Weight of the arc into the start symbol state.  It only exists so
/// that the initial state is state 0, and should never be taken.
pub const START_ARC_WEIGHT: f32 = 1000000.0;

/// How bigram backoff arcs are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// Bigram states back off to the unigram state and also directly
    /// to the null state, so a trigram history can skip the bigram
    /// level (possibly counting the backoff twice).
    #[default]
    Once,
    /// Bigram states back off only to the unigram state.
    Twice,
}

impl fmt::Display for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackoffPolicy::Once => "once",
            BackoffPolicy::Twice => "twice",
        })
    }
}

impl FromStr for BackoffPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "once" => Ok(BackoffPolicy::Once),
            "twice" => Ok(BackoffPolicy::Twice),
            _ => Err(anyhow!("unknown backoff policy {:?} (expected once or twice)", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MakerConfig {
    /// Sentence start symbol
    pub start_symbol: String,
    /// Sentence end symbol
    pub end_symbol: String,
    /// Bigram backoff arcs
    pub backoff: BackoffPolicy,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            start_symbol: "<s>".to_string(),
            end_symbol: "</s>".to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Build an FST from the entries of a backoff N-Gram model (up to trigrams).
///
/// States are words (unigram histories) and bigram contexts, plus the
/// initial state 0 and a null backoff state.  Backoff is represented
/// with epsilon arcs.
#[derive(Debug)]
pub struct NGramFstMaker {
    config: MakerConfig,
    /// Words and contexts to state IDs
    states: StateTable,
    /// Arc labels
    syms: SymbolTable,
    fst: StdVectorFst,
}

impl NGramFstMaker {
    pub fn new(config: MakerConfig) -> Result<Self> {
        let states = StateTable::new(&config.start_symbol, &config.end_symbol);
        let syms = SymbolTable::new();
        let mut fst = StdVectorFst::new();
        let initial = fst.add_state();
        fst.set_start(initial)?;
        let mut maker = Self {
            config,
            states,
            syms,
            fst,
        };
        maker.sync_states();
        // Make sure anything that compiles the text knows where to start
        let start_symbol = maker.config.start_symbol.clone();
        let start = maker.states.start();
        maker.add_tr(initial, start, &start_symbol, START_ARC_WEIGHT)?;
        Ok(maker)
    }

    /// Create FST states for any new entries in the state table
    fn sync_states(&mut self) {
        while self.fst.num_states() < self.states.len() {
            self.fst.add_state();
        }
    }

    fn add_tr(&mut self, from: StateId, to: StateId, word: &str, weight: f32) -> Result<()> {
        let label = self.syms.add_symbol(word);
        self.fst.add_tr(from, Tr::new(label, label, weight, to))
    }

    fn add_backoff_tr(&mut self, from: StateId, to: StateId, weight: f32) -> Result<()> {
        self.fst.add_tr(from, Tr::new(EPS_LABEL, EPS_LABEL, weight, to))
    }

    fn add_unigram(&mut self, entry: &NGramEntry) -> Result<()> {
        let word = &entry.words[0];
        let state = self.states.word(word);
        self.sync_states();
        let null = self.states.null();
        let dest = match entry.backoff {
            Some(backoff) => {
                self.add_backoff_tr(state, null, cost(backoff))?;
                state
            }
            None if state == self.states.end() => state,
            None => null,
        };
        let source = if state == self.states.start() {
            self.states.initial()
        } else {
            null
        };
        self.add_tr(source, dest, word, cost(entry.logprob))
    }

    fn add_bigram(&mut self, entry: &NGramEntry) -> Result<()> {
        let (w1, w2) = (&entry.words[0], &entry.words[1]);
        let (from, unigram) = match (self.states.get_word(w1), self.states.get_word(w2)) {
            (Some(from), Some(unigram)) => (from, unigram),
            _ => return Err(missing_context(entry, "unigram")),
        };
        let context = self.states.context(w1, w2);
        self.sync_states();
        let dest = match entry.backoff {
            Some(backoff) => {
                self.add_backoff_tr(context, unigram, cost(backoff))?;
                if self.config.backoff == BackoffPolicy::Once {
                    self.add_backoff_tr(context, self.states.null(), cost(backoff))?;
                }
                context
            }
            None => unigram,
        };
        self.add_tr(from, dest, w2, cost(entry.logprob))
    }

    fn add_trigram(&mut self, entry: &NGramEntry) -> Result<()> {
        let (w1, w2, w3) = (&entry.words[0], &entry.words[1], &entry.words[2]);
        if entry.words.iter().any(|w| self.states.get_word(w).is_none()) {
            return Err(missing_context(entry, "unigram"));
        }
        match (self.states.get_context(w1, w2), self.states.get_context(w2, w3)) {
            (Some(from), Some(to)) => self.add_tr(from, to, w3, cost(entry.logprob)),
            _ => Err(missing_context(entry, "bigram")),
        }
    }

    /// Add one N-Gram to the FST.
    pub fn add_entry(&mut self, entry: &NGramEntry) -> Result<()> {
        match entry.order() {
            1 => self.add_unigram(entry),
            2 => self.add_bigram(entry),
            3 => self.add_trigram(entry),
            n => {
                debug!("line {}: skipping {}-gram", entry.line_no, n);
                Ok(())
            }
        }
    }

    /// Mark the end symbol state final and return the FST, with symbol
    /// tables attached.
    pub fn finish(mut self) -> Result<StdVectorFst> {
        self.fst.set_final(self.states.end(), TropicalWeight::one())?;
        info!(
            "made FST with {} states and {} symbols",
            self.fst.num_states(),
            self.syms.len()
        );
        let syms = Arc::new(self.syms);
        self.fst.set_input_symbols(Arc::clone(&syms));
        self.fst.set_output_symbols(syms);
        Ok(self.fst)
    }

    /// Read an ARPA model and make an FST from it.
    pub fn make_from_arpa<R: BufRead>(mut self, reader: R) -> Result<StdVectorFst> {
        for entry in ArpaReader::new(reader) {
            self.add_entry(&entry?)?;
        }
        self.finish()
    }
}

/// Convert a log10 probability or backoff into a cost.
fn cost(logprob: f64) -> f32 {
    // 0.0 - x so that a zero log-probability is not written as -0
    (0.0 - logprob) as f32
}

fn missing_context(entry: &NGramEntry, missing: &'static str) -> anyhow::Error {
    LmError::MissingContext {
        line_no: entry.line_no,
        missing,
        line: entry.line.clone(),
    }
    .into()
}
