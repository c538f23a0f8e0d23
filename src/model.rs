use anyhow::Result;
use log::{debug, warn};
use std::io::prelude::*;
use std::io::Lines;

use crate::LmError;

/// Highest order we build FSTs for
pub const MAX_ORDER: u8 = 3;

/// One line from an N-Gram section of an ARPA file.
#[derive(Debug, Clone, PartialEq)]
pub struct NGramEntry {
    /// Log10 probability
    pub logprob: f64,
    /// Context followed by the predicted word (length = order)
    pub words: Vec<String>,
    /// Log10 backoff weight, if any
    pub backoff: Option<f64>,
    /// Line this came from (1-based)
    pub line_no: usize,
    /// Original text, for error messages
    pub line: String,
}

impl NGramEntry {
    pub fn order(&self) -> u8 {
        self.words.len() as u8
    }
}

/// Section of the ARPA file we are currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentOrder {
    /// No header seen yet
    Preamble,
    /// `\data\` or `\end\`
    Other,
    /// `\N-grams:`
    NGrams(u8),
}

impl CurrentOrder {
    /// Recognize a section header
    fn from_header(line: &str) -> Option<Self> {
        match line {
            "\\data\\" | "\\end\\" => Some(CurrentOrder::Other),
            _ => line
                .strip_prefix('\\')
                .and_then(|s| s.strip_suffix("-grams:"))
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|&n| n > 0)
                .map(CurrentOrder::NGrams),
        }
    }
}

/// Read N-Gram entries from an ARPA language model, one line at a time.
///
/// Entries of order higher than [`MAX_ORDER`] are skipped.
pub struct ArpaReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    current: CurrentOrder,
}

impl<R: BufRead> ArpaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            current: CurrentOrder::Preamble,
        }
    }

    pub fn current_order(&self) -> CurrentOrder {
        self.current
    }

    fn parse_entry(&self, order: u8, data: &[&str], line: &str) -> Result<NGramEntry> {
        let order = order as usize;
        if data.len() < order + 1 {
            return Err(LmError::malformed(self.line_no, "too few tokens for order", line).into());
        }
        if data.len() > order + 2 {
            return Err(LmError::malformed(self.line_no, "too many tokens for order", line).into());
        }
        let logprob = parse_float(data[0])
            .ok_or_else(|| LmError::malformed(self.line_no, "invalid probability", line))?;
        let backoff = match data.get(order + 1) {
            None => None,
            Some(tok) => Some(
                parse_float(tok)
                    .ok_or_else(|| LmError::malformed(self.line_no, "invalid backoff", line))?,
            ),
        };
        Ok(NGramEntry {
            logprob,
            words: data[1..=order].iter().map(|s| s.to_string()).collect(),
            backoff,
            line_no: self.line_no,
            line: line.to_string(),
        })
    }
}

impl<R: BufRead> Iterator for ArpaReader<R> {
    type Item = Result<NGramEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(LmError::from(e).into())),
            };
            let line = line.trim();
            if let Some(section) = CurrentOrder::from_header(line) {
                debug!("line {}: entering section {:?}", self.line_no, section);
                if let CurrentOrder::NGrams(n) = section {
                    if n > MAX_ORDER {
                        warn!("ignoring {}-grams: only orders up to {} are supported", n, MAX_ORDER);
                    }
                }
                self.current = section;
                continue;
            }
            let data: Vec<&str> = line.split_whitespace().collect();
            // Only lines that start with a number are N-Grams
            match data.first() {
                Some(tok) if parse_float(tok).is_some() => (),
                _ => continue,
            }
            match self.current {
                CurrentOrder::Preamble => {
                    return Some(Err(LmError::malformed(
                        self.line_no,
                        "N-Gram before any section header",
                        line,
                    )
                    .into()))
                }
                CurrentOrder::Other => continue,
                CurrentOrder::NGrams(n) if n > MAX_ORDER => continue,
                CurrentOrder::NGrams(n) => return Some(self.parse_entry(n, &data, line)),
            }
        }
        None
    }
}

fn parse_float(tok: &str) -> Option<f64> {
    tok.parse::<f64>().ok()
}
