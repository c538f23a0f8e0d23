use rustfst::StateId;

/// Fatal conditions raised while reading models and lattices.
///
/// Library functions return `anyhow::Result` like `rustfst` does; these
/// can be recovered with `downcast_ref::<LmError>()`.
#[derive(Debug, thiserror::Error)]
pub enum LmError {
    /// A line does not have the expected token shape or types.
    #[error("line {line_no}: {reason}: {line:?}")]
    MalformedInput {
        /// 1-based line number.
        line_no: usize,
        /// What was wrong with it.
        reason: String,
        /// The offending line.
        line: String,
    },

    /// A higher order N-Gram refers to a lower order context that has
    /// not been seen yet.
    #[error("line {line_no}: N-Gram contains previously unseen {missing}: {line:?}")]
    MissingContext {
        /// 1-based line number.
        line_no: usize,
        /// "unigram" or "bigram"
        missing: &'static str,
        /// The offending line.
        line: String,
    },

    /// Occupancy of a state depends on itself.
    #[error("occupancy of state {state} depends on itself")]
    StructuralCycle {
        /// A state on the cycle.
        state: StateId,
    },

    #[error("unknown text codec: {0}")]
    UnknownCodec(String),

    #[error("cannot encode {ch:?} as {codec}")]
    Unencodable {
        codec: &'static str,
        ch: char,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LmError {
    pub(crate) fn malformed(line_no: usize, reason: impl Into<String>, line: &str) -> Self {
        LmError::MalformedInput {
            line_no,
            reason: reason.into(),
            line: line.to_string(),
        }
    }
}
