use rustfst::{StateId, SymbolTable};

/// Key for the null backoff state: bigram contexts never start with a space.
const NULL_STATE_KEY: &str = " <null-backoff>";

/// Assign FST states to words and bigram contexts.
///
/// Uses a `SymbolTable` so that the initial state is `<eps>` (0),
/// followed by the start symbol (1), the end symbol (2) and the null
/// backoff state (3).  Everything else is numbered as first seen.
#[derive(Debug)]
pub struct StateTable {
    syms: SymbolTable,
    start: StateId,
    end: StateId,
    null: StateId,
}

impl StateTable {
    pub fn new(start_symbol: &str, end_symbol: &str) -> Self {
        let mut syms = SymbolTable::new();
        let start = syms.add_symbol(start_symbol);
        let end = syms.add_symbol(end_symbol);
        let null = syms.add_symbol(NULL_STATE_KEY);
        Self {
            syms,
            start,
            end,
            null,
        }
    }

    /// Initial state of the FST.
    pub fn initial(&self) -> StateId {
        0
    }

    /// State reached by the start symbol.
    pub fn start(&self) -> StateId {
        self.start
    }

    /// State reached by the end symbol.
    pub fn end(&self) -> StateId {
        self.end
    }

    /// Null backoff (unigram history) state.
    pub fn null(&self) -> StateId {
        self.null
    }

    /// Get or create the state for a word.
    pub fn word(&mut self, word: &str) -> StateId {
        self.syms.add_symbol(word)
    }

    /// Get or create the state for a bigram context.
    pub fn context(&mut self, w1: &str, w2: &str) -> StateId {
        self.syms.add_symbol(format!("{} {}", w1, w2))
    }

    pub fn get_word(&self, word: &str) -> Option<StateId> {
        self.syms.get_label(word)
    }

    pub fn get_context(&self, w1: &str, w2: &str) -> Option<StateId> {
        self.syms.get_label(format!("{} {}", w1, w2))
    }

    /// Number of states assigned so far (including the initial state).
    pub fn len(&self) -> usize {
        self.syms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syms.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reserves_states() {
        let mut states = StateTable::new("<s>", "</s>");
        assert_eq!(states.initial(), 0);
        assert_eq!(states.start(), 1);
        assert_eq!(states.end(), 2);
        assert_eq!(states.null(), 3);
        assert_eq!(states.word("<s>"), 1);
        assert_eq!(states.word("</s>"), 2);
        assert_eq!(states.len(), 4);
    }

    #[test]
    fn it_numbers_as_first_seen() {
        let mut states = StateTable::new("<s>", "</s>");
        assert_eq!(states.word("the"), 4);
        assert_eq!(states.word("cat"), 5);
        assert_eq!(states.context("the", "cat"), 6);
        assert_eq!(states.word("the"), 4);
        assert_eq!(states.context("the", "cat"), 6);
        assert_eq!(states.get_context("cat", "the"), None);
        assert_eq!(states.get_word("dog"), None);
        assert_eq!(states.len(), 7);
    }
}
