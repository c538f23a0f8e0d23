use rustfst::fst_impls::VectorFst;
use rustfst::semirings::TropicalWeight;

/// rustfst does not define this but we will
pub type StdVectorFst = VectorFst<TropicalWeight>;

/// Error types
pub mod error;
pub use error::LmError;

/// Text codecs for input and output files
pub mod codec;
pub use codec::Codec;

/// Mapping of words and contexts to FST states
pub mod symbols;

/// Reading ARPA format N-Gram models
pub mod model;
pub use model::{ArpaReader, NGramEntry};

/// Making FSTs from N-Gram models
pub mod make;
pub use make::{BackoffPolicy, MakerConfig, NGramFstMaker};

/// Writing FSTs and symbol tables as text
pub mod text;

/// Lattices in text format
pub mod lattice;
pub use lattice::Lattice;

/// State occupancy probabilities
pub mod occupancy;
pub use occupancy::Occupancy;

/// Fractional N-Gram counting
pub mod count;
pub use count::FractionalCounter;
