pub mod bio_tags;
pub mod entities;
pub mod features;
pub mod tokenizer;
pub mod unified;
pub mod viterbi;

pub use bio_tags::{Tag, parse_tags};
pub use entities::{EntitySpan, reconstruct, spans_to_tags};
pub use features::{FeatureMap, FeatureValue, sentence_features, token_features};
pub use tokenizer::{Token, Tokenizer};
pub use unified::{DEFAULT_MODEL_PATH, Recognizer, RecognizerConfig};
pub use viterbi::ViterbiDecoder;
