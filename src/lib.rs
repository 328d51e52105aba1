pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod errors;
pub mod files_handling;
pub mod keyed_vectors;
pub mod lsi;
pub mod pipeline;
pub mod tfidf;
pub mod tokenizer;
pub mod word2vec;

pub use config::{Config, Params};
pub use corpus::{BowStream, Corpus, MemoryCorpus, SentenceStream};
pub use dictionary::Dictionary;
pub use errors::{Error, Result};
pub use keyed_vectors::KeyedVectors;
pub use lsi::{LsiModel, LsiParams};
pub use pipeline::{Pipeline, PipelineOutput};
pub use tfidf::TfidfModel;
pub use tokenizer::Tokenizer;
pub use word2vec::{Algorithm, Word2Vec, Word2VecParams};
