//! Hybrid retrieval pipeline (component C4, spec §4.3): adaptive top-k
//! selection, contextual query expansion, multi-strategy retrieval,
//! weighted RRF fusion, lightweight reranking, dependency-aware ordering,
//! and a cached cross-encoder final rerank.

pub mod chunk;
pub mod config;
pub mod cross_encoder;
pub mod embedding_cache;
pub mod error;
pub mod expansion;
pub mod fusion;
pub mod maxsim;
pub mod ordering;
pub mod pipeline;
pub mod reranker;
pub mod strategies;
pub mod topk;

pub use chunk::{ChunkEdge, EdgeKind, RetrievalChunk, ScoredChunk};
pub use config::RetrievalConfig;
pub use error::RetrievalError;
pub use pipeline::{RetrievalPipeline, StageLatencies};
pub use topk::QueryIntent;
