//! Core pipeline orchestration and domain logic for contentlift.
//!
//! This crate ties together the content store, competitor discovery,
//! reference extraction, the model rewrite, and publishing into a single
//! optimization run (see [`Pipeline`]).

pub mod collector;
pub mod gemini;
pub mod pipeline;
pub mod publish;
pub mod rewrite;
pub mod store;

pub use collector::{CandidateSource, REQUIRED_REFERENCES, ReferenceCollector, ReferencePair};
pub use gemini::{GeminiClient, GenerationConfig, GenerativeModel, ModelInfo};
pub use pipeline::{Pipeline, PipelineConfig, ProgressReporter, RunSummary, SilentProgress};
pub use publish::{PublishAssembler, PublishPayload, Publication};
pub use rewrite::{RewriteEngine, build_prompt};
pub use store::ContentStoreClient;
