//! Soundtrack Linker Library
//!
//! Resolves structured music-soundtrack records to the single most likely
//! YouTube video. The library exposes the internal modules for testing and
//! potential reuse; `main.rs` wires them into the CLI.

pub mod batch;
pub mod config;
pub mod decision;
pub mod enrich;
pub mod models;
pub mod normalize;
pub mod oracle;
pub mod pipeline;
pub mod query;
pub mod quota;
pub mod retrieval;
pub mod retry;
pub mod youtube;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig, LinkerSettings};
pub use models::{
    MatchResult, MatchScore, MatchStatus, RawRecord, ScoreSource, SoundtrackRecord, VideoCandidate,
};
pub use pipeline::{Linker, LinkerServices};
