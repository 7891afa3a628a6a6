//! rusty-rank/crates/rr-core/src/lib.rs
//!
//! Time-decayed ranking and voting engine: domain models, storage ports, and the
//! components that score, gate votes, paginate, and cache group rankings.
//!
//! Items start at `created_at + base_weight` and gain `vote_weight` per accepted vote,
//! so newer items need fewer votes to outrank older ones.

pub mod clock;
pub mod engine;
pub mod error;
pub mod keys;
pub mod models;
pub mod settings;
pub mod traits;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use engine::*;
pub use error::*;
pub use models::*;
pub use settings::*;
pub use traits::*;
