//! Smart-city recommendation resolution.
//!
//! [`RecommendationResolver`] asks a generative endpoint for operational
//! recommendations when a credential is configured and falls back to canned
//! answers from a [`MockCatalog`] otherwise.

pub mod catalog;
pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod prompts;
pub mod resolver;
pub mod storage;
pub mod types;

pub use catalog::MockCatalog;
pub use error::{AdvisorError, Result};
pub use resolver::{
    ExternalAttempt, RecommendationResolver, Resolution, ResolutionSource, ResolveRequest,
};
pub use storage::{CredentialHolder, JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{Domain, ImpactTier, Recommendation};
