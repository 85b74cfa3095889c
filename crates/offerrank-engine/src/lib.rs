//! offerrank-engine: offer ordering for the scheduling loop.
//!
//! # Architecture
//!
//! ```text
//! OfferPool ──► RankingOrchestrator::get_ordered ──► OrderedOffers
//!                 │
//!                 ├─ plugin ──► RankingClient ──► reconcile ──► DiffLog
//!                 │               (on failure)
//!                 └─ local  ──► census(TaskSource) ──► fallback::rank
//! ```
//!
//! Every round works on its own immutable [`OfferCollection`] snapshot.
//! The only state shared between rounds is the metrics sink.

pub mod census;
pub mod client;
pub mod error;
pub mod fallback;
pub mod offers;
pub mod orchestrator;
pub mod reconcile;

pub use census::{StartingTaskCensus, TaskSource, census};
pub use client::{RankingClient, RankingRequest, RankingResponse};
pub use error::{RankingError, RankingErrorKind, RankingResult};
pub use offers::{OfferCollection, OfferPool};
pub use orchestrator::{OrderedOffers, RankingOrchestrator, RankingStrategy};
pub use reconcile::{DiffScore, Reconciled, reconcile};
