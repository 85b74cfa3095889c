//! Local fallback ranker.
//!
//! Pushes hosts that already have too many starting tasks to the back of
//! the offer order (or drops them). Used whenever the ranking plugin is
//! unavailable. Never touches the network and cannot fail.

use std::sync::Arc;

use offerrank_core::HostOffer;
use tracing::debug;

use crate::census::StartingTaskCensus;
use crate::offers::OfferCollection;

/// Order `offers` so that hosts below `threshold` starting tasks come first.
///
/// - `threshold <= 0` returns the snapshot order unchanged.
/// - Otherwise this is a stable partition: offers keep their relative
///   order inside each half. With `filter_enabled` the at-or-above half
///   is dropped instead of appended.
pub fn rank(
    offers: &OfferCollection,
    census: &StartingTaskCensus,
    threshold: i64,
    filter_enabled: bool,
) -> Vec<Arc<HostOffer>> {
    if threshold <= 0 {
        return offers.to_vec();
    }

    let (mut below, above): (Vec<_>, Vec<_>) = offers
        .iter()
        .cloned()
        .partition(|offer| i64::from(census.count(&offer.hostname)) < threshold);

    debug!(
        below = below.len(),
        above = above.len(),
        threshold,
        filter_enabled,
        "offers ranked locally"
    );

    if !filter_enabled {
        below.extend(above);
    }
    below
}
