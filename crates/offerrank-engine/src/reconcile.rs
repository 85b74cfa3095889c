//! Reconciliation of a plugin response against the local offer snapshot.
//!
//! Matching is by hostname: the plugin only knows hosts, so every offer
//! on a named host is emitted together at that host's position, in
//! snapshot order. Offers on hosts the plugin did not name are dropped.

use std::sync::Arc;

use offerrank_core::HostOffer;
use offerrank_metrics::DiffLog;
use tracing::debug;

use crate::client::RankingResponse;
use crate::error::RankingResult;
use crate::offers::OfferCollection;

/// Mismatch between the plugin's view and the scheduler's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffScore {
    /// Offers whose host the response never named.
    pub missing: u64,
    /// Response entries naming a host with no offer.
    pub extra: u64,
    /// Offers rejected before the plugin was asked.
    pub bad_offers: u64,
}

impl DiffScore {
    /// Sum of the three parts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.missing
            .saturating_add(self.extra)
            .saturating_add(self.bad_offers)
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Confirmed offers in plugin order.
    pub offers: Vec<Arc<HostOffer>>,
    pub diff: DiffScore,
}

/// Merge `response` into `offers`.
///
/// Fails with the response's own failure if it signals one; nothing is
/// appended to `diffs` in that case. On success the diff total is
/// appended exactly once.
///
/// A hostname repeated in the response is matched once. Later repeats
/// find nothing left to emit and are not counted as extra.
pub fn reconcile(
    offers: &OfferCollection,
    response: &RankingResponse,
    bad_offer_count: u64,
    diffs: &DiffLog,
) -> RankingResult<Reconciled> {
    let hosts = response.hosts()?;

    let mut emitted = vec![false; offers.len()];
    let mut ordered = Vec::with_capacity(offers.len());
    let mut extra = 0u64;

    for host in hosts {
        let indices = offers.host_indices(host);
        if indices.is_empty() {
            extra += 1;
            continue;
        }
        for &idx in indices {
            if emitted[idx] {
                continue;
            }
            emitted[idx] = true;
            if let Some(offer) = offers.get(idx) {
                ordered.push(Arc::clone(offer));
            }
        }
    }

    let missing = emitted.iter().filter(|done| !**done).count() as u64;
    let diff = DiffScore {
        missing,
        extra,
        bad_offers: bad_offer_count,
    };
    diffs.append(diff.total());

    debug!(
        matched = ordered.len(),
        missing,
        extra,
        bad_offers = bad_offer_count,
        diff_score = diff.total(),
        "plugin response reconciled"
    );

    Ok(Reconciled {
        offers: ordered,
        diff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RankingError;

    fn abc() -> OfferCollection {
        OfferCollection::new([
            HostOffer::new("offer-a", "host-a"),
            HostOffer::new("offer-b", "host-b"),
            HostOffer::new("offer-c", "host-c"),
        ])
    }

    fn abc_with_duplicate_c() -> OfferCollection {
        OfferCollection::new([
            HostOffer::new("offer-a", "host-a"),
            HostOffer::new("offer-b", "host-b"),
            HostOffer::new("offer-c", "host-c"),
            HostOffer::new("offer-c1", "host-c"),
        ])
    }

    fn run(
        offers: &OfferCollection,
        hosts: &[&str],
        bad: u64,
        diffs: &DiffLog,
    ) -> (Vec<String>, u64) {
        let response = RankingResponse::success(hosts.iter().copied());
        let reconciled = reconcile(offers, &response, bad, diffs).unwrap();
        let ids = reconciled
            .offers
            .iter()
            .map(|o| o.offer_id.clone())
            .collect();
        (ids, reconciled.diff.total())
    }

    #[test]
    fn perfect_match_keeps_plugin_order() {
        let diffs = DiffLog::new();
        let (ids, diff) = run(&abc(), &["host-c", "host-a", "host-b"], 0, &diffs);
        assert_eq!(ids, vec!["offer-c", "offer-a", "offer-b"]);
        assert_eq!(diff, 0);
        assert_eq!(diffs.snapshot(), vec![0]);
    }

    #[test]
    fn single_offer_scenarios() {
        let diffs = DiffLog::new();

        let (ids, diff) = run(&abc(), &["host-a", "host-b", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-b", "offer-c"]);
        assert_eq!(diff, 0);

        let (ids, diff) = run(&abc(), &["host-a", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-c"]);
        assert_eq!(diff, 1);

        let (ids, diff) = run(&abc(), &["host-a", "host-b", "host-d", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-b", "offer-c"]);
        assert_eq!(diff, 1);

        let (ids, diff) = run(&abc(), &["host-a", "host-d", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-c"]);
        assert_eq!(diff, 2);

        let (_, diff) = run(&abc(), &["host-a", "host-d", "host-c"], 1, &diffs);
        assert_eq!(diff, 3);

        assert_eq!(diffs.snapshot(), vec![0, 1, 1, 2, 3]);
    }

    #[test]
    fn duplicate_host_scenarios() {
        let diffs = DiffLog::new();
        let offers = abc_with_duplicate_c();

        let (ids, diff) = run(&offers, &["host-a", "host-b", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-b", "offer-c", "offer-c1"]);
        assert_eq!(diff, 0);

        let (ids, diff) = run(&offers, &["host-a", "host-c"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-c", "offer-c1"]);
        assert_eq!(diff, 1);

        let (ids, diff) = run(&offers, &["host-a", "host-b", "host-d", "host-c"], 0, &diffs);
        assert_eq!(ids.len(), 4);
        assert_eq!(diff, 1);

        let (ids, diff) = run(&offers, &["host-a", "host-d", "host-b"], 0, &diffs);
        assert_eq!(ids, vec!["offer-a", "offer-b"]);
        assert_eq!(diff, 3);

        let (_, diff) = run(&offers, &["host-a", "host-d", "host-b"], 1, &diffs);
        assert_eq!(diff, 4);
    }

    #[test]
    fn repeated_host_is_consumed_once() {
        let diffs = DiffLog::new();
        let (ids, diff) = run(
            &abc_with_duplicate_c(),
            &["host-c", "host-a", "host-c", "host-b"],
            0,
            &diffs,
        );
        assert_eq!(ids, vec!["offer-c", "offer-c1", "offer-a", "offer-b"]);
        assert_eq!(diff, 0);
    }

    #[test]
    fn diff_parts_are_reported_separately() {
        let response = RankingResponse::success(["host-a", "host-x", "host-y"]);
        let reconciled = reconcile(&abc(), &response, 2, &DiffLog::new()).unwrap();
        assert_eq!(
            reconciled.diff,
            DiffScore {
                missing: 2,
                extra: 2,
                bad_offers: 2,
            }
        );
        assert_eq!(reconciled.diff.total(), 6);
    }

    #[test]
    fn diff_total_saturates() {
        let diffs = DiffLog::new();
        let offers = OfferCollection::new([HostOffer::new("offer-a", "host-a")]);
        let response = RankingResponse::success(["host-x"]);

        let reconciled = reconcile(&offers, &response, u64::MAX, &diffs).unwrap();
        assert!(reconciled.offers.is_empty());
        assert_eq!(reconciled.diff.total(), u64::MAX);
        assert_eq!(diffs.snapshot(), vec![u64::MAX]);
    }

    #[test]
    fn empty_inputs() {
        let diffs = DiffLog::new();
        let (ids, diff) = run(&OfferCollection::default(), &["host-a"], 0, &diffs);
        assert!(ids.is_empty());
        assert_eq!(diff, 1);

        let (ids, diff) = run(&abc(), &[], 0, &diffs);
        assert!(ids.is_empty());
        assert_eq!(diff, 3);
    }

    #[test]
    fn failed_response_is_not_reconciled() {
        let diffs = DiffLog::new();
        let err = reconcile(&abc(), &RankingResponse::failure("Error"), 0, &diffs).unwrap_err();
        assert_eq!(err, RankingError::PluginReported("Error".to_string()));

        let no_hosts = RankingResponse {
            error: Some(String::new()),
            hosts: None,
        };
        let err = reconcile(&abc(), &no_hosts, 0, &diffs).unwrap_err();
        assert!(matches!(err, RankingError::Decode(_)));

        assert!(diffs.is_empty());
    }
}
