//! Offer collection: the per-round, read-only offer snapshot.
//!
//! Offers live in an arena (`Vec`) in insertion order, with a
//! `hostname → Vec<index>` map so a host with several outstanding offers
//! can be looked up in one step. Cloning a collection only bumps a
//! reference count.

use std::collections::HashMap;
use std::sync::Arc;

use offerrank_core::HostOffer;

#[derive(Debug, Default)]
struct Snapshot {
    offers: Vec<Arc<HostOffer>>,
    by_host: HashMap<String, Vec<usize>>,
}

/// Immutable, ordered multiset of offers for one scheduling round.
#[derive(Debug, Clone, Default)]
pub struct OfferCollection {
    snapshot: Arc<Snapshot>,
}

impl OfferCollection {
    pub fn new(offers: impl IntoIterator<Item = HostOffer>) -> Self {
        Self::from_shared(offers.into_iter().map(Arc::new))
    }

    /// Build a collection from offers that are already reference-counted.
    pub fn from_shared(offers: impl IntoIterator<Item = Arc<HostOffer>>) -> Self {
        let offers: Vec<Arc<HostOffer>> = offers.into_iter().collect();
        let mut by_host: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, offer) in offers.iter().enumerate() {
            by_host.entry(offer.hostname.clone()).or_default().push(idx);
        }
        Self {
            snapshot: Arc::new(Snapshot { offers, by_host }),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.offers.is_empty()
    }

    /// Offers in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<HostOffer>> {
        self.snapshot.offers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<HostOffer>> {
        self.snapshot.offers.get(index)
    }

    /// Arena positions of every offer on `hostname`, in snapshot order.
    pub fn host_indices(&self, hostname: &str) -> &[usize] {
        self.snapshot
            .by_host
            .get(hostname)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All offers on `hostname`, in snapshot order.
    pub fn offers_for_host<'a>(
        &'a self,
        hostname: &str,
    ) -> impl Iterator<Item = &'a Arc<HostOffer>> + 'a {
        self.host_indices(hostname)
            .iter()
            .map(move |&idx| &self.snapshot.offers[idx])
    }

    /// One hostname per offer, in snapshot order (duplicates kept).
    pub fn hostnames(&self) -> Vec<String> {
        self.iter().map(|o| o.hostname.clone()).collect()
    }

    /// Number of distinct hosts.
    pub fn host_count(&self) -> usize {
        self.snapshot.by_host.len()
    }

    /// A new snapshot holding only the offers matching `keep`.
    pub fn filtered(&self, keep: impl Fn(&HostOffer) -> bool) -> Self {
        Self::from_shared(self.iter().filter(|o| keep(o)).cloned())
    }

    /// The offers in snapshot order, as an owned sequence.
    pub fn to_vec(&self) -> Vec<Arc<HostOffer>> {
        self.snapshot.offers.clone()
    }
}

impl FromIterator<HostOffer> for OfferCollection {
    fn from_iter<I: IntoIterator<Item = HostOffer>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a OfferCollection {
    type Item = &'a Arc<HostOffer>;
    type IntoIter = std::slice::Iter<'a, Arc<HostOffer>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Supplies the offer snapshot for each scheduling round.
pub trait OfferPool: Send + Sync {
    fn snapshot(&self) -> OfferCollection;
}

impl OfferPool for OfferCollection {
    fn snapshot(&self) -> OfferCollection {
        self.clone()
    }
}
