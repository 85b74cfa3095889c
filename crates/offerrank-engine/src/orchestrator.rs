//! Ranking orchestrator: the entry point the scheduling loop calls once
//! per task group per round.
//!
//! Picks a [`RankingStrategy`] from configuration and the runtime plugin
//! switch. Plugin failures never reach the caller: they are logged,
//! counted, and answered with the local fallback ordering.

use std::iter::FusedIterator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use offerrank_core::{ConfigError, HostOffer, RankingConfig, ResourceRequest, TaskGroupKey};
use offerrank_metrics::{RankingMetrics, RankingPath};

use crate::census::{TaskSource, census};
use crate::client::{RankingClient, RankingRequest};
use crate::error::RankingResult;
use crate::fallback;
use crate::offers::{OfferCollection, OfferPool};
use crate::reconcile::reconcile;

/// How a round's ordering is produced.
#[derive(Debug, Clone, Copy)]
pub enum RankingStrategy<'a> {
    /// Ask the plugin, reconcile, and fall back locally on failure.
    Plugin(&'a RankingClient),
    /// Starting-task heuristic (or snapshot order when disabled).
    Local,
}

pub struct RankingOrchestrator {
    pool: Arc<dyn OfferPool>,
    tasks: Arc<dyn TaskSource>,
    client: Option<RankingClient>,
    plugin_enabled: AtomicBool,
    threshold: i64,
    filter_overloaded_hosts: bool,
    metrics: Arc<RankingMetrics>,
}

impl RankingOrchestrator {
    pub fn new(
        config: &RankingConfig,
        pool: Arc<dyn OfferPool>,
        tasks: Arc<dyn TaskSource>,
    ) -> Result<Self, ConfigError> {
        let timeout = config.timeout()?;
        let client = config
            .endpoint()?
            .map(|endpoint| RankingClient::new(endpoint, timeout));

        let plugin = client.as_ref().map(|c| c.endpoint().uri());
        info!(
            plugin = ?plugin,
            plugin_enabled = config.plugin.enabled,
            threshold = config.fallback.max_starting_tasks_per_host,
            filter = config.fallback.filter_overloaded_hosts,
            "ranking orchestrator configured"
        );

        Ok(Self {
            pool,
            tasks,
            client,
            plugin_enabled: AtomicBool::new(config.plugin.enabled),
            threshold: config.fallback.max_starting_tasks_per_host,
            filter_overloaded_hosts: config.fallback.filter_overloaded_hosts,
            metrics: Arc::new(RankingMetrics::new()),
        })
    }

    /// Share an existing metrics sink instead of the orchestrator's own.
    pub fn with_metrics(mut self, metrics: Arc<RankingMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<RankingMetrics> {
        &self.metrics
    }

    /// Turn the plugin on or off for subsequent rounds.
    pub fn set_plugin_enabled(&self, enabled: bool) {
        let was = self.plugin_enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            info!(enabled, "ranking plugin switched");
        }
    }

    pub fn plugin_enabled(&self) -> bool {
        self.plugin_enabled.load(Ordering::Relaxed)
    }

    /// Strategy the next round will use.
    pub fn strategy(&self) -> RankingStrategy<'_> {
        match &self.client {
            Some(client) if self.plugin_enabled() => RankingStrategy::Plugin(client),
            _ => RankingStrategy::Local,
        }
    }

    /// Order the current offer snapshot for one task group.
    ///
    /// Infallible: every plugin or storage failure degrades to a local
    /// ordering. The ordering is computed eagerly; the returned iterator
    /// only walks it.
    pub async fn get_ordered(
        &self,
        key: &TaskGroupKey,
        resources: &ResourceRequest,
    ) -> OrderedOffers {
        let offers = self.pool.snapshot();
        if offers.is_empty() {
            self.metrics.record_path(RankingPath::Identity);
            return OrderedOffers::new(Vec::new());
        }

        let ordered = match self.strategy() {
            RankingStrategy::Plugin(client) => {
                match self.rank_with_plugin(client, &offers, key, resources).await {
                    Ok(ordered) => {
                        self.metrics.record_path(RankingPath::Plugin);
                        ordered
                    }
                    Err(err) => {
                        warn!(
                            job = %key,
                            kind = %err.kind(),
                            error = %err,
                            "ranking plugin failed, falling back"
                        );
                        self.metrics.record_plugin_failure(err.kind());
                        self.rank_locally(&offers)
                    }
                }
            }
            RankingStrategy::Local => self.rank_locally(&offers),
        };

        debug!(job = %key, offers = offers.len(), ordered = ordered.len(), "offers ordered");
        OrderedOffers::new(ordered)
    }

    async fn rank_with_plugin(
        &self,
        client: &RankingClient,
        offers: &OfferCollection,
        key: &TaskGroupKey,
        resources: &ResourceRequest,
    ) -> RankingResult<Vec<Arc<HostOffer>>> {
        // Drained hosts never reach the plugin.
        let vetted = offers.filtered(|offer| !offer.is_drained());
        let bad_offers = (offers.len() - vetted.len()) as u64;

        let request = RankingRequest::new(vetted.hostnames()).with_context(key, resources);
        let started = Instant::now();
        let result = client.request(&request).await;
        let millis = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics.record_plugin_latency(millis);

        let mut response = result?;
        // Hosts removed by the pre-check are already counted as bad offers.
        if let Some(hosts) = response.hosts.as_mut() {
            hosts.retain(|host| {
                offers.host_indices(host).is_empty() || !vetted.host_indices(host).is_empty()
            });
        }
        let reconciled = reconcile(&vetted, &response, bad_offers, self.metrics.diff_scores())?;
        Ok(reconciled.offers)
    }

    fn rank_locally(&self, offers: &OfferCollection) -> Vec<Arc<HostOffer>> {
        if self.threshold <= 0 {
            self.metrics.record_path(RankingPath::Identity);
            return offers.to_vec();
        }

        match census(self.tasks.as_ref()) {
            Ok(census) => {
                self.metrics.record_path(RankingPath::LocalFallback);
                fallback::rank(offers, &census, self.threshold, self.filter_overloaded_hosts)
            }
            Err(err) => {
                warn!(error = %err, "starting-task census unavailable, keeping snapshot order");
                self.metrics.record_path(RankingPath::Identity);
                offers.to_vec()
            }
        }
    }
}

/// Single-pass view over one round's ordered offers.
#[derive(Debug)]
pub struct OrderedOffers {
    inner: std::vec::IntoIter<Arc<HostOffer>>,
}

impl OrderedOffers {
    fn new(offers: Vec<Arc<HostOffer>>) -> Self {
        Self {
            inner: offers.into_iter(),
        }
    }
}

impl Iterator for OrderedOffers {
    type Item = Arc<HostOffer>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for OrderedOffers {}

impl FusedIterator for OrderedOffers {}
