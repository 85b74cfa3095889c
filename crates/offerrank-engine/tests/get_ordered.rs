//! Local ranking through the orchestrator against a real task store.

use std::sync::Arc;

use offerrank_core::{HostOffer, RankingConfig, ResourceRequest, TaskGroupKey};
use offerrank_engine::{OfferCollection, RankingOrchestrator};
use offerrank_state::{AssignedTask, ScheduleStatus, StateStore, TaskRecord};

fn task(id: &str, status: ScheduleStatus, host: Option<&str>) -> TaskRecord {
    TaskRecord {
        task_id: id.to_string(),
        job_key: "www-data/prod/hello".to_string(),
        status,
        assigned: host.map(|h| AssignedTask {
            agent_id: format!("{h}-agent"),
            host: h.to_string(),
        }),
        updated_at: 0,
    }
}

/// Pending t0, starting t1 on host-b, running t2 on host-c.
fn store() -> Arc<StateStore> {
    let store = StateStore::open_in_memory().unwrap();
    store
        .put_tasks(&[
            task("t0", ScheduleStatus::Pending, None),
            task("t1", ScheduleStatus::Starting, Some("host-b")),
            task("t2", ScheduleStatus::Running, Some("host-c")),
        ])
        .unwrap();
    Arc::new(store)
}

fn offers() -> Arc<OfferCollection> {
    Arc::new(OfferCollection::new([
        HostOffer::new("offer-a", "host-a"),
        HostOffer::new("offer-b", "host-b"),
        HostOffer::new("offer-c", "host-c"),
    ]))
}

async fn ordered(threshold: i64, filter: bool) -> Vec<String> {
    let mut config = RankingConfig::default();
    config.fallback.max_starting_tasks_per_host = threshold;
    config.fallback.filter_overloaded_hosts = filter;
    let orchestrator = RankingOrchestrator::new(&config, offers(), store()).unwrap();
    orchestrator
        .get_ordered(
            &TaskGroupKey::new("www-data", "prod", "hello"),
            &ResourceRequest::default(),
        )
        .await
        .map(|o| o.hostname.clone())
        .collect()
}

#[tokio::test]
async fn disabled_or_unreached_threshold_returns_everything() {
    for threshold in [0, -1, 2] {
        let hosts = ordered(threshold, false).await;
        assert_eq!(hosts, vec!["host-a", "host-b", "host-c"], "threshold {threshold}");
    }
}

#[tokio::test]
async fn host_with_starting_task_goes_last() {
    assert_eq!(ordered(1, false).await, vec!["host-a", "host-c", "host-b"]);
}

#[tokio::test]
async fn filter_drops_host_with_starting_task() {
    let hosts = ordered(1, true).await;
    assert_eq!(hosts.len(), 2);
    assert!(!hosts.contains(&"host-b".to_string()));
}

#[tokio::test]
async fn census_is_rebuilt_every_round() {
    let store = store();
    let mut config = RankingConfig::default();
    config.fallback.max_starting_tasks_per_host = 1;
    config.fallback.filter_overloaded_hosts = true;
    let orchestrator = RankingOrchestrator::new(&config, offers(), store.clone()).unwrap();
    let key = TaskGroupKey::new("www-data", "prod", "hello");

    assert_eq!(
        orchestrator
            .get_ordered(&key, &ResourceRequest::default())
            .await
            .len(),
        2
    );

    store
        .put_task(&task("t1", ScheduleStatus::Running, Some("host-b")))
        .unwrap();
    assert_eq!(
        orchestrator
            .get_ordered(&key, &ResourceRequest::default())
            .await
            .len(),
        3
    );
}
