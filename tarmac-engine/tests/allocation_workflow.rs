//! 端到端工作流测试：经由总线驱动完整的“订阅 → 裁决 → 条件写 → 结论发布”。
//!
use futures_util::StreamExt;
use futures_util::stream::select_all;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tarmac_domain::eventing::{EventBus, InMemoryEventBus};
use tarmac_domain::persist::{
    IdempotencyLedger, InMemoryIdempotencyLedger, InMemoryRunwayStore, RunwayStateStore,
};
use tarmac_engine::config::{CoordinatorConfig, RetryPolicy};
use tarmac_engine::coordinator::AllocationCoordinator;
use tarmac_engine::strategy::{FixedPrioritySelector, RunwaySelector};

fn request_payload(event_id: &str, flight_id: &str, start_min: u32, end_min: u32) -> Value {
    json!({
        "eventId": event_id,
        "flightId": flight_id,
        "originCode": "DEL",
        "destinationCode": "BOM",
        "windowStart": format!("2026-03-01T10:{start_min:02}:00Z"),
        "windowEnd": format!("2026-03-01T10:{end_min:02}:00Z"),
        "submittedAt": "2026-03-01T09:00:00Z",
    })
}

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        infra_retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
        },
        ledger_sweep_interval: Duration::from_millis(100),
        ..Default::default()
    }
}

struct Harness {
    bus: Arc<InMemoryEventBus>,
    store: Arc<InMemoryRunwayStore>,
    ledger: Arc<InMemoryIdempotencyLedger>,
    coordinator: Arc<AllocationCoordinator>,
}

fn harness(partitions: u32, runways: &[&str]) -> Harness {
    let bus = Arc::new(InMemoryEventBus::new(partitions));
    let store = Arc::new(InMemoryRunwayStore::new());
    let ledger = Arc::new(InMemoryIdempotencyLedger::new());
    let coordinator = Arc::new(
        AllocationCoordinator::builder()
            .event_bus(bus.clone() as Arc<dyn EventBus>)
            .state_store(store.clone() as Arc<dyn RunwayStateStore>)
            .ledger(ledger.clone() as Arc<dyn IdempotencyLedger>)
            .selector(
                Arc::new(FixedPrioritySelector::new(runways.iter().copied()))
                    as Arc<dyn RunwaySelector>,
            )
            .config(fast_config())
            .build(),
    );
    Harness {
        bus,
        store,
        ledger,
        coordinator,
    }
}

/// 从结论主题的全部分区收集 `expected` 条消息（带超时）
async fn collect_outcomes(bus: &Arc<InMemoryEventBus>, expected: usize) -> Vec<Value> {
    let mut streams = Vec::new();
    for partition in 0..bus.partitions("runway.status") {
        streams.push(bus.subscribe("runway.status", "observer", partition).await);
    }
    let merged = select_all(streams);
    tokio::time::timeout(
        Duration::from_secs(5),
        merged
            .take(expected)
            .map(|r| r.unwrap().payload().clone())
            .collect::<Vec<Value>>(),
    )
    .await
    .expect("outcomes within timeout")
}

#[tokio::test(flavor = "multi_thread")]
async fn single_runway_scenario_assign_then_reject() {
    let h = harness(1, &["R1"]);
    let handle = h.coordinator.clone().start();

    h.bus
        .publish("flight.schedule", "AI101", request_payload("e-1", "AI101", 0, 30))
        .await
        .unwrap();
    h.bus
        .publish("flight.schedule", "AI202", request_payload("e-2", "AI202", 15, 45))
        .await
        .unwrap();

    let outcomes = collect_outcomes(&h.bus, 2).await;
    handle.shutdown();
    handle.join().await;

    let ai101 = outcomes.iter().find(|o| o["flightId"] == "AI101").unwrap();
    assert_eq!(ai101["decision"], "ASSIGNED");
    assert_eq!(ai101["runwayId"], "R1");
    assert_eq!(ai101["causationEventId"], "e-1");

    let ai202 = outcomes.iter().find(|o| o["flightId"] == "AI202").unwrap();
    assert_eq!(ai202["decision"], "REJECTED");
    assert!(ai202["runwayId"].is_null());

    let record = h.store.get("R1").await.unwrap();
    assert_eq!(record.occupied_intervals().len(), 1);
    assert!(record.is_consistent());
}

#[tokio::test(flavor = "multi_thread")]
async fn redelivered_event_settles_once_and_republishes_identically() {
    let h = harness(1, &["R1"]);
    let handle = h.coordinator.clone().start();

    let payload = request_payload("e-1", "AI101", 0, 30);
    for _ in 0..3 {
        h.bus
            .publish("flight.schedule", "AI101", payload.clone())
            .await
            .unwrap();
    }

    let outcomes = collect_outcomes(&h.bus, 3).await;
    handle.shutdown();
    handle.join().await;

    assert_eq!(h.ledger.len(), 1);
    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[1], outcomes[2]);
    assert_eq!(outcomes[0]["decision"], "ASSIGNED");
}

#[tokio::test(flavor = "multi_thread")]
async fn partitioned_workers_never_double_book_a_runway() {
    let h = harness(4, &["R1", "R2"]);
    let handle = h.coordinator.clone().start();

    // 八个航班申请同一个窗口，仅两条跑道可用：恰好两个成功
    for n in 0..8 {
        let flight = format!("AI{n:03}");
        h.bus
            .publish(
                "flight.schedule",
                &flight,
                request_payload(&format!("e-{n}"), &flight, 0, 30),
            )
            .await
            .unwrap();
    }

    let outcomes = collect_outcomes(&h.bus, 8).await;
    handle.shutdown();
    handle.join().await;

    let assigned: Vec<&Value> = outcomes
        .iter()
        .filter(|o| o["decision"] == "ASSIGNED")
        .collect();
    assert_eq!(assigned.len(), 2);
    let runways: std::collections::HashSet<&str> = assigned
        .iter()
        .map(|o| o["runwayId"].as_str().unwrap())
        .collect();
    assert_eq!(runways.len(), 2, "each runway admits exactly one flight");

    for runway in ["R1", "R2"] {
        let record = h.store.get(runway).await.unwrap();
        assert_eq!(record.occupied_intervals().len(), 1);
        assert!(record.is_consistent());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_request_is_dead_lettered_end_to_end() {
    let h = harness(1, &["R1"]);
    let handle = h.coordinator.clone().start();

    let bad = request_payload("e-1", "AI101", 30, 30);
    h.bus
        .publish("flight.schedule", "AI101", bad.clone())
        .await
        .unwrap();

    let mut dlq = h.bus.subscribe("flight.schedule.dlq", "observer", 0).await;
    let dead = tokio::time::timeout(Duration::from_secs(5), dlq.next())
        .await
        .expect("dead letter within timeout")
        .unwrap()
        .unwrap();
    handle.shutdown();
    handle.join().await;

    assert_eq!(dead.payload()["original"], bad);
    assert!(h.ledger.is_empty());
    let record = h.store.get("R1").await.unwrap();
    assert!(record.version().is_new());
}
