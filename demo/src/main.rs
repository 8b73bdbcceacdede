//! 内存栈端到端示例：
//! 启动分配协调器，提交若干排程请求，打印分配结论。
//!
use futures_util::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tarmac_domain::eventing::{EventBus, InMemoryEventBus};
use tarmac_domain::persist::{
    IdempotencyLedger, InMemoryIdempotencyLedger, InMemoryRunwayStore, RunwayStateStore,
};
use tarmac_engine::coordinator::AllocationCoordinator;
use tarmac_engine::strategy::{FixedPrioritySelector, RunwaySelector};
use ulid::Ulid;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let bus = Arc::new(InMemoryEventBus::new(1));
    let store = Arc::new(InMemoryRunwayStore::new());
    let ledger = Arc::new(InMemoryIdempotencyLedger::new());

    let coordinator = Arc::new(
        AllocationCoordinator::builder()
            .event_bus(bus.clone() as Arc<dyn EventBus>)
            .state_store(store.clone() as Arc<dyn RunwayStateStore>)
            .ledger(ledger.clone() as Arc<dyn IdempotencyLedger>)
            .selector(Arc::new(FixedPrioritySelector::new(["R1", "R2"]))
                as Arc<dyn RunwaySelector>)
            .build(),
    );
    let handle = coordinator.start();

    // AI101 先到先得，AI202 与其重叠落到 R2，AI303 与 AI101 首尾相接共用 R1
    let requests = [
        ("AI101", "10:00", "10:30"),
        ("AI202", "10:15", "10:45"),
        ("AI303", "10:30", "10:50"),
    ];
    for (flight, start, end) in requests {
        let payload = json!({
            "eventId": Ulid::new().to_string(),
            "flightId": flight,
            "originCode": "DEL",
            "destinationCode": "BOM",
            "windowStart": format!("2026-03-01T{start}:00Z"),
            "windowEnd": format!("2026-03-01T{end}:00Z"),
            "submittedAt": "2026-03-01T09:00:00Z",
        });
        bus.publish("flight.schedule", flight, payload)
            .await
            .expect("publish schedule request");
    }

    let mut outcomes = bus.subscribe("runway.status", "demo", 0).await;
    for _ in 0..requests.len() {
        let delivered = tokio::time::timeout(Duration::from_secs(5), outcomes.next())
            .await
            .expect("outcome within timeout")
            .expect("outcome stream open")
            .expect("outcome delivery");
        let outcome = delivered.payload();
        println!(
            "{} -> {} (runway: {})",
            outcome["flightId"], outcome["decision"], outcome["runwayId"]
        );
    }

    for runway in ["R1", "R2"] {
        let record = store.get(runway).await.expect("read runway record");
        println!(
            "{}: {} interval(s) at {}",
            runway,
            record.occupied_intervals().len(),
            record.version()
        );
    }

    handle.shutdown();
    handle.join().await;
}
