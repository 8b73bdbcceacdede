//! 分配协调器（AllocationCoordinator）
//!
//! 统一编排“订阅 → 裁决 → 条件写 → 结论发布”的长驻任务：
//! - 每个输入分区一个工作单元，并行度以分区数为上界；
//! - 正确性不依赖传输层顺序：同一跑道上的竞争完全由状态存储的
//!   条件写（乐观并发）兜底，冲突被检测而非避免，以重试化解；
//! - 幂等台账是任何状态变更前的准入门，record-then-publish 保证
//!   崩溃至多造成重复发布、绝不丢失结论；
//! - 格式错误进死信主题，瞬时故障退避重试、预算耗尽后挂起待人工重放；
//! - 周期清理台账过期条目；
//! - 提供关闭与等待的 `EngineHandle`。
//!
use crate::config::{CoordinatorConfig, rand_jitter};
use crate::error::{EngineError, EngineResult};
use crate::publisher::{DeadLetterPublisher, OutcomePublisher};
use crate::strategy::RunwaySelector;
use bon::Builder;
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tarmac_domain::eventing::{Delivered, EventBus};
use tarmac_domain::flight::FlightScheduleRequest;
use tarmac_domain::outcome::AllocationOutcome;
use tarmac_domain::persist::{
    IdempotencyLedger, LedgerStatus, OutcomeRef, PutOutcome, RunwayStateStore,
};
use tarmac_domain::resolver::{Placement, resolve};
use tarmac_domain::value_object::Window;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 一次投递的最终处置
enum Disposition {
    /// 已得出终态（结论/死信/挂起均已落地），可提交位点
    Settled,
    /// 出站通道也不可用：不提交位点，原地重试同一投递
    Redeliver,
}

/// AllocationCoordinator：
/// - 按分区订阅排程请求并驱动分配流水线
/// - 周期清理幂等台账的过期条目
#[derive(Builder)]
pub struct AllocationCoordinator {
    event_bus: Arc<dyn EventBus>,
    state_store: Arc<dyn RunwayStateStore>,
    ledger: Arc<dyn IdempotencyLedger>,
    selector: Arc<dyn RunwaySelector>,
    #[builder(default)]
    config: CoordinatorConfig,
}

impl AllocationCoordinator {
    /// 启动协调器，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> EngineHandle {
        let token = CancellationToken::new();
        let partitions = self.event_bus.partitions(&self.config.input_topic);
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(partitions as usize + 1);

        for partition in 0..partitions {
            tasks.push(tokio::spawn(Self::worker_loop(
                self.clone(),
                token.clone(),
                partition,
            )));
        }

        // 台账清理（周期任务）
        {
            let ledger = self.ledger.clone();
            let retention = self.config.ledger_retention;
            let interval = self.config.ledger_sweep_interval;

            tasks.push(Self::spawn_periodic(token.clone(), interval, move || {
                let ledger = ledger.clone();
                async move {
                    match ledger.sweep_expired(retention).await {
                        Ok(0) => {}
                        Ok(removed) => tracing::debug!(removed, "swept expired ledger entries"),
                        Err(err) => tracing::warn!("ledger sweep failed: {err}"),
                    }
                }
            }));
        }

        EngineHandle { token, tasks }
    }

    fn spawn_periodic<F, Fut>(
        token: CancellationToken,
        interval: Duration,
        mut f: F,
    ) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => f().await,
                }
            }
        })
    }

    async fn worker_loop(self: Arc<Self>, token: CancellationToken, partition: u32) {
        let mut stream = self
            .event_bus
            .subscribe(
                &self.config.input_topic,
                &self.config.consumer_group,
                partition,
            )
            .await;
        tracing::debug!(partition, "allocation worker started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                maybe_delivered = stream.next() => {
                    match maybe_delivered {
                        Some(Ok(delivered)) => {
                            if self.settle_delivery(&delivered, &token).await {
                                self.commit(&delivered).await;
                            } else {
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            tracing::warn!(partition, "subscription error: {err}");
                        }
                        None => break,
                    }
                }
            }
        }
        tracing::debug!(partition, "allocation worker stopped");
    }

    /// 同一投递反复处理直至落地；未落地的位点之前绝不消费后续消息，
    /// 否则提交更大的位点会把它从重投中永久抹去
    async fn settle_delivery(&self, delivered: &Delivered, token: &CancellationToken) -> bool {
        let mut attempt = 0u32;
        loop {
            match self.handle_delivery(delivered).await {
                Disposition::Settled => return true,
                Disposition::Redeliver => {
                    attempt = attempt.saturating_add(1);
                    tracing::warn!(
                        key = delivered.key(),
                        offset = delivered.offset(),
                        attempt,
                        "outbound channels unavailable, retrying same delivery"
                    );
                    tokio::select! {
                        _ = token.cancelled() => return false,
                        _ = tokio::time::sleep(self.config.infra_retry.delay(attempt)) => {}
                    }
                }
            }
        }
    }

    async fn commit(&self, delivered: &Delivered) {
        if let Err(err) = self
            .event_bus
            .commit(
                &self.config.input_topic,
                &self.config.consumer_group,
                delivered.partition(),
                delivered.offset(),
            )
            .await
        {
            // 至少一次语义下可容忍：重启后从旧位点重放，由台账去重
            tracing::warn!(offset = delivered.offset(), "offset commit failed: {err}");
        }
    }

    /// 处理一次投递直至终态：结论发布、死信或挂起
    async fn handle_delivery(&self, delivered: &Delivered) -> Disposition {
        let mut attempt = 0u32;
        loop {
            match self.process(delivered).await {
                Ok(()) => return Disposition::Settled,
                Err(err) if err.is_permanent() => {
                    tracing::warn!(key = delivered.key(), "dead-lettering request: {err}");
                    return self.dead_letter(delivered, &err).await;
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.infra_retry.max_attempts {
                        tracing::error!(
                            key = delivered.key(),
                            "retry budget exhausted, parking event for manual replay: {err}"
                        );
                        return self.park(delivered, &err).await;
                    }
                    tracing::debug!(key = delivered.key(), attempt, "transient failure: {err}");
                    tokio::time::sleep(self.config.infra_retry.delay(attempt)).await;
                }
            }
        }
    }

    async fn dead_letter(&self, delivered: &Delivered, cause: &EngineError) -> Disposition {
        let publisher = self.dead_letter_publisher();
        match publisher
            .dead_letter(delivered.key(), delivered.payload(), &cause.to_string())
            .await
        {
            Ok(()) => Disposition::Settled,
            Err(err) => {
                tracing::error!(key = delivered.key(), "dead-letter publish failed: {err}");
                Disposition::Redeliver
            }
        }
    }

    async fn park(&self, delivered: &Delivered, cause: &EngineError) -> Disposition {
        let publisher = self.dead_letter_publisher();
        match publisher
            .park(delivered.key(), delivered.payload(), &cause.to_string())
            .await
        {
            Ok(()) => Disposition::Settled,
            Err(err) => {
                tracing::error!(key = delivered.key(), "park publish failed: {err}");
                Disposition::Redeliver
            }
        }
    }

    /// 分配流水线主体
    async fn process(&self, delivered: &Delivered) -> EngineResult<()> {
        let request: FlightScheduleRequest =
            serde_json::from_value(delivered.payload().clone()).map_err(|err| {
                EngineError::validation(format!("malformed flight schedule request: {err}"))
            })?;
        request
            .validate()
            .map_err(|err| EngineError::validation(err.to_string()))?;

        // 幂等准入门：该事件已有结论则只需重发，绝不重新决策
        if let Some(existing) = self
            .ledger
            .find(request.event_id())
            .await
            .map_err(EngineError::transient)?
        {
            return self
                .outcome_publisher()
                .publish_payload(existing.flight_id(), existing.payload())
                .await;
        }

        let outcome = self.allocate(&request).await?;
        self.settle(request.event_id(), &outcome).await
    }

    /// 按候选顺序逐一尝试跑道；全部失败即 Rejected
    async fn allocate(&self, request: &FlightScheduleRequest) -> EngineResult<AllocationOutcome> {
        let window = request
            .window()
            .map_err(|err| EngineError::validation(err.to_string()))?;

        for runway_id in self.selector.candidates(request) {
            if self.try_runway(&runway_id, request.flight_id(), window).await? {
                return Ok(AllocationOutcome::assigned(
                    request.flight_id(),
                    runway_id,
                    request.event_id(),
                ));
            }
        }

        Ok(AllocationOutcome::rejected(
            request.flight_id(),
            request.event_id(),
        ))
    }

    /// 单条跑道上的“读-裁决-条件写”循环
    ///
    /// 版本冲突是预期竞争：就地重试至 `cas_retry_limit`，耗尽后让位给下一候选。
    async fn try_runway(
        &self,
        runway_id: &str,
        flight_id: &str,
        window: Window,
    ) -> EngineResult<bool> {
        for _ in 0..self.config.cas_retry_limit {
            let record = self
                .state_store
                .get(runway_id)
                .await
                .map_err(EngineError::transient)?;

            // 崩溃后重投：该航班已持有完全相同的窗口，直接确认
            if record.contains(flight_id, &window) {
                return Ok(true);
            }

            match resolve(record.occupied_intervals(), flight_id, window) {
                Placement::Conflicts { flight_id: holder } => {
                    tracing::debug!(runway_id, flight_id, holder = %holder, "window conflicts");
                    return Ok(false);
                }
                Placement::Fits(intervals) => {
                    let expected = record.version();
                    let candidate = record.with_intervals(intervals);
                    match self
                        .state_store
                        .conditional_put(candidate, expected)
                        .await
                        .map_err(EngineError::transient)?
                    {
                        PutOutcome::Stored(_) => return Ok(true),
                        PutOutcome::VersionConflict { actual } => {
                            tracing::debug!(
                                runway_id,
                                %expected,
                                %actual,
                                "lost conditional write race, re-reading"
                            );
                            tokio::time::sleep(Duration::from_millis(rand_jitter())).await;
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    /// record-then-publish：先记台账再发布，崩溃至多造成重复发布
    async fn settle(&self, event_id: &str, outcome: &AllocationOutcome) -> EngineResult<()> {
        let payload = serde_json::to_value(outcome).map_err(EngineError::transient)?;
        let outcome_ref = OutcomeRef::builder()
            .flight_id(outcome.flight_id().to_string())
            .decision(outcome.decision())
            .payload(payload)
            .recorded_at(Utc::now())
            .build();

        match self
            .ledger
            .record_if_absent(event_id, outcome_ref)
            .await
            .map_err(EngineError::transient)?
        {
            LedgerStatus::Recorded => {
                // 重新序列化与台账负载逐字节一致（序列化是确定性的）
                self.outcome_publisher().publish(outcome).await?;
                Ok(())
            }
            LedgerStatus::AlreadyPresent(existing) => {
                // 并发处理者已先记录：重发其结论，保持可观测结果唯一
                self.outcome_publisher()
                    .publish_payload(existing.flight_id(), existing.payload())
                    .await
            }
        }
    }

    fn outcome_publisher(&self) -> OutcomePublisher {
        OutcomePublisher::new(
            self.event_bus.clone(),
            self.config.outcome_topic.clone(),
            self.config.infra_retry,
        )
    }

    fn dead_letter_publisher(&self) -> DeadLetterPublisher {
        DeadLetterPublisher::new(
            self.event_bus.clone(),
            self.config.dead_letter_topic.clone(),
            self.config.parked_topic.clone(),
            self.config.infra_retry,
        )
    }
}

/// 引擎运行句柄：用于优雅关闭与等待任务结束
pub struct EngineHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
