use crate::core::reorder::{PersistCall, PersistencePlan};
use crate::domain::ports::{OrderStore, SyncMode};
use crate::utils::error::{OrganizerError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

pub type Ticket = u64;

/// 單一 plan 的執行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Committed {
        ticket: Ticket,
        calls: usize,
        finished_at: DateTime<Utc>,
    },
    Failed {
        ticket: Ticket,
        /// 失敗前已成功送出的呼叫數
        completed: usize,
        call: String,
        error: String,
        finished_at: DateTime<Utc>,
    },
}

impl SyncOutcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            SyncOutcome::Committed { ticket, .. } | SyncOutcome::Failed { ticket, .. } => *ticket,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}

async fn execute_call(store: &dyn OrderStore, call: &PersistCall) -> Result<()> {
    match call {
        PersistCall::CategoryOrder(entries) => store.update_category_order(entries).await,
        PersistCall::SiteOrder { entries, .. } => store.update_site_order(entries).await,
        PersistCall::MoveSite { site, category } => store.move_site(*site, *category).await,
    }
}

/// Issues every call of `plan` in order, awaiting each one before the next.
/// Stops at the first failure; nothing is retried or rolled back.
pub async fn execute_plan(store: &dyn OrderStore, ticket: Ticket, plan: &PersistencePlan) -> SyncOutcome {
    for (completed, call) in plan.calls().iter().enumerate() {
        tracing::debug!(ticket, "📤 Sending {}", call);
        if let Err(e) = execute_call(store, call).await {
            tracing::warn!(ticket, "❌ Persistence call {} failed: {}", call, e);
            return SyncOutcome::Failed {
                ticket,
                completed,
                call: call.label(),
                error: e.to_string(),
                finished_at: Utc::now(),
            };
        }
    }

    tracing::info!(ticket, calls = plan.len(), "✅ Order persisted");
    SyncOutcome::Committed {
        ticket,
        calls: plan.len(),
        finished_at: Utc::now(),
    }
}

enum Command {
    Run(Ticket, PersistencePlan),
    Flush(oneshot::Sender<()>),
}

async fn run_and_report(
    store: Arc<dyn OrderStore>,
    ticket: Ticket,
    plan: PersistencePlan,
    outcomes: mpsc::UnboundedSender<SyncOutcome>,
) {
    let outcome = execute_plan(store.as_ref(), ticket, &plan).await;
    // 接收端已關閉時就丟棄結果
    let _ = outcomes.send(outcome);
}

async fn worker_loop(
    store: Arc<dyn OrderStore>,
    mode: SyncMode,
    mut commands: mpsc::UnboundedReceiver<Command>,
    outcomes: mpsc::UnboundedSender<SyncOutcome>,
) {
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(Command::Run(ticket, plan)) => match mode {
                    SyncMode::Queued => {
                        run_and_report(store.clone(), ticket, plan, outcomes.clone()).await;
                    }
                    SyncMode::Concurrent => {
                        in_flight.spawn(run_and_report(store.clone(), ticket, plan, outcomes.clone()));
                    }
                },
                Some(Command::Flush(done)) => {
                    while in_flight.join_next().await.is_some() {}
                    let _ = done.send(());
                }
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }

    while in_flight.join_next().await.is_some() {}
    tracing::debug!("order-sync worker stopped");
}

/// Fire-and-forget issuer of persistence plans.
///
/// `submit` never waits on the network. In `SyncMode::Queued` one worker
/// runs plans in submission order, so the durable order always ends at the
/// last gesture. `SyncMode::Concurrent` lets plans overlap and land in any
/// order. Results arrive as `SyncOutcome`s and are buffered until read with
/// `try_next_outcome`, `next_outcome` or `drain_outcomes`; a caller that
/// submits without ever reading them keeps every outcome in memory.
pub struct SyncDispatcher {
    commands: mpsc::UnboundedSender<Command>,
    outcomes: mpsc::UnboundedReceiver<SyncOutcome>,
    next_ticket: Ticket,
    mode: SyncMode,
    worker: JoinHandle<()>,
}

impl SyncDispatcher {
    /// 需要在 tokio runtime 內呼叫
    pub fn spawn(store: Arc<dyn OrderStore>, mode: SyncMode) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(store, mode, command_rx, outcome_tx));

        Self {
            commands: command_tx,
            outcomes: outcome_rx,
            next_ticket: 1,
            mode,
            worker,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn submit(&mut self, plan: PersistencePlan) -> Result<Ticket> {
        let ticket = self.next_ticket;
        self.commands
            .send(Command::Run(ticket, plan))
            .map_err(|_| OrganizerError::DispatcherClosed)?;
        self.next_ticket += 1;
        tracing::debug!(ticket, mode = ?self.mode, "plan submitted");
        Ok(ticket)
    }

    /// 等待目前已提交的 plan 全部結束
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(done_tx))
            .map_err(|_| OrganizerError::DispatcherClosed)?;
        done_rx.await.map_err(|_| OrganizerError::DispatcherClosed)
    }

    pub fn try_next_outcome(&mut self) -> Option<SyncOutcome> {
        self.outcomes.try_recv().ok()
    }

    pub async fn next_outcome(&mut self) -> Option<SyncOutcome> {
        self.outcomes.recv().await
    }

    pub fn drain_outcomes(&mut self) -> Vec<SyncOutcome> {
        std::iter::from_fn(|| self.try_next_outcome()).collect()
    }

    /// 關閉 worker，等待進行中的 plan 完成
    pub async fn shutdown(self) {
        let Self { commands, worker, .. } = self;
        drop(commands);
        if let Err(e) = worker.await {
            tracing::warn!("order-sync worker ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryId, OrderEntry, SiteId};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingStore {
        log: Mutex<Vec<String>>,
        fail_on: Option<String>,
        // 依 entries 第一筆 id 決定延遲，模擬慢速請求
        delays: HashMap<i64, Duration>,
    }

    impl RecordingStore {
        fn failing_on(label: &str) -> Self {
            Self {
                fail_on: Some(label.to_string()),
                ..Self::default()
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        async fn record(&self, label: String, first_id: Option<i64>) -> Result<()> {
            if let Some(delay) = first_id.and_then(|id| self.delays.get(&id)) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail_on.as_deref() == Some(label.as_str()) {
                return Err(OrganizerError::persistence(label, Some(500), "boom"));
            }
            self.log.lock().unwrap().push(label);
            Ok(())
        }
    }

    #[async_trait]
    impl OrderStore for RecordingStore {
        async fn update_category_order(&self, entries: &[OrderEntry]) -> Result<()> {
            let ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();
            self.record(format!("categories:{}", ids.join(",")), entries.first().map(|e| e.id))
                .await
        }

        async fn update_site_order(&self, entries: &[OrderEntry]) -> Result<()> {
            let ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();
            self.record(format!("sites:{}", ids.join(",")), entries.first().map(|e| e.id))
                .await
        }

        async fn move_site(&self, site: SiteId, category: CategoryId) -> Result<()> {
            self.record(format!("move:{}->{}", site, category), None).await
        }
    }

    fn cross_move_plan() -> PersistencePlan {
        PersistencePlan::new(vec![
            PersistCall::SiteOrder {
                category: CategoryId(1),
                entries: vec![OrderEntry { id: 2, order: 0 }],
            },
            PersistCall::SiteOrder {
                category: CategoryId(2),
                entries: vec![OrderEntry { id: 1, order: 0 }],
            },
            PersistCall::MoveSite {
                site: SiteId(1),
                category: CategoryId(2),
            },
        ])
    }

    fn category_plan(ids: &[i64]) -> PersistencePlan {
        PersistencePlan::new(vec![PersistCall::CategoryOrder(
            ids.iter()
                .enumerate()
                .map(|(order, id)| OrderEntry {
                    id: *id,
                    order: order as i64,
                })
                .collect(),
        )])
    }

    #[tokio::test]
    async fn test_execute_plan_issues_calls_in_order() {
        let store = RecordingStore::default();
        let outcome = execute_plan(&store, 1, &cross_move_plan()).await;

        assert!(matches!(outcome, SyncOutcome::Committed { ticket: 1, calls: 3, .. }));
        assert_eq!(store.log(), vec!["sites:2", "sites:1", "move:1->2"]);
    }

    #[tokio::test]
    async fn test_execute_plan_stops_at_first_failure() {
        let store = RecordingStore::failing_on("sites:1");
        let outcome = execute_plan(&store, 4, &cross_move_plan()).await;

        match outcome {
            SyncOutcome::Failed {
                ticket,
                completed,
                call,
                ..
            } => {
                assert_eq!(ticket, 4);
                assert_eq!(completed, 1);
                assert_eq!(call, "update-order/sites(category 2)");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // move-site 沒有送出
        assert_eq!(store.log(), vec!["sites:2"]);
    }

    #[tokio::test]
    async fn test_queued_mode_lands_plans_in_submission_order() {
        let store = Arc::new(RecordingStore {
            delays: HashMap::from([(3, Duration::from_millis(80))]),
            ..RecordingStore::default()
        });
        let mut dispatcher = SyncDispatcher::spawn(store.clone(), SyncMode::Queued);

        let first = dispatcher.submit(category_plan(&[3, 1, 2])).unwrap();
        let second = dispatcher.submit(category_plan(&[1, 2, 3])).unwrap();
        assert_eq!((first, second), (1, 2));

        dispatcher.flush().await.unwrap();
        assert_eq!(store.log(), vec!["categories:3,1,2", "categories:1,2,3"]);

        let tickets: Vec<Ticket> = dispatcher.drain_outcomes().iter().map(|o| o.ticket()).collect();
        assert_eq!(tickets, vec![1, 2]);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_concurrent_mode_allows_out_of_order_landing() {
        let store = Arc::new(RecordingStore {
            delays: HashMap::from([(3, Duration::from_millis(150))]),
            ..RecordingStore::default()
        });
        let mut dispatcher = SyncDispatcher::spawn(store.clone(), SyncMode::Concurrent);

        dispatcher.submit(category_plan(&[3, 1, 2])).unwrap();
        dispatcher.submit(category_plan(&[1, 2, 3])).unwrap();
        dispatcher.flush().await.unwrap();

        // 較慢的第一個 plan 最後落地
        assert_eq!(store.log(), vec!["categories:1,2,3", "categories:3,1,2"]);
        assert_eq!(dispatcher.drain_outcomes().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_reported_as_outcomes() {
        let store = Arc::new(RecordingStore::failing_on("move:1->2"));
        let mut dispatcher = SyncDispatcher::spawn(store, SyncMode::Queued);

        let ticket = dispatcher.submit(cross_move_plan()).unwrap();
        let outcome = dispatcher.next_outcome().await.unwrap();

        assert_eq!(outcome.ticket(), ticket);
        assert!(outcome.is_failure());
        assert!(dispatcher.try_next_outcome().is_none());
    }
}
