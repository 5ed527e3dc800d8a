//! Group Manager - serialized update transactions over the group tree
//!
//! The manager funnels every transaction through a single worker task, so
//! the load-transform-store sequence for different transactions never
//! interleaves against the same tree. Callers are not blocked: `update`
//! only awaits its own transaction's reply.
//!
//! Pipeline per transaction: load baseline, apply the caller's transform,
//! allocate dynamic ports, validate, prune empty groups, persist, dispatch
//! deployment, publish the change event. Allocation and validation failures
//! abort with no external side effect; a persistence failure aborts with no
//! deployment; a deployment dispatch failure after a successful store is
//! reported through the event stream but never fails the caller, since the
//! tree is already committed.

use crate::config::GroupManagerConfig;
use crate::error::{GroupError, Result};
use crate::ports::assign_dynamic_ports;
use crate::repository::GroupRepository;
use crate::scheduler::DeploymentScheduler;
use crate::validate::GroupValidator;
use convoy_types::{Group, GroupEvent, GroupEventEnvelope};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};

/// Caller-supplied tree transform
pub type Transform = Box<dyn FnOnce(Group) -> Group + Send>;

struct Transaction {
    key: String,
    transform: Transform,
    reply: oneshot::Sender<Result<Group>>,
}

/// Orchestrates update transactions end-to-end
///
/// Cheap to clone; all clones feed the same worker and share its FIFO
/// ordering guarantee.
#[derive(Clone)]
pub struct GroupManager {
    queue: mpsc::Sender<Transaction>,
    event_tx: broadcast::Sender<GroupEventEnvelope>,
    root_key: String,
}

impl GroupManager {
    /// Create a manager and spawn its worker task
    pub fn new(
        repository: Arc<dyn GroupRepository>,
        validator: Arc<dyn GroupValidator>,
        scheduler: Arc<dyn DeploymentScheduler>,
        config: GroupManagerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (queue, rx) = mpsc::channel(config.queue_capacity);
        let (event_tx, _) = broadcast::channel(256);

        let worker = Worker {
            repository,
            validator,
            scheduler,
            config: config.clone(),
            event_tx: event_tx.clone(),
        };
        tokio::spawn(worker.run(rx));

        Ok(Self {
            queue,
            event_tx,
            root_key: config.root_key,
        })
    }

    /// Run one update transaction against the root tree
    ///
    /// The transform may build an arbitrary new tree from the baseline.
    /// Transactions commit in call order; the returned future resolves with
    /// the stored tree once this transaction reaches a terminal state.
    /// Dropping the future does not cancel the transaction.
    pub async fn update<F>(&self, transform: F) -> Result<Group>
    where
        F: FnOnce(Group) -> Group + Send + 'static,
    {
        let key = self.root_key.clone();
        self.update_with_key(&key, transform).await
    }

    /// Run one update transaction against the tree stored under `key`
    pub async fn update_with_key<F>(&self, key: &str, transform: F) -> Result<Group>
    where
        F: FnOnce(Group) -> Group + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.queue
            .send(Transaction {
                key: key.to_string(),
                transform: Box::new(transform),
                reply,
            })
            .await
            .map_err(|_| GroupError::QueueClosed)?;

        rx.await.map_err(|_| GroupError::QueueClosed)?
    }

    /// Subscribe to committed-change and dispatch-failure events
    pub fn subscribe(&self) -> broadcast::Receiver<GroupEventEnvelope> {
        self.event_tx.subscribe()
    }
}

struct Worker {
    repository: Arc<dyn GroupRepository>,
    validator: Arc<dyn GroupValidator>,
    scheduler: Arc<dyn DeploymentScheduler>,
    config: GroupManagerConfig,
    event_tx: broadcast::Sender<GroupEventEnvelope>,
}

impl Worker {
    // Single consumer: one transaction body at a time, strict FIFO. The
    // queue slot is held across every await in `execute`, success or abort.
    async fn run(self, mut rx: mpsc::Receiver<Transaction>) {
        while let Some(txn) = rx.recv().await {
            let result = self.execute(&txn.key, txn.transform).await;
            // the caller may have abandoned its future; the transaction
            // still ran to a terminal state
            let _ = txn.reply.send(result);
        }
        info!("group manager worker stopped");
    }

    async fn execute(&self, key: &str, transform: Transform) -> Result<Group> {
        // 1. Load the baseline; a missing tree means an empty root group
        let baseline = self
            .repository
            .load(key)
            .await
            .map_err(|e| GroupError::Persistence(e.to_string()))?
            .unwrap_or_else(Group::root);

        // 2. Transform, stamped with this transaction's timestamp
        let candidate = transform(baseline.clone()).with_version(chrono::Utc::now());

        // 3. Allocate dynamic ports; abort with no side effects on failure
        let allocated = assign_dynamic_ports(&candidate, &self.config.port_range)?;

        // 4. Validate; abort with no side effects on failure
        self.validator
            .validate(&allocated)
            .await
            .map_err(GroupError::ConstraintViolation)?;

        // 5. Prune empty groups; the root survives even when empty
        let pruned = allocated.prune();

        // 6. Persist; failure aborts before any deployment
        let stored = self
            .repository
            .store(key, pruned)
            .await
            .map_err(|e| GroupError::Persistence(e.to_string()))?;

        // 7. Dispatch deployment of the delta. The tree is committed at
        //    this point, so dispatch failure is reported via events only.
        if let Err(e) = self.scheduler.deploy(&baseline, &stored).await {
            warn!(key, error = %e, "deployment dispatch failed after commit");
            self.emit(GroupEvent::DeploymentDispatchFailed {
                version: stored.version,
                reason: e.to_string(),
            });
        }

        // 8. Publish the change
        self.emit(GroupEvent::GroupChanged {
            root: stored.clone(),
        });

        info!(
            key,
            version = %stored.version,
            apps = stored.transitive_apps().len(),
            "group update committed"
        );

        Ok(stored)
    }

    fn emit(&self, event: GroupEvent) {
        // best-effort: no subscribers is fine
        let _ = self.event_tx.send(GroupEventEnvelope::new(event));
    }
}
