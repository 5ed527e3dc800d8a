//! End-to-end pipeline tests: side-effect discipline across abort and
//! commit paths, deployment dispatch decoupling, and pruning of committed
//! trees.

use async_trait::async_trait;
use convoy_group::{
    DeployError, DeploymentScheduler, GroupError, GroupManager, GroupManagerConfig,
    GroupRepository, GroupValidator, InMemoryGroupRepository, PortRange, RepositoryError,
    StructuralValidator, Violation,
};
use convoy_types::{AppDefinition, Group, GroupEvent, PathId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn path(s: &str) -> PathId {
    PathId::parse(s).unwrap()
}

/// Repository wrapper that counts store calls and remembers the last value
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryGroupRepository,
    store_calls: AtomicUsize,
    last_stored: Mutex<Option<Group>>,
}

#[async_trait]
impl GroupRepository for CountingRepository {
    async fn load(&self, key: &str) -> Result<Option<Group>, RepositoryError> {
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, root: Group) -> Result<Group, RepositoryError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_stored.lock().unwrap() = Some(root.clone());
        self.inner.store(key, root).await
    }
}

/// Scheduler that records every (old, new) pair it is handed
#[derive(Default)]
struct RecordingScheduler {
    dispatches: Mutex<Vec<(Group, Group)>>,
}

#[async_trait]
impl DeploymentScheduler for RecordingScheduler {
    async fn deploy(&self, old: &Group, new: &Group) -> Result<(), DeployError> {
        self.dispatches
            .lock()
            .unwrap()
            .push((old.clone(), new.clone()));
        Ok(())
    }
}

struct FailingScheduler;

#[async_trait]
impl DeploymentScheduler for FailingScheduler {
    async fn deploy(&self, _old: &Group, _new: &Group) -> Result<(), DeployError> {
        Err(DeployError("agents unreachable".into()))
    }
}

struct FailingRepository;

#[async_trait]
impl GroupRepository for FailingRepository {
    async fn load(&self, _key: &str) -> Result<Option<Group>, RepositoryError> {
        Ok(None)
    }

    async fn store(&self, _key: &str, _root: Group) -> Result<Group, RepositoryError> {
        Err(RepositoryError::Backend("disk full".into()))
    }
}

struct RejectEverythingValidator;

#[async_trait]
impl GroupValidator for RejectEverythingValidator {
    async fn validate(&self, root: &Group) -> Result<(), Vec<Violation>> {
        Err(vec![Violation::new(root.id.clone(), "rejected by policy")])
    }
}

fn config() -> GroupManagerConfig {
    GroupManagerConfig {
        port_range: PortRange::new(10, 20),
        ..GroupManagerConfig::default()
    }
}

#[tokio::test]
async fn commit_stores_once_and_deploys_once_with_baseline_and_stored() {
    let repo = Arc::new(CountingRepository::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(StructuralValidator),
        scheduler.clone(),
        config(),
    )
    .unwrap();

    let stored = manager
        .update(|root| root.put_app(AppDefinition::new(path("/web")).with_ports(vec![0])))
        .await
        .unwrap();

    assert_eq!(repo.store_calls.load(Ordering::SeqCst), 1);
    assert_eq!(repo.last_stored.lock().unwrap().as_ref(), Some(&stored));

    let dispatches = scheduler.dispatches.lock().unwrap();
    assert_eq!(dispatches.len(), 1);
    let (old, new) = &dispatches[0];
    assert!(old.is_empty(), "baseline of a first commit is the empty root");
    assert_eq!(new, &stored);
}

#[tokio::test]
async fn allocation_failure_has_no_side_effects() {
    let repo = Arc::new(CountingRepository::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(StructuralValidator),
        scheduler.clone(),
        config(),
    )
    .unwrap();

    let err = manager
        .update(|root| root.put_app(AppDefinition::new(path("/big")).with_ports(vec![0; 64])))
        .await
        .unwrap_err();

    assert!(matches!(err, GroupError::PortExhausted { .. }));
    assert_eq!(repo.store_calls.load(Ordering::SeqCst), 0);
    assert!(scheduler.dispatches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validation_failure_has_no_side_effects() {
    let repo = Arc::new(CountingRepository::default());
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(RejectEverythingValidator),
        scheduler.clone(),
        config(),
    )
    .unwrap();

    let err = manager
        .update(|root| root.put_app(AppDefinition::new(path("/svc"))))
        .await
        .unwrap_err();

    match err {
        GroupError::ConstraintViolation(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].constraint, "rejected by policy");
        }
        other => panic!("expected ConstraintViolation, got {other:?}"),
    }
    assert_eq!(repo.store_calls.load(Ordering::SeqCst), 0);
    assert!(scheduler.dispatches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn persistence_failure_aborts_without_deploying() {
    let scheduler = Arc::new(RecordingScheduler::default());
    let manager = GroupManager::new(
        Arc::new(FailingRepository),
        Arc::new(StructuralValidator),
        scheduler.clone(),
        config(),
    )
    .unwrap();

    let err = manager
        .update(|root| root.put_app(AppDefinition::new(path("/svc"))))
        .await
        .unwrap_err();

    assert!(matches!(err, GroupError::Persistence(_)));
    assert!(scheduler.dispatches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dispatch_failure_after_commit_does_not_fail_the_caller() {
    let repo = Arc::new(CountingRepository::default());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(StructuralValidator),
        Arc::new(FailingScheduler),
        config(),
    )
    .unwrap();
    let mut events = manager.subscribe();

    // the commit succeeds even though dispatch fails
    let stored = manager
        .update(|root| root.put_app(AppDefinition::new(path("/svc"))))
        .await
        .unwrap();
    assert_eq!(repo.store_calls.load(Ordering::SeqCst), 1);

    let envelope = events.recv().await.unwrap();
    match envelope.event {
        GroupEvent::DeploymentDispatchFailed { version, reason } => {
            assert_eq!(version, stored.version);
            assert!(reason.contains("agents unreachable"));
        }
        other => panic!("expected DeploymentDispatchFailed first, got {other:?}"),
    }

    // the change event still follows
    let envelope = events.recv().await.unwrap();
    assert!(matches!(envelope.event, GroupEvent::GroupChanged { .. }));
}

#[tokio::test]
async fn removing_the_last_app_prunes_empty_ancestors() {
    let repo = Arc::new(CountingRepository::default());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(StructuralValidator),
        Arc::new(RecordingScheduler::default()),
        config(),
    )
    .unwrap();

    manager
        .update(|root| root.put_app(AppDefinition::new(path("/a/b/c/svc"))))
        .await
        .unwrap();

    let stored = manager
        .update(|root| root.remove_app(&path("/a/b/c/svc")))
        .await
        .unwrap();

    // all three emptied ancestors are gone from the committed tree, and the
    // repository received exactly that pruned form
    assert!(stored.groups.is_empty());
    assert_eq!(stored.id, PathId::root());
    assert_eq!(repo.last_stored.lock().unwrap().as_ref(), Some(&stored));
}

#[tokio::test]
async fn trees_stored_under_distinct_keys_are_independent() {
    let repo = Arc::new(InMemoryGroupRepository::new());
    let manager = GroupManager::new(
        repo.clone(),
        Arc::new(StructuralValidator),
        Arc::new(RecordingScheduler::default()),
        config(),
    )
    .unwrap();

    manager
        .update_with_key("blue", |root| {
            root.put_app(AppDefinition::new(path("/svc")).with_ports(vec![0]))
        })
        .await
        .unwrap();
    let green = manager
        .update_with_key("green", |root| root)
        .await
        .unwrap();

    assert!(green.is_empty());
    assert!(repo.load("blue").await.unwrap().unwrap().app(&path("/svc")).is_some());
}
