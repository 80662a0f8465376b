//! ExpirySweeper 集成测试

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use quotalink::services::{ExpirySweeper, LinkNotifier, SweepReport};
use quotalink::storage::{Link, LinkStore, UserDirectory};

/// 记录批量通知
#[derive(Default)]
struct BatchRecorder {
    cleaned: Mutex<Vec<Vec<String>>>,
    deactivated: Mutex<Vec<Vec<String>>>,
}

fn codes(links: &[Link]) -> Vec<String> {
    let mut codes: Vec<String> = links.iter().map(|l| l.code().to_string()).collect();
    codes.sort();
    codes
}

impl LinkNotifier for BatchRecorder {
    fn links_cleaned_up(&self, links: &[Link]) {
        self.cleaned.lock().unwrap().push(codes(links));
    }

    fn links_deactivated(&self, links: &[Link]) {
        self.deactivated.lock().unwrap().push(codes(links));
    }
}

fn expired(owner: Uuid, code: &str) -> Link {
    Link::builder(owner, "https://example.com/old", code)
        .created_at(Utc::now() - Duration::hours(30))
        .expires_at(Utc::now() - Duration::hours(6))
        .build()
        .unwrap()
}

fn live(owner: Uuid, code: &str) -> Link {
    Link::builder(owner, "https://example.com/new", code)
        .build()
        .unwrap()
}

// =============================================================================
// 单次清理
// =============================================================================

#[test]
fn test_auto_delete_removes_only_expired() {
    let store = Arc::new(LinkStore::new());
    let users = Arc::new(UserDirectory::new(168));
    let recorder = Arc::new(BatchRecorder::default());
    let owner = Uuid::new_v4();
    users.get_or_create(Some(owner));

    let old = expired(owner, "old0001");
    let fresh = live(owner, "new0001");
    users.attach_link(owner, old.id());
    users.attach_link(owner, fresh.id());
    store.put(old.clone()).unwrap();
    store.put(fresh.clone()).unwrap();

    let sweeper = ExpirySweeper::new(
        store.clone(),
        recorder.clone(),
        true,
        StdDuration::from_secs(300),
    )
    .with_user_directory(users.clone());

    let report = sweeper.run_once();
    assert_eq!(
        report,
        SweepReport {
            scanned: 2,
            expired: 1,
            deleted: 1,
            deactivated: 0,
            users_pruned: 0,
        }
    );
    assert!(store.find_by_code("old0001").is_none());
    assert!(store.find_by_code("new0001").is_some());
    assert_eq!(store.find_by_owner(owner).len(), 1);

    let user = users.find(owner).unwrap();
    assert!(!user.owns_link(old.id()));
    assert!(user.owns_link(fresh.id()));

    assert_eq!(
        *recorder.cleaned.lock().unwrap(),
        vec![vec!["old0001".to_string()]]
    );
}

#[test]
fn test_deactivate_mode_is_idempotent() {
    let store = Arc::new(LinkStore::new());
    let recorder = Arc::new(BatchRecorder::default());
    let owner = Uuid::new_v4();
    store.put(expired(owner, "old0001")).unwrap();
    store.put(expired(owner, "old0002")).unwrap();
    store.put(live(owner, "new0001")).unwrap();

    let sweeper = ExpirySweeper::new(
        store.clone(),
        recorder.clone(),
        false,
        StdDuration::from_secs(300),
    );

    let first = sweeper.run_once();
    assert_eq!(first.expired, 2);
    assert_eq!(first.deactivated, 2);
    assert_eq!(store.count(), 3);
    assert!(!store.find_by_code("old0001").unwrap().is_active());
    assert!(store.find_by_code("new0001").unwrap().is_active());

    let second = sweeper.run_once();
    assert_eq!(second.expired, 2);
    assert_eq!(second.deactivated, 0);

    assert_eq!(
        *recorder.deactivated.lock().unwrap(),
        vec![vec!["old0001".to_string(), "old0002".to_string()]]
    );
    assert!(recorder.cleaned.lock().unwrap().is_empty());
}

#[test]
fn test_sweep_prunes_idle_users() {
    let store = Arc::new(LinkStore::new());
    let users = Arc::new(UserDirectory::new(1));
    let idle = users.get_or_create(None).id();
    let busy = users.get_or_create(None).id();
    users.set_last_activity(idle, Utc::now() - Duration::hours(3));

    let sweeper = ExpirySweeper::new(
        store,
        Arc::new(BatchRecorder::default()),
        true,
        StdDuration::from_secs(300),
    )
    .with_user_directory(users.clone());

    let report = sweeper.run_once();
    assert_eq!(report.users_pruned, 1);
    assert!(!users.exists(idle));
    assert!(users.exists(busy));
}

#[test]
fn test_huge_session_ttl_prunes_nobody() {
    let users = Arc::new(UserDirectory::new(u32::MAX));
    let old = users.get_or_create(None).id();
    users.set_last_activity(old, Utc::now() - Duration::hours(10_000));

    let sweeper = ExpirySweeper::new(
        Arc::new(LinkStore::new()),
        Arc::new(BatchRecorder::default()),
        true,
        StdDuration::from_secs(300),
    )
    .with_user_directory(users.clone());

    let report = sweeper.run_once();
    assert_eq!(report.users_pruned, 0);
    assert!(users.exists(old));
}

// =============================================================================
// 后台任务
// =============================================================================

#[tokio::test]
async fn test_background_task_sweeps_and_stops() {
    let store = Arc::new(LinkStore::new());
    store.put(expired(Uuid::new_v4(), "old0001")).unwrap();

    let sweeper = Arc::new(ExpirySweeper::new(
        store.clone(),
        Arc::new(BatchRecorder::default()),
        true,
        StdDuration::from_secs(3600),
    ));
    let handle = sweeper.start();

    // 首次 tick 立即执行
    for _ in 0..50 {
        if store.count() == 0 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    assert_eq!(store.count(), 0);
    assert!(!handle.is_finished());

    assert!(handle.shutdown(StdDuration::from_secs(2)).await);
}

#[tokio::test]
async fn test_background_task_deactivates_when_not_deleting() {
    let store = Arc::new(LinkStore::new());
    store.put(expired(Uuid::new_v4(), "old0001")).unwrap();

    let sweeper = Arc::new(ExpirySweeper::new(
        store.clone(),
        Arc::new(BatchRecorder::default()),
        false,
        StdDuration::from_secs(3600),
    ));
    let handle = sweeper.start();

    for _ in 0..50 {
        if !store.find_by_code("old0001").unwrap().is_active() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    assert!(!store.find_by_code("old0001").unwrap().is_active());
    assert_eq!(store.count(), 1);

    assert!(handle.shutdown(StdDuration::from_secs(2)).await);
}

#[tokio::test]
async fn test_shutdown_without_any_expired_links() {
    let sweeper = Arc::new(ExpirySweeper::new(
        Arc::new(LinkStore::new()),
        Arc::new(BatchRecorder::default()),
        false,
        StdDuration::from_millis(10),
    ));
    let handle = sweeper.start();
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert!(handle.shutdown(StdDuration::from_secs(2)).await);
}
