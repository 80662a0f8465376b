//! Background expiry sweep
//!
//! Each tick snapshots the store, then handles expired links one record at a
//! time: deleted when auto-delete is on, otherwise their active flag is
//! cleared. The store lock is never held across the whole scan.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info, warn};

use crate::config::CleanupConfig;
use crate::services::notification::LinkNotifier;
use crate::storage::{Link, LinkStore, UserDirectory};

/// 单次清理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Links looked at in this tick
    pub scanned: usize,
    /// Links found expired (whatever happened to them)
    pub expired: usize,
    pub deleted: usize,
    /// Links whose active flag this tick cleared
    pub deactivated: usize,
    /// Idle users dropped from the directory
    pub users_pruned: usize,
}

pub struct ExpirySweeper {
    store: Arc<LinkStore>,
    notifier: Arc<dyn LinkNotifier>,
    users: Option<Arc<UserDirectory>>,
    auto_delete: bool,
    interval: StdDuration,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<LinkStore>,
        notifier: Arc<dyn LinkNotifier>,
        auto_delete: bool,
        interval: StdDuration,
    ) -> Self {
        Self {
            store,
            notifier,
            users: None,
            auto_delete,
            interval,
        }
    }

    pub fn from_config(
        store: Arc<LinkStore>,
        notifier: Arc<dyn LinkNotifier>,
        config: &CleanupConfig,
    ) -> Self {
        Self::new(
            store,
            notifier,
            config.auto_delete_expired,
            StdDuration::from_secs(config.check_interval_minutes.saturating_mul(60)),
        )
    }

    /// Also prune idle users on every tick.
    pub fn with_user_directory(mut self, users: Arc<UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn interval(&self) -> StdDuration {
        self.interval
    }

    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    /// Run one sweep now.
    ///
    /// Every record is re-checked under the store lock before it is
    /// changed, so links edited or removed since the snapshot are skipped.
    pub fn run_once(&self) -> SweepReport {
        let now = Utc::now();
        let snapshot = self.store.all();
        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..SweepReport::default()
        };

        let mut deleted: Vec<Link> = Vec::new();
        let mut deactivated: Vec<Link> = Vec::new();

        for link in snapshot.iter().filter(|l| l.is_expired_at(now)) {
            report.expired += 1;

            if self.auto_delete {
                // 快照之后可能已被删除
                if let Some(removed) = self.store.remove(link.id()) {
                    if let Some(users) = &self.users {
                        users.detach_link(removed.owner(), removed.id());
                    }
                    deleted.push(removed);
                }
                continue;
            }

            let changed = self.store.update(link.id(), |current| {
                if current.is_active() && current.is_expired_at(now) {
                    current.deactivate();
                    Some(current.clone())
                } else {
                    None
                }
            });
            match changed {
                Some(Some(link)) => deactivated.push(link),
                Some(None) => {}
                None => debug!(
                    "ExpirySweeper: link '{}' vanished before it could be deactivated",
                    link.code()
                ),
            }
        }

        report.deleted = deleted.len();
        report.deactivated = deactivated.len();

        if !deleted.is_empty() {
            self.notifier.links_cleaned_up(&deleted);
        }
        if !deactivated.is_empty() {
            self.notifier.links_deactivated(&deactivated);
        }

        if let Some(users) = &self.users {
            report.users_pruned = users.cleanup_inactive(now);
        }

        if report.deleted > 0 || report.deactivated > 0 {
            info!(
                "ExpirySweeper: scanned {}, deleted {}, deactivated {}",
                report.scanned, report.deleted, report.deactivated
            );
        } else {
            debug!("ExpirySweeper: scanned {}, nothing to do", report.scanned);
        }
        report
    }

    /// 启动后台清理任务
    ///
    /// The first sweep runs immediately, then once per interval. Ticks that
    /// fall behind are delayed rather than bunched up.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = self.interval;
        let auto_delete = self.auto_delete;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                    }
                    changed = stop_rx.changed() => {
                        // 发送端被丢弃也视为停止信号
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("ExpirySweeper: loop exited");
        });

        info!(
            "Expiry sweeper started (interval: {}s, auto delete: {})",
            period.as_secs(),
            auto_delete
        );

        SweeperHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop scheduling ticks and wait up to `grace` for an in-flight one.
    ///
    /// Returns `true` when the task ended on its own, `false` when it had to
    /// be aborted.
    pub async fn shutdown(self, grace: StdDuration) -> bool {
        let _ = self.stop.send(true);

        let mut task = self.task;
        match timeout(grace, &mut task).await {
            Ok(Ok(())) => {
                info!("Expiry sweeper stopped");
                true
            }
            Ok(Err(e)) => {
                error!("Expiry sweeper task failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Expiry sweeper did not stop within {:?}, aborting", grace);
                task.abort();
                false
            }
        }
    }
}
