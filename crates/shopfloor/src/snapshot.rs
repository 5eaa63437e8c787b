//! Cached read model for dashboards and the background refresh loop.
//!
//! The snapshot is a side channel: it re-reads every store on a timer or on
//! demand, and the orchestrator never consults it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::model::{Job, Machine, Project};
use crate::store::{StoreResult, Stores};
use crate::views;
use crate::Clock;

#[derive(Debug, Default)]
struct SnapshotData {
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    projects: Vec<Project>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Point-in-time copy of jobs, machines and projects.
pub struct ShopSnapshot {
    clock: Arc<dyn Clock>,
    data: RwLock<SnapshotData>,
}

impl ShopSnapshot {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            data: RwLock::new(SnapshotData::default()),
        }
    }

    fn data(&self) -> RwLockReadGuard<'_, SnapshotData> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Snapshot lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Reloads everything from `stores`. On error the previous data is kept.
    pub async fn refresh(&self, stores: &Stores) -> StoreResult<()> {
        let jobs = stores.jobs.list_all().await?;
        let machines = stores.machines.list_all().await?;
        let projects = stores.projects.list_all().await?;

        let fresh = SnapshotData {
            jobs,
            machines,
            projects,
            refreshed_at: Some(self.clock.now()),
        };
        log::debug!(
            "Snapshot refreshed: {} jobs, {} machines, {} projects",
            fresh.jobs.len(),
            fresh.machines.len(),
            fresh.projects.len()
        );

        match self.data.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => {
                log::warn!("Snapshot lock was poisoned, recovering");
                *poisoned.into_inner() = fresh;
            }
        }
        Ok(())
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.data().refreshed_at
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.data().jobs.clone()
    }

    pub fn machines(&self) -> Vec<Machine> {
        self.data().machines.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.data().projects.clone()
    }

    /// Queue of `machine_id`, or empty when the machine is unknown.
    pub fn machine_queue(&self, machine_id: &str) -> Vec<Job> {
        let data = self.data();
        match data.machines.iter().find(|m| m.id == machine_id) {
            Some(machine) => views::machine_queue(&data.jobs, machine)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn last_completed(&self, machine_id: &str) -> Option<Job> {
        views::last_completed(&self.data().jobs, machine_id).cloned()
    }

    pub fn job_progress(&self, job_id: &str) -> Option<i64> {
        self.data()
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .map(views::progress_percent)
    }
}

/// Refreshes a [`ShopSnapshot`] periodically and on manual trigger.
pub struct RefreshScheduler {
    snapshot: Arc<ShopSnapshot>,
    stores: Stores,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl RefreshScheduler {
    pub fn new(snapshot: Arc<ShopSnapshot>, stores: Stores, interval: Duration) -> Self {
        Self {
            snapshot,
            stores,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts the refresh loop in a background thread.
    /// Every message on `trigger_rx` forces an immediate refresh.
    pub fn start(&self, mut trigger_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let snapshot = Arc::clone(&self.snapshot);
        let stores = self.stores.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to build refresh runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                let mut interval_timer = tokio::time::interval(interval);
                interval_timer.tick().await; // first tick fires immediately

                loop {
                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    tokio::select! {
                        _ = interval_timer.tick() => {},
                        Ok(()) = trigger_rx.recv() => {
                            log::info!("Manual snapshot refresh triggered");
                        },
                    }

                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    if let Err(e) = snapshot.refresh(&stores).await {
                        log::error!("Snapshot refresh failed: {}", e);
                    }
                }
            });
        })
    }

    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
