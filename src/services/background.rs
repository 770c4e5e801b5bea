//! Bounded background task pool
//!
//! Fire-and-forget side effects (cache write-back, click recording) are queued
//! on a bounded channel and executed by a dispatcher with a concurrency limit.
//! A full queue drops the task with a warning instead of blocking the caller;
//! every task runs under its own timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::BackgroundConfig;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Task {
    name: &'static str,
    job: Job,
}

pub struct BackgroundTasks {
    sender: ArcSwapOption<mpsc::Sender<Task>>,
    done: watch::Receiver<bool>,
    dropped: AtomicU64,
}

impl BackgroundTasks {
    /// 启动调度器，必须在 tokio 运行时内调用
    pub fn start(config: &BackgroundConfig) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (done_tx, done_rx) = watch::channel(false);

        tokio::spawn(dispatch(
            rx,
            Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            config.task_timeout(),
            done_tx,
        ));

        debug!(
            "Background task pool started (queue: {}, concurrency: {}, timeout: {:?})",
            config.queue_capacity,
            config.max_concurrency,
            config.task_timeout()
        );

        Arc::new(Self {
            sender: ArcSwapOption::from_pointee(tx),
            done: done_rx,
            dropped: AtomicU64::new(0),
        })
    }

    /// 提交任务，不等待执行。队列已满或已关闭时丢弃并返回 false。
    pub fn submit<F>(&self, name: &'static str, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.sender.load();
        let Some(sender) = &*guard else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Background pool is shut down, dropping task '{}'", name);
            return false;
        };

        match sender.try_send(Task {
            name,
            job: Box::pin(job),
        }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Background queue is full, dropping task '{}'", task.name);
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Background queue is closed, dropping task '{}'", task.name);
                false
            }
        }
    }

    /// 因队列满或已关闭而被丢弃的任务数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 停止接收新任务，等待已排队和执行中的任务在 `grace` 内完成。
    ///
    /// 返回 false 表示超时，剩余任务由运行时随进程退出一起丢弃。
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.sender.store(None);

        let mut done = self.done.clone();
        match tokio::time::timeout(grace, done.wait_for(|finished| *finished)).await {
            Ok(_) => {
                info!("Background tasks drained");
                true
            }
            Err(_) => {
                warn!("Background tasks did not finish within {:?}", grace);
                false
            }
        }
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<Task>,
    semaphore: Arc<Semaphore>,
    task_timeout: Duration,
    done: watch::Sender<bool>,
) {
    let mut running = JoinSet::new();

    while let Some(task) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        running.spawn(async move {
            let _permit = permit;
            if tokio::time::timeout(task_timeout, task.job).await.is_err() {
                warn!(
                    "Background task '{}' timed out after {:?}",
                    task.name, task_timeout
                );
            }
        });

        // 回收已结束的任务
        while running.try_join_next().is_some() {}
    }

    while running.join_next().await.is_some() {}
    let _ = done.send(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn config(queue_capacity: usize, max_concurrency: usize, task_timeout_ms: u64) -> BackgroundConfig {
        BackgroundConfig {
            queue_capacity,
            max_concurrency,
            task_timeout_ms,
        }
    }

    #[tokio::test]
    async fn test_tasks_run_and_drain_on_shutdown() {
        let pool = BackgroundTasks::start(&config(16, 4, 1000));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = counter.clone();
            assert!(pool.submit("count", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert!(pool.shutdown(Duration::from_secs(2)).await);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(pool.dropped(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_tasks() {
        let pool = BackgroundTasks::start(&config(1, 1, 5000));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        // 占住唯一的并发槽位
        assert!(pool.submit("blocker", async move {
            let _ = release_rx.await;
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // 调度器卡在等待许可上，手里拿着一个任务；队列里再放一个
        let mut accepted = 0;
        for _ in 0..5 {
            if pool.submit("filler", async {}) {
                accepted += 1;
            }
        }
        assert!(accepted <= 2);
        assert!(pool.dropped() >= 3);

        let _ = release_tx.send(());
        assert!(pool.shutdown(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_task_timeout_does_not_block_pool() {
        let pool = BackgroundTasks::start(&config(8, 1, 20));
        let finished = Arc::new(AtomicUsize::new(0));

        assert!(pool.submit("sleepy", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }));
        let f = finished.clone();
        assert!(pool.submit("quick", async move {
            f.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(pool.shutdown(Duration::from_secs(2)).await);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let pool = BackgroundTasks::start(&config(4, 1, 100));
        assert!(pool.shutdown(Duration::from_secs(1)).await);
        assert!(!pool.submit("late", async {}));
        assert_eq!(pool.dropped(), 1);
    }
}
