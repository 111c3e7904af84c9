//! Fixed set of workers handed to tasks as they go idle.

use tokio::sync::mpsc;

/// Idle workers queue up in a channel. A task checks one out and sends it
/// back through [`WorkerPool::return_handle`] when done, so the next task gets
/// whichever worker finishes first.
pub struct WorkerPool<W> {
    home: mpsc::Sender<W>,
    idle: mpsc::Receiver<W>,
    size: usize,
}

impl<W> WorkerPool<W> {
    pub fn new(workers: Vec<W>) -> Self {
        let size = workers.len();
        let (home, idle) = mpsc::channel(size.max(1));
        for worker in workers {
            // Capacity equals the worker count
            let _ = home.try_send(worker);
        }
        Self { home, idle, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait for an idle worker. `None` for an empty pool.
    pub async fn checkout(&mut self) -> Option<W> {
        if self.size == 0 {
            return None;
        }
        self.idle.recv().await
    }

    /// Sender a task uses to give its worker back.
    pub fn return_handle(&self) -> mpsc::Sender<W> {
        self.home.clone()
    }

    /// All workers, after every checked-out one has been given back
    /// (or its handle dropped).
    pub async fn into_workers(self) -> Vec<W> {
        let Self { home, mut idle, .. } = self;
        drop(home);

        let mut workers = Vec::new();
        while let Some(worker) = idle.recv().await {
            workers.push(worker);
        }
        workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_idle_worker_served_while_another_is_busy() {
        let mut pool = WorkerPool::new(vec!["a", "b"]);
        let busy = pool.checkout().await.unwrap();

        // Repeated checkouts keep getting the idle worker
        for _ in 0..3 {
            let worker = timeout(Duration::from_secs(1), pool.checkout())
                .await
                .expect("idle worker should be available")
                .unwrap();
            assert_ne!(worker, busy);
            pool.return_handle().send(worker).await.unwrap();
        }

        pool.return_handle().send(busy).await.unwrap();
        let mut workers = pool.into_workers().await;
        workers.sort();
        assert_eq!(workers, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_worker_returned_from_spawned_task() {
        let mut pool = WorkerPool::new(vec![7u32]);
        let worker = pool.checkout().await.unwrap();
        let home = pool.return_handle();

        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            home.send(worker + 1).await.unwrap();
        });

        let again = timeout(Duration::from_secs(1), pool.checkout())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again, 8);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let mut pool: WorkerPool<u32> = WorkerPool::new(Vec::new());
        assert_eq!(pool.size(), 0);
        assert!(pool.checkout().await.is_none());
        assert!(pool.into_workers().await.is_empty());
    }
}
