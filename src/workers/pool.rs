use crossbeam_channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads consuming jobs from a shared queue.
///
/// Jobs are free to block on subprocess or file I/O; they report their
/// results themselves, over whatever channel they captured. Dropping the
/// pool closes the queue and joins the workers once in-flight jobs finish.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = unbounded::<Job>();

        let workers = (0..size.max(1))
            .map(|i| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("clipstitch-worker-{}", i))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Queue a job for execution. Never blocks the caller.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(job));
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets each worker fall out of its recv loop
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_runs_all_jobs() {
        let (tx, rx) = unbounded();
        let pool = WorkerPool::new(3);
        for i in 0..20 {
            let tx = tx.clone();
            pool.execute(move || {
                let _ = tx.send(i);
            });
        }
        drop(pool); // joins workers, so every job has run

        let mut seen: Vec<i32> = rx.try_iter().collect();
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_size_still_works() {
        let (tx, rx) = unbounded();
        let pool = WorkerPool::new(0);
        pool.execute(move || {
            let _ = tx.send(42);
        });
        drop(pool);
        assert_eq!(rx.try_recv(), Ok(42));
    }
}
