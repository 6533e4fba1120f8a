use super::job::RawRecord;
use crate::errors::{Error, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

/// Creates the in-process intake queue feeding the job consumer
pub fn job_queue(capacity: usize) -> (JobQueue, JobIntake) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (JobQueue { sender }, JobIntake { receiver })
}

/// Producer side, cloned into every request handler
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<RawRecord>,
}

impl JobQueue {
    /// Enqueues a raw envelope body and returns the message id assigned to it
    pub async fn enqueue(&self, body: String) -> Result<String> {
        let message_id = uuid::Uuid::new_v4().to_string();
        self.sender
            .send(RawRecord {
                message_id: message_id.clone(),
                body,
            })
            .await
            .map_err(|_| Error::Transport("job queue is closed".to_string()))?;
        Ok(message_id)
    }
}

/// Consumer side of the intake queue
#[derive(Debug)]
pub struct JobIntake {
    receiver: mpsc::Receiver<RawRecord>,
}

impl JobIntake {
    /// Waits for the next batch
    ///
    /// Blocks until one record arrives, then keeps collecting until `max_size` records are
    /// gathered or `window` has elapsed. Returns `None` once every producer is gone and
    /// the queue is drained.
    pub async fn next_batch(&mut self, max_size: usize, window: Duration) -> Option<Vec<RawRecord>> {
        let first = self.receiver.recv().await?;
        let mut batch = vec![first];
        let deadline = Instant::now() + window;

        while batch.len() < max_size {
            match timeout_at(deadline, self.receiver.recv()).await {
                Ok(Some(record)) => batch.push(record),
                Ok(None) | Err(_) => break,
            }
        }

        Some(batch)
    }
}
