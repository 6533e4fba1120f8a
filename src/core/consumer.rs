use super::classifier::classify;
use super::compare::ComparisonOrchestrator;
use super::invocation::invoke_with_timeout;
use super::job::{Job, JobAction, PromptInput, RawRecord, SessionTarget};
use super::queue::JobIntake;
use crate::config::{CompareConfig, ConsumerConfig};
use crate::constants::DEFAULT_MODE;
use crate::errors::{Error, Result};
use crate::llm::{AdapterRegistry, AdapterSettings, TokenListener};
use crate::relay::{RelayTokenListener, StreamingRelay};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Fail,
}

/// Result of one record of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record_id: String,
    pub status: RecordStatus,
    /// Raw error text, kept server-side
    pub error: Option<String>,
    /// Client to notify; `None` when the envelope could not be parsed
    pub target: Option<SessionTarget>,
}

impl RecordOutcome {
    fn success(record_id: String, target: SessionTarget) -> Self {
        Self {
            record_id,
            status: RecordStatus::Success,
            error: None,
            target: Some(target),
        }
    }

    fn fail(record_id: String, error: String, target: Option<SessionTarget>) -> Self {
        Self {
            record_id,
            status: RecordStatus::Fail,
            error: Some(error),
            target,
        }
    }
}

/// One outcome per input record, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    /// Ids of the failed records, as expected by a partial-batch response
    pub fn batch_item_failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RecordStatus::Fail)
            .map(|o| o.record_id.as_str())
            .collect()
    }
}

enum Pending {
    Spawned {
        record_id: String,
        target: SessionTarget,
        handle: JoinHandle<Result<()>>,
    },
    Rejected {
        record_id: String,
        error: String,
    },
}

/// Consumes batches of job records and dispatches each one by action
#[derive(Clone)]
pub struct JobConsumer {
    adapters: Arc<AdapterRegistry>,
    relay: Arc<StreamingRelay>,
    comparison: Arc<ComparisonOrchestrator>,
    limits: Arc<Semaphore>,
    invoke_timeout: Duration,
    batch_size: usize,
    batch_window: Duration,
}

impl JobConsumer {
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        relay: Arc<StreamingRelay>,
        compare: CompareConfig,
        config: &ConsumerConfig,
    ) -> Self {
        let comparison = ComparisonOrchestrator::new(
            adapters.clone(),
            relay.clone(),
            compare,
            config.invoke_timeout,
        );
        Self {
            adapters,
            relay,
            comparison: Arc::new(comparison),
            limits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            invoke_timeout: config.invoke_timeout,
            batch_size: config.batch_size.max(1),
            batch_window: config.batch_window,
        }
    }

    /// Pulls batches from `intake` until the queue is closed and drained
    pub async fn run(&self, mut intake: JobIntake) {
        info!("Job consumer started");
        while let Some(records) = intake.next_batch(self.batch_size, self.batch_window).await {
            let total = records.len();
            let report = self.process_batch(records).await;
            let failures = report.batch_item_failures();
            if failures.is_empty() {
                debug!(
                    "Batch of {} records processed (last sequence {})",
                    total,
                    self.relay.last_sequence_number()
                );
            } else {
                warn!(
                    "{} of {} records failed: {:?}",
                    failures.len(),
                    total,
                    failures
                );
            }
        }
        info!("Job intake closed, consumer stopped");
    }

    /// Processes one batch of records
    ///
    /// Every record runs in its own task; the report holds exactly one outcome per record
    /// in input order. Failed records with a known session are then notified with a
    /// classified message.
    pub async fn process_batch(&self, records: Vec<RawRecord>) -> BatchReport {
        let mut pending = Vec::with_capacity(records.len());
        for record in records {
            match Job::parse(&record) {
                Ok(job) => {
                    let target = job.target();
                    let consumer = self.clone();
                    let handle = tokio::spawn(async move { consumer.execute(job).await });
                    pending.push(Pending::Spawned {
                        record_id: record.message_id,
                        target,
                        handle,
                    });
                }
                Err(e) => {
                    error!("Dropping record {}: {}", record.message_id, e);
                    pending.push(Pending::Rejected {
                        record_id: record.message_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut report = BatchReport::default();
        for entry in pending {
            let outcome = match entry {
                Pending::Spawned {
                    record_id,
                    target,
                    handle,
                } => match handle.await {
                    Ok(Ok(())) => RecordOutcome::success(record_id, target),
                    Ok(Err(e)) => RecordOutcome::fail(record_id, e.to_string(), Some(target)),
                    Err(e) => RecordOutcome::fail(record_id, e.to_string(), Some(target)),
                },
                Pending::Rejected { record_id, error } => {
                    RecordOutcome::fail(record_id, error, None)
                }
            };
            report.outcomes.push(outcome);
        }

        for outcome in &report.outcomes {
            self.report_failure(outcome).await;
        }

        report
    }

    async fn report_failure(&self, outcome: &RecordOutcome) {
        let (Some(raw), Some(target)) = (&outcome.error, &outcome.target) else {
            return;
        };
        let message = classify(raw);
        if message.is_generic() {
            error!(
                "Record {} failed for session {}: {}",
                outcome.record_id, target.session_id, raw
            );
        } else {
            warn!(
                "Record {} failed for session {} with a known error",
                outcome.record_id, target.session_id
            );
        }
        self.relay
            .emit_error(&target.session_id, &target.user_id, message.text())
            .await;
    }

    async fn execute(&self, job: Job) -> Result<()> {
        let _permit = self
            .limits
            .acquire()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(
            "Processing {:?} job {} for session {}",
            job.action, job.id, job.session_id
        );
        match job.action {
            JobAction::Run => self.handle_run(&job).await,
            JobAction::Compare => self.comparison.compare(&job).await.map(|_| ()),
            JobAction::Heartbeat => {
                self.relay
                    .emit_heartbeat(&job.user_id, &job.session_id)
                    .await;
                Ok(())
            }
        }
    }

    async fn handle_run(&self, job: &Job) -> Result<()> {
        let provider = job
            .provider
            .as_deref()
            .ok_or_else(|| Error::Validation("provider is required".to_string()))?;
        let model_id = job
            .model_id
            .as_deref()
            .ok_or_else(|| Error::Validation("modelName is required".to_string()))?;
        let prompt = match &job.prompt {
            PromptInput::Single(text) => text,
            _ => return Err(Error::Validation("text is required".to_string())),
        };

        let factory = self.adapters.resolve(provider, model_id)?;
        let adapter = factory.create(AdapterSettings {
            model_id: model_id.to_string(),
            mode: job.mode.as_deref().unwrap_or(DEFAULT_MODE).to_string(),
            session_id: job.session_id.clone(),
            user_id: job.user_id.clone(),
            model_kwargs: job.model_kwargs.clone(),
        })?;

        let listener = RelayTokenListener::new(
            self.relay.clone(),
            &job.user_id,
            &job.session_id,
            adapter.streaming_enabled(),
        );
        let response = invoke_with_timeout(
            adapter.as_ref(),
            job.adapter_request(prompt, job.attachments.clone()),
            Some(&listener as &dyn TokenListener),
            self.invoke_timeout,
        )
        .await?;

        info!(
            "Run of {}.{} completed for session {}",
            provider, model_id, job.session_id
        );
        self.relay
            .emit_final(&job.user_id, job.user_groups(), response.into_payload())
            .await;
        Ok(())
    }
}
