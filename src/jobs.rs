use crate::config::VisitConfig;
use crate::services::VisitAggregator;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Background job types
#[derive(Debug)]
pub enum Job {
    /// Persist a visit captured at `at`
    RecordVisit { slug: String, at: DateTime<Utc> },
}

/// Background worker configuration
#[derive(Clone)]
pub struct WorkerConfig {
    /// Maximum retries for failed jobs
    pub max_retries: u32,
    /// Backoff duration between retries
    pub retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 200,
        }
    }
}

impl From<&VisitConfig> for WorkerConfig {
    fn from(config: &VisitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Background job worker
pub struct Worker {
    visits: VisitAggregator,
    receiver: mpsc::Receiver<Job>,
    config: WorkerConfig,
}

impl Worker {
    /// Create a new worker
    pub fn new(visits: VisitAggregator, receiver: mpsc::Receiver<Job>) -> Self {
        Self {
            visits,
            receiver,
            config: WorkerConfig::default(),
        }
    }

    /// Set worker configuration
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker - processes jobs until every sender is dropped
    pub async fn run(mut self) {
        info!("Background worker started");

        while let Some(job) = self.receiver.recv().await {
            self.process_job(job).await;
        }

        info!("Background worker stopped");
    }

    /// Process a single job with retries
    async fn process_job(&self, job: Job) {
        let mut retries = 0;

        loop {
            match self.execute_job(&job).await {
                Ok(_) => break,
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = std::time::Duration::from_millis(self.config.retry_delay_ms);
                    warn!(
                        error = %e,
                        "Job failed (attempt {}/{}), retrying in {:?}: {:?}",
                        retries,
                        self.config.max_retries,
                        delay,
                        job
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    // Dropped; redirects never see this
                    error!(error = %e, "Job failed after {} retries: {:?}", self.config.max_retries, job);
                    break;
                }
            }
        }
    }

    /// Execute a job without retries
    async fn execute_job(&self, job: &Job) -> crate::error::AppResult<()> {
        match job {
            Job::RecordVisit { slug, at } => self.visits.record_visit_at(slug, *at).await,
        }
    }
}

/// Job sender - used to submit jobs to the worker
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Create a new job sender
    pub fn new(sender: mpsc::Sender<Job>) -> Self {
        Self { sender }
    }

    /// Submit a job without waiting. Returns false if the job was dropped.
    pub fn send(&self, job: Job) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(?job, "Job queue full, dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                error!(?job, "Failed to send job to worker - channel is closed");
                false
            }
        }
    }

    /// Queue a visit for `slug`, stamped now
    pub fn record_visit(&self, slug: String) -> bool {
        debug!(slug = %slug, "Queueing visit");
        self.send(Job::RecordVisit {
            slug,
            at: Utc::now(),
        })
    }
}

/// Create a bounded job sender and receiver pair
pub fn create_job_channel(capacity: usize) -> (JobSender, mpsc::Receiver<Job>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (JobSender::new(sender), receiver)
}
