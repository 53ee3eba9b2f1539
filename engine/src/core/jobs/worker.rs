//! Worker Pool Module
//!
//! Runs generation jobs on background workers. Workers take jobs from a FIFO
//! queue and run the blocking pipeline on tokio's blocking thread pool,
//! publishing progress to the job table and an event channel.
//!
//! A job in `Processing` cannot be cancelled; it stays there until the
//! pipeline completes or fails.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info};

use crate::core::jobs::{GenerationJob, JobState, JobStatusReport};
use crate::core::pipeline::{GenerationPipeline, GenerationReport, ProgressReporter};
use crate::core::settings::WorkerSettings;
use crate::core::{CoreError, CoreResult, JobId};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

type JobTable = Arc<Mutex<HashMap<JobId, GenerationJob>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Worker Pool Configuration
// =============================================================================

/// Worker pool configuration
#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks
    pub num_workers: usize,
    /// Maximum queue size
    pub max_queue_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get().max(2),
            max_queue_size: 1000,
        }
    }
}

impl From<&WorkerSettings> for WorkerPoolConfig {
    fn from(settings: &WorkerSettings) -> Self {
        Self {
            num_workers: settings.max_concurrent_jobs.max(1) as usize,
            max_queue_size: settings.max_queue_size.max(1) as usize,
        }
    }
}

// =============================================================================
// Events
// =============================================================================

/// Job update event
#[derive(Clone, Debug, PartialEq)]
pub enum JobEvent {
    /// A worker picked the job up
    Started { job_id: JobId },
    /// A stage was entered
    Progress {
        job_id: JobId,
        percent: u8,
        message: String,
    },
    /// The deck was saved
    Completed { job_id: JobId, output_path: PathBuf },
    /// The job stopped on a fatal error
    Failed { job_id: JobId, error: String },
}

/// Stop signal shared by all workers of a pool
#[derive(Debug, Default)]
pub struct Shutdown {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Stops workers once their current job is done
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Worker Pool
// =============================================================================

/// Queues generation jobs and answers status queries
pub struct WorkerPool {
    config: WorkerPoolConfig,
    /// Pending job ids in submission order
    pub(crate) queue: Arc<Mutex<VecDeque<JobId>>>,
    /// Every job this pool has seen, keyed by correlation id
    pub(crate) jobs: JobTable,
    event_tx: mpsc::UnboundedSender<JobEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<JobEvent>>,
}

impl WorkerPool {
    /// Creates a new worker pool
    pub fn new(config: WorkerPoolConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            config,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            jobs: Arc::new(Mutex::new(HashMap::new())),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Creates a worker pool with default configuration
    pub fn with_defaults() -> Self {
        Self::new(WorkerPoolConfig::default())
    }

    /// Queues a job and returns its correlation id
    pub fn submit(&self, mut job: GenerationJob) -> CoreResult<JobId> {
        let job_id = job.id.clone();

        let mut queue = lock(&self.queue);
        let mut jobs = lock(&self.jobs);
        if jobs.contains_key(&job_id) {
            return Err(CoreError::DuplicateJob(job_id));
        }
        if queue.len() >= self.config.max_queue_size {
            return Err(CoreError::ResourceExhausted(format!(
                "Job queue is full ({} jobs)",
                self.config.max_queue_size
            )));
        }

        job.state = JobState::Pending;
        jobs.insert(job_id.clone(), job);
        queue.push_back(job_id.clone());
        info!("Queued generation job {}", job_id);

        Ok(job_id)
    }

    /// Gets the current queue length
    pub fn queue_len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Gets a job by ID
    pub fn get_job(&self, job_id: &str) -> Option<GenerationJob> {
        lock(&self.jobs).get(job_id).cloned()
    }

    /// Status of a job by correlation id
    pub fn status(&self, job_id: &str) -> Option<JobStatusReport> {
        lock(&self.jobs).get(job_id).map(GenerationJob::status_report)
    }

    /// Gets all known jobs, oldest first
    pub fn all_jobs(&self) -> Vec<GenerationJob> {
        let mut jobs: Vec<GenerationJob> = lock(&self.jobs).values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        jobs
    }

    /// Takes the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<JobEvent>> {
        self.event_rx.take()
    }

    /// Gets the number of configured workers
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Waits until the job is completed or failed.
    ///
    /// Returns `None` for an unknown id.
    pub async fn wait_for(&self, job_id: &str) -> Option<GenerationJob> {
        loop {
            let job = self.get_job(job_id)?;
            if job.is_terminal() {
                return Some(job);
            }
            tokio::time::sleep(POLL_INTERVAL / 2).await;
        }
    }

    /// Spawns background workers to process jobs.
    ///
    /// Workers run until `shutdown` is triggered; a worker busy with a job
    /// finishes it first.
    pub fn spawn_workers(
        &self,
        processor: Arc<JobProcessor>,
        shutdown: Arc<Shutdown>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.config.num_workers)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    queue: Arc::clone(&self.queue),
                    jobs: Arc::clone(&self.jobs),
                    event_tx: self.event_tx.clone(),
                    processor: Arc::clone(&processor),
                };
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move { worker.run(shutdown).await })
            })
            .collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// Job Processor
// =============================================================================

/// Runs the generation pipeline for jobs
pub struct JobProcessor {
    pipeline: Arc<GenerationPipeline>,
}

impl JobProcessor {
    pub fn new(pipeline: GenerationPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Validates the job's request and runs the pipeline on the blocking
    /// thread pool
    pub async fn process(
        &self,
        job: &GenerationJob,
        reporter: JobProgressReporter,
    ) -> CoreResult<GenerationReport> {
        let pipeline = Arc::clone(&self.pipeline);
        let request = job.request.clone();

        tokio::task::spawn_blocking(move || {
            request
                .validate(pipeline.contract())
                .map_err(CoreError::ValidationError)?;
            pipeline.run(
                &request.event,
                &request.template_path,
                &request.output_dir,
                &reporter,
            )
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Generation task aborted: {e}")))?
    }
}

/// Publishes pipeline progress to the job table and the event channel
pub struct JobProgressReporter {
    job_id: JobId,
    jobs: JobTable,
    event_tx: mpsc::UnboundedSender<JobEvent>,
}

impl ProgressReporter for JobProgressReporter {
    fn report(&self, percent: u8, message: &str) {
        if let Some(job) = lock(&self.jobs).get_mut(&self.job_id) {
            job.progress_percent = percent;
            job.message = message.to_string();
        }
        publish(
            &self.event_tx,
            JobEvent::Progress {
                job_id: self.job_id.clone(),
                percent,
                message: message.to_string(),
            },
        );
    }
}

// =============================================================================
// Worker Runner
// =============================================================================

struct Worker {
    id: usize,
    queue: Arc<Mutex<VecDeque<JobId>>>,
    jobs: JobTable,
    event_tx: mpsc::UnboundedSender<JobEvent>,
    processor: Arc<JobProcessor>,
}

impl Worker {
    async fn run(self, shutdown: Arc<Shutdown>) {
        info!("Worker {} started", self.id);

        while !shutdown.is_triggered() {
            tokio::select! {
                _ = shutdown.notify.notified() => break,
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    while let Some(job) = self.next_job() {
                        self.execute(job).await;
                        if shutdown.is_triggered() {
                            break;
                        }
                    }
                }
            }
        }

        info!("Worker {} shutting down", self.id);
    }

    /// Pops the next pending job and marks it processing
    fn next_job(&self) -> Option<GenerationJob> {
        let job_id = lock(&self.queue).pop_front()?;
        let mut jobs = lock(&self.jobs);
        let job = jobs.get_mut(&job_id)?;
        job.state = JobState::Processing;
        job.message = "Starting generation".to_string();
        Some(job.clone())
    }

    async fn execute(&self, job: GenerationJob) {
        publish(
            &self.event_tx,
            JobEvent::Started {
                job_id: job.id.clone(),
            },
        );
        info!("Worker {} processing job {}", self.id, job.id);

        let reporter = JobProgressReporter {
            job_id: job.id.clone(),
            jobs: Arc::clone(&self.jobs),
            event_tx: self.event_tx.clone(),
        };
        let result = self.processor.process(&job, reporter).await;
        let completed_at = Some(chrono::Utc::now().to_rfc3339());

        let event = {
            let mut jobs = lock(&self.jobs);
            let Some(entry) = jobs.get_mut(&job.id) else {
                return;
            };
            entry.completed_at = completed_at;
            match result {
                Ok(report) => {
                    info!("Job {} completed: {}", job.id, report.output_path.display());
                    entry.state = JobState::Completed;
                    entry.progress_percent = 100;
                    entry.message = "Completed".to_string();
                    entry.output_path = Some(report.output_path.clone());
                    let event = JobEvent::Completed {
                        job_id: job.id.clone(),
                        output_path: report.output_path.clone(),
                    };
                    entry.report = Some(report);
                    event
                }
                Err(e) => {
                    let message = e.to_string();
                    error!("Job {} failed: {}", job.id, message);
                    entry.state = JobState::Failed;
                    entry.message = message.clone();
                    JobEvent::Failed {
                        job_id: job.id.clone(),
                        error: message,
                    }
                }
            }
        };
        publish(&self.event_tx, event);
    }
}

/// Sends `event` to the pool's listener. Returns false once the receiver is gone.
fn publish(event_tx: &mpsc::UnboundedSender<JobEvent>, event: JobEvent) -> bool {
    match event_tx.send(event) {
        Ok(()) => true,
        Err(mpsc::error::SendError(event)) => {
            debug!("Job event dropped, no receiver: {:?}", event);
            false
        }
    }
}
