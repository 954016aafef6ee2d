//! Background task lanes for highlight discovery and block updates.
#![forbid(unsafe_code)]

mod revision;

pub use revision::{JobTicket, Revisions};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use orelight_geom::ChunkPos;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Lane {
    /// Single-block updates; kept short so edits land quickly.
    Edit,
    /// Chunk discovery and other bulk work.
    Bg,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// A newer submission for the same chunk replaced this job before it ran.
    Superseded,
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct TaskReport {
    pub job_id: u64,
    pub lane: Lane,
    pub label: String,
    pub chunk: Option<ChunkPos>,
    pub outcome: TaskOutcome,
    pub elapsed_ms: u32,
}

type Work = Box<dyn FnOnce(Option<&JobTicket>) + Send + 'static>;

struct Job {
    job_id: u64,
    lane: Lane,
    label: String,
    ticket: Option<JobTicket>,
    work: Work,
}

/// Per-lane queue and in-flight counters.
#[derive(Default)]
struct LaneCounters {
    queued: AtomicUsize,
    inflight: AtomicUsize,
}

impl LaneCounters {
    fn idle(&self) -> bool {
        self.queued.load(Ordering::Acquire) == 0 && self.inflight.load(Ordering::Acquire) == 0
    }
}

/// Worker counts. The edit lane always has exactly one worker, so
/// single-block updates apply in submission order.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    pub bg_workers: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let worker_count: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            bg_workers: worker_count.saturating_sub(1).max(1),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn run_job(job: Job, tx: &Sender<TaskReport>) {
    let Job {
        job_id,
        lane,
        label,
        ticket,
        work,
    } = job;
    let t0 = Instant::now();
    let chunk = ticket.as_ref().map(|t| t.chunk);
    let outcome = if ticket.as_ref().is_some_and(|t| !t.is_current()) {
        log::trace!(target: "runtime", "skip superseded job {} ({})", job_id, label);
        TaskOutcome::Superseded
    } else {
        match catch_unwind(AssertUnwindSafe(|| work(ticket.as_ref()))) {
            Ok(()) => TaskOutcome::Completed,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log::error!(target: "runtime", "task '{}' panicked: {}", label, msg);
                TaskOutcome::Failed(msg)
            }
        }
    };
    let elapsed_ms = t0.elapsed().as_millis().min(u32::MAX as u128) as u32;
    let _ = tx.send(TaskReport {
        job_id,
        lane,
        label,
        chunk,
        outcome,
        elapsed_ms,
    });
}

fn drain_lane(rx: &Receiver<Job>, tx: &Sender<TaskReport>, ctr: &LaneCounters) {
    while let Ok(job) = rx.recv() {
        ctr.inflight.fetch_add(1, Ordering::AcqRel);
        ctr.queued.fetch_sub(1, Ordering::AcqRel);
        run_job(job, tx);
        ctr.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

pub struct Runtime {
    job_tx_edit: Sender<Job>,
    job_tx_bg: Sender<Job>,
    res_rx: Receiver<TaskReport>,
    unclaimed: Mutex<Vec<TaskReport>>,
    _edit_pool: Arc<ThreadPool>,
    _bg_pool: Arc<ThreadPool>,
    q_edit: Arc<LaneCounters>,
    q_bg: Arc<LaneCounters>,
    next_job_id: AtomicU64,
    pub w_bg: usize,
}

impl Runtime {
    pub fn new(cfg: RuntimeConfig) -> Result<Self, ThreadPoolBuildError> {
        let (job_tx_edit, job_rx_edit) = unbounded::<Job>();
        let (job_tx_bg, job_rx_bg) = unbounded::<Job>();
        let (res_tx, res_rx) = unbounded::<TaskReport>();
        let w_bg = cfg.bg_workers.max(1);

        let q_edit = Arc::new(LaneCounters::default());
        let q_bg = Arc::new(LaneCounters::default());

        let edit_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(1)
                .thread_name(|_| "orelight-edit".to_string())
                .build()?,
        );
        {
            let rx = job_rx_edit;
            let tx = res_tx.clone();
            let ctr = q_edit.clone();
            edit_pool.spawn(move || drain_lane(&rx, &tx, &ctr));
        }

        // Edit jobs never reach these workers: a second consumer could apply
        // two updates of one block out of order.
        let bg_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_bg)
                .thread_name(|i| format!("orelight-bg-{i}"))
                .build()?,
        );
        for _ in 0..w_bg {
            let rx = job_rx_bg.clone();
            let tx = res_tx.clone();
            let ctr = q_bg.clone();
            bg_pool.spawn(move || drain_lane(&rx, &tx, &ctr));
        }

        log::info!(
            target: "runtime",
            "runtime started: 1 edit worker, {} bg worker(s)",
            w_bg
        );
        Ok(Self {
            job_tx_edit,
            job_tx_bg,
            res_rx,
            unclaimed: Mutex::new(Vec::new()),
            _edit_pool: edit_pool,
            _bg_pool: bg_pool,
            q_edit,
            q_bg,
            next_job_id: AtomicU64::new(1),
            w_bg,
        })
    }

    fn dispatch(&self, lane: Lane, label: String, ticket: Option<JobTicket>, work: Work) -> u64 {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let (tx, ctr) = match lane {
            Lane::Edit => (&self.job_tx_edit, &self.q_edit),
            Lane::Bg => (&self.job_tx_bg, &self.q_bg),
        };
        ctr.queued.fetch_add(1, Ordering::AcqRel);
        let job = Job {
            job_id,
            lane,
            label,
            ticket,
            work,
        };
        if tx.send(job).is_err() {
            ctr.queued.fetch_sub(1, Ordering::AcqRel);
            log::warn!(target: "runtime", "{:?} lane closed; dropped job {}", lane, job_id);
        }
        job_id
    }

    /// Queues an arbitrary task. Panics inside `work` are contained and
    /// reported as [`TaskOutcome::Failed`].
    pub fn execute<F>(&self, lane: Lane, label: impl Into<String>, work: F) -> u64
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch(lane, label.into(), None, Box::new(move |_| work()))
    }

    /// Queues a chunk job on the background lane. Any earlier job for the same
    /// chunk in `scope` becomes stale: it is skipped if it has not started, and
    /// `work` should check [`JobTicket::is_current`] again before publishing
    /// results.
    pub fn submit_discovery<F>(
        &self,
        scope: &Arc<Revisions>,
        chunk: ChunkPos,
        label: impl Into<String>,
        work: F,
    ) -> u64
    where
        F: FnOnce(&JobTicket) + Send + 'static,
    {
        let rev = scope.bump(chunk);
        let ticket = JobTicket::new(chunk, rev, Arc::clone(scope));
        self.dispatch(
            Lane::Bg,
            label.into(),
            Some(ticket),
            Box::new(move |ticket| {
                if let Some(ticket) = ticket {
                    work(ticket);
                }
            }),
        )
    }

    /// Takes every finished report, including ones left behind by
    /// [`Runtime::drain_reports_where`].
    pub fn drain_reports(&self) -> Vec<TaskReport> {
        let mut held = self.unclaimed.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<TaskReport> = held.drain(..).collect();
        out.extend(self.res_rx.try_iter());
        out
    }

    /// Takes the finished reports matching `owns` and keeps the rest for
    /// whoever submitted them.
    pub fn drain_reports_where<P>(&self, owns: P) -> Vec<TaskReport>
    where
        P: Fn(&TaskReport) -> bool,
    {
        let mut held = self.unclaimed.lock().unwrap_or_else(|e| e.into_inner());
        held.extend(self.res_rx.try_iter());
        let (mine, rest): (Vec<_>, Vec<_>) = held.drain(..).partition(|r| owns(r));
        *held = rest;
        mine
    }

    pub fn is_idle(&self) -> bool {
        self.q_edit.idle() && self.q_bg.idle()
    }

    /// Blocks until both lanes are empty or `timeout` elapses. Returns whether
    /// the runtime went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// (queued edit, in-flight edit, queued bg, in-flight bg)
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_edit.queued.load(Ordering::Relaxed),
            self.q_edit.inflight.load(Ordering::Relaxed),
            self.q_bg.queued.load(Ordering::Relaxed),
            self.q_bg.inflight.load(Ordering::Relaxed),
        )
    }
}
