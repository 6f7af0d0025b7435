use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tradevol_domain::error::VolatilityError;
use tradevol_domain::repositories::trade_source::{TickerFile, TradeSource};
use tradevol_domain::services::ranking::{rank, Ranking};
use tradevol_domain::services::volatility::compute_volatility;
use tradevol_domain::value_objects::ticker_volatility::TickerVolatility;

pub type SharedTradeSource = Arc<dyn TradeSource + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    pub parallelism: usize,
    pub timeout: Option<Duration>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            timeout: None,
        }
    }
}

/// Per-ticker results split into the two report buckets.
///
/// Only the collecting thread ever holds this; workers hand results over the
/// channel, so every insertion into either bucket is serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub non_zero: Vec<TickerVolatility>,
    pub zero: Vec<String>,
}

impl AggregateResult {
    pub fn record(&mut self, volatility: TickerVolatility) {
        if volatility.is_zero() {
            self.zero.push(volatility.ticker);
        } else {
            self.non_zero.push(volatility);
        }
    }

    pub fn ticker_count(&self) -> usize {
        self.non_zero.len() + self.zero.len()
    }

    pub fn rank(self, top_n: usize) -> Result<Ranking, VolatilityError> {
        rank(self.non_zero, self.zero, top_n)
    }
}

enum WorkerMessage {
    Computed(TickerVolatility),
    Fatal(VolatilityError),
}

/// Scans every file on a bounded pool of worker threads and collects the
/// results.
///
/// Fails on the first worker error once the in-flight files are drained; no
/// partial result is returned. With a timeout set, the wait is abandoned after
/// it elapses and workers stop picking up new files.
pub fn aggregate(
    source: SharedTradeSource,
    files: Vec<TickerFile>,
    options: AggregationOptions,
) -> Result<AggregateResult, VolatilityError> {
    let started = Instant::now();
    let total = files.len();
    if total == 0 {
        return Ok(AggregateResult::default());
    }

    let worker_count = options.parallelism.max(1).min(total);
    let files = Arc::new(files);
    let next_index = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel::<WorkerMessage>();

    tracing::info!(files = total, workers = worker_count, "aggregation started");

    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let tx = tx.clone();
        let source = Arc::clone(&source);
        let files = Arc::clone(&files);
        let next_index = Arc::clone(&next_index);
        let cancelled_flag = Arc::clone(&cancelled);
        let spawned = thread::Builder::new()
            .name(format!("tradevol-worker-{worker_id}"))
            .spawn(move || {
                run_worker(source.as_ref(), &files, &next_index, &cancelled_flag, &tx)
            });
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                cancelled.store(true, Ordering::Relaxed);
                return Err(VolatilityError::Worker(format!(
                    "failed to spawn worker {worker_id}: {err}"
                )));
            }
        }
    }
    drop(tx);

    let deadline = options.timeout.map(|timeout| started + timeout);
    let mut result = AggregateResult::default();
    let mut fatal_error: Option<VolatilityError> = None;

    loop {
        let message = match deadline {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        cancelled.store(true, Ordering::Relaxed);
                        let pending = total - result.ticker_count();
                        tracing::error!(pending, "aggregation timed out");
                        return Err(VolatilityError::Timeout {
                            waited_ms: started.elapsed().as_millis() as u64,
                            pending,
                        });
                    }
                }
            }
            None => match rx.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            WorkerMessage::Computed(volatility) => {
                if fatal_error.is_none() {
                    tracing::debug!(
                        ticker = %volatility.ticker,
                        volatility = volatility.volatility,
                        trades = volatility.trades,
                        "ticker scanned"
                    );
                    result.record(volatility);
                }
            }
            WorkerMessage::Fatal(err) => {
                cancelled.store(true, Ordering::Relaxed);
                if fatal_error.is_none() {
                    tracing::error!(error = %err, "worker failed, aborting aggregation");
                    fatal_error = Some(err);
                }
            }
        }
    }

    let mut panicked = 0usize;
    for handle in handles {
        if handle.join().is_err() {
            panicked += 1;
        }
    }

    if let Some(err) = fatal_error {
        return Err(err);
    }
    if panicked > 0 {
        return Err(VolatilityError::Worker(format!(
            "{panicked} worker thread(s) panicked"
        )));
    }
    if result.ticker_count() != total {
        return Err(VolatilityError::Worker(format!(
            "expected {total} results, got {}",
            result.ticker_count()
        )));
    }

    record_aggregation_metrics(&result, started);
    tracing::info!(
        non_zero = result.non_zero.len(),
        zero = result.zero.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "aggregation finished"
    );
    Ok(result)
}

fn run_worker(
    source: &(dyn TradeSource + Send + Sync),
    files: &[TickerFile],
    next_index: &AtomicUsize,
    cancelled: &AtomicBool,
    tx: &Sender<WorkerMessage>,
) {
    loop {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }

        let file_idx = next_index.fetch_add(1, Ordering::Relaxed);
        let Some(file) = files.get(file_idx) else {
            break;
        };

        let scanned = panic::catch_unwind(AssertUnwindSafe(|| {
            source
                .read_records(file)
                .and_then(|records| compute_volatility(&file.label(), &records))
        }))
        .unwrap_or_else(|payload| {
            Err(VolatilityError::Worker(format!(
                "panicked while scanning {}: {}",
                file.label(),
                panic_message(&*payload)
            )))
        });

        let message = match scanned {
            Ok(volatility) => WorkerMessage::Computed(volatility),
            Err(err) => {
                cancelled.store(true, Ordering::Relaxed);
                WorkerMessage::Fatal(err)
            }
        };

        if tx.send(message).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn record_aggregation_metrics(result: &AggregateResult, started: Instant) {
    metrics::counter!("tradevol.app.aggregation.tickers_total", "bucket" => "non_zero")
        .increment(result.non_zero.len() as u64);
    metrics::counter!("tradevol.app.aggregation.tickers_total", "bucket" => "zero")
        .increment(result.zero.len() as u64);
    metrics::histogram!("tradevol.app.aggregation.duration_ms")
        .record(started.elapsed().as_secs_f64() * 1000.0);
}
