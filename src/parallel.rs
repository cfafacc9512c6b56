use crate::config::Constants;
use crate::data_io::output_trait::{StepWriter, WriteError};
use crate::data_io::{GriddedDataset, SpatialWindow};
use crate::forecast::{check_time_range, compute_step, ForecastStep};
use crate::severity::SeverityError;
use crossbeam_channel::{self, Receiver, Sender};
use rayon::prelude::*;
use std::ops::Range;
use std::sync::{Arc, Mutex};

/// Compute severity fields for a range of forecast steps in parallel.
///
/// Steps are independent and the dataset is shared read-only, so this is
/// a pure performance optimization over the sequential iterator; the
/// returned steps are in ascending time order. Unit conversion must
/// already have happened - the immutable borrow of the dataset enforces
/// the ordering.
pub fn compute_steps_parallel(
    dataset: &GriddedDataset,
    window: SpatialWindow,
    constants: &Constants,
    range: Range<usize>,
    include_components: bool,
) -> Result<Vec<ForecastStep>, SeverityError> {
    check_time_range(dataset, &range)?;

    println!(
        "Computing {} forecast steps in parallel using {} threads",
        range.len(),
        rayon::current_num_threads()
    );

    range
        .into_par_iter()
        .map(|time_index| compute_step(dataset, window, constants, time_index, include_components))
        .collect()
}

/// Parallel computation with a custom thread pool size
pub fn compute_with_custom_threads(
    dataset: &GriddedDataset,
    window: SpatialWindow,
    constants: &Constants,
    range: Range<usize>,
    include_components: bool,
    num_threads: usize,
) -> Result<Vec<ForecastStep>, SeverityError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| SeverityError::ThreadPool(format!("Failed to create thread pool: {}", e)))?;

    pool.install(|| {
        compute_steps_parallel(dataset, window, constants, range, include_components)
    })
}

/// Compute steps in parallel and stream each completed step to a single
/// writer as it finishes. The writer buffers and orders by time index at
/// close, so arrival order does not matter.
pub fn compute_and_write_parallel(
    dataset: &GriddedDataset,
    window: SpatialWindow,
    constants: &Constants,
    range: Range<usize>,
    include_components: bool,
    writer: Box<dyn StepWriter>,
) -> Result<usize, SeverityError> {
    check_time_range(dataset, &range)?;
    let num_steps = range.len();

    let (tx, rx): (Sender<ForecastStep>, Receiver<ForecastStep>) = crossbeam_channel::unbounded();
    let writer = Arc::new(Mutex::new(writer));
    let writer_clone = Arc::clone(&writer);

    let monitor = Arc::new(ProgressMonitor::new(num_steps));
    let monitor_clone = Arc::clone(&monitor);

    // Consumer thread drains completed steps into the writer
    let consumer = std::thread::spawn(move || -> Result<(), WriteError> {
        for step in rx.iter() {
            let mut writer = writer_clone.lock().unwrap();
            writer.write_step(&step)?;
            monitor_clone.increment();
        }
        Ok(())
    });

    let computed: Result<Vec<()>, SeverityError> = range
        .into_par_iter()
        .map(|time_index| {
            let step = compute_step(dataset, window, constants, time_index, include_components)?;
            // receiver only disconnects when the consumer thread died;
            // surfaced below via join
            let _ = tx.send(step);
            Ok(())
        })
        .collect();

    drop(tx);

    let write_result = consumer
        .join()
        .map_err(|_| SeverityError::ThreadPool("Writer thread panicked".to_string()))?;

    computed?;
    write_result
        .map_err(|e| SeverityError::ThreadPool(format!("Failed to write step: {}", e)))?;

    let mut writer = writer.lock().unwrap();
    writer
        .close()
        .map_err(|e| SeverityError::ThreadPool(format!("Failed to finalize output: {}", e)))?;

    Ok(num_steps)
}

/// Monitor parallel processing progress
pub struct ProgressMonitor {
    total_tasks: usize,
    completed_tasks: std::sync::atomic::AtomicUsize,
    start_time: std::time::Instant,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize) -> Self {
        Self {
            total_tasks,
            completed_tasks: std::sync::atomic::AtomicUsize::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn increment(&self) {
        let completed = self
            .completed_tasks
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;

        if completed % 10 == 0 || completed == self.total_tasks {
            let elapsed = self.start_time.elapsed();
            let rate = completed as f64 / elapsed.as_secs_f64();
            println!(
                "Progress: {}/{} ({:.1}%) - Rate: {:.1} steps/s",
                completed,
                self.total_tasks,
                completed as f64 / self.total_tasks as f64 * 100.0,
                rate
            );
        }
    }
}
