//! Submit a batch of independent records
//!
//! Every record gets its own submission and its own outcome; a failure never
//! stops the rest. With more than one job the blocking HTTP calls run on a
//! tokio blocking pool capped at `jobs` threads.

use eyre::{Context, Result};
use log::debug;
use std::sync::Arc;

use crate::error::SubmissionError;
use crate::event::{EventKind, EventRecord};
use crate::submit::{Ack, EventSink, Submitter};

/// Result of submitting one record
#[derive(Debug)]
pub struct Outcome {
    pub kind: EventKind,
    pub result: Result<Ack, SubmissionError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Submit `records`, returning outcomes in input order
pub fn dispatch<S>(submitter: &Arc<Submitter<S>>, records: Vec<EventRecord>, jobs: usize) -> Result<Vec<Outcome>>
where
    S: EventSink + 'static,
{
    if jobs <= 1 || records.len() <= 1 {
        debug!("Dispatching {} events sequentially", records.len());
        return Ok(records.iter().map(|record| submit_one(submitter, record)).collect());
    }

    debug!("Dispatching {} events with {} jobs", records.len(), jobs);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(jobs)
        .thread_name("klaviyo-events-dispatch")
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let handles: Vec<_> = records
            .into_iter()
            .map(|record| {
                let submitter = Arc::clone(submitter);
                tokio::task::spawn_blocking(move || submit_one(&submitter, &record))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await.context("Submission task failed")?);
        }
        Ok::<_, eyre::Report>(outcomes)
    })
}

fn submit_one<S: EventSink>(submitter: &Submitter<S>, record: &EventRecord) -> Outcome {
    Outcome {
        kind: record.kind,
        result: submitter.submit(record),
    }
}
