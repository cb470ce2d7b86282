//! Send the sample events of each domain

use colored::*;
use eyre::Result;
use log::{info, warn};
use std::sync::Arc;

use crate::cli::ProfileArgs;
use crate::client::KlaviyoClient;
use crate::config::Config;
use crate::dispatch::{Outcome, dispatch};
use crate::event::{Domain, EventRecord};
use crate::samples::{self, SampleCustomer};
use crate::submit::{DryRunSink, EventSink, Submitter};

pub fn run(domain: Option<Domain>, profile: ProfileArgs, jobs: usize, dry_run: bool, config: &Config) -> Result<()> {
    let customer = SampleCustomer {
        email: profile.email,
        first_name: profile.first_name,
        last_name: profile.last_name,
        phone_number: profile.phone,
    };

    let domains: Vec<Domain> = match domain {
        Some(d) => vec![d],
        None => Domain::ALL.to_vec(),
    };

    let mut records: Vec<EventRecord> = Vec::new();
    for d in &domains {
        records.extend(samples::records(*d, &customer)?);
    }

    // Missing credentials stop the run before the first event goes out
    let sink: Box<dyn EventSink> = if dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(KlaviyoClient::from_env(&config.api)?)
    };

    let submitter = Arc::new(Submitter::new(sink));

    info!(
        "Sending {} sample events ({}) via {}",
        records.len(),
        domains.iter().map(Domain::as_str).collect::<Vec<_>>().join(", "),
        submitter.sink().name()
    );
    let outcomes = dispatch(&submitter, records, jobs)?;

    if !dry_run {
        for outcome in &outcomes {
            print_outcome(outcome);
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    let sent = outcomes.len() - failed;

    if dry_run {
        info!("Dry run: {} payloads printed, {} rejected", sent, failed);
    } else {
        println!();
        println!("{} sent, {} failed", sent.to_string().green(), failed.to_string().red());
    }

    if failed > 0 {
        warn!("{} of {} sample events failed", failed, outcomes.len());
        eyre::bail!("{} of {} events failed", failed, outcomes.len());
    }

    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.result {
        Ok(ack) => println!("{} {} (HTTP {})", "✓".green(), outcome.kind, ack.status),
        Err(e) if e.is_validation() => println!("{} {} not sent: {}", "✗".red(), outcome.kind, e),
        Err(e) => println!("{} {}: {}", "✗".red(), outcome.kind, e),
    }
}
