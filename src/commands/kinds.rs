//! List the event catalog

use colored::*;
use eyre::Result;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::event::{Domain, EventKind, KindSpec};

#[derive(Serialize)]
struct KindRow {
    kind: String,
    #[serde(flatten)]
    spec: &'static KindSpec,
}

pub fn run(domain: Option<Domain>, format: OutputFormat) -> Result<()> {
    let domains: Vec<Domain> = match domain {
        Some(d) => vec![d],
        None => Domain::ALL.to_vec(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows(&domains))?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&rows(&domains))?),
        OutputFormat::Text => print_text(&domains),
    }

    Ok(())
}

fn rows(domains: &[Domain]) -> Vec<KindRow> {
    domains
        .iter()
        .flat_map(|d| EventKind::in_domain(*d))
        .map(|kind| KindRow {
            kind: kind.slug(),
            spec: kind.spec(),
        })
        .collect()
}

fn print_text(domains: &[Domain]) {
    for domain in domains {
        println!("{}", domain.as_str().bold());
        for kind in EventKind::in_domain(*domain) {
            let spec = kind.spec();
            let money = if spec.monetary { " $".yellow().to_string() } else { String::new() };
            println!("  {:<30} {}{}", kind.slug().cyan(), spec.metric, money);
            println!("    {} {}", "required:".dimmed(), spec.required.join(", "));
            if !spec.optional.is_empty() {
                println!("    {} {}", "optional:".dimmed(), spec.optional.join(", "));
            }
        }
        println!();
    }
}
