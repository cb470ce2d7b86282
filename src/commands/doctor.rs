//! Diagnose setup issues

use colored::*;
use eyre::Result;
use std::collections::HashSet;

use crate::config::Config;
use crate::event::{Domain, EventKind};
use crate::samples::{self, SampleCustomer};

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "klaviyo-events doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    // Check config file
    let config_file = Config::app_dir().join("config.yaml");
    if config_file.exists() {
        println!("{} Config file: {}", "✓".green(), config_file.display());
    } else {
        println!("{} No config file at {} (using defaults)", "⚠".yellow(), config_file.display());
    }

    // Check API key
    match config.api.api_key() {
        Some(key) => println!("{} API key: {} ({})", "✓".green(), mask(&key), config.api.key_env),
        None => {
            println!("{} API key missing: set {}", "✗".red(), config.api.key_env.cyan());
            issues += 1;
        }
    }

    println!("{} Endpoint: {}", "✓".green(), config.api.events_url());
    println!("{} Revision: {}", "✓".green(), config.api.revision);

    if config.api.timeout_secs == 0 {
        println!("{} Timeout is 0 seconds", "✗".red());
        issues += 1;
    }

    println!();

    // Check catalog
    println!("{}", "Catalog:".bold());
    let names: HashSet<&str> = EventKind::ALL.iter().map(|k| k.metric_name()).collect();
    if names.len() == EventKind::ALL.len() {
        println!("  {} {} event kinds, metric names unique", "✓".green(), EventKind::ALL.len());
    } else {
        println!("  {} duplicate metric names in catalog", "✗".red());
        issues += 1;
    }

    let customer = SampleCustomer::new("doctor@example.com");
    for domain in Domain::ALL {
        let invalid: Vec<String> = samples::records(domain, &customer)?
            .iter()
            .filter_map(|r| r.validate().err().map(|e| e.to_string()))
            .collect();
        if invalid.is_empty() {
            println!("  {} {} samples valid", "✓".green(), domain);
        } else {
            for e in &invalid {
                println!("  {} {}", "✗".red(), e);
            }
            issues += invalid.len();
        }
    }

    println!();

    if issues == 0 {
        println!("{} No issues found", "✓".green().bold());
    } else {
        println!("{} {} issue(s) found", "✗".red().bold(), issues);
    }

    Ok(())
}

/// Show only the first four characters of a key
fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{}{}", visible, "*".repeat(key.chars().count().saturating_sub(4).min(12)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_key() {
        assert_eq!(mask("pk_abcdef"), "pk_a*****");
        assert_eq!(mask("abc"), "abc");
        assert_eq!(mask(&"x".repeat(40)), format!("xxxx{}", "*".repeat(12)));
    }
}
