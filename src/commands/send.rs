//! Send a single event built from command-line fields

use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::Value;
use std::fs;

use crate::cli::{ProfileArgs, SendArgs};
use crate::client::KlaviyoClient;
use crate::config::Config;
use crate::event::{EventRecord, ProfileRef, Properties};
use crate::submit::{DryRunSink, EventSink, Submitter};

pub fn run(args: SendArgs, config: &Config) -> Result<()> {
    let record = build_record(&args, config)?;
    let kind = record.kind;

    // The key is checked before anything is sent
    let sink: Box<dyn EventSink> = if args.dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(KlaviyoClient::from_env(&config.api)?)
    };

    info!("Sending {} event for {}", kind, record.profile.email);

    let ack = Submitter::new(sink)
        .submit(&record)
        .context(format!("Failed to send {} event", kind))?;

    if !ack.dry_run {
        println!("{} {} event created (HTTP {})", "✓".green(), kind.to_string().bold(), ack.status);
    }

    Ok(())
}

/// Assemble the record: properties file first, then `--prop` entries on top
pub fn build_record(args: &SendArgs, config: &Config) -> Result<EventRecord> {
    let mut properties = match &args.properties_file {
        Some(path) => read_properties(&Config::expand_path(path))?,
        None => Properties::new(),
    };
    for assignment in &args.props {
        let (key, value) = parse_assignment(assignment)?;
        properties.insert(key, value);
    }

    let mut profile = profile_from_args(&args.profile);
    for assignment in &args.profile_props {
        let (key, value) = parse_assignment(assignment)?;
        profile = profile.with_property(key, value);
    }

    let mut builder = EventRecord::builder(args.kind, profile).properties(properties);
    if let Some(time) = args.time {
        builder = builder.at(time);
    }
    if let Some(value) = args.value {
        builder = builder.value(value);
        let currency = args.currency.clone().unwrap_or_else(|| config.defaults.currency.clone());
        builder = builder.currency(currency);
    } else if let Some(currency) = &args.currency {
        builder = builder.currency(currency.clone());
    }

    Ok(builder.build())
}

pub fn profile_from_args(args: &ProfileArgs) -> ProfileRef {
    ProfileRef {
        email: args.email.clone(),
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        phone_number: args.phone.clone(),
        properties: None,
    }
}

fn read_properties(path: &std::path::Path) -> Result<Properties> {
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context(format!("{} must contain a JSON object", path.display()))
}

/// Parse `KEY=VALUE`. VALUE is JSON when it parses as JSON, a string otherwise.
pub fn parse_assignment(s: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = s.split_once('=') else {
        eyre::bail!("Expected KEY=VALUE, got '{}'", s);
    };
    let key = key.trim();
    if key.is_empty() {
        eyre::bail!("Empty key in '{}'", s);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(kind: EventKind) -> SendArgs {
        SendArgs {
            kind,
            profile: ProfileArgs {
                email: "a@b.com".to_string(),
                first_name: None,
                last_name: None,
                phone: None,
            },
            time: None,
            props: Vec::new(),
            properties_file: None,
            profile_props: Vec::new(),
            value: None,
            currency: None,
            dry_run: true,
        }
    }

    #[test]
    fn test_parse_assignment_values() {
        assert_eq!(parse_assignment("Item count=3").unwrap(), ("Item count".to_string(), json!(3)));
        assert_eq!(
            parse_assignment("Order ID=order-1").unwrap(),
            ("Order ID".to_string(), json!("order-1"))
        );
        assert_eq!(
            parse_assignment(r#"Item names=["Cheese pizza"]"#).unwrap().1,
            json!(["Cheese pizza"])
        );
        assert_eq!(parse_assignment("Note=a=b").unwrap().1, json!("a=b"));
        assert_eq!(parse_assignment("Empty=").unwrap().1, json!(""));
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(parse_assignment("no equals").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_value_gets_default_currency() {
        let mut send = args(EventKind::PlacedOrder);
        send.value = Some(43.19);
        let record = build_record(&send, &Config::default()).unwrap();
        assert_eq!(record.value, Some(43.19));
        assert_eq!(record.value_currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_explicit_currency_kept() {
        let mut send = args(EventKind::PlacedOrder);
        send.value = Some(10.0);
        send.currency = Some("EUR".to_string());
        let record = build_record(&send, &Config::default()).unwrap();
        assert_eq!(record.value_currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_props_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("props.json");
        fs::write(&path, r#"{"PartySize": 2, "ReservationId": "reservation-1"}"#).unwrap();

        let mut send = args(EventKind::CreatedReservation);
        send.properties_file = Some(path);
        send.props = vec!["PartySize=4".to_string()];
        let record = build_record(&send, &Config::default()).unwrap();

        assert_eq!(record.properties["PartySize"], json!(4));
        assert_eq!(record.properties["ReservationId"], json!("reservation-1"));
        assert!(record.value.is_none());
    }

    #[test]
    fn test_properties_file_must_be_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("props.json");
        fs::write(&path, "[1, 2]").unwrap();

        let mut send = args(EventKind::CreatedReservation);
        send.properties_file = Some(path);
        assert!(build_record(&send, &Config::default()).is_err());
    }

    #[test]
    fn test_profile_props() {
        let mut send = args(EventKind::EarnedLoyaltyReward);
        send.profile_props = vec!["loyaltyPoints=250".to_string()];
        let record = build_record(&send, &Config::default()).unwrap();
        assert_eq!(
            record.profile.properties.unwrap().get("loyaltyPoints"),
            Some(&json!(250))
        );
    }
}
