//! Event submission
//!
//! A [`Submitter`] validates a record against the catalog, shapes the request
//! body and hands it to an [`EventSink`]. Each call is independent: one valid
//! record means exactly one sink call, an invalid record means none.

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::error::SubmissionError;
use crate::event::{EventPayload, EventRecord};

/// Acknowledgement returned by a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// HTTP status, or 0 for a dry run
    pub status: u16,
    /// Response body, usually empty for 202 Accepted
    pub body: String,
    pub dry_run: bool,
}

impl Ack {
    pub fn accepted(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            dry_run: false,
        }
    }

    pub fn dry_run() -> Self {
        Self {
            status: 0,
            body: String::new(),
            dry_run: true,
        }
    }
}

/// Destination for event payloads
pub trait EventSink: Send + Sync {
    fn name(&self) -> &str;
    fn create_event(&self, payload: &EventPayload) -> Result<Ack, SubmissionError>;
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn create_event(&self, payload: &EventPayload) -> Result<Ack, SubmissionError> {
        (**self).create_event(payload)
    }
}

/// Prints the payload instead of sending it
#[derive(Debug, Default)]
pub struct DryRunSink;

impl EventSink for DryRunSink {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn create_event(&self, payload: &EventPayload) -> Result<Ack, SubmissionError> {
        println!("{}", serde_json::to_string_pretty(payload)?);
        Ok(Ack::dry_run())
    }
}

/// Validates and sends records through a sink
pub struct Submitter<S> {
    sink: S,
}

impl<S: EventSink> Submitter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Validate `record` and build its request body without sending it
    pub fn prepare(&self, record: &EventRecord) -> Result<EventPayload, SubmissionError> {
        record.validate()?;
        Ok(EventPayload::from(record))
    }

    /// Submit one record. No retry: the caller decides what to do with a failure.
    pub fn submit(&self, record: &EventRecord) -> Result<Ack, SubmissionError> {
        let kind = record.kind;

        let payload = match self.prepare(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Rejected {} event before sending: {}", kind, e);
                return Err(e);
            }
        };

        debug!("Sending {} event via {}", payload.metric_name(), self.sink.name());

        match self.sink.create_event(&payload) {
            Ok(ack) => {
                info!(
                    "{} event created successfully via {} (status {}): {}",
                    kind,
                    self.sink.name(),
                    ack.status,
                    ack.body
                );
                Ok(ack)
            }
            Err(e) => {
                error!("Error creating {} event: {}", kind, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::{EventKind, ProfileRef};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every payload it receives; optionally fails with a given status
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub sent: Mutex<Vec<EventPayload>>,
        pub fail_status: Option<u16>,
    }

    impl RecordingSink {
        pub fn failing(status: u16) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_status: Some(status),
            }
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn last(&self) -> Option<EventPayload> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    impl EventSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn create_event(&self, payload: &EventPayload) -> Result<Ack, SubmissionError> {
            self.sent.lock().unwrap().push(payload.clone());
            match self.fail_status {
                Some(status) => Err(SubmissionError::Rejected {
                    status,
                    body: "{\"errors\":[]}".to_string(),
                }),
                None => Ok(Ack::accepted(202, String::new())),
            }
        }
    }

    /// Smallest valid property set for each kind, built from the catalog
    pub(crate) fn minimal_record(kind: EventKind, email: &str) -> EventRecord {
        let mut builder = EventRecord::builder(kind, ProfileRef::new(email));
        for key in kind.spec().required {
            builder = builder.property(*key, json!("x"));
        }
        builder.build()
    }

    #[test]
    fn test_every_kind_sends_its_metric_name() {
        let submitter = Submitter::new(RecordingSink::default());
        for kind in EventKind::ALL {
            submitter.submit(&minimal_record(kind, "a@b.com")).unwrap();
            let payload = submitter.sink().last().unwrap();
            assert_eq!(payload.metric_name(), kind.metric_name());
        }
        assert_eq!(submitter.sink().count(), EventKind::ALL.len());
    }

    #[test]
    fn test_properties_are_exactly_the_given_keys() {
        let submitter = Submitter::new(RecordingSink::default());
        for kind in EventKind::ALL {
            let spec = kind.spec();
            let mut builder = EventRecord::builder(kind, ProfileRef::new("a@b.com"));
            for key in spec.required.iter().chain(spec.optional) {
                builder = builder.property(*key, json!(1));
            }
            submitter.submit(&builder.build()).unwrap();
            let payload = submitter.sink().last().unwrap();
            let keys: Vec<&str> = payload.data.attributes.properties.keys().map(String::as_str).collect();
            let expected: Vec<&str> = spec.required.iter().chain(spec.optional).copied().collect();
            assert_eq!(keys, expected, "{}", kind);
        }
    }

    #[test]
    fn test_empty_email_makes_no_call() {
        let submitter = Submitter::new(RecordingSink::default());
        let err = submitter
            .submit(&minimal_record(EventKind::PlacedOrder, ""))
            .unwrap_err();
        assert!(matches!(err, SubmissionError::MissingEmail { .. }));
        assert_eq!(submitter.sink().count(), 0);
    }

    #[test]
    fn test_invalid_properties_make_no_call() {
        let submitter = Submitter::new(RecordingSink::default());
        let record = EventRecord::builder(EventKind::ClosedOrder, ProfileRef::new("a@b.com"))
            .property("Order ID", "order-67890")
            .build();
        assert!(submitter.submit(&record).is_err());
        assert_eq!(submitter.sink().count(), 0);
    }

    #[test]
    fn test_monetary_fields_pass_through() {
        let submitter = Submitter::new(RecordingSink::default());
        let record = EventRecord::builder(EventKind::PlacedOrder, ProfileRef::new("a@b.com"))
            .property("Item names", json!(["Cheese pizza"]))
            .property("Item count", 1)
            .property("Order ID", "order-1")
            .value(43.19)
            .currency("USD")
            .build();
        submitter.submit(&record).unwrap();

        let payload = submitter.sink().last().unwrap();
        assert_eq!(payload.data.attributes.value, Some(43.19));
        assert_eq!(payload.data.attributes.value_currency.as_deref(), Some("USD"));
        assert_eq!(payload.metric_name(), "Placed Order");
        assert_eq!(payload.data.attributes.profile.data.attributes.email, "a@b.com");
    }

    #[test]
    fn test_sink_failure_is_returned_after_one_call() {
        let submitter = Submitter::new(RecordingSink::failing(400));
        let err = submitter
            .submit(&minimal_record(EventKind::NoShowReservation, "a@b.com"))
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { status: 400, .. }));
        assert_eq!(submitter.sink().count(), 1);
    }

    #[test]
    fn test_prepare_does_not_call_sink() {
        let submitter = Submitter::new(RecordingSink::default());
        let payload = submitter
            .prepare(&minimal_record(EventKind::CompletedLoyaltyCard, "a@b.com"))
            .unwrap();
        assert_eq!(payload.metric_name(), "Completed Loyalty Card");
        assert_eq!(submitter.sink().count(), 0);
    }

    #[test]
    fn test_dry_run_sink_acknowledges() {
        let submitter = Submitter::new(DryRunSink);
        let ack = submitter
            .submit(&minimal_record(EventKind::CreatedReservation, "a@b.com"))
            .unwrap();
        assert!(ack.dry_run);
    }
}
