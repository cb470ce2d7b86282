//! Event records and the profiles they are attributed to

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EventKind;
use crate::error::SubmissionError;

/// Free-form property bag, kept in insertion order
pub type Properties = IndexMap<String, Value>;

/// The customer an event is attributed to. Klaviyo resolves identity by email.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProfileRef {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Custom profile properties, e.g. a loyalty points balance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl ProfileRef {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    #[cfg(test)]
    pub fn with_phone(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value.into());
        self
    }
}

/// One business event, ready to be submitted once
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
    pub properties: Properties,
    pub value: Option<f64>,
    pub value_currency: Option<String>,
    pub profile: ProfileRef,
}

impl EventRecord {
    /// Start a record for `kind` occurring now
    pub fn builder(kind: EventKind, profile: ProfileRef) -> EventRecordBuilder {
        EventRecordBuilder {
            record: EventRecord {
                kind,
                occurred_at: Utc::now(),
                properties: Properties::new(),
                value: None,
                value_currency: None,
                profile,
            },
        }
    }

    /// Check the record against the catalog row for its kind.
    ///
    /// Rules, in order: a non-blank profile email; every required property
    /// present; no property outside the accepted keys; monetary fields only on
    /// monetary kinds, a currency only alongside a value, and a three-letter
    /// uppercase currency code.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        let kind = self.kind;
        let spec = kind.spec();

        if self.profile.email.trim().is_empty() {
            return Err(SubmissionError::MissingEmail { kind });
        }

        let missing: Vec<String> = spec
            .required
            .iter()
            .filter(|key| !self.properties.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SubmissionError::MissingProperties { kind, keys: missing });
        }

        let unknown: Vec<String> = self
            .properties
            .keys()
            .filter(|key| !spec.accepts(key))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SubmissionError::UnknownProperties { kind, keys: unknown });
        }

        match (self.value, self.value_currency.as_deref()) {
            (Some(_), _) if !kind.is_monetary() => return Err(SubmissionError::UnexpectedValue { kind }),
            (None, Some(_)) => return Err(SubmissionError::CurrencyWithoutValue { kind }),
            (Some(value), _) if !value.is_finite() => return Err(SubmissionError::InvalidValue { kind }),
            _ => {}
        }

        if let Some(code) = self.value_currency.as_deref()
            && !regex_is_match!("^[A-Z]{3}$", code)
        {
            return Err(SubmissionError::InvalidCurrency {
                kind,
                code: code.to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`EventRecord`]; the record is fixed once built
#[derive(Debug, Clone)]
pub struct EventRecordBuilder {
    record: EventRecord,
}

impl EventRecordBuilder {
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.record.occurred_at = occurred_at;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        self.record.properties.extend(properties);
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.record.value = Some(value);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.record.value_currency = Some(code.into());
        self
    }

    pub fn build(self) -> EventRecord {
        self.record
    }
}
