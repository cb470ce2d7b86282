//! JSON:API document for the Klaviyo "create event" endpoint

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::record::{EventRecord, Properties, ProfileRef};

/// Resource wrapper: `{ "data": { "type": ..., "attributes": ... } }`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Resource<A> {
    pub data: ResourceData<A>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceData<A> {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: A,
}

impl<A> Resource<A> {
    fn new(kind: &str, attributes: A) -> Self {
        Self {
            data: ResourceData {
                kind: kind.to_string(),
                attributes,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricAttributes {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventAttributes {
    pub properties: Properties,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_currency: Option<String>,
    pub metric: Resource<MetricAttributes>,
    pub profile: Resource<ProfileRef>,
}

/// Complete request body for one event
pub type EventPayload = Resource<EventAttributes>;

/// Timestamps go out as RFC 3339 UTC with a `Z` suffix
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl From<&EventRecord> for EventPayload {
    fn from(record: &EventRecord) -> Self {
        Resource::new(
            "event",
            EventAttributes {
                properties: record.properties.clone(),
                time: format_time(&record.occurred_at),
                value: record.value,
                value_currency: record.value_currency.clone(),
                metric: Resource::new(
                    "metric",
                    MetricAttributes {
                        name: record.kind.metric_name().to_string(),
                    },
                ),
                profile: Resource::new("profile", record.profile.clone()),
            },
        )
    }
}

impl EventPayload {
    pub fn metric_name(&self) -> &str {
        &self.data.attributes.metric.data.attributes.name
    }
}
