//! Sample events for each domain
//!
//! The most common events from online ordering, reservation and loyalty
//! integrations, with representative values. Shared details (restaurant,
//! customer) are passed in as immutable values; each record is built on its own.

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use log::debug;
use serde_json::json;

use crate::event::{Domain, EventKind, EventRecord, ProfileRef};
use crate::loyalty::LoyaltyLedger;

/// Who the sample events are attributed to
#[derive(Debug, Clone, Default)]
pub struct SampleCustomer {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

impl SampleCustomer {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Profile with every known detail
    fn full_profile(&self) -> ProfileRef {
        ProfileRef {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone_number: self.phone_number.clone(),
            properties: None,
        }
    }

    /// Profile with the email join key only
    fn email_profile(&self) -> ProfileRef {
        ProfileRef::new(self.email.clone())
    }
}

#[derive(Debug, Clone, Copy)]
struct Restaurant {
    id: &'static str,
    name: &'static str,
}

const DENVER_CAFE: Restaurant = Restaurant {
    id: "restaurant-12345",
    name: "Klaviyo Cafe (Denver)",
};

const CURRENCY: &str = "USD";
const ORDER_ID: &str = "order-67890";
const RESERVATION_ID: &str = "reservation-12345";

fn at(timestamp: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Utc))
        .context(format!("Invalid sample timestamp: {}", timestamp))
}

/// Sample records for `domain`, in the order an integration would emit them
pub fn records(domain: Domain, customer: &SampleCustomer) -> Result<Vec<EventRecord>> {
    match domain {
        Domain::Ordering => ordering(customer, DENVER_CAFE),
        Domain::Reservations => reservations(customer, DENVER_CAFE),
        Domain::Loyalty => loyalty(customer, DENVER_CAFE),
    }
}

fn ordering(customer: &SampleCustomer, restaurant: Restaurant) -> Result<Vec<EventRecord>> {
    let order_time = at("2025-06-30T14:30:00Z")?;
    let all_items = json!(["Cheese pizza", "House salad", "Soda"]);
    let categories = json!(["Food", "Drink"]);

    let placed = EventRecord::builder(EventKind::PlacedOrder, customer.full_profile())
        .at(order_time)
        .property("Item names", all_items.clone())
        .property("Item categories", categories.clone())
        .property("Item count", 3)
        .property("Restaurant name", restaurant.name)
        .property("Restaurant ID", restaurant.id)
        .property("Order ID", ORDER_ID)
        .property("Subtotal", 39.99)
        .property("Tax", 3.20)
        .property("Discount applied", 0.00)
        .property(
            "extra",
            json!({
                "orderStatus": "placed",
                "paymentMethod": "credit_card",
                "deliveryMethod": "pickup",
                "numberOfGuests": 1
            }),
        )
        .value(43.19)
        .currency(CURRENCY)
        .build();

    // One per item in the order; the sample shows the pizza
    let ordered_product = EventRecord::builder(EventKind::OrderedProduct, customer.full_profile())
        .at(order_time)
        .property("Name", "Cheese pizza")
        .property("Categories", json!(["Food", "Pizza"]))
        .property("ProductID", "product-12345")
        .property("VariantID", "variant-67890")
        .property("Quantity", 1)
        .property("Restaurant name", restaurant.name)
        .property("Restaurant ID", restaurant.id)
        .value(19.99)
        .currency(CURRENCY)
        .build();

    let fulfilled = EventRecord::builder(EventKind::FulfilledOrder, customer.email_profile())
        .at(order_time)
        .property("Items", all_items.clone())
        .property("Item categories", categories.clone())
        .property("Item count", 3)
        .property("Order ID", ORDER_ID)
        .property("Source", "online")
        .property("Fulfillment method", "pickup")
        .property(
            "extra",
            json!({
                "orderStatus": "fulfilled",
                "paymentMethod": "credit_card",
                "deliveryMethod": "pickup",
                "numberOfGuests": 1
            }),
        )
        .value(43.19)
        .currency(CURRENCY)
        .build();

    let refunded = EventRecord::builder(EventKind::RefundedOrder, customer.email_profile())
        .at(order_time)
        .property("Items", all_items.clone())
        .property("Item categories", categories.clone())
        .property("Item count", 3)
        .property("Order ID", ORDER_ID)
        .value(43.19)
        .currency(CURRENCY)
        .build();

    let closed = EventRecord::builder(EventKind::ClosedOrder, customer.email_profile())
        .at(order_time)
        .property("Items", all_items.clone())
        .property("Item categories", categories.clone())
        .property("Item count", 3)
        .property("Order ID", ORDER_ID)
        .property("Fulfillment method", "pickup")
        .value(43.19)
        .currency(CURRENCY)
        .build();

    let adjusted = EventRecord::builder(EventKind::AdjustedOrder, customer.email_profile())
        .at(order_time)
        .property("Items", json!(["Cheese pizza", "House salad"]))
        .property("Item categories", categories.clone())
        .property("Item count", 3)
        .property("Order ID", ORDER_ID)
        .property("Initial Order ID", ORDER_ID)
        .property("Amount refunded", 4.99)
        .property("Amount charged", 0.00)
        .property("Adjustment reason", "Customer changed mind")
        .property("Adjustment type", "partial refund")
        .property("Restaurant name", restaurant.name)
        .property("Restaurant ID", restaurant.id)
        .value(38.20)
        .currency(CURRENCY)
        .build();

    // A cancelled order is valued at what was refunded
    let cancelled = EventRecord::builder(EventKind::CancelledOrder, customer.email_profile())
        .at(order_time)
        .property("Items", all_items)
        .property("Item categories", categories)
        .property("Item count", 3)
        .property("Order ID", ORDER_ID)
        .property("Cancellation reason", "Customer changed mind")
        .property("Cancellation type", "full refund")
        .property("Amount refunded", 43.19)
        .property("Amount charged", 0.00)
        .property("Restaurant name", restaurant.name)
        .property("Restaurant ID", restaurant.id)
        .value(43.19)
        .currency(CURRENCY)
        .build();

    Ok(vec![
        placed,
        ordered_product,
        fulfilled,
        refunded,
        closed,
        adjusted,
        cancelled,
    ])
}

fn reservations(customer: &SampleCustomer, restaurant: Restaurant) -> Result<Vec<EventRecord>> {
    let scheduled = "2023-10-01T19:00:00Z";

    let created = EventRecord::builder(EventKind::CreatedReservation, customer.full_profile())
        .at(at("2024-10-03T19:00:00Z")?)
        .property("ReservationScheduledTime", "2024-09-07T19:00:00Z")
        .property("ReservedTableNumber", "Table 5")
        .property("PartySize", 4)
        .property("ReservationSource", "website")
        .property("ReservationNotes", "Window seat preferred")
        .property("ReservationTags", json!(["birthday", "VIP"]))
        .property("ReservationId", RESERVATION_ID)
        .property("RestaurantId", restaurant.id)
        .property("RestaurantName", restaurant.name)
        .build();

    let confirmed = EventRecord::builder(EventKind::ConfirmedReservation, customer.email_profile())
        .at(at("2023-10-01T19:00:00Z")?)
        .property("ReservationConfirmedId", RESERVATION_ID)
        .property("ConfirmationMethod", "email")
        .property("ReservationTime", scheduled)
        .property("PartySize", 4)
        .property("RestaurantId", restaurant.id)
        .property("RestaurantName", restaurant.name)
        .build();

    let completed = EventRecord::builder(EventKind::CompletedReservation, customer.email_profile())
        .at(at("2023-10-01T19:05:00Z")?)
        .property("ReservationScheduledTime", scheduled)
        .property("ReservationId", RESERVATION_ID)
        .property("CheckInMethod", "app")
        .property("PartySize", 4)
        .property("RestaurantId", restaurant.id)
        .property("RestaurantName", restaurant.name)
        .build();

    let cancelled = EventRecord::builder(EventKind::CancelledReservation, customer.email_profile())
        .at(at("2023-10-01T19:00:00Z")?)
        .property("CancellationReason", "change of plans")
        .property("CancellationMethod", "app")
        .property("CancelledResScheduledTime", scheduled)
        .property("CancelledResPartySize", 4)
        .property("RestaurantId", restaurant.id)
        .property("RestaurantName", restaurant.name)
        .build();

    let no_show = EventRecord::builder(EventKind::NoShowReservation, customer.email_profile())
        .at(at("2023-10-01T19:15:00Z")?)
        .property("ReservationScheduledTime", scheduled)
        .property("ReservationId", RESERVATION_ID)
        .property("ReservationSource", "website")
        .property("NoShowReservationPartySize", 4)
        .property("RestaurantId", restaurant.id)
        .property("RestaurantName", restaurant.name)
        .build();

    Ok(vec![created, confirmed, completed, cancelled, no_show])
}

/// A points-moving loyalty event after sign-up
struct PointsEvent {
    kind: EventKind,
    id_key: &'static str,
    id: &'static str,
    points: i64,
    description_key: &'static str,
    description: &'static str,
}

const POINTS_EVENTS: &[PointsEvent] = &[
    PointsEvent {
        kind: EventKind::CreatedLoyaltyRedemption,
        id_key: "RedemptionId",
        id: "redemption-12345",
        points: 100,
        description_key: "RedemptionDescription",
        description: "Free dessert",
    },
    PointsEvent {
        kind: EventKind::UpdatedLoyaltyRedemption,
        id_key: "RedemptionId",
        id: "redemption-12345",
        points: 150,
        description_key: "RedemptionDescription",
        description: "Free dessert and drink",
    },
    PointsEvent {
        kind: EventKind::AppliedLoyaltyRedemption,
        id_key: "RedemptionId",
        id: "redemption-12345",
        points: 100,
        description_key: "RedemptionDescription",
        description: "Free dessert",
    },
    PointsEvent {
        kind: EventKind::CheckedInToLoyalty,
        id_key: "CheckInId",
        id: "checkin-12345",
        points: 50,
        description_key: "CheckInDescription",
        description: "Checked in at Klaviyo Cafe",
    },
    PointsEvent {
        kind: EventKind::EarnedLoyaltyReward,
        id_key: "RewardId",
        id: "reward-12345",
        points: 200,
        description_key: "RewardDescription",
        description: "Birthday Reward",
    },
    PointsEvent {
        kind: EventKind::ConvertedLoyaltyPoints,
        id_key: "ConvertedPointsId",
        id: "converted-points-12345",
        points: 500,
        description_key: "ConvertedPointsDescription",
        description: "Converted points to rewards",
    },
    PointsEvent {
        kind: EventKind::CompletedLoyaltyCard,
        id_key: "CompletedCardId",
        id: "completed-card-12345",
        points: 1000,
        description_key: "CompletedCardDescription",
        description: "Completed loyalty card",
    },
];

fn loyalty(customer: &SampleCustomer, restaurant: Restaurant) -> Result<Vec<EventRecord>> {
    let mut ledger = LoyaltyLedger::new();
    let mut records = Vec::with_capacity(POINTS_EVENTS.len() + 1);

    let sign_up = EventRecord::builder(EventKind::SignedUpForLoyalty, customer.full_profile())
        .at(at("2023-10-02T12:00:00Z")?)
        .property("LocationId", "location-12345")
        .property("LocationName", restaurant.name)
        .property("LoyaltyProgramId", "loyalty-program-12345")
        .property("LoyaltyProgramName", "Klaviyo Loyalty Program")
        .property("LoyaltyProgramTier", "Gold")
        .property("LoyaltyProgramPoints", 0)
        .build();
    records.push(with_balance(sign_up, &mut ledger));

    let event_time = at("2023-10-01T12:00:00Z")?;
    for event in POINTS_EVENTS {
        let points_key = event.kind.spec().loyalty.map(|rule| rule.points_key).unwrap_or_default();
        let record = EventRecord::builder(event.kind, customer.email_profile())
            .at(event_time)
            .property(event.id_key, event.id)
            .property(points_key, event.points)
            .property(event.description_key, event.description)
            .property("RestaurantId", restaurant.id)
            .property("RestaurantName", restaurant.name)
            .build();
        records.push(with_balance(record, &mut ledger));
    }

    Ok(records)
}

/// Move the ledger by this event and stamp the resulting balance on its profile
fn with_balance(record: EventRecord, ledger: &mut LoyaltyLedger) -> EventRecord {
    if ledger.apply(record.kind, &record.properties).is_some() {
        debug!("{} leaves the loyalty balance at {}", record.kind, ledger.balance());
    }
    EventRecord {
        profile: ledger.stamp(record.profile),
        ..record
    }
}
