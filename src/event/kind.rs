//! Event catalog
//!
//! One row per event kind: metric name, domain, accepted property keys,
//! whether the event carries a monetary value, and how it moves a loyalty
//! points balance.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business domain an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Online ordering integrations
    Ordering,
    /// Reservation platforms
    Reservations,
    /// Restaurant loyalty programs
    Loyalty,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Ordering, Domain::Reservations, Domain::Loyalty];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Ordering => "ordering",
            Domain::Reservations => "reservations",
            Domain::Loyalty => "loyalty",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a loyalty event changes the customer's points balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsEffect {
    /// Balance becomes the event's points
    Set,
    /// Points are added to the balance
    Credit,
    /// Points are taken from the balance
    Debit,
}

/// Loyalty points rule: which property holds the points and what they do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoyaltyRule {
    pub points_key: &'static str,
    pub effect: PointsEffect,
}

/// Catalog row for one event kind
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KindSpec {
    pub metric: &'static str,
    pub domain: Domain,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub monetary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty: Option<LoyaltyRule>,
}

impl KindSpec {
    /// Whether `key` is accepted in the properties bag
    pub fn accepts(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }
}

/// Known event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    PlacedOrder,
    OrderedProduct,
    FulfilledOrder,
    RefundedOrder,
    ClosedOrder,
    AdjustedOrder,
    CancelledOrder,
    CreatedReservation,
    ConfirmedReservation,
    CompletedReservation,
    CancelledReservation,
    NoShowReservation,
    SignedUpForLoyalty,
    CreatedLoyaltyRedemption,
    UpdatedLoyaltyRedemption,
    AppliedLoyaltyRedemption,
    CheckedInToLoyalty,
    EarnedLoyaltyReward,
    ConvertedLoyaltyPoints,
    CompletedLoyaltyCard,
}

const ORDER_ITEMS: &[&str] = &["Items", "Item count", "Order ID"];

const fn order(metric: &'static str, required: &'static [&'static str], optional: &'static [&'static str]) -> KindSpec {
    KindSpec {
        metric,
        domain: Domain::Ordering,
        required,
        optional,
        monetary: true,
        loyalty: None,
    }
}

const fn reservation(
    metric: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
) -> KindSpec {
    KindSpec {
        metric,
        domain: Domain::Reservations,
        required,
        optional,
        monetary: false,
        loyalty: None,
    }
}

const fn loyalty(
    metric: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    points_key: &'static str,
    effect: PointsEffect,
) -> KindSpec {
    KindSpec {
        metric,
        domain: Domain::Loyalty,
        required,
        optional,
        monetary: false,
        loyalty: Some(LoyaltyRule { points_key, effect }),
    }
}

const REDEMPTION_REQUIRED: &[&str] = &["RedemptionId", "RedemptionPoints"];
const REDEMPTION_OPTIONAL: &[&str] = &["RedemptionDescription", "RestaurantId", "RestaurantName"];

const PLACED_ORDER: KindSpec = order(
    "Placed Order",
    &["Item names", "Item count", "Order ID"],
    &[
        "Item categories",
        "Restaurant name",
        "Restaurant ID",
        "Subtotal",
        "Tax",
        "Discount applied",
        "extra",
    ],
);
const ORDERED_PRODUCT: KindSpec = order(
    "Ordered Product",
    &["Name", "ProductID", "Quantity"],
    &["Categories", "VariantID", "Restaurant name", "Restaurant ID"],
);
const FULFILLED_ORDER: KindSpec = order(
    "Fulfilled Order",
    ORDER_ITEMS,
    &["Item categories", "Source", "Fulfillment method", "extra"],
);
const REFUNDED_ORDER: KindSpec = order("Refunded Order", ORDER_ITEMS, &["Item categories"]);
const CLOSED_ORDER: KindSpec = order("Closed Order", ORDER_ITEMS, &["Item categories", "Fulfillment method"]);
const ADJUSTED_ORDER: KindSpec = order(
    "Adjusted Order",
    &["Items", "Item count", "Order ID", "Initial Order ID"],
    &[
        "Item categories",
        "Amount refunded",
        "Amount charged",
        "Adjustment reason",
        "Adjustment type",
        "Restaurant name",
        "Restaurant ID",
    ],
);
const CANCELLED_ORDER: KindSpec = order(
    "Cancelled Order",
    ORDER_ITEMS,
    &[
        "Item categories",
        "Cancellation reason",
        "Cancellation type",
        "Amount refunded",
        "Amount charged",
        "Restaurant name",
        "Restaurant ID",
    ],
);

const CREATED_RESERVATION: KindSpec = reservation(
    "Created Reservation",
    &["ReservationId", "ReservationScheduledTime", "PartySize"],
    &[
        "ReservedTableNumber",
        "ReservationSource",
        "ReservationNotes",
        "ReservationTags",
        "RestaurantId",
        "RestaurantName",
    ],
);
const CONFIRMED_RESERVATION: KindSpec = reservation(
    "Confirmed Reservation",
    &["ReservationConfirmedId", "ReservationTime", "PartySize"],
    &["ConfirmationMethod", "RestaurantId", "RestaurantName"],
);
const COMPLETED_RESERVATION: KindSpec = reservation(
    "Completed Reservation",
    &["ReservationId", "ReservationScheduledTime", "PartySize"],
    &["CheckInMethod", "RestaurantId", "RestaurantName"],
);
const CANCELLED_RESERVATION: KindSpec = reservation(
    "Cancelled Reservation",
    &["CancelledResScheduledTime", "CancelledResPartySize"],
    &["CancellationReason", "CancellationMethod", "RestaurantId", "RestaurantName"],
);
const NO_SHOW_RESERVATION: KindSpec = reservation(
    "No Show Reservation",
    &["ReservationId", "ReservationScheduledTime", "NoShowReservationPartySize"],
    &["ReservationSource", "RestaurantId", "RestaurantName"],
);

const SIGNED_UP_FOR_LOYALTY: KindSpec = loyalty(
    "Signed Up for Loyalty Program",
    &["LoyaltyProgramId"],
    &[
        "LocationId",
        "LocationName",
        "LoyaltyProgramName",
        "LoyaltyProgramTier",
        "LoyaltyProgramPoints",
    ],
    "LoyaltyProgramPoints",
    PointsEffect::Set,
);
const CREATED_LOYALTY_REDEMPTION: KindSpec = loyalty(
    "Created Loyalty Redemption",
    REDEMPTION_REQUIRED,
    REDEMPTION_OPTIONAL,
    "RedemptionPoints",
    PointsEffect::Debit,
);
const UPDATED_LOYALTY_REDEMPTION: KindSpec = loyalty(
    "Updated Loyalty Redemption",
    REDEMPTION_REQUIRED,
    REDEMPTION_OPTIONAL,
    "RedemptionPoints",
    PointsEffect::Debit,
);
const APPLIED_LOYALTY_REDEMPTION: KindSpec = loyalty(
    "Applied Loyalty Redemption",
    REDEMPTION_REQUIRED,
    REDEMPTION_OPTIONAL,
    "RedemptionPoints",
    PointsEffect::Debit,
);
const CHECKED_IN_TO_LOYALTY: KindSpec = loyalty(
    "Checked In to Loyalty Program",
    &["CheckInId", "CheckInPoints"],
    &["CheckInDescription", "RestaurantId", "RestaurantName"],
    "CheckInPoints",
    PointsEffect::Credit,
);
const EARNED_LOYALTY_REWARD: KindSpec = loyalty(
    "Earned Loyalty Reward",
    &["RewardId", "RewardPoints"],
    &["RewardDescription", "RestaurantId", "RestaurantName"],
    "RewardPoints",
    PointsEffect::Credit,
);
const CONVERTED_LOYALTY_POINTS: KindSpec = loyalty(
    "Converted Loyalty Points",
    &["ConvertedPointsId", "ConvertedPoints"],
    &["ConvertedPointsDescription", "RestaurantId", "RestaurantName"],
    "ConvertedPoints",
    PointsEffect::Debit,
);
const COMPLETED_LOYALTY_CARD: KindSpec = loyalty(
    "Completed Loyalty Card",
    &["CompletedCardId", "CompletedCardPoints"],
    &["CompletedCardDescription", "RestaurantId", "RestaurantName"],
    "CompletedCardPoints",
    PointsEffect::Credit,
);

impl EventKind {
    pub const ALL: [EventKind; 20] = [
        EventKind::PlacedOrder,
        EventKind::OrderedProduct,
        EventKind::FulfilledOrder,
        EventKind::RefundedOrder,
        EventKind::ClosedOrder,
        EventKind::AdjustedOrder,
        EventKind::CancelledOrder,
        EventKind::CreatedReservation,
        EventKind::ConfirmedReservation,
        EventKind::CompletedReservation,
        EventKind::CancelledReservation,
        EventKind::NoShowReservation,
        EventKind::SignedUpForLoyalty,
        EventKind::CreatedLoyaltyRedemption,
        EventKind::UpdatedLoyaltyRedemption,
        EventKind::AppliedLoyaltyRedemption,
        EventKind::CheckedInToLoyalty,
        EventKind::EarnedLoyaltyReward,
        EventKind::ConvertedLoyaltyPoints,
        EventKind::CompletedLoyaltyCard,
    ];

    /// Catalog row for this kind
    pub fn spec(&self) -> &'static KindSpec {
        match self {
            EventKind::PlacedOrder => &PLACED_ORDER,
            EventKind::OrderedProduct => &ORDERED_PRODUCT,
            EventKind::FulfilledOrder => &FULFILLED_ORDER,
            EventKind::RefundedOrder => &REFUNDED_ORDER,
            EventKind::ClosedOrder => &CLOSED_ORDER,
            EventKind::AdjustedOrder => &ADJUSTED_ORDER,
            EventKind::CancelledOrder => &CANCELLED_ORDER,
            EventKind::CreatedReservation => &CREATED_RESERVATION,
            EventKind::ConfirmedReservation => &CONFIRMED_RESERVATION,
            EventKind::CompletedReservation => &COMPLETED_RESERVATION,
            EventKind::CancelledReservation => &CANCELLED_RESERVATION,
            EventKind::NoShowReservation => &NO_SHOW_RESERVATION,
            EventKind::SignedUpForLoyalty => &SIGNED_UP_FOR_LOYALTY,
            EventKind::CreatedLoyaltyRedemption => &CREATED_LOYALTY_REDEMPTION,
            EventKind::UpdatedLoyaltyRedemption => &UPDATED_LOYALTY_REDEMPTION,
            EventKind::AppliedLoyaltyRedemption => &APPLIED_LOYALTY_REDEMPTION,
            EventKind::CheckedInToLoyalty => &CHECKED_IN_TO_LOYALTY,
            EventKind::EarnedLoyaltyReward => &EARNED_LOYALTY_REWARD,
            EventKind::ConvertedLoyaltyPoints => &CONVERTED_LOYALTY_POINTS,
            EventKind::CompletedLoyaltyCard => &COMPLETED_LOYALTY_CARD,
        }
    }

    /// Klaviyo metric name
    pub fn metric_name(&self) -> &'static str {
        self.spec().metric
    }

    pub fn domain(&self) -> Domain {
        self.spec().domain
    }

    pub fn is_monetary(&self) -> bool {
        self.spec().monetary
    }

    /// Command-line slug, e.g. `placed-order`
    pub fn slug(&self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| format!("{:?}", self))
    }

    /// Kinds belonging to `domain`, in catalog order
    pub fn in_domain(domain: Domain) -> impl Iterator<Item = EventKind> {
        Self::ALL.into_iter().filter(move |k| k.domain() == domain)
    }

    /// Look up a kind by its metric name
    #[cfg(test)]
    pub fn from_metric_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.metric_name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_match_catalog() {
        let expected = [
            (EventKind::PlacedOrder, "Placed Order"),
            (EventKind::OrderedProduct, "Ordered Product"),
            (EventKind::FulfilledOrder, "Fulfilled Order"),
            (EventKind::RefundedOrder, "Refunded Order"),
            (EventKind::ClosedOrder, "Closed Order"),
            (EventKind::AdjustedOrder, "Adjusted Order"),
            (EventKind::CancelledOrder, "Cancelled Order"),
            (EventKind::CreatedReservation, "Created Reservation"),
            (EventKind::ConfirmedReservation, "Confirmed Reservation"),
            (EventKind::CompletedReservation, "Completed Reservation"),
            (EventKind::CancelledReservation, "Cancelled Reservation"),
            (EventKind::NoShowReservation, "No Show Reservation"),
            (EventKind::SignedUpForLoyalty, "Signed Up for Loyalty Program"),
            (EventKind::CreatedLoyaltyRedemption, "Created Loyalty Redemption"),
            (EventKind::UpdatedLoyaltyRedemption, "Updated Loyalty Redemption"),
            (EventKind::AppliedLoyaltyRedemption, "Applied Loyalty Redemption"),
            (EventKind::CheckedInToLoyalty, "Checked In to Loyalty Program"),
            (EventKind::EarnedLoyaltyReward, "Earned Loyalty Reward"),
            (EventKind::ConvertedLoyaltyPoints, "Converted Loyalty Points"),
            (EventKind::CompletedLoyaltyCard, "Completed Loyalty Card"),
        ];
        assert_eq!(expected.len(), EventKind::ALL.len());
        for (kind, name) in expected {
            assert_eq!(kind.metric_name(), name);
        }
    }

    #[test]
    fn test_metric_names_are_unique() {
        let names: HashSet<_> = EventKind::ALL.iter().map(|k| k.metric_name()).collect();
        assert_eq!(names.len(), EventKind::ALL.len());
    }

    #[test]
    fn test_required_and_optional_do_not_overlap() {
        for kind in EventKind::ALL {
            let spec = kind.spec();
            assert!(!spec.required.is_empty(), "{} has no required keys", kind);
            for key in spec.required {
                assert!(!spec.optional.contains(key), "{}: {} is both required and optional", kind, key);
            }
        }
    }

    #[test]
    fn test_only_ordering_is_monetary() {
        for kind in EventKind::ALL {
            assert_eq!(kind.is_monetary(), kind.domain() == Domain::Ordering, "{}", kind);
        }
    }

    #[test]
    fn test_loyalty_rules_point_at_accepted_keys() {
        for kind in EventKind::ALL {
            let spec = kind.spec();
            match spec.loyalty {
                Some(rule) => {
                    assert_eq!(spec.domain, Domain::Loyalty);
                    assert!(spec.accepts(rule.points_key), "{}", kind);
                }
                None => assert_ne!(spec.domain, Domain::Loyalty),
            }
        }
    }

    #[test]
    fn test_domain_counts() {
        assert_eq!(EventKind::in_domain(Domain::Ordering).count(), 7);
        assert_eq!(EventKind::in_domain(Domain::Reservations).count(), 5);
        assert_eq!(EventKind::in_domain(Domain::Loyalty).count(), 8);
    }

    #[test]
    fn test_slug_and_lookup() {
        assert_eq!(EventKind::PlacedOrder.slug(), "placed-order");
        assert_eq!(EventKind::NoShowReservation.slug(), "no-show-reservation");
        assert_eq!(
            EventKind::from_metric_name("Checked In to Loyalty Program"),
            Some(EventKind::CheckedInToLoyalty)
        );
        assert_eq!(EventKind::from_metric_name("Unknown"), None);
    }

    #[test]
    fn test_restaurant_keys_accepted_by_reservations() {
        for kind in EventKind::in_domain(Domain::Reservations) {
            for key in ["RestaurantId", "RestaurantName"] {
                assert!(kind.spec().accepts(key), "{} should accept {}", kind, key);
            }
        }
    }
}
