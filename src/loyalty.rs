//! Running loyalty-points balance
//!
//! Loyalty events carry the customer's balance after the event in the
//! `loyaltyPoints` profile property.

use serde_json::Value;

use crate::event::{EventKind, PointsEffect, ProfileRef, Properties};

/// Profile property holding the balance
pub const BALANCE_PROPERTY: &str = "loyaltyPoints";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoyaltyLedger {
    balance: i64,
}

impl LoyaltyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Apply the points effect of `kind`. Returns the new balance, or None when
    /// the kind has no points rule or its points property is not an integer.
    pub fn apply(&mut self, kind: EventKind, properties: &Properties) -> Option<i64> {
        let rule = kind.spec().loyalty?;
        let points = properties.get(rule.points_key).and_then(Value::as_i64)?;

        self.balance = match rule.effect {
            PointsEffect::Set => points,
            PointsEffect::Credit => self.balance.saturating_add(points),
            PointsEffect::Debit => self.balance.saturating_sub(points),
        };
        Some(self.balance)
    }

    /// Attach the current balance to a profile
    pub fn stamp(&self, profile: ProfileRef) -> ProfileRef {
        profile.with_property(BALANCE_PROPERTY, self.balance)
    }
}
