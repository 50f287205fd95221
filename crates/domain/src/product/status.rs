//! Product availability state machine.

use serde::{Deserialize, Serialize};

/// The availability of a product listing.
///
/// State transitions (driven by the order aggregate):
/// ```text
/// Available ──► Reserved ──► Sold
///      ▲            │
///      └────────────┘ (release on cancellation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed and open to reservation.
    #[default]
    Available,

    /// Claimed by a pending order, awaiting payment or cancellation.
    Reserved,

    /// Payment completed (terminal state).
    Sold,
}

impl ProductStatus {
    /// Returns true if an order can reserve the product in this state.
    pub fn can_reserve(&self) -> bool {
        matches!(self, ProductStatus::Available)
    }

    /// Returns true if the product can go back to available in this state.
    pub fn can_release(&self) -> bool {
        matches!(self, ProductStatus::Reserved)
    }

    /// Reserved and sold products carry an order reference and cannot be
    /// deleted on their own.
    pub fn is_deletable(&self) -> bool {
        matches!(self, ProductStatus::Available)
    }

    /// Returns the status as its wire/storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Reserved => "reserved",
            ProductStatus::Sold => "sold",
        }
    }

    /// Parses a storage string back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(ProductStatus::Available),
            "reserved" => Some(ProductStatus::Reserved),
            "sold" => Some(ProductStatus::Sold),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_available() {
        assert_eq!(ProductStatus::default(), ProductStatus::Available);
    }

    #[test]
    fn only_available_can_reserve() {
        assert!(ProductStatus::Available.can_reserve());
        assert!(!ProductStatus::Reserved.can_reserve());
        assert!(!ProductStatus::Sold.can_reserve());
    }

    #[test]
    fn only_reserved_can_release() {
        assert!(!ProductStatus::Available.can_release());
        assert!(ProductStatus::Reserved.can_release());
        assert!(!ProductStatus::Sold.can_release());
    }

    #[test]
    fn reserved_and_sold_are_not_deletable() {
        assert!(ProductStatus::Available.is_deletable());
        assert!(!ProductStatus::Reserved.is_deletable());
        assert!(!ProductStatus::Sold.is_deletable());
    }

    #[test]
    fn wire_strings_are_snake_case() {
        assert_eq!(ProductStatus::Available.as_str(), "available");
        assert_eq!(ProductStatus::Reserved.as_str(), "reserved");
        assert_eq!(ProductStatus::Sold.as_str(), "sold");
        assert_eq!(
            serde_json::to_string(&ProductStatus::Reserved).unwrap(),
            "\"reserved\""
        );
    }

    #[test]
    fn parse_round_trips() {
        for status in [
            ProductStatus::Available,
            ProductStatus::Reserved,
            ProductStatus::Sold,
        ] {
            assert_eq!(ProductStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProductStatus::parse("archived"), None);
    }
}
