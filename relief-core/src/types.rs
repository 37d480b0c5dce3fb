use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// ============================================================================
// IDs
// ============================================================================

new_key_type! {
    pub struct CenterId;
}

/// Named node of the location network.
pub type Location = String;

/// Whole units of a single resource.
pub type Quantity = u32;

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Food,
    Water,
    Medicine,
}

impl Resource {
    /// Returns an iterator over all resource kinds
    pub fn all() -> impl Iterator<Item = Resource> {
        [Resource::Food, Resource::Water, Resource::Medicine].into_iter()
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Water => "water",
            Resource::Medicine => "medicine",
        }
    }
}

/// One quantity per resource kind.
///
/// Used for both what a request needs and what a center holds. Quantities are
/// unsigned, so a stock level below zero cannot be represented; subtraction
/// goes through [`ResourceBundle::checked_sub`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub food: Quantity,
    pub water: Quantity,
    pub medicine: Quantity,
}

impl ResourceBundle {
    pub const ZERO: ResourceBundle = ResourceBundle {
        food: 0,
        water: 0,
        medicine: 0,
    };

    pub fn new(food: Quantity, water: Quantity, medicine: Quantity) -> Self {
        Self {
            food,
            water,
            medicine,
        }
    }

    pub fn get(&self, resource: Resource) -> Quantity {
        match resource {
            Resource::Food => self.food,
            Resource::Water => self.water,
            Resource::Medicine => self.medicine,
        }
    }

    /// True iff every kind in `self` is at least the amount in `need`.
    pub fn covers(&self, need: &ResourceBundle) -> bool {
        Resource::all().all(|r| self.get(r) >= need.get(r))
    }

    /// All-or-nothing subtraction: `None` if any kind would drop below zero.
    pub fn checked_sub(&self, need: &ResourceBundle) -> Option<ResourceBundle> {
        Some(ResourceBundle {
            food: self.food.checked_sub(need.food)?,
            water: self.water.checked_sub(need.water)?,
            medicine: self.medicine.checked_sub(need.medicine)?,
        })
    }

    pub fn total(&self) -> u64 {
        Resource::all().map(|r| u64::from(self.get(r))).sum()
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, resource) in Resource::all().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", resource.name(), self.get(resource))?;
        }
        Ok(())
    }
}

// ============================================================================
// Urgency
// ============================================================================

/// Request priority in `1..=10`; higher is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Urgency(u8);

impl Urgency {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Urgency {
    type Error = crate::error::RequestError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Urgency::new(level).ok_or(crate::error::RequestError::UrgencyOutOfRange { urgency: level })
    }
}

impl From<Urgency> for u8 {
    fn from(urgency: Urgency) -> u8 {
        urgency.0
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_requires_every_kind() {
        let stock = ResourceBundle::new(10, 10, 10);
        assert!(stock.covers(&ResourceBundle::new(10, 10, 10)));
        assert!(stock.covers(&ResourceBundle::ZERO));
        assert!(!stock.covers(&ResourceBundle::new(10, 11, 0)));
    }

    #[test]
    fn checked_sub_is_all_or_nothing() {
        let stock = ResourceBundle::new(5, 5, 5);
        assert_eq!(
            stock.checked_sub(&ResourceBundle::new(1, 2, 3)),
            Some(ResourceBundle::new(4, 3, 2))
        );
        assert_eq!(stock.checked_sub(&ResourceBundle::new(1, 6, 0)), None);
    }

    #[test]
    fn bundle_displays_each_kind_by_name() {
        assert_eq!(
            ResourceBundle::new(3, 0, 12).to_string(),
            "food=3, water=0, medicine=12"
        );
    }

    #[test]
    fn urgency_range_is_enforced() {
        assert!(Urgency::new(0).is_none());
        assert!(Urgency::new(11).is_none());
        assert_eq!(Urgency::new(10).map(Urgency::level), Some(10));
        assert!(Urgency::try_from(1u8).is_ok());
    }

    #[test]
    fn urgency_deserializes_with_validation() {
        let ok: Urgency = serde_json::from_str("7").unwrap();
        assert_eq!(ok.level(), 7);
        assert!(serde_json::from_str::<Urgency>("42").is_err());
    }
}
