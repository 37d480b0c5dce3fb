// Relief requests as they enter the dispatch queue

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::types::{Location, Quantity, ResourceBundle, Urgency};

/// Where a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOrigin {
    Manual,
    Generated,
}

impl RequestOrigin {
    pub fn name(self) -> &'static str {
        match self {
            RequestOrigin::Manual => "manual",
            RequestOrigin::Generated => "generated",
        }
    }
}

/// A demand for relief at one location. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest")]
pub struct Request {
    location: Location,
    urgency: Urgency,
    needs: ResourceBundle,
    origin: RequestOrigin,
}

impl Request {
    /// Build a manually entered request, validating urgency and location.
    pub fn new(
        location: impl Into<Location>,
        urgency: u8,
        food: Quantity,
        water: Quantity,
        medicine: Quantity,
    ) -> Result<Self, RequestError> {
        let urgency = Urgency::try_from(urgency)?;
        Self::with_needs(
            location,
            urgency,
            ResourceBundle::new(food, water, medicine),
            RequestOrigin::Manual,
        )
    }

    pub fn with_needs(
        location: impl Into<Location>,
        urgency: Urgency,
        needs: ResourceBundle,
        origin: RequestOrigin,
    ) -> Result<Self, RequestError> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(RequestError::EmptyLocation);
        }
        Ok(Self {
            location,
            urgency,
            needs,
            origin,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn needs(&self) -> &ResourceBundle {
        &self.needs
    }

    pub fn food_needed(&self) -> Quantity {
        self.needs.food
    }

    pub fn water_needed(&self) -> Quantity {
        self.needs.water
    }

    pub fn medicine_needed(&self) -> Quantity {
        self.needs.medicine
    }

    pub fn origin(&self) -> RequestOrigin {
        self.origin
    }
}

/// Wire shape of [`Request`]; deserialized requests pass the same checks.
#[derive(Deserialize)]
struct RawRequest {
    location: Location,
    urgency: Urgency,
    needs: ResourceBundle,
    origin: RequestOrigin,
}

impl TryFrom<RawRequest> for Request {
    type Error = RequestError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        Self::with_needs(raw.location, raw.urgency, raw.needs, raw.origin)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request{{location={}, urgency={}, {}}}",
            self.location, self.urgency, self.needs
        )
    }
}
