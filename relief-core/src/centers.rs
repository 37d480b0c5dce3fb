//! Relief centers and the registry that owns their stock.
//!
//! The registry is the only place stock changes. Each center guards its stock
//! with its own mutex and [`CenterRegistry::commit`] performs the feasibility
//! check and the subtraction inside one critical section, so two concurrent
//! commits can never both observe enough stock and both subtract.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{AllocationError, ConfigError};
use crate::request::Request;
use crate::types::{CenterId, Location, ResourceBundle};

#[derive(Debug)]
pub struct ReliefCenter {
    name: String,
    location: Location,
    stock: Mutex<ResourceBundle>,
}

impl ReliefCenter {
    fn new(name: String, location: Location, stock: ResourceBundle) -> Self {
        Self {
            name,
            location,
            stock: Mutex::new(stock),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Point-in-time copy of the stock levels.
    pub fn stock(&self) -> ResourceBundle {
        *self.lock_stock()
    }

    pub fn can_fulfill(&self, request: &Request) -> bool {
        self.lock_stock().covers(request.needs())
    }

    // Stock is only ever replaced whole, so a poisoned guard still holds a
    // consistent value.
    fn lock_stock(&self) -> MutexGuard<'_, ResourceBundle> {
        self.stock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for ReliefCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReliefCenter{{{} @ {}, stock=[{}]}}",
            self.name,
            self.location,
            self.stock()
        )
    }
}

/// Serializable view of one center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterSnapshot {
    pub name: String,
    pub location: Location,
    pub stock: ResourceBundle,
}

/// All relief centers, iterated in registration order.
#[derive(Debug, Default)]
pub struct CenterRegistry {
    centers: SlotMap<CenterId, ReliefCenter>,
    order: Vec<CenterId>,
}

impl CenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a center. Names must be unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        location: impl Into<Location>,
        stock: ResourceBundle,
    ) -> Result<CenterId, ConfigError> {
        let name = name.into();
        if self.find_by_name(&name).is_some() {
            return Err(ConfigError::DuplicateCenter { name });
        }
        let id = self
            .centers
            .insert(ReliefCenter::new(name, location.into(), stock));
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: CenterId) -> Option<&ReliefCenter> {
        self.centers.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<CenterId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.centers[id].name == name)
    }

    /// Centers in registration order.
    pub fn list(&self) -> impl Iterator<Item = (CenterId, &ReliefCenter)> + '_ {
        self.order.iter().map(|&id| (id, &self.centers[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn stock(&self, id: CenterId) -> Option<ResourceBundle> {
        self.centers.get(id).map(ReliefCenter::stock)
    }

    /// Advisory: the answer may be stale by the time a commit runs.
    pub fn can_fulfill(&self, id: CenterId, request: &Request) -> bool {
        self.centers
            .get(id)
            .is_some_and(|center| center.can_fulfill(request))
    }

    /// Subtract the request's needs from the center's stock.
    ///
    /// Feasibility is re-checked under the center's lock. If the center can no
    /// longer cover every resource, nothing is subtracted and
    /// `InsufficientStock` is returned. On success the remaining stock is
    /// returned.
    pub fn commit(&self, id: CenterId, request: &Request) -> Result<ResourceBundle, AllocationError> {
        let center = self.centers.get(id).ok_or(AllocationError::UnknownCenter)?;
        let mut stock = center.lock_stock();
        match stock.checked_sub(request.needs()) {
            Some(remaining) => {
                *stock = remaining;
                Ok(remaining)
            }
            None => Err(AllocationError::InsufficientStock {
                center: center.name.clone(),
                available: *stock,
                needed: *request.needs(),
            }),
        }
    }

    pub fn snapshot(&self) -> Vec<CenterSnapshot> {
        self.list()
            .map(|(_, c)| CenterSnapshot {
                name: c.name.clone(),
                location: c.location.clone(),
                stock: c.stock(),
            })
            .collect()
    }

    /// Sum of stock over every center.
    pub fn total_stock(&self) -> ResourceBundle {
        self.list().fold(ResourceBundle::ZERO, |acc, (_, c)| {
            let s = c.stock();
            ResourceBundle::new(
                acc.food.saturating_add(s.food),
                acc.water.saturating_add(s.water),
                acc.medicine.saturating_add(s.medicine),
            )
        })
    }
}
