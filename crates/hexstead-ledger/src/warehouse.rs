//! The settlement warehouse: typed resource stacks with a level-dependent
//! per-resource capacity.
//!
//! Each resource stack is capped independently at [`Warehouse::capacity`].
//! Deposits beyond the cap are dropped and reported through the returned
//! amount rather than overflowing. All arithmetic is checked; no operation
//! panics.

use std::collections::BTreeMap;

use hexstead_types::ResourceId;

use crate::LedgerError;

/// Bounded multi-resource storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warehouse {
    /// Current level, starting at 1.
    level: u32,
    /// Per-resource capacity for each level; index 0 is level 1.
    capacities: Vec<u32>,
    /// Stored amounts. Zero stacks are removed.
    stacks: BTreeMap<ResourceId, u32>,
}

impl Warehouse {
    /// Create an empty warehouse at `level` with the given capacity table.
    ///
    /// The level is clamped into `1..=capacities.len()`. An empty table
    /// yields a warehouse with zero capacity.
    pub fn new(level: u32, capacities: Vec<u32>) -> Self {
        let max_level = u32::try_from(capacities.len()).unwrap_or(u32::MAX).max(1);
        Self {
            level: level.clamp(1, max_level),
            capacities,
            stacks: BTreeMap::new(),
        }
    }

    /// Current warehouse level.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Highest level the capacity table defines.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.capacities.len()).unwrap_or(u32::MAX).max(1)
    }

    /// Per-resource capacity at the current level.
    pub fn capacity(&self) -> u32 {
        let index = usize::try_from(self.level.saturating_sub(1)).unwrap_or(usize::MAX);
        self.capacities
            .get(index)
            .or_else(|| self.capacities.last())
            .copied()
            .unwrap_or(0)
    }

    /// Units of `resource` currently stored.
    pub fn amount(&self, resource: &str) -> u32 {
        self.stacks.get(resource).copied().unwrap_or(0)
    }

    /// Whether at least `amount` units of `resource` are stored.
    pub fn has(&self, resource: &str, amount: u32) -> bool {
        self.amount(resource) >= amount
    }

    /// Room left in the stack for `resource`.
    pub fn remaining_capacity(&self, resource: &str) -> u32 {
        self.capacity().saturating_sub(self.amount(resource))
    }

    /// Iterate over non-empty stacks in resource-id order.
    pub fn stacks(&self) -> impl Iterator<Item = (&ResourceId, u32)> {
        self.stacks.iter().map(|(id, amount)| (id, *amount))
    }

    /// Add up to `amount` units of `resource`, returning how many were
    /// actually stored. The excess over capacity is dropped.
    pub fn deposit(&mut self, resource: &ResourceId, amount: u32) -> u32 {
        let added = amount.min(self.remaining_capacity(resource.as_str()));
        if added < amount {
            tracing::debug!(
                resource = %resource,
                requested = amount,
                added,
                capacity = self.capacity(),
                "Warehouse full, dropping excess"
            );
        }
        if added > 0 {
            let stack = self.stacks.entry(resource.clone()).or_insert(0);
            // Bounded by capacity, so this saturating add never saturates.
            *stack = stack.saturating_add(added);
        }
        added
    }

    /// Remove exactly `amount` units of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientResource`] if fewer than `amount`
    /// units are stored. Nothing is removed in that case.
    pub fn withdraw(&mut self, resource: &ResourceId, amount: u32) -> Result<(), LedgerError> {
        let current = self.amount(resource.as_str());
        let remaining =
            current
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientResource {
                    resource: resource.clone(),
                    required: u64::from(amount),
                    available: current,
                })?;

        if remaining == 0 {
            self.stacks.remove(resource.as_str());
        } else {
            self.stacks.insert(resource.clone(), remaining);
        }
        Ok(())
    }

    /// Overwrite the stored amount for `resource`, clamped to capacity.
    ///
    /// Used when rebuilding from a snapshot. Returns the stored amount.
    pub fn restore(&mut self, resource: ResourceId, amount: u32) -> u32 {
        let stored = amount.min(self.capacity());
        if stored < amount {
            tracing::warn!(
                resource = %resource,
                saved = amount,
                stored,
                "Saved warehouse amount exceeds capacity, clamping"
            );
        }
        if stored == 0 {
            self.stacks.remove(resource.as_str());
        } else {
            self.stacks.insert(resource, stored);
        }
        stored
    }

    /// Raise the warehouse by one level.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WarehouseMaxLevel`] when no higher level is
    /// configured.
    pub fn upgrade(&mut self) -> Result<u32, LedgerError> {
        if self.level >= self.max_level() {
            return Err(LedgerError::WarehouseMaxLevel { level: self.level });
        }
        self.level = self.level.saturating_add(1);
        Ok(self.level)
    }
}
