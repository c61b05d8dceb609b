//! The settlement wallet: credits plus the warehouse.
//!
//! [`Wallet::can_afford`] and [`Wallet::commit`] form the two-phase
//! spending protocol. Both walk the same pools in the same order (credits,
//! then resource lines as listed), summing repeated resource lines so a
//! cost that names the same resource twice is checked against the total.

use std::collections::BTreeMap;

use hexstead_types::{ResourceCost, ResourceId};

use crate::{Affordability, LedgerError, Shortfall, Warehouse};

/// Credits and warehouse owned by one settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    /// Scalar currency. Never negative.
    credits: u64,
    /// Bounded resource storage.
    warehouse: Warehouse,
}

impl Wallet {
    /// Create a wallet with `credits` and the given warehouse.
    pub const fn new(credits: u64, warehouse: Warehouse) -> Self {
        Self { credits, warehouse }
    }

    /// Credits on hand.
    pub const fn credits(&self) -> u64 {
        self.credits
    }

    /// Read-only view of the warehouse.
    pub const fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// Mutable access to the warehouse, for upgrades and snapshot restore.
    pub const fn warehouse_mut(&mut self) -> &mut Warehouse {
        &mut self.warehouse
    }

    /// Check whether `credits` plus every line of `costs` can be paid.
    ///
    /// Reports the first shortfall: credits first, then resource lines in
    /// listed order. Nothing is mutated.
    pub fn can_afford(&self, credits: u64, costs: &[ResourceCost]) -> Affordability {
        if self.credits < credits {
            return Affordability::Insufficient(Shortfall::Credits {
                required: credits,
                available: self.credits,
            });
        }

        let mut required: BTreeMap<&ResourceId, u64> = BTreeMap::new();
        for line in costs {
            let total = required.entry(&line.resource).or_insert(0);
            *total = total.saturating_add(u64::from(line.amount));
            let available = self.warehouse.amount(line.resource.as_str());
            if u64::from(available) < *total {
                return Affordability::Insufficient(Shortfall::Resource {
                    resource: line.resource.clone(),
                    required: *total,
                    available,
                });
            }
        }

        Affordability::Affordable
    }

    /// Deduct `credits` and every line of `costs`.
    ///
    /// Callers are expected to have checked [`Wallet::can_afford`] first.
    /// The check is repeated here and a failing commit mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientCredits`] or
    /// [`LedgerError::InsufficientResource`] for the first pool found short.
    pub fn commit(&mut self, credits: u64, costs: &[ResourceCost]) -> Result<(), LedgerError> {
        self.can_afford(credits, costs).into_result()?;

        self.credits = self.credits.checked_sub(credits).ok_or_else(|| {
            LedgerError::ArithmeticOverflow {
                context: String::from("credit deduction underflow after affordability check"),
            }
        })?;
        for line in costs {
            self.warehouse.withdraw(&line.resource, line.amount)?;
        }

        tracing::debug!(
            credits,
            lines = costs.len(),
            remaining = self.credits,
            "Committed cost"
        );
        Ok(())
    }

    /// Return `amount` credits to the wallet.
    pub fn refund(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
        tracing::debug!(amount, credits = self.credits, "Refunded credits");
    }

    /// Credit the wallet with earnings (tier rewards, sales).
    pub fn add_credits(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
    }

    /// Store up to `amount` units of `resource`; returns the units actually
    /// added. Excess over the warehouse capacity is dropped.
    pub fn deposit(&mut self, resource: &ResourceId, amount: u32) -> u32 {
        self.warehouse.deposit(resource, amount)
    }

    /// Remove exactly `amount` units of `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientResource`] when short.
    pub fn withdraw(&mut self, resource: &ResourceId, amount: u32) -> Result<(), LedgerError> {
        self.warehouse.withdraw(resource, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Wallet {
        let mut wallet = Wallet::new(50, Warehouse::new(1, vec![100, 200]));
        wallet.deposit(&ResourceId::new("wood"), 10);
        wallet.deposit(&ResourceId::new("stone"), 2);
        wallet
    }

    #[test]
    fn affordable_cost() {
        let costs = [ResourceCost::new("wood", 10), ResourceCost::new("stone", 2)];
        assert!(wallet().can_afford(50, &costs).is_affordable());
    }

    #[test]
    fn credits_are_reported_first() {
        let costs = [ResourceCost::new("stone", 9)];
        assert_eq!(
            wallet().can_afford(60, &costs),
            Affordability::Insufficient(Shortfall::Credits {
                required: 60,
                available: 50,
            })
        );
    }

    #[test]
    fn first_short_line_is_reported() {
        let costs = [
            ResourceCost::new("wood", 1),
            ResourceCost::new("stone", 3),
            ResourceCost::new("clay", 1),
        ];
        let result = wallet().can_afford(0, &costs);
        assert!(matches!(
            result,
            Affordability::Insufficient(Shortfall::Resource { ref resource, required: 3, available: 2 })
                if resource.as_str() == "stone"
        ));
    }

    #[test]
    fn repeated_lines_are_summed() {
        let costs = [ResourceCost::new("wood", 6), ResourceCost::new("wood", 6)];
        assert!(!wallet().can_afford(0, &costs).is_affordable());
    }

    #[test]
    fn commit_deducts_everything() {
        let mut w = wallet();
        let costs = [ResourceCost::new("wood", 4)];
        assert!(w.commit(20, &costs).is_ok());
        assert_eq!(w.credits(), 30);
        assert_eq!(w.warehouse().amount("wood"), 6);
    }

    #[test]
    fn failed_commit_mutates_nothing() {
        let mut w = wallet();
        let before = w.clone();
        let costs = [ResourceCost::new("wood", 4), ResourceCost::new("stone", 5)];
        assert!(w.commit(20, &costs).is_err());
        assert_eq!(w, before);
    }

    #[test]
    fn refund_and_earnings_add_credits() {
        let mut w = wallet();
        w.refund(12);
        w.add_credits(8);
        assert_eq!(w.credits(), 70);
    }

    #[test]
    fn shortfall_message_is_player_facing() {
        let shortfall = Shortfall::Resource {
            resource: ResourceId::new("stone"),
            required: 3,
            available: 2,
        };
        assert_eq!(shortfall.to_string(), "Not enough stone (2/3)");
    }
}
