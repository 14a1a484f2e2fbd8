//! Gold ledger. Gold only moves through purchases, sales and battle rewards,
//! and never goes negative.

use crate::config::EconomyConfig;
use crate::error::{GameError, Result};
use crate::models::{Character, Item};

/// Total price of `quantity` units of `item`.
pub fn purchase_cost(item: &Item, quantity: u32) -> Result<u64> {
    item.price.checked_mul(u64::from(quantity)).ok_or_else(|| {
        GameError::InvalidOperation(format!(
            "Cost of {} x {} overflows the gold ledger",
            quantity, item.name
        ))
    })
}

/// Gold paid per unit when selling `item`, rounded down.
pub fn sell_price(item: &Item, config: &EconomyConfig) -> u64 {
    item.price.saturating_mul(config.sell_percent) / 100
}

/// Check that `amount` can be debited without touching the balance.
pub fn ensure_funds(character: &Character, amount: u64) -> Result<()> {
    if character.gold < amount {
        return Err(GameError::InsufficientFunds {
            required: amount,
            available: character.gold,
        });
    }
    Ok(())
}

pub fn debit(character: &mut Character, amount: u64) -> Result<()> {
    ensure_funds(character, amount)?;
    character.gold -= amount;
    Ok(())
}

pub fn credit(character: &mut Character, amount: u64) {
    character.gold = character.gold.saturating_add(amount);
}
