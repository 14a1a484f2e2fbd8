//! Inventory and equipment ledger.
//!
//! Every operation validates all of its preconditions before touching the
//! character, so a returned error always leaves the character unchanged.

use crate::config::EconomyConfig;
use crate::economy;
use crate::error::{GameError, Result};
use crate::models::{Character, EntryId, InventoryEntry, Item, Restore};
use crate::stats::recompute_final_stats;

/// Buy `quantity` units of `item`, stacking onto an existing entry for the
/// same item if there is one. Returns the entry id.
pub fn buy(character: &mut Character, item: &Item, quantity: u32) -> Result<EntryId> {
    if quantity == 0 {
        return Err(GameError::InvalidOperation("Purchase quantity must be positive".to_string()));
    }
    let cost = economy::purchase_cost(item, quantity)?;
    economy::ensure_funds(character, cost)?;

    let existing = character.inventory.iter().position(|e| e.item.id == item.id);
    if let Some(index) = existing {
        if character.inventory[index].quantity.checked_add(quantity).is_none() {
            return Err(GameError::InvalidOperation(format!(
                "Stack of {} would exceed the maximum quantity",
                item.name
            )));
        }
    }

    economy::debit(character, cost)?;
    let entry_id = match existing {
        Some(index) => {
            let entry = &mut character.inventory[index];
            entry.quantity += quantity;
            entry.id
        }
        None => {
            let id = character.allocate_entry_id();
            character.inventory.push(InventoryEntry {
                id,
                item: item.clone(),
                quantity,
                equipped: false,
            });
            id
        }
    };

    tracing::debug!(
        "Character {} bought {} x {} for {} gold",
        character.id,
        quantity,
        item.name,
        cost
    );
    Ok(entry_id)
}

/// Sell `quantity` units from an unequipped entry. Returns the gold credited.
pub fn sell(
    character: &mut Character,
    entry_id: EntryId,
    quantity: u32,
    config: &EconomyConfig,
) -> Result<u64> {
    if quantity == 0 {
        return Err(GameError::InvalidOperation("Sale quantity must be positive".to_string()));
    }
    let index = character.entry_index(entry_id)?;
    let entry = &character.inventory[index];
    if entry.equipped {
        return Err(GameError::InvalidOperation(format!(
            "{} is equipped and cannot be sold",
            entry.item.name
        )));
    }
    if entry.quantity < quantity {
        return Err(GameError::InsufficientQuantity {
            requested: quantity,
            owned: entry.quantity,
        });
    }

    let proceeds = economy::sell_price(&entry.item, config).saturating_mul(u64::from(quantity));
    let item_name = entry.item.name.clone();

    economy::credit(character, proceeds);
    remove_units(character, index, quantity);

    tracing::debug!(
        "Character {} sold {} x {} for {} gold",
        character.id,
        quantity,
        item_name,
        proceeds
    );
    Ok(proceeds)
}

/// Consume one unit of a potion or consumable. Returns the HP and MP
/// actually restored after clamping to the maximums.
pub fn use_item(character: &mut Character, entry_id: EntryId) -> Result<Restore> {
    let index = character.entry_index(entry_id)?;
    let entry = &character.inventory[index];
    let restore = *entry.item.kind.restore().ok_or_else(|| {
        GameError::InvalidOperation(format!(
            "{} ({}) cannot be used",
            entry.item.name,
            entry.item.item_type()
        ))
    })?;

    let stats = *character.stats();
    let hp = character.current_hp.saturating_add(restore.heal).min(stats.max_hp);
    let mp = character.current_mp.saturating_add(restore.mana).min(stats.max_mp);
    let applied = Restore {
        heal: hp - character.current_hp,
        mana: mp - character.current_mp,
    };
    character.current_hp = hp;
    character.current_mp = mp;
    remove_units(character, index, 1);

    tracing::debug!(
        "Character {} used entry {}: +{} HP, +{} MP",
        character.id,
        entry_id,
        applied.heal,
        applied.mana
    );
    Ok(applied)
}

/// Equip an unequipped weapon or armor, unequipping whatever else occupies
/// that slot, or unequip it if it is already worn. Returns the new equip
/// state of the entry.
pub fn toggle_equip(character: &mut Character, entry_id: EntryId) -> Result<bool> {
    let index = character.entry_index(entry_id)?;
    let entry = &character.inventory[index];
    let slot = entry.item.item_type();
    if !slot.is_equipment() {
        return Err(GameError::InvalidOperation(format!(
            "{} ({}) cannot be equipped",
            entry.item.name, slot
        )));
    }

    let equip = !entry.equipped;
    if equip {
        for other in character
            .inventory
            .iter_mut()
            .filter(|e| e.equipped && e.item.item_type() == slot)
        {
            other.equipped = false;
        }
    }
    character.inventory[index].equipped = equip;
    recompute_final_stats(character);

    Ok(equip)
}

/// Drop units from the entry at `index`, removing it once empty.
fn remove_units(character: &mut Character, index: usize, quantity: u32) {
    let entry = &mut character.inventory[index];
    entry.quantity -= quantity;
    if entry.quantity == 0 {
        character.inventory.remove(index);
    }
}
