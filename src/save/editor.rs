//! Character editing operations
//!
//! Mutations the editor surfaces expose on top of the parsed view:
//! renames, stat and rune edits, item grants and gesture unlocks. Every
//! operation follows the writeback protocol: mutate the parsed
//! substructure, re-encode just that substructure, overwrite its
//! recorded range in the raw image. Callers refresh checksums before
//! writing the file.

use num_enum::TryFromPrimitive;
use tracing::debug;

use crate::error::{Result, SaveError};
use crate::save::common::{ProfileEntry, PROFILE_SUMMARY_OFFSET};
use crate::save::slot::equipment::{Gaitem, ItemCategory};
use crate::save::slot::GAITEM_MAP_OFFSET;
use crate::save::{encode_sub, Save};

/// The eight levelled attributes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum Attribute {
    Vigor = 0,
    Mind = 1,
    Endurance = 2,
    Strength = 3,
    Dexterity = 4,
    Intelligence = 5,
    Faith = 6,
    Arcane = 7,
}

impl Save {
    fn occupied_mut(&mut self, slot_index: usize) -> Result<()> {
        if self.slot(slot_index)?.is_empty() {
            return Err(SaveError::SlotEmpty(slot_index));
        }
        Ok(())
    }

    /// Re-encode the player record at its recorded offset.
    fn write_player_back(&mut self, slot_index: usize) -> Result<()> {
        let (rel, bytes) = {
            let slot = self.slot(slot_index)?;
            (slot.offsets.player, slot.player.to_bytes()?)
        };
        self.write_back(slot_index, rel, &bytes);
        Ok(())
    }

    /// Re-encode one profile-summary entry at its fixed offset.
    fn write_profile_back(&mut self, slot_index: usize) -> Result<()> {
        let entry = self.common().profile_summary.profiles[slot_index].clone();
        let bytes = encode_sub(&entry, ProfileEntry::write);
        let rel = PROFILE_SUMMARY_OFFSET + slot_index * ProfileEntry::SIZE;
        self.write_back_common(rel, &bytes);
        Ok(())
    }

    /// Rename a character. The name is written both into the slot's
    /// player record and the menu profile summary.
    pub fn set_character_name(&mut self, slot_index: usize, name: &str) -> Result<()> {
        self.occupied_mut(slot_index)?;
        self.slot_mut(slot_index)?.player.character_name = name.to_string();
        self.write_player_back(slot_index)?;

        self.common_mut().profile_summary.profiles[slot_index].character_name = name.to_string();
        self.write_profile_back(slot_index)?;
        debug!(slot_index, name, "character renamed");
        Ok(())
    }

    /// Set the character level, mirrored into the profile summary.
    pub fn set_level(&mut self, slot_index: usize, level: u32) -> Result<()> {
        self.occupied_mut(slot_index)?;
        self.slot_mut(slot_index)?.player.level = level;
        self.write_player_back(slot_index)?;

        self.common_mut().profile_summary.profiles[slot_index].level = level;
        self.write_profile_back(slot_index)
    }

    /// Set one attribute.
    pub fn set_attribute(&mut self, slot_index: usize, attribute: Attribute, value: u32) -> Result<()> {
        self.occupied_mut(slot_index)?;
        {
            let player = &mut self.slot_mut(slot_index)?.player;
            match attribute {
                Attribute::Vigor => player.vigor = value,
                Attribute::Mind => player.mind = value,
                Attribute::Endurance => player.endurance = value,
                Attribute::Strength => player.strength = value,
                Attribute::Dexterity => player.dexterity = value,
                Attribute::Intelligence => player.intelligence = value,
                Attribute::Faith => player.faith = value,
                Attribute::Arcane => player.arcane = value,
            }
        }
        self.write_player_back(slot_index)
    }

    /// Set held runes. The lifetime rune memory never decreases.
    pub fn set_runes(&mut self, slot_index: usize, runes: u32) -> Result<()> {
        self.occupied_mut(slot_index)?;
        {
            let player = &mut self.slot_mut(slot_index)?.player;
            player.runes = runes;
            player.runes_memory = player.runes_memory.max(runes);
        }
        self.write_player_back(slot_index)
    }

    /// Grant an item: claim a free gaitem record of the exact wire width
    /// the item category needs and add an inventory line for it.
    ///
    /// Returns the gaitem handle of the new record. Fails when no free
    /// record of the matching width exists (a record of a different
    /// width would shift every byte after it) or the inventory is full.
    pub fn add_item(&mut self, slot_index: usize, item_id: u32, quantity: u32) -> Result<u32> {
        self.occupied_mut(slot_index)?;

        let (gaitem_rel, gaitem_bytes, inventory_rel, inventory_bytes, handle) = {
            let slot = self.slot_mut(slot_index)?;

            let gaitem = Gaitem::new(0, item_id);
            if gaitem.is_empty() {
                return Err(SaveError::InvalidArgument(format!(
                    "item id {item_id:#010x} is an empty-entry marker"
                )));
            }
            let width = gaitem.wire_width();
            let entry_index = slot.gaitem_map.find_empty(width).ok_or_else(|| {
                SaveError::InvalidArgument(format!(
                    "no free {width}-byte gaitem record for item {item_id:#010x}"
                ))
            })?;

            // Handles carry a category tag in the top nibble. Weapons and
            // armor are addressed by their table index, talismans and
            // goods by the param id with the category nibble stripped
            let base_item_id = item_id & 0x0FFF_FFFF;
            let table_index = entry_index as u32 & 0xFFFF;
            let handle = match gaitem.category() {
                Some(ItemCategory::Weapon) => 0x8000_0000 | table_index,
                Some(ItemCategory::Armor) => 0x9000_0000 | table_index,
                Some(ItemCategory::Accessory) => 0xA000_0000 | base_item_id,
                Some(ItemCategory::Goods) => 0xB000_0000 | base_item_id,
                None => 0xB000_0000 | table_index,
            };
            slot.gaitem_map.entries[entry_index] = Gaitem::new(handle, item_id);

            let inventory = &mut slot.inventory_held;
            let line_index = inventory.common_count as usize;
            if line_index >= inventory.common_capacity() {
                return Err(SaveError::InvalidArgument(
                    "held inventory is full".to_string(),
                ));
            }
            inventory.common_items[line_index].gaitem_handle = handle;
            inventory.common_items[line_index].quantity = quantity;
            inventory.common_items[line_index].inventory_index = inventory.next_acquisition_index;
            inventory.common_count += 1;
            inventory.next_acquisition_index += 1;

            (
                GAITEM_MAP_OFFSET,
                encode_sub(&slot.gaitem_map, |map, w| map.write(w)),
                slot.offsets.inventory_held,
                encode_sub(&slot.inventory_held, |inv, w| inv.write(w)),
                handle,
            )
        };

        self.write_back(slot_index, gaitem_rel, &gaitem_bytes);
        self.write_back(slot_index, inventory_rel, &inventory_bytes);
        debug!(slot_index, item_id, handle, "item granted");
        Ok(handle)
    }

    /// Unlock a gesture. Returns false when it was already unlocked or
    /// the table is full.
    pub fn unlock_gesture(&mut self, slot_index: usize, gesture_id: u32) -> Result<bool> {
        self.occupied_mut(slot_index)?;
        let (added, rel, bytes) = {
            let slot = self.slot_mut(slot_index)?;
            let added = slot.gestures.add(gesture_id);
            (
                added,
                slot.offsets.gestures,
                encode_sub(&slot.gestures, |g, w| g.write(w)),
            )
        };
        if added {
            self.write_back(slot_index, rel, &bytes);
        }
        Ok(added)
    }
}
