//! SteamID synchronization
//!
//! Every slot stores a copy of the account Steam ID; the game refuses
//! slots whose copy differs from the one in the common region. The fix
//! propagates the common value into the slot.

use super::{occupied_slot, Fix, FixResult};
use crate::save::Save;

pub struct SteamIdFix;

impl Fix for SteamIdFix {
    fn name(&self) -> &'static str {
        "SteamID Sync"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        let Some(slot) = occupied_slot(save, slot_index) else {
            return false;
        };
        let reference = save.common().steam_id;
        slot.steam_id == 0 || (reference != 0 && slot.steam_id != reference)
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("SteamID already in sync");
        }
        let reference = save.common().steam_id;
        if reference == 0 {
            return FixResult::skipped("common region has no SteamID to copy");
        }

        let (rel, old) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            let old = slot.steam_id;
            slot.steam_id = reference;
            (slot.offsets.steam_id, old)
        };
        save.write_back(slot_index, rel, &reference.to_le_bytes());

        FixResult::applied(format!("SteamID set to {reference}"))
            .with_details(vec![format!("previous value: {old}")])
    }
}
