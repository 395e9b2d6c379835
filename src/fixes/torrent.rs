//! Torrent infinite-loading fix
//!
//! A crash while mounted can leave Torrent with zero HP but an Active
//! state; loading such a save hangs forever. Marking the horse dead lets
//! the game resurrect it normally.

use super::{occupied_slot, Fix, FixResult};
use crate::save::slot::world::{HorseState, RideGameData};
use crate::save::{encode_sub, Save};

pub struct TorrentFix;

impl Fix for TorrentFix {
    fn name(&self) -> &'static str {
        "Torrent Bug"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index).is_some_and(|slot| slot.horse.has_bug())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("Torrent bug not present");
        }

        let (rel, hp, bytes) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            slot.horse.fix_bug();
            (
                slot.offsets.horse,
                slot.horse.hp,
                encode_sub(&slot.horse, RideGameData::write),
            )
        };
        save.write_back(slot_index, rel, &bytes);

        FixResult::applied(format!(
            "state changed from Active({}) to Dead({})",
            HorseState::Active as u32,
            HorseState::Dead as u32
        ))
        .with_details(vec![format!("HP: {hp}")])
    }
}
