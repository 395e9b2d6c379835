//! In-game clock resynchronization
//!
//! The slot's (hour, minute, second) must be derivable from the profile
//! summary's total seconds played. A desynced or out-of-range clock is
//! rebuilt from the playtime counter.

use super::{occupied_slot, Fix, FixResult};
use crate::save::slot::world::WorldAreaTime;
use crate::save::{encode_sub, Save};

pub struct TimeFix;

impl TimeFix {
    fn corrupted(time: WorldAreaTime, seconds_played: Option<u32>) -> bool {
        if time.minute > 59 || time.second > 59 {
            return true;
        }
        match seconds_played {
            Some(seconds) => time != WorldAreaTime::from_seconds_played(seconds),
            // Without the profile counter only the all-zero clock is
            // suspicious enough to call out
            None => time.hour == 0 && time.minute == 0 && time.second == 0,
        }
    }
}

impl Fix for TimeFix {
    fn name(&self) -> &'static str {
        "Time Corruption"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        let Some(slot) = occupied_slot(save, slot_index) else {
            return false;
        };
        Self::corrupted(slot.world_area_time, save.seconds_played(slot_index))
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("clock matches playtime");
        }
        let Some(seconds) = save.seconds_played(slot_index) else {
            return FixResult::skipped("profile summary has no playtime for this slot");
        };

        let (rel, old, new_time, bytes) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            let old = slot.world_area_time;
            slot.world_area_time = WorldAreaTime::from_seconds_played(seconds);
            (
                slot.offsets.time,
                old,
                slot.world_area_time,
                encode_sub(&slot.world_area_time, WorldAreaTime::write),
            )
        };
        save.write_back(slot_index, rel, &bytes);

        FixResult::applied(format!(
            "time set to {:02}:{:02}:{:02}",
            new_time.hour, new_time.minute, new_time.second
        ))
        .with_details(vec![
            format!("previous: {:02}:{:02}:{:02}", old.hour, old.minute, old.second),
            format!("seconds played: {seconds}"),
        ])
    }
}
