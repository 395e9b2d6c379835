//! Shadow of the Erdtree record fixes
//!
//! Two independent invariants on the 50-byte DLC record: the entry flag
//! must be clear for players who do not own the expansion, and the
//! reserved tail (bytes 3..50) must be zero.

use super::{occupied_slot, Fix, FixResult};
use crate::save::slot::world::Dlc;
use crate::save::{encode_sub, Save};

/// Clears the "entered DLC" flag so the slot loads without the DLC
/// installed.
pub struct DlcFlagFix;

impl Fix for DlcFlagFix {
    fn name(&self) -> &'static str {
        "DLC Entry Flag"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index).is_some_and(|slot| slot.dlc.entered_flag() != 0)
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("DLC entry flag not set");
        }

        let (rel, old, bytes) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            let old = slot.dlc.entered_flag();
            slot.dlc.clear_entered_flag();
            (slot.offsets.dlc, old, encode_sub(&slot.dlc, Dlc::write))
        };
        save.write_back(slot_index, rel, &bytes);

        FixResult::applied("DLC entry flag cleared")
            .with_details(vec![format!("previous flag value: {old}")])
    }
}

/// Zeroes garbage in the reserved tail of the DLC record.
pub struct InvalidDlcFix;

impl Fix for InvalidDlcFix {
    fn name(&self) -> &'static str {
        "Invalid DLC Data"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index).is_some_and(|slot| slot.dlc.has_garbage())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("no garbage in the DLC record");
        }

        let (rel, bytes) = {
            let slot = match save.slot_mut(slot_index) {
                Ok(slot) => slot,
                Err(err) => return FixResult::skipped(err.to_string()),
            };
            slot.dlc.clear_garbage();
            (slot.offsets.dlc, encode_sub(&slot.dlc, Dlc::write))
        };
        save.write_back(slot_index, rel, &bytes);

        FixResult::applied("invalid DLC data cleared")
            .with_details(vec![format!(
                "zeroed bytes {}..{} of the DLC record",
                Dlc::RESERVED_START,
                Dlc::SIZE
            )])
    }
}
