//! Teleport and DLC escape
//!
//! Teleport is not a detector-driven fix: the caller picks a destination
//! and the map id (and optionally the in-map coordinates) are rewritten.
//! DLC escape composes a teleport to Limgrave with the entry-flag clear
//! for characters stranded in Shadow of the Erdtree without owning it.

use super::dlc::DlcFlagFix;
use super::{occupied_slot, Fix, FixResult};
use crate::save::slot::world::{FloatVector3, MapId, PlayerCoordinates};
use crate::save::{encode_sub, Save};

/// Payload-relative offset of the map id field inside a slot.
const MAP_ID_OFFSET: usize = 4;

// =============================================================================
// DESTINATIONS
// =============================================================================

/// A safe teleport destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleportLocation {
    pub name: &'static str,
    pub display_name: &'static str,
    pub map_id: MapId,
}

/// Known-safe destinations, all outside the DLC.
pub const TELEPORT_LOCATIONS: [TeleportLocation; 4] = [
    TeleportLocation {
        name: "limgrave",
        display_name: "Limgrave - The First Step",
        map_id: MapId([0, 36, 42, 60]),
    },
    TeleportLocation {
        name: "roundtable",
        display_name: "Roundtable Hold",
        map_id: MapId([0, 0, 10, 11]),
    },
    TeleportLocation {
        name: "liurnia",
        display_name: "Liurnia - Lake-Facing Cliffs",
        map_id: MapId([0, 37, 44, 60]),
    },
    TeleportLocation {
        name: "altus",
        display_name: "Altus Plateau - Erdtree-Gazing Hill",
        map_id: MapId([0, 38, 46, 60]),
    },
];

impl TeleportLocation {
    /// Look a destination up by its CLI name.
    pub fn by_name(name: &str) -> Option<&'static TeleportLocation> {
        TELEPORT_LOCATIONS.iter().find(|loc| loc.name == name)
    }
}

// =============================================================================
// TELEPORT
// =============================================================================

/// Move a character to a chosen destination.
pub struct TeleportFix {
    pub destination: &'static TeleportLocation,
    /// When set, the in-map coordinates are rewritten too.
    pub coordinates: Option<FloatVector3>,
}

impl TeleportFix {
    pub fn new(destination: &'static TeleportLocation) -> Self {
        Self {
            destination,
            coordinates: None,
        }
    }

    pub fn with_coordinates(destination: &'static TeleportLocation, position: FloatVector3) -> Self {
        Self {
            destination,
            coordinates: Some(position),
        }
    }
}

impl Fix for TeleportFix {
    fn name(&self) -> &'static str {
        "Teleport"
    }

    /// Teleport is caller-driven; "needed" here means the character is
    /// stuck in a DLC map.
    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index).is_some_and(|slot| slot.map_id.is_dlc())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        let Some(slot) = occupied_slot(save, slot_index) else {
            return FixResult::skipped("slot is empty");
        };
        let from = slot.map_id;

        let coordinates_rel = {
            let slot = save.slot_mut(slot_index).expect("occupied slot vanished");
            slot.map_id = self.destination.map_id;
            if let Some(position) = self.coordinates {
                slot.player_coordinates.position = position;
            }
            slot.offsets.coordinates
        };
        let map_bytes = self.destination.map_id.bytes();
        save.write_back(slot_index, MAP_ID_OFFSET, &map_bytes);
        if self.coordinates.is_some() {
            let coords = save
                .slot(slot_index)
                .expect("occupied slot vanished")
                .player_coordinates;
            let bytes = encode_sub(&coords, PlayerCoordinates::write);
            save.write_back(slot_index, coordinates_rel, &bytes);
        }

        FixResult::applied(format!("teleported to {}", self.destination.display_name))
            .with_details(vec![
                format!("from: {from}"),
                format!("to: {}", self.destination.map_id),
            ])
    }
}

// =============================================================================
// DLC ESCAPE
// =============================================================================

/// Teleport out of the DLC and clear the entry flag in one operation.
pub struct DlcEscapeFix;

impl Fix for DlcEscapeFix {
    fn name(&self) -> &'static str {
        "DLC Escape"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index).is_some_and(|slot| slot.map_id.is_dlc())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        if !self.detect(save, slot_index) {
            return FixResult::skipped("character is not in a DLC map");
        }

        let limgrave = TeleportLocation::by_name("limgrave").expect("limgrave is registered");
        let mut details = Vec::new();

        let teleport = TeleportFix::new(limgrave).apply(save, slot_index);
        if !teleport.applied {
            return teleport;
        }
        details.extend(teleport.details);

        let flag_fix = DlcFlagFix;
        if flag_fix.detect(save, slot_index) {
            let result = flag_fix.apply(save, slot_index);
            if result.applied {
                details.push("DLC entry flag cleared".to_string());
            }
        }

        FixResult::applied("escaped from the DLC area").with_details(details)
    }
}
