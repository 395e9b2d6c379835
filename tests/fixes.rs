//! End-to-end repair scenarios and detector soundness.

mod common;

use std::collections::HashSet;

use common::*;
use er_save_toolkit::fixes::event_flags::{
    detect_issues, GRACE_ENIR_ILIM_OUTER_WALL, GRACE_FRACTURED_MARIKA, GRACE_RADAHN,
    MORGOTT_DEFEATED, MORGOTT_FOG_WALL, MORGOTT_THORNS_TOUCHED, RANNI_BLOCKING_FLAG,
    RANNI_FLAGS_TO_ENABLE, SEALING_TREE_RESTED_AFTER, DEFEATED_RADAGON, DEFEATED_RADAHN,
    METEORITE_GREEN, RADAHN_MAP_MARKER, SPIRIT_TREE_BURNING,
};
use er_save_toolkit::fixes::{
    all_fixes, DlcEscapeFix, Fix, SteamIdFix, TeleportFix, TeleportLocation, TimeFix, TorrentFix,
    WeatherFix,
};
use er_save_toolkit::save::event_flags::{self, BLOCK_SIZE, FLAG_DIVISOR};
use er_save_toolkit::Save;

fn save_with_slot(slot_index: usize, slot: er_save_toolkit::Slot) -> Save {
    let image = build_pc_image(&[(slot_index, slot)], &healthy_common());
    Save::from_bytes(image).unwrap()
}

// =============================================================================
// SCENARIO 1: TORRENT
// =============================================================================

#[test]
fn test_scenario_torrent_fix() {
    let mut slot = healthy_slot();
    slot.horse.hp = 0;
    slot.horse.state = 13;
    let mut save = save_with_slot(0, slot);

    let horse_rel = save.slot(0).unwrap().offsets.horse;
    let state_abs = save.slot_data_offset(0) + horse_rel + 4;
    assert_eq!(&save.raw()[state_abs..state_abs + 4], &[0x0D, 0, 0, 0]);

    let before = save.raw().to_vec();
    let (applied, descriptions) = save.fix_character(0).unwrap();
    assert!(applied);
    assert_eq!(descriptions.len(), 1, "only the Torrent rule fires: {descriptions:?}");

    // The state field flips Active -> Dead
    assert_eq!(&save.raw()[state_abs..state_abs + 4], &[0x03, 0, 0, 0]);
    assert_eq!(save.slot(0).unwrap().horse.state, 3);

    // No byte outside the state field changed (checksums not yet refreshed)
    let changed: Vec<usize> = save
        .raw()
        .iter()
        .zip(before.iter())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(changed, vec![state_abs]);

    // Checksum refresh updates only the slot prefix and common prefix
    save.recalculate_checksums();
    assert_eq!(save.verify_checksums(), vec![(0, true)]);
}

// =============================================================================
// SCENARIO 2: WEATHER
// =============================================================================

#[test]
fn test_scenario_weather_sync() {
    let mut slot = healthy_slot();
    slot.map_id = er_save_toolkit::save::slot::world::MapId([0x00, 0x24, 0x2A, 0x3C]);
    slot.world_area_weather.area_id = 0;
    let mut save = save_with_slot(1, slot);

    let weather_rel = save.slot(1).unwrap().offsets.weather;
    let area_abs = save.slot_data_offset(1) + weather_rel;

    let (applied, _) = save.fix_character(1).unwrap();
    assert!(applied);
    assert_eq!(save.raw()[area_abs], 0x3C);
    assert_eq!(save.slot(1).unwrap().world_area_weather.area_id, 0x3C);
    // The rest of the weather record is untouched
    assert_eq!(save.slot(1).unwrap().world_area_weather.timer, 250);
}

// =============================================================================
// SCENARIO 3: TIME
// =============================================================================

#[test]
fn test_scenario_time_fix() {
    let mut slot = healthy_slot();
    slot.world_area_time = er_save_toolkit::save::slot::world::WorldAreaTime {
        hour: 0,
        minute: 0,
        second: 0,
    };
    let mut save = save_with_slot(2, slot);

    let time_rel = save.slot(2).unwrap().offsets.time;
    let time_abs = save.slot_data_offset(2) + time_rel;

    let (applied, _) = save.fix_character(2).unwrap();
    assert!(applied);
    // 7384 seconds = 2h 3m 4s
    assert_eq!(&save.raw()[time_abs..time_abs + 3], &[0x02, 0x03, 0x04]);
}

// =============================================================================
// SCENARIO 4: STEAM ID
// =============================================================================

#[test]
fn test_scenario_steam_id_patch() {
    let mut slot = healthy_slot();
    slot.steam_id = 0;
    let mut save = save_with_slot(0, slot);

    let rel = save.slot(0).unwrap().offsets.steam_id;
    let abs = save.slot_data_offset(0) + rel;

    let (applied, _) = save.fix_character(0).unwrap();
    assert!(applied);
    assert_eq!(&save.raw()[abs..abs + 8], &76561198012345678u64.to_le_bytes());
    assert_eq!(save.slot(0).unwrap().steam_id, STEAM_ID);
}

#[test]
fn test_steam_id_mismatch_is_resynced() {
    let mut slot = healthy_slot();
    slot.steam_id = 1234;
    let mut save = save_with_slot(0, slot);
    assert!(SteamIdFix.detect(&save, 0));
    let result = SteamIdFix.apply(&mut save, 0);
    assert!(result.applied);
    assert!(!SteamIdFix.detect(&save, 0));
}

// =============================================================================
// SCENARIO 5: TELEPORT
// =============================================================================

#[test]
fn test_scenario_teleport_to_limgrave() {
    let mut slot = healthy_slot();
    slot.map_id = er_save_toolkit::save::slot::world::MapId([0x00, 0x32, 0x5A, 0x78]);
    slot.world_area_weather.area_id = 0x78;
    let mut save = save_with_slot(3, slot);
    assert!(save.slot(3).unwrap().map_id.is_dlc());

    let limgrave = TeleportLocation::by_name("limgrave").unwrap();
    let result = TeleportFix::new(limgrave).apply(&mut save, 3);
    assert!(result.applied);

    let map_abs = save.slot_data_offset(3) + 4;
    assert_eq!(&save.raw()[map_abs..map_abs + 4], &[0x00, 0x24, 0x2A, 0x3C]);

    // Reload from the written image: DLC-ness is gone
    save.recalculate_checksums();
    let reloaded = Save::from_bytes(save.raw().to_vec()).unwrap();
    assert!(!reloaded.slot(3).unwrap().map_id.is_dlc());
}

#[test]
fn test_dlc_escape_composes_teleport_and_flag_clear() {
    let mut slot = healthy_slot();
    slot.map_id = er_save_toolkit::save::slot::world::MapId([0x00, 0x32, 0x5A, 0x78]);
    slot.world_area_weather.area_id = 0x78;
    let mut dlc_bytes = [0u8; 50];
    dlc_bytes[0] = 1; // entered-DLC flag
    slot.dlc = er_save_toolkit::save::slot::world::Dlc::from_bytes(dlc_bytes);
    let mut save = save_with_slot(0, slot);

    assert!(DlcEscapeFix.detect(&save, 0));
    let result = DlcEscapeFix.apply(&mut save, 0);
    assert!(result.applied);
    assert!(!save.slot(0).unwrap().map_id.is_dlc());
    assert_eq!(save.slot(0).unwrap().dlc.entered_flag(), 0);
    assert!(!DlcEscapeFix.detect(&save, 0));
}

// =============================================================================
// SCENARIO 6: EVENT FLAGS
// =============================================================================

/// Byte positions a flag id touches, recomputed from the shipped table.
fn flag_byte_position(event_id: u32) -> usize {
    let table = std::fs::read_to_string("resources/eventflag_bst.txt").unwrap();
    let block = event_id / FLAG_DIVISOR;
    let offset: usize = table
        .lines()
        .find_map(|line| {
            let mut parts = line.split(',');
            let b: u32 = parts.next()?.parse().ok()?;
            let o: u32 = parts.next()?.parse().ok()?;
            (b == block).then_some(o as usize)
        })
        .expect("block present in shipped table");
    offset * BLOCK_SIZE + (event_id % FLAG_DIVISOR) as usize / 8
}

#[test]
fn test_scenario_ranni_softlock_fix() {
    let mut slot = healthy_slot();
    event_flags::set_flag(&mut slot.event_flags, RANNI_BLOCKING_FLAG, true).unwrap();
    let bitmap_before = slot.event_flags.clone();
    let mut save = save_with_slot(0, slot);

    let (applied, _) = save.fix_character(0).unwrap();
    assert!(applied);

    assert!(!save.get_event_flag(0, RANNI_BLOCKING_FLAG).unwrap());
    for id in RANNI_FLAGS_TO_ENABLE {
        assert!(save.get_event_flag(0, id).unwrap(), "flag {id} not set");
    }

    // Every changed byte belongs to one of the 32 edited flags
    let mut allowed: HashSet<usize> = HashSet::new();
    allowed.insert(flag_byte_position(RANNI_BLOCKING_FLAG));
    for id in RANNI_FLAGS_TO_ENABLE {
        allowed.insert(flag_byte_position(id));
    }
    let bitmap_after = &save.slot(0).unwrap().event_flags;
    for (i, (a, b)) in bitmap_after.iter().zip(bitmap_before.iter()).enumerate() {
        if a != b {
            assert!(allowed.contains(&i), "unexpected byte {i} changed");
        }
    }
}

#[test]
fn test_warp_sickness_rules() {
    // Radahn alive: 310 set, 9130 clear -> clear 310 and 9417
    let mut bitmap = vec![0u8; event_flags::EVENT_FLAGS_SIZE];
    event_flags::set_flag(&mut bitmap, METEORITE_GREEN, true).unwrap();
    event_flags::set_flag(&mut bitmap, RADAHN_MAP_MARKER, true).unwrap();
    let mut slot = healthy_slot();
    slot.event_flags = bitmap;
    let mut save = save_with_slot(0, slot);

    let (applied, _) = save.fix_character(0).unwrap();
    assert!(applied);
    assert!(!save.get_event_flag(0, METEORITE_GREEN).unwrap());
    assert!(!save.get_event_flag(0, RADAHN_MAP_MARKER).unwrap());

    // Radahn dead without a grace -> grant the grace
    let mut bitmap = vec![0u8; event_flags::EVENT_FLAGS_SIZE];
    event_flags::set_flag(&mut bitmap, METEORITE_GREEN, true).unwrap();
    event_flags::set_flag(&mut bitmap, DEFEATED_RADAHN, true).unwrap();
    let issues = detect_issues(&bitmap);
    assert_eq!(issues.len(), 1);
    let mut slot = healthy_slot();
    slot.event_flags = bitmap;
    let mut save = save_with_slot(0, slot);
    save.fix_character(0).unwrap();
    assert!(save.get_event_flag(0, GRACE_RADAHN).unwrap());

    // Morgott
    let mut bitmap = vec![0u8; event_flags::EVENT_FLAGS_SIZE];
    event_flags::set_flag(&mut bitmap, MORGOTT_DEFEATED, true).unwrap();
    let mut slot = healthy_slot();
    slot.event_flags = bitmap;
    let mut save = save_with_slot(0, slot);
    save.fix_character(0).unwrap();
    assert!(save.get_event_flag(0, MORGOTT_THORNS_TOUCHED).unwrap());
    assert!(save.get_event_flag(0, MORGOTT_FOG_WALL).unwrap());

    // Radagon
    let mut bitmap = vec![0u8; event_flags::EVENT_FLAGS_SIZE];
    event_flags::set_flag(&mut bitmap, DEFEATED_RADAGON, true).unwrap();
    let mut slot = healthy_slot();
    slot.event_flags = bitmap;
    let mut save = save_with_slot(0, slot);
    save.fix_character(0).unwrap();
    assert!(save.get_event_flag(0, GRACE_FRACTURED_MARIKA).unwrap());

    // Sealing Tree
    let mut bitmap = vec![0u8; event_flags::EVENT_FLAGS_SIZE];
    event_flags::set_flag(&mut bitmap, SPIRIT_TREE_BURNING, true).unwrap();
    let mut slot = healthy_slot();
    slot.event_flags = bitmap;
    let mut save = save_with_slot(0, slot);
    save.fix_character(0).unwrap();
    assert!(save.get_event_flag(0, GRACE_ENIR_ILIM_OUTER_WALL).unwrap());
    assert!(save.get_event_flag(0, SEALING_TREE_RESTED_AFTER).unwrap());
}

// =============================================================================
// DETECTOR SOUNDNESS
// =============================================================================

#[test]
fn test_every_detector_clears_after_apply() {
    // Break every invariant at once
    let mut slot = healthy_slot();
    slot.horse.hp = 0;
    slot.horse.state = 13;
    slot.steam_id = 0;
    slot.world_area_time.hour = 9;
    slot.world_area_weather.area_id = 0;
    slot.world_area_weather.timer = 2_000_000;
    event_flags::set_flag(&mut slot.event_flags, RANNI_BLOCKING_FLAG, true).unwrap();
    let mut dlc_bytes = [0u8; 50];
    dlc_bytes[0] = 1;
    dlc_bytes[20] = 0xEE;
    slot.dlc = er_save_toolkit::save::slot::world::Dlc::from_bytes(dlc_bytes);
    let mut save = save_with_slot(0, slot);

    for fix in all_fixes() {
        assert!(fix.detect(&save, 0), "{} should trigger", fix.name());
    }

    let (applied, descriptions) = save.fix_character(0).unwrap();
    assert!(applied);
    assert_eq!(descriptions.len(), 7, "all seven rules applied: {descriptions:?}");

    for fix in all_fixes() {
        assert!(!fix.detect(&save, 0), "{} still triggers after apply", fix.name());
    }
}

#[test]
fn test_healthy_slot_triggers_nothing() {
    let save = save_with_slot(0, healthy_slot());
    for fix in all_fixes() {
        assert!(!fix.detect(&save, 0), "{} false positive", fix.name());
    }
}

#[test]
fn test_empty_slot_boundary() {
    let image = build_pc_image(&[], &healthy_common());
    let mut save = Save::from_bytes(image).unwrap();

    for fix in all_fixes() {
        assert!(!fix.detect(&save, 5));
    }
    let (applied, descriptions) = save.fix_character(5).unwrap();
    assert!(!applied);
    assert!(descriptions.is_empty());
}

#[test]
fn test_individual_rules_skip_when_healthy() {
    let mut save = save_with_slot(0, healthy_slot());
    assert!(!TorrentFix.apply(&mut save, 0).applied);
    assert!(!SteamIdFix.apply(&mut save, 0).applied);
    assert!(!TimeFix.apply(&mut save, 0).applied);
    assert!(!WeatherFix.apply(&mut save, 0).applied);
}
