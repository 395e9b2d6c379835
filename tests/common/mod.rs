//! Shared helpers: synthetic save images built through the same wire
//! layout the codec reads, so round-trip laws are exact.
#![allow(dead_code)]

use er_save_toolkit::codec::SaveWriter;
use er_save_toolkit::save::checksum;
use er_save_toolkit::save::common::{ProfileEntry, UserData10, USER_DATA_10_PAYLOAD_SIZE};
use er_save_toolkit::save::container::{
    HEADER_SIZE_PC, HEADER_SIZE_PS, MAGIC_BND4, MAGIC_PS, SLOT_COUNT, SLOT_PAYLOAD_SIZE,
    USER_DATA_11_SIZE,
};
use er_save_toolkit::save::slot::equipment::Inventory;
use er_save_toolkit::save::slot::player::SpEffect;
use er_save_toolkit::save::slot::world::{MapId, RideGameData, WorldAreaTime};
use er_save_toolkit::save::slot::{Slot, EVENT_FLAGS_SIZE};

/// Steam ID used by every healthy fixture.
pub const STEAM_ID: u64 = 76561198012345678;
/// Play time recorded in every profile entry (2h 3m 4s).
pub const PLAYTIME_SECONDS: u32 = 7384;
/// Slot version used by the fixtures (latest layout).
pub const SLOT_VERSION: u32 = 82;

/// A slot that passes every corruption detector.
pub fn healthy_slot() -> Slot {
    let mut slot = Slot {
        version: SLOT_VERSION,
        map_id: MapId([0, 36, 42, 60]),
        sp_effects: vec![SpEffect::default(); SpEffect::COUNT],
        inventory_held: Inventory::new(0xA80, 0x180),
        inventory_storage_box: Inventory::new(0x780, 0x80),
        event_flags: vec![0u8; EVENT_FLAGS_SIZE],
        horse: RideGameData { hp: 500, state: 13 },
        world_area_time: WorldAreaTime {
            hour: 2,
            minute: 3,
            second: 4,
        },
        steam_id: STEAM_ID,
        base_version: SLOT_VERSION,
        temp_spawn_point_entity_id: Some(0),
        game_man_0xcb3: Some(0),
        ..Slot::default()
    };
    slot.player.character_name = "Tarnished".into();
    slot.player.level = 73;
    slot.world_area_weather.area_id = slot.map_id.area();
    slot.world_area_weather.timer = 250;
    slot.gaitem_map.entries = vec![Default::default(); Slot::gaitem_count(SLOT_VERSION)];
    slot
}

/// Common region matching [`healthy_slot`] fixtures.
pub fn healthy_common() -> UserData10 {
    let mut common = UserData10 {
        version: 8,
        steam_id: STEAM_ID,
        ..UserData10::default()
    };
    for (i, profile) in common.profile_summary.profiles.iter_mut().enumerate() {
        *profile = ProfileEntry {
            character_name: format!("Character {}", i + 1),
            level: 73,
            seconds_played: PLAYTIME_SECONDS,
            ..ProfileEntry::default()
        };
    }
    common
}

fn slot_payload(slot: &Slot) -> Vec<u8> {
    let mut w = SaveWriter::with_capacity(SLOT_PAYLOAD_SIZE);
    slot.write(&mut w);
    let mut payload = w.into_bytes();
    assert!(
        payload.len() <= SLOT_PAYLOAD_SIZE,
        "slot fixture overflows the payload"
    );
    payload.resize(SLOT_PAYLOAD_SIZE, 0);
    payload
}

fn common_payload(common: &UserData10) -> Vec<u8> {
    let mut w = SaveWriter::with_capacity(USER_DATA_10_PAYLOAD_SIZE);
    common.write(&mut w);
    let mut payload = w.into_bytes();
    assert!(payload.len() <= USER_DATA_10_PAYLOAD_SIZE);
    payload.resize(USER_DATA_10_PAYLOAD_SIZE, 0);
    payload
}

/// Build a complete PC image. `slots` maps slot index to fixture; every
/// other slot is empty (zero checksum).
pub fn build_pc_image(slots: &[(usize, Slot)], common: &UserData10) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(&MAGIC_BND4);
    raw.extend_from_slice(&vec![0u8; HEADER_SIZE_PC]);

    for slot_index in 0..SLOT_COUNT {
        match slots.iter().find(|(i, _)| *i == slot_index) {
            Some((_, slot)) => {
                let payload = slot_payload(slot);
                raw.extend_from_slice(&checksum::digest(&payload));
                raw.extend_from_slice(&payload);
            }
            None => {
                raw.extend_from_slice(&[0u8; 16]);
                raw.extend_from_slice(&vec![0u8; SLOT_PAYLOAD_SIZE]);
            }
        }
    }

    let payload = common_payload(common);
    raw.extend_from_slice(&checksum::digest(&payload));
    raw.extend_from_slice(&payload);

    // UserData11: checksum prefix plus regulation blob, opaque to the core
    raw.extend_from_slice(&[0u8; 16]);
    raw.extend_from_slice(&vec![0u8; USER_DATA_11_SIZE]);
    raw
}

/// Build a complete PlayStation image (no checksums anywhere).
pub fn build_ps_image(slots: &[(usize, Slot)], common: &UserData10) -> Vec<u8> {
    let mut raw = Vec::new();
    raw.extend_from_slice(&MAGIC_PS);
    raw.extend_from_slice(&vec![0u8; HEADER_SIZE_PS]);

    for slot_index in 0..SLOT_COUNT {
        match slots.iter().find(|(i, _)| *i == slot_index) {
            Some((_, slot)) => raw.extend_from_slice(&slot_payload(slot)),
            None => raw.extend_from_slice(&vec![0u8; SLOT_PAYLOAD_SIZE]),
        }
    }

    raw.extend_from_slice(&common_payload(common));
    raw.extend_from_slice(&vec![0u8; USER_DATA_11_SIZE]);
    raw
}
