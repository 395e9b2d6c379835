//! Character slot codec
//!
//! Reads every field of a slot payload sequentially, in wire order,
//! recording the relative offset of each mutable substructure before it
//! is decoded. Those offsets are the only writeback mechanism: a mutation
//! re-encodes just its substructure and overwrites the recorded range in
//! the raw image. The slot is never re-serialized wholesale on the save
//! path.

pub mod equipment;
pub mod player;
pub mod world;

use tracing::warn;

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::Result;

use equipment::{
    AcquiredProjectiles, ActiveWeaponSlotsAndArmStyle, EquippedArmamentsAndItems,
    EquippedGestures, EquippedItems, EquippedItemsEquipIndex, EquippedItemsGaitemHandles,
    EquippedItemsItemIds, EquippedPhysics, EquippedSpells, GaitemMap, Inventory,
    GAITEM_COUNT_LATEST, GAITEM_COUNT_V81, HELD_COMMON_CAPACITY, HELD_KEY_CAPACITY,
    STORAGE_COMMON_CAPACITY, STORAGE_KEY_CAPACITY,
};
use player::{PlayerGameData, SpEffect};
use world::{
    BloodStain, Dlc, FaceData, FieldArea, GaitemGameData, Gestures, MapId, MenuSaveLoad, NetMan,
    PlayerCoordinates, PlayerGameDataHash, Ps5Activity, Regions, RendMan, RideGameData,
    TrophyEquipData, TutorialData, WorldArea, WorldAreaTime, WorldAreaWeather, WorldGeomMan,
};

/// Size of the event-flag bitmap inside a slot.
pub const EVENT_FLAGS_SIZE: usize = 0x1BF99F;

/// Payload offset of the gaitem table: version, map id and the two
/// header pads precede it.
pub const GAITEM_MAP_OFFSET: usize = 32;

/// Slot versions above this use the larger gaitem table.
pub const VERSION_GAITEM_CUTOVER: u32 = 81;
/// First version carrying `temp_spawn_point_entity_id`.
pub const VERSION_TEMP_SPAWN: u32 = 65;
/// First version carrying `game_man_0xcb3`.
pub const VERSION_GAME_MAN_0XCB3: u32 = 66;

// =============================================================================
// OFFSET MAP
// =============================================================================

/// Relative offset (from the start of the slot payload) of every mutable
/// substructure, recorded during parsing. Zero means "not recorded"
/// (empty slot).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotOffsets {
    pub player: usize,
    pub sp_effects: usize,
    pub equip_index: usize,
    pub inventory_held: usize,
    pub spells: usize,
    pub equipped_items: usize,
    pub face_data: usize,
    pub inventory_storage: usize,
    pub gestures: usize,
    pub horse: usize,
    pub event_flags: usize,
    pub coordinates: usize,
    pub weather: usize,
    pub time: usize,
    pub steam_id: usize,
    pub dlc: usize,
}

// =============================================================================
// SLOT
// =============================================================================

/// A parsed character slot (`UserDataX`).
///
/// `version == 0` marks an empty slot; all other fields are then
/// defaults and must not be written back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slot {
    pub version: u32,
    pub map_id: MapId,
    pub unk0x8: [u8; 8],
    pub unk0x10: [u8; 16],
    pub gaitem_map: GaitemMap,
    pub player: PlayerGameData,
    pub sp_effects: Vec<SpEffect>,
    pub equipped_items_equip_index: EquippedItemsEquipIndex,
    pub active_weapon_slots_and_arm_style: ActiveWeaponSlotsAndArmStyle,
    pub equipped_items_item_id: EquippedItemsItemIds,
    pub equipped_items_gaitem_handle: EquippedItemsGaitemHandles,
    pub inventory_held: Inventory,
    pub equipped_spells: EquippedSpells,
    pub equipped_items: EquippedItems,
    pub equipped_gestures: EquippedGestures,
    pub acquired_projectiles: AcquiredProjectiles,
    pub equipped_armaments_and_items: EquippedArmamentsAndItems,
    pub equipped_physics: EquippedPhysics,
    pub face_data: FaceData,
    pub inventory_storage_box: Inventory,
    pub gestures: Gestures,
    pub unlocked_regions: Regions,
    pub horse: RideGameData,
    pub control_byte: u8,
    pub blood_stain: BloodStain,
    pub unk_gamedataman_0x120: u32,
    pub unk_gamedataman_0x88: u32,
    pub menu_profile_save_load: MenuSaveLoad,
    pub trophy_equip_data: TrophyEquipData,
    pub gaitem_game_data: GaitemGameData,
    pub tutorial_data: TutorialData,
    pub gameman_0x8c: u8,
    pub gameman_0x8d: u8,
    pub gameman_0x8e: u8,
    pub total_deaths_count: u32,
    pub character_type: i32,
    pub in_online_session_flag: u8,
    pub character_type_online: u32,
    pub last_rested_grace: u32,
    pub not_alone_flag: u8,
    pub in_game_countdown_timer: u32,
    pub unk_gamedataman_0x124: u32,
    pub event_flags: Vec<u8>,
    pub event_flags_terminator: u8,
    pub event_flags_trailer: [u8; 16],
    pub field_area: FieldArea,
    pub world_area: WorldArea,
    pub world_geom_man: WorldGeomMan,
    pub world_geom_man2: WorldGeomMan,
    pub rend_man: RendMan,
    pub player_coordinates: PlayerCoordinates,
    pub unk_coord_pad: [u8; 2],
    pub spawn_point_entity_id: u32,
    pub game_man_0xb64: u32,
    /// Present for version >= 65.
    pub temp_spawn_point_entity_id: Option<u32>,
    /// Present for version >= 66.
    pub game_man_0xcb3: Option<u8>,
    pub net_man: NetMan,
    pub world_area_weather: WorldAreaWeather,
    pub world_area_time: WorldAreaTime,
    pub base_version: u32,
    pub steam_id: u64,
    pub ps5_activity: Ps5Activity,
    pub dlc: Dlc,
    pub player_data_hash: PlayerGameDataHash,
    /// Unrecognized trailing bytes up to the payload boundary.
    /// Preserved verbatim, never mutated.
    pub rest: Vec<u8>,

    pub offsets: SlotOffsets,
}

impl Slot {
    /// Number of gaitem entries for a given slot version.
    pub fn gaitem_count(version: u32) -> usize {
        if version > VERSION_GAITEM_CUTOVER {
            GAITEM_COUNT_LATEST
        } else {
            GAITEM_COUNT_V81
        }
    }

    pub fn is_empty(&self) -> bool {
        self.version == 0
    }

    pub fn character_name(&self) -> &str {
        &self.player.character_name
    }

    pub fn level(&self) -> u32 {
        self.player.level
    }

    /// Sequentially decode a slot payload. The cursor must sit at the
    /// first payload byte; exactly `payload_size` bytes are consumed.
    pub fn read(cur: &mut SaveCursor<'_>, payload_size: usize) -> Result<Self> {
        let data_start = cur.position();
        let mut slot = Self {
            version: cur.read_u32()?,
            ..Self::default()
        };

        // Empty slot: the remaining payload is padding
        if slot.version == 0 {
            cur.skip(payload_size - 4)?;
            return Ok(slot);
        }

        let rel = |cur: &SaveCursor<'_>| cur.position() - data_start;

        slot.map_id = MapId::read(cur)?;
        slot.unk0x8 = cur.read_array::<8>()?;
        slot.unk0x10 = cur.read_array::<16>()?;

        slot.gaitem_map = GaitemMap::read(cur, Self::gaitem_count(slot.version))?;

        slot.offsets.player = rel(cur);
        slot.player = PlayerGameData::read(cur)?;

        slot.offsets.sp_effects = rel(cur);
        slot.sp_effects = (0..SpEffect::COUNT)
            .map(|_| SpEffect::read(cur))
            .collect::<Result<_>>()?;

        slot.offsets.equip_index = rel(cur);
        slot.equipped_items_equip_index = EquippedItemsEquipIndex::read(cur)?;
        slot.active_weapon_slots_and_arm_style = ActiveWeaponSlotsAndArmStyle::read(cur)?;
        slot.equipped_items_item_id = EquippedItemsItemIds::read(cur)?;
        slot.equipped_items_gaitem_handle = EquippedItemsGaitemHandles::read(cur)?;

        slot.offsets.inventory_held = rel(cur);
        slot.inventory_held = Inventory::read(cur, HELD_COMMON_CAPACITY, HELD_KEY_CAPACITY)?;

        slot.offsets.spells = rel(cur);
        slot.equipped_spells = EquippedSpells::read(cur)?;
        slot.offsets.equipped_items = rel(cur);
        slot.equipped_items = EquippedItems::read(cur)?;
        slot.equipped_gestures = EquippedGestures::read(cur)?;
        slot.acquired_projectiles = AcquiredProjectiles::read(cur)?;
        slot.equipped_armaments_and_items = EquippedArmamentsAndItems::read(cur)?;
        slot.equipped_physics = EquippedPhysics::read(cur)?;

        slot.offsets.face_data = rel(cur);
        slot.face_data = FaceData::read(cur)?;

        slot.offsets.inventory_storage = rel(cur);
        slot.inventory_storage_box =
            Inventory::read(cur, STORAGE_COMMON_CAPACITY, STORAGE_KEY_CAPACITY)?;

        slot.offsets.gestures = rel(cur);
        slot.gestures = Gestures::read(cur)?;
        slot.unlocked_regions = Regions::read(cur)?;

        slot.offsets.horse = rel(cur);
        slot.horse = RideGameData::read(cur)?;

        slot.control_byte = cur.read_u8()?;
        slot.blood_stain = BloodStain::read(cur)?;
        slot.unk_gamedataman_0x120 = cur.read_u32()?;
        slot.unk_gamedataman_0x88 = cur.read_u32()?;

        slot.menu_profile_save_load = MenuSaveLoad::read(cur)?;
        slot.trophy_equip_data = TrophyEquipData::read(cur)?;
        slot.gaitem_game_data = GaitemGameData::read(cur)?;
        slot.tutorial_data = TutorialData::read(cur)?;

        slot.gameman_0x8c = cur.read_u8()?;
        slot.gameman_0x8d = cur.read_u8()?;
        slot.gameman_0x8e = cur.read_u8()?;

        slot.total_deaths_count = cur.read_u32()?;
        slot.character_type = cur.read_i32()?;
        slot.in_online_session_flag = cur.read_u8()?;
        slot.character_type_online = cur.read_u32()?;
        slot.last_rested_grace = cur.read_u32()?;
        slot.not_alone_flag = cur.read_u8()?;
        slot.in_game_countdown_timer = cur.read_u32()?;
        slot.unk_gamedataman_0x124 = cur.read_u32()?;

        slot.offsets.event_flags = rel(cur);
        slot.event_flags = cur.read_bytes(EVENT_FLAGS_SIZE)?;
        slot.event_flags_terminator = cur.read_u8()?;
        slot.event_flags_trailer = cur.read_array::<16>()?;

        slot.field_area = FieldArea::read(cur)?;
        slot.world_area = WorldArea::read(cur)?;
        slot.world_geom_man = WorldGeomMan::read(cur)?;
        slot.world_geom_man2 = WorldGeomMan::read(cur)?;
        slot.rend_man = RendMan::read(cur)?;

        slot.offsets.coordinates = rel(cur);
        slot.player_coordinates = PlayerCoordinates::read(cur)?;
        slot.unk_coord_pad = cur.read_array::<2>()?;
        slot.spawn_point_entity_id = cur.read_u32()?;
        slot.game_man_0xb64 = cur.read_u32()?;

        if slot.version >= VERSION_TEMP_SPAWN {
            slot.temp_spawn_point_entity_id = Some(cur.read_u32()?);
        }
        if slot.version >= VERSION_GAME_MAN_0XCB3 {
            slot.game_man_0xcb3 = Some(cur.read_u8()?);
        }

        slot.net_man = NetMan::read(cur)?;

        slot.offsets.weather = rel(cur);
        slot.world_area_weather = WorldAreaWeather::read(cur)?;
        slot.offsets.time = rel(cur);
        slot.world_area_time = WorldAreaTime::read(cur)?;
        slot.base_version = cur.read_u32()?;
        slot.offsets.steam_id = rel(cur);
        slot.steam_id = cur.read_u64()?;
        slot.ps5_activity = Ps5Activity::read(cur)?;
        slot.offsets.dlc = rel(cur);
        slot.dlc = Dlc::read(cur)?;
        slot.player_data_hash = PlayerGameDataHash::read(cur)?;

        // Absorb whatever the codec does not recognize so the next slot
        // starts exactly at the boundary
        let consumed = cur.position() - data_start;
        if consumed < payload_size {
            slot.rest = cur.read_bytes(payload_size - consumed)?;
        } else if consumed > payload_size {
            warn!(
                consumed,
                payload_size, "slot codec overran the payload boundary"
            );
            cur.seek_to(data_start + payload_size);
        }

        Ok(slot)
    }

    /// Encode the whole slot in wire order. Only used to build images
    /// (tests, slot duplication); mutation goes through the offset map.
    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.version);
        if self.version == 0 {
            return;
        }
        self.map_id.write(w);
        w.write_bytes(&self.unk0x8);
        w.write_bytes(&self.unk0x10);
        self.gaitem_map.write(w);
        self.player.write(w);
        for effect in &self.sp_effects {
            effect.write(w);
        }
        self.equipped_items_equip_index.write(w);
        self.active_weapon_slots_and_arm_style.write(w);
        self.equipped_items_item_id.write(w);
        self.equipped_items_gaitem_handle.write(w);
        self.inventory_held.write(w);
        self.equipped_spells.write(w);
        self.equipped_items.write(w);
        self.equipped_gestures.write(w);
        self.acquired_projectiles.write(w);
        self.equipped_armaments_and_items.write(w);
        self.equipped_physics.write(w);
        self.face_data.write(w);
        self.inventory_storage_box.write(w);
        self.gestures.write(w);
        self.unlocked_regions.write(w);
        self.horse.write(w);
        w.write_u8(self.control_byte);
        self.blood_stain.write(w);
        w.write_u32(self.unk_gamedataman_0x120);
        w.write_u32(self.unk_gamedataman_0x88);
        self.menu_profile_save_load.write(w);
        self.trophy_equip_data.write(w);
        self.gaitem_game_data.write(w);
        self.tutorial_data.write(w);
        w.write_u8(self.gameman_0x8c);
        w.write_u8(self.gameman_0x8d);
        w.write_u8(self.gameman_0x8e);
        w.write_u32(self.total_deaths_count);
        w.write_i32(self.character_type);
        w.write_u8(self.in_online_session_flag);
        w.write_u32(self.character_type_online);
        w.write_u32(self.last_rested_grace);
        w.write_u8(self.not_alone_flag);
        w.write_u32(self.in_game_countdown_timer);
        w.write_u32(self.unk_gamedataman_0x124);
        w.write_bytes(&self.event_flags);
        w.write_u8(self.event_flags_terminator);
        w.write_bytes(&self.event_flags_trailer);
        self.field_area.write(w);
        self.world_area.write(w);
        self.world_geom_man.write(w);
        self.world_geom_man2.write(w);
        self.rend_man.write(w);
        self.player_coordinates.write(w);
        w.write_bytes(&self.unk_coord_pad);
        w.write_u32(self.spawn_point_entity_id);
        w.write_u32(self.game_man_0xb64);
        if let Some(id) = self.temp_spawn_point_entity_id {
            w.write_u32(id);
        }
        if let Some(b) = self.game_man_0xcb3 {
            w.write_u8(b);
        }
        self.net_man.write(w);
        self.world_area_weather.write(w);
        self.world_area_time.write(w);
        w.write_u32(self.base_version);
        w.write_u64(self.steam_id);
        self.ps5_activity.write(w);
        self.dlc.write(w);
        self.player_data_hash.write(w);
        w.write_bytes(&self.rest);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use equipment::Gaitem;

    /// Minimal populated slot for codec tests.
    fn sample_slot(version: u32) -> Slot {
        let mut slot = Slot {
            version,
            map_id: MapId([0, 36, 42, 60]),
            inventory_held: Inventory::new(HELD_COMMON_CAPACITY, HELD_KEY_CAPACITY),
            inventory_storage_box: Inventory::new(STORAGE_COMMON_CAPACITY, STORAGE_KEY_CAPACITY),
            sp_effects: vec![SpEffect::default(); SpEffect::COUNT],
            event_flags: vec![0u8; EVENT_FLAGS_SIZE],
            horse: RideGameData { hp: 500, state: 13 },
            steam_id: 76561198012345678,
            base_version: version,
            ..Slot::default()
        };
        slot.player.character_name = "Tarnished".into();
        slot.player.level = 42;
        slot.gaitem_map.entries =
            vec![Gaitem::default(); Slot::gaitem_count(version)];
        if version >= VERSION_TEMP_SPAWN {
            slot.temp_spawn_point_entity_id = Some(0);
        }
        if version >= VERSION_GAME_MAN_0XCB3 {
            slot.game_man_0xcb3 = Some(0);
        }
        slot
    }

    fn payload_for(slot: &Slot, payload_size: usize) -> Vec<u8> {
        let mut w = SaveWriter::with_capacity(payload_size);
        slot.write(&mut w);
        let mut bytes = w.into_bytes();
        assert!(bytes.len() <= payload_size, "slot overflows payload");
        bytes.resize(payload_size, 0);
        bytes
    }

    const PAYLOAD: usize = 0x280000;

    #[test]
    fn test_slot_roundtrip_latest_version() {
        let slot = sample_slot(82);
        let payload = payload_for(&slot, PAYLOAD);

        let mut cur = SaveCursor::new(&payload);
        let parsed = Slot::read(&mut cur, PAYLOAD).unwrap();
        assert_eq!(cur.position(), PAYLOAD);

        assert_eq!(parsed.version, 82);
        assert_eq!(parsed.character_name(), "Tarnished");
        assert_eq!(parsed.level(), 42);
        assert_eq!(parsed.gaitem_map.entries.len(), GAITEM_COUNT_LATEST);
        assert_eq!(parsed.steam_id, 76561198012345678);
        assert!(parsed.temp_spawn_point_entity_id.is_some());
        assert!(parsed.game_man_0xcb3.is_some());

        // Second generation is a fixed point
        let payload2 = payload_for(&parsed, PAYLOAD);
        assert_eq!(payload, payload2);
    }

    #[test]
    fn test_slot_old_version_has_smaller_gaitem_map() {
        let slot = sample_slot(60);
        let payload = payload_for(&slot, PAYLOAD);
        let mut cur = SaveCursor::new(&payload);
        let parsed = Slot::read(&mut cur, PAYLOAD).unwrap();
        assert_eq!(parsed.gaitem_map.entries.len(), GAITEM_COUNT_V81);
        assert_eq!(parsed.temp_spawn_point_entity_id, None);
        assert_eq!(parsed.game_man_0xcb3, None);
    }

    #[test]
    fn test_slot_version_66_carries_both_optionals() {
        let slot = sample_slot(66);
        let payload = payload_for(&slot, PAYLOAD);
        let mut cur = SaveCursor::new(&payload);
        let parsed = Slot::read(&mut cur, PAYLOAD).unwrap();
        assert_eq!(parsed.gaitem_map.entries.len(), GAITEM_COUNT_V81);
        assert!(parsed.temp_spawn_point_entity_id.is_some());
        assert!(parsed.game_man_0xcb3.is_some());
    }

    #[test]
    fn test_empty_slot_consumes_payload() {
        let payload = vec![0u8; PAYLOAD];
        let mut cur = SaveCursor::new(&payload);
        let parsed = Slot::read(&mut cur, PAYLOAD).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(cur.position(), PAYLOAD);
    }

    #[test]
    fn test_offsets_are_recorded_before_each_substructure() {
        let slot = sample_slot(82);
        let payload = payload_for(&slot, PAYLOAD);
        let mut cur = SaveCursor::new(&payload);
        let parsed = Slot::read(&mut cur, PAYLOAD).unwrap();
        let off = parsed.offsets;

        // Header is 32 bytes, the gaitem table follows
        let gaitem_size = parsed.gaitem_map.serialized_size();
        assert_eq!(off.player, 32 + gaitem_size);
        assert_eq!(off.sp_effects, off.player + PlayerGameData::SIZE);

        // The horse state field sits 4 bytes into RideGameData
        let state_bytes = &payload[off.horse + 4..off.horse + 8];
        assert_eq!(state_bytes, &13u32.to_le_bytes());

        // Steam id bytes at the recorded offset
        let sid = &payload[off.steam_id..off.steam_id + 8];
        assert_eq!(sid, &76561198012345678u64.to_le_bytes());

        // Event flags land where recorded
        assert_ne!(off.event_flags, 0);
        assert_ne!(off.dlc, 0);
        assert!(off.dlc > off.steam_id);
    }

    #[test]
    fn test_truncated_slot_fails() {
        let slot = sample_slot(82);
        let payload = payload_for(&slot, PAYLOAD);
        // Cut inside the event-flag bitmap
        let cut = &payload[..0x100000];
        let mut cur = SaveCursor::new(cut);
        assert!(Slot::read(&mut cur, PAYLOAD).is_err());
    }
}
