//! Player record and status effects
//!
//! `PlayerGameData` is the 432-byte character sheet: name, level, the
//! eight attributes, resource maxima, runes, archetype and flask counts.
//! Interleaved runs whose meaning is unknown are kept as opaque bytes.

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::{Result, SaveError};

/// Byte capacity of the character name field: 16 UTF-16 code units
/// plus the NUL terminator.
pub const NAME_CAPACITY: usize = 0x22;

// =============================================================================
// PLAYER GAME DATA
// =============================================================================

/// The character sheet. Serializes to exactly [`PlayerGameData::SIZE`]
/// bytes; the encoder verifies this before any writeback.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerGameData {
    pub unk0x0: u32,
    pub unk0x4: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub base_max_hp: u32,
    pub fp: u32,
    pub max_fp: u32,
    pub base_max_fp: u32,
    pub unk0x20: u32,
    pub sp: u32,
    pub max_sp: u32,
    pub base_max_sp: u32,
    pub unk0x30: u32,
    pub level: u32,
    pub vigor: u32,
    pub mind: u32,
    pub endurance: u32,
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
    pub faith: u32,
    pub arcane: u32,
    pub unk0x58: [u8; 12],
    pub runes: u32,
    pub runes_memory: u32,
    pub unk0x6c: u32,
    pub character_name: String,
    pub unk0x92: [u8; 2],
    pub gender: u8,
    pub archetype: u8,
    pub unk0x96: u8,
    pub voice_type: u8,
    pub gift: u8,
    pub unk0x99: [u8; 7],
    pub additional_talisman_slots: u8,
    pub summon_spirit_level: u8,
    pub unk0xa2: [u8; 24],
    pub max_crimson_flasks: u8,
    pub max_cerulean_flasks: u8,
    pub unk0xbc: [u8; 244],
}

impl Default for PlayerGameData {
    fn default() -> Self {
        Self {
            unk0x0: 0,
            unk0x4: 0,
            hp: 0,
            max_hp: 0,
            base_max_hp: 0,
            fp: 0,
            max_fp: 0,
            base_max_fp: 0,
            unk0x20: 0,
            sp: 0,
            max_sp: 0,
            base_max_sp: 0,
            unk0x30: 0,
            level: 0,
            vigor: 0,
            mind: 0,
            endurance: 0,
            strength: 0,
            dexterity: 0,
            intelligence: 0,
            faith: 0,
            arcane: 0,
            unk0x58: [0; 12],
            runes: 0,
            runes_memory: 0,
            unk0x6c: 0,
            character_name: String::new(),
            unk0x92: [0; 2],
            gender: 0,
            archetype: 0,
            unk0x96: 0,
            voice_type: 0,
            gift: 0,
            unk0x99: [0; 7],
            additional_talisman_slots: 0,
            summon_spirit_level: 0,
            unk0xa2: [0; 24],
            max_crimson_flasks: 0,
            max_cerulean_flasks: 0,
            unk0xbc: [0; 244],
        }
    }
}

impl PlayerGameData {
    /// Declared wire size. 0x1B0 bytes.
    pub const SIZE: usize = 0x1B0;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            unk0x0: cur.read_u32()?,
            unk0x4: cur.read_u32()?,
            hp: cur.read_u32()?,
            max_hp: cur.read_u32()?,
            base_max_hp: cur.read_u32()?,
            fp: cur.read_u32()?,
            max_fp: cur.read_u32()?,
            base_max_fp: cur.read_u32()?,
            unk0x20: cur.read_u32()?,
            sp: cur.read_u32()?,
            max_sp: cur.read_u32()?,
            base_max_sp: cur.read_u32()?,
            unk0x30: cur.read_u32()?,
            level: cur.read_u32()?,
            vigor: cur.read_u32()?,
            mind: cur.read_u32()?,
            endurance: cur.read_u32()?,
            strength: cur.read_u32()?,
            dexterity: cur.read_u32()?,
            intelligence: cur.read_u32()?,
            faith: cur.read_u32()?,
            arcane: cur.read_u32()?,
            unk0x58: cur.read_array::<12>()?,
            runes: cur.read_u32()?,
            runes_memory: cur.read_u32()?,
            unk0x6c: cur.read_u32()?,
            character_name: cur.read_wstring(NAME_CAPACITY)?,
            unk0x92: cur.read_array::<2>()?,
            gender: cur.read_u8()?,
            archetype: cur.read_u8()?,
            unk0x96: cur.read_u8()?,
            voice_type: cur.read_u8()?,
            gift: cur.read_u8()?,
            unk0x99: cur.read_array::<7>()?,
            additional_talisman_slots: cur.read_u8()?,
            summon_spirit_level: cur.read_u8()?,
            unk0xa2: cur.read_array::<24>()?,
            max_crimson_flasks: cur.read_u8()?,
            max_cerulean_flasks: cur.read_u8()?,
            unk0xbc: cur.read_array::<244>()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.unk0x0);
        w.write_u32(self.unk0x4);
        w.write_u32(self.hp);
        w.write_u32(self.max_hp);
        w.write_u32(self.base_max_hp);
        w.write_u32(self.fp);
        w.write_u32(self.max_fp);
        w.write_u32(self.base_max_fp);
        w.write_u32(self.unk0x20);
        w.write_u32(self.sp);
        w.write_u32(self.max_sp);
        w.write_u32(self.base_max_sp);
        w.write_u32(self.unk0x30);
        w.write_u32(self.level);
        w.write_u32(self.vigor);
        w.write_u32(self.mind);
        w.write_u32(self.endurance);
        w.write_u32(self.strength);
        w.write_u32(self.dexterity);
        w.write_u32(self.intelligence);
        w.write_u32(self.faith);
        w.write_u32(self.arcane);
        w.write_bytes(&self.unk0x58);
        w.write_u32(self.runes);
        w.write_u32(self.runes_memory);
        w.write_u32(self.unk0x6c);
        w.write_wstring(&self.character_name, NAME_CAPACITY);
        w.write_bytes(&self.unk0x92);
        w.write_u8(self.gender);
        w.write_u8(self.archetype);
        w.write_u8(self.unk0x96);
        w.write_u8(self.voice_type);
        w.write_u8(self.gift);
        w.write_bytes(&self.unk0x99);
        w.write_u8(self.additional_talisman_slots);
        w.write_u8(self.summon_spirit_level);
        w.write_bytes(&self.unk0xa2);
        w.write_u8(self.max_crimson_flasks);
        w.write_u8(self.max_cerulean_flasks);
        w.write_bytes(&self.unk0xbc);
    }

    /// Serialize to a standalone buffer, verifying the declared size.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = SaveWriter::with_capacity(Self::SIZE);
        self.write(&mut w);
        if w.len() != Self::SIZE {
            return Err(SaveError::InternalLayout {
                what: "PlayerGameData",
                got: w.len(),
                expected: Self::SIZE,
            });
        }
        Ok(w.into_bytes())
    }
}

// =============================================================================
// STATUS EFFECTS
// =============================================================================

/// One persistent status-effect entry; a slot carries thirteen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpEffect {
    pub sp_effect_id: u32,
    pub duration: f32,
    pub unk0x8: u32,
    pub unk0xc: u32,
}

impl SpEffect {
    pub const SIZE: usize = 16;
    /// Number of entries in a slot.
    pub const COUNT: usize = 13;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            sp_effect_id: cur.read_u32()?,
            duration: cur.read_f32()?,
            unk0x8: cur.read_u32()?,
            unk0xc: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.sp_effect_id);
        w.write_f32(self.duration);
        w.write_u32(self.unk0x8);
        w.write_u32(self.unk0xc);
    }
}

// =============================================================================
// TESTS
// =============================================================================
