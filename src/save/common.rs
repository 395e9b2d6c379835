//! `UserData10` — the common region shared by all character slots
//!
//! Holds the account Steam ID (the reference copy every slot must match),
//! the settings blob, the 15 appearance presets and the profile summary
//! the main menu renders without parsing full slots.

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::Result;
use crate::save::presets::CsMenuSystemSaveLoad;
use crate::save::slot::world::Opaque;

/// Declared payload size of the region (after the PC checksum prefix).
pub const USER_DATA_10_PAYLOAD_SIZE: usize = 0x60000;

/// Relative payload offset of the Steam ID field.
pub const STEAM_ID_OFFSET: usize = 4;
/// Relative payload offset of `CSMenuSystemSaveLoad`:
/// version (4) + steam id (8) + settings (0x140).
pub const MENU_SYSTEM_OFFSET: usize = 4 + 8 + 0x140;
/// Relative payload offset of the profile summary.
pub const PROFILE_SUMMARY_OFFSET: usize =
    MENU_SYSTEM_OFFSET + crate::save::presets::MENU_SYSTEM_SIZE;

pub type Settings = Opaque<0x140>;

// =============================================================================
// PROFILE SUMMARY
// =============================================================================

/// Byte capacity of a profile name (same field shape as the slot name).
pub const PROFILE_NAME_CAPACITY: usize = 0x22;

/// One menu profile line: name, level and total play time.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileEntry {
    pub character_name: String,
    pub unk0x22: [u8; 2],
    pub level: u32,
    pub seconds_played: u32,
    pub unk0x2c: [u8; 68],
}

impl Default for ProfileEntry {
    fn default() -> Self {
        Self {
            character_name: String::new(),
            unk0x22: [0; 2],
            level: 0,
            seconds_played: 0,
            unk0x2c: [0; 68],
        }
    }
}

impl ProfileEntry {
    pub const SIZE: usize = 0x70;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            character_name: cur.read_wstring(PROFILE_NAME_CAPACITY)?,
            unk0x22: cur.read_array::<2>()?,
            level: cur.read_u32()?,
            seconds_played: cur.read_u32()?,
            unk0x2c: cur.read_array::<68>()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_wstring(&self.character_name, PROFILE_NAME_CAPACITY);
        w.write_bytes(&self.unk0x22);
        w.write_u32(self.level);
        w.write_u32(self.seconds_played);
        w.write_bytes(&self.unk0x2c);
    }
}

/// Ten profile lines, indexed by slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileSummary {
    pub profiles: Vec<ProfileEntry>,
}

/// Profile entries in the summary (one per slot).
pub const PROFILE_COUNT: usize = 10;

impl ProfileSummary {
    pub const SIZE: usize = PROFILE_COUNT * ProfileEntry::SIZE;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut profiles = Vec::with_capacity(PROFILE_COUNT);
        for _ in 0..PROFILE_COUNT {
            profiles.push(ProfileEntry::read(cur)?);
        }
        Ok(Self { profiles })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for profile in &self.profiles {
            profile.write(w);
        }
    }

    pub fn seconds_played(&self, slot_index: usize) -> Option<u32> {
        self.profiles.get(slot_index).map(|p| p.seconds_played)
    }
}

// =============================================================================
// USER DATA 10
// =============================================================================

/// The parsed common region.
#[derive(Clone, Debug, PartialEq)]
pub struct UserData10 {
    pub version: u32,
    pub steam_id: u64,
    pub settings: Settings,
    pub menu_system_save_load: CsMenuSystemSaveLoad,
    pub profile_summary: ProfileSummary,
    /// Unrecognized bytes up to the declared payload end.
    pub rest: Vec<u8>,
}

impl Default for UserData10 {
    fn default() -> Self {
        Self {
            version: 0,
            steam_id: 0,
            settings: Settings::default(),
            menu_system_save_load: CsMenuSystemSaveLoad::default(),
            profile_summary: ProfileSummary {
                profiles: vec![ProfileEntry::default(); PROFILE_COUNT],
            },
            rest: Vec::new(),
        }
    }
}

impl UserData10 {
    /// Decode the payload. The cursor must sit at the first payload byte;
    /// exactly [`USER_DATA_10_PAYLOAD_SIZE`] bytes are consumed.
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let start = cur.position();
        let version = cur.read_u32()?;
        let steam_id = cur.read_u64()?;
        let settings = Settings::read(cur)?;
        let menu_system_save_load = CsMenuSystemSaveLoad::read(cur)?;
        let profile_summary = ProfileSummary::read(cur)?;

        let consumed = cur.position() - start;
        let rest = cur.read_bytes(USER_DATA_10_PAYLOAD_SIZE - consumed)?;
        Ok(Self {
            version,
            steam_id,
            settings,
            menu_system_save_load,
            profile_summary,
            rest,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.version);
        w.write_u64(self.steam_id);
        self.settings.write(w);
        self.menu_system_save_load.write(w);
        self.profile_summary.write(w);
        w.write_bytes(&self.rest);
    }
}

// =============================================================================
// TESTS
// =============================================================================
