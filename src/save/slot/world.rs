//! World state and position structures of a character slot
//!
//! Map ids, Torrent, weather, in-game clock, DLC record, player
//! coordinates, gestures and unlocked regions. Structures whose layout is
//! not understood are fixed-length opaque byte runs that round-trip
//! byte-identically and have no mutators.

use num_enum::TryFromPrimitive;

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::Result;

// =============================================================================
// OPAQUE BYTE RUNS
// =============================================================================

/// Fixed-length byte run whose interior layout is not interpreted.
///
/// The codec reads and writes these verbatim. There are deliberately no
/// accessors: a field becomes editable only once its layout is understood
/// and it gets a real structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Opaque<const N: usize>(pub(crate) [u8; N]);

impl<const N: usize> Opaque<N> {
    pub const SIZE: usize = N;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self(cur.read_array::<N>()?))
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_bytes(&self.0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Default for Opaque<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

pub type BloodStain = Opaque<0x18>;
pub type MenuSaveLoad = Opaque<0x100>;
pub type TrophyEquipData = Opaque<0x34>;
pub type GaitemGameData = Opaque<0x88>;
pub type TutorialData = Opaque<0x408>;
pub type FieldArea = Opaque<0x9C>;
pub type WorldArea = Opaque<0x84>;
pub type WorldGeomMan = Opaque<0x78>;
pub type RendMan = Opaque<0x10>;
pub type NetMan = Opaque<0x104>;
pub type Ps5Activity = Opaque<0x20>;
pub type PlayerGameDataHash = Opaque<0x10>;

/// In-slot appearance record. 303 bytes, NOT interchangeable with the
/// 0x130-byte preset variant stored in the common region.
pub type FaceData = Opaque<0x12F>;

// =============================================================================
// VECTORS
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatVector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl FloatVector3 {
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            x: cur.read_f32()?,
            y: cur.read_f32()?,
            z: cur.read_f32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_f32(self.x);
        w.write_f32(self.y);
        w.write_f32(self.z);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatVector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl FloatVector4 {
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            x: cur.read_f32()?,
            y: cur.read_f32()?,
            z: cur.read_f32()?,
            w: cur.read_f32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_f32(self.x);
        w.write_f32(self.y);
        w.write_f32(self.z);
        w.write_f32(self.w);
    }
}

// =============================================================================
// MAP ID
// =============================================================================

/// Map id in wire order: [sub, map, block, area].
///
/// The printable form mWW_XX_YY_DD reads the bytes back to front, so
/// `[0, 36, 42, 60]` is m60_42_36_00 (Limgrave, The First Step).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapId(pub [u8; 4]);

/// Area byte values at or above this are Shadow of the Erdtree maps.
pub const DLC_AREA_MIN: u8 = 60;

impl MapId {
    pub const SIZE: usize = 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self(cur.read_array::<4>()?))
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_bytes(&self.0);
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Area byte (highest byte of the 32-bit id).
    pub fn area(&self) -> u8 {
        self.0[3]
    }

    /// True when the character is inside a Shadow of the Erdtree map.
    pub fn is_dlc(&self) -> bool {
        self.0[3] >= DLC_AREA_MIN
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "m{:02}_{:02}_{:02}_{:02}",
            self.0[3], self.0[2], self.0[1], self.0[0]
        )
    }
}

// =============================================================================
// TORRENT
// =============================================================================

/// Known values of the horse state field.
///
/// Unlisted values exist in the wild; [`RideGameData`] stores the raw u32
/// so they survive a round-trip.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum HorseState {
    Inactive = 0,
    Dead = 3,
    Active = 13,
}

/// Torrent's persistent record: HP and state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RideGameData {
    pub hp: u32,
    pub state: u32,
}

impl RideGameData {
    pub const SIZE: usize = 8;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            hp: cur.read_u32()?,
            state: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.hp);
        w.write_u32(self.state);
    }

    pub fn state_enum(&self) -> Option<HorseState> {
        HorseState::try_from(self.state).ok()
    }

    /// The infinite-loading bug: zero HP while the state still says Active.
    pub fn has_bug(&self) -> bool {
        self.hp == 0 && self.state == HorseState::Active as u32
    }

    /// Resolve the bug by marking Torrent dead.
    pub fn fix_bug(&mut self) {
        self.state = HorseState::Dead as u32;
    }
}

// =============================================================================
// WEATHER AND CLOCK
// =============================================================================

/// Per-area weather record.
///
/// `area_id` must match the area byte of the slot's map id; `timer` counts
/// toward the next weather roll and is never legitimately above 100 000.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldAreaWeather {
    pub area_id: u8,
    pub unk0x1: [u8; 3],
    pub timer: u32,
    pub unk0x8: u32,
}

impl WorldAreaWeather {
    pub const SIZE: usize = 12;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            area_id: cur.read_u8()?,
            unk0x1: cur.read_array::<3>()?,
            timer: cur.read_u32()?,
            unk0x8: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u8(self.area_id);
        w.write_bytes(&self.unk0x1);
        w.write_u32(self.timer);
        w.write_u32(self.unk0x8);
    }
}

/// In-game clock, three bytes: hour, minute, second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldAreaTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WorldAreaTime {
    pub const SIZE: usize = 3;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            hour: cur.read_u8()?,
            minute: cur.read_u8()?,
            second: cur.read_u8()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u8(self.hour);
        w.write_u8(self.minute);
        w.write_u8(self.second);
    }

    /// The clock the game would show after `seconds_played` seconds.
    /// The hour byte wraps at 256 like the on-disk field does.
    pub fn from_seconds_played(seconds_played: u32) -> Self {
        Self {
            hour: (seconds_played / 3600) as u8,
            minute: ((seconds_played % 3600) / 60) as u8,
            second: (seconds_played % 60) as u8,
        }
    }
}

// =============================================================================
// DLC RECORD
// =============================================================================

/// Shadow of the Erdtree per-slot record, 50 bytes.
///
/// Byte 0 is the "entered DLC" flag, bytes 1..3 carry DLC state, and
/// bytes 3..50 must be zero; garbage there prevents the save from loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dlc(pub(crate) [u8; 50]);

impl Dlc {
    pub const SIZE: usize = 50;
    /// First byte that must always be zero.
    pub const RESERVED_START: usize = 3;

    pub fn from_bytes(bytes: [u8; 50]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self(cur.read_array::<50>()?))
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_bytes(&self.0);
    }

    pub fn entered_flag(&self) -> u8 {
        self.0[0]
    }

    pub fn clear_entered_flag(&mut self) {
        self.0[0] = 0;
    }

    /// Any non-zero byte in the reserved tail.
    pub fn has_garbage(&self) -> bool {
        self.0[Self::RESERVED_START..].iter().any(|&b| b != 0)
    }

    pub fn clear_garbage(&mut self) {
        self.0[Self::RESERVED_START..].fill(0);
    }
}

impl Default for Dlc {
    fn default() -> Self {
        Self([0u8; 50])
    }
}

// =============================================================================
// PLAYER COORDINATES
// =============================================================================

/// Player position and orientation inside the current map.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerCoordinates {
    pub position: FloatVector3,
    pub orientation: FloatVector4,
}

impl PlayerCoordinates {
    pub const SIZE: usize = 28;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            position: FloatVector3::read(cur)?,
            orientation: FloatVector4::read(cur)?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        self.position.write(w);
        self.orientation.write(w);
    }
}

// =============================================================================
// GESTURES
// =============================================================================

/// Gesture id meaning "no gesture in this slot".
pub const GESTURE_EMPTY: u32 = 0;
/// Alternative empty marker seen in older saves.
pub const GESTURE_EMPTY_ALT: u32 = 0xFFFF_FFFE;

/// Unlocked gesture table: 64 ids, sorted ascending on disk with empty
/// slots packed at the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gestures(pub(crate) [u32; 64]);

impl Gestures {
    pub const CAPACITY: usize = 64;
    pub const SIZE: usize = Self::CAPACITY * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut ids = [0u32; Self::CAPACITY];
        for id in ids.iter_mut() {
            *id = cur.read_u32()?;
        }
        Ok(Self(ids))
    }

    /// Serialize in canonical order: unlocked ids sorted ascending,
    /// zero-padded to the full 64 entries.
    pub fn write(&self, w: &mut SaveWriter) {
        let mut ids: Vec<u32> = self.unlocked().collect();
        ids.sort_unstable();
        for &id in &ids {
            w.write_u32(id);
        }
        for _ in ids.len()..Self::CAPACITY {
            w.write_u32(GESTURE_EMPTY);
        }
    }

    pub fn unlocked(&self) -> impl Iterator<Item = u32> + '_ {
        self.0
            .iter()
            .copied()
            .filter(|&id| id != GESTURE_EMPTY && id != GESTURE_EMPTY_ALT)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.unlocked().any(|g| g == id)
    }

    /// Add a gesture id. Returns false when the table is full or the id
    /// is already present.
    pub fn add(&mut self, id: u32) -> bool {
        if id == GESTURE_EMPTY || id == GESTURE_EMPTY_ALT || self.contains(id) {
            return false;
        }
        for slot in self.0.iter_mut() {
            if *slot == GESTURE_EMPTY || *slot == GESTURE_EMPTY_ALT {
                *slot = id;
                return true;
            }
        }
        false
    }
}

impl Default for Gestures {
    fn default() -> Self {
        Self([GESTURE_EMPTY; Self::CAPACITY])
    }
}

// =============================================================================
// UNLOCKED REGIONS
// =============================================================================

/// Map-region unlock list: a count followed by that many region ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Regions {
    pub ids: Vec<u32>,
}

impl Regions {
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let count = cur.read_u32()? as usize;
        // A corrupt count must fail as a short read, not as an allocation
        if count.saturating_mul(4) > cur.remaining() {
            return Err(crate::error::SaveError::Truncated {
                offset: cur.position(),
                wanted: count.saturating_mul(4),
            });
        }
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(cur.read_u32()?);
        }
        Ok(Self { ids })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.ids.len() as u32);
        for &id in &self.ids {
            w.write_u32(id);
        }
    }

    pub fn serialized_size(&self) -> usize {
        4 + self.ids.len() * 4
    }
}

// =============================================================================
// TESTS
// =============================================================================
