//! Equipment, inventory and the gaitem handle table
//!
//! The gaitem map is a single sequential table of ~5120 records with
//! three distinct wire widths (21 / 16 / 8 bytes) selected by the
//! category nibble of `item_id`. Both reader and writer work record by
//! record; treating the table as a homogeneous array corrupts every
//! offset after the first weapon.

use num_enum::TryFromPrimitive;

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::Result;

// =============================================================================
// GAITEM HANDLES
// =============================================================================

/// Item id marking an unused gaitem entry.
pub const GAITEM_EMPTY: u32 = 0;
/// Alternative empty marker (entry was used and released).
pub const GAITEM_EMPTY_ALT: u32 = 0xFFFF_FFFF;

/// Item category encoded in the top nibble of `item_id`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum ItemCategory {
    Weapon = 0,
    Armor = 1,
    Accessory = 2,
    Goods = 4,
}

/// One record of the gaitem table.
///
/// Weapons carry upgrade state and an Ash of War handle (21 bytes),
/// armor carries two extra words (16 bytes), everything else is the bare
/// handle pair (8 bytes). The wire width each record was read with is
/// kept so mutators can only reuse an empty record of the same width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gaitem {
    pub gaitem_handle: u32,
    pub item_id: u32,
    pub unk2: u32,
    pub unk3: u32,
    pub aow_gaitem_handle: u32,
    pub unk5: u8,
    wire_width: u8,
}

impl Default for Gaitem {
    fn default() -> Self {
        Self {
            gaitem_handle: 0,
            item_id: GAITEM_EMPTY,
            unk2: 0,
            unk3: 0,
            aow_gaitem_handle: 0,
            unk5: 0,
            wire_width: Self::WIDTH_BARE as u8,
        }
    }
}

impl Gaitem {
    pub const WIDTH_WEAPON: usize = 21;
    pub const WIDTH_ARMOR: usize = 16;
    pub const WIDTH_BARE: usize = 8;

    /// Build a record with the wire width implied by `item_id`.
    pub fn new(gaitem_handle: u32, item_id: u32) -> Self {
        Self {
            gaitem_handle,
            item_id,
            wire_width: Self::width_for(item_id) as u8,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_id == GAITEM_EMPTY || self.item_id == GAITEM_EMPTY_ALT
    }

    pub fn category(&self) -> Option<ItemCategory> {
        if self.is_empty() {
            return None;
        }
        ItemCategory::try_from((self.item_id >> 28) as u8).ok()
    }

    /// Wire width this record occupies in the table.
    pub fn wire_width(&self) -> usize {
        self.wire_width as usize
    }

    fn width_for(item_id: u32) -> usize {
        if item_id == GAITEM_EMPTY || item_id == GAITEM_EMPTY_ALT {
            return Self::WIDTH_BARE;
        }
        match (item_id >> 28) as u8 {
            0 => Self::WIDTH_WEAPON,
            1 => Self::WIDTH_ARMOR,
            _ => Self::WIDTH_BARE,
        }
    }

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let gaitem_handle = cur.read_u32()?;
        let item_id = cur.read_u32()?;
        let width = Self::width_for(item_id);

        let mut gaitem = Self {
            gaitem_handle,
            item_id,
            wire_width: width as u8,
            ..Self::default()
        };
        if width >= Self::WIDTH_ARMOR {
            gaitem.unk2 = cur.read_u32()?;
            gaitem.unk3 = cur.read_u32()?;
        }
        if width == Self::WIDTH_WEAPON {
            gaitem.aow_gaitem_handle = cur.read_u32()?;
            gaitem.unk5 = cur.read_u8()?;
        }
        Ok(gaitem)
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.gaitem_handle);
        w.write_u32(self.item_id);
        let width = self.wire_width as usize;
        if width >= Self::WIDTH_ARMOR {
            w.write_u32(self.unk2);
            w.write_u32(self.unk3);
        }
        if width == Self::WIDTH_WEAPON {
            w.write_u32(self.aow_gaitem_handle);
            w.write_u8(self.unk5);
        }
    }
}

/// The full handle table of a slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GaitemMap {
    pub entries: Vec<Gaitem>,
}

/// Entry count for slot versions up to 81.
pub const GAITEM_COUNT_V81: usize = 0x13FE;
/// Entry count for slot versions above 81.
pub const GAITEM_COUNT_LATEST: usize = 0x1400;

impl GaitemMap {
    pub fn read(cur: &mut SaveCursor<'_>, count: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(Gaitem::read(cur)?);
        }
        Ok(Self { entries })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for entry in &self.entries {
            entry.write(w);
        }
    }

    pub fn serialized_size(&self) -> usize {
        self.entries.iter().map(Gaitem::wire_width).sum()
    }

    /// Find an empty entry whose wire width matches `width` exactly.
    ///
    /// In-place reuse of an entry with a different width would shift every
    /// byte after it, so width-mismatched empties are never candidates.
    pub fn find_empty(&self, width: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|g| g.is_empty() && g.wire_width() == width)
    }
}

// =============================================================================
// INVENTORY
// =============================================================================

/// One inventory line: a gaitem handle, a quantity and an acquisition
/// ordinal used for "recent items" sorting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InventoryEntry {
    pub gaitem_handle: u32,
    pub quantity: u32,
    pub inventory_index: u32,
}

impl InventoryEntry {
    pub const SIZE: usize = 12;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            gaitem_handle: cur.read_u32()?,
            quantity: cur.read_u32()?,
            inventory_index: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.gaitem_handle);
        w.write_u32(self.quantity);
        w.write_u32(self.inventory_index);
    }
}

/// An inventory region: a counted common-item table and a counted
/// key-item table, each padded to a fixed capacity.
///
/// Held inventory uses capacities 0xA80 / 0x180, the storage box
/// 0x780 / 0x80.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    pub common_count: u32,
    pub common_items: Vec<InventoryEntry>,
    pub key_count: u32,
    pub key_items: Vec<InventoryEntry>,
    pub next_acquisition_index: u32,
    pub unk: u32,
    common_capacity: usize,
    key_capacity: usize,
}

/// Held-inventory capacities.
pub const HELD_COMMON_CAPACITY: usize = 0xA80;
pub const HELD_KEY_CAPACITY: usize = 0x180;
/// Storage-box capacities.
pub const STORAGE_COMMON_CAPACITY: usize = 0x780;
pub const STORAGE_KEY_CAPACITY: usize = 0x80;

impl Default for Inventory {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Inventory {
    pub fn new(common_capacity: usize, key_capacity: usize) -> Self {
        Self {
            common_count: 0,
            common_items: vec![InventoryEntry::default(); common_capacity],
            key_count: 0,
            key_items: vec![InventoryEntry::default(); key_capacity],
            next_acquisition_index: 0,
            unk: 0,
            common_capacity,
            key_capacity,
        }
    }

    pub fn serialized_size(common_capacity: usize, key_capacity: usize) -> usize {
        4 + common_capacity * InventoryEntry::SIZE + 4 + key_capacity * InventoryEntry::SIZE + 8
    }

    pub fn read(
        cur: &mut SaveCursor<'_>,
        common_capacity: usize,
        key_capacity: usize,
    ) -> Result<Self> {
        let common_count = cur.read_u32()?;
        let mut common_items = Vec::with_capacity(common_capacity);
        for _ in 0..common_capacity {
            common_items.push(InventoryEntry::read(cur)?);
        }
        let key_count = cur.read_u32()?;
        let mut key_items = Vec::with_capacity(key_capacity);
        for _ in 0..key_capacity {
            key_items.push(InventoryEntry::read(cur)?);
        }
        Ok(Self {
            common_count,
            common_items,
            key_count,
            key_items,
            next_acquisition_index: cur.read_u32()?,
            unk: cur.read_u32()?,
            common_capacity,
            key_capacity,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.common_count);
        for entry in &self.common_items {
            entry.write(w);
        }
        w.write_u32(self.key_count);
        for entry in &self.key_items {
            entry.write(w);
        }
        w.write_u32(self.next_acquisition_index);
        w.write_u32(self.unk);
    }

    pub fn common_capacity(&self) -> usize {
        self.common_capacity
    }

    pub fn key_capacity(&self) -> usize {
        self.key_capacity
    }
}

// =============================================================================
// EQUIPPED BLOCKS
// =============================================================================

/// The 22 equipment slots of a character, in wire order: six armament
/// slots, ammunition, the four armor pieces, talismans and a covenant
/// slot. The same shape is serialized three times per slot with
/// different value meanings (equip indexes, item param ids, gaitem
/// handles).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquippedSlots {
    pub left_hand_armaments: [u32; 3],
    pub right_hand_armaments: [u32; 3],
    pub arrows: [u32; 2],
    pub bolts: [u32; 2],
    pub head: u32,
    pub chest: u32,
    pub arms: u32,
    pub legs: u32,
    pub accessories: [u32; 4],
    pub covenant: u32,
    pub unk0x4c: [u32; 3],
}

impl EquippedSlots {
    pub const SIZE: usize = 22 * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut slots = Self::default();
        for value in slots.iter_mut() {
            *value = cur.read_u32()?;
        }
        Ok(slots)
    }

    pub fn write(&self, w: &mut SaveWriter) {
        let mut this = self.clone();
        for value in this.iter_mut() {
            w.write_u32(*value);
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut u32> {
        self.left_hand_armaments
            .iter_mut()
            .chain(self.right_hand_armaments.iter_mut())
            .chain(self.arrows.iter_mut())
            .chain(self.bolts.iter_mut())
            .chain(std::iter::once(&mut self.head))
            .chain(std::iter::once(&mut self.chest))
            .chain(std::iter::once(&mut self.arms))
            .chain(std::iter::once(&mut self.legs))
            .chain(self.accessories.iter_mut())
            .chain(std::iter::once(&mut self.covenant))
            .chain(self.unk0x4c.iter_mut())
    }
}

/// Equip-index view of the 22 slots.
pub type EquippedItemsEquipIndex = EquippedSlots;
/// Item-param-id view of the 22 slots.
pub type EquippedItemsItemIds = EquippedSlots;
/// Gaitem-handle view of the 22 slots.
pub type EquippedItemsGaitemHandles = EquippedSlots;

/// Memorized spell slots plus the active selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquippedSpells {
    pub spell_slots: [u32; 12],
    pub selected_slot: u32,
    pub unk0x34: u32,
}

impl EquippedSpells {
    pub const SIZE: usize = 14 * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut spells = Self::default();
        for slot in spells.spell_slots.iter_mut() {
            *slot = cur.read_u32()?;
        }
        spells.selected_slot = cur.read_u32()?;
        spells.unk0x34 = cur.read_u32()?;
        Ok(spells)
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for &slot in &self.spell_slots {
            w.write_u32(slot);
        }
        w.write_u32(self.selected_slot);
        w.write_u32(self.unk0x34);
    }
}

/// Quick-item belt and pouch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquippedItems {
    pub quick_items: [u32; 10],
    pub pouch: [u32; 6],
    pub selected_quick_item: u32,
    pub unk0x44: u32,
}

impl EquippedItems {
    pub const SIZE: usize = 18 * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut items = Self::default();
        for slot in items.quick_items.iter_mut() {
            *slot = cur.read_u32()?;
        }
        for slot in items.pouch.iter_mut() {
            *slot = cur.read_u32()?;
        }
        items.selected_quick_item = cur.read_u32()?;
        items.unk0x44 = cur.read_u32()?;
        Ok(items)
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for &slot in &self.quick_items {
            w.write_u32(slot);
        }
        for &slot in &self.pouch {
            w.write_u32(slot);
        }
        w.write_u32(self.selected_quick_item);
        w.write_u32(self.unk0x44);
    }
}

/// The six gesture-wheel bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquippedGestures {
    pub gesture_ids: [u32; 6],
}

impl EquippedGestures {
    pub const SIZE: usize = 6 * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut gestures = Self::default();
        for slot in gestures.gesture_ids.iter_mut() {
            *slot = cur.read_u32()?;
        }
        Ok(gestures)
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for &slot in &self.gesture_ids {
            w.write_u32(slot);
        }
    }
}

/// Menu-order table for armaments and items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquippedArmamentsAndItems(pub [u32; 54]);

impl EquippedArmamentsAndItems {
    pub const SIZE: usize = 54 * 4;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let mut values = [0u32; 54];
        for value in values.iter_mut() {
            *value = cur.read_u32()?;
        }
        Ok(Self(values))
    }

    pub fn write(&self, w: &mut SaveWriter) {
        for &value in &self.0 {
            w.write_u32(value);
        }
    }
}

impl Default for EquippedArmamentsAndItems {
    fn default() -> Self {
        Self([0u32; 54])
    }
}

/// The two physick tear slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EquippedPhysics {
    pub slot1: u32,
    pub slot2: u32,
}

impl EquippedPhysics {
    pub const SIZE: usize = 8;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            slot1: cur.read_u32()?,
            slot2: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.slot1);
        w.write_u32(self.slot2);
    }
}

/// Active weapon slot selection and two-handing style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveWeaponSlotsAndArmStyle {
    pub arm_style: u32,
    pub left_hand_slot: u32,
    pub right_hand_slot: u32,
    pub left_arrow_slot: u32,
    pub right_arrow_slot: u32,
}

impl ActiveWeaponSlotsAndArmStyle {
    pub const SIZE: usize = 20;

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        Ok(Self {
            arm_style: cur.read_u32()?,
            left_hand_slot: cur.read_u32()?,
            right_hand_slot: cur.read_u32()?,
            left_arrow_slot: cur.read_u32()?,
            right_arrow_slot: cur.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.arm_style);
        w.write_u32(self.left_hand_slot);
        w.write_u32(self.right_hand_slot);
        w.write_u32(self.left_arrow_slot);
        w.write_u32(self.right_arrow_slot);
    }
}

/// Crafted-projectile list: a count followed by (id, quantity) pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcquiredProjectiles {
    pub entries: Vec<(u32, u32)>,
}

impl AcquiredProjectiles {
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let count = cur.read_u32()? as usize;
        // A corrupt count must fail as a short read, not as an allocation
        if count.saturating_mul(8) > cur.remaining() {
            return Err(crate::error::SaveError::Truncated {
                offset: cur.position(),
                wanted: count.saturating_mul(8),
            });
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push((cur.read_u32()?, cur.read_u32()?));
        }
        Ok(Self { entries })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u32(self.entries.len() as u32);
        for &(id, quantity) in &self.entries {
            w.write_u32(id);
            w.write_u32(quantity);
        }
    }

    pub fn serialized_size(&self) -> usize {
        4 + self.entries.len() * 8
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gaitem_bytes(gaitem: &Gaitem) -> Vec<u8> {
        let mut w = SaveWriter::new();
        gaitem.write(&mut w);
        w.into_bytes()
    }

    #[test]
    fn test_gaitem_weapon_width() {
        let bytes = {
            let mut w = SaveWriter::new();
            w.write_u32(0x8000_0001); // handle
            w.write_u32(0x0040_03E8); // weapon category (nibble 0)
            w.write_u32(5); // upgrade
            w.write_u32(0);
            w.write_u32(0x8000_0002); // ash of war handle
            w.write_u8(1);
            w.into_bytes()
        };
        let mut cur = SaveCursor::new(&bytes);
        let gaitem = Gaitem::read(&mut cur).unwrap();
        assert_eq!(gaitem.wire_width(), Gaitem::WIDTH_WEAPON);
        assert_eq!(gaitem.category(), Some(ItemCategory::Weapon));
        assert_eq!(cur.position(), 21);
        assert_eq!(gaitem_bytes(&gaitem), bytes);
    }

    #[test]
    fn test_gaitem_armor_width() {
        let bytes = {
            let mut w = SaveWriter::new();
            w.write_u32(0x9000_0001);
            w.write_u32(0x1000_2328); // armor category
            w.write_u32(0);
            w.write_u32(0);
            w.into_bytes()
        };
        let mut cur = SaveCursor::new(&bytes);
        let gaitem = Gaitem::read(&mut cur).unwrap();
        assert_eq!(gaitem.wire_width(), Gaitem::WIDTH_ARMOR);
        assert_eq!(gaitem.category(), Some(ItemCategory::Armor));
        assert_eq!(gaitem_bytes(&gaitem), bytes);
    }

    #[test]
    fn test_gaitem_goods_and_accessories_are_bare() {
        for item_id in [0x4000_0064u32, 0x2000_03E8] {
            let bytes = {
                let mut w = SaveWriter::new();
                w.write_u32(0xB000_0001);
                w.write_u32(item_id);
                w.into_bytes()
            };
            let mut cur = SaveCursor::new(&bytes);
            let gaitem = Gaitem::read(&mut cur).unwrap();
            assert_eq!(gaitem.wire_width(), Gaitem::WIDTH_BARE);
            assert!(!gaitem.is_empty());
            assert_eq!(gaitem_bytes(&gaitem), bytes);
        }
    }

    #[test]
    fn test_gaitem_empty_entry() {
        let bytes = {
            let mut w = SaveWriter::new();
            w.write_u32(0);
            w.write_u32(GAITEM_EMPTY_ALT);
            w.into_bytes()
        };
        let mut cur = SaveCursor::new(&bytes);
        let gaitem = Gaitem::read(&mut cur).unwrap();
        assert!(gaitem.is_empty());
        assert_eq!(gaitem.category(), None);
        assert_eq!(gaitem.wire_width(), Gaitem::WIDTH_BARE);
    }

    #[test]
    fn test_gaitem_map_mixed_widths() {
        let mut w = SaveWriter::new();
        // weapon
        w.write_u32(1);
        w.write_u32(0x0012_3456); // nibble 0, non-empty → weapon
        w.write_u32(0);
        w.write_u32(0);
        w.write_u32(0);
        w.write_u8(0);
        // goods
        w.write_u32(2);
        w.write_u32(0x4000_0064);
        // empty
        w.write_u32(0);
        w.write_u32(0);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 21 + 8 + 8);

        let mut cur = SaveCursor::new(&bytes);
        let map = GaitemMap::read(&mut cur, 3).unwrap();
        assert_eq!(map.serialized_size(), bytes.len());
        assert_eq!(map.find_empty(Gaitem::WIDTH_BARE), Some(2));
        assert_eq!(map.find_empty(Gaitem::WIDTH_WEAPON), None);
    }

    #[test]
    fn test_inventory_roundtrip() {
        let mut inv = Inventory::new(4, 2);
        inv.common_count = 1;
        inv.common_items[0] = InventoryEntry {
            gaitem_handle: 0xB000_0001,
            quantity: 5,
            inventory_index: 1,
        };
        let mut w = SaveWriter::new();
        inv.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), Inventory::serialized_size(4, 2));

        let mut cur = SaveCursor::new(&bytes);
        let back = Inventory::read(&mut cur, 4, 2).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn test_projectiles_roundtrip() {
        let proj = AcquiredProjectiles {
            entries: vec![(60500, 10), (60510, 3)],
        };
        let mut w = SaveWriter::new();
        proj.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), proj.serialized_size());
        let mut cur = SaveCursor::new(&bytes);
        assert_eq!(AcquiredProjectiles::read(&mut cur).unwrap(), proj);
    }
}
