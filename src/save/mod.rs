//! Save-file model and facade
//!
//! [`Save`] owns the complete file image (`raw`) and a parsed view of it.
//! The image is the single source of truth for writeback: mutations
//! update the parsed substructure, re-encode just that substructure and
//! overwrite its recorded range in `raw`. The file length never changes
//! over the lifetime of a `Save`.

pub mod checksum;
pub mod common;
pub mod container;
pub mod editor;
pub mod event_flags;
pub mod presets;
pub mod slot;

use std::path::Path;

use tracing::{debug, info};

use crate::codec::SaveWriter;
use crate::error::{Result, SaveError};
use checksum::CHECKSUM_SIZE;
use common::{UserData10, USER_DATA_10_PAYLOAD_SIZE};
use container::{SLOT_COUNT, SLOT_PAYLOAD_SIZE};
use presets::{FacePreset, PresetExport, PresetExportEntry, PRESET_COUNT, PRESET_SIZE};
use slot::Slot;

// =============================================================================
// SAVE
// =============================================================================

/// A loaded save file: raw image plus parsed view and offset map.
pub struct Save {
    raw: Vec<u8>,
    magic: [u8; 4],
    is_ps: bool,
    header: Vec<u8>,
    slots: Vec<Slot>,
    slot_offsets: Vec<usize>,
    common: UserData10,
    user_data_10_offset: usize,
    user_data_11: Vec<u8>,
}

impl Save {
    /// Parse a complete file image.
    pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
        let parsed = container::parse(&raw)?;
        Ok(Self {
            raw,
            magic: parsed.magic,
            is_ps: parsed.is_ps,
            header: parsed.header,
            slots: parsed.slots,
            slot_offsets: parsed.slot_offsets,
            common: parsed.common,
            user_data_10_offset: parsed.user_data_10_offset,
            user_data_11: parsed.user_data_11,
        })
    }

    /// Load and parse a save file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)?;
        info!(path = %path.display(), bytes = raw.len(), "loading save file");
        Self::from_bytes(raw)
    }

    /// Write the raw image verbatim. Call [`Save::recalculate_checksums`]
    /// first whenever the image has been mutated.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.raw)?;
        info!(path = %path.display(), bytes = self.raw.len(), "wrote save file");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_ps(&self) -> bool {
        self.is_ps
    }

    pub fn magic(&self) -> [u8; 4] {
        self.magic
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn user_data_11(&self) -> &[u8] {
        &self.user_data_11
    }

    pub fn common(&self) -> &UserData10 {
        &self.common
    }

    pub(crate) fn common_mut(&mut self) -> &mut UserData10 {
        &mut self.common
    }

    /// Indices of slots that hold a character.
    pub fn active_slots(&self) -> Vec<usize> {
        (0..SLOT_COUNT).filter(|&i| !self.slots[i].is_empty()).collect()
    }

    pub fn slot(&self, slot_index: usize) -> Result<&Slot> {
        self.slots
            .get(slot_index)
            .ok_or_else(|| SaveError::InvalidArgument(format!(
                "slot index must be 0-9, got {slot_index}"
            )))
    }

    pub fn slot_mut(&mut self, slot_index: usize) -> Result<&mut Slot> {
        self.slots
            .get_mut(slot_index)
            .ok_or_else(|| SaveError::InvalidArgument(format!(
                "slot index must be 0-9, got {slot_index}"
            )))
    }

    /// Absolute file offset of a slot region (checksum prefix included
    /// on PC).
    pub fn slot_offset(&self, slot_index: usize) -> usize {
        self.slot_offsets[slot_index]
    }

    /// Absolute file offset of a slot's payload.
    pub fn slot_data_offset(&self, slot_index: usize) -> usize {
        self.slot_offsets[slot_index] + if self.is_ps { 0 } else { CHECKSUM_SIZE }
    }

    /// Absolute file offset of the common region.
    pub fn user_data_10_offset(&self) -> usize {
        self.user_data_10_offset
    }

    /// Absolute file offset of the common region's payload.
    pub fn user_data_10_data_offset(&self) -> usize {
        self.user_data_10_offset + if self.is_ps { 0 } else { CHECKSUM_SIZE }
    }

    /// Seconds played for a slot, from the profile summary.
    pub fn seconds_played(&self, slot_index: usize) -> Option<u32> {
        self.common.profile_summary.seconds_played(slot_index)
    }

    // -------------------------------------------------------------------------
    // Writeback
    // -------------------------------------------------------------------------

    /// Overwrite `raw` at a slot-payload-relative offset. This is the
    /// single writeback primitive every mutator funnels through.
    pub(crate) fn write_back(&mut self, slot_index: usize, rel_offset: usize, bytes: &[u8]) {
        let abs = self.slot_data_offset(slot_index) + rel_offset;
        self.raw[abs..abs + bytes.len()].copy_from_slice(bytes);
    }

    /// Overwrite `raw` at a common-region-payload-relative offset.
    pub(crate) fn write_back_common(&mut self, rel_offset: usize, bytes: &[u8]) {
        let abs = self.user_data_10_data_offset() + rel_offset;
        self.raw[abs..abs + bytes.len()].copy_from_slice(bytes);
    }

    // -------------------------------------------------------------------------
    // Checksums
    // -------------------------------------------------------------------------

    /// Recompute the MD5 prefix of every non-empty slot and of the common
    /// region. Required before [`Save::to_file`] after any mutation.
    /// PlayStation images carry no checksums; this is a no-op there.
    pub fn recalculate_checksums(&mut self) {
        if self.is_ps {
            return;
        }
        for slot_index in 0..SLOT_COUNT {
            if self.slots[slot_index].is_empty() {
                continue;
            }
            checksum::refresh_region(
                &mut self.raw,
                self.slot_offsets[slot_index],
                SLOT_PAYLOAD_SIZE,
            );
        }
        checksum::refresh_region(
            &mut self.raw,
            self.user_data_10_offset,
            USER_DATA_10_PAYLOAD_SIZE,
        );
        debug!("checksums refreshed");
    }

    /// Verify the checksum of every non-empty slot. Returns
    /// `(slot_index, ok)` pairs; always empty on PlayStation images.
    pub fn verify_checksums(&self) -> Vec<(usize, bool)> {
        if self.is_ps {
            return Vec::new();
        }
        (0..SLOT_COUNT)
            .filter(|&i| !self.slots[i].is_empty())
            .map(|i| {
                (
                    i,
                    checksum::verify_region(&self.raw, self.slot_offsets[i], SLOT_PAYLOAD_SIZE),
                )
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Corruption repair
    // -------------------------------------------------------------------------

    /// Run every registered detector/fixer on a slot, in the declared
    /// order. Returns whether anything was applied plus one description
    /// per applied fix. An empty slot yields `(false, [])`.
    pub fn fix_character(&mut self, slot_index: usize) -> Result<(bool, Vec<String>)> {
        if slot_index >= SLOT_COUNT {
            return Err(SaveError::InvalidArgument(format!(
                "slot index must be 0-9, got {slot_index}"
            )));
        }
        if self.slots[slot_index].is_empty() {
            return Ok((false, Vec::new()));
        }

        let mut descriptions = Vec::new();
        for fix in crate::fixes::all_fixes() {
            if !fix.detect(self, slot_index) {
                continue;
            }
            let result = fix.apply(self, slot_index);
            if result.applied {
                info!(slot_index, fix = fix.name(), description = %result.description, "fix applied");
                descriptions.push(format!("{}: {}", fix.name(), result.description));
            }
        }
        Ok((!descriptions.is_empty(), descriptions))
    }

    // -------------------------------------------------------------------------
    // Event flags
    // -------------------------------------------------------------------------

    /// Read one event flag of a slot.
    pub fn get_event_flag(&self, slot_index: usize, event_id: u32) -> Result<bool> {
        let slot = self.slot(slot_index)?;
        if slot.is_empty() {
            return Err(SaveError::SlotEmpty(slot_index));
        }
        event_flags::get_flag(&slot.event_flags, event_id)
    }

    /// Set one event flag of a slot and write the bitmap back.
    pub fn set_event_flag(&mut self, slot_index: usize, event_id: u32, state: bool) -> Result<()> {
        if self.slot(slot_index)?.is_empty() {
            return Err(SaveError::SlotEmpty(slot_index));
        }
        let slot = &mut self.slots[slot_index];
        event_flags::set_flag(&mut slot.event_flags, event_id, state)?;
        let rel = slot.offsets.event_flags;
        let bitmap = slot.event_flags.clone();
        self.write_back(slot_index, rel, &bitmap);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Appearance presets
    // -------------------------------------------------------------------------

    /// Payload-relative offset of a preset inside the common region.
    fn preset_rel_offset(preset_index: usize) -> usize {
        common::MENU_SYSTEM_OFFSET + presets::MENU_SYSTEM_HEADER_SIZE + preset_index * PRESET_SIZE
    }

    fn check_preset_index(preset_index: usize) -> Result<()> {
        if preset_index >= PRESET_COUNT {
            return Err(SaveError::InvalidArgument(format!(
                "preset index must be 0-14, got {preset_index}"
            )));
        }
        Ok(())
    }

    /// Re-encode one preset into `raw` and refresh the common checksum.
    fn write_preset_back(&mut self, preset_index: usize) -> Result<()> {
        let bytes = self.common.menu_system_save_load.presets[preset_index].to_bytes()?;
        self.write_back_common(Self::preset_rel_offset(preset_index), &bytes);
        if !self.is_ps {
            checksum::refresh_region(
                &mut self.raw,
                self.user_data_10_offset,
                USER_DATA_10_PAYLOAD_SIZE,
            );
        }
        Ok(())
    }

    /// Export all populated presets as a JSON document. Returns how many
    /// presets were written.
    pub fn export_presets(&self, path: impl AsRef<Path>) -> Result<usize> {
        let active = self.common.menu_system_save_load.active_presets();
        let doc = PresetExport {
            version: presets::PRESET_EXPORT_VERSION,
            preset_count: active.len(),
            presets: active
                .iter()
                .map(|(slot, preset)| PresetExportEntry {
                    slot: *slot,
                    data: (*preset).clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(path, json)?;
        Ok(doc.preset_count)
    }

    /// Install a preset into a slot of the common region.
    pub fn import_preset(&mut self, preset_index: usize, preset: FacePreset) -> Result<()> {
        Self::check_preset_index(preset_index)?;
        // Validate the layout before touching anything
        preset.to_bytes()?;
        self.common.menu_system_save_load.presets[preset_index] = preset;
        self.write_preset_back(preset_index)
    }

    /// Import one entry of an exported JSON document.
    pub fn import_preset_from_json(
        &mut self,
        path: impl AsRef<Path>,
        entry_index: usize,
        preset_index: usize,
    ) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let doc: PresetExport = serde_json::from_str(&json)?;
        let entry = doc.presets.get(entry_index).ok_or_else(|| {
            SaveError::InvalidArgument(format!(
                "document has {} presets, requested entry {entry_index}",
                doc.presets.len()
            ))
        })?;
        self.import_preset(preset_index, entry.data.clone())
    }

    /// Copy a preset from another save into this one, byte-for-byte.
    pub fn copy_preset_to_save(
        &mut self,
        source: &Save,
        source_index: usize,
        dest_index: usize,
    ) -> Result<()> {
        Self::check_preset_index(source_index)?;
        Self::check_preset_index(dest_index)?;
        let preset = &source.common.menu_system_save_load.presets[source_index];
        if preset.is_empty() {
            return Err(SaveError::InvalidArgument(format!(
                "source preset {source_index} is empty"
            )));
        }
        self.import_preset(dest_index, preset.clone())
    }

    /// Clear a preset slot.
    pub fn delete_preset(&mut self, preset_index: usize) -> Result<()> {
        Self::check_preset_index(preset_index)?;
        self.common.menu_system_save_load.presets[preset_index] = FacePreset::default();
        self.write_preset_back(preset_index)
    }

}

// =============================================================================
// ENCODE HELPERS
// =============================================================================

/// Encode a substructure through its `write` method.
pub(crate) fn encode_sub<T, F>(value: &T, write: F) -> Vec<u8>
where
    F: FnOnce(&T, &mut SaveWriter),
{
    let mut w = SaveWriter::new();
    write(value, &mut w);
    w.into_bytes()
}
