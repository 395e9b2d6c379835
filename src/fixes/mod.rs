//! Corruption detectors and fixers
//!
//! Every known corruption is a pair of pure-ish functions over the parsed
//! save: `detect` decides whether the invariant is violated, `apply`
//! rewrites exactly the bytes needed to restore it (through the slot's
//! recorded offsets) and reports what happened. A fix that cannot be
//! applied reports `applied: false` instead of failing.
//!
//! Application order is fixed: Torrent, SteamID, time, weather, event
//! flags, DLC entry flag, DLC garbage. Teleport is not part of the
//! automatic pass; callers invoke it explicitly.

pub mod dlc;
pub mod event_flags;
pub mod steam_id;
pub mod teleport;
pub mod time_sync;
pub mod torrent;
pub mod weather;

pub use dlc::{DlcFlagFix, InvalidDlcFix};
pub use event_flags::EventFlagsFix;
pub use steam_id::SteamIdFix;
pub use teleport::{DlcEscapeFix, TeleportFix, TeleportLocation};
pub use time_sync::TimeFix;
pub use torrent::TorrentFix;
pub use weather::WeatherFix;

use crate::save::Save;

// =============================================================================
// FIX CONTRACT
// =============================================================================

/// Outcome of one `apply` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixResult {
    pub applied: bool,
    pub description: String,
    pub details: Vec<String>,
}

impl FixResult {
    pub fn applied(description: impl Into<String>) -> Self {
        Self {
            applied: true,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn skipped(description: impl Into<String>) -> Self {
        Self {
            applied: false,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// One corruption rule.
pub trait Fix {
    /// Short human-readable rule name.
    fn name(&self) -> &'static str;

    /// Whether the rule's invariant is violated for this slot.
    fn detect(&self, save: &Save, slot_index: usize) -> bool;

    /// Restore the invariant. Must leave the save untouched when it
    /// reports `applied: false`.
    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult;
}

/// All automatic fixes, in application order.
pub fn all_fixes() -> Vec<Box<dyn Fix>> {
    vec![
        Box::new(TorrentFix),
        Box::new(SteamIdFix),
        Box::new(TimeFix),
        Box::new(WeatherFix),
        Box::new(EventFlagsFix),
        Box::new(DlcFlagFix),
        Box::new(InvalidDlcFix),
    ]
}

/// Non-empty slot lookup shared by the detectors.
pub(crate) fn occupied_slot<'a>(
    save: &'a Save,
    slot_index: usize,
) -> Option<&'a crate::save::slot::Slot> {
    save.slot(slot_index).ok().filter(|slot| !slot.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_order_is_declared_order() {
        let names: Vec<&str> = all_fixes().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            [
                "Torrent Bug",
                "SteamID Sync",
                "Time Corruption",
                "Weather Corruption",
                "Event Flag Corruption",
                "DLC Entry Flag",
                "Invalid DLC Data",
            ]
        );
    }

    #[test]
    fn test_fix_result_constructors() {
        let ok = FixResult::applied("done").with_details(vec!["a".into()]);
        assert!(ok.applied);
        assert_eq!(ok.details.len(), 1);
        let no = FixResult::skipped("nothing to do");
        assert!(!no.applied);
    }
}
