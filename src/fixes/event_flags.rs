//! Event-flag corruption bundle
//!
//! Quest soft-locks and "warp sickness" (the game endlessly warping the
//! player on load) are event-flag states the game can reach but never
//! recover from. Each sub-rule reads a handful of flags, decides by a
//! boolean expression, and edits the specific flags that unblock the
//! save. The whole bitmap is rewritten once per application.

use super::{occupied_slot, Fix, FixResult};
use crate::save::event_flags::{get_flag, set_flag};
use crate::save::Save;

// =============================================================================
// FLAG IDS
// =============================================================================

/// Ranni's Tower quest: progression is blocked while this flag is ON.
pub const RANNI_BLOCKING_FLAG: u32 = 1_034_500_738;

/// Progression flags enabled by the Ranni soft-lock fix: entering her
/// service and exhausting the Iji / Blaidd / Seluvis / Ranni dialogues.
pub const RANNI_FLAGS_TO_ENABLE: [u32; 31] = [
    1_034_509_410,
    1_034_509_412,
    1_034_500_732,
    1_034_500_736,
    1_034_505_015,
    1_034_509_361,
    1_034_500_715,
    1_034_500_710,
    1_034_500_700,
    1_034_490_701,
    1_034_490_700,
    1_034_509_413,
    1_034_509_418,
    1_034_509_355,
    1_034_509_357,
    1_034_509_358,
    1_034_509_205,
    1_045_379_208,
    1_034_509_305,
    1_034_509_306,
    1_034_509_417,
    1_034_500_734,
    1_034_509_416,
    1_034_500_739,
    1_034_500_733,
    1_034_502_610,
    1_034_505_002,
    1_034_505_003,
    1_034_505_004,
    1_034_500_716,
    1_034_503_600,
];

// Radahn
pub const METEORITE_GREEN: u32 = 310;
pub const DEFEATED_RADAHN: u32 = 9130;
pub const RADAHN_MAP_MARKER: u32 = 9417;
pub const GRACE_RADAHN: u32 = 76422;
pub const GRACE_WAR_DEAD_CATACOMBS: u32 = 73016;

// Morgott
pub const MORGOTT_DEFEATED: u32 = 11_000_800;
pub const MORGOTT_THORNS_TOUCHED: u32 = 11_000_500;
pub const MORGOTT_FOG_WALL: u32 = 11_000_501;

// Radagon
pub const DEFEATED_RADAGON: u32 = 9123;
pub const ENDING_CUTSCENE: u32 = 121;
pub const GRACE_FRACTURED_MARIKA: u32 = 71900;

// Sealing Tree (DLC)
pub const SPIRIT_TREE_BURNING: u32 = 330;
pub const DEFEATED_DANCING_LION: u32 = 9140;
pub const SEALING_TREE_RESTED_AFTER: u32 = 20_010_500;
pub const GRACE_ENIR_ILIM_OUTER_WALL: u32 = 72012;

// =============================================================================
// SUB-RULES
// =============================================================================

/// One issue the bundle can detect and repair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFlagIssue {
    RanniSoftlock,
    RadahnAliveWarp,
    RadahnDeadWarp,
    MorgottWarp,
    RadagonWarp,
    SealingTreeWarp,
}

impl EventFlagIssue {
    pub fn description(self) -> &'static str {
        match self {
            Self::RanniSoftlock => "Ranni's Tower soft-lock",
            Self::RadahnAliveWarp => "Radahn warp sickness (alive)",
            Self::RadahnDeadWarp => "Radahn warp sickness (dead)",
            Self::MorgottWarp => "Morgott warp sickness",
            Self::RadagonWarp => "Radagon warp sickness",
            Self::SealingTreeWarp => "Sealing Tree warp sickness",
        }
    }
}

/// Flag read that treats unknown blocks as "not set": a table from an
/// older game version must not spuriously trigger a rule.
fn flag(bitmap: &[u8], id: u32) -> bool {
    get_flag(bitmap, id).unwrap_or(false)
}

/// Evaluate all sub-rules against a bitmap.
pub fn detect_issues(bitmap: &[u8]) -> Vec<EventFlagIssue> {
    let mut issues = Vec::new();

    if flag(bitmap, RANNI_BLOCKING_FLAG) {
        issues.push(EventFlagIssue::RanniSoftlock);
    }

    let meteorite = flag(bitmap, METEORITE_GREEN);
    let radahn_dead = flag(bitmap, DEFEATED_RADAHN);
    if meteorite && !radahn_dead {
        issues.push(EventFlagIssue::RadahnAliveWarp);
    }
    if meteorite
        && radahn_dead
        && !(flag(bitmap, GRACE_RADAHN) || flag(bitmap, GRACE_WAR_DEAD_CATACOMBS))
    {
        issues.push(EventFlagIssue::RadahnDeadWarp);
    }

    if flag(bitmap, MORGOTT_DEFEATED)
        && !(flag(bitmap, MORGOTT_THORNS_TOUCHED) && flag(bitmap, MORGOTT_FOG_WALL))
    {
        issues.push(EventFlagIssue::MorgottWarp);
    }

    if flag(bitmap, DEFEATED_RADAGON)
        && !(flag(bitmap, ENDING_CUTSCENE) || flag(bitmap, GRACE_FRACTURED_MARIKA))
    {
        issues.push(EventFlagIssue::RadagonWarp);
    }

    if flag(bitmap, SPIRIT_TREE_BURNING)
        && !flag(bitmap, DEFEATED_DANCING_LION)
        && !flag(bitmap, GRACE_ENIR_ILIM_OUTER_WALL)
    {
        issues.push(EventFlagIssue::SealingTreeWarp);
    }

    issues
}

/// Apply the edits for one issue. Failing flag writes abort the issue
/// (the bitmap may be partially edited; the caller works on a scratch
/// copy and discards it on failure).
pub fn apply_issue(bitmap: &mut [u8], issue: EventFlagIssue) -> crate::error::Result<()> {
    match issue {
        EventFlagIssue::RanniSoftlock => {
            set_flag(bitmap, RANNI_BLOCKING_FLAG, false)?;
            for id in RANNI_FLAGS_TO_ENABLE {
                set_flag(bitmap, id, true)?;
            }
        }
        EventFlagIssue::RadahnAliveWarp => {
            set_flag(bitmap, METEORITE_GREEN, false)?;
            set_flag(bitmap, RADAHN_MAP_MARKER, false)?;
        }
        EventFlagIssue::RadahnDeadWarp => {
            set_flag(bitmap, GRACE_RADAHN, true)?;
        }
        EventFlagIssue::MorgottWarp => {
            set_flag(bitmap, MORGOTT_THORNS_TOUCHED, true)?;
            set_flag(bitmap, MORGOTT_FOG_WALL, true)?;
        }
        EventFlagIssue::RadagonWarp => {
            set_flag(bitmap, GRACE_FRACTURED_MARIKA, true)?;
        }
        EventFlagIssue::SealingTreeWarp => {
            set_flag(bitmap, GRACE_ENIR_ILIM_OUTER_WALL, true)?;
            set_flag(bitmap, SEALING_TREE_RESTED_AFTER, true)?;
        }
    }
    Ok(())
}

// =============================================================================
// THE BUNDLED FIX
// =============================================================================

pub struct EventFlagsFix;

impl Fix for EventFlagsFix {
    fn name(&self) -> &'static str {
        "Event Flag Corruption"
    }

    fn detect(&self, save: &Save, slot_index: usize) -> bool {
        occupied_slot(save, slot_index)
            .is_some_and(|slot| !detect_issues(&slot.event_flags).is_empty())
    }

    fn apply(&self, save: &mut Save, slot_index: usize) -> FixResult {
        let Some(slot) = occupied_slot(save, slot_index) else {
            return FixResult::skipped("slot is empty");
        };
        let issues = detect_issues(&slot.event_flags);
        if issues.is_empty() {
            return FixResult::skipped("no event flag issues detected");
        }

        // Edit a scratch copy so a failed write leaves the save untouched
        let mut bitmap = slot.event_flags.clone();
        let mut fixed = Vec::new();
        for issue in issues {
            match apply_issue(&mut bitmap, issue) {
                Ok(()) => fixed.push(issue.description().to_string()),
                Err(err) => {
                    return FixResult::skipped(format!(
                        "could not edit flags for {}: {err}",
                        issue.description()
                    ))
                }
            }
        }

        let rel = {
            let slot = save
                .slot_mut(slot_index)
                .expect("occupied slot vanished");
            slot.event_flags = bitmap.clone();
            slot.offsets.event_flags
        };
        save.write_back(slot_index, rel, &bitmap);

        FixResult::applied(format!("fixed {} event flag issue(s)", fixed.len()))
            .with_details(fixed)
    }
}
