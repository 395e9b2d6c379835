// Elden Ring save-file toolkit: parser, editor and corruption repairer

// =============================================================================
// MODULES
// =============================================================================

pub mod backup;
pub mod codec;
pub mod config;
pub mod error;
pub mod fixes;
pub mod logging;
pub mod save;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use error::{Result, SaveError};
pub use fixes::{Fix, FixResult, TeleportLocation};
pub use save::slot::Slot;
pub use save::Save;
