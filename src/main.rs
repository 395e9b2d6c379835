//! Command-line driver for the save toolkit

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use er_save_toolkit::backup::BackupManager;
use er_save_toolkit::config::Config;
use er_save_toolkit::fixes::{self, Fix, TeleportFix, TeleportLocation};
use er_save_toolkit::logging::init_logging;
use er_save_toolkit::Save;

/// Elden Ring save toolkit - list, check and repair save files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List characters in a save file
    List(ListArgs),

    /// Check a save file for corruption
    Check(SaveArg),

    /// Fix corruption in a character slot
    Fix(FixArgs),

    /// Backup management
    Backup(BackupArgs),

    /// Appearance preset import/export
    Presets(PresetsArgs),
}

#[derive(Args)]
struct SaveArg {
    /// Path to the save file
    #[arg(long)]
    save: PathBuf,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    save: SaveArg,

    /// Show empty slots too
    #[arg(short, long)]
    all: bool,

    /// Show detected issues per slot
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args)]
struct FixArgs {
    #[command(flatten)]
    save: SaveArg,

    /// Character slot, 1-10 (0-9 also accepted)
    #[arg(long, value_parser = parse_slot)]
    slot: usize,

    /// Also teleport to a safe location
    #[arg(long, value_enum)]
    teleport: Option<Destination>,
}

#[derive(Args)]
struct BackupArgs {
    #[command(subcommand)]
    action: BackupAction,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Create a backup
    Create {
        #[command(flatten)]
        save: SaveArg,
        /// Backup description
        #[arg(long)]
        name: Option<String>,
    },
    /// List backups
    List {
        #[command(flatten)]
        save: SaveArg,
    },
    /// Restore a backup
    Restore {
        #[command(flatten)]
        save: SaveArg,
        /// Backup filename as shown by `backup list`
        #[arg(long)]
        backup: String,
    },
}

#[derive(Args)]
struct PresetsArgs {
    #[command(subcommand)]
    action: PresetsAction,
}

#[derive(Subcommand)]
enum PresetsAction {
    /// Export all populated presets to a JSON document
    Export {
        #[command(flatten)]
        save: SaveArg,
        /// Output JSON path
        #[arg(long)]
        output: PathBuf,
    },
    /// Import a preset from a JSON document into a slot
    Import {
        #[command(flatten)]
        save: SaveArg,
        /// JSON document produced by `presets export`
        #[arg(long)]
        input: PathBuf,
        /// Entry index inside the document (0-based)
        #[arg(long, default_value_t = 0)]
        entry: usize,
        /// Destination preset slot (0-14)
        #[arg(long)]
        slot: usize,
    },
}

/// Teleport destinations exposed on the CLI.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Destination {
    Limgrave,
    Roundtable,
    Liurnia,
    Altus,
}

impl Destination {
    fn location(self) -> &'static TeleportLocation {
        let name = match self {
            Self::Limgrave => "limgrave",
            Self::Roundtable => "roundtable",
            Self::Liurnia => "liurnia",
            Self::Altus => "altus",
        };
        TeleportLocation::by_name(name).expect("destination is registered")
    }
}

/// Accept slots as 1-10 (preferred) or 0-9 (legacy). Returns 0-based.
fn parse_slot(value: &str) -> Result<usize, String> {
    let n: i64 = value
        .parse()
        .map_err(|_| "slot must be an integer".to_string())?;
    match n {
        1..=10 => Ok((n - 1) as usize),
        0 => Ok(0),
        _ => Err("slot must be in range 1-10 (or 0-9)".to_string()),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// File name of a path for display, falling back to the full path.
fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Issues of one slot, as display strings.
fn slot_issues(save: &Save, slot_index: usize) -> Vec<String> {
    fixes::all_fixes()
        .iter()
        .filter(|fix| fix.detect(save, slot_index))
        .map(|fix| fix.name().to_string())
        .collect()
}

fn cmd_list(args: &ListArgs) -> er_save_toolkit::Result<u8> {
    let save = Save::load(&args.save.save)?;

    println!("Save file: {}", file_label(&args.save.save));
    println!(
        "Platform: {}",
        if save.is_ps() { "PlayStation" } else { "PC" }
    );
    println!();

    for slot_index in 0..10 {
        let slot = save.slot(slot_index)?;
        if slot.is_empty() {
            if args.all {
                println!("  Slot {}: (empty)", slot_index + 1);
            }
            continue;
        }

        let name = if slot.character_name().is_empty() {
            format!("Character {}", slot_index + 1)
        } else {
            slot.character_name().to_string()
        };
        let issues = slot_issues(&save, slot_index);
        let status = if issues.is_empty() { "" } else { " [ISSUES]" };
        println!(
            "  Slot {}: {} (Lv.{}) - Map: {}{}",
            slot_index + 1,
            name,
            slot.level(),
            slot.map_id,
            status
        );
        if args.verbose {
            for issue in issues {
                println!("           - {issue}");
            }
        }
    }
    Ok(0)
}

fn cmd_check(args: &SaveArg) -> er_save_toolkit::Result<u8> {
    let save = Save::load(&args.save)?;
    let mut found_issues = false;

    for slot_index in save.active_slots() {
        let issues = slot_issues(&save, slot_index);
        if issues.is_empty() {
            continue;
        }
        found_issues = true;
        let slot = save.slot(slot_index)?;
        println!("Slot {} ({}):", slot_index + 1, slot.character_name());
        for issue in issues {
            println!("  - {issue}");
        }
        println!();
    }

    if !found_issues {
        println!("No corruption detected.");
        Ok(0)
    } else {
        Ok(1)
    }
}

fn cmd_fix(args: &FixArgs, config: &Config) -> er_save_toolkit::Result<u8> {
    let mut save = Save::load(&args.save.save)?;
    let slot_index = args.slot;

    let slot = save.slot(slot_index)?;
    if slot.is_empty() {
        eprintln!("Slot {} is empty", slot_index + 1);
        return Ok(1);
    }
    println!(
        "Fixing slot {} ({})...",
        slot_index + 1,
        slot.character_name()
    );

    // Backup before anything touches the file
    let manager = backup_manager(&args.save.save, config);
    let backup_path = manager.create_pre_write_backup("fix")?;
    println!("Backup created: {}", file_label(&backup_path));

    let (mut applied_any, descriptions) = save.fix_character(slot_index)?;
    for description in &descriptions {
        println!("  - {description}");
    }

    if let Some(destination) = args.teleport {
        let teleport = TeleportFix::new(destination.location());
        let result = teleport.apply(&mut save, slot_index);
        if result.applied {
            println!("  - Teleport: {}", result.description);
            applied_any = true;
        }
    }

    if applied_any {
        save.recalculate_checksums();
        save.to_file(&args.save.save)?;
        println!("\nSave file updated.");
    } else {
        println!("\nNo fixes needed.");
    }
    Ok(0)
}

fn backup_manager(save_path: &std::path::Path, config: &Config) -> BackupManager {
    match &config.backup_dir {
        Some(dir) => BackupManager::with_backup_dir(save_path, dir),
        None => BackupManager::new(save_path),
    }
}

fn cmd_backup(args: &BackupArgs, config: &Config) -> er_save_toolkit::Result<u8> {
    match &args.action {
        BackupAction::Create { save, name } => {
            let manager = backup_manager(&save.save, config);
            let path = manager.create_backup(name.as_deref().unwrap_or(""), "manual")?;
            println!("Backup created: {}", path.display());
            Ok(0)
        }
        BackupAction::List { save } => {
            let manager = backup_manager(&save.save, config);
            let backups = manager.list_backups();
            if backups.is_empty() {
                println!("No backups found.");
                return Ok(0);
            }
            println!("Backups for {}:", file_label(&save.save));
            for entry in backups {
                let size_mb = entry.file_size as f64 / (1024.0 * 1024.0);
                println!("  {}", entry.filename);
                println!("    Created: {}", entry.timestamp);
                println!("    Size: {size_mb:.2} MB");
                if !entry.description.is_empty() {
                    println!("    Description: {}", entry.description);
                }
                println!();
            }
            Ok(0)
        }
        BackupAction::Restore { save, backup } => {
            let manager = backup_manager(&save.save, config);
            manager.restore_backup(backup)?;
            println!("Restored: {backup}");
            Ok(0)
        }
    }
}

fn cmd_presets(args: &PresetsArgs) -> er_save_toolkit::Result<u8> {
    match &args.action {
        PresetsAction::Export { save, output } => {
            let save = Save::load(&save.save)?;
            let count = save.export_presets(output)?;
            println!("Exported {count} preset(s) to {}", output.display());
            Ok(0)
        }
        PresetsAction::Import {
            save: save_arg,
            input,
            entry,
            slot,
        } => {
            let mut save = Save::load(&save_arg.save)?;
            save.import_preset_from_json(input, *entry, *slot)?;
            save.recalculate_checksums();
            save.to_file(&save_arg.save)?;
            println!("Imported preset into slot {slot}.");
            Ok(0)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::load();
    init_logging(&config.logging);

    let result = match &cli.command {
        Commands::List(args) => cmd_list(args),
        Commands::Check(args) => cmd_check(args),
        Commands::Fix(args) => cmd_fix(args, &config),
        Commands::Backup(args) => cmd_backup(args, &config),
        Commands::Presets(args) => cmd_presets(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(1)
        }
    }
}
