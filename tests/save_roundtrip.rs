//! Container and round-trip laws over synthetic images.

mod common;

use common::*;
use er_save_toolkit::save::checksum;
use er_save_toolkit::save::container::{SLOT_PAYLOAD_SIZE, USER_DATA_11_SIZE};
use er_save_toolkit::{Save, SaveError};

#[test]
fn test_load_then_save_is_byte_identical() {
    let image = build_pc_image(&[(0, healthy_slot())], &healthy_common());
    let save = Save::from_bytes(image.clone()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("copy.sl2");
    save.to_file(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), image);
}

#[test]
fn test_parse_populated_pc_image() {
    let image = build_pc_image(&[(0, healthy_slot()), (4, healthy_slot())], &healthy_common());
    let save = Save::from_bytes(image).unwrap();

    assert!(!save.is_ps());
    assert_eq!(save.active_slots(), vec![0, 4]);
    let slot = save.slot(0).unwrap();
    assert_eq!(slot.character_name(), "Tarnished");
    assert_eq!(slot.level(), 73);
    assert_eq!(slot.steam_id, STEAM_ID);
    assert_eq!(save.common().steam_id, STEAM_ID);
    assert_eq!(save.seconds_played(0), Some(PLAYTIME_SECONDS));

    // Fresh images verify before any mutation
    for (slot_index, ok) in save.verify_checksums() {
        assert!(ok, "slot {slot_index} checksum broken in fresh image");
    }
}

#[test]
fn test_parse_ps_image() {
    let image = build_ps_image(&[(2, healthy_slot())], &healthy_common());
    let save = Save::from_bytes(image).unwrap();

    assert!(save.is_ps());
    assert_eq!(save.active_slots(), vec![2]);
    assert_eq!(save.slot(2).unwrap().character_name(), "Tarnished");
    // No checksums on PlayStation images
    assert!(save.verify_checksums().is_empty());
}

#[test]
fn test_invalid_magic() {
    let mut image = build_pc_image(&[], &healthy_common());
    image[0..4].copy_from_slice(b"NOPE");
    assert!(matches!(
        Save::from_bytes(image),
        Err(SaveError::InvalidMagic(_))
    ));
}

#[test]
fn test_checksum_refresh_after_mutation() {
    let image = build_pc_image(&[(0, healthy_slot())], &healthy_common());
    let mut save = Save::from_bytes(image).unwrap();

    // Flip an event flag: the slot payload changes, the prefix goes stale
    save.set_event_flag(0, 310, true).unwrap();
    assert_eq!(save.verify_checksums(), vec![(0, false)]);

    save.recalculate_checksums();
    assert_eq!(save.verify_checksums(), vec![(0, true)]);

    // Reload from the written bytes: the checksum law holds on disk
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mutated.sl2");
    save.to_file(&out).unwrap();
    let reloaded = Save::load(&out).unwrap();
    assert_eq!(reloaded.verify_checksums(), vec![(0, true)]);
    assert!(reloaded.get_event_flag(0, 310).unwrap());

    // Spelled out: MD5 over the payload equals the 16-byte prefix
    let raw = reloaded.raw();
    let off = reloaded.slot_offset(0);
    let digest = checksum::digest(&raw[off + 16..off + 16 + SLOT_PAYLOAD_SIZE]);
    assert_eq!(&raw[off..off + 16], &digest);
}

#[test]
fn test_corrupt_slot_is_skipped_others_survive() {
    let mut image = build_pc_image(&[(0, healthy_slot()), (1, healthy_slot())], &healthy_common());

    // Wreck slot 1's payload: saturated bytes make a variable-length
    // count absurd and the slot codec fails mid-field
    let save_probe = Save::from_bytes(image.clone()).unwrap();
    let slot1_payload = save_probe.slot_data_offset(1);
    for byte in &mut image[slot1_payload..slot1_payload + SLOT_PAYLOAD_SIZE] {
        *byte = 0xFF;
    }
    // Keep the checksum prefix non-zero so the slot is not treated as
    // deliberately empty
    let digest = checksum::digest(&image[slot1_payload..slot1_payload + SLOT_PAYLOAD_SIZE]);
    let region = save_probe.slot_offset(1);
    image[region..region + 16].copy_from_slice(&digest);

    let save = Save::from_bytes(image).unwrap();
    // The wrecked slot is reported empty; its neighbour is intact
    assert_eq!(save.active_slots(), vec![0]);
    assert!(save.slot(1).unwrap().is_empty());
    assert_eq!(save.slot(0).unwrap().character_name(), "Tarnished");
    assert_eq!(save.common().steam_id, STEAM_ID);
}

#[test]
fn test_user_data_11_preserved() {
    let mut image = build_pc_image(&[], &healthy_common());
    let len = image.len();
    // Scribble a marker into the regulation blob
    image[len - USER_DATA_11_SIZE + 100] = 0xAB;

    let save = Save::from_bytes(image.clone()).unwrap();
    assert_eq!(save.user_data_11()[100], 0xAB);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reg.sl2");
    save.to_file(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), image);
}

#[test]
fn test_slot_index_out_of_range() {
    let image = build_pc_image(&[], &healthy_common());
    let save = Save::from_bytes(image).unwrap();
    assert!(matches!(
        save.slot(10),
        Err(SaveError::InvalidArgument(_))
    ));
}
