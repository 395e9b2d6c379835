// Build script for the Elden Ring save toolkit
// Copies the event-flag BST table next to the binary after build

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Tell Cargo to rerun this script if the table changes
    println!("cargo:rerun-if-changed=resources/eventflag_bst.txt");

    // Get the output directory from Cargo
    let out_dir = env::var("OUT_DIR").unwrap();

    // The OUT_DIR is something like target/release/build/er-save-toolkit-xxx/out
    // We need to go up to target/release or target/debug
    let out_path = Path::new(&out_dir);

    // Navigate up to find the profile directory (release/debug)
    // OUT_DIR = target/<profile>/build/<crate>-<hash>/out
    let target_dir = out_path
        .ancestors()
        .nth(3) // Go up 3 levels from 'out'
        .expect("Could not find target directory");

    // Copy the BST table so the binary finds it alongside itself
    let bst_src = Path::new("resources/eventflag_bst.txt");
    let bst_dst = target_dir.join("eventflag_bst.txt");

    if bst_src.exists() {
        fs::copy(bst_src, &bst_dst).expect("Failed to copy eventflag_bst.txt");
    }
}
