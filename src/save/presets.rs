//! Character appearance presets
//!
//! The common region stores 15 presets of 0x130 bytes each inside
//! `CSMenuSystemSaveLoad`. A preset is valid when its magic field is the
//! literal ASCII `FACE`. Around 200 tuned parameters are named; several
//! byte runs are opaque and must survive every round-trip byte-for-byte,
//! which is why the JSON model exports them as explicit byte arrays under
//! `_`-prefixed keys.

use serde::{Deserialize, Serialize};

use crate::codec::{SaveCursor, SaveWriter};
use crate::error::{Result, SaveError};

/// Serialized preset size.
pub const PRESET_SIZE: usize = 0x130;
/// Preset slots in the common region.
pub const PRESET_COUNT: usize = 15;
/// Magic marking a populated preset.
pub const PRESET_MAGIC: [u8; 4] = *b"FACE";

// =============================================================================
// FACE PRESET
// =============================================================================

/// One appearance preset (0x130 bytes).
///
/// Field names follow the in-game sliders. `_`-prefixed serde names mark
/// fields that are preserved but not interpreted; dropping any of them on
/// export corrupts the preset on re-import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacePreset {
    // Header section
    #[serde(rename = "_unk0x00")]
    pub unk0x00: Vec<u8>,
    #[serde(rename = "_face_data_marker")]
    pub face_data_marker: i32,
    #[serde(rename = "_magic")]
    pub magic: [u8; 4],
    #[serde(rename = "_alignment")]
    pub alignment: u32,
    #[serde(rename = "_size")]
    pub size: u32,

    // Face models, one byte each on the wire with 3 bytes padding
    pub face_model: u8,
    pub hair_model: u8,
    #[serde(rename = "_unk0x14")]
    pub unk0x14: u8,
    pub eyebrow_model: u8,
    pub beard_model: u8,
    pub eyepatch_model: u8,
    #[serde(rename = "_unk0x24")]
    pub unk0x24: u8,
    #[serde(rename = "_unk0x28")]
    pub unk0x28: u8,

    // Facial structure
    pub apparent_age: u8,
    pub facial_aesthetic: u8,
    pub form_emphasis: u8,
    #[serde(rename = "_unk0x2f")]
    pub unk0x2f: u8,
    pub brow_ridge_height: u8,
    pub inner_brow_ridge: u8,
    pub outer_brow_ridge: u8,
    pub cheekbone_height: u8,
    pub cheekbone_depth: u8,
    pub cheekbone_width: u8,
    pub cheekbone_protrusion: u8,
    pub cheeks: u8,
    pub chin_tip_position: u8,
    pub chin_length: u8,
    pub chin_protrusion: u8,
    pub chin_depth: u8,
    pub chin_size: u8,
    pub chin_height: u8,
    pub chin_width: u8,
    pub eye_position: u8,
    pub eye_size: u8,
    pub eye_slant: u8,
    pub eye_spacing: u8,
    pub nose_size: u8,
    pub nose_forehead_ratio: u8,
    #[serde(rename = "_unk0x45")]
    pub unk0x45: u8,
    pub face_protrusion: u8,
    pub vertical_face_ratio: u8,
    pub facial_feature_slant: u8,
    pub horizontal_face_ratio: u8,
    #[serde(rename = "_unk0x4a")]
    pub unk0x4a: u8,
    pub forehead_depth: u8,
    pub forehead_protrusion: u8,
    #[serde(rename = "_unk0x4d")]
    pub unk0x4d: u8,
    pub jaw_protrusion: u8,
    pub jaw_width: u8,
    pub lower_jaw: u8,
    pub jaw_contour: u8,
    pub lip_shape: u8,
    pub lip_size: u8,
    pub lip_fullness: u8,
    pub mouth_expression: u8,
    pub lip_protrusion: u8,
    pub lip_thickness: u8,
    pub mouth_protrusion: u8,
    pub mouth_slant: u8,
    pub occlusion: u8,
    pub mouth_position: u8,
    pub mouth_width: u8,
    pub mouth_chin_distance: u8,
    pub nose_ridge_depth: u8,
    pub nose_ridge_length: u8,
    pub nose_position: u8,
    pub nose_tip_height: u8,
    pub nostril_slant: u8,
    pub nostril_size: u8,
    pub nostril_width: u8,
    pub nose_protrusion: u8,
    pub nose_bridge_height: u8,
    pub bridge_protrusion1: u8,
    pub bridge_protrusion2: u8,
    pub nose_bridge_width: u8,
    pub nose_height: u8,
    pub nose_slant: u8,

    // Unknown block between facial structure and body proportions
    #[serde(rename = "_unk0x6c")]
    pub unk0x6c: Vec<u8>,

    // Body proportions
    pub head_size: u8,
    pub chest_size: u8,
    pub abdomen_size: u8,
    pub arms_size: u8,
    pub legs_size: u8,

    #[serde(rename = "_unk0xb1")]
    pub unk0xb1: Vec<u8>,

    // Skin and cosmetics
    pub skin_color_r: u8,
    pub skin_color_g: u8,
    pub skin_color_b: u8,
    pub skin_luster: u8,
    pub pores: u8,
    pub stubble: u8,
    pub dark_circles: u8,
    pub dark_circle_color_r: u8,
    pub dark_circle_color_g: u8,
    pub dark_circle_color_b: u8,
    pub cheeks_color_intensity: u8,
    pub cheek_color_r: u8,
    pub cheek_color_g: u8,
    pub cheek_color_b: u8,
    pub eye_liner: u8,
    pub eye_liner_color_r: u8,
    pub eye_liner_color_g: u8,
    pub eye_liner_color_b: u8,
    pub eye_shadow_lower: u8,
    pub eye_shadow_lower_color_r: u8,
    pub eye_shadow_lower_color_g: u8,
    pub eye_shadow_lower_color_b: u8,
    pub eye_shadow_upper: u8,
    pub eye_shadow_upper_color_r: u8,
    pub eye_shadow_upper_color_g: u8,
    pub eye_shadow_upper_color_b: u8,
    pub lip_stick: u8,
    pub lip_stick_color_r: u8,
    pub lip_stick_color_g: u8,
    pub lip_stick_color_b: u8,
    pub tattoo_mark_position_horizontal: u8,
    pub tattoo_mark_position_vertical: u8,
    pub tattoo_mark_angle: u8,
    pub tattoo_mark_expansion: u8,
    pub tattoo_mark_color_r: u8,
    pub tattoo_mark_color_g: u8,
    pub tattoo_mark_color_b: u8,
    #[serde(rename = "_unk0xd8")]
    pub unk0xd8: u8,
    pub tattoo_mark_flip: u8,
    pub body_hair: u8,
    pub body_hair_color_r: u8,
    pub body_hair_color_g: u8,
    pub body_hair_color_b: u8,
    pub right_iris_color_r: u8,
    pub right_iris_color_g: u8,
    pub right_iris_color_b: u8,
    pub right_iris_size: u8,
    pub right_eye_clouding: u8,
    pub right_eye_clouding_color_r: u8,
    pub right_eye_clouding_color_g: u8,
    pub right_eye_clouding_color_b: u8,
    pub right_eye_white_color_r: u8,
    pub right_eye_white_color_g: u8,
    pub right_eye_white_color_b: u8,
    pub right_eye_position: u8,
    pub left_iris_color_r: u8,
    pub left_iris_color_g: u8,
    pub left_iris_color_b: u8,
    pub left_iris_size: u8,
    pub left_eye_clouding: u8,
    pub left_eye_clouding_color_r: u8,
    pub left_eye_clouding_color_g: u8,
    pub left_eye_clouding_color_b: u8,
    pub left_eye_white_color_r: u8,
    pub left_eye_white_color_g: u8,
    pub left_eye_white_color_b: u8,
    pub left_eye_position: u8,
    pub hair_color_r: u8,
    pub hair_color_g: u8,
    pub hair_color_b: u8,
    pub luster: u8,
    pub hair_root_darkness: u8,
    pub white_hairs: u8,
    pub beard_color_r: u8,
    pub beard_color_g: u8,
    pub beard_color_b: u8,
    pub beard_luster: u8,
    pub beard_root_darkness: u8,
    pub beard_white_hairs: u8,
    pub brow_color_r: u8,
    pub brow_color_g: u8,
    pub brow_color_b: u8,
    pub brow_luster: u8,
    pub brow_root_darkness: u8,
    pub brow_white_hairs: u8,
    pub eye_lash_color_r: u8,
    pub eye_lash_color_g: u8,
    pub eye_lash_color_b: u8,
    pub eye_patch_color_r: u8,
    pub eye_patch_color_g: u8,
    pub eye_patch_color_b: u8,

    #[serde(rename = "_pad")]
    pub pad: Vec<u8>,
}

impl Default for FacePreset {
    fn default() -> Self {
        // An all-zero record with the empty marker; magic stays clear so
        // the slot reads as empty
        let zeros = [0u8; PRESET_SIZE];
        let mut cur = SaveCursor::new(&zeros);
        let mut preset = Self::read(&mut cur).expect("zero buffer always parses");
        preset.face_data_marker = -1;
        preset
    }
}

impl FacePreset {
    /// True when the slot does not hold a preset.
    pub fn is_empty(&self) -> bool {
        self.magic != PRESET_MAGIC
    }

    /// Body type byte stashed inside the opaque header run.
    pub fn body_type(&self) -> u8 {
        self.unk0x00.get(9).copied().unwrap_or(0)
    }

    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        // Face model bytes are stored one per 4-byte word
        fn model(cur: &mut SaveCursor<'_>) -> Result<u8> {
            let value = cur.read_u8()?;
            cur.skip(3)?;
            Ok(value)
        }

        // Field initializers run in wire order
        Ok(Self {
            unk0x00: cur.read_bytes(20)?,
            face_data_marker: cur.read_i32()?,
            magic: cur.read_array::<4>()?,
            alignment: cur.read_u32()?,
            size: cur.read_u32()?,

            face_model: model(cur)?,
            hair_model: model(cur)?,
            unk0x14: model(cur)?,
            eyebrow_model: model(cur)?,
            beard_model: model(cur)?,
            eyepatch_model: model(cur)?,
            unk0x24: model(cur)?,
            unk0x28: model(cur)?,

            apparent_age: cur.read_u8()?,
            facial_aesthetic: cur.read_u8()?,
            form_emphasis: cur.read_u8()?,
            unk0x2f: cur.read_u8()?,
            brow_ridge_height: cur.read_u8()?,
            inner_brow_ridge: cur.read_u8()?,
            outer_brow_ridge: cur.read_u8()?,
            cheekbone_height: cur.read_u8()?,
            cheekbone_depth: cur.read_u8()?,
            cheekbone_width: cur.read_u8()?,
            cheekbone_protrusion: cur.read_u8()?,
            cheeks: cur.read_u8()?,
            chin_tip_position: cur.read_u8()?,
            chin_length: cur.read_u8()?,
            chin_protrusion: cur.read_u8()?,
            chin_depth: cur.read_u8()?,
            chin_size: cur.read_u8()?,
            chin_height: cur.read_u8()?,
            chin_width: cur.read_u8()?,
            eye_position: cur.read_u8()?,
            eye_size: cur.read_u8()?,
            eye_slant: cur.read_u8()?,
            eye_spacing: cur.read_u8()?,
            nose_size: cur.read_u8()?,
            nose_forehead_ratio: cur.read_u8()?,
            unk0x45: cur.read_u8()?,
            face_protrusion: cur.read_u8()?,
            vertical_face_ratio: cur.read_u8()?,
            facial_feature_slant: cur.read_u8()?,
            horizontal_face_ratio: cur.read_u8()?,
            unk0x4a: cur.read_u8()?,
            forehead_depth: cur.read_u8()?,
            forehead_protrusion: cur.read_u8()?,
            unk0x4d: cur.read_u8()?,
            jaw_protrusion: cur.read_u8()?,
            jaw_width: cur.read_u8()?,
            lower_jaw: cur.read_u8()?,
            jaw_contour: cur.read_u8()?,
            lip_shape: cur.read_u8()?,
            lip_size: cur.read_u8()?,
            lip_fullness: cur.read_u8()?,
            mouth_expression: cur.read_u8()?,
            lip_protrusion: cur.read_u8()?,
            lip_thickness: cur.read_u8()?,
            mouth_protrusion: cur.read_u8()?,
            mouth_slant: cur.read_u8()?,
            occlusion: cur.read_u8()?,
            mouth_position: cur.read_u8()?,
            mouth_width: cur.read_u8()?,
            mouth_chin_distance: cur.read_u8()?,
            nose_ridge_depth: cur.read_u8()?,
            nose_ridge_length: cur.read_u8()?,
            nose_position: cur.read_u8()?,
            nose_tip_height: cur.read_u8()?,
            nostril_slant: cur.read_u8()?,
            nostril_size: cur.read_u8()?,
            nostril_width: cur.read_u8()?,
            nose_protrusion: cur.read_u8()?,
            nose_bridge_height: cur.read_u8()?,
            bridge_protrusion1: cur.read_u8()?,
            bridge_protrusion2: cur.read_u8()?,
            nose_bridge_width: cur.read_u8()?,
            nose_height: cur.read_u8()?,
            nose_slant: cur.read_u8()?,

            unk0x6c: cur.read_bytes(64)?,

            head_size: cur.read_u8()?,
            chest_size: cur.read_u8()?,
            abdomen_size: cur.read_u8()?,
            arms_size: cur.read_u8()?,
            legs_size: cur.read_u8()?,

            unk0xb1: cur.read_bytes(2)?,

            skin_color_r: cur.read_u8()?,
            skin_color_g: cur.read_u8()?,
            skin_color_b: cur.read_u8()?,
            skin_luster: cur.read_u8()?,
            pores: cur.read_u8()?,
            stubble: cur.read_u8()?,
            dark_circles: cur.read_u8()?,
            dark_circle_color_r: cur.read_u8()?,
            dark_circle_color_g: cur.read_u8()?,
            dark_circle_color_b: cur.read_u8()?,
            cheeks_color_intensity: cur.read_u8()?,
            cheek_color_r: cur.read_u8()?,
            cheek_color_g: cur.read_u8()?,
            cheek_color_b: cur.read_u8()?,
            eye_liner: cur.read_u8()?,
            eye_liner_color_r: cur.read_u8()?,
            eye_liner_color_g: cur.read_u8()?,
            eye_liner_color_b: cur.read_u8()?,
            eye_shadow_lower: cur.read_u8()?,
            eye_shadow_lower_color_r: cur.read_u8()?,
            eye_shadow_lower_color_g: cur.read_u8()?,
            eye_shadow_lower_color_b: cur.read_u8()?,
            eye_shadow_upper: cur.read_u8()?,
            eye_shadow_upper_color_r: cur.read_u8()?,
            eye_shadow_upper_color_g: cur.read_u8()?,
            eye_shadow_upper_color_b: cur.read_u8()?,
            lip_stick: cur.read_u8()?,
            lip_stick_color_r: cur.read_u8()?,
            lip_stick_color_g: cur.read_u8()?,
            lip_stick_color_b: cur.read_u8()?,
            tattoo_mark_position_horizontal: cur.read_u8()?,
            tattoo_mark_position_vertical: cur.read_u8()?,
            tattoo_mark_angle: cur.read_u8()?,
            tattoo_mark_expansion: cur.read_u8()?,
            tattoo_mark_color_r: cur.read_u8()?,
            tattoo_mark_color_g: cur.read_u8()?,
            tattoo_mark_color_b: cur.read_u8()?,
            unk0xd8: cur.read_u8()?,
            tattoo_mark_flip: cur.read_u8()?,
            body_hair: cur.read_u8()?,
            body_hair_color_r: cur.read_u8()?,
            body_hair_color_g: cur.read_u8()?,
            body_hair_color_b: cur.read_u8()?,
            right_iris_color_r: cur.read_u8()?,
            right_iris_color_g: cur.read_u8()?,
            right_iris_color_b: cur.read_u8()?,
            right_iris_size: cur.read_u8()?,
            right_eye_clouding: cur.read_u8()?,
            right_eye_clouding_color_r: cur.read_u8()?,
            right_eye_clouding_color_g: cur.read_u8()?,
            right_eye_clouding_color_b: cur.read_u8()?,
            right_eye_white_color_r: cur.read_u8()?,
            right_eye_white_color_g: cur.read_u8()?,
            right_eye_white_color_b: cur.read_u8()?,
            right_eye_position: cur.read_u8()?,
            left_iris_color_r: cur.read_u8()?,
            left_iris_color_g: cur.read_u8()?,
            left_iris_color_b: cur.read_u8()?,
            left_iris_size: cur.read_u8()?,
            left_eye_clouding: cur.read_u8()?,
            left_eye_clouding_color_r: cur.read_u8()?,
            left_eye_clouding_color_g: cur.read_u8()?,
            left_eye_clouding_color_b: cur.read_u8()?,
            left_eye_white_color_r: cur.read_u8()?,
            left_eye_white_color_g: cur.read_u8()?,
            left_eye_white_color_b: cur.read_u8()?,
            left_eye_position: cur.read_u8()?,
            hair_color_r: cur.read_u8()?,
            hair_color_g: cur.read_u8()?,
            hair_color_b: cur.read_u8()?,
            luster: cur.read_u8()?,
            hair_root_darkness: cur.read_u8()?,
            white_hairs: cur.read_u8()?,
            beard_color_r: cur.read_u8()?,
            beard_color_g: cur.read_u8()?,
            beard_color_b: cur.read_u8()?,
            beard_luster: cur.read_u8()?,
            beard_root_darkness: cur.read_u8()?,
            beard_white_hairs: cur.read_u8()?,
            brow_color_r: cur.read_u8()?,
            brow_color_g: cur.read_u8()?,
            brow_color_b: cur.read_u8()?,
            brow_luster: cur.read_u8()?,
            brow_root_darkness: cur.read_u8()?,
            brow_white_hairs: cur.read_u8()?,
            eye_lash_color_r: cur.read_u8()?,
            eye_lash_color_g: cur.read_u8()?,
            eye_lash_color_b: cur.read_u8()?,
            eye_patch_color_r: cur.read_u8()?,
            eye_patch_color_g: cur.read_u8()?,
            eye_patch_color_b: cur.read_u8()?,

            pad: cur.read_bytes(10)?,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_bytes(&self.unk0x00);
        w.write_i32(self.face_data_marker);
        w.write_bytes(&self.magic);
        w.write_u32(self.alignment);
        w.write_u32(self.size);

        for model in [
            self.face_model,
            self.hair_model,
            self.unk0x14,
            self.eyebrow_model,
            self.beard_model,
            self.eyepatch_model,
            self.unk0x24,
            self.unk0x28,
        ] {
            w.write_u8(model);
            w.write_bytes(&[0, 0, 0]);
        }

        for value in [
            self.apparent_age,
            self.facial_aesthetic,
            self.form_emphasis,
            self.unk0x2f,
            self.brow_ridge_height,
            self.inner_brow_ridge,
            self.outer_brow_ridge,
            self.cheekbone_height,
            self.cheekbone_depth,
            self.cheekbone_width,
            self.cheekbone_protrusion,
            self.cheeks,
            self.chin_tip_position,
            self.chin_length,
            self.chin_protrusion,
            self.chin_depth,
            self.chin_size,
            self.chin_height,
            self.chin_width,
            self.eye_position,
            self.eye_size,
            self.eye_slant,
            self.eye_spacing,
            self.nose_size,
            self.nose_forehead_ratio,
            self.unk0x45,
            self.face_protrusion,
            self.vertical_face_ratio,
            self.facial_feature_slant,
            self.horizontal_face_ratio,
            self.unk0x4a,
            self.forehead_depth,
            self.forehead_protrusion,
            self.unk0x4d,
            self.jaw_protrusion,
            self.jaw_width,
            self.lower_jaw,
            self.jaw_contour,
            self.lip_shape,
            self.lip_size,
            self.lip_fullness,
            self.mouth_expression,
            self.lip_protrusion,
            self.lip_thickness,
            self.mouth_protrusion,
            self.mouth_slant,
            self.occlusion,
            self.mouth_position,
            self.mouth_width,
            self.mouth_chin_distance,
            self.nose_ridge_depth,
            self.nose_ridge_length,
            self.nose_position,
            self.nose_tip_height,
            self.nostril_slant,
            self.nostril_size,
            self.nostril_width,
            self.nose_protrusion,
            self.nose_bridge_height,
            self.bridge_protrusion1,
            self.bridge_protrusion2,
            self.nose_bridge_width,
            self.nose_height,
            self.nose_slant,
        ] {
            w.write_u8(value);
        }

        w.write_bytes(&self.unk0x6c);

        for value in [
            self.head_size,
            self.chest_size,
            self.abdomen_size,
            self.arms_size,
            self.legs_size,
        ] {
            w.write_u8(value);
        }

        w.write_bytes(&self.unk0xb1);

        for value in [
            self.skin_color_r,
            self.skin_color_g,
            self.skin_color_b,
            self.skin_luster,
            self.pores,
            self.stubble,
            self.dark_circles,
            self.dark_circle_color_r,
            self.dark_circle_color_g,
            self.dark_circle_color_b,
            self.cheeks_color_intensity,
            self.cheek_color_r,
            self.cheek_color_g,
            self.cheek_color_b,
            self.eye_liner,
            self.eye_liner_color_r,
            self.eye_liner_color_g,
            self.eye_liner_color_b,
            self.eye_shadow_lower,
            self.eye_shadow_lower_color_r,
            self.eye_shadow_lower_color_g,
            self.eye_shadow_lower_color_b,
            self.eye_shadow_upper,
            self.eye_shadow_upper_color_r,
            self.eye_shadow_upper_color_g,
            self.eye_shadow_upper_color_b,
            self.lip_stick,
            self.lip_stick_color_r,
            self.lip_stick_color_g,
            self.lip_stick_color_b,
            self.tattoo_mark_position_horizontal,
            self.tattoo_mark_position_vertical,
            self.tattoo_mark_angle,
            self.tattoo_mark_expansion,
            self.tattoo_mark_color_r,
            self.tattoo_mark_color_g,
            self.tattoo_mark_color_b,
            self.unk0xd8,
            self.tattoo_mark_flip,
            self.body_hair,
            self.body_hair_color_r,
            self.body_hair_color_g,
            self.body_hair_color_b,
            self.right_iris_color_r,
            self.right_iris_color_g,
            self.right_iris_color_b,
            self.right_iris_size,
            self.right_eye_clouding,
            self.right_eye_clouding_color_r,
            self.right_eye_clouding_color_g,
            self.right_eye_clouding_color_b,
            self.right_eye_white_color_r,
            self.right_eye_white_color_g,
            self.right_eye_white_color_b,
            self.right_eye_position,
            self.left_iris_color_r,
            self.left_iris_color_g,
            self.left_iris_color_b,
            self.left_iris_size,
            self.left_eye_clouding,
            self.left_eye_clouding_color_r,
            self.left_eye_clouding_color_g,
            self.left_eye_clouding_color_b,
            self.left_eye_white_color_r,
            self.left_eye_white_color_g,
            self.left_eye_white_color_b,
            self.left_eye_position,
            self.hair_color_r,
            self.hair_color_g,
            self.hair_color_b,
            self.luster,
            self.hair_root_darkness,
            self.white_hairs,
            self.beard_color_r,
            self.beard_color_g,
            self.beard_color_b,
            self.beard_luster,
            self.beard_root_darkness,
            self.beard_white_hairs,
            self.brow_color_r,
            self.brow_color_g,
            self.brow_color_b,
            self.brow_luster,
            self.brow_root_darkness,
            self.brow_white_hairs,
            self.eye_lash_color_r,
            self.eye_lash_color_g,
            self.eye_lash_color_b,
            self.eye_patch_color_r,
            self.eye_patch_color_g,
            self.eye_patch_color_b,
        ] {
            w.write_u8(value);
        }

        w.write_bytes(&self.pad);
    }

    /// Serialize to a standalone 0x130-byte buffer, verifying the size.
    /// A preset whose opaque runs were resized (bad JSON import) fails
    /// here before any byte reaches the save image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = SaveWriter::with_capacity(PRESET_SIZE);
        self.write(&mut w);
        if w.len() != PRESET_SIZE {
            return Err(SaveError::InternalLayout {
                what: "FacePreset",
                got: w.len(),
                expected: PRESET_SIZE,
            });
        }
        Ok(w.into_bytes())
    }
}

// =============================================================================
// PRESET CONTAINER
// =============================================================================

/// `CSMenuSystemSaveLoad`: the 0x1800-byte preset block of the common
/// region. 8-byte header, 15 presets, zero padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsMenuSystemSaveLoad {
    pub unk0x0: u16,
    pub unk0x2: u16,
    pub size: u32,
    pub presets: Vec<FacePreset>,
    pub padding: Vec<u8>,
}

/// Total serialized size of the preset block.
pub const MENU_SYSTEM_SIZE: usize = 0x1800;
/// Header bytes before the first preset.
pub const MENU_SYSTEM_HEADER_SIZE: usize = 8;

impl Default for CsMenuSystemSaveLoad {
    fn default() -> Self {
        Self {
            unk0x0: 0,
            unk0x2: 0,
            size: 0,
            presets: vec![FacePreset::default(); PRESET_COUNT],
            padding: vec![
                0u8;
                MENU_SYSTEM_SIZE - MENU_SYSTEM_HEADER_SIZE - PRESET_COUNT * PRESET_SIZE
            ],
        }
    }
}

impl CsMenuSystemSaveLoad {
    pub fn read(cur: &mut SaveCursor<'_>) -> Result<Self> {
        let unk0x0 = cur.read_u16()?;
        let unk0x2 = cur.read_u16()?;
        let size = cur.read_u32()?;
        let mut presets = Vec::with_capacity(PRESET_COUNT);
        for _ in 0..PRESET_COUNT {
            presets.push(FacePreset::read(cur)?);
        }
        let padding =
            cur.read_bytes(MENU_SYSTEM_SIZE - MENU_SYSTEM_HEADER_SIZE - PRESET_COUNT * PRESET_SIZE)?;
        Ok(Self {
            unk0x0,
            unk0x2,
            size,
            presets,
            padding,
        })
    }

    pub fn write(&self, w: &mut SaveWriter) {
        w.write_u16(self.unk0x0);
        w.write_u16(self.unk0x2);
        w.write_u32(self.size);
        for preset in &self.presets {
            preset.write(w);
        }
        w.write_bytes(&self.padding);
    }

    /// (slot_index, preset) pairs for populated slots.
    pub fn active_presets(&self) -> Vec<(usize, &FacePreset)> {
        self.presets
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .collect()
    }
}

// =============================================================================
// JSON EXPORT MODEL
// =============================================================================

/// Version written into exported documents.
pub const PRESET_EXPORT_VERSION: u32 = 1;

/// Top-level JSON document for preset export.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresetExport {
    pub version: u32,
    pub preset_count: usize,
    pub presets: Vec<PresetExportEntry>,
}

/// One exported preset with its source slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresetExportEntry {
    pub slot: usize,
    pub data: FacePreset,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_preset() -> FacePreset {
        let mut preset = FacePreset {
            magic: PRESET_MAGIC,
            face_data_marker: 0,
            alignment: 4,
            size: 0x120,
            face_model: 3,
            hair_model: 12,
            apparent_age: 128,
            skin_color_r: 200,
            skin_color_g: 180,
            skin_color_b: 160,
            hair_color_r: 90,
            head_size: 128,
            ..FacePreset::default()
        };
        preset.unk0x00[9] = 1; // body type
        preset.unk0x6c[0] = 0xDE;
        preset.unk0x6c[63] = 0xAD;
        preset.pad[9] = 0x7F;
        preset
    }

    #[test]
    fn test_preset_size() {
        let bytes = populated_preset().to_bytes().unwrap();
        assert_eq!(bytes.len(), PRESET_SIZE);
    }

    #[test]
    fn test_preset_roundtrip() {
        let preset = populated_preset();
        let bytes = preset.to_bytes().unwrap();
        let mut cur = SaveCursor::new(&bytes);
        let back = FacePreset::read(&mut cur).unwrap();
        assert_eq!(back, preset);
        assert_eq!(cur.position(), PRESET_SIZE);
    }

    #[test]
    fn test_empty_detection() {
        assert!(FacePreset::default().is_empty());
        assert!(!populated_preset().is_empty());
        assert_eq!(populated_preset().body_type(), 1);
    }

    #[test]
    fn test_json_preserves_opaque_runs() {
        let preset = populated_preset();
        let json = serde_json::to_string(&preset).unwrap();

        // The private keys must be present as byte arrays
        for key in [
            "\"_unk0x00\"",
            "\"_face_data_marker\"",
            "\"_magic\"",
            "\"_alignment\"",
            "\"_size\"",
            "\"_unk0x14\"",
            "\"_unk0x24\"",
            "\"_unk0x28\"",
            "\"_unk0x2f\"",
            "\"_unk0x45\"",
            "\"_unk0x4a\"",
            "\"_unk0x4d\"",
            "\"_unk0x6c\"",
            "\"_unk0xb1\"",
            "\"_pad\"",
        ] {
            assert!(json.contains(key), "missing {key} in export");
        }

        let back: FacePreset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, preset);
        assert_eq!(back.to_bytes().unwrap(), preset.to_bytes().unwrap());
    }

    #[test]
    fn test_resized_opaque_run_fails_layout_check() {
        let mut preset = populated_preset();
        preset.unk0x6c.truncate(10);
        assert!(matches!(
            preset.to_bytes(),
            Err(SaveError::InternalLayout { .. })
        ));
    }

    #[test]
    fn test_menu_system_roundtrip() {
        let mut menu = CsMenuSystemSaveLoad::default();
        menu.presets[2] = populated_preset();
        menu.size = 0x17F8;

        let mut w = SaveWriter::new();
        menu.write(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), MENU_SYSTEM_SIZE);

        let mut cur = SaveCursor::new(&bytes);
        let back = CsMenuSystemSaveLoad::read(&mut cur).unwrap();
        assert_eq!(back, menu);
        assert_eq!(back.active_presets().len(), 1);
        assert_eq!(back.active_presets()[0].0, 2);
    }
}
