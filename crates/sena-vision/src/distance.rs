//! Similar-triangles distance estimation from calibrated object sizes:
//! distance = real_size_cm * focal_px / pixel_size.

/// Focal lengths are calibrated at this canvas width and rescaled to the
/// actual display width.
pub const REFERENCE_CANVAS_WIDTH_PX: f32 = 640.0;

pub const DEFAULT_FOCAL_LENGTH_PX: f32 = 800.0;

/// Boxes at least this much taller than wide are measured by height.
/// The boundary counts as tall.
pub const TALL_ASPECT: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCm {
    pub width: f32,
    pub height: f32,
}

pub const FALLBACK_SIZE: SizeCm = SizeCm {
    width: 20.0,
    height: 20.0,
};

/// Average real-world sizes per class id (standard 80-class taxonomy).
/// Field-calibrated values, not physics.
pub fn size_for_class(class_id: i64) -> SizeCm {
    let (width, height) = match class_id {
        // People and animals
        0 => (40.0, 170.0),    // person
        14 => (15.0, 12.0),    // bird
        15 => (25.0, 30.0),    // cat
        16 => (40.0, 60.0),    // dog
        17 => (80.0, 160.0),   // horse
        18 => (50.0, 80.0),    // sheep
        19 => (80.0, 150.0),   // cow
        20 => (200.0, 300.0),  // elephant
        21 => (120.0, 180.0),  // bear
        22 => (60.0, 150.0),   // zebra
        23 => (80.0, 550.0),   // giraffe
        // Vehicles
        1 => (60.0, 100.0),    // bicycle
        2 => (180.0, 150.0),   // car
        3 => (70.0, 130.0),    // motorbike
        4 => (1500.0, 2000.0), // aeroplane
        5 => (250.0, 300.0),   // bus
        6 => (300.0, 400.0),   // train
        7 => (250.0, 350.0),   // truck
        8 => (300.0, 500.0),   // boat
        // Furniture
        56 => (50.0, 100.0),   // chair
        57 => (200.0, 90.0),   // sofa
        59 => (190.0, 50.0),   // bed
        60 => (120.0, 75.0),   // diningtable
        62 => (100.0, 60.0),   // tvmonitor
        // Electronics
        63 => (35.0, 25.0),    // laptop
        67 => (7.0, 15.0),     // cell phone
        // Kitchen
        68 => (50.0, 30.0),    // microwave
        69 => (60.0, 60.0),    // oven
        72 => (80.0, 180.0),   // refrigerator
        _ => return FALLBACK_SIZE,
    };
    SizeCm { width, height }
}

/// Estimated distance in cm from a canvas-space box. Returns 0.0 for
/// degenerate input: unmeasurable, which callers must not read as touching.
/// Rounded to two decimals.
pub fn estimate_distance_cm(
    class_id: i64,
    bbox_w_px: f32,
    bbox_h_px: f32,
    canvas_w_px: f32,
    focal_length_px: f32,
) -> f32 {
    if canvas_w_px <= 0.0 || focal_length_px <= 0.0 {
        return 0.0;
    }
    let size = size_for_class(class_id);
    let adjusted_focal = focal_length_px * (canvas_w_px / REFERENCE_CANVAS_WIDTH_PX);

    let tall = bbox_h_px >= bbox_w_px * TALL_ASPECT;
    let (real_cm, pixel) = if tall {
        (size.height, bbox_h_px)
    } else {
        (size.width, bbox_w_px)
    };
    if pixel <= 0.0 || real_cm <= 0.0 {
        return 0.0;
    }

    let distance = real_cm * adjusted_focal / pixel;
    (distance * 100.0).round() / 100.0
}

/// Display formatting: integer cm under 50, one decimal up to 1m, then
/// meters.
pub fn format_distance(cm: f32) -> String {
    if cm < 50.0 {
        format!("{}cm", cm.round() as i64)
    } else if cm < 100.0 {
        format!("{:.1}cm", cm)
    } else if cm < 1000.0 {
        format!("{:.2}m", cm / 100.0)
    } else {
        format!("{:.1}m", cm / 100.0)
    }
}

/// Inverse of the estimate: given a measured distance to a known object,
/// derive the focal length normalized back to the reference canvas width.
/// Returns 0.0 on degenerate input.
pub fn calibrate_focal_length(
    known_distance_cm: f32,
    class_id: i64,
    bbox_w_px: f32,
    bbox_h_px: f32,
    canvas_w_px: f32,
) -> f32 {
    if known_distance_cm <= 0.0 || canvas_w_px <= 0.0 {
        return 0.0;
    }
    let size = size_for_class(class_id);
    let tall = bbox_h_px >= bbox_w_px * TALL_ASPECT;
    let (real_cm, pixel) = if tall {
        (size.height, bbox_h_px)
    } else {
        (size.width, bbox_w_px)
    };
    if pixel <= 0.0 || real_cm <= 0.0 {
        return 0.0;
    }

    let focal = pixel * known_distance_cm / real_cm;
    focal * (REFERENCE_CANVAS_WIDTH_PX / canvas_w_px)
}
