//! Wall/large-obstacle tagging from bounding-box geometry.

/// A box covering at least this fraction of the frame is treated as a
/// probable wall or large obstacle. Tunable per deployment.
pub const DEFAULT_WALL_MIN_FRAME_FRACTION: f32 = 0.6;

pub fn is_probable_wall(
    box_w: f32,
    box_h: f32,
    canvas_w: f32,
    canvas_h: f32,
    min_fraction: f32,
) -> bool {
    if canvas_w <= 0.0 || canvas_h <= 0.0 || box_w <= 0.0 || box_h <= 0.0 {
        return false;
    }
    (box_w * box_h) / (canvas_w * canvas_h) >= min_fraction
}

/// Labeling policy:
/// known + wall      -> "{name} / obstacle"
/// unknown + wall    -> "wall"
/// unknown, no wall  -> "obstacle"
/// known, no wall    -> display name
pub fn label(class_name: Option<&str>, is_wall: bool) -> String {
    match (class_name, is_wall) {
        (Some(name), true) => format!("{name} / obstacle"),
        (None, true) => "wall".to_string(),
        (None, false) => "obstacle".to_string(),
        (Some(name), false) => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_fraction_threshold() {
        assert!(is_probable_wall(600.0, 400.0, 640.0, 480.0, 0.6));
        assert!(!is_probable_wall(100.0, 100.0, 640.0, 480.0, 0.6));
        // Boundary is inclusive.
        let (w, h) = (640.0 * 0.6, 480.0);
        assert!(is_probable_wall(w, h, 640.0, 480.0, 0.6));
    }

    #[test]
    fn degenerate_canvas_is_never_a_wall() {
        assert!(!is_probable_wall(100.0, 100.0, 0.0, 480.0, 0.6));
        assert!(!is_probable_wall(0.0, 100.0, 640.0, 480.0, 0.6));
    }

    #[test]
    fn labeling_policy() {
        assert_eq!(label(Some("person"), true), "person / obstacle");
        assert_eq!(label(None, true), "wall");
        assert_eq!(label(None, false), "obstacle");
        assert_eq!(label(Some("chair"), false), "chair");
    }
}
