pub mod decode;
pub mod direction;
pub mod distance;
pub mod hazard;
pub mod labels;
mod nms;

use serde::Deserialize;
use tracing::debug;

pub use decode::{DecodeError, ModelFamily, TensorFrame};
pub use nms::{iou, suppress};

/// One decoded detection in model-input pixel space, before scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub class_id: i64,
    pub conf: f32,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// A detection scaled to canvas space and enriched with distance and label.
#[derive(Debug, Clone)]
pub struct Detection {
    pub class_id: i64,
    pub conf: f32,
    // canvas pixel space, x1 >= x0 and y1 >= y0
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Estimated distance in cm; 0.0 means unmeasurable, not touching.
    pub distance_cm: f32,
    pub label: String,
    pub class_name: Option<&'static str>,
    pub is_wall: bool,
    pub unknown_class: bool,
    /// Box center x normalized against the canvas width (0 = left edge).
    pub rel_x: f32,
}

impl Detection {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub canvas_w: f32,
    pub canvas_h: f32,
    pub focal_length_px: f32,
    pub wall_min_frame_fraction: f32,
    pub nms_iou_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            canvas_w: 640.0,
            canvas_h: 480.0,
            focal_length_px: distance::DEFAULT_FOCAL_LENGTH_PX,
            wall_min_frame_fraction: hazard::DEFAULT_WALL_MIN_FRAME_FRACTION,
            nms_iou_threshold: decode::NMS_IOU_THRESHOLD,
        }
    }
}

pub struct Postprocessor {
    cfg: PipelineConfig,
}

impl Postprocessor {
    pub fn new(cfg: PipelineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Full per-frame path: decode, suppress overlaps where the format needs
    /// it, scale to canvas space, attach distance and hazard label.
    /// A malformed tensor fails this frame only.
    pub fn process(&self, frame: &TensorFrame) -> Result<Vec<Detection>, DecodeError> {
        if frame.model_w <= 0.0 || frame.model_h <= 0.0 {
            return Err(DecodeError::BadResolution {
                w: frame.model_w,
                h: frame.model_h,
            });
        }

        let mut candidates = decode::decode(frame)?;
        if frame.family.needs_nms() {
            candidates = nms::suppress(candidates, self.cfg.nms_iou_threshold);
        }

        let dx = self.cfg.canvas_w / frame.model_w;
        let dy = self.cfg.canvas_h / frame.model_h;

        let dets: Vec<Detection> = candidates
            .into_iter()
            .map(|c| self.enrich(c, dx, dy))
            .collect();

        debug!(family = ?frame.family, n = dets.len(), "frame processed");
        Ok(dets)
    }

    fn enrich(&self, c: Candidate, dx: f32, dy: f32) -> Detection {
        // Malformed corners are reordered rather than dropped.
        let (x0, x1) = if c.x1 < c.x0 { (c.x1, c.x0) } else { (c.x0, c.x1) };
        let (y0, y1) = if c.y1 < c.y0 { (c.y1, c.y0) } else { (c.y0, c.y1) };

        let x0 = x0 * dx;
        let x1 = x1 * dx;
        let y0 = y0 * dy;
        let y1 = y1 * dy;
        let w = x1 - x0;
        let h = y1 - y0;

        let distance_cm = distance::estimate_distance_cm(
            c.class_id,
            w,
            h,
            self.cfg.canvas_w,
            self.cfg.focal_length_px,
        );
        let is_wall = hazard::is_probable_wall(
            w,
            h,
            self.cfg.canvas_w,
            self.cfg.canvas_h,
            self.cfg.wall_min_frame_fraction,
        );
        let class_name = labels::class_name(c.class_id);
        let label = hazard::label(class_name, is_wall);
        let rel_x = if self.cfg.canvas_w > 0.0 {
            ((x0 + x1) / 2.0) / self.cfg.canvas_w
        } else {
            0.5
        };

        Detection {
            class_id: c.class_id,
            conf: c.conf,
            x0,
            y0,
            x1,
            y1,
            distance_cm,
            label,
            class_name,
            is_wall,
            unknown_class: class_name.is_none(),
            rel_x,
        }
    }
}
