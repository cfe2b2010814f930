//! Steering signal for the realtime relay: averages where the near objects
//! sit in the frame and maps that to left/right/both.

use std::time::{Duration, Instant};

use sena_proto::events::Steering;

use crate::Detection;

/// Objects farther than this do not influence steering.
pub const NEAR_LIMIT_CM: f32 = 150.0;

pub const LEFT_THRESHOLD: f32 = 0.35;
pub const RIGHT_THRESHOLD: f32 = 0.65;

pub const DEFAULT_RELAY_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub struct SteeringDecision {
    pub direction: Steering,
    pub confidence: f32,
    pub object: String,
    pub min_distance_cm: Option<f32>,
}

impl SteeringDecision {
    fn none() -> Self {
        Self {
            direction: Steering::None,
            confidence: 0.0,
            object: "none".to_string(),
            min_distance_cm: None,
        }
    }
}

pub fn steer(dets: &[Detection]) -> SteeringDecision {
    let near: Vec<&Detection> = dets
        .iter()
        .filter(|d| d.distance_cm > 0.0 && d.distance_cm <= NEAR_LIMIT_CM)
        .collect();
    if near.is_empty() {
        return SteeringDecision::none();
    }

    let mut primary = near[0];
    for &d in &near[1..] {
        if d.distance_cm < primary.distance_cm {
            primary = d;
        }
    }

    let avg_x = near.iter().map(|d| d.rel_x).sum::<f32>() / near.len() as f32;
    let direction = if avg_x < LEFT_THRESHOLD {
        Steering::Left
    } else if avg_x > RIGHT_THRESHOLD {
        Steering::Right
    } else {
        Steering::Both
    };
    let confidence = near.iter().map(|d| d.conf).sum::<f32>() / near.len() as f32;

    SteeringDecision {
        direction,
        confidence,
        object: primary.label.clone(),
        min_distance_cm: Some(primary.distance_cm),
    }
}

/// Caps how often the external channel is written to. One update per
/// interval at most; empty frames still count as (throttled) None updates.
#[derive(Debug)]
pub struct DirectionRelay {
    min_interval: Duration,
    last_update: Option<Instant>,
}

impl DirectionRelay {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_update: None,
        }
    }

    pub fn maybe_steer(&mut self, dets: &[Detection], now: Instant) -> Option<SteeringDecision> {
        if let Some(t) = self.last_update {
            if now.duration_since(t) < self.min_interval {
                return None;
            }
        }
        self.last_update = Some(now);
        Some(steer(dets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(rel_x: f32, distance_cm: f32, conf: f32, label: &str) -> Detection {
        Detection {
            class_id: 0,
            conf,
            x0: 0.0,
            y0: 0.0,
            x1: 10.0,
            y1: 10.0,
            distance_cm,
            label: label.to_string(),
            class_name: Some("person"),
            is_wall: false,
            unknown_class: false,
            rel_x,
        }
    }

    #[test]
    fn left_right_and_center_zones() {
        let left = steer(&[det(0.2, 100.0, 0.9, "person")]);
        assert_eq!(left.direction, Steering::Left);

        let right = steer(&[det(0.8, 100.0, 0.9, "person")]);
        assert_eq!(right.direction, Steering::Right);

        let center = steer(&[det(0.5, 100.0, 0.9, "person")]);
        assert_eq!(center.direction, Steering::Both);
    }

    #[test]
    fn positions_average_across_near_objects() {
        // 0.2 and 0.6 average to 0.4 -> center zone.
        let out = steer(&[det(0.2, 80.0, 0.8, "person"), det(0.6, 120.0, 0.6, "chair")]);
        assert_eq!(out.direction, Steering::Both);
        assert!((out.confidence - 0.7).abs() < 1e-6);
        // The nearest object names the update.
        assert_eq!(out.object, "person");
        assert_eq!(out.min_distance_cm, Some(80.0));
    }

    #[test]
    fn far_and_unmeasurable_objects_are_ignored() {
        let out = steer(&[det(0.2, 300.0, 0.9, "person"), det(0.2, 0.0, 0.9, "person")]);
        assert_eq!(out.direction, Steering::None);
        assert_eq!(out.min_distance_cm, None);
    }

    #[test]
    fn relay_throttles_updates() {
        let mut relay = DirectionRelay::new(Duration::from_millis(200));
        let t0 = Instant::now();
        let dets = [det(0.2, 100.0, 0.9, "person")];

        assert!(relay.maybe_steer(&dets, t0).is_some());
        assert!(relay.maybe_steer(&dets, t0 + Duration::from_millis(100)).is_none());
        assert!(relay.maybe_steer(&dets, t0 + Duration::from_millis(250)).is_some());
    }
}
