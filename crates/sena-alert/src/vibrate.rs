//! Vibration channel: haptic counterpart of the announcer with its own
//! threshold and cooldown. Waveform urgency rises as the object closes in,
//! and the motor side follows where the object sits in the frame.

use std::time::{Duration, Instant};

use tracing::warn;

use sena_proto::events::MotorSide;
use sena_vision::Detection;

use crate::announce::DEFERRED_STAGGER;
use crate::schedule::DeferredQueue;
use crate::{rank_by_proximity, Firing, Outcome, Suppression, VibrationSink};

/// Distance bands for waveform selection.
pub const CRITICAL_BAND_CM: f32 = 30.0;
pub const WARNING_BAND_CM: f32 = 50.0;

/// Long attention-grabbing waveform for the critical band.
pub const CRITICAL_PATTERN: [u64; 14] = [
    125, 75, 125, 275, 200, 275, 125, 75, 125, 275, 200, 600, 200, 600,
];
pub const WARNING_PATTERN: [u64; 4] = [300, 400, 300, 400];

/// Screen thirds for picking the motor side.
pub const LEFT_ZONE: f32 = 0.33;
pub const RIGHT_ZONE: f32 = 0.67;

#[derive(Debug, Clone, PartialEq)]
pub struct Pulse {
    /// ms on/off pairs, single element for a plain buzz.
    pub pattern_ms: Vec<u64>,
    pub side: MotorSide,
}

#[derive(Debug, Clone)]
pub struct VibrateConfig {
    pub enabled: bool,
    /// Inclusive: an object at exactly the threshold still buzzes.
    pub distance_threshold_cm: f32,
    pub cooldown: Duration,
}

impl Default for VibrateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance_threshold_cm: 150.0,
            cooldown: Duration::from_millis(500),
        }
    }
}

/// In the normal band the single-buzz length scales linearly 100-200 ms
/// with how far under the threshold the object is.
pub fn severity_pattern(distance_cm: f32, threshold_cm: f32) -> Vec<u64> {
    if distance_cm < CRITICAL_BAND_CM {
        return CRITICAL_PATTERN.to_vec();
    }
    if distance_cm < WARNING_BAND_CM {
        return WARNING_PATTERN.to_vec();
    }
    let span = (threshold_cm - WARNING_BAND_CM).max(1.0);
    let ratio = ((threshold_cm - distance_cm) / span).clamp(0.0, 1.0);
    vec![(100.0 + (ratio * 100.0).round()) as u64]
}

pub fn motor_side(rel_x: f32) -> MotorSide {
    if rel_x.is_nan() {
        return MotorSide::Both;
    }
    if rel_x < LEFT_ZONE {
        MotorSide::Left
    } else if rel_x > RIGHT_ZONE {
        MotorSide::Right
    } else {
        MotorSide::Both
    }
}

#[derive(Debug, Clone)]
pub struct PendingPulse {
    pub class_id: i64,
    pub distance_cm: f32,
    pub rel_x: f32,
}

impl PendingPulse {
    fn from_detection(d: &Detection) -> Self {
        Self {
            class_id: d.class_id,
            distance_cm: d.distance_cm,
            rel_x: d.rel_x,
        }
    }
}

#[derive(Debug)]
pub struct Vibrator {
    cfg: VibrateConfig,
    last_pulse: Option<Instant>,
    deferred: DeferredQueue<PendingPulse>,
}

impl Vibrator {
    pub fn new(cfg: VibrateConfig) -> Self {
        Self {
            cfg,
            last_pulse: None,
            deferred: DeferredQueue::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.deferred.next_due()
    }

    pub fn set_enabled(&mut self, enabled: bool, sink: &mut dyn VibrationSink) {
        self.cfg.enabled = enabled;
        if !enabled {
            sink.cancel();
            self.deferred.clear();
        }
    }

    pub fn reset(&mut self) {
        self.last_pulse = None;
        self.deferred.clear();
    }

    pub fn process_frame(
        &mut self,
        dets: &[Detection],
        now: Instant,
        sink: &mut dyn VibrationSink,
    ) -> Outcome {
        if !self.cfg.enabled {
            return Outcome::Suppressed(Suppression::Disabled);
        }

        let mut near: Vec<&Detection> = dets
            .iter()
            .filter(|d| d.distance_cm > 0.0 && d.distance_cm <= self.cfg.distance_threshold_cm)
            .collect();
        if near.is_empty() {
            return Outcome::Suppressed(Suppression::NothingInRange);
        }
        rank_by_proximity(&mut near);

        for (i, d) in near.iter().enumerate().skip(1) {
            self.deferred
                .schedule(now + DEFERRED_STAGGER * i as u32, PendingPulse::from_detection(d));
        }

        let primary = PendingPulse::from_detection(near[0]);
        self.try_pulse(&primary, now, sink)
    }

    pub fn poll(&mut self, now: Instant, sink: &mut dyn VibrationSink) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(pending) = self.deferred.pop_due(now) {
            outcomes.push(self.try_pulse(&pending, now, sink));
        }
        outcomes
    }

    fn try_pulse(
        &mut self,
        pending: &PendingPulse,
        now: Instant,
        sink: &mut dyn VibrationSink,
    ) -> Outcome {
        if !self.cfg.enabled {
            return Outcome::Suppressed(Suppression::Disabled);
        }
        if let Some(last) = self.last_pulse {
            if now.duration_since(last) < self.cfg.cooldown {
                return Outcome::Suppressed(Suppression::ChannelBusy);
            }
        }

        let pulse = Pulse {
            pattern_ms: severity_pattern(pending.distance_cm, self.cfg.distance_threshold_cm),
            side: motor_side(pending.rel_x),
        };
        match sink.vibrate(&pulse) {
            Ok(()) => {
                self.last_pulse = Some(now);
                Outcome::Fired(Firing {
                    class_id: pending.class_id,
                    distance_cm: pending.distance_cm,
                    text: None,
                    pattern_ms: Some(pulse.pattern_ms),
                    side: Some(pulse.side),
                })
            }
            Err(e) => {
                warn!(class_id = pending.class_id, "vibration dropped: {e:#}");
                Outcome::Dropped
            }
        }
    }
}
