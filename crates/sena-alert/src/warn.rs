//! Collision warnings: a second, closer band on the voice channel with its
//! own cadence and urgency levels. Tracks per-class distance between frames
//! so an approaching object escalates and a receding one goes quiet.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use sena_vision::{labels, Detection};

use crate::announce::Announcer;
use crate::{Firing, Outcome, SpeechSink, Suppression};

/// An object must close by more than this between frames to count as
/// approaching.
pub const APPROACH_DELTA_CM: f32 = 5.0;
/// An object must open up by more than this to count as receding.
pub const RECEDE_DELTA_CM: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct WarnConfig {
    pub enabled: bool,
    pub warning_threshold_cm: f32,
    pub critical_threshold_cm: f32,
    pub min_interval: Duration,
    pub language: String,
}

impl Default for WarnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warning_threshold_cm: 50.0,
            critical_threshold_cm: 30.0,
            min_interval: Duration::from_millis(1000),
            language: "id-ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnLevel {
    Critical,
    Approaching,
    Warning,
}

#[derive(Debug)]
pub struct CollisionWarner {
    cfg: WarnConfig,
    last_warning: HashMap<i64, Instant>,
    previous_distance: HashMap<i64, f32>,
}

impl CollisionWarner {
    pub fn new(cfg: WarnConfig) -> Self {
        Self {
            cfg,
            last_warning: HashMap::new(),
            previous_distance: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.cfg.enabled = enabled;
        if !enabled {
            self.previous_distance.clear();
        }
    }

    pub fn reset(&mut self) {
        self.last_warning.clear();
        self.previous_distance.clear();
    }

    /// Warn about the closest collision-band object. A critical warning may
    /// cut off a normal announcement in flight; anything less waits.
    pub fn process_frame(
        &mut self,
        dets: &[Detection],
        now: Instant,
        announcer: &mut Announcer,
        sink: &mut dyn SpeechSink,
    ) -> Outcome {
        if !self.cfg.enabled {
            return Outcome::Suppressed(Suppression::Disabled);
        }

        let mut closest: Option<&Detection> = None;
        for d in dets {
            if d.distance_cm <= 0.0 || d.distance_cm > self.cfg.warning_threshold_cm {
                continue;
            }
            match closest {
                Some(c) if c.distance_cm <= d.distance_cm => {}
                _ => closest = Some(d),
            }
        }
        let Some(closest) = closest else {
            return Outcome::Suppressed(Suppression::NothingInRange);
        };

        let class_id = closest.class_id;
        let distance = closest.distance_cm;

        if let Some(last) = self.last_warning.get(&class_id) {
            if now.duration_since(*last) < self.cfg.min_interval {
                return Outcome::Suppressed(Suppression::TooRecent);
            }
        }

        let previous = self.previous_distance.get(&class_id).copied();
        let approaching = previous.is_some_and(|p| distance < p - APPROACH_DELTA_CM);
        let receding = previous.is_some_and(|p| distance > p + RECEDE_DELTA_CM);
        self.previous_distance.insert(class_id, distance);

        let level = if distance <= self.cfg.critical_threshold_cm {
            WarnLevel::Critical
        } else if approaching {
            WarnLevel::Approaching
        } else {
            WarnLevel::Warning
        };

        if receding && level != WarnLevel::Critical {
            return Outcome::Suppressed(Suppression::Receding);
        }

        let name = labels::localize_label(&closest.label);
        let cm = distance.round() as i64;
        let message = match level {
            WarnLevel::Critical => format!("Awas! {name} sangat dekat! {cm} sentimeter!"),
            WarnLevel::Approaching => format!("Hati-hati! {name} mendekat! {cm} sentimeter!"),
            WarnLevel::Warning => format!("Peringatan! {name} di depan! {cm} sentimeter!"),
        };

        if announcer.is_speaking() {
            if level == WarnLevel::Critical {
                // Collision beats whatever is playing.
                sink.cancel();
                announcer.on_speech_end();
            } else {
                return Outcome::Suppressed(Suppression::ChannelBusy);
            }
        }

        match sink.speak(&message, &self.cfg.language) {
            Ok(()) => {
                self.last_warning.insert(class_id, now);
                Outcome::Fired(Firing {
                    class_id,
                    distance_cm: distance,
                    text: Some(message),
                    pattern_ms: None,
                    side: None,
                })
            }
            Err(e) => {
                warn!(label = %closest.label, "collision warning dropped: {e:#}");
                Outcome::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{AnnounceConfig, Announcer};
    use crate::testutil::{det, RecordingSpeech};

    fn warner() -> CollisionWarner {
        CollisionWarner::new(WarnConfig::default())
    }

    fn quiet_announcer() -> Announcer {
        Announcer::new(AnnounceConfig::default())
    }

    #[test]
    fn critical_message_under_critical_threshold() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        let out = w.process_frame(
            &[det(0, 25.0, 0.9, "person")],
            Instant::now(),
            &mut a,
            &mut sink,
        );
        assert!(matches!(out, Outcome::Fired(_)));
        assert_eq!(sink.spoken[0], "Awas! manusia sangat dekat! 25 sentimeter!");
    }

    #[test]
    fn plain_warning_between_thresholds() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        w.process_frame(
            &[det(0, 45.0, 0.9, "person")],
            Instant::now(),
            &mut a,
            &mut sink,
        );
        assert_eq!(sink.spoken[0], "Peringatan! manusia di depan! 45 sentimeter!");
    }

    #[test]
    fn approaching_object_escalates() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        let t0 = Instant::now();

        w.process_frame(&[det(0, 48.0, 0.9, "person")], t0, &mut a, &mut sink);
        // 48 -> 40 is more than 5cm closer.
        w.process_frame(
            &[det(0, 40.0, 0.9, "person")],
            t0 + Duration::from_millis(1100),
            &mut a,
            &mut sink,
        );
        assert_eq!(sink.spoken[1], "Hati-hati! manusia mendekat! 40 sentimeter!");
    }

    #[test]
    fn receding_object_goes_quiet() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        let t0 = Instant::now();

        w.process_frame(&[det(0, 35.0, 0.9, "person")], t0, &mut a, &mut sink);
        let out = w.process_frame(
            &[det(0, 48.0, 0.9, "person")],
            t0 + Duration::from_millis(1100),
            &mut a,
            &mut sink,
        );
        assert_eq!(out, Outcome::Suppressed(Suppression::Receding));
        assert_eq!(sink.spoken.len(), 1);
    }

    #[test]
    fn per_class_warning_interval() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        let t0 = Instant::now();
        let dets = [det(0, 40.0, 0.9, "person")];

        assert!(matches!(
            w.process_frame(&dets, t0, &mut a, &mut sink),
            Outcome::Fired(_)
        ));
        assert_eq!(
            w.process_frame(&dets, t0 + Duration::from_millis(500), &mut a, &mut sink),
            Outcome::Suppressed(Suppression::TooRecent)
        );
        assert!(matches!(
            w.process_frame(&dets, t0 + Duration::from_millis(1100), &mut a, &mut sink),
            Outcome::Fired(_)
        ));
    }

    #[test]
    fn critical_preempts_running_announcement() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        a.on_speech_start();

        let out = w.process_frame(
            &[det(0, 20.0, 0.9, "person")],
            Instant::now(),
            &mut a,
            &mut sink,
        );
        assert!(matches!(out, Outcome::Fired(_)));
        assert_eq!(sink.cancels, 1);
        assert!(!a.is_speaking());
    }

    #[test]
    fn normal_warning_waits_for_channel() {
        let mut w = warner();
        let mut a = quiet_announcer();
        let mut sink = RecordingSpeech::default();
        a.on_speech_start();

        let out = w.process_frame(
            &[det(0, 45.0, 0.9, "person")],
            Instant::now(),
            &mut a,
            &mut sink,
        );
        assert_eq!(out, Outcome::Suppressed(Suppression::ChannelBusy));
        assert_eq!(sink.cancels, 0);
    }
}
