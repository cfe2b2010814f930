pub mod announce;
pub mod schedule;
pub mod vibrate;
pub mod warn;

use anyhow::Result;
use sena_proto::events::MotorSide;
use sena_vision::Detection;

/// External text-to-speech engine. `speak` hands the utterance off; the
/// engine reports start/end back through the announcer's notify methods.
pub trait SpeechSink {
    fn speak(&mut self, text: &str, lang: &str) -> Result<()>;
    fn cancel(&mut self);
}

/// External vibration motor driver.
pub trait VibrationSink {
    fn vibrate(&mut self, pulse: &vibrate::Pulse) -> Result<()>;
    fn cancel(&mut self);
}

/// Detections closer together than this are treated as equally near and
/// ranked by confidence instead.
pub const PROXIMITY_TIE_CM: f32 = 5.0;

/// What a channel did with a frame or a deferred entry. Policy suppression
/// and sink failure are distinct outcomes on purpose.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Fired(Firing),
    Suppressed(Suppression),
    /// Sink unavailable or erroring; the alert is dropped, never retried.
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    Disabled,
    ChannelBusy,
    TooRecent,
    NothingInRange,
    Receding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Firing {
    pub class_id: i64,
    pub distance_cm: f32,
    pub text: Option<String>,
    pub pattern_ms: Option<Vec<u64>>,
    pub side: Option<MotorSide>,
}

/// Nearest first; within the tie window, higher confidence wins primacy.
pub fn rank_by_proximity(dets: &mut [&Detection]) {
    dets.sort_by(|a, b| {
        if (a.distance_cm - b.distance_cm).abs() < PROXIMITY_TIE_CM {
            b.conf.total_cmp(&a.conf)
        } else {
            a.distance_cm.total_cmp(&b.distance_cm)
        }
    });
}
