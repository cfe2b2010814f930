use serde::{Deserialize, Serialize};

/// Steering hint relayed to the realtime channel for the haptic belt/motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Steering {
    Left,
    Right,
    Both,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorSide {
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    Voice,
    Vibration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionUpdate {
    pub ts_unix_ms: i64,
    pub direction: Steering,
    pub confidence: f32,
    pub object: String,
    pub min_distance_cm: Option<f32>,
}

/// One detection as handed to the external renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub class_id: i64,
    pub label: String,
    pub confidence: f32,
    pub distance_cm: f32,
    pub distance_text: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub is_wall: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub ts_unix_ms: i64,
    pub detections: Vec<DetectionReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub ts_unix_ms: i64,
    pub channel: AlertChannel,
    pub class_id: i64,
    pub distance_cm: f32,
    /// Utterance text (voice channel only).
    pub text: Option<String>,
    /// Pulse waveform in ms on/off pairs (vibration channel only).
    pub pattern_ms: Option<Vec<u64>>,
    pub side: Option<MotorSide>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steering_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Steering::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Steering::None).unwrap(), "\"none\"");
    }

    #[test]
    fn alert_event_roundtrip() {
        let ev = AlertEvent {
            ts_unix_ms: 1_700_000_000_000,
            channel: AlertChannel::Vibration,
            class_id: 2,
            distance_cm: 120.0,
            text: None,
            pattern_ms: Some(vec![300, 400, 300, 400]),
            side: Some(MotorSide::Left),
        };
        let s = serde_json::to_string(&ev).unwrap();
        let back: AlertEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back.channel, AlertChannel::Vibration);
        assert_eq!(back.pattern_ms.as_deref(), Some(&[300, 400, 300, 400][..]));
    }
}
