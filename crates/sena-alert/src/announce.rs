//! Voice announcement channel: names the nearest in-range object, rate
//! limited per class, one utterance at a time. Secondary objects from the
//! same frame are staggered through the deferred queue.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sena_vision::{labels, Detection};

use crate::schedule::DeferredQueue;
use crate::{rank_by_proximity, Firing, Outcome, SpeechSink, Suppression};

/// Offset between staggered announcements of one frame.
pub const DEFERRED_STAGGER: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    pub enabled: bool,
    /// Objects at or under this distance are announced. Deployments run this
    /// anywhere between 50 and 100 cm.
    pub distance_threshold_cm: f32,
    /// Per-class re-announcement interval, typically 2000-3000 ms.
    pub min_interval: Duration,
    pub language: String,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance_threshold_cm: 100.0,
            min_interval: Duration::from_millis(3000),
            language: "id-ID".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingAnnouncement {
    pub class_id: i64,
    pub label: String,
    pub distance_cm: f32,
}

impl PendingAnnouncement {
    fn from_detection(d: &Detection) -> Self {
        Self {
            class_id: d.class_id,
            label: d.label.clone(),
            distance_cm: d.distance_cm,
        }
    }
}

/// One per detection session. The speech engine drives `on_speech_start` /
/// `on_speech_end`; everything else is synchronous per frame.
#[derive(Debug)]
pub struct Announcer {
    cfg: AnnounceConfig,
    last_announce: HashMap<i64, Instant>,
    speaking: bool,
    deferred: DeferredQueue<PendingAnnouncement>,
}

impl Announcer {
    pub fn new(cfg: AnnounceConfig) -> Self {
        Self {
            cfg,
            last_announce: HashMap::new(),
            speaking: false,
            deferred: DeferredQueue::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.deferred.next_due()
    }

    pub fn on_speech_start(&mut self) {
        self.speaking = true;
    }

    pub fn on_speech_end(&mut self) {
        self.speaking = false;
    }

    /// Disabling cancels the in-flight utterance and the whole deferred
    /// group so nothing stale fires after re-enable.
    pub fn set_enabled(&mut self, enabled: bool, sink: &mut dyn SpeechSink) {
        self.cfg.enabled = enabled;
        if !enabled {
            sink.cancel();
            self.speaking = false;
            self.deferred.clear();
        }
    }

    /// User-invoked reset of the dedup state.
    pub fn reset(&mut self) {
        self.last_announce.clear();
        self.deferred.clear();
    }

    /// Announce the primary (nearest, confidence tie-broken) in-range object
    /// and defer the rest of the frame, each revalidated at fire time.
    pub fn process_frame(
        &mut self,
        dets: &[Detection],
        now: Instant,
        sink: &mut dyn SpeechSink,
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
            self.deferred.schedule(
                now + DEFERRED_STAGGER * i as u32,
                PendingAnnouncement::from_detection(d),
            );
        }
        if near.len() > 1 {
            debug!(deferred = near.len() - 1, "staggered secondary announcements");
        }

        let primary = PendingAnnouncement::from_detection(near[0]);
        self.try_announce(&primary, now, sink)
    }

    /// Fire deferred announcements that have come due, re-checking the
    /// suppression rules now rather than at schedule time.
    pub fn poll(&mut self, now: Instant, sink: &mut dyn SpeechSink) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Some(pending) = self.deferred.pop_due(now) {
            outcomes.push(self.try_announce(&pending, now, sink));
        }
        outcomes
    }

    fn try_announce(
        &mut self,
        pending: &PendingAnnouncement,
        now: Instant,
        sink: &mut dyn SpeechSink,
    ) -> Outcome {
        if !self.cfg.enabled {
            return Outcome::Suppressed(Suppression::Disabled);
        }
        if let Some(last) = self.last_announce.get(&pending.class_id) {
            if now.duration_since(*last) < self.cfg.min_interval {
                return Outcome::Suppressed(Suppression::TooRecent);
            }
        }
        if self.speaking {
            return Outcome::Suppressed(Suppression::ChannelBusy);
        }

        let text = labels::localize_label(&pending.label);
        match sink.speak(&text, &self.cfg.language) {
            Ok(()) => {
                self.last_announce.insert(pending.class_id, now);
                Outcome::Fired(Firing {
                    class_id: pending.class_id,
                    distance_cm: pending.distance_cm,
                    text: Some(text),
                    pattern_ms: None,
                    side: None,
                })
            }
            Err(e) => {
                warn!(label = %pending.label, "announcement dropped: {e:#}");
                Outcome::Dropped
            }
        }
    }
}
