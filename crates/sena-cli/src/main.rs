use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use sena_alert::announce::{AnnounceConfig, Announcer};
use sena_alert::vibrate::{Pulse, VibrateConfig, Vibrator};
use sena_alert::warn::{CollisionWarner, WarnConfig};
use sena_alert::{Firing, Outcome, SpeechSink, VibrationSink};
use sena_proto::events::{AlertChannel, AlertEvent, DetectionReport, DirectionUpdate, FrameReport};
use sena_vision::direction::{DirectionRelay, SteeringDecision, DEFAULT_RELAY_INTERVAL};
use sena_vision::{decode, distance, hazard, labels, Detection, PipelineConfig, Postprocessor, TensorFrame};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "sena", version, about = "SENAVISION - obstacle detection core for assisted navigation")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration and calibration tables.
    Doctor,
    /// Decode one dumped tensor frame and print the enriched detections.
    Decode {
        #[arg(long)]
        frame: String,
    },
    /// Drive the full pipeline over a directory of dumped frames, emitting
    /// reports and alert events as JSON lines on stdout.
    Run {
        #[arg(long)]
        frames: String,
        /// Pause between frames, matching the capture cadence.
        #[arg(long, default_value_t = 100)]
        tick_ms: u64,
    },
    /// Derive a focal length from a measured distance to a known object.
    Calibrate {
        #[arg(long)]
        known_distance_cm: f32,
        #[arg(long)]
        class_id: i64,
        #[arg(long)]
        bbox_w: f32,
        #[arg(long)]
        bbox_h: f32,
    },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    pipeline: PipelineCfg,
    voice: Option<VoiceCfg>,
    collision: Option<CollisionCfg>,
    vibration: Option<VibrationCfg>,
    relay: Option<RelayCfg>,
}

#[derive(Debug, serde::Deserialize)]
struct PipelineCfg {
    canvas_w: f32,
    canvas_h: f32,
    focal_length_px: Option<f32>,
    wall_min_frame_fraction: Option<f32>,
    nms_iou_threshold: Option<f32>,
}

#[derive(Debug, serde::Deserialize)]
struct VoiceCfg {
    enabled: bool,
    distance_threshold_cm: f32,
    min_interval_ms: u64,
    language: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CollisionCfg {
    enabled: bool,
    warning_threshold_cm: f32,
    critical_threshold_cm: f32,
    min_interval_ms: u64,
}

#[derive(Debug, serde::Deserialize)]
struct VibrationCfg {
    enabled: bool,
    distance_threshold_cm: f32,
    cooldown_ms: u64,
}

#[derive(Debug, serde::Deserialize)]
struct RelayCfg {
    enabled: bool,
    min_interval_ms: Option<u64>,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg),
        Command::Decode { frame } => decode_cmd(&cfg, &frame),
        Command::Run { frames, tick_ms } => run(&cfg, &frames, tick_ms).await,
        Command::Calibrate {
            known_distance_cm,
            class_id,
            bbox_w,
            bbox_h,
        } => calibrate(&cfg, known_distance_cm, class_id, bbox_w, bbox_h),
    }
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    anyhow::ensure!(cfg.pipeline.canvas_w > 0.0, "pipeline.canvas_w must be positive");
    anyhow::ensure!(cfg.pipeline.canvas_h > 0.0, "pipeline.canvas_h must be positive");
    let focal = cfg.pipeline.focal_length_px.unwrap_or(distance::DEFAULT_FOCAL_LENGTH_PX);
    anyhow::ensure!(focal > 0.0, "pipeline.focal_length_px must be positive");
    let frac = cfg
        .pipeline
        .wall_min_frame_fraction
        .unwrap_or(hazard::DEFAULT_WALL_MIN_FRAME_FRACTION);
    anyhow::ensure!(
        frac > 0.0 && frac <= 1.0,
        "pipeline.wall_min_frame_fraction must be in (0, 1]"
    );
    let iou = cfg.pipeline.nms_iou_threshold.unwrap_or(decode::NMS_IOU_THRESHOLD);
    anyhow::ensure!(
        (0.0..=1.0).contains(&iou),
        "pipeline.nms_iou_threshold must be in [0, 1]"
    );

    if let Some(v) = &cfg.voice {
        anyhow::ensure!(v.distance_threshold_cm > 0.0, "voice.distance_threshold_cm must be positive");
        anyhow::ensure!(v.min_interval_ms > 0, "voice.min_interval_ms must be positive");
    }
    if let Some(c) = &cfg.collision {
        anyhow::ensure!(
            c.critical_threshold_cm > 0.0 && c.critical_threshold_cm < c.warning_threshold_cm,
            "collision thresholds must satisfy 0 < critical < warning"
        );
    }
    if let Some(v) = &cfg.vibration {
        anyhow::ensure!(v.distance_threshold_cm > 0.0, "vibration.distance_threshold_cm must be positive");
    }

    // Calibration table sanity: every mapped class has positive dimensions.
    for id in 0..labels::CLASS_NAMES.len() as i64 {
        let size = distance::size_for_class(id);
        anyhow::ensure!(
            size.width > 0.0 && size.height > 0.0,
            "size profile for class {id} is degenerate"
        );
    }

    info!("doctor: OK");
    Ok(())
}

fn decode_cmd(cfg: &Config, frame_path: &str) -> Result<()> {
    let pp = init_postprocessor(cfg);
    let frame = load_frame(Path::new(frame_path))?;
    let dets = pp.process(&frame).context("decode frame")?;

    for d in &dets {
        println!(
            "{:<24} {:>5.1}%  {:>9}  box=({:.1},{:.1})-({:.1},{:.1}){}",
            labels::capitalize(&d.label),
            d.conf * 100.0,
            distance::format_distance(d.distance_cm),
            d.x0,
            d.y0,
            d.x1,
            d.y1,
            if d.is_wall { "  WALL" } else { "" },
        );
    }
    let steering = sena_vision::direction::steer(&dets);
    println!(
        "steering: {:?} (confidence {:.2}, object {})",
        steering.direction, steering.confidence, steering.object
    );
    Ok(())
}

fn calibrate(cfg: &Config, known_distance_cm: f32, class_id: i64, bbox_w: f32, bbox_h: f32) -> Result<()> {
    let focal = distance::calibrate_focal_length(
        known_distance_cm,
        class_id,
        bbox_w,
        bbox_h,
        cfg.pipeline.canvas_w,
    );
    anyhow::ensure!(focal > 0.0, "calibration inputs are degenerate");
    println!("focal_length_px = {}", focal.round() as i64);
    info!("set [pipeline].focal_length_px to {} in the config", focal.round() as i64);
    Ok(())
}

async fn run(cfg: &Config, frames_dir: &str, tick_ms: u64) -> Result<()> {
    info!("run: starting");

    let pp = init_postprocessor(cfg);
    let mut announcer = init_announcer(cfg);
    let mut warner = init_warner(cfg);
    let mut vibrator = init_vibrator(cfg);
    let mut relay = init_relay(cfg);

    let mut speech = ConsoleSpeech;
    let mut motor = ConsoleMotor;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(frames_dir)
        .with_context(|| format!("read frames dir {frames_dir}"))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    paths.sort();
    anyhow::ensure!(!paths.is_empty(), "no frame dumps in {frames_dir}");

    for path in &paths {
        let frame = match load_frame(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                continue;
            }
        };

        // A malformed tensor drops this frame only.
        let dets = match pp.process(&frame) {
            Ok(d) => d,
            Err(e) => {
                warn!("frame {} dropped: {e}", path.display());
                continue;
            }
        };

        let now = Instant::now();
        emit(&frame_report(&dets))?;

        // Collision warnings first: they may preempt a normal utterance.
        if let Some(w) = warner.as_mut() {
            report_voice(w.process_frame(&dets, now, &mut announcer, &mut speech))?;
        }
        report_voice(announcer.process_frame(&dets, now, &mut speech))?;
        report_vibration(vibrator.process_frame(&dets, now, &mut motor))?;

        if let Some(r) = relay.as_mut() {
            if let Some(decision) = r.maybe_steer(&dets, now) {
                emit(&direction_update(&decision))?;
            }
        }

        tokio::time::sleep(Duration::from_millis(tick_ms)).await;

        // Deferred alerts come due between frames and revalidate on fire.
        let later = Instant::now();
        for outcome in announcer.poll(later, &mut speech) {
            report_voice(outcome)?;
        }
        for outcome in vibrator.poll(later, &mut motor) {
            report_vibration(outcome)?;
        }
    }

    info!("run: finished {} frames", paths.len());
    Ok(())
}

fn load_frame(path: &Path) -> Result<TensorFrame> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?)
}

fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn frame_report(dets: &[Detection]) -> FrameReport {
    FrameReport {
        ts_unix_ms: now_unix_ms(),
        detections: dets
            .iter()
            .map(|d| DetectionReport {
                class_id: d.class_id,
                label: labels::capitalize(&d.label),
                confidence: d.conf,
                distance_cm: d.distance_cm,
                distance_text: distance::format_distance(d.distance_cm),
                x0: d.x0,
                y0: d.y0,
                x1: d.x1,
                y1: d.y1,
                is_wall: d.is_wall,
            })
            .collect(),
    }
}

fn direction_update(decision: &SteeringDecision) -> DirectionUpdate {
    DirectionUpdate {
        ts_unix_ms: now_unix_ms(),
        direction: decision.direction,
        confidence: decision.confidence,
        object: decision.object.clone(),
        min_distance_cm: decision.min_distance_cm,
    }
}

fn report_voice(outcome: Outcome) -> Result<()> {
    report_alert(outcome, AlertChannel::Voice)
}

fn report_vibration(outcome: Outcome) -> Result<()> {
    report_alert(outcome, AlertChannel::Vibration)
}

fn report_alert(outcome: Outcome, channel: AlertChannel) -> Result<()> {
    let Outcome::Fired(firing) = outcome else {
        return Ok(());
    };
    let Firing {
        class_id,
        distance_cm,
        text,
        pattern_ms,
        side,
    } = firing;
    emit(&AlertEvent {
        ts_unix_ms: now_unix_ms(),
        channel,
        class_id,
        distance_cm,
        text,
        pattern_ms,
        side,
    })
}

fn emit<T: serde::Serialize>(event: &T) -> Result<()> {
    println!("{}", serde_json::to_string(event).context("serialize event")?);
    Ok(())
}

// --- sink adapters ---

/// Stand-in speech engine for operating the core from a terminal. A real
/// deployment injects the platform TTS here.
struct ConsoleSpeech;

impl SpeechSink for ConsoleSpeech {
    fn speak(&mut self, text: &str, lang: &str) -> Result<()> {
        info!("voice [{lang}]: {text}");
        Ok(())
    }

    fn cancel(&mut self) {
        info!("voice: cancelled");
    }
}

struct ConsoleMotor;

impl VibrationSink for ConsoleMotor {
    fn vibrate(&mut self, pulse: &Pulse) -> Result<()> {
        info!("vibration [{:?}]: {:?}ms", pulse.side, pulse.pattern_ms);
        Ok(())
    }

    fn cancel(&mut self) {
        info!("vibration: cancelled");
    }
}

// --- init helpers ---

fn init_postprocessor(cfg: &Config) -> Postprocessor {
    Postprocessor::new(PipelineConfig {
        canvas_w: cfg.pipeline.canvas_w,
        canvas_h: cfg.pipeline.canvas_h,
        focal_length_px: cfg
            .pipeline
            .focal_length_px
            .unwrap_or(distance::DEFAULT_FOCAL_LENGTH_PX),
        wall_min_frame_fraction: cfg
            .pipeline
            .wall_min_frame_fraction
            .unwrap_or(hazard::DEFAULT_WALL_MIN_FRAME_FRACTION),
        nms_iou_threshold: cfg
            .pipeline
            .nms_iou_threshold
            .unwrap_or(decode::NMS_IOU_THRESHOLD),
    })
}

fn init_announcer(cfg: &Config) -> Announcer {
    let Some(v) = &cfg.voice else {
        return Announcer::new(AnnounceConfig::default());
    };
    Announcer::new(AnnounceConfig {
        enabled: v.enabled,
        distance_threshold_cm: v.distance_threshold_cm,
        min_interval: Duration::from_millis(v.min_interval_ms),
        language: v.language.clone().unwrap_or_else(|| "id-ID".to_string()),
    })
}

fn init_warner(cfg: &Config) -> Option<CollisionWarner> {
    let c = cfg.collision.as_ref()?;
    Some(CollisionWarner::new(WarnConfig {
        enabled: c.enabled,
        warning_threshold_cm: c.warning_threshold_cm,
        critical_threshold_cm: c.critical_threshold_cm,
        min_interval: Duration::from_millis(c.min_interval_ms),
        language: "id-ID".to_string(),
    }))
}

fn init_vibrator(cfg: &Config) -> Vibrator {
    let Some(v) = &cfg.vibration else {
        return Vibrator::new(VibrateConfig::default());
    };
    Vibrator::new(VibrateConfig {
        enabled: v.enabled,
        distance_threshold_cm: v.distance_threshold_cm,
        cooldown: Duration::from_millis(v.cooldown_ms),
    })
}

fn init_relay(cfg: &Config) -> Option<DirectionRelay> {
    let r = cfg.relay.as_ref()?;
    if !r.enabled {
        return None;
    }
    let interval = r
        .min_interval_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_RELAY_INTERVAL);
    Some(DirectionRelay::new(interval))
}
