//! Live-tunable settings and the control console.
//!
//! The frame loop reads a fresh snapshot every frame; the console thread
//! publishes whole new snapshots. The mutex guards only the `Arc` swap, so
//! a settings write can never stall a frame. Field defaults mirror the
//! settings sliders this replaces.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use crate::actions::{ALL_ACTIONS, ActionName, GestureMap};
use crate::classifier::Gesture;
use crate::detector::hand_detector::Landmark;

/// The camera-frame rectangle mapped onto the full screen for cursor control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for Roi {
    fn default() -> Self {
        Self {
            x_min: 0.5,
            x_max: 0.9,
            y_min: 0.5,
            y_max: 0.9,
        }
    }
}

impl Roi {
    /// Maps a normalized camera-space point into [0,1] screen space,
    /// clamped to the rectangle.
    pub fn project(&self, p: Landmark) -> (f32, f32) {
        fn axis(v: f32, lo: f32, hi: f32) -> f32 {
            let span = hi - lo;
            if span <= f32::EPSILON {
                return 0.5;
            }
            ((v - lo) / span).clamp(0.0, 1.0)
        }
        (
            axis(p.x, self.x_min, self.x_max),
            axis(p.y, self.y_min, self.y_max),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Thumb-to-fingertip distance below which a pinch registers.
    pub pinch_threshold: f32,
    /// Minimum seconds between right-click firings.
    pub click_cooldown: f32,
    /// Cursor smoothing in [0,1]; higher is more responsive.
    pub smoothing_factor: f32,
    /// Detections scoring below this are discarded.
    pub min_confidence: f32,
    /// Lines per scroll event.
    pub scroll_speed: i32,
    pub roi: Roi,
    pub bindings: GestureMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.05,
            click_cooldown: 1.0,
            smoothing_factor: 0.2,
            min_confidence: 0.7,
            scroll_speed: 3,
            roi: Roi::default(),
            bindings: GestureMap::default(),
        }
    }
}

/// Snapshot handoff between the console thread and the frame loop.
#[derive(Default)]
pub struct SettingsHandle {
    inner: Mutex<Arc<Settings>>,
}

impl SettingsHandle {
    /// Returns the most recently published snapshot.
    pub fn load(&self) -> Arc<Settings> {
        self.lock().clone()
    }

    /// Publishes a new snapshot derived from the current one.
    pub fn update(&self, apply: impl FnOnce(&mut Settings)) {
        let mut guard = self.lock();
        let mut next = Settings::clone(&guard);
        apply(&mut next);
        *guard = Arc::new(next);
    }

    fn lock(&self) -> MutexGuard<'_, Arc<Settings>> {
        // A poisoned lock still holds a valid snapshot pointer.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

enum ConsoleOutcome {
    Continue,
    Quit,
}

/// Spawns the line-oriented control console on stdin. Accepted commands
/// publish a new settings snapshot; `quit` flips the shared quit flag.
pub fn spawn_console(
    settings: Arc<SettingsHandle>,
    quit: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match run_command(line.trim(), &settings) {
                Ok(ConsoleOutcome::Quit) => {
                    quit.store(true, Ordering::SeqCst);
                    break;
                }
                Ok(ConsoleOutcome::Continue) => {}
                Err(e) => warn!("console: {e:#}"),
            }
        }
    })
}

fn run_command(line: &str, settings: &SettingsHandle) -> Result<ConsoleOutcome> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => Ok(ConsoleOutcome::Continue),
        Some("quit") => Ok(ConsoleOutcome::Quit),
        Some("show") => {
            info!("{:#?}", settings.load());
            Ok(ConsoleOutcome::Continue)
        }
        Some("set") => {
            let field = parts.next().context("usage: set <field> <value>")?;
            let value = parts.next().context("usage: set <field> <value>")?;
            set_field(settings, field, value)?;
            Ok(ConsoleOutcome::Continue)
        }
        Some("bind") => {
            let action: ActionName = parts
                .next()
                .context("usage: bind <action> <gesture>")?
                .parse()?;
            let gesture: Gesture = parts
                .next()
                .context("usage: bind <action> <gesture>")?
                .parse()?;
            bind(settings, action, gesture)?;
            Ok(ConsoleOutcome::Continue)
        }
        Some(other) => bail!("unknown command: {other}"),
    }
}

fn set_field(settings: &SettingsHandle, field: &str, value: &str) -> Result<()> {
    let parse_f32 = || -> Result<f32> {
        value
            .parse()
            .with_context(|| format!("{field} expects a number, got {value:?}"))
    };

    match field {
        "pinch_threshold" => {
            let v = parse_f32()?;
            settings.update(|s| s.pinch_threshold = v);
        }
        "click_cooldown" => {
            let v = parse_f32()?;
            settings.update(|s| s.click_cooldown = v);
        }
        "smoothing_factor" => {
            let v = parse_f32()?;
            settings.update(|s| s.smoothing_factor = v);
        }
        "min_confidence" => {
            let v = parse_f32()?;
            settings.update(|s| s.min_confidence = v);
        }
        "scroll_speed" => {
            let v: i32 = value
                .parse()
                .with_context(|| format!("scroll_speed expects an integer, got {value:?}"))?;
            settings.update(|s| s.scroll_speed = v);
        }
        "roi_x_min" => {
            let v = parse_f32()?;
            settings.update(|s| s.roi.x_min = v);
        }
        "roi_x_max" => {
            let v = parse_f32()?;
            settings.update(|s| s.roi.x_max = v);
        }
        "roi_y_min" => {
            let v = parse_f32()?;
            settings.update(|s| s.roi.y_min = v);
        }
        "roi_y_max" => {
            let v = parse_f32()?;
            settings.update(|s| s.roi.y_max = v);
        }
        other => bail!("unknown setting: {other}"),
    }
    info!("set {field} = {value}");
    Ok(())
}

fn bind(settings: &SettingsHandle, action: ActionName, gesture: Gesture) -> Result<()> {
    if gesture == Gesture::Toggle {
        bail!("toggle is reserved for pause/resume and cannot be bound");
    }

    let current = settings.load();
    for other in ALL_ACTIONS {
        if other != action && gesture != Gesture::None && current.bindings.get(other) == gesture {
            warn!(
                "{} is already bound to {}; the first action in resolution order wins",
                gesture.as_str(),
                other.as_str()
            );
        }
    }

    settings.update(|s| s.bindings.set(action, gesture));
    info!("bound {} to {}", action.as_str(), gesture.as_str());
    Ok(())
}
