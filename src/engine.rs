//! The gesture/action state machine.
//!
//! `GestureEngine::advance` runs once per processed frame and owns every
//! piece of cross-frame state: the pause toggle, pinch tap/hold/drag
//! tracking, the right-click cooldown, and the scroll throttle. All side
//! effects go through the frame's `InputSink`.

use std::time::{Duration, Instant};

use log::info;

use crate::actions::{ActionContext, ActionName};
use crate::classifier::Gesture;
use crate::controller::input_device::{Button, InputSink};
use crate::detector::hand_detector::Landmark;
use crate::settings::Settings;

/// A pinch held at least this long becomes a press-and-drag.
pub const HOLD_AFTER: Duration = Duration::from_millis(300);

/// A pinch released before this total duration collapses to a single click.
pub const TAP_MAX: Duration = Duration::from_millis(500);

/// Scroll fires only on every Nth processed frame, bounding the OS event
/// rate independently of the camera frame rate.
pub const SCROLL_EVERY_N_FRAMES: u64 = 2;

pub struct GestureEngine {
    program_active: bool,
    toggle_was_active: bool,
    pinch_active: bool,
    pinch_started_at: Option<Instant>,
    pinch_is_held: bool,
    last_cooldown_fire: Option<Instant>,
    frame_counter: u64,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureEngine {
    pub fn new() -> Self {
        Self {
            program_active: true,
            toggle_was_active: false,
            pinch_active: false,
            pinch_started_at: None,
            pinch_is_held: false,
            last_cooldown_fire: None,
            frame_counter: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.program_active
    }

    /// Advances the machine by one processed frame.
    pub fn advance(
        &mut self,
        gesture: Gesture,
        pointer: Landmark,
        now: Instant,
        settings: &Settings,
        sink: &mut dyn InputSink,
    ) {
        self.frame_counter += 1;

        let resolved = settings.bindings.resolve(gesture);

        // A pinch sequence from a previous frame is closed out before this
        // frame's action is considered, even on Toggle frames and while
        // paused. Otherwise a pressed button could be left dangling.
        if self.pinch_active && resolved != Some(ActionName::ClickHold) {
            self.finish_pinch(now, sink);
        }

        // Toggle is edge-triggered and always evaluated, so the user can
        // resume while paused. Nothing else runs on a Toggle frame.
        if gesture == Gesture::Toggle {
            if !self.toggle_was_active {
                self.program_active = !self.program_active;
                info!(
                    "program {}",
                    if self.program_active { "active" } else { "paused" }
                );
            }
            self.toggle_was_active = true;
            return;
        }
        self.toggle_was_active = false;

        if !self.program_active {
            return;
        }

        let Some(action) = resolved else {
            return;
        };
        let mut ctx = ActionContext {
            sink,
            settings,
            pointer,
        };
        match action {
            ActionName::ClickHold => self.drive_pinch(now, &mut ctx),
            ActionName::RightClick => {
                let cooldown = Duration::from_secs_f32(settings.click_cooldown.max(0.0));
                let ready = self
                    .last_cooldown_fire
                    .is_none_or(|last| now.duration_since(last) >= cooldown);
                if ready {
                    action.invoke(&mut ctx);
                    self.last_cooldown_fire = Some(now);
                }
                // A suppressed trigger is dropped, never queued.
            }
            ActionName::ScrollUp | ActionName::ScrollDown => {
                if self.frame_counter % SCROLL_EVERY_N_FRAMES == 0 {
                    action.invoke(&mut ctx);
                }
            }
            ActionName::CursorMove => action.invoke(&mut ctx),
        }
    }

    /// One frame of the tap/hold/drag protocol while the bound gesture is
    /// present. No press is issued on the first frame; a tap and a hold are
    /// only distinguishable once time has passed.
    fn drive_pinch(&mut self, now: Instant, ctx: &mut ActionContext<'_>) {
        if !self.pinch_active {
            self.pinch_active = true;
            self.pinch_started_at = Some(now);
            self.pinch_is_held = false;
        } else if !self.pinch_is_held
            && self
                .pinch_started_at
                .is_some_and(|started| now.duration_since(started) >= HOLD_AFTER)
        {
            ctx.sink.button_down(Button::Left);
            self.pinch_is_held = true;
        }

        // Cursor tracks the hand for the whole sequence (click-and-drag).
        ActionName::ClickHold.invoke(ctx);
    }

    /// Resolves a pinch on the frame its gesture disappears: release if the
    /// press already happened, a discrete click for a quick tap, nothing for
    /// a slow unpressed release.
    fn finish_pinch(&mut self, now: Instant, sink: &mut dyn InputSink) {
        if self.pinch_is_held {
            sink.button_up(Button::Left);
        } else if self
            .pinch_started_at
            .is_some_and(|started| now.duration_since(started) < TAP_MAX)
        {
            sink.click(Button::Left);
        }
        self.pinch_active = false;
        self.pinch_started_at = None;
        self.pinch_is_held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Move(f32, f32),
        Down(Button),
        Up(Button),
        Click(Button),
        Scroll(i32),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<Event>,
    }

    impl RecordingSink {
        fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
            self.events.iter().filter(|e| f(e)).count()
        }
    }

    impl InputSink for RecordingSink {
        fn move_cursor(&mut self, x: f32, y: f32, _smoothing: f32) {
            self.events.push(Event::Move(x, y));
        }
        fn button_down(&mut self, button: Button) {
            self.events.push(Event::Down(button));
        }
        fn button_up(&mut self, button: Button) {
            self.events.push(Event::Up(button));
        }
        fn click(&mut self, button: Button) {
            self.events.push(Event::Click(button));
        }
        fn scroll(&mut self, lines: i32) {
            self.events.push(Event::Scroll(lines));
        }
    }

    const FRAME: Duration = Duration::from_millis(50);

    fn pointer() -> Landmark {
        Landmark { x: 0.7, y: 0.7 }
    }

    /// Feeds `gesture` for `frames` consecutive frames starting at `start`,
    /// returning the timestamp after the last frame.
    fn run(
        engine: &mut GestureEngine,
        sink: &mut RecordingSink,
        settings: &Settings,
        gesture: Gesture,
        frames: usize,
        start: Instant,
    ) -> Instant {
        let mut now = start;
        for _ in 0..frames {
            engine.advance(gesture, pointer(), now, settings, sink);
            now += FRAME;
        }
        now
    }

    #[test]
    fn toggle_is_edge_triggered() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // Held for ten frames: exactly one flip.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Toggle, 10, start);
        assert!(!engine.is_active());

        // Released, then held again: one more flip.
        let now = run(&mut engine, &mut sink, &settings, Gesture::None, 3, now);
        run(&mut engine, &mut sink, &settings, Gesture::Toggle, 5, now);
        assert!(engine.is_active());
    }

    #[test]
    fn quick_pinch_is_a_single_click() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // 0.2s of pinch (4 frames at 50ms), then release.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 4, start);
        run(&mut engine, &mut sink, &settings, Gesture::None, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Click(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Down(_))), 0);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(_))), 0);
    }

    #[test]
    fn long_pinch_is_press_drag_release() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // 1.0s of pinch (20 frames), then release.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 20, start);
        run(&mut engine, &mut sink, &settings, Gesture::None, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Down(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Click(_))), 0);
        // Cursor tracked the hand on every pinch frame.
        assert_eq!(sink.count(|e| matches!(e, Event::Move(..))), 20);

        // The press lands once 0.3s have elapsed, before any release.
        let down_at = sink
            .events
            .iter()
            .position(|e| matches!(e, Event::Down(_)))
            .unwrap();
        let up_at = sink
            .events
            .iter()
            .position(|e| matches!(e, Event::Up(_)))
            .unwrap();
        assert!(down_at < up_at);
    }

    #[test]
    fn pinch_in_hold_window_releases_instead_of_clicking() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // 0.4s: past the press threshold, short of the tap cutoff. The press
        // already happened, so release must win over tap.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 8, start);
        run(&mut engine, &mut sink, &settings, Gesture::None, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Down(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Click(_))), 0);
    }

    #[test]
    fn pinch_resolves_on_transition_to_another_mapped_gesture() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 2, start);
        // Switching straight to an open hand still resolves the tap.
        run(&mut engine, &mut sink, &settings, Gesture::Open, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Click(Button::Left))), 1);
    }

    #[test]
    fn quick_pinch_into_toggle_clicks_then_pauses() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // A tap-length pinch interrupted by Toggle: the tap still resolves
        // on the Toggle frame, and the pause takes effect.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 4, start);
        run(&mut engine, &mut sink, &settings, Gesture::Toggle, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Click(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Down(_))), 0);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(_))), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn held_pinch_into_toggle_releases_the_button() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        // 1.0s of pinch, so the press has landed, then Toggle. The button
        // must not stay pressed across the pause.
        let now = run(&mut engine, &mut sink, &settings, Gesture::Pinch, 20, start);
        run(&mut engine, &mut sink, &settings, Gesture::Toggle, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Down(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Click(_))), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn right_click_cooldown_limits_rate() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        assert_eq!(settings.click_cooldown, 1.0);
        let start = Instant::now();

        // 2.5s of the bound gesture at 20fps: fires at t=0, 1.0, 2.0.
        run(
            &mut engine,
            &mut sink,
            &settings,
            Gesture::PinchMiddle,
            50,
            start,
        );
        assert_eq!(sink.count(|e| matches!(e, Event::Click(Button::Right))), 3);
    }

    #[test]
    fn scroll_fires_every_second_frame() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        run(
            &mut engine,
            &mut sink,
            &settings,
            Gesture::ThumbsUp,
            10,
            start,
        );
        assert_eq!(sink.count(|e| matches!(e, Event::Scroll(_))), 5);
        assert!(sink
            .events
            .iter()
            .all(|e| matches!(e, Event::Scroll(lines) if *lines == settings.scroll_speed)));
    }

    #[test]
    fn scroll_down_is_negative() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        run(
            &mut engine,
            &mut sink,
            &settings,
            Gesture::ThumbsDown,
            2,
            Instant::now(),
        );
        assert_eq!(sink.events, vec![Event::Scroll(-settings.scroll_speed)]);
    }

    #[test]
    fn paused_engine_suppresses_everything_but_toggle() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();
        let start = Instant::now();

        let now = run(&mut engine, &mut sink, &settings, Gesture::Toggle, 1, start);
        assert!(!engine.is_active());
        let now = run(&mut engine, &mut sink, &settings, Gesture::None, 1, now);

        let gestures = [
            Gesture::Pinch,
            Gesture::PinchMiddle,
            Gesture::ThumbsUp,
            Gesture::ThumbsDown,
            Gesture::Open,
        ];
        let mut t = now;
        for gesture in gestures {
            t = run(&mut engine, &mut sink, &settings, gesture, 4, t);
            t = run(&mut engine, &mut sink, &settings, Gesture::None, 1, t);
        }
        assert!(sink.events.is_empty());

        // Toggle still resumes.
        run(&mut engine, &mut sink, &settings, Gesture::Toggle, 1, t);
        assert!(engine.is_active());
    }

    #[test]
    fn cursor_move_projects_through_roi() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let settings = Settings::default();

        // Default ROI is x,y in [0.5, 0.9]; the pointer at (0.7, 0.7) lands
        // at the middle of the screen.
        run(
            &mut engine,
            &mut sink,
            &settings,
            Gesture::Open,
            1,
            Instant::now(),
        );
        match sink.events.as_slice() {
            [Event::Move(x, y)] => {
                assert!((x - 0.5).abs() < 1e-5);
                assert!((y - 0.5).abs() < 1e-5);
            }
            other => panic!("expected one move, got {other:?}"),
        }
    }

    #[test]
    fn rebound_hold_gesture_drives_the_pinch_protocol() {
        let mut engine = GestureEngine::new();
        let mut sink = RecordingSink::default();
        let mut settings = Settings::default();
        // User rebinds the hold-click to the middle-finger pinch.
        settings.bindings.set(ActionName::ClickHold, Gesture::PinchMiddle);
        settings.bindings.set(ActionName::RightClick, Gesture::None);
        let start = Instant::now();

        let now = run(
            &mut engine,
            &mut sink,
            &settings,
            Gesture::PinchMiddle,
            20,
            start,
        );
        run(&mut engine, &mut sink, &settings, Gesture::None, 1, now);

        assert_eq!(sink.count(|e| matches!(e, Event::Down(Button::Left))), 1);
        assert_eq!(sink.count(|e| matches!(e, Event::Up(Button::Left))), 1);
    }
}
