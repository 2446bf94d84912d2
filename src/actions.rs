//! Action names, the user-editable gesture bindings, and single-shot
//! action invocation.

use std::str::FromStr;

use anyhow::bail;

use crate::classifier::Gesture;
use crate::controller::input_device::{Button, InputSink};
use crate::detector::hand_detector::Landmark;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionName {
    CursorMove,
    ClickHold,
    RightClick,
    ScrollUp,
    ScrollDown,
}

/// Stable resolution order. When two actions are bound to the same gesture
/// (a misconfiguration the console warns about), the first entry here wins.
pub const ALL_ACTIONS: [ActionName; 5] = [
    ActionName::CursorMove,
    ActionName::ClickHold,
    ActionName::RightClick,
    ActionName::ScrollUp,
    ActionName::ScrollDown,
];

impl ActionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CursorMove => "cursor_move",
            Self::ClickHold => "click_hold",
            Self::RightClick => "right_click",
            Self::ScrollUp => "scroll_up",
            Self::ScrollDown => "scroll_down",
        }
    }

    /// Performs the action's immediate side effect. `ClickHold` shares the
    /// cursor-move effect here; its press/release timing lives in the engine.
    pub fn invoke(&self, ctx: &mut ActionContext<'_>) {
        match self {
            Self::CursorMove | Self::ClickHold => {
                let (x, y) = ctx.settings.roi.project(ctx.pointer);
                ctx.sink.move_cursor(x, y, ctx.settings.smoothing_factor);
            }
            Self::RightClick => ctx.sink.click(Button::Right),
            Self::ScrollUp => ctx.sink.scroll(ctx.settings.scroll_speed),
            Self::ScrollDown => ctx.sink.scroll(-ctx.settings.scroll_speed),
        }
    }
}

impl FromStr for ActionName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cursor_move" => Self::CursorMove,
            "click_hold" => Self::ClickHold,
            "right_click" => Self::RightClick,
            "scroll_up" => Self::ScrollUp,
            "scroll_down" => Self::ScrollDown,
            other => bail!("unknown action: {other}"),
        })
    }
}

/// Collaborators an invocation may touch.
pub struct ActionContext<'a> {
    pub sink: &'a mut dyn InputSink,
    pub settings: &'a Settings,
    pub pointer: Landmark,
}

/// The user-editable gesture → action table, stored per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureMap {
    pub cursor_move: Gesture,
    pub click_hold: Gesture,
    pub right_click: Gesture,
    pub scroll_up: Gesture,
    pub scroll_down: Gesture,
}

impl Default for GestureMap {
    fn default() -> Self {
        Self {
            cursor_move: Gesture::Open,
            click_hold: Gesture::Pinch,
            right_click: Gesture::PinchMiddle,
            scroll_up: Gesture::ThumbsUp,
            scroll_down: Gesture::ThumbsDown,
        }
    }
}

impl GestureMap {
    pub fn get(&self, action: ActionName) -> Gesture {
        match action {
            ActionName::CursorMove => self.cursor_move,
            ActionName::ClickHold => self.click_hold,
            ActionName::RightClick => self.right_click,
            ActionName::ScrollUp => self.scroll_up,
            ActionName::ScrollDown => self.scroll_down,
        }
    }

    pub fn set(&mut self, action: ActionName, gesture: Gesture) {
        match action {
            ActionName::CursorMove => self.cursor_move = gesture,
            ActionName::ClickHold => self.click_hold = gesture,
            ActionName::RightClick => self.right_click = gesture,
            ActionName::ScrollUp => self.scroll_up = gesture,
            ActionName::ScrollDown => self.scroll_down = gesture,
        }
    }

    /// Maps the frame's gesture to its bound action. `None` and `Toggle`
    /// never resolve: one is the absence of a gesture, the other is reserved
    /// for pause/resume.
    pub fn resolve(&self, gesture: Gesture) -> Option<ActionName> {
        if matches!(gesture, Gesture::None | Gesture::Toggle) {
            return None;
        }
        ALL_ACTIONS
            .into_iter()
            .find(|&action| self.get(action) == gesture)
    }
}
