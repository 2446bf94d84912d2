pub mod input_device {

    use anyhow::Result;
    use enigo::{Axis, Coordinate, Direction, Enigo, Mouse, Settings as EnigoSettings};
    use log::warn;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Button {
        Left,
        Right,
    }

    /// Fire-and-forget OS input surface. Implementations must not surface
    /// errors to callers; injection failures are logged and dropped.
    pub trait InputSink {
        /// `x`/`y` are in [0,1] screen space. `smoothing` is in [0,1];
        /// higher values follow the hand more directly.
        fn move_cursor(&mut self, x: f32, y: f32, smoothing: f32);
        fn button_down(&mut self, button: Button);
        fn button_up(&mut self, button: Button);
        fn click(&mut self, button: Button);
        /// Positive scrolls up.
        fn scroll(&mut self, lines: i32);
    }

    /// Real input injection through enigo, with exponential cursor smoothing
    /// and mapping from [0,1] screen space to display pixels.
    pub struct EnigoInjector {
        enigo: Enigo,
        screen: (i32, i32),
        smoothed: Option<(f32, f32)>,
    }

    impl EnigoInjector {
        pub fn create() -> Result<Self> {
            let enigo = Enigo::new(&EnigoSettings::default())?;
            let screen = enigo.main_display()?;
            log::info!("input injector ready, display {}x{}", screen.0, screen.1);
            Ok(Self {
                enigo,
                screen,
                smoothed: None,
            })
        }

        fn to_enigo(button: Button) -> enigo::Button {
            match button {
                Button::Left => enigo::Button::Left,
                Button::Right => enigo::Button::Right,
            }
        }

        fn press(&mut self, button: Button, direction: Direction) {
            if let Err(e) = self.enigo.button(Self::to_enigo(button), direction) {
                warn!("button injection failed: {e}");
            }
        }
    }

    impl InputSink for EnigoInjector {
        fn move_cursor(&mut self, x: f32, y: f32, smoothing: f32) {
            let alpha = smoothing.clamp(0.0, 1.0);
            let (sx, sy) = match self.smoothed {
                Some((px, py)) => (px + (x - px) * alpha, py + (y - py) * alpha),
                None => (x, y),
            };
            self.smoothed = Some((sx, sy));

            let px = (sx * (self.screen.0 - 1).max(1) as f32).round() as i32;
            let py = (sy * (self.screen.1 - 1).max(1) as f32).round() as i32;
            if let Err(e) = self.enigo.move_mouse(px, py, Coordinate::Abs) {
                warn!("cursor move failed: {e}");
            }
        }

        fn button_down(&mut self, button: Button) {
            self.press(button, Direction::Press);
        }

        fn button_up(&mut self, button: Button) {
            self.press(button, Direction::Release);
        }

        fn click(&mut self, button: Button) {
            self.press(button, Direction::Click);
        }

        fn scroll(&mut self, lines: i32) {
            // enigo's vertical axis is positive-down.
            if let Err(e) = self.enigo.scroll(-lines, Axis::Vertical) {
                warn!("scroll injection failed: {e}");
            }
        }
    }
}
