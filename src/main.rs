use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use minifb::{Key, Window, WindowOptions};

use handctl::classifier::{self, HandPose};
use handctl::controller::input_device::EnigoInjector;
use handctl::detector::hand_detector::{HandDetector, landmarks};
use handctl::engine::GestureEngine;
use handctl::geometry;
use handctl::sensor::webcam;
use handctl::settings::{self, SettingsHandle};

const WINDOW_WIDTH: usize = 960;
const WINDOW_HEIGHT: usize = 540;

const LANDMARK_COLOR: u32 = 0x0000FF;
const ACTIVE_COLOR: u32 = 0x00FF00;
const PAUSED_COLOR: u32 = 0xFF0000;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Live settings and the shared quit flag. Every shutdown trigger
    // (Escape, window close, console `quit`, capture failure) sets the same
    // flag; setting it more than once is harmless.
    let settings = Arc::new(SettingsHandle::default());
    let quit = Arc::new(AtomicBool::new(false));
    let _console = settings::spawn_console(settings.clone(), quit.clone());

    // Start camera
    let mut camera = webcam::setup()?;
    camera.open_stream()?;

    // Setup window
    let mut window = Window::new(
        "handctl v0.1.0",
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        WindowOptions::default(),
    )?;

    // Pre-allocate the pixel buffer to avoid allocating a new vector every frame
    let mut buffer_u32 = vec![0u32; WINDOW_WIDTH * WINDOW_HEIGHT];

    // Limit fps to reduce CPU usage and potential instability
    let fps = 30;
    window.limit_update_rate(Some(Duration::from_micros(1000000 / fps as u64)));

    // Load detector model
    let mut detector = HandDetector::new("models/hand_landmark.onnx")?;

    // Setup Input Device
    let mut injector = EnigoInjector::create()?;

    let mut engine = GestureEngine::new();

    // THE WINDOW UPDATE LOOP
    while window.is_open() && !window.is_key_down(Key::Escape) && !quit.load(Ordering::SeqCst) {
        // Settings are a live control: read a fresh snapshot every frame.
        let snapshot = settings.load();

        let decoded_frame = match webcam::capture_and_decode_frame(&mut camera) {
            Ok(frame) => frame,
            Err(e) => {
                // No frame means the session is over, not a per-frame blip.
                error!("Capture failed, shutting down: {}", e);
                quit.store(true, Ordering::SeqCst);
                continue;
            }
        };

        // Mirror for selfie view so cursor motion matches hand motion.
        let mirrored = image::imageops::flip_horizontal(&decoded_frame);
        let resized_frame = image::imageops::resize(
            &mirrored,
            WINDOW_WIDTH as u32,
            WINDOW_HEIGHT as u32,
            image::imageops::FilterType::Nearest,
        );

        let raw_data = resized_frame.as_raw();

        // Pixel Conversion //
        // The camera gives us a long list of u8 bytes: [R, G, B, R, G, B...]
        // The window wants u32 integers: [00RGB, 00RGB...]
        if raw_data.len() != WINDOW_WIDTH * WINDOW_HEIGHT * 3 {
            warn!(
                "Buffer size mismatch: Expected {}, got {}",
                WINDOW_WIDTH * WINDOW_HEIGHT * 3,
                raw_data.len()
            );
            continue;
        }

        for (i, chunk) in raw_data.chunks_exact(3).enumerate() {
            let r = chunk[0] as u32;
            let g = chunk[1] as u32;
            let b = chunk[2] as u32;
            buffer_u32[i] = (r << 16) | (g << 8) | b;
        }

        let hands = match detector.detect(&resized_frame, snapshot.min_confidence) {
            Ok(hands) => hands,
            Err(e) => {
                error!("Detector failed, shutting down: {}", e);
                quit.store(true, Ordering::SeqCst);
                continue;
            }
        };

        // The first hand in detector order wins; any others are ignored for
        // this frame so conflicting cursor writes cannot race.
        if let Some(hand) = hands.first() {
            if let Some(fingers) = geometry::finger_states(&hand.landmarks) {
                let pose = HandPose {
                    points: &hand.landmarks,
                    fingers,
                    pinch_threshold: snapshot.pinch_threshold,
                };
                let gesture = classifier::classify(&pose);
                let pointer = hand.landmarks[landmarks::INDEX_FINGER_TIP];
                engine.advance(gesture, pointer, Instant::now(), &snapshot, &mut injector);

                for point in &hand.landmarks {
                    draw_dot(
                        &mut buffer_u32,
                        (point.x * WINDOW_WIDTH as f32) as i32,
                        (point.y * WINDOW_HEIGHT as f32) as i32,
                        LANDMARK_COLOR,
                    );
                }
            }
        }

        let border_color = if engine.is_active() {
            ACTIVE_COLOR
        } else {
            PAUSED_COLOR
        };
        draw_border(&mut buffer_u32, border_color);

        // Draw to Window //
        window.update_with_buffer(&buffer_u32, WINDOW_WIDTH, WINDOW_HEIGHT)?;
    }

    quit.store(true, Ordering::SeqCst);
    info!("Shutting down");
    Ok(())
}

/// Draws a filled dot, clipped to the window.
fn draw_dot(buffer: &mut [u32], cx: i32, cy: i32, color: u32) {
    let radius = 3;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = cx + dx;
            let y = cy + dy;
            if x >= 0 && x < WINDOW_WIDTH as i32 && y >= 0 && y < WINDOW_HEIGHT as i32 {
                buffer[(y as usize * WINDOW_WIDTH) + x as usize] = color;
            }
        }
    }
}

/// Draws the active/paused status border around the window edge.
fn draw_border(buffer: &mut [u32], color: u32) {
    let thickness = 4;

    // Horizontal bands (top and bottom)
    for y in (0..thickness).chain(WINDOW_HEIGHT - thickness..WINDOW_HEIGHT) {
        buffer[y * WINDOW_WIDTH..(y + 1) * WINDOW_WIDTH].fill(color);
    }
    // Vertical bands (left and right)
    for y in thickness..WINDOW_HEIGHT - thickness {
        let row = y * WINDOW_WIDTH;
        buffer[row..row + thickness].fill(color);
        buffer[row + WINDOW_WIDTH - thickness..row + WINDOW_WIDTH].fill(color);
    }
}
