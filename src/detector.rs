pub mod hand_detector {
    use anyhow::{Result, bail};
    use image::{ImageBuffer, Rgb, imageops::FilterType};
    use ndarray::Array4;
    use ort::{inputs, session::Session, session::builder::GraphOptimizationLevel, value::Value};
    use std::path::Path;

    /// MediaPipe hand landmark indices.
    /// See: https://google.github.io/mediapipe/solutions/hands.html
    #[allow(dead_code)]
    pub mod landmarks {
        pub const WRIST: usize = 0;
        pub const THUMB_CMC: usize = 1;
        pub const THUMB_MCP: usize = 2;
        pub const THUMB_IP: usize = 3;
        pub const THUMB_TIP: usize = 4;
        pub const INDEX_FINGER_MCP: usize = 5;
        pub const INDEX_FINGER_PIP: usize = 6;
        pub const INDEX_FINGER_DIP: usize = 7;
        pub const INDEX_FINGER_TIP: usize = 8;
        pub const MIDDLE_FINGER_MCP: usize = 9;
        pub const MIDDLE_FINGER_PIP: usize = 10;
        pub const MIDDLE_FINGER_DIP: usize = 11;
        pub const MIDDLE_FINGER_TIP: usize = 12;
        pub const RING_FINGER_MCP: usize = 13;
        pub const RING_FINGER_PIP: usize = 14;
        pub const RING_FINGER_DIP: usize = 15;
        pub const RING_FINGER_TIP: usize = 16;
        pub const PINKY_MCP: usize = 17;
        pub const PINKY_PIP: usize = 18;
        pub const PINKY_DIP: usize = 19;
        pub const PINKY_TIP: usize = 20;
    }

    /// A single tracked point in normalized [0,1] image coordinates.
    /// The model also emits depth, which nothing downstream consumes.
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct Landmark {
        pub x: f32,
        pub y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Handedness {
        Left,
        Right,
    }

    /// One hand for the current frame: 21 landmarks plus the model score.
    #[derive(Debug, Clone)]
    pub struct DetectedHand {
        pub landmarks: [Landmark; 21],
        pub score: f32,
        pub handedness: Option<Handedness>,
    }

    /// Side length of the square model input, in pixels.
    const INPUT_SIZE: u32 = 224;

    pub struct HandDetector {
        session: Session,
        has_handedness: bool,
    }

    impl HandDetector {
        pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(4)?
                .commit_from_file(model_path)?;

            log::debug!("Model Inputs: {:?}", session.inputs());
            log::debug!("Model Outputs: {:?}", session.outputs());

            // Some exports of the landmark model carry a handedness head.
            let has_handedness = session
                .outputs()
                .iter()
                .any(|output| output.name() == "handedness");

            Ok(Self {
                session,
                has_handedness,
            })
        }

        /// Runs the landmark model on a frame. Returns zero or one hands;
        /// detections scoring below `min_confidence` are dropped.
        pub fn detect(
            &mut self,
            frame: &ImageBuffer<Rgb<u8>, Vec<u8>>,
            min_confidence: f32,
        ) -> Result<Vec<DetectedHand>> {
            // Preprocess: square resize, then normalize u8 pixels to 0.0-1.0
            // in a [1, 3, H, W] tensor.
            let resized =
                image::imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

            let mut input = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
            for (x, y, rgb) in resized.enumerate_pixels() {
                input[[0, 0, y as usize, x as usize]] = rgb[0] as f32 / 255.0;
                input[[0, 1, y as usize, x as usize]] = rgb[1] as f32 / 255.0;
                input[[0, 2, y as usize, x as usize]] = rgb[2] as f32 / 255.0;
            }

            let input_tensor = Value::from_array(input)?;
            let outputs = self.session.run(inputs!["image" => input_tensor])?;

            let (_score_shape, score_data) = outputs["score"].try_extract_tensor::<f32>()?;
            let score = score_data.first().copied().unwrap_or(0.0);
            if score < min_confidence {
                return Ok(Vec::new());
            }

            // 21 landmarks as (x, y, z) triples in input-pixel units.
            let (_lm_shape, lm_data) = outputs["landmarks"].try_extract_tensor::<f32>()?;
            if lm_data.len() < 63 {
                bail!(
                    "landmark tensor too short: expected 63 values, got {}",
                    lm_data.len()
                );
            }

            let mut points = [Landmark::default(); 21];
            for (i, xyz) in lm_data.chunks_exact(3).take(21).enumerate() {
                points[i] = Landmark {
                    x: xyz[0] / INPUT_SIZE as f32,
                    y: xyz[1] / INPUT_SIZE as f32,
                };
            }

            let handedness = if self.has_handedness {
                let (_, hd) = outputs["handedness"].try_extract_tensor::<f32>()?;
                hd.first().map(|&v| {
                    if v >= 0.5 {
                        Handedness::Right
                    } else {
                        Handedness::Left
                    }
                })
            } else {
                None
            };

            Ok(vec![DetectedHand {
                landmarks: points,
                score,
                handedness,
            }])
        }
    }
}
