//! Webcam hand-gesture control of the desktop pointer.
//!
//! The pipeline per frame: camera capture → landmark detection → finger
//! states → gesture classification → action resolution → the gesture
//! engine, which injects OS input events.

pub mod actions;
pub mod classifier;
pub mod controller;
pub mod detector;
pub mod engine;
pub mod geometry;
pub mod sensor;
pub mod settings;
