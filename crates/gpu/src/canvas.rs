use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::renderer::RenderFrame;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    #[error("drawing surface was lost")]
    Lost,
    #[error("draw backend failed: {0}")]
    Backend(String),
}

/// Drawing surface a map and its custom layers share.
pub trait Canvas: Send {
    /// Size in CSS pixels.
    fn size_px(&self) -> (u32, u32);

    fn submit(&mut self, frame: RenderFrame) -> Result<(), DrawError>;
}

pub type SharedCanvas = Arc<Mutex<dyn Canvas>>;

pub fn shared_canvas(canvas: impl Canvas + 'static) -> SharedCanvas {
    Arc::new(Mutex::new(canvas))
}

/// Keeps every submitted frame; the headless backend for tests and tools.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    size_px: (u32, u32),
    frames: Arc<Mutex<Vec<RenderFrame>>>,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size_px: (width, height),
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Another view onto the same recorded frames.
    pub fn frames(&self) -> Arc<Mutex<Vec<RenderFrame>>> {
        self.frames.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn last_frame(&self) -> Option<RenderFrame> {
        self.frames.lock().last().cloned()
    }
}

impl Canvas for RecordingCanvas {
    fn size_px(&self) -> (u32, u32) {
        self.size_px
    }

    fn submit(&mut self, frame: RenderFrame) -> Result<(), DrawError> {
        self.frames.lock().push(frame);
        Ok(())
    }
}
