use gpu::SharedCanvas;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("container cannot provide a canvas: {0}")]
pub struct ContainerError(pub String);

/// Host element a map surface mounts into.
pub trait Container {
    /// Hands out the drawing surface. Called once per surface.
    fn acquire_canvas(&mut self) -> Result<SharedCanvas, ContainerError>;
}

/// Container around a canvas built up front.
pub struct HeadlessContainer {
    canvas: Option<SharedCanvas>,
}

impl HeadlessContainer {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self {
            canvas: Some(canvas),
        }
    }

    /// A container that was never attached to a canvas.
    pub fn detached() -> Self {
        Self { canvas: None }
    }
}

impl Container for HeadlessContainer {
    fn acquire_canvas(&mut self) -> Result<SharedCanvas, ContainerError> {
        self.canvas
            .take()
            .ok_or_else(|| ContainerError("no canvas attached".to_string()))
    }
}
