use gpu::{Canvas, DrawError, RenderCommand, RenderFrame};

/// Headless drawing surface: frames go to the log instead of a GPU.
#[derive(Debug)]
pub struct LoggingCanvas {
    size_px: (u32, u32),
    /// Summarize at debug level once every this many frames.
    summary_every: u64,
    submitted: u64,
}

impl LoggingCanvas {
    pub fn new(size_px: (u32, u32), summary_every: u64) -> Self {
        Self {
            size_px,
            summary_every: summary_every.max(1),
            submitted: 0,
        }
    }
}

impl Canvas for LoggingCanvas {
    fn size_px(&self) -> (u32, u32) {
        self.size_px
    }

    fn submit(&mut self, frame: RenderFrame) -> Result<(), DrawError> {
        self.submitted += 1;
        tracing::trace!(
            frame = frame.frame_index,
            commands = frame.commands.len(),
            "frame submitted"
        );
        if self.submitted % self.summary_every != 0 {
            return Ok(());
        }
        for command in &frame.commands {
            let RenderCommand::DrawModel {
                entity, pose, label, ..
            } = command;
            let [lon, lat] = pose.position.as_lon_lat();
            tracing::debug!(
                frame = frame.frame_index,
                ?entity,
                lon,
                lat,
                heading = %pose.heading,
                label = label.as_deref().unwrap_or(""),
                "model drawn"
            );
        }
        Ok(())
    }
}
