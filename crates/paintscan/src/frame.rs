use crate::camera::ScreenProjector;
use crate::core::Image;
use std::sync::Arc;

/// Everything the capture path needs from one rendered frame.
///
/// The raw image may be missing when the sensor buffer was not acquired in
/// time for this frame.
#[derive(Clone)]
pub struct FrameSnapshot {
    /// Acquisition time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub image: Option<Arc<Image>>,
    pub projector: Arc<dyn ScreenProjector + Send + Sync>,
}

impl FrameSnapshot {
    pub fn new(
        timestamp: u64,
        image: Option<Arc<Image>>,
        projector: Arc<dyn ScreenProjector + Send + Sync>,
    ) -> Self {
        Self {
            timestamp,
            image,
            projector,
        }
    }
}

impl std::fmt::Debug for FrameSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSnapshot")
            .field("timestamp", &self.timestamp)
            .field(
                "image",
                &self.image.as_ref().map(|i| (i.width, i.height, i.format)),
            )
            .field("viewport", &self.projector.viewport())
            .finish()
    }
}
