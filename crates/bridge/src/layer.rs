use map::{CustomLayer, LayerError, LayerId, SurfaceContext};
use tokio::sync::oneshot;

use crate::bridge::{BridgeOptions, SceneBridge};

/// Custom map layer hosting a [`SceneBridge`].
///
/// The bridge is created when the surface adds the layer and is handed out
/// once through the receiver returned by [`SceneLayer::new`].
pub struct SceneLayer {
    id: LayerId,
    options: Option<BridgeOptions>,
    handoff: Option<oneshot::Sender<SceneBridge>>,
    bridge: Option<SceneBridge>,
}

impl SceneLayer {
    pub fn new(
        id: impl Into<LayerId>,
        options: BridgeOptions,
    ) -> (Self, oneshot::Receiver<SceneBridge>) {
        let (tx, rx) = oneshot::channel();
        let layer = Self {
            id: id.into(),
            options: Some(options),
            handoff: Some(tx),
            bridge: None,
        };
        (layer, rx)
    }
}

impl CustomLayer for SceneLayer {
    fn id(&self) -> LayerId {
        self.id.clone()
    }

    fn on_add(&mut self, ctx: &mut SurfaceContext<'_>) -> Result<(), LayerError> {
        let options = self
            .options
            .take()
            .ok_or_else(|| LayerError::Failed(format!("layer {} was already added", self.id)))?;
        let bridge = SceneBridge::attach(ctx, options);
        if let Some(tx) = self.handoff.take()
            && tx.send(bridge.clone()).is_err()
        {
            tracing::debug!(layer = %self.id, "nobody is waiting for the scene bridge");
        }
        self.bridge = Some(bridge);
        Ok(())
    }

    fn render(&mut self) -> Result<(), LayerError> {
        if let Some(bridge) = &self.bridge {
            bridge.sync_frame()?;
        }
        Ok(())
    }

    fn on_remove(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            bridge.cancel();
        }
    }
}
