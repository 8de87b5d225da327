//! Floor-plan dimension requests, keyed by floor id.
//!
//! Adding a floor with a background starts a probe of the image's natural
//! size. With a tokio runtime available the probe runs on the blocking
//! pool and the result comes back over a oneshot channel; the renderer
//! either polls ([`FloorDimensions::poll`]) or awaits a single floor.
//! Without a runtime the probe runs inline.
//!
//! Failures are logged and remembered; the floor stays usable and renders
//! against a placeholder.

use std::collections::HashMap;
use wayfind_core::geometry::ImageDimensions;
use wayfind_core::plan_image::dimensions_from_source;

#[cfg(feature = "runtime")]
use tokio::sync::oneshot;

/// Where a floor's dimension request stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionState {
    Unknown,
    Pending,
    Ready(ImageDimensions),
    Failed(String),
}

enum Slot {
    #[cfg(feature = "runtime")]
    Pending(oneshot::Receiver<Result<ImageDimensions, String>>),
    Ready(ImageDimensions),
    Failed(String),
}

#[derive(Default)]
pub struct FloorDimensions {
    slots: HashMap<String, Slot>,
}

impl std::fmt::Debug for FloorDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.keys().map(|k| (k, self.state(k))))
            .finish()
    }
}

impl FloorDimensions {
    /// Start resolving `src` for `floor_id`, replacing any earlier request.
    pub fn request(&mut self, floor_id: &str, src: String) {
        #[cfg(feature = "runtime")]
        {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let (tx, rx) = oneshot::channel();
                handle.spawn(async move {
                    let result = wayfind_core::plan_image::resolve_image_dimensions(src)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(result);
                });
                self.slots.insert(floor_id.to_string(), Slot::Pending(rx));
                log::debug!("dimension probe started for {floor_id}");
                return;
            }
        }

        let result = dimensions_from_source(&src).map_err(|e| e.to_string());
        self.settle(floor_id, result);
    }

    /// Record dimensions resolved elsewhere (e.g. by the browser).
    pub fn set(&mut self, floor_id: &str, dims: ImageDimensions) {
        self.slots.insert(floor_id.to_string(), Slot::Ready(dims));
    }

    pub fn forget(&mut self, floor_id: &str) {
        self.slots.remove(floor_id);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn state(&self, floor_id: &str) -> DimensionState {
        match self.slots.get(floor_id) {
            None => DimensionState::Unknown,
            #[cfg(feature = "runtime")]
            Some(Slot::Pending(_)) => DimensionState::Pending,
            Some(Slot::Ready(dims)) => DimensionState::Ready(*dims),
            Some(Slot::Failed(msg)) => DimensionState::Failed(msg.clone()),
        }
    }

    pub fn get(&self, floor_id: &str) -> Option<ImageDimensions> {
        match self.slots.get(floor_id) {
            Some(Slot::Ready(dims)) => Some(*dims),
            _ => None,
        }
    }

    /// Collect finished probes. Returns the floor ids that settled.
    #[cfg(feature = "runtime")]
    pub fn poll(&mut self) -> Vec<String> {
        let mut finished = Vec::new();
        for (floor_id, slot) in &mut self.slots {
            if let Slot::Pending(rx) = slot {
                match rx.try_recv() {
                    Ok(result) => finished.push((floor_id.clone(), result)),
                    Err(oneshot::error::TryRecvError::Empty) => {}
                    Err(oneshot::error::TryRecvError::Closed) => {
                        finished.push((floor_id.clone(), Err("probe task dropped".to_string())))
                    }
                }
            }
        }
        finished
            .into_iter()
            .map(|(floor_id, result)| {
                self.settle(&floor_id, result);
                floor_id
            })
            .collect()
    }

    /// Probes settle inline without a runtime; nothing is ever pending.
    #[cfg(not(feature = "runtime"))]
    pub fn poll(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Wait for one floor's probe. `None` if nothing was requested.
    #[cfg(feature = "runtime")]
    pub async fn wait(&mut self, floor_id: &str) -> Option<Result<ImageDimensions, String>> {
        if matches!(self.slots.get(floor_id), Some(Slot::Pending(_)))
            && let Some(Slot::Pending(rx)) = self.slots.remove(floor_id)
        {
            let result = rx
                .await
                .unwrap_or_else(|_| Err("probe task dropped".to_string()));
            self.settle(floor_id, result);
        }
        match self.slots.get(floor_id)? {
            Slot::Ready(dims) => Some(Ok(*dims)),
            Slot::Failed(msg) => Some(Err(msg.clone())),
            Slot::Pending(_) => None,
        }
    }

    fn settle(&mut self, floor_id: &str, result: Result<ImageDimensions, String>) {
        let slot = match result {
            Ok(dims) => {
                log::debug!("floor {floor_id} is {}x{}", dims.width, dims.height);
                Slot::Ready(dims)
            }
            Err(msg) => {
                log::warn!("could not read floor plan size for {floor_id}: {msg}");
                Slot::Failed(msg)
            }
        };
        self.slots.insert(floor_id.to_string(), slot);
    }
}
