// Panels module
// Contains the audio generation and video composition panels

use serde::Serialize;
use tokio::sync::watch;

pub mod audio;
pub mod video;

#[cfg(test)]
pub(crate) mod tests;

pub use audio::{AudioPanel, GeneratedAudio};
pub use video::{RenderedPreview, VideoPanel};

/// Состояние панели: Idle -> Busy -> Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationState {
    Idle,
    Busy,
}

/// Флаг занятости панели с возможностью подписки
pub struct PanelState {
    tx: watch::Sender<OperationState>,
}

impl PanelState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(OperationState::Idle);
        Self { tx }
    }

    pub fn set_busy(&self, busy: bool) {
        let state = if busy {
            OperationState::Busy
        } else {
            OperationState::Idle
        };
        self.tx.send_replace(state);
    }

    pub fn is_busy(&self) -> bool {
        *self.tx.borrow() == OperationState::Busy
    }

    pub fn current(&self) -> OperationState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.tx.subscribe()
    }
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}
