// Events module
// Contains shell event broadcasting

use std::path::PathBuf;

use log::{debug, error};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 32;

/// Вкладка оболочки
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Audio,
    Video,
}

/// События оболочки для интерфейса
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    TabChanged { tab: Tab },
    AudioGenerated { bytes: usize, duration_secs: Option<f64> },
    PreviewRendered { path: PathBuf },
}

impl ShellEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TabChanged { .. } => "tab-changed",
            Self::AudioGenerated { .. } => "audio-generated",
            Self::PreviewRendered { .. } => "preview-rendered",
        }
    }
}

pub struct EventBus {
    tx: broadcast::Sender<ShellEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to subscribers
    pub fn emit(&self, event: ShellEvent) {
        let name = event.name();
        if self.tx.receiver_count() == 0 {
            debug!("No listeners for event: {}", name);
            return;
        }
        match self.tx.send(event) {
            Ok(_) => debug!("Emitted event: {}", name),
            Err(e) => error!("Failed to emit event {}: {}", name, e),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
