//! Модуль для реализации системы уведомлений
//!
//! Наблюдатели прогресса и уведомления пользователя. `UserNotifier`
//! заменяет блокирующее окно с сообщением: панели сообщают через него об
//! ошибках валидации и об общей операционной ошибке.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::{ProgressInfo, ProgressObserver};

/// Наблюдатель, выводящий информацию о прогрессе в консоль
pub struct ConsoleProgressObserver {
    prefix: Option<String>,
}

impl ConsoleProgressObserver {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl Default for ConsoleProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let details = progress.details.as_deref().unwrap_or("");

        println!(
            "{}[Progress] {}... {}%{}",
            prefix,
            progress.step.as_str(),
            progress.percent,
            if details.is_empty() {
                String::new()
            } else {
                format!(" ({})", details)
            }
        );
    }
}

/// Наблюдатель, пишущий прогресс в лог
pub struct LogProgressObserver;

impl ProgressObserver for LogProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        log::info!("{}: {}%", progress.step.as_str(), progress.percent);
    }
}

/// Уведомление пользователя (аналог модального сообщения)
pub trait UserNotifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Уведомления, выводимые в лог
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Уведомления, выводимые в stderr
pub struct ConsoleNotifier;

impl UserNotifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        eprintln!("[!] {}", message);
    }
}

/// Уведомления, сохраняемые в памяти
#[derive(Clone, Default)]
pub struct MemoryNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl UserNotifier for MemoryNotifier {
    fn alert(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
