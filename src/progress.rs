//! Модуль для отслеживания прогресса выполнения операций
//!
//! Трекер хранит процент выполнения одной операции панели, уведомляет
//! наблюдателей и, если подключён канал, публикует обновления подписчикам
//! оболочки. Прогресс имитационный: он нужен только для обратной связи в
//! интерфейсе и не отражает реальную работу движков.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use log::trace;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Снимок прогресса операции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub step: ProcessStep,
    /// 0 - 100
    pub percent: u8,
    pub details: Option<String>,
}

impl ProgressInfo {
    pub fn new(step: ProcessStep, percent: u8, details: Option<String>) -> Self {
        Self {
            step,
            percent: percent.min(100),
            details,
        }
    }
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Операции, во время которых панель находится в состоянии Busy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStep {
    /// Синтез и запись речи
    AudioGeneration,
    /// Рендер превью видео
    VideoRender,
}

impl ProcessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioGeneration => "Generating audio",
            Self::VideoRender => "Rendering video",
        }
    }
}

/// Трекер прогресса одной операции
pub struct ProgressTracker {
    step: ProcessStep,
    percent: AtomicU8,
    observers: RwLock<Vec<Box<dyn ProgressObserver>>>,
    publisher: RwLock<Option<broadcast::Sender<ProgressInfo>>>,
}

impl ProgressTracker {
    pub fn new(step: ProcessStep) -> Self {
        Self {
            step,
            percent: AtomicU8::new(0),
            observers: RwLock::new(Vec::new()),
            publisher: RwLock::new(None),
        }
    }

    pub fn step(&self) -> ProcessStep {
        self.step
    }

    pub fn add_observer(&self, observer: Box<dyn ProgressObserver>) {
        self.observers.write().push(observer);
    }

    /// Публиковать обновления в общий канал
    pub fn publish_to(&self, tx: broadcast::Sender<ProgressInfo>) {
        *self.publisher.write() = Some(tx);
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.set(0, None);
    }

    pub fn set(&self, percent: u8, details: Option<String>) {
        let percent = percent.min(100);
        self.percent.store(percent, Ordering::SeqCst);
        self.report(percent, details);
    }

    /// Увеличить прогресс на `step`, не превышая `cap`
    ///
    /// Прогресс никогда не уменьшается: значение выше `cap` (например,
    /// 100 после завершения) остаётся как есть.
    pub fn advance(&self, step: u8, cap: u8) -> u8 {
        let bump = |prev: u8| prev.saturating_add(step).min(cap).max(prev);
        let previous = self
            .percent
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(bump(prev)))
            .unwrap_or(0);
        let current = bump(previous);
        if current != previous {
            self.report(current, None);
        }
        current
    }

    pub fn complete(&self) {
        self.set(100, Some("Completed".to_string()));
    }

    fn report(&self, percent: u8, details: Option<String>) {
        let info = ProgressInfo::new(self.step, percent, details);
        for observer in self.observers.read().iter() {
            observer.on_progress_update(info.clone());
        }
        if let Some(tx) = self.publisher.read().as_ref() {
            if tx.send(info).is_err() {
                trace!("No progress subscribers for {:?}", self.step);
            }
        }
    }
}

/// Фоновая имитация прогресса: каждые `interval` добавляет `step` до `cap`
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Запустить тикер. При нулевом интервале тикер не запускается.
    pub fn spawn(tracker: Arc<ProgressTracker>, interval: Duration, step: u8, cap: u8) -> Self {
        if interval.is_zero() || step == 0 {
            return Self { handle: None };
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Первый тик срабатывает сразу
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tracker.advance(step, cap) >= cap {
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
