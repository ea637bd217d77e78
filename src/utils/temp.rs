//! Модуль для работы с временными файлами
//!
//! Сгенерированные артефакты (аудио, превью) хранятся во временной
//! директории; путь к файлу играет роль воспроизводимой ссылки.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Хранилище временных артефактов
pub struct TempFileManager {
    temp_dir: TempDir,
    files: Vec<PathBuf>,
}

impl TempFileManager {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
            files: Vec::new(),
        })
    }

    /// Записать артефакт во временный файл и вернуть путь к нему
    pub fn store(&mut self, prefix: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), extension);
        let file_path = self.temp_dir.path().join(file_name);
        fs::write(&file_path, bytes)?;
        self.files.push(file_path.clone());
        Ok(file_path)
    }

    pub fn temp_dir_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Скопировать артефакт в директорию загрузок под именем `<prefix>-<ms>.<ext>`
pub fn save_download(dir: &Path, prefix: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let millis = chrono::Utc::now().timestamp_millis();
    let path = dir.join(format!("{}-{}.{}", prefix, millis, extension));
    fs::write(&path, bytes)?;
    log::info!("Saved {}", path.display());
    Ok(path)
}
