// ============================================
// src/error.rs
// エラー型の定義
// ============================================

use std::path::PathBuf;

use thiserror::Error;

/// 国データ (カタログ) まわりのエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("country code not found: {0}")]
    NotFound(String),

    #[error("catalog has no entries")]
    Empty,

    #[error("invalid country code: {0:?} (expected two lowercase ascii letters)")]
    InvalidCode(String),

    #[error("duplicate country code: {0}")]
    DuplicateCode(String),

    #[error("country {0} has an empty name")]
    EmptyName(String),

    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 設定ファイル・CLI まわりのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// クイズ進行中のエラー (不変条件違反のみ)
#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// main まで伝播するエラー
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("mode selection failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}
