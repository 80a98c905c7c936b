use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("YAMLパースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("マニフェスト読み込みエラー: {path}\n理由: {message}")]
    Io { path: PathBuf, message: String },

    #[error("無効なglobパターン: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
