use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("YAMLパースエラー: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("テンプレートエラー: {file}\n理由: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error("テンプレート展開エラー: {0}")]
    TemplateRenderError(String),

    #[error("変数ファイルはフラットなマッピングである必要があります: {0}")]
    InvalidVarsDocument(PathBuf),

    #[error("スキーマが見つかりません: {0}")]
    SchemaNotFound(String),

    #[error("設定がスキーマに一致しません ({}件の違反)", .errors.len())]
    Validation { errors: Vec<String> },
}

pub type Result<T> = std::result::Result<T, CoreError>;
