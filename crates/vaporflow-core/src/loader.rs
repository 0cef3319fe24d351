//! 統合ローダー
//!
//! テンプレート展開、YAMLパース、キー正規化、スキーマ検証を統合します。
//!
//! 読み込みは1パスのfail-fastで行われ、検証に失敗した設定ツリーが
//! 部分的に返されることはありません。

use crate::error::{CoreError, Result};
use crate::schema::{self, SchemaSet};
use crate::template::TemplateProcessor;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info, instrument};

/// ルート設定が検証されるスキーマ名
pub const BASE_SCHEMA: &str = "base";

/// 設定ファイルをロードして正規化済みツリーを返す
///
/// 1. `vars_path` があれば変数ファイルを使ってテンプレート展開、
///    なければファイルをそのまま読み込む
/// 2. YAMLとしてパース
/// 3. すべてのマッピングキーを文字列に正規化（ネスト・シーケンス含む）
/// 4. `schema` があれば `base` スキーマに対して検証。違反は全件ログに
///    出力した上で、ロード全体を失敗させる
#[instrument(skip(schema), fields(config = %config_path.display()))]
pub fn load_config(
    config_path: &Path,
    schema: Option<&SchemaSet>,
    vars_path: Option<&Path>,
) -> Result<Value> {
    let raw = match vars_path {
        Some(vars) => {
            debug!(vars_file = %vars.display(), "Rendering config template");
            let mut processor = TemplateProcessor::new();
            processor.add_vars_file(vars)?;
            processor.render_file(config_path)?
        }
        None => std::fs::read_to_string(config_path).map_err(|e| CoreError::IoError {
            path: config_path.to_path_buf(),
            message: e.to_string(),
        })?,
    };

    let parsed: serde_yaml::Value = serde_yaml::from_str(&raw)?;
    let config = canonicalize(parsed)?;

    if let Some(set) = schema {
        let validation = schema::validate(set, &config, BASE_SCHEMA)?;
        if !validation.valid() {
            for violation in validation.errors() {
                error!(%violation, "Config validation failed");
            }
            return Err(CoreError::Validation {
                errors: validation.into_errors(),
            });
        }
    }

    info!("Config loaded");
    Ok(config)
}

/// YAML値を正規化済みJSONツリーに変換
///
/// YAMLのマッピングキーは文字列以外（整数、真偽値）も許されるため、
/// パーサーだけでは正規形が得られません。ここですべてのキーを
/// 文字列化し、値をタグ付きJSON値に落とします。
pub fn canonicalize(value: serde_yaml::Value) -> Result<Value> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => canonicalize_number(&n),
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items = seq
                .into_iter()
                .map(canonicalize)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = serde_json::Map::with_capacity(mapping.len());
            for (key, val) in mapping {
                map.insert(canonical_key(&key)?, canonicalize(val)?);
            }
            Ok(Value::Object(map))
        }
        serde_yaml::Value::Tagged(tagged) => canonicalize(tagged.value),
    }
}

fn canonical_key(key: &serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(CoreError::InvalidConfig(format!(
            "マッピングキーを正規化できません: {other:?}"
        ))),
    }
}

fn canonicalize_number(n: &serde_yaml::Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Number(i.into()))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Number(u.into()))
    } else if let Some(f) = n.as_f64() {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| CoreError::InvalidConfig(format!("数値を正規化できません: {n}")))
    } else {
        Err(CoreError::InvalidConfig(format!(
            "数値を正規化できません: {n}"
        )))
    }
}
