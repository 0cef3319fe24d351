//! 構造スキーマバリデーター
//!
//! 正規化済みの設定ツリーを名前付きスキーマに対して検証します。
//! 純粋関数として動作し、ドキュメントを変更せず、違反を全件収集します
//! （最初のエラーで打ち切りません）。

use crate::error::{CoreError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// 構造スキーマルール
#[derive(Debug, Clone)]
pub enum Schema {
    /// 文字列
    String,
    /// 整数
    Integer,
    /// 真偽値
    Boolean,
    /// IPアドレス形式の文字列
    IpAddress,
    /// 許可された文字列のいずれか
    Enum(Vec<String>),
    /// 各要素が element に一致する配列
    Array { element: Box<Schema>, allow_empty: bool },
    /// フィールドルールを持つオブジェクト
    Object { fields: Vec<FieldRule> },
    /// 別の名前付きスキーマへの参照
    Reference(String),
}

impl Schema {
    pub fn array(element: Schema) -> Self {
        Schema::Array {
            element: Box::new(element),
            allow_empty: true,
        }
    }

    pub fn object(fields: Vec<FieldRule>) -> Self {
        Schema::Object { fields }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Schema::String => "string",
            Schema::Integer => "integer",
            Schema::Boolean => "boolean",
            Schema::IpAddress => "ip_address",
            Schema::Enum(_) => "enum",
            Schema::Array { .. } => "array",
            Schema::Object { .. } => "object",
            Schema::Reference(_) => "reference",
        }
    }
}

/// オブジェクトの1フィールドに対するルール
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl FieldRule {
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: false,
        }
    }
}

/// 名前付きスキーマのレジストリ
#[derive(Debug, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, Schema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// スキーマを名前で登録
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }
}

/// 検証結果
#[derive(Debug, Clone)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// ドキュメントを名前付きスキーマに対して検証
///
/// 違反は全件収集されます。未知のスキーマ名のみエラーとして返します。
pub fn validate(set: &SchemaSet, document: &Value, schema_name: &str) -> Result<ValidationResult> {
    let schema = set
        .get(schema_name)
        .ok_or_else(|| CoreError::SchemaNotFound(schema_name.to_string()))?;

    let mut errors = Vec::new();
    check(set, schema, document, schema_name, &mut errors)?;
    Ok(ValidationResult { errors })
}

fn check(
    set: &SchemaSet,
    schema: &Schema,
    value: &Value,
    path: &str,
    errors: &mut Vec<String>,
) -> Result<()> {
    match schema {
        Schema::String => {
            if !value.is_string() {
                errors.push(type_mismatch(path, schema, value));
            }
        }
        Schema::Integer => {
            if !value.is_i64() && !value.is_u64() {
                errors.push(type_mismatch(path, schema, value));
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                errors.push(type_mismatch(path, schema, value));
            }
        }
        Schema::IpAddress => match value.as_str() {
            Some(s) if s.parse::<std::net::IpAddr>().is_ok() => {}
            Some(s) => errors.push(format!("{path}: '{s}' is not a valid IP address")),
            None => errors.push(type_mismatch(path, schema, value)),
        },
        Schema::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => {}
            Some(s) => errors.push(format!(
                "{path}: '{s}' is not one of [{}]",
                allowed.join(", ")
            )),
            None => errors.push(type_mismatch(path, schema, value)),
        },
        Schema::Array {
            element,
            allow_empty,
        } => match value.as_array() {
            Some(items) => {
                if items.is_empty() && !allow_empty {
                    errors.push(format!("{path}: must not be empty"));
                }
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    check(set, element, item, &item_path, errors)?;
                }
            }
            None => errors.push(type_mismatch(path, schema, value)),
        },
        Schema::Object { fields } => match value.as_object() {
            Some(map) => {
                for rule in fields {
                    let field_path = format!("{path}.{}", rule.name);
                    match map.get(&rule.name) {
                        Some(field_value) => {
                            check(set, &rule.schema, field_value, &field_path, errors)?;
                        }
                        None if rule.required => {
                            errors.push(format!("{field_path}: is required"));
                        }
                        None => {}
                    }
                }
                // スキーマに存在しないキーはtypoの可能性が高いので報告する
                for key in map.keys() {
                    if !fields.iter().any(|rule| &rule.name == key) {
                        errors.push(format!("{path}.{key}: is not a known parameter"));
                    }
                }
            }
            None => errors.push(type_mismatch(path, schema, value)),
        },
        Schema::Reference(name) => {
            let referenced = set
                .get(name)
                .ok_or_else(|| CoreError::SchemaNotFound(name.clone()))?;
            check(set, referenced, value, path, errors)?;
        }
    }

    Ok(())
}

fn type_mismatch(path: &str, schema: &Schema, value: &Value) -> String {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{path}: expected {}, got {actual}", schema.type_name())
}
