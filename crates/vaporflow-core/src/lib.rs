//! vaporflow-core
//!
//! 宣言的vCloud設定の読み込みパイプライン:
//! テンプレート展開 (Tera) → YAMLパース → キー正規化 → スキーマ検証。
//!
//! 検証に成功した設定ツリーのみが返されます。リソースへの適用は
//! vaporflow-vcloud 側の責務です。

pub mod error;
pub mod loader;
pub mod schema;
pub mod template;

pub use error::{CoreError, Result};
pub use loader::{canonicalize, load_config, BASE_SCHEMA};
pub use schema::{validate, FieldRule, Schema, SchemaSet, ValidationResult};
pub use template::{TemplateProcessor, Variables};
