//! テンプレート展開機能
//!
//! Teraを使用して設定ファイル・bootstrapスクリプトのテンプレート展開を行います。

use crate::error::{CoreError, Result};
use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

/// 変数コンテキスト
pub type Variables = HashMap<String, serde_json::Value>;

/// テンプレートプロセッサ
///
/// コンテキストには明示的に追加された変数のみが含まれます。
/// 環境変数や呼び出し元のプロセス状態へのアクセスは一切ありません。
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    /// 新しいテンプレートプロセッサを作成（空のコンテキスト）
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// 変数を追加
    pub fn add_variable(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.insert(key.into(), &value);
    }

    /// 複数の変数を追加
    pub fn add_variables(&mut self, variables: Variables) {
        for (key, value) in variables {
            self.context.insert(key, &value);
        }
    }

    /// 変数ファイル（フラットなYAMLマッピング）を読み込んで追加
    ///
    /// 各変数はトップレベル (`{{ foo }}`) と `vars` オブジェクト配下
    /// (`{{ vars.foo }}`) の両方で参照できます。
    pub fn add_vars_file(&mut self, vars_path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(vars_path).map_err(|e| CoreError::IoError {
            path: vars_path.to_path_buf(),
            message: e.to_string(),
        })?;

        let doc: serde_json::Value = serde_yaml::from_str(&content)?;
        let mapping = match doc {
            serde_json::Value::Object(map) => map,
            _ => return Err(CoreError::InvalidVarsDocument(vars_path.to_path_buf())),
        };

        debug!(
            vars_file = %vars_path.display(),
            variable_count = mapping.len(),
            "Loaded variables file"
        );

        for (key, value) in &mapping {
            self.context.insert(key, value);
        }
        self.context
            .insert("vars", &serde_json::Value::Object(mapping));

        Ok(())
    }

    /// 文字列をテンプレートとして展開
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        self.tera.render_str(template, &self.context).map_err(|e| {
            let error_detail = extract_tera_error_detail(&e);
            CoreError::TemplateRenderError(error_detail)
        })
    }

    /// ファイルを読み込んでテンプレート展開
    pub fn render_file(&mut self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.render_str(&content).map_err(|e| {
            // TemplateRenderErrorをファイル情報付きのTemplateErrorに変換
            if let CoreError::TemplateRenderError(msg) = e {
                CoreError::TemplateError {
                    file: path.to_path_buf(),
                    message: msg,
                }
            } else {
                e
            }
        })
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Teraエラーから詳細情報を抽出
///
/// エラーチェーンを走査し、未定義変数などの具体的な情報を取得します。
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = Vec::new();
    details.push(e.to_string());

    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context") {
        // 変数名を抽出: "Variable `xxx` not found in context"
        if let Some(start) = full_error.find("Variable `") {
            if let Some(end) = full_error[start..].find("` not found") {
                let var_name = &full_error[start + 10..start + end];
                return format!(
                    "未定義の変数: `{}`\nヒント: 変数ファイルで定義してください",
                    var_name
                );
            }
        }
    }

    full_error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_variable_expansion() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("name", serde_json::Value::String("world".to_string()));

        let result = processor.render_str("Hello {{ name }}!").unwrap();

        assert_eq!(result, "Hello world!");
    }

    #[test]
    fn test_static_template_is_identity() {
        let mut processor = TemplateProcessor::new();

        let template = "vapps:\n  - name: web-1\n    memory: 4096\n";
        let result = processor.render_str(template).unwrap();

        assert_eq!(result, template);
    }

    #[test]
    fn test_undefined_variable_error() {
        let mut processor = TemplateProcessor::new();

        let result = processor.render_str("Hello {{ undefined_var }}!");

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(
            err_msg.contains("undefined_var"),
            "エラーメッセージに変数名が含まれていません: {}",
            err_msg
        );
    }

    #[test]
    fn test_vars_file_top_level_and_vars_object() {
        let temp_dir = tempfile::tempdir().unwrap();
        let vars_file = temp_dir.path().join("vars.yaml");
        std::fs::write(&vars_file, "foo: bar\ncount: 3\n").unwrap();

        let mut processor = TemplateProcessor::new();
        processor.add_vars_file(&vars_file).unwrap();

        assert_eq!(processor.render_str("{{ foo }}").unwrap(), "bar");
        assert_eq!(processor.render_str("{{ vars.foo }}").unwrap(), "bar");
        assert_eq!(processor.render_str("{{ vars.count }}").unwrap(), "3");
    }

    #[test]
    fn test_vars_file_must_be_mapping() {
        let temp_dir = tempfile::tempdir().unwrap();
        let vars_file = temp_dir.path().join("vars.yaml");
        std::fs::write(&vars_file, "- just\n- a\n- list\n").unwrap();

        let mut processor = TemplateProcessor::new();
        let result = processor.add_vars_file(&vars_file);

        assert!(matches!(result, Err(CoreError::InvalidVarsDocument(_))));
    }

    #[test]
    fn test_missing_vars_file() {
        let mut processor = TemplateProcessor::new();
        let result = processor.add_vars_file(Path::new("/nonexistent/vars.yaml"));

        assert!(matches!(result, Err(CoreError::IoError { .. })));
    }

    #[test]
    fn test_render_file_error_carries_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let template_file = temp_dir.path().join("config.yaml");
        std::fs::write(&template_file, "value: {{ missing }}\n").unwrap();

        let mut processor = TemplateProcessor::new();
        let err = processor.render_file(&template_file).unwrap_err();

        match err {
            CoreError::TemplateError { file, message } => {
                assert_eq!(file, template_file);
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inline_expression() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("replicas", serde_json::json!(2));

        let result = processor.render_str("count: {{ replicas * 2 }}").unwrap();

        assert_eq!(result, "count: 4");
    }
}
