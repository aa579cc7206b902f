//! 配置校验模块
//!
//! 字段级规则由 `Settings` 上的 `validator` 派生声明，
//! 这里负责执行并把第一个错误转换为带字段路径的 `ContractError`。

use contracts::ContractError;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::settings::Settings;

/// 校验 Settings
///
/// 返回第一个遇到的错误（按字段路径排序），或 Ok(())。
pub fn validate(settings: &Settings) -> Result<(), ContractError> {
    settings.validate().map_err(|errors| {
        let (field, message) =
            first_error("", &errors).unwrap_or_else(|| ("settings".into(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut keys: Vec<_> = errors.errors().keys().collect();
    keys.sort();

    for key in keys {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        let found = match &errors.errors()[key] {
            ValidationErrorsKind::Field(field_errors) => field_errors.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| describe(&e.code, &e.params));
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(&path, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(&format!("{path}[{idx}]"), inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn describe(
    code: &str,
    params: &std::collections::HashMap<std::borrow::Cow<'static, str>, serde_json::Value>,
) -> String {
    let value = params
        .get("value")
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".into());
    format!("failed '{code}' check (value: {value})")
}
