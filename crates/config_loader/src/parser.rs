//! 配置解析模块
//!
//! 支持 TOML、JSON 与 YAML 格式，统一解析为 `serde_json::Value` 树。

use contracts::ContractError;
use serde_json::Value;

use crate::merge::strip_nulls;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式
    Toml,
    /// JSON 格式
    Json,
    /// YAML 格式
    Yaml,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// 解析配置内容为值树
///
/// An empty document yields an empty mapping. A document whose top level is
/// not a mapping is rejected.
pub fn parse(content: &str, format: ConfigFormat) -> Result<Value, ContractError> {
    let value = match format {
        ConfigFormat::Toml => toml::from_str::<Value>(content).map_err(|e| {
            ContractError::ConfigParse {
                message: format!("TOML parse error: {e}"),
                source: Some(Box::new(e)),
            }
        })?,
        ConfigFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| {
            ContractError::ConfigParse {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            }
        })?,
        ConfigFormat::Yaml => serde_yaml::from_str::<Value>(content).map_err(|e| {
            ContractError::ConfigParse {
                message: format!("YAML parse error: {e}"),
                source: Some(Box::new(e)),
            }
        })?,
    };

    match value {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(value),
        other => Err(ContractError::config_parse(format!(
            "top-level settings must be a mapping, got {}",
            type_name(&other)
        ))),
    }
}

/// 将值树序列化为指定格式
pub fn serialize(tree: &Value, format: ConfigFormat) -> Result<String, ContractError> {
    match format {
        ConfigFormat::Toml => {
            let mut tree = tree.clone();
            strip_nulls(&mut tree);
            toml::to_string_pretty(&tree)
                .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
        }
        ConfigFormat::Json => serde_json::to_string_pretty(tree)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}"))),
        ConfigFormat::Yaml => serde_yaml::to_string(tree)
            .map_err(|e| ContractError::config_parse(format!("YAML serialize error: {e}"))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
