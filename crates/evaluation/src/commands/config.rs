//! `config` command implementation.

use anyhow::{Context, Result};
use serde_json::Value;

use super::load_settings;
use crate::cli::ConfigArgs;

/// Execute the `config` command
pub fn run_config(args: &ConfigArgs) -> Result<()> {
    let layered = load_settings(args.config.as_deref())?;

    if let Some(key) = &args.key {
        match layered.get(key) {
            Some(value) => println!("{}", render_value(value, args.json)?),
            None => anyhow::bail!("Key not found: {key}"),
        }
        return Ok(());
    }

    println!("{}", render_value(layered.tree(), args.json)?);
    Ok(())
}

/// Scalars print bare; mappings print as JSON, or YAML-like text without `--json`
fn render_value(value: &Value, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(value).context("Failed to serialize settings");
    }
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            let mut out = String::new();
            write_tree(&mut out, value, 0);
            out.trim_end().to_string()
        }
        other => other.to_string(),
    })
}

fn write_tree(out: &mut String, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if child.is_object() {
                    out.push_str(&format!("{indent}{key}:\n"));
                    write_tree(out, child, depth + 1);
                } else {
                    out.push_str(&format!("{indent}{key}: {child}\n"));
                }
            }
        }
        other => out.push_str(&format!("{indent}{other}\n")),
    }
}
