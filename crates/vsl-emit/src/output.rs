use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vsl_core::module::Module;

use crate::{config::EmitterConfig, emitter::Emitter, ir_emitter::IrEmitter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown output format '{}', expected 'text' or 'json'", other),
        }
    }
}

/// Renders a module in the given format. JSON ignores the emitter configuration.
pub fn render_module(module: &Module, format: OutputFormat, config: &EmitterConfig) -> Result<String> {
    match format {
        OutputFormat::Text => IrEmitter::new(config.clone()).emit_to_string(module),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(module)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_empty_module_as_json() {
        let module = Module::new("empty");
        let json = render_module(&module, OutputFormat::Json, &EmitterConfig::plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "empty");
    }
}
