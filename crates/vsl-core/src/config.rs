use serde::{Deserialize, Serialize};

/// Symbol the execution adapters look up and run.
pub const ENTRY_FUNCTION_NAME: &str = "main";

/// Conversion used for every numeric print item.
pub const NUMBER_FORMAT: &str = "%.1f";
pub const TEXT_FORMAT: &str = "%s";

pub const PRINTF_NAME: &str = "printf";
/// Packed-argument runtime entry that backs `printf` in generated code.
pub const RUNTIME_PRINTF_NAME: &str = "vsl_printf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    #[default]
    None,
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    pub fn as_cranelift_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

impl std::str::FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "0" => Ok(OptLevel::None),
            "speed" | "2" => Ok(OptLevel::Speed),
            "speed_and_size" | "s" => Ok(OptLevel::SpeedAndSize),
            other => Err(format!("unknown optimization level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    pub opt_level: OptLevel,
    /// Run the Cranelift verifier on every function.
    pub verify: bool,
    /// Target triple for object emission; the host when unset.
    pub target: Option<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::None,
            verify: true,
            target: None,
        }
    }
}

impl CodegenConfig {
    pub fn optimized() -> Self {
        Self {
            opt_level: OptLevel::Speed,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, triple: impl Into<String>) -> Self {
        self.target = Some(triple.into());
        self
    }
}
