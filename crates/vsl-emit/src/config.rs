use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub use_colors: bool,
    pub indent_style: IndentStyle,
    /// Block labels (`if.then`, `while.header`, ...) as trailing comments.
    pub include_labels: bool,
    pub verbosity: VerbosityLevel,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            indent_style: IndentStyle::Spaces(4),
            include_labels: true,
            verbosity: VerbosityLevel::Normal,
        }
    }
}

impl EmitterConfig {
    pub fn plain() -> Self {
        Self {
            use_colors: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl IndentStyle {
    pub fn as_indent(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityLevel {
    /// Functions only.
    Quiet,
    Normal,
    /// Adds parameter names and per-function instruction counts.
    Verbose,
}

impl VerbosityLevel {
    pub fn should_print_module_header(&self) -> bool {
        !matches!(self, VerbosityLevel::Quiet)
    }

    pub fn should_print_details(&self) -> bool {
        matches!(self, VerbosityLevel::Verbose)
    }
}
