use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use vsl::{
    core::runtime, driver, parser::parse_file, Backend, OptLevel, OutputFormat, ShellConfig,
};

mod logging;
mod repl;

#[derive(Parser)]
#[command(name = "vslc")]
#[command(about = "VSL compiler: object code, JIT execution and an interactive shell")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). `VSLC_LOG` overrides it.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON file with shell, codegen and emitter settings. Flags take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program to a relocatable object file
    Compile {
        input: PathBuf,

        #[arg(short, long, default_value = "a.out")]
        output: PathBuf,

        #[command(flatten)]
        codegen: CodegenArgs,

        /// Target triple, the host when omitted
        #[arg(long)]
        target: Option<String>,
    },

    /// Run `main` of a program and print its result
    Run {
        input: PathBuf,

        /// Use the IR interpreter instead of the JIT
        #[arg(long)]
        interpret: bool,

        #[command(flatten)]
        codegen: CodegenArgs,
    },

    /// Print the IR of a program
    Ir {
        input: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,

        #[arg(long)]
        no_color: bool,
    },

    /// Print the syntax tree of a program as JSON
    Ast { input: PathBuf },

    /// Start the interactive shell (the default)
    Shell {
        /// Use the IR interpreter instead of the JIT
        #[arg(long)]
        interpret: bool,

        #[command(flatten)]
        codegen: CodegenArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct CodegenArgs {
    #[arg(long, value_enum)]
    opt_level: Option<OptLevelArg>,

    /// Skip the Cranelift verifier
    #[arg(long)]
    no_verify: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OptLevelArg {
    None,
    Speed,
    SpeedAndSize,
}

impl From<OptLevelArg> for OptLevel {
    fn from(level: OptLevelArg) -> Self {
        match level {
            OptLevelArg::None => OptLevel::None,
            OptLevelArg::Speed => OptLevel::Speed,
            OptLevelArg::SpeedAndSize => OptLevel::SpeedAndSize,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    tracing::debug!(?settings, "settings loaded");

    match cli.command {
        Some(Commands::Compile {
            input,
            output,
            codegen,
            target,
        }) => cmd_compile(&input, &output, apply(settings, &codegen, target)),
        Some(Commands::Run {
            input,
            interpret,
            codegen,
        }) => cmd_run(&input, with_backend(apply(settings, &codegen, None), interpret)),
        Some(Commands::Ir {
            input,
            format,
            no_color,
        }) => cmd_ir(&input, format.into(), no_color, settings),
        Some(Commands::Ast { input }) => cmd_ast(&input),
        Some(Commands::Shell { interpret, codegen }) => {
            repl::run(with_backend(apply(settings, &codegen, None), interpret))
        }
        None => repl::run(settings),
    }
}

fn load_settings(path: Option<&Path>) -> Result<ShellConfig> {
    let Some(path) = path else {
        return Ok(ShellConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn apply(mut settings: ShellConfig, args: &CodegenArgs, target: Option<String>) -> ShellConfig {
    if let Some(level) = args.opt_level {
        settings.codegen.opt_level = level.into();
    }
    if args.no_verify {
        settings.codegen.verify = false;
    }
    if target.is_some() {
        settings.codegen.target = target;
    }
    settings
}

fn with_backend(mut settings: ShellConfig, interpret: bool) -> ShellConfig {
    if interpret {
        settings.backend = Backend::Interpreter;
    }
    settings
}

fn read_source(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn module_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

fn cmd_compile(input: &Path, output: &Path, settings: ShellConfig) -> Result<()> {
    let source = read_source(input)?;
    let bytes = driver::emit_object(&source, &module_name(input), &settings.codegen)?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Object code has been output to the '{}' file ({} bytes).",
        "✓".green(),
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn cmd_run(input: &Path, settings: ShellConfig) -> Result<()> {
    let source = read_source(input)?;
    let module = driver::lower_source(&source, &module_name(input))?;

    let result = match settings.backend {
        Backend::Jit => driver::run_module_with_fallback(&module, &settings.codegen),
        Backend::Interpreter => driver::run_module(&module, Backend::Interpreter, &settings.codegen),
    };
    if runtime::line_open() {
        println!();
    }
    println!("{:?}", result?);
    Ok(())
}

fn cmd_ir(input: &Path, format: OutputFormat, no_color: bool, settings: ShellConfig) -> Result<()> {
    let source = read_source(input)?;
    let module = driver::lower_source(&source, &module_name(input))?;

    let mut emitter = settings.emitter;
    if no_color {
        emitter.use_colors = false;
    }
    let listing = vsl::emit::render_module(&module, format, &emitter)?;
    print!("{}", listing);
    if !listing.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn cmd_ast(input: &Path) -> Result<()> {
    let program = parse_file(input)?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}
