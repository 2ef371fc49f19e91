use std::io::Read;

use clap::{ArgGroup, Parser};

use super::error::DriverError;

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "MiniLang compiler and TAC interpreter", long_about = None)]
#[clap(group(ArgGroup::new("input").args(&["file", "inline", "stdin"])))]
pub struct Config {
    /// Optionally output the token stream to stdout or to a file if provided
    #[clap(short = 't', long = "tokens-output", requires = "input")]
    pub tokens_output_path: Option<Option<String>>,

    /// Optionally output the AST as JSON to stdout or to a file if provided
    #[clap(short = 'a', long = "ast-output", requires = "input")]
    pub ast_output_path: Option<Option<String>>,

    /// Optionally output the unoptimized TAC to stdout or to a file if provided
    #[clap(short = 'r', long = "ir-output", requires = "input")]
    pub ir_output_path: Option<Option<String>>,

    /// Optionally output the optimized TAC and the applied rewrites
    #[clap(short = 'O', long = "opt-output", requires = "input")]
    pub opt_output_path: Option<Option<String>>,

    /// Optionally output 16-bit NASM assembly to stdout or to a file if provided
    #[clap(short = 'S', long = "asm-output", requires = "input")]
    pub asm_output_path: Option<Option<String>>,

    /// Optionally output the control flow graph as DOT, or as SVG for a `.svg` path
    #[clap(short = 'g', long = "cfg-output", requires = "input")]
    pub cfg_output_path: Option<Option<String>>,

    /// No optimizing is done on the TAC
    #[clap(short, long)]
    pub no_optimize: bool,

    /// Print semantic errors and warnings to stderr
    #[clap(long)]
    pub analyze: bool,

    /// Stop before code generation when semantic analysis reports errors
    #[clap(long)]
    pub strict: bool,

    /// Don't execute the program only compile it.
    #[clap(short = 'd', long)]
    pub dry_run: bool,

    /// Optionally read program as an arg
    #[clap(short, long, conflicts_with_all = &["file", "stdin"])]
    pub inline: Option<String>,

    /// Optionally read program from stdin
    #[clap(short, long, conflicts_with_all = &["file", "inline"])]
    pub stdin: bool,

    /// Source file to run
    pub file: Option<String>,
}

impl Config {
    pub fn get_source_path(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn get_source(&self) -> Result<String, DriverError> {
        if let Some(inline) = self.inline.as_ref() {
            return Ok(inline.clone());
        }

        if self.stdin {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|source| DriverError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;

            return Ok(source);
        }

        match self.file.as_ref() {
            Some(path) => std::fs::read_to_string(path).map_err(|source| DriverError::Read {
                path: path.clone(),
                source,
            }),
            None => Err(DriverError::NoInput),
        }
    }

    pub fn input_provided(&self) -> bool {
        self.inline.is_some() || self.stdin || self.file.is_some()
    }
}

impl TryFrom<Vec<&str>> for Config {
    type Error = String;
    fn try_from(args: Vec<&str>) -> Result<Self, Self::Error> {
        match Config::try_parse_from(args) {
            Ok(config) => Ok(config),
            Err(e) => Err(e.to_string()),
        }
    }
}
