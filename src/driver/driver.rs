use std::fs::File;
use std::io::{self, Write};

use termion::color;

use super::config::Config;
use super::error::{paint, DriverError};
use crate::codegen::emit_assembly;
use crate::ir::{cfg_to_dot, cfg_to_svg, generate_tac, optimize, render_numbered};
use crate::parser::{parse, tokenize};
use crate::runtime::interpret;
use crate::semantic::{analyze, Analysis};

pub struct Driver {
    config: Config,
}

// INPUT: SOURCE
// STEP 1: TOKENIZE SOURCE -> TOKENS
// STEP 2: PARSE TOKENS -> AST
// STEP 3: ANALYZE AST -> FINDINGS (advisory)
// STEP 4: LOWER AST -> TAC
// STEP 5: OPTIMIZE TAC -> TAC
// STEP 6: INTERPRET TAC -> OUTPUT
impl Driver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<(), DriverError> {
        let source = self.config.get_source()?;

        if let Some(output) = self.run_source(&source)? {
            if !output.is_empty() {
                println!("{output}");
            }
        }

        Ok(())
    }

    /// Runs every stage on `source`, writing the requested dumps. Returns the
    /// program's output unless this is a dry run.
    pub fn run_source(&self, source: &str) -> Result<Option<String>, DriverError> {
        let config = &self.config;

        let tokens = tokenize(source)?;
        if let Some(path) = &config.tokens_output_path {
            let listing: Vec<String> = tokens.iter().map(|token| token.to_string()).collect();
            output_string(&listing.join("\n"), path.as_deref())?;
        }

        let program = parse(tokens)?;
        if let Some(path) = &config.ast_output_path {
            output_string(&serde_json::to_string_pretty(&program)?, path.as_deref())?;
        }

        let analysis = analyze(&program);
        if config.analyze || config.strict {
            report_findings(&analysis, config.analyze);
        }
        if config.strict && analysis.has_errors() {
            return Err(DriverError::Semantic(analysis.errors.len()));
        }

        let tac = generate_tac(&program);
        if let Some(path) = &config.ir_output_path {
            output_string(&render_numbered(&tac.instructions), path.as_deref())?;
        }

        let instructions = if config.no_optimize {
            tac.instructions
        } else {
            let optimized = optimize(tac.instructions);

            if let Some(path) = &config.opt_output_path {
                let mut listing = render_numbered(&optimized.instructions);
                listing.push_str(&format!(
                    "\n; {} rewrite(s) applied\n",
                    optimized.applied_rewrites.len()
                ));
                for rewrite in optimized.applied_rewrites.iter() {
                    listing.push_str(&format!("; {rewrite}\n"));
                }
                output_string(&listing, path.as_deref())?;
            }

            optimized.instructions
        };

        match &config.cfg_output_path {
            Some(Some(path)) if path.ends_with(".svg") => {
                cfg_to_svg("program", &instructions, path).map_err(|source| {
                    DriverError::Write {
                        path: path.clone(),
                        source,
                    }
                })?;
            }
            Some(path) => output_string(&cfg_to_dot("program", &instructions), path.as_deref())?,
            None => {}
        }

        if let Some(path) = &config.asm_output_path {
            let asm = emit_assembly(&instructions, &tac.function_params)?;
            output_string(&asm, path.as_deref())?;
        }

        if config.dry_run {
            return Ok(None);
        }

        let output = interpret(&instructions, &tac.function_params, read_input_line)?;

        Ok(Some(output))
    }
}

// Findings go to stderr so they never mix with program output.
fn report_findings(analysis: &Analysis, warnings: bool) {
    let tty = termion::is_tty(&io::stderr());

    for error in analysis.errors.iter() {
        eprintln!("{} {error}", paint("error:", color::Red, tty));
    }

    if warnings {
        for warning in analysis.warnings.iter() {
            eprintln!("{} {warning}", paint("warning:", color::Yellow, tty));
        }
    }
}

fn read_input_line(prompt: Option<&str>) -> String {
    if let Some(prompt) = prompt {
        eprint!("{prompt}");
        let _ = io::stderr().flush();
    }

    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }

    line.trim_end_matches(['\n', '\r']).to_string()
}

fn output_string(output: &str, path: Option<&str>) -> Result<(), DriverError> {
    // add the path to the start of the output
    let Some(path) = path else {
        println!("{output}");
        return Ok(());
    };

    let write_err = |source| DriverError::Write {
        path: path.to_string(),
        source,
    };

    let mut file = File::options()
        .append(true)
        .create(true)
        .open(path)
        .map_err(write_err)?;

    file.write_all(format!("===== FILE {path} =====\n").as_bytes())
        .map_err(write_err)?;
    file.write_all(output.as_bytes()).map_err(write_err)?;
    if !output.ends_with('\n') {
        file.write_all(b"\n").map_err(write_err)?;
    }

    Ok(())
}
