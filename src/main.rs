mod analyzer;
mod builtins;
mod config;
mod core;
mod datakeys;
mod driver;
mod env;
mod error;
mod eval;
mod flex;
mod formatter;
mod help;
mod highlighter;
mod json;
mod raw;
mod reader;
mod value;

use clap::Parser;
use config::{HELP_TEXT, VERSION, WELCOME_FOOTER, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use driver::Outcome;
use formatter::{to_source, FormatterOptions};
use highlighter::LispHelper;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use value::Value;

/// PTC-Lisp interpreter: an embedded Clojure-flavored expression language for LLM agent output
#[derive(Parser, Debug)]
#[command(name = "ptc-lisp")]
#[command(version = VERSION)]
#[command(about = "A sandboxed expression-language interpreter for LLM agent output")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// JSON file providing the program's ctx(...) bindings
    #[arg(long = "ctx", value_name = "JSON_FILE")]
    ctx_file: Option<PathBuf>,

    /// JSON file providing the program's initial memory(...) bindings
    #[arg(long = "memory", value_name = "JSON_FILE")]
    memory_file: Option<PathBuf>,
}

/// The CLI's demo tool executor: answers `(ctx/echo ...)`/`(call "echo" ...)` by
/// returning its args unchanged, and anything else with a tool error. A real
/// host embeds `driver::run` with its own closure in place of this one.
fn demo_tool_exec(name: &str, args: Value, _memory: &mut Value) -> Result<Value, error::RuntimeError> {
    match name {
        "echo" => Ok(args),
        other => Err(error::RuntimeError::ToolError {
            name: other.to_string(),
            reason: "no host tool executor configured; only \"echo\" is available in this CLI".to_string(),
        }),
    }
}

fn load_json_arg(path: &Option<PathBuf>) -> Result<Value, Box<dyn std::error::Error>> {
    match path {
        None => Ok(Value::map(vec![])),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let json: serde_json::Value = serde_json::from_str(&text)?;
            Ok(json::from_json(&json))
        }
    }
}

fn print_outcome(outcome: &Outcome) {
    let opts = FormatterOptions::default();
    match outcome {
        Outcome::Returned { value, .. } => println!("=> {}", to_source(value, &opts)),
        Outcome::Completed { value, .. } => println!("=> {}", to_source(value, &opts)),
        Outcome::Failed { reason, .. } => eprintln!("FAIL: {}", to_source(reason, &opts)),
        Outcome::Error(e) => eprintln!("Error: {e}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let ctx = load_json_arg(&args.ctx_file)?;
    let memory = load_json_arg(&args.memory_file)?;

    if let Some(script_path) = args.script {
        let source = std::fs::read_to_string(&script_path)
            .map_err(|e| format!("cannot read script file {}: {e}", script_path.display()))?;
        let outcome = driver::run(&source, ctx, memory, demo_tool_exec);
        print_outcome(&outcome);
        if matches!(outcome, Outcome::Error(_) | Outcome::Failed { .. }) {
            std::process::exit(1);
        }
        return Ok(());
    }

    run_repl(ctx, memory)
}

fn run_repl(ctx: Value, memory: Value) -> Result<(), Box<dyn std::error::Error>> {
    // Populate the help registry up front so `(help)` works before the first
    // program runs (driver::run also does this per-run, against a fresh env).
    builtins::register_all(&env::Environment::new());

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {e}"))?;
    rl.set_helper(Some(LispHelper::new()));

    let history_file = ".ptc_lisp_history";
    let _ = rl.load_history(history_file);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");
    println!("{WELCOME_FOOTER}");
    print!("{HELP_TEXT}");

    let mut memory = memory;
    loop {
        let readline = rl.readline("ptc-lisp> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.trim() {
                    "(quit)" | "(exit)" => {
                        println!("Goodbye!");
                        break;
                    }
                    "(clear)" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    _ => {}
                }

                let outcome = driver::run(&line, ctx.clone(), memory.clone(), demo_tool_exec);
                match &outcome {
                    Outcome::Completed { memory: m, .. }
                    | Outcome::Returned { memory: m, .. }
                    | Outcome::Failed { memory: m, .. } => memory = m.clone(),
                    Outcome::Error(_) => {}
                }
                print_outcome(&outcome);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
