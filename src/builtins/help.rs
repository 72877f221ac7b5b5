//! Help system operations: help
//!
//! Not part of the runtime library spec.md describes — a REPL/CLI
//! convenience built on the same `crate::help` registry every other builtin
//! module registers itself into.

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_help(args: &[Value]) -> Result<Value, RuntimeError> {
    use crate::help;

    match args.len() {
        0 => {
            println!("{}", help::format_quick_reference());
            Ok(Value::Nil)
        }
        1 => match &args[0] {
            Value::String(name) | Value::Keyword(name) => match help::get_help(name) {
                Some(entry) => {
                    println!("{}", help::format_help_entry(&entry));
                    Ok(Value::Nil)
                }
                None => Err(RuntimeError::Custom(format!("no help found for '{name}'"))),
            },
            other => Err(RuntimeError::type_error("help", "string or keyword", other)),
        },
        _ => Err(RuntimeError::arity_error("help", crate::error::ARITY_ZERO_OR_ONE, args.len())),
    }
}

pub fn register(env: &Rc<Environment>) {
    env.define("help".to_string(), Value::BuiltIn(builtin_help));

    crate::help::register_help(crate::help::HelpEntry {
        name: "help".to_string(),
        signature: "(help) or (help \"function-name\")".to_string(),
        description: "Shows quick reference with no arguments, or detailed documentation for one function.".to_string(),
        examples: vec!["(help) => shows quick reference".to_string(), "(help \"get\") => detailed help for get".to_string()],
        related: vec![],
        category: "Help system".to_string(),
    });
}
