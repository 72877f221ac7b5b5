// ABOUTME: Version info, welcome messages, and CLI-facing constants

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "PTC-Lisp REPL";
pub const WELCOME_SUBTITLE: &str = "An embedded Clojure-flavored expression language for LLM agent output";
pub const WELCOME_FOOTER: &str = "Type (help) for the function reference, (quit) to exit.";

pub const HELP_TEXT: &str = r#"
Available REPL commands:
  (quit) or (exit)     - Exit the REPL
  (help)               - Show the function reference
  (clear)              - Clear the screen

Every other input is read as one PTC-Lisp program and run to completion:
  (return value)  -> ends the run with a result
  (fail reason)   -> ends the run with a named failure
Anything else evaluates to its last expression's value.

Use --ctx/--memory to seed the program's ctx(...) and memory(...) state
from a JSON file when running a script (see --help).
"#;
