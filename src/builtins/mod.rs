//! Built-in functions.
//!
//! Each sub-module owns one corner of the runtime library (spec.md §4.4) and
//! exposes a `register(env: &Rc<Environment>)` that wires its functions into
//! the environment and its documentation into the help registry.

use crate::env::Environment;
use std::rc::Rc;

pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod help;
pub mod maps;
pub mod strings;
pub mod types;

/// Populates a fresh top-level environment with the full runtime library.
pub fn register_all(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    types::register(env);
    strings::register(env);
    maps::register(env);
    collections::register(env);
    help::register(env);
}
