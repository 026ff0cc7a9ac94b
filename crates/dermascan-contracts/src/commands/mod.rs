mod parser;
mod registry;

pub use parser::{parse_intent, Intent};
pub use registry::SESSION_HELP_COMMANDS;
