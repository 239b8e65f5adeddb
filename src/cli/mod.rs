//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;

/// Print a command failure and exit non-zero.
///
/// Exit code 2 means the requested product does not exist; anything else is 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = match err.downcast_ref::<DomainError>() {
        Some(e) if e.is_not_found() => 2,
        _ => 1,
    };

    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }

    std::process::exit(code);
}
