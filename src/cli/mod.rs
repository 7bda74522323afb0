//! Command-line interface for the advisor cache.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;

/// Print a command failure and exit non-zero.
///
/// Partial batch failures are rendered with the list of unconfirmed intents
/// so the caller can retry exactly those.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let batch_failure = err.chain().find_map(|cause| match cause.downcast_ref::<DomainError>() {
        Some(DomainError::BatchCommitFailed(failure)) => Some(failure.clone()),
        _ => None,
    });

    if json_mode {
        let mut body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        if let Some(failure) = batch_failure {
            body["unconfirmed_intents"] = serde_json::json!(failure.unconfirmed_intents());
            body["committed_operations"] = serde_json::json!(failure.committed_operations);
        }
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
        if let Some(failure) = batch_failure {
            eprintln!("Unconfirmed intents: {:?}", failure.unconfirmed_intents());
        }
    }

    std::process::exit(1);
}
