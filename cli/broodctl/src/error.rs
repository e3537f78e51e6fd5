//! CLI errors and how they are shown.

use colored::Colorize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The controller answered with a problem body.
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("could not reach the controller: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn api(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
            request_id,
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Api { status: 404, .. } => Some("Check the name and the --namespace flag."),
            CliError::Api { status: 409, .. } => {
                Some("The object changed while being written. Run the command again.")
            }
            CliError::Api { status: 503, .. } => Some("The controller's store is not ready yet."),
            CliError::Network(_) => Some("Is the controller running? Check --api-url or BROOD_API_URL."),
            _ => None,
        }
    }

    fn request_id(&self) -> Option<&str> {
        match self {
            CliError::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Print an error, followed by a hint and the request id when known.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let Some(cli_err) = err.downcast_ref::<CliError>() else {
        return;
    };
    if let Some(hint) = cli_err.hint() {
        eprintln!("\n{} {}", "Hint:".yellow().bold(), hint);
    }
    if let Some(request_id) = cli_err.request_id() {
        eprintln!("Request ID: {}", request_id.dimmed());
    }
}
