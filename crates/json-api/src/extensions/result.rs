//! Result helper extensions for HTTP handlers.

use std::error::Error;

use salvo::prelude::StatusError;
use tracing::error;

/// Log a failure with its full source chain and answer with a bare 500.
/// Nothing from the error reaches the response body.
pub(crate) trait ResultExt<T> {
    fn or_500(self, context: &str) -> Result<T, StatusError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error,
{
    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|failure| {
            error!(context, error = %source_chain(&failure), "request failed");

            StatusError::internal_server_error()
        })
    }
}

fn source_chain(failure: &dyn Error) -> String {
    let mut chain = failure.to_string();
    let mut source = failure.source();

    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    chain
}
