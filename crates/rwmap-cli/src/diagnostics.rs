//! Error reporting

use crate::{CliError, Result};

/// Install miette as the global report handler.
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Renders `error` with its diagnostic code, labels and help.
pub fn render_report(error: CliError) -> String {
    format!("{:?}", miette::Report::new(error))
}
