use thiserror::Error;

/// The only failure the production pipeline knows about: the caller handed it
/// something it cannot compute with. Retrying with the same input is pointless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PipelineError::InvalidInput(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Configuration rejected: {0}")]
    Invalid(String),
}

/// Failure of a configured run: bad configuration or rejected pipeline input.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Fails with `InvalidInput` naming `what` when any value is NaN or infinite.
pub(crate) fn ensure_finite<'a>(
    what: &str,
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<(), PipelineError> {
    match values.into_iter().position(|v| !v.is_finite()) {
        Some(i) => Err(PipelineError::invalid(format!(
            "{what} contains a non-finite value at sample {i}"
        ))),
        None => Ok(()),
    }
}
