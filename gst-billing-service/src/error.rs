use service_core::error::AppError;
use thiserror::Error;

/// Failures of the invoice workflow.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// A numeric item field could not be read as a number.
    #[error("Invalid {field} '{value}': {reason}")]
    Parse {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to generate invoice: {0:#}")]
    Generation(anyhow::Error),

    #[error("Failed to save invoice to ledger: {0:#}")]
    Persistence(anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl InvoiceError {
    pub fn not_a_number(field: &'static str, value: impl Into<String>) -> Self {
        InvoiceError::Parse {
            field,
            value: value.into(),
            reason: "not a number",
        }
    }

    pub fn out_of_range(field: &'static str, value: impl Into<String>) -> Self {
        InvoiceError::Parse {
            field,
            value: value.into(),
            reason: "out of range",
        }
    }

    /// Short label used for logs and the failure counter.
    pub fn kind(&self) -> &'static str {
        match self {
            InvoiceError::Parse { .. } => "parse",
            InvoiceError::Generation(_) => "generation",
            InvoiceError::Persistence(_) => "persistence",
            InvoiceError::Validation(_) => "validation",
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Validation(errors) => AppError::ValidationError(errors),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}
