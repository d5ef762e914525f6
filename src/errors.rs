use thiserror::Error;

/// Error depicting errors that end a pricing run
///
#[derive(Debug, Error)]
#[error("error while pricing spot series: {0}")]
pub struct PricingRunError(pub String);
