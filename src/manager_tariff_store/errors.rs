use thiserror::Error;

/// Error depicting data-integrity and access failures of a tariff store.
/// Missing reference data is never an error, the pricing formulas fall back to defaults.
///
#[derive(Debug, Error)]
pub enum TariffStoreError {
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    #[error("DocumentError: {0}")]
    DocumentError(#[from] toml::de::Error),
    #[error("PeakHoursError: {0}")]
    PeakHoursError(#[from] serde_json::Error),
    #[error("MixedGenerationError: tariff definition {0} mixes loss factor and peak hours parameters")]
    MixedGenerationError(u64),
    #[error("ValidityWindowError: tariff definition {0} ends before it starts")]
    ValidityWindowError(u64),
    #[error("DuplicateIdError: tariff definition id {0} is used more than once")]
    DuplicateIdError(u64),
    #[error("NotFoundError: no tariff definition with id {0}")]
    NotFoundError(u64),
}
