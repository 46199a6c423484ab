use openssl::error::ErrorStack;
use thiserror::Error;

/// Errors produced by the generation pipeline.
///
/// Every stage is fail-fast: the first error aborts the remaining stages for
/// that request, nothing is retried internally, and no partial artifact is
/// returned. Reporting (logging, user messages) is the caller's concern.
#[derive(Debug, Error)]
pub enum CertError {
    /// The caller named an elliptic curve this crate does not implement.
    /// Non-retryable; the request must be corrected.
    #[error("unrecognized elliptic curve: {0:?}")]
    UnsupportedAlgorithm(String),

    /// Both an ECDSA curve and an Ed25519 key were requested. At most one
    /// algorithm family may be selected per request.
    #[error("ambiguous algorithm selection: both an ECDSA curve and Ed25519 were requested")]
    AmbiguousAlgorithmSelection,

    /// Key material, or the random serial number, could not be generated.
    /// Rare; usually indicates a starved entropy source.
    #[error("key generation failed")]
    KeyGenerationFailed(#[source] ErrorStack),

    /// The self-signature could not be produced.
    #[error("certificate signing failed")]
    SigningFailed(#[source] ErrorStack),

    /// The certificate or private key could not be serialized. Should not
    /// happen for any of the supported key families; treat as a defect.
    #[error("PEM encoding failed")]
    EncodingFailed(#[source] ErrorStack),
}
