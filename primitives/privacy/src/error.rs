use thiserror::Error;

/// Failure kinds shared by every coin, key and proof operation.
///
/// The set is closed: decoders, constructors and verifiers all report through
/// it, each variant carrying the field or statement that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivacyError {
    /// Length out of range or truncated buffer.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(&'static str),
    /// A point or scalar failed its validity check.
    #[error("invalid curve element: {0}")]
    InvalidCurveElement(&'static str),
    /// A recomputed commitment disagrees with the stored one.
    #[error("commitment mismatch: {0}")]
    CommitmentMismatch(&'static str),
    /// Missing key material or a failed ElGamal/AES step.
    #[error("decryption failure: {0}")]
    DecryptionFailure(&'static str),
    /// A coin or proof of the wrong version was supplied.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The one-time address search ran out of candidate indices.
    #[error("no one-time address found after {0} tries")]
    OtaExhausted(u32),
    /// The packed shard digits cannot represent this many shards.
    #[error("unsupported shard configuration: {0} shards")]
    UnsupportedShardConfig(u8),
    /// A proof identity did not hold.
    #[error("proof verification failed: {0}")]
    ProofVerificationFailed(&'static str),
    /// A caller-side precondition was violated.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

pub type Result<T> = core::result::Result<T, PrivacyError>;
