//! # privacy-zkp
//!
//! Zero-knowledge proof systems used by transaction proofs:
//!
//! - [`sn_privacy`]: serial number is well formed for a committed key and derivator
//! - [`sn_no_privacy`]: serial number is well formed for a public key and derivator
//! - [`one_out_of_many`]: one member of a commitment ring opens to zero
//! - [`bulletproofs`]: aggregated 64-bit range proof with a logarithmic inner-product argument
//!
//! All challenges are derived from `merlin` transcripts, except where a caller
//! supplies an explicit challenge (`mess`) to bind several proofs together.

pub mod bulletproofs;
pub mod one_out_of_many;
pub mod sn_no_privacy;
pub mod sn_privacy;
#[cfg(test)]
mod tests;

pub use bulletproofs::{
    AggregatedRangeProof, AggregatedRangeWitness, InnerProductProof, RANGE_PROOF_VERSION_1,
    RANGE_PROOF_VERSION_2,
};
pub use one_out_of_many::{OneOutOfManyProof, OneOutOfManyWitness, ONE_OF_MANY_PROOF_SIZE};
pub use sn_no_privacy::{
    SnNoPrivacyProof, SnNoPrivacyStatement, SnNoPrivacyWitness, SN_NO_PRIVACY_PROOF_SIZE,
};
pub use sn_privacy::{SnPrivacyProof, SnPrivacyStatement, SnPrivacyWitness, SN_PRIVACY_PROOF_SIZE};
