/*++
Licensed under the Apache-2.0 license.
Abstract:
    Generic trait definition of Cryptographic functions.
--*/
#![cfg_attr(not(any(feature = "openssl", test)), no_std)]

#[cfg(feature = "openssl")]
pub use crate::openssl::*;
pub use signer::*;

#[cfg(feature = "openssl")]
pub mod openssl;

mod signer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    // NOTE: If a larger digest is added, MUST update DigestAlgorithm::MAX_DIGEST_ALGORITHM
}

impl DigestAlgorithm {
    const MAX_DIGEST_ALGORITHM: Self = Self::Sha384;
    pub const MAX_DIGEST_SIZE: usize = Self::MAX_DIGEST_ALGORITHM.size();
    pub const fn size(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 256 / 8,
            DigestAlgorithm::Sha384 => 384 / 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    AbstractionLayer,
    CryptoLibError(u16),
    Size,
    NotImplemented,
    HashError(u32),
}

pub trait Hasher: Sized {
    /// Adds a chunk to the running hash.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Value to add to hash.
    fn update(&mut self, bytes: &[u8]) -> Result<(), CryptoError>;

    /// Finish a running hash operation and return the result.
    ///
    /// Once this function has been called, the object can no longer be used and
    /// a new one must be created to hash more data.
    fn finish(self) -> Result<Digest, CryptoError>;
}

/// Cryptographic capability consumed by certificate validation.
///
/// Every operation takes `&self` so one implementation can serve independent
/// validations running on different threads.
pub trait Crypto {
    type Hasher<'c>: Hasher
    where
        Self: 'c;

    /// Cryptographically hashes the given buffer.
    ///
    /// # Arguments
    ///
    /// * `alg` - Which digest algorithm to use.
    /// * `bytes` - Value to be hashed.
    fn hash(&self, alg: DigestAlgorithm, bytes: &[u8]) -> Result<Digest, CryptoError> {
        let mut hasher = self.hash_initialize(alg)?;
        hasher.update(bytes)?;
        hasher.finish()
    }

    /// Initialize a running hash. Returns an object that will be able to complete the rest.
    ///
    /// Used for hashing multiple buffers that may not be in consecutive memory.
    ///
    /// # Arguments
    ///
    /// * `alg` - Which digest algorithm to use.
    fn hash_initialize(&self, alg: DigestAlgorithm) -> Result<Self::Hasher<'_>, CryptoError>;

    /// Verify an RSASSA-PSS signature over `msg`.
    ///
    /// MGF1 uses the same digest as the message hash and the salt length is
    /// recovered from the signature. Returns `Ok(false)` when the signature
    /// does not match and an error when the primitive itself failed.
    ///
    /// # Arguments
    ///
    /// * `alg` - Digest used for the message hash and MGF1.
    /// * `pub_key` - Big-endian RSA public key.
    /// * `msg` - The signed message.
    /// * `sig` - Big-endian signature, as long as the modulus.
    fn verify_rsa_pss(
        &self,
        alg: DigestAlgorithm,
        pub_key: &RsaPub,
        msg: &[u8],
        sig: &RsaSig,
    ) -> Result<bool, CryptoError>;
}
