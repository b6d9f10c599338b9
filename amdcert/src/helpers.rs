/*++
Licensed under the Apache-2.0 license.

Abstract:
    Byte-order and hashing helpers used by certificate validation.
--*/

use crate::AmdCert;
use crypto::{Crypto, CryptoError, Digest, DigestAlgorithm, Hasher, RsaBuf};

/// Reverses `bytes` in place.
///
/// AMD certificates store the exponent, modulus and signature little-endian,
/// while big-number libraries expect big-endian.
pub fn reverse_bytes(bytes: &mut [u8]) {
    bytes.reverse();
}

/// Returns a reversed copy of `le`, leaving the source untouched.
///
/// # Arguments
///
/// * `le` - Little-endian integer as stored in a certificate.
pub fn to_big_endian(le: &[u8]) -> Result<RsaBuf, CryptoError> {
    let mut be = [0u8; crypto::MAX_RSA_SIZE];
    let be = be.get_mut(..le.len()).ok_or(CryptoError::Size)?;
    be.copy_from_slice(le);
    reverse_bytes(be);
    RsaBuf::new(be)
}

/// SHA-256 over the certificate's exponent followed by its modulus, each at
/// its declared length.
pub fn public_key_digest<C: Crypto>(crypto: &C, cert: &AmdCert) -> Result<Digest, CryptoError> {
    let mut hasher = crypto.hash_initialize(DigestAlgorithm::Sha256)?;
    hasher.update(cert.pub_exp())?;
    hasher.update(cert.modulus())?;
    hasher.finish()
}
