// Licensed under the Apache-2.0 license

use crate::{CryptoError, DigestAlgorithm};
use arrayvec::ArrayVec;

/// Largest supported RSA modulus, in bytes.
pub const MAX_RSA_SIZE: usize = 4096 / 8;

/// An RSA public key. Both components are big-endian.
pub struct RsaPub {
    pub e: RsaBuf,
    pub n: RsaBuf,
}

/// An RSA signature, big-endian.
pub type RsaSig = RsaBuf;

/// Big-endian RSA integer storage.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaBuf(ArrayVec<u8, MAX_RSA_SIZE>);

impl RsaBuf {
    pub fn new(bytes: &[u8]) -> Result<RsaBuf, CryptoError> {
        let mut vec = ArrayVec::new();
        vec.try_extend_from_slice(bytes)
            .map_err(|_| CryptoError::Size)?;
        Ok(RsaBuf(vec))
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }
}

impl core::fmt::Debug for RsaBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "RsaBuf({} bytes)", self.len())
    }
}

/// A message digest.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Digest(ArrayVec<u8, { DigestAlgorithm::MAX_DIGEST_SIZE }>);

impl Digest {
    pub fn new(bytes: &[u8], alg: DigestAlgorithm) -> Result<Digest, CryptoError> {
        if bytes.len() != alg.size() {
            return Err(CryptoError::Size);
        }
        let mut vec = ArrayVec::new();
        vec.try_extend_from_slice(bytes)
            .map_err(|_| CryptoError::Size)?;
        Ok(Digest(vec))
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    pub fn write_hex_str(&self, dest: &mut [u8]) -> Result<(), CryptoError> {
        let src = self.bytes();
        if dest.len() != src.len() * 2 {
            return Err(CryptoError::Size);
        }

        const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
        for (pair, &b) in dest.chunks_exact_mut(2).zip(src) {
            pair[0] = HEX_CHARS[(b >> 4) as usize];
            pair[1] = HEX_CHARS[(b & 0xF) as usize];
        }

        Ok(())
    }
}
