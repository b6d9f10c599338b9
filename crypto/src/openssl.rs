// Licensed under the Apache-2.0 license

use crate::{Crypto, CryptoError, Digest, DigestAlgorithm, Hasher, RsaPub, RsaSig};
use openssl::{
    bn::BigNum,
    error::ErrorStack,
    hash::MessageDigest,
    pkey::{PKey, Public},
    rsa::{Padding, Rsa},
    sign::{RsaPssSaltlen, Verifier},
};

const OPENSSL_HASH_ERROR: CryptoError = CryptoError::HashError(1);
const OPENSSL_KEY_ERROR: CryptoError = CryptoError::CryptoLibError(1);
const OPENSSL_VERIFY_ERROR: CryptoError = CryptoError::CryptoLibError(2);

// RSA_PSS_SALTLEN_AUTO: recover the salt length from the signature.
const PSS_SALTLEN_AUTO: i32 = -2;

pub struct OpensslHasher(openssl::hash::Hasher, DigestAlgorithm);

impl Hasher for OpensslHasher {
    fn update(&mut self, bytes: &[u8]) -> Result<(), CryptoError> {
        self.0.update(bytes).map_err(|_| OPENSSL_HASH_ERROR)
    }

    fn finish(mut self) -> Result<Digest, CryptoError> {
        Digest::new(&self.0.finish().map_err(|_| OPENSSL_HASH_ERROR)?, self.1)
    }
}

#[derive(Default)]
pub struct OpensslCrypto;

impl OpensslCrypto {
    pub fn new() -> Self {
        Self {}
    }

    fn get_digest(alg: DigestAlgorithm) -> MessageDigest {
        match alg {
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
            DigestAlgorithm::Sha384 => MessageDigest::sha384(),
        }
    }

    fn rsa_pkey(pub_key: &RsaPub) -> Result<PKey<Public>, ErrorStack> {
        let n = BigNum::from_slice(pub_key.n.bytes())?;
        let e = BigNum::from_slice(pub_key.e.bytes())?;
        PKey::from_rsa(Rsa::from_public_components(n, e)?)
    }

    fn pss_verify(
        md: MessageDigest,
        pkey: &PKey<Public>,
        msg: &[u8],
        sig: &[u8],
    ) -> Result<bool, ErrorStack> {
        let mut verifier = Verifier::new(md, pkey)?;
        verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
        verifier.set_rsa_mgf1_md(md)?;
        verifier.set_rsa_pss_saltlen(RsaPssSaltlen::custom(PSS_SALTLEN_AUTO))?;
        verifier.update(msg)?;
        verifier.verify(sig)
    }
}

impl Crypto for OpensslCrypto {
    type Hasher<'c>
        = OpensslHasher
    where
        Self: 'c;

    fn hash_initialize(&self, alg: DigestAlgorithm) -> Result<Self::Hasher<'_>, CryptoError> {
        let md = Self::get_digest(alg);
        Ok(OpensslHasher(
            openssl::hash::Hasher::new(md).map_err(|_| OPENSSL_HASH_ERROR)?,
            alg,
        ))
    }

    fn verify_rsa_pss(
        &self,
        alg: DigestAlgorithm,
        pub_key: &RsaPub,
        msg: &[u8],
        sig: &RsaSig,
    ) -> Result<bool, CryptoError> {
        let pkey = Self::rsa_pkey(pub_key).map_err(|_| OPENSSL_KEY_ERROR)?;
        Self::pss_verify(Self::get_digest(alg), &pkey, msg, sig.bytes())
            .map_err(|_| OPENSSL_VERIFY_ERROR)
    }
}
