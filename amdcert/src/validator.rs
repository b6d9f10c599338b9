/*++
Licensed under the Apache-2.0 license.

Abstract:
    Validation of the AMD Root Key -> AMD Signing Key certificate chain.
--*/

use crate::{
    cert::AmdCertHeader, validate_common, AmdCert, AmdCertError, AmdPublicKey, CertificateDefect,
    KeyId, KeyUsage, AMD_CERT_KEY_BITS_2K, AMD_CERT_KEY_BITS_4K, AMD_CERT_KEY_BYTES_4K,
    AMD_ROOT_KEY_ID,
};
use arrayvec::ArrayVec;
use constant_time_eq::constant_time_eq;
use crypto::{Crypto, DigestAlgorithm, RsaSig};
use log::{debug, warn};
use zerocopy::IntoBytes;

use crate::helpers::to_big_endian;

/// Header, exponent and modulus of the largest certificate.
const MAX_SIGNED_SIZE: usize = AmdCertHeader::SIZE + 2 * AMD_CERT_KEY_BYTES_4K;

/// Validates AMD certificates against a pinned root key ID.
///
/// The validator holds no state besides its configuration, so one instance
/// can be shared between threads as long as `C` is `Sync`.
pub struct ChainValidator<'a, C: Crypto> {
    crypto: &'a C,
    root_key_id: KeyId,
}

impl<'a, C: Crypto> ChainValidator<'a, C> {
    /// Creates a validator that trusts the AMD Root Key.
    pub fn new(crypto: &'a C) -> Self {
        Self::with_root_key_id(crypto, AMD_ROOT_KEY_ID)
    }

    /// Creates a validator pinned to a different root key ID.
    pub fn with_root_key_id(crypto: &'a C, root_key_id: KeyId) -> Self {
        Self {
            crypto,
            root_key_id,
        }
    }

    /// Validates a self-signed AMD Root Key certificate.
    pub fn validate_root(&self, ark: &AmdCert) -> Result<(), AmdCertError> {
        self.validate_role(ark, KeyUsage::Ark)?;

        if !constant_time_eq(ark.key_id(), &self.root_key_id) {
            warn!(
                "root certificate key ID {:02x?} is not the pinned root {:02x?}",
                ark.key_id(),
                self.root_key_id
            );
            return Err(CertificateDefect::UntrustedRoot.into());
        }

        self.validate_sig(ark, ark)
    }

    /// Validates an AMD Signing Key certificate issued by `ark`.
    ///
    /// `ark` is only used as the issuer; validate it with
    /// [`ChainValidator::validate_root`] first.
    pub fn validate_subordinate(&self, ask: &AmdCert, ark: &AmdCert) -> Result<(), AmdCertError> {
        self.validate_role(ask, KeyUsage::Ask)?;

        if !constant_time_eq(ask.certifying_id(), ark.key_id()) {
            warn!(
                "signing key certified by {:02x?}, issuer key ID is {:02x?}",
                ask.certifying_id(),
                ark.key_id()
            );
            return Err(CertificateDefect::IssuerMismatch.into());
        }

        self.validate_sig(ask, ark)
    }

    /// Validates the whole chain and returns the signing key.
    pub fn validate_chain(&self, ask: &AmdCert, ark: &AmdCert) -> Result<AmdPublicKey, AmdCertError> {
        self.validate_root(ark)?;
        self.validate_subordinate(ask, ark)?;
        Ok(ask.public_key())
    }

    fn validate_role(&self, cert: &AmdCert, expected: KeyUsage) -> Result<(), AmdCertError> {
        validate_common(cert).map_err(|err| {
            warn!("{expected:?} certificate rejected: {err}");
            err
        })?;

        if cert.key_usage() != expected as u32 {
            warn!(
                "expected {expected:?} certificate, found usage {:#x}",
                cert.key_usage()
            );
            return Err(CertificateDefect::UnexpectedUsage.into());
        }
        Ok(())
    }

    /// Verifies `cert`'s signature with `parent`'s public key.
    fn validate_sig(&self, cert: &AmdCert, parent: &AmdCert) -> Result<(), AmdCertError> {
        let alg = match parent.modulus_size() {
            AMD_CERT_KEY_BITS_2K => DigestAlgorithm::Sha256,
            AMD_CERT_KEY_BITS_4K => DigestAlgorithm::Sha384,
            size => {
                warn!("issuer modulus of {size} bits cannot verify signatures");
                return Err(CertificateDefect::UnsupportedKeySize.into());
            }
        };

        let mut msg = ArrayVec::<u8, MAX_SIGNED_SIZE>::new();
        for field in [cert.header().as_bytes(), cert.pub_exp(), cert.modulus()] {
            msg.try_extend_from_slice(field)
                .map_err(|_| AmdCertError::InvalidParameter)?;
        }

        // The signature is as long as the signer's modulus; the rest of the
        // 512-byte field is padding.
        let sig_len = (parent.modulus_size() / 8) as usize;
        let sig = cert
            .signature()
            .get(..sig_len)
            .ok_or(AmdCertError::BadSignature)?;
        let sig: RsaSig = to_big_endian(sig).map_err(|_| AmdCertError::BadSignature)?;
        let pub_key = parent.public_key().to_rsa_pub().map_err(|err| {
            warn!("issuer public key unusable: {err:?}");
            AmdCertError::BadSignature
        })?;

        match self.crypto.verify_rsa_pss(alg, &pub_key, &msg, &sig) {
            Ok(true) => {
                debug!("signature of {:02x?} verified", cert.key_id());
                Ok(())
            }
            Ok(false) => {
                warn!("signature of {:02x?} does not verify", cert.key_id());
                Err(AmdCertError::BadSignature)
            }
            Err(err) => {
                warn!("signature verification of {:02x?} failed: {err:?}", cert.key_id());
                Err(AmdCertError::BadSignature)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{self, TestCert, TestKeys, ASK_KEY_ID};
    use crate::AMD_CERT_SIG_SIZE;
    use crypto::{CryptoError, Digest, Hasher, OpensslCrypto, RsaPub};

    fn parse(bytes: &[u8]) -> AmdCert {
        AmdCert::parse(bytes).unwrap()
    }

    #[test]
    fn test_end_to_end_2k() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let ask_bytes = test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k);
        let ask = parse(&ask_bytes);

        assert_eq!(validator.validate_root(&ark), Ok(()));
        assert_eq!(validator.validate_subordinate(&ask, &ark), Ok(()));

        let sev_cert = ask.export_pub_key().unwrap();
        assert_eq!(sev_cert.rsa_pub_exp(), &ask_bytes[64..64 + 256]);
        assert_eq!(sev_cert.rsa_modulus(), &ask_bytes[64 + 256..64 + 512]);
    }

    #[test]
    fn test_end_to_end_4k() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_4k));
        let ask_bytes = test_util::ask_bytes(&keys.ask_4k, &keys.ark_4k);
        let ask = parse(&ask_bytes);

        let signing_key = validator.validate_chain(&ask, &ark).unwrap();
        assert_eq!(signing_key, ask.public_key());

        let sev_cert = ask.export_pub_key().unwrap();
        assert_eq!(sev_cert.rsa_pub_exp(), &ask_bytes[64..64 + 512]);
        assert_eq!(sev_cert.rsa_modulus(), &ask_bytes[64 + 512..64 + 1024]);
    }

    #[test]
    fn test_mixed_key_sizes() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_4k));
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.ark_4k));

        assert_eq!(validator.validate_chain(&ask, &ark).map(|_| ()), Ok(()));
    }

    #[test]
    fn test_subject_larger_than_issuer() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let mut ask_bytes = test_util::ask_bytes(&keys.ask_4k, &keys.ark_2k);
        let ask = parse(&ask_bytes);
        assert_eq!(ask.modulus_size(), 4096);

        let signing_key = validator.validate_chain(&ask, &ark).unwrap();
        assert_eq!(signing_key.modulus_size, 4096);

        // Only the first 256 signature bytes belong to a 2048-bit issuer.
        let sig_offset = ask.size() - AMD_CERT_SIG_SIZE;
        ask_bytes[sig_offset + 256] ^= 0xff;
        assert_eq!(
            validator.validate_subordinate(&parse(&ask_bytes), &ark),
            Ok(())
        );
        ask_bytes[sig_offset + 255] ^= 0xff;
        assert_eq!(
            validator.validate_subordinate(&parse(&ask_bytes), &ark),
            Err(AmdCertError::BadSignature)
        );
    }

    #[test]
    fn test_root_must_be_pinned() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();

        // Correctly self-signed, but not the AMD root.
        let bytes = TestCert::ark(&keys.ark_2k)
            .key_id(ASK_KEY_ID)
            .certifying_id(ASK_KEY_ID)
            .sign(&keys.ark_2k);
        let ark = parse(&bytes);

        let err = validator.validate_root(&ark).unwrap_err();
        assert_eq!(err, CertificateDefect::UntrustedRoot.into());
        assert!(err.is_trust_pinning_failure());

        // The same certificate is trusted once its key ID is the pinned one.
        let validator = ChainValidator::with_root_key_id(&crypto, ASK_KEY_ID);
        assert_eq!(validator.validate_root(&ark), Ok(()));
    }

    #[test]
    fn test_root_rejects_ask_usage() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let bytes = TestCert::ark(&keys.ark_2k)
            .key_usage(KeyUsage::Ask as u32)
            .sign(&keys.ark_2k);

        assert_eq!(
            validator.validate_root(&parse(&bytes)),
            Err(CertificateDefect::UnexpectedUsage.into())
        );
    }

    #[test]
    fn test_root_rejects_unknown_usage() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let bytes = TestCert::ark(&keys.ark_2k)
            .key_usage(0x1002)
            .sign(&keys.ark_2k);

        assert_eq!(
            validator.validate_root(&parse(&bytes)),
            Err(CertificateDefect::UnknownUsage.into())
        );
    }

    #[test]
    fn test_root_tampered_byte() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let bytes = test_util::ark_bytes(&keys.ark_2k);

        let reserved = 40;
        let certifying_id = 20;
        let exponent = AmdCertHeader::SIZE;
        let modulus = AmdCertHeader::SIZE + 256;
        for offset in [
            reserved,
            reserved + 15,
            certifying_id,
            exponent,
            exponent + 1,
            exponent + 255,
            modulus,
            modulus + 100,
            modulus + 255,
        ] {
            let mut tampered = bytes.clone();
            tampered[offset] ^= 0x01;
            assert_eq!(
                validator.validate_root(&parse(&tampered)),
                Err(AmdCertError::BadSignature),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn test_root_tampered_signature() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let bytes = test_util::ark_bytes(&keys.ark_2k);
        let sig = AmdCertHeader::SIZE + 512;

        for offset in [sig, sig + 128, sig + 255] {
            let mut tampered = bytes.clone();
            tampered[offset] ^= 0x80;
            assert_eq!(
                validator.validate_root(&parse(&tampered)),
                Err(AmdCertError::BadSignature),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn test_subordinate_wrong_issuer() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));

        // Validly signed by an unrelated key that names itself as issuer.
        let other_id = [0x42; 16];
        let bytes = TestCert::ask(&keys.ask_2k)
            .certifying_id(other_id)
            .sign(&keys.other_2k);
        assert_eq!(
            validator.validate_subordinate(&parse(&bytes), &ark),
            Err(CertificateDefect::IssuerMismatch.into())
        );

        let other = parse(
            &TestCert::ark(&keys.other_2k)
                .key_id(other_id)
                .certifying_id(other_id)
                .sign(&keys.other_2k),
        );
        let validator = ChainValidator::with_root_key_id(&crypto, other_id);
        assert_eq!(validator.validate_subordinate(&parse(&bytes), &other), Ok(()));
    }

    #[test]
    fn test_subordinate_signed_by_wrong_key() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));

        // Claims the AMD root as issuer but was signed by someone else.
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.other_2k));
        assert_eq!(
            validator.validate_subordinate(&ask, &ark),
            Err(AmdCertError::BadSignature)
        );
    }

    #[test]
    fn test_subordinate_rejects_ark_usage() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));

        assert_eq!(
            validator.validate_subordinate(&ark, &ark),
            Err(CertificateDefect::UnexpectedUsage.into())
        );
    }

    #[test]
    fn test_subordinate_corrupt_signature() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let bytes = test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k);
        let sig = AmdCertHeader::SIZE + 512;

        for offset in [sig, sig + 1, sig + 200, sig + 255] {
            let mut tampered = bytes.clone();
            tampered[offset] = tampered[offset].wrapping_add(1);
            let ask = parse(&tampered);

            assert_eq!(validate_common(&ask), Ok(()));
            assert_eq!(
                validator.validate_subordinate(&ask, &ark),
                Err(AmdCertError::BadSignature),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn test_signature_padding_is_ignored() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let mut bytes = test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k);

        // A 2048-bit issuer only fills the first half of the signature field.
        let padding = AmdCertHeader::SIZE + 512 + 256;
        bytes[padding] = 0xff;
        assert_eq!(validator.validate_subordinate(&parse(&bytes), &ark), Ok(()));
    }

    #[test]
    fn test_byte_order_is_required() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();

        // Signature stored big-endian instead of little-endian.
        let bytes = TestCert::ark(&keys.ark_2k)
            .big_endian_signature()
            .sign(&keys.ark_2k);
        assert_eq!(
            validator.validate_root(&parse(&bytes)),
            Err(AmdCertError::BadSignature)
        );

        // Key material stored big-endian instead of little-endian.
        let bytes = TestCert::ark(&keys.ark_2k)
            .big_endian_key()
            .sign(&keys.ark_2k);
        assert_eq!(
            validator.validate_root(&parse(&bytes)),
            Err(AmdCertError::BadSignature)
        );
    }

    #[test]
    fn test_issuer_with_unsupported_size() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k));

        let mut header = *ark.header();
        header.modulus_size.set(1024);
        let bad_ark = test_util::with_header(&ark, header);
        assert_eq!(
            validator.validate_subordinate(&ask, &bad_ark),
            Err(CertificateDefect::UnsupportedKeySize.into())
        );
    }

    #[test]
    fn test_validate_chain_fails_fast_on_root() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let mut ark_bytes = test_util::ark_bytes(&keys.ark_2k);
        ark_bytes[40] ^= 0xff;
        let ark = parse(&ark_bytes);
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k));

        assert_eq!(
            validator.validate_chain(&ask, &ark),
            Err(AmdCertError::BadSignature)
        );
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k));
        let (ark_copy, ask_copy) = (ark.clone(), ask.clone());

        validator.validate_chain(&ask, &ark).unwrap();
        assert_eq!(ark, ark_copy);
        assert_eq!(ask, ask_copy);
    }

    #[test]
    fn test_parallel_validation() {
        let crypto = OpensslCrypto::new();
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));
        let ask = parse(&test_util::ask_bytes(&keys.ask_2k, &keys.ark_2k));

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| validator.validate_chain(&ask, &ark)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), Ok(ask.public_key()));
            }
        });
    }

    struct FailingCrypto;

    struct FailingHasher;

    impl Hasher for FailingHasher {
        fn update(&mut self, _bytes: &[u8]) -> Result<(), CryptoError> {
            Err(CryptoError::NotImplemented)
        }

        fn finish(self) -> Result<Digest, CryptoError> {
            Err(CryptoError::NotImplemented)
        }
    }

    impl Crypto for FailingCrypto {
        type Hasher<'c>
            = FailingHasher
        where
            Self: 'c;

        fn hash_initialize(&self, _alg: DigestAlgorithm) -> Result<Self::Hasher<'_>, CryptoError> {
            Ok(FailingHasher)
        }

        fn verify_rsa_pss(
            &self,
            _alg: DigestAlgorithm,
            _pub_key: &RsaPub,
            _msg: &[u8],
            _sig: &RsaSig,
        ) -> Result<bool, CryptoError> {
            Err(CryptoError::CryptoLibError(0xdead))
        }
    }

    #[test]
    fn test_primitive_failure_is_bad_signature() {
        let crypto = FailingCrypto;
        let validator = ChainValidator::new(&crypto);
        let keys = TestKeys::get();
        let ark = parse(&test_util::ark_bytes(&keys.ark_2k));

        assert_eq!(
            validator.validate_root(&ark),
            Err(AmdCertError::BadSignature)
        );
    }
}
