// Licensed under the Apache-2.0 license.

//! Builds signed AMD certificates for tests.

use crate::{
    key_size_is_valid, AmdCert, AmdCertHeader, KeyId, KeyUsage, AMD_CERT_SIG_SIZE,
    AMD_CERT_VERSION, AMD_ROOT_KEY_ID,
};
use openssl::{
    hash::MessageDigest,
    pkey::{PKey, Private},
    rsa::{Padding, Rsa},
    sign::{RsaPssSaltlen, Signer},
};
use std::sync::OnceLock;
use zerocopy::{byteorder::U32, IntoBytes};

pub const ASK_KEY_ID: KeyId = [
    0x2d, 0x48, 0x5c, 0x0e, 0x7a, 0x16, 0x4c, 0x93, 0x8b, 0x31, 0xf2, 0x6d, 0xa0, 0x44, 0x19, 0xe7,
];

/// RSA keys are slow to generate, so every test shares one set.
pub struct TestKeys {
    pub ark_2k: Rsa<Private>,
    pub ask_2k: Rsa<Private>,
    pub other_2k: Rsa<Private>,
    pub ark_4k: Rsa<Private>,
    pub ask_4k: Rsa<Private>,
}

impl TestKeys {
    pub fn get() -> &'static TestKeys {
        static KEYS: OnceLock<TestKeys> = OnceLock::new();
        KEYS.get_or_init(|| TestKeys {
            ark_2k: Rsa::generate(2048).unwrap(),
            ask_2k: Rsa::generate(2048).unwrap(),
            other_2k: Rsa::generate(2048).unwrap(),
            ark_4k: Rsa::generate(4096).unwrap(),
            ask_4k: Rsa::generate(4096).unwrap(),
        })
    }
}

pub struct TestCert<'a> {
    header: AmdCertHeader,
    subject: &'a Rsa<Private>,
    big_endian_key: bool,
    big_endian_sig: bool,
}

impl<'a> TestCert<'a> {
    pub fn new(subject: &'a Rsa<Private>) -> Self {
        let bits = subject.size() * 8;
        Self {
            header: AmdCertHeader {
                version: U32::new(AMD_CERT_VERSION),
                key_id: [0; 16],
                certifying_id: [0; 16],
                key_usage: U32::new(0),
                reserved: [0; 16],
                pub_exp_size: U32::new(bits),
                modulus_size: U32::new(bits),
            },
            subject,
            big_endian_key: false,
            big_endian_sig: false,
        }
    }

    pub fn ark(subject: &'a Rsa<Private>) -> Self {
        Self::new(subject)
            .key_id(AMD_ROOT_KEY_ID)
            .certifying_id(AMD_ROOT_KEY_ID)
            .key_usage(KeyUsage::Ark as u32)
    }

    pub fn ask(subject: &'a Rsa<Private>) -> Self {
        Self::new(subject)
            .key_id(ASK_KEY_ID)
            .certifying_id(AMD_ROOT_KEY_ID)
            .key_usage(KeyUsage::Ask as u32)
    }

    pub fn key_id(mut self, key_id: KeyId) -> Self {
        self.header.key_id = key_id;
        self
    }

    pub fn certifying_id(mut self, certifying_id: KeyId) -> Self {
        self.header.certifying_id = certifying_id;
        self
    }

    pub fn key_usage(mut self, usage: u32) -> Self {
        self.header.key_usage.set(usage);
        self
    }

    pub fn pub_exp_size(mut self, bits: u32) -> Self {
        self.header.pub_exp_size.set(bits);
        self
    }

    pub fn modulus_size(mut self, bits: u32) -> Self {
        self.header.modulus_size.set(bits);
        self
    }

    pub fn big_endian_key(mut self) -> Self {
        self.big_endian_key = true;
        self
    }

    pub fn big_endian_signature(mut self) -> Self {
        self.big_endian_sig = true;
        self
    }

    /// Length of a key field. Sizes the parser rejects fall back to the
    /// subject key's size so the record still has a body.
    fn field_len(&self, bits: u32) -> i32 {
        if key_size_is_valid(bits) {
            (bits / 8) as i32
        } else {
            self.subject.size() as i32
        }
    }

    /// Serializes the certificate with a signature made by `signer`.
    pub fn sign(&self, signer: &Rsa<Private>) -> Vec<u8> {
        let mut pub_exp = self
            .subject
            .e()
            .to_vec_padded(self.field_len(self.header.pub_exp_size.get()))
            .unwrap();
        let mut modulus = self
            .subject
            .n()
            .to_vec_padded(self.field_len(self.header.modulus_size.get()))
            .unwrap();
        if !self.big_endian_key {
            pub_exp.reverse();
            modulus.reverse();
        }

        let mut out = self.header.as_bytes().to_vec();
        out.extend_from_slice(&pub_exp);
        out.extend_from_slice(&modulus);

        let md = if signer.size() * 8 == 2048 {
            MessageDigest::sha256()
        } else {
            MessageDigest::sha384()
        };
        let key = PKey::from_rsa(signer.clone()).unwrap();
        let mut pss = Signer::new(md, &key).unwrap();
        pss.set_rsa_padding(Padding::PKCS1_PSS).unwrap();
        pss.set_rsa_mgf1_md(md).unwrap();
        pss.set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH).unwrap();
        pss.update(&out).unwrap();
        let mut sig = pss.sign_to_vec().unwrap();
        if !self.big_endian_sig {
            sig.reverse();
        }
        sig.resize(AMD_CERT_SIG_SIZE, 0);

        out.extend_from_slice(&sig);
        out
    }
}

/// A self-signed root certificate for `key` carrying the AMD root key ID.
pub fn ark_bytes(key: &Rsa<Private>) -> Vec<u8> {
    TestCert::ark(key).sign(key)
}

/// A signing key certificate for `subject` issued by `signer`.
pub fn ask_bytes(subject: &Rsa<Private>, signer: &Rsa<Private>) -> Vec<u8> {
    TestCert::ask(subject).sign(signer)
}

/// Copies `cert` with a replaced header, bypassing the parser's checks.
pub fn with_header(cert: &AmdCert, header: AmdCertHeader) -> AmdCert {
    AmdCert::from_raw_parts(header, cert.pub_exp(), cert.modulus(), cert.signature()).unwrap()
}
