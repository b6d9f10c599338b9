/*++
Licensed under the Apache-2.0 license.

Abstract:
    SEV certificate layout used to hand a validated AMD key to attestation
    report verification.
--*/

use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

pub const SEV_CERT_SIZE: usize = 0x824;
pub const SEV_RSA_PUB_KEY_MAX_BYTES: usize = 4096 / 8;
pub const SEV_SIG_SIZE: usize = 512;

/// Usage value marking an empty signature slot.
pub const SEV_USAGE_INVALID: u32 = 0x1000;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u32)]
pub enum SevSigAlgo {
    Invalid = 0x0,
    RsaSha256 = 0x1,
    EcdsaSha256 = 0x2,
    EcdhSha256 = 0x3,
    RsaSha384 = 0x101,
    EcdsaSha384 = 0x102,
    EcdhSha384 = 0x103,
}

/// RSA member of the SEV public key union. It is the largest member, so it
/// spans the whole union.
#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct SevRsaPubKey {
    /// Modulus size in bits.
    pub modulus_size: U32<LittleEndian>,
    pub pub_exp: [u8; SEV_RSA_PUB_KEY_MAX_BYTES],
    pub modulus: [u8; SEV_RSA_PUB_KEY_MAX_BYTES],
}

#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
pub struct SevCert {
    pub version: U32<LittleEndian>,
    pub api_major: u8,
    pub api_minor: u8,
    pub reserved_0: u8,
    pub reserved_1: u8,
    pub pub_key_usage: U32<LittleEndian>,
    pub pub_key_algo: U32<LittleEndian>,
    pub pub_key: SevRsaPubKey,
    pub sig_1_usage: U32<LittleEndian>,
    pub sig_1_algo: U32<LittleEndian>,
    pub sig_1: [u8; SEV_SIG_SIZE],
    pub sig_2_usage: U32<LittleEndian>,
    pub sig_2_algo: U32<LittleEndian>,
    pub sig_2: [u8; SEV_SIG_SIZE],
}

const _: () = assert!(core::mem::size_of::<SevRsaPubKey>() == 1028);
const _: () = assert!(core::mem::size_of::<SevCert>() == SEV_CERT_SIZE);

impl SevCert {
    /// The exported exponent trimmed to the modulus size.
    pub fn rsa_pub_exp(&self) -> &[u8] {
        let len = self.rsa_key_len();
        &self.pub_key.pub_exp[..len]
    }

    /// The exported modulus trimmed to its size.
    pub fn rsa_modulus(&self) -> &[u8] {
        let len = self.rsa_key_len();
        &self.pub_key.modulus[..len]
    }

    fn rsa_key_len(&self) -> usize {
        ((self.pub_key.modulus_size.get() / 8) as usize).min(SEV_RSA_PUB_KEY_MAX_BYTES)
    }
}
