/*++
Licensed under the Apache-2.0 license.

Abstract:
    AMD signing-key certificate library crate.
--*/
#![cfg_attr(not(any(test, feature = "test-util")), no_std)]

pub use cert::{AmdCert, AmdCertHeader, AmdPublicKey};
pub use error::{AmdCertError, CertificateDefect};
pub use policy::{key_size_is_valid, usage_is_valid, validate_common, KeyUsage};
pub use sev_cert::SevCert;
pub use validator::ChainValidator;

pub mod cert;
pub mod error;
pub mod helpers;
pub mod policy;
pub mod sev_cert;
pub mod validator;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub const AMD_CERT_VERSION: u32 = 0x01;
pub const AMD_CERT_ID_SIZE_BYTES: usize = 16;
pub const AMD_CERT_KEY_BITS_2K: u32 = 2048;
pub const AMD_CERT_KEY_BITS_4K: u32 = 4096;
pub const AMD_CERT_KEY_BYTES_4K: usize = AMD_CERT_KEY_BITS_4K as usize / 8;

/// The signature field is always sized for a 4096-bit key.
pub const AMD_CERT_SIG_SIZE: usize = AMD_CERT_KEY_BYTES_4K;

/// Largest certificate the format can describe.
pub const AMD_CERT_MAX_SIZE: usize =
    AmdCertHeader::SIZE + 2 * AMD_CERT_KEY_BYTES_4K + AMD_CERT_SIG_SIZE;

pub type KeyId = [u8; AMD_CERT_ID_SIZE_BYTES];

/// Key ID of the AMD Root Key. Every trusted chain starts at this key.
pub const AMD_ROOT_KEY_ID: KeyId = [
    0x1b, 0xb9, 0x87, 0xc3, 0x59, 0x49, 0x46, 0x06, 0xb1, 0x74, 0x94, 0x56, 0x01, 0xc9, 0xea, 0x5b,
];
