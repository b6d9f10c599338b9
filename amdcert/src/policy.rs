// Licensed under the Apache-2.0 license.

use crate::{
    AmdCert, AmdCertError, CertificateDefect, AMD_CERT_KEY_BITS_2K, AMD_CERT_KEY_BITS_4K,
    AMD_CERT_VERSION,
};
use log::debug;

/// Roles a key in an AMD certificate may have.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[repr(u32)]
pub enum KeyUsage {
    /// AMD Root Key.
    Ark = 0x0,
    /// AMD Signing Key.
    Ask = 0x13,
}

impl TryFrom<u32> for KeyUsage {
    type Error = AmdCertError;

    fn try_from(usage: u32) -> Result<Self, Self::Error> {
        match usage {
            0x0 => Ok(KeyUsage::Ark),
            0x13 => Ok(KeyUsage::Ask),
            _ => Err(AmdCertError::InvalidCertificate(
                CertificateDefect::UnknownUsage,
            )),
        }
    }
}

pub fn key_size_is_valid(size: u32) -> bool {
    size == AMD_CERT_KEY_BITS_2K || size == AMD_CERT_KEY_BITS_4K
}

pub fn usage_is_valid(usage: u32) -> bool {
    KeyUsage::try_from(usage).is_ok()
}

/// Checks that must pass for every certificate before any signature math.
pub fn validate_common(cert: &AmdCert) -> Result<(), AmdCertError> {
    if cert.version() != AMD_CERT_VERSION {
        debug!("certificate version {:#x} is not supported", cert.version());
        return Err(CertificateDefect::UnsupportedVersion.into());
    }

    if !key_size_is_valid(cert.modulus_size()) || !key_size_is_valid(cert.pub_exp_size()) {
        debug!(
            "unsupported key size: exponent {} bits, modulus {} bits",
            cert.pub_exp_size(),
            cert.modulus_size()
        );
        return Err(CertificateDefect::UnsupportedKeySize.into());
    }

    if !usage_is_valid(cert.key_usage()) {
        debug!("unknown key usage {:#x}", cert.key_usage());
        return Err(CertificateDefect::UnknownUsage.into());
    }

    Ok(())
}
