// Licensed under the Apache-2.0 license

use amdcert::{helpers::public_key_digest, AmdCert, KeyUsage, AMD_CERT_MAX_SIZE};
use crypto::{Crypto, DigestAlgorithm};
use platform::{plat_println, Platform, PlatformError};

const HEX_ROW_BYTES: usize = 16;

fn usage_name(usage: u32) -> &'static str {
    match KeyUsage::try_from(usage) {
        Ok(KeyUsage::Ark) => "ARK",
        Ok(KeyUsage::Ask) => "ASK",
        Err(_) => "unknown",
    }
}

fn print_id(platform: &mut dyn Platform, label: &str, id: &[u8]) -> Result<(), PlatformError> {
    plat_println!(platform, "  {label:<16}{}", HexStr(id))
}

struct HexStr<'a>(&'a [u8]);

impl core::fmt::Display for HexStr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

/// Prints the header fields and public key fingerprint of `cert`.
pub fn print_cert<C: Crypto>(
    platform: &mut dyn Platform,
    crypto: &C,
    cert: &AmdCert,
) -> Result<(), PlatformError> {
    plat_println!(platform, "AMD certificate ({} bytes)", cert.size())?;
    plat_println!(platform, "  {:<16}{}", "version", cert.version())?;
    print_id(platform, "key id", cert.key_id())?;
    print_id(platform, "certifying id", cert.certifying_id())?;
    plat_println!(
        platform,
        "  {:<16}{:#x} ({})",
        "key usage",
        cert.key_usage(),
        usage_name(cert.key_usage())
    )?;
    plat_println!(platform, "  {:<16}{} bits", "exponent", cert.pub_exp_size())?;
    plat_println!(platform, "  {:<16}{} bits", "modulus", cert.modulus_size())?;

    let mut hex = [0u8; DigestAlgorithm::MAX_DIGEST_SIZE * 2];
    match public_key_digest(crypto, cert) {
        Ok(digest) => {
            let hex = &mut hex[..digest.len() * 2];
            digest
                .write_hex_str(hex)
                .map_err(|_| PlatformError::PrintError(0))?;
            let hex = core::str::from_utf8(hex).map_err(|_| PlatformError::PrintError(0))?;
            plat_println!(platform, "  {:<16}{hex}", "sha256(key)")
        }
        Err(err) => plat_println!(platform, "  {:<16}<{err:?}>", "sha256(key)"),
    }
}

/// Hex dump of `cert` in its on-disk form, ending at the certificate's size.
pub fn print_cert_hex(platform: &mut dyn Platform, cert: &AmdCert) -> Result<(), PlatformError> {
    let mut bytes = [0u8; AMD_CERT_MAX_SIZE];
    let len = cert
        .serialize(&mut bytes)
        .map_err(|err| PlatformError::PrintError(err.discriminant()))?;
    print_hex(platform, &bytes[..len])
}

/// Prints `bytes` as offset-prefixed rows of hex.
pub fn print_hex(platform: &mut dyn Platform, bytes: &[u8]) -> Result<(), PlatformError> {
    for (row, chunk) in bytes.chunks(HEX_ROW_BYTES).enumerate() {
        plat_println!(
            platform,
            "{:08x}: {}",
            row * HEX_ROW_BYTES,
            HexRow(chunk)
        )?;
    }
    Ok(())
}

struct HexRow<'a>(&'a [u8]);

impl core::fmt::Display for HexRow<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}
