/*++
Licensed under the Apache-2.0 license.

Abstract:
    Error codes returned by certificate parsing and chain validation.
--*/

/// Why a certificate was rejected as structurally or logically invalid.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[repr(u16)]
pub enum CertificateDefect {
    Truncated = 0x1,
    UnsupportedVersion = 0x2,
    UnsupportedKeySize = 0x3,
    UnknownUsage = 0x4,
    UnexpectedUsage = 0x5,
    /// The root key ID does not match the pinned AMD root.
    UntrustedRoot = 0x6,
    /// The certifying ID does not name the parent's key.
    IssuerMismatch = 0x7,
}

impl CertificateDefect {
    pub fn discriminant(&self) -> u16 {
        *self as u16
    }
}

/// Status codes share their values with the SEV firmware status codes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u32)]
pub enum AmdCertError {
    InvalidCertificate(CertificateDefect) = 0x06,
    BadSignature = 0x0A,
    InvalidParameter = 0x16,
}

impl AmdCertError {
    pub fn discriminant(&self) -> u32 {
        match self {
            AmdCertError::InvalidCertificate(_) => 0x06,
            AmdCertError::BadSignature => 0x0A,
            AmdCertError::InvalidParameter => 0x16,
        }
    }

    pub fn get_error_detail(&self) -> Option<CertificateDefect> {
        match self {
            AmdCertError::InvalidCertificate(defect) => Some(*defect),
            AmdCertError::BadSignature => None,
            AmdCertError::InvalidParameter => None,
        }
    }

    /// True when a certificate was well formed but is not the pinned root.
    pub fn is_trust_pinning_failure(&self) -> bool {
        self.get_error_detail() == Some(CertificateDefect::UntrustedRoot)
    }
}

impl From<CertificateDefect> for AmdCertError {
    fn from(defect: CertificateDefect) -> Self {
        AmdCertError::InvalidCertificate(defect)
    }
}

impl core::fmt::Display for AmdCertError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AmdCertError::InvalidCertificate(CertificateDefect::UntrustedRoot) => {
                write!(f, "invalid certificate: root key is not the pinned AMD root")
            }
            AmdCertError::InvalidCertificate(defect) => {
                write!(f, "invalid certificate: {defect:?}")
            }
            AmdCertError::BadSignature => write!(f, "bad signature"),
            AmdCertError::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}
