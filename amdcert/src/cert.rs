/*++
Licensed under the Apache-2.0 license.

Abstract:
    In-memory model of an AMD signing-key certificate.
--*/

use crate::{
    helpers::to_big_endian,
    key_size_is_valid,
    sev_cert::{SevCert, SevSigAlgo, SEV_USAGE_INVALID},
    AmdCertError, CertificateDefect, KeyId, AMD_CERT_KEY_BITS_2K, AMD_CERT_KEY_BITS_4K,
    AMD_CERT_KEY_BYTES_4K, AMD_CERT_SIG_SIZE, AMD_CERT_VERSION,
};
use arrayvec::ArrayVec;
use crypto::{CryptoError, RsaPub};
use log::debug;
use zerocopy::{
    byteorder::{LittleEndian, U32},
    FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned,
};

/// Little-endian key material of at most 4096 bits.
pub type KeyBuf = ArrayVec<u8, AMD_CERT_KEY_BYTES_4K>;

/// The fixed-size leading part of every AMD certificate.
///
/// The header is covered by the certificate signature, reserved bytes
/// included.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
pub struct AmdCertHeader {
    pub version: U32<LittleEndian>,
    pub key_id: KeyId,
    pub certifying_id: KeyId,
    pub key_usage: U32<LittleEndian>,
    pub reserved: [u8; 16],
    /// Size of the public exponent in bits.
    pub pub_exp_size: U32<LittleEndian>,
    /// Size of the modulus in bits.
    pub modulus_size: U32<LittleEndian>,
}

impl AmdCertHeader {
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Number of bytes a certificate with this header occupies.
    pub fn cert_size(&self) -> usize {
        Self::SIZE
            + bits_to_bytes(self.pub_exp_size.get())
            + bits_to_bytes(self.modulus_size.get())
            + AMD_CERT_SIG_SIZE
    }
}

const _: () = assert!(AmdCertHeader::SIZE == 64);

fn bits_to_bytes(bits: u32) -> usize {
    (bits / 8) as usize
}

/// A parsed AMD certificate.
///
/// All fields are copied out of the source buffer. The certificate never
/// changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmdCert {
    header: AmdCertHeader,
    pub_exp: KeyBuf,
    modulus: KeyBuf,
    sig: [u8; AMD_CERT_SIG_SIZE],
}

/// Public key taken out of a certificate, still in certificate byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmdPublicKey {
    pub pub_exp_size: u32,
    pub modulus_size: u32,
    pub pub_exp: KeyBuf,
    pub modulus: KeyBuf,
}

impl AmdPublicKey {
    /// Converts the key into the big-endian form the crypto backend expects.
    pub fn to_rsa_pub(&self) -> Result<RsaPub, CryptoError> {
        Ok(RsaPub {
            e: to_big_endian(&self.pub_exp)?,
            n: to_big_endian(&self.modulus)?,
        })
    }
}

impl AmdCert {
    /// Parses the certificate at the start of `buf`.
    ///
    /// Bytes past the end of the certificate are ignored; use [`AmdCert::size`]
    /// to find where the next record starts.
    pub fn parse(buf: &[u8]) -> Result<Self, AmdCertError> {
        if buf.is_empty() {
            return Err(AmdCertError::InvalidParameter);
        }

        let (header, _) = AmdCertHeader::read_from_prefix(buf).map_err(|_| {
            debug!("buffer of {} bytes cannot hold a certificate header", buf.len());
            CertificateDefect::Truncated
        })?;

        if header.version.get() != AMD_CERT_VERSION {
            debug!("certificate version {:#x} is not supported", header.version.get());
            return Err(CertificateDefect::UnsupportedVersion.into());
        }

        let pub_exp_size = header.pub_exp_size.get();
        let modulus_size = header.modulus_size.get();
        if !key_size_is_valid(pub_exp_size) || !key_size_is_valid(modulus_size) {
            debug!("unsupported key size: exponent {pub_exp_size} bits, modulus {modulus_size} bits");
            return Err(CertificateDefect::UnsupportedKeySize.into());
        }

        let size = header.cert_size();
        let body = buf.get(AmdCertHeader::SIZE..size).ok_or_else(|| {
            debug!("certificate needs {size} bytes, buffer has {}", buf.len());
            CertificateDefect::Truncated
        })?;

        let (pub_exp, rest) = split(body, bits_to_bytes(pub_exp_size))?;
        let (modulus, rest) = split(rest, bits_to_bytes(modulus_size))?;
        let sig = <[u8; AMD_CERT_SIG_SIZE]>::try_from(rest)
            .map_err(|_| CertificateDefect::Truncated)?;

        Self::from_raw_parts(header, pub_exp, modulus, &sig)
    }

    /// Parses two certificates stored back to back, as in AMD's combined
    /// ASK + ARK files.
    pub fn parse_chain(buf: &[u8]) -> Result<(Self, Self), AmdCertError> {
        let first = Self::parse(buf)?;
        let rest = buf
            .get(first.size()..)
            .filter(|rest| !rest.is_empty())
            .ok_or(AmdCertError::InvalidCertificate(CertificateDefect::Truncated))?;
        let second = Self::parse(rest)?;
        Ok((first, second))
    }

    /// Assembles a certificate from already separated fields.
    ///
    /// No policy is applied; run [`crate::validate_common`] before trusting
    /// the result. When the header declares a supported key size, the
    /// matching field must be exactly that long.
    pub fn from_raw_parts(
        header: AmdCertHeader,
        pub_exp: &[u8],
        modulus: &[u8],
        sig: &[u8; AMD_CERT_SIG_SIZE],
    ) -> Result<Self, AmdCertError> {
        for (bits, field) in [
            (header.pub_exp_size.get(), pub_exp),
            (header.modulus_size.get(), modulus),
        ] {
            if key_size_is_valid(bits) && field.len() != bits_to_bytes(bits) {
                debug!("header declares {bits} bits, field has {} bytes", field.len());
                return Err(AmdCertError::InvalidParameter);
            }
        }

        let mut cert = Self {
            header,
            pub_exp: KeyBuf::new(),
            modulus: KeyBuf::new(),
            sig: *sig,
        };
        cert.pub_exp
            .try_extend_from_slice(pub_exp)
            .map_err(|_| AmdCertError::InvalidParameter)?;
        cert.modulus
            .try_extend_from_slice(modulus)
            .map_err(|_| AmdCertError::InvalidParameter)?;
        Ok(cert)
    }

    /// Number of bytes this certificate occupies on disk.
    pub fn size(&self) -> usize {
        self.header.cert_size()
    }

    /// Writes the on-disk form of the certificate to `dst` and returns the
    /// number of bytes written.
    pub fn serialize(&self, dst: &mut [u8]) -> Result<usize, AmdCertError> {
        let len = AmdCertHeader::SIZE + self.pub_exp.len() + self.modulus.len() + self.sig.len();
        let dst = dst.get_mut(..len).ok_or(AmdCertError::InvalidParameter)?;

        let mut offset = 0;
        for field in [
            self.header.as_bytes(),
            self.pub_exp.as_slice(),
            self.modulus.as_slice(),
            self.sig.as_slice(),
        ] {
            dst[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
        Ok(offset)
    }

    pub fn header(&self) -> &AmdCertHeader {
        &self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version.get()
    }

    pub fn key_id(&self) -> &KeyId {
        &self.header.key_id
    }

    pub fn certifying_id(&self) -> &KeyId {
        &self.header.certifying_id
    }

    pub fn key_usage(&self) -> u32 {
        self.header.key_usage.get()
    }

    pub fn pub_exp_size(&self) -> u32 {
        self.header.pub_exp_size.get()
    }

    pub fn modulus_size(&self) -> u32 {
        self.header.modulus_size.get()
    }

    /// Public exponent, little-endian.
    pub fn pub_exp(&self) -> &[u8] {
        &self.pub_exp
    }

    /// Modulus, little-endian.
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// The full 512-byte signature field, little-endian.
    pub fn signature(&self) -> &[u8; AMD_CERT_SIG_SIZE] {
        &self.sig
    }

    pub fn public_key(&self) -> AmdPublicKey {
        AmdPublicKey {
            pub_exp_size: self.pub_exp_size(),
            modulus_size: self.modulus_size(),
            pub_exp: self.pub_exp.clone(),
            modulus: self.modulus.clone(),
        }
    }

    /// Copies this certificate's public key into an SEV certificate.
    pub fn export_pub_key(&self) -> Result<SevCert, AmdCertError> {
        let pub_key_algo = match self.modulus_size() {
            AMD_CERT_KEY_BITS_2K => SevSigAlgo::RsaSha256,
            AMD_CERT_KEY_BITS_4K => SevSigAlgo::RsaSha384,
            _ => return Err(AmdCertError::InvalidParameter),
        };
        if !key_size_is_valid(self.pub_exp_size()) {
            return Err(AmdCertError::InvalidParameter);
        }

        let mut sev_cert = SevCert::new_zeroed();
        sev_cert.pub_key_usage.set(self.key_usage());
        sev_cert.pub_key_algo.set(pub_key_algo as u32);
        sev_cert.pub_key.modulus_size.set(self.modulus_size());
        sev_cert
            .pub_key
            .pub_exp
            .get_mut(..self.pub_exp.len())
            .ok_or(AmdCertError::InvalidParameter)?
            .copy_from_slice(&self.pub_exp);
        sev_cert
            .pub_key
            .modulus
            .get_mut(..self.modulus.len())
            .ok_or(AmdCertError::InvalidParameter)?
            .copy_from_slice(&self.modulus);
        sev_cert.sig_1_usage.set(SEV_USAGE_INVALID);
        sev_cert.sig_2_usage.set(SEV_USAGE_INVALID);
        Ok(sev_cert)
    }
}

fn split(bytes: &[u8], mid: usize) -> Result<(&[u8], &[u8]), AmdCertError> {
    if bytes.len() < mid {
        return Err(CertificateDefect::Truncated.into());
    }
    Ok(bytes.split_at(mid))
}
