/*++
Licensed under the Apache-2.0 license.
Abstract:
    Generic trait definition of platform services used by the certificate tools.
--*/
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(feature = "std")]
pub mod default;

#[cfg(feature = "std")]
pub use default::DefaultPlatform;

pub mod printer;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum PlatformError {
    NotImplemented = 0x1,
    NotFound = 0x2,
    ReadError(u32) = 0x3,
    WriteError(u32) = 0x4,
    PrintError(u32) = 0x5,
}

impl PlatformError {
    pub fn discriminant(&self) -> u16 {
        match self {
            PlatformError::NotImplemented => 0x1,
            PlatformError::NotFound => 0x2,
            PlatformError::ReadError(_) => 0x3,
            PlatformError::WriteError(_) => 0x4,
            PlatformError::PrintError(_) => 0x5,
        }
    }

    pub fn get_error_detail(&self) -> Option<u32> {
        match self {
            PlatformError::NotImplemented => None,
            PlatformError::NotFound => None,
            PlatformError::ReadError(code) => Some(*code),
            PlatformError::WriteError(code) => Some(*code),
            PlatformError::PrintError(code) => Some(*code),
        }
    }
}

pub trait Platform {
    /// Reads a file into `out`, or as much of it as fits.
    ///
    /// Returns the number of bytes read: the smaller of the file size and
    /// `out.len()`.
    ///
    /// # Arguments
    ///
    /// * `path` - File to read.
    /// * `out` - Output buffer for the file contents.
    fn read_file(&mut self, path: &str, out: &mut [u8]) -> Result<usize, PlatformError>;

    /// Truncates and writes `bytes` to a file. Returns the number of bytes written.
    fn write_file(&mut self, path: &str, bytes: &[u8]) -> Result<usize, PlatformError>;

    /// Size of a file in bytes. Fails with `NotFound` if the file does not exist.
    fn get_file_size(&mut self, path: &str) -> Result<usize, PlatformError>;

    fn write_str(&mut self, str: &str) -> Result<(), PlatformError>;
}
