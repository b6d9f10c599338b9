// Licensed under the Apache-2.0 license

use crate::{Platform, PlatformError};
use std::{
    fs::{self, File},
    io::{self, ErrorKind, Read, Write},
};

/// Platform backed by the host filesystem and stdout.
#[derive(Default)]
pub struct DefaultPlatform;

impl DefaultPlatform {
    fn map_io(err: &io::Error, f: fn(u32) -> PlatformError) -> PlatformError {
        match err.kind() {
            ErrorKind::NotFound => PlatformError::NotFound,
            _ => f(err.raw_os_error().unwrap_or(0) as u32),
        }
    }
}

impl Platform for DefaultPlatform {
    fn read_file(&mut self, path: &str, out: &mut [u8]) -> Result<usize, PlatformError> {
        let file = File::open(path).map_err(|e| Self::map_io(&e, PlatformError::ReadError))?;
        let mut read = 0;
        let mut reader = file.take(out.len() as u64);
        loop {
            match reader.read(&mut out[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Self::map_io(&e, PlatformError::ReadError)),
            }
        }
        Ok(read)
    }

    fn write_file(&mut self, path: &str, bytes: &[u8]) -> Result<usize, PlatformError> {
        let mut file =
            File::create(path).map_err(|e| Self::map_io(&e, PlatformError::WriteError))?;
        file.write_all(bytes)
            .map_err(|e| Self::map_io(&e, PlatformError::WriteError))?;
        Ok(bytes.len())
    }

    fn get_file_size(&mut self, path: &str) -> Result<usize, PlatformError> {
        let metadata =
            fs::metadata(path).map_err(|e| Self::map_io(&e, PlatformError::ReadError))?;
        usize::try_from(metadata.len()).map_err(|_| PlatformError::ReadError(0))
    }

    fn write_str(&mut self, str: &str) -> Result<(), PlatformError> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(str.as_bytes())
            .map_err(|e| PlatformError::PrintError(e.raw_os_error().unwrap_or(0) as u32))
    }
}
