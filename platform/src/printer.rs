// Licensed under the Apache-2.0 license

use core::fmt;

use crate::{Platform, PlatformError};

pub struct Printer<'a> {
    pub platform: &'a mut dyn Platform,
    pub error: Option<PlatformError>,
}

impl<'a> fmt::Write for Printer<'a> {
    fn write_str(&mut self, str: &str) -> fmt::Result {
        self.platform.write_str(str).map_err(|err| {
            self.error = Some(err);
            fmt::Error
        })
    }
}

impl<'a> Printer<'a> {
    pub fn new(platform: &'a mut dyn Platform) -> Self {
        Self {
            platform,
            error: None,
        }
    }

    /// Writes formatted output, reporting the platform's error if it failed.
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> Result<(), PlatformError> {
        fmt::Write::write_fmt(self, args)
            .map_err(|_| self.error.unwrap_or(PlatformError::PrintError(0)))
    }
}

#[macro_export]
macro_rules! plat_println {
    ($platform:expr, $($tt:tt)*) => {{
        $crate::printer::Printer::new($platform)
            .print(format_args!("{}\n", format_args!($($tt)*)))
    }}
}
