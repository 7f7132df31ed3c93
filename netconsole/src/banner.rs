//! Greeting sent to a newly connected console client.
//!
//! ```text
//! MorpheusX 1.0.1
//!  Last Updated: 2026-10-01 | Author: PopRdi      (only with distribution info)
//! Compiled: Oct 18 2026
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Build date stamped by the build script, `Mmm dd yyyy`.
pub const BUILD_DATE: &str = env!("NETCONSOLE_BUILD_DATE");

/// Default identity line.
pub const DEFAULT_IDENTITY: &str = concat!("MorpheusX ", env!("CARGO_PKG_VERSION"));

/// Distribution metadata shown between identity and build date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub date: &'static str,
    pub author: &'static str,
}

/// Greeting lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub identity: &'static str,
    pub distribution: Option<Distribution>,
    pub build_date: &'static str,
}

impl Banner {
    pub const fn new(identity: &'static str) -> Self {
        Self {
            identity,
            distribution: None,
            build_date: BUILD_DATE,
        }
    }

    /// Add the distribution metadata line.
    pub const fn with_distribution(self, date: &'static str, author: &'static str) -> Self {
        Self {
            distribution: Some(Distribution { date, author }),
            ..self
        }
    }

    /// Rendered lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        lines.push(String::from(self.identity));
        if let Some(dist) = self.distribution {
            lines.push(format!(" Last Updated: {} | Author: {}", dist.date, dist.author));
        }
        lines.push(format!("Compiled: {}", self.build_date));
        lines
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY)
    }
}
