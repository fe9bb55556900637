//! Target operating systems, CPUs and the combined platform key.
//!
//! Every raw string that names a target goes through these parsers, so the
//! rest of the crate only ever branches on enumerated values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a target name falls outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("unknown target OS `{value}` (in {context})")]
    UnknownTargetOs { value: String, context: &'static str },

    #[error("unknown target platform `{value}` (in {context})")]
    UnknownTargetPlatform { value: String, context: &'static str },
}

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Linux,
    Darwin,
    Windows,
}

impl TargetOs {
    pub const ALL: [TargetOs; 3] = [TargetOs::Linux, TargetOs::Darwin, TargetOs::Windows];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::Darwin => "darwin",
            TargetOs::Windows => "windows",
        }
    }

    /// Parse an OS name, recording `context` in the error.
    pub fn parse(value: &str, context: &'static str) -> Result<Self, PlatformError> {
        match value {
            "linux" => Ok(TargetOs::Linux),
            "darwin" => Ok(TargetOs::Darwin),
            "windows" => Ok(TargetOs::Windows),
            _ => Err(PlatformError::UnknownTargetOs {
                value: value.to_string(),
                context,
            }),
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetOs::parse(s, "target os")
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetCpu {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
}

impl TargetCpu {
    pub const ALL: [TargetCpu; 2] = [TargetCpu::X86, TargetCpu::X86_64];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TargetCpu::X86 => "x86",
            TargetCpu::X86_64 => "x86_64",
        }
    }

    /// Word-size flag understood by gcc and clang.
    pub const fn bits_flag(&self) -> &'static str {
        match self {
            TargetCpu::X86 => "-m32",
            TargetCpu::X86_64 => "-m64",
        }
    }

    /// Parse a CPU name. An unknown CPU makes the whole platform unknown.
    pub fn parse(value: &str, context: &'static str) -> Result<Self, PlatformError> {
        match value {
            "x86" => Ok(TargetCpu::X86),
            "x86_64" => Ok(TargetCpu::X86_64),
            _ => Err(PlatformError::UnknownTargetPlatform {
                value: value.to_string(),
                context,
            }),
        }
    }
}

impl fmt::Display for TargetCpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetCpu {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetCpu::parse(s, "target cpu")
    }
}

/// Combined platform key derived from an OS and a CPU.
///
/// Keys keep the toolchain's historical spelling: 32-bit windows is plain
/// `windows`, every other pair is `<os>-<cpu>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetPlatform {
    pub os: TargetOs,
    pub cpu: TargetCpu,
}

impl TargetPlatform {
    pub const fn new(os: TargetOs, cpu: TargetCpu) -> Self {
        TargetPlatform { os, cpu }
    }

    /// Every supported platform, in a stable order.
    pub fn all() -> impl Iterator<Item = TargetPlatform> {
        TargetOs::ALL
            .into_iter()
            .flat_map(|os| TargetCpu::ALL.into_iter().map(move |cpu| TargetPlatform::new(os, cpu)))
    }

    pub const fn as_str(&self) -> &'static str {
        match (self.os, self.cpu) {
            (TargetOs::Linux, TargetCpu::X86) => "linux-x86",
            (TargetOs::Linux, TargetCpu::X86_64) => "linux-x86_64",
            (TargetOs::Darwin, TargetCpu::X86) => "darwin-x86",
            (TargetOs::Darwin, TargetCpu::X86_64) => "darwin-x86_64",
            (TargetOs::Windows, TargetCpu::X86) => "windows",
            (TargetOs::Windows, TargetCpu::X86_64) => "windows-x86_64",
        }
    }

    /// Parse a platform key such as `linux-x86_64` or `windows`.
    pub fn parse(value: &str, context: &'static str) -> Result<Self, PlatformError> {
        TargetPlatform::all()
            .find(|p| p.as_str() == value)
            .ok_or_else(|| PlatformError::UnknownTargetPlatform {
                value: value.to_string(),
                context,
            })
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetPlatform::parse(s, "target platform")
    }
}
