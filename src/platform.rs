use std::fmt;

use crate::error::{Error, Result};

/// Host platforms the editor distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Osx,
    Windows,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Self::Linux),
            "macos" | "osx" => Ok(Self::Osx),
            "windows" => Ok(Self::Windows),
            other => Err(Error::UnknownPlatform(other.to_string())),
        }
    }

    /// Key of the per-platform sub-mapping in the cmake dictionary.
    pub fn key(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Osx => "osx",
            Self::Windows => "windows",
        }
    }

    pub fn default_generator(self) -> &'static str {
        match self {
            Self::Linux | Self::Osx => "Unix Makefiles",
            Self::Windows => "Visual Studio",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linux => "Linux",
            Self::Osx => "OSX",
            Self::Windows => "Windows",
        };
        f.write_str(name)
    }
}
