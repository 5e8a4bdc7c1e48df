use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::platform::Platform;
use crate::vcvars;

/// The build-system backends cmake can emit that we know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    Ninja,
    UnixMakefiles,
    NMakeMakefiles,
    VisualStudio,
}

const GCC_PATTERN: &str = r"(.+[^:]):(\d+):(\d+): (?:fatal )?((?:error|warning): .+)$";
const MSVC_PATTERN: &str = r"^(.+)\((\d+)\):() (.+)$";
const MSBUILD_PATTERN: &str =
    r"^  (.+)\((\d+)\)(): ((?:fatal )?(?:error|warning) \w+\d\d\d\d: .*) \[.*$";

impl Generator {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ninja => "Ninja",
            Self::UnixMakefiles => "Unix Makefiles",
            Self::NMakeMakefiles => "NMake Makefiles",
            Self::VisualStudio => "Visual Studio",
        }
    }

    /// Value for `-G`. Visual Studio is left to cmake to pick the newest
    /// installed version.
    pub fn cmake_flag(self) -> Option<&'static str> {
        match self {
            Self::VisualStudio => None,
            other => Some(other.name()),
        }
    }

    pub fn is_multi_config(self) -> bool {
        matches!(self, Self::VisualStudio)
    }

    /// Environment the tool runs with. On Windows this is the MSVC developer
    /// environment; elsewhere the inherited environment is enough.
    pub fn env(self, platform: Platform) -> BTreeMap<String, String> {
        if platform != Platform::Windows {
            return BTreeMap::new();
        }
        match vcvars::query(vcvars::host_arch()) {
            Ok(env) => env,
            Err(e) => {
                warn!(generator = self.name(), "did not find vcvarsall.bat: {e}");
                BTreeMap::new()
            }
        }
    }

    /// Regex matching compiler diagnostics in this generator's build output.
    /// Groups: file, line, column, message.
    pub fn build_output_pattern(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (Self::Ninja, Platform::Windows) | (Self::NMakeMakefiles, _) => MSVC_PATTERN,
            (Self::Ninja, _) | (Self::UnixMakefiles, _) => GCC_PATTERN,
            (Self::VisualStudio, _) => MSBUILD_PATTERN,
        }
    }

    pub fn on_pre_configure(self, overrides: &Map<String, Value>) {
        if !self.is_multi_config() && !overrides.contains_key("CMAKE_BUILD_TYPE") {
            info!(
                generator = self.name(),
                "single-configuration generator without CMAKE_BUILD_TYPE; \
                 the configuration will be named \"Default\""
            );
        }
    }

    pub fn on_post_configure(self, exit_code: Option<i32>) {
        match exit_code {
            Some(0) => debug!(generator = self.name(), "configure succeeded"),
            Some(code) => warn!(generator = self.name(), code, "configure failed"),
            None => warn!(generator = self.name(), "configure was terminated by a signal"),
        }
    }
}

impl FromStr for Generator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ninja" => Ok(Self::Ninja),
            "Unix Makefiles" => Ok(Self::UnixMakefiles),
            "NMake Makefiles" => Ok(Self::NMakeMakefiles),
            "Visual Studio" => Ok(Self::VisualStudio),
            other => Err(Error::UnknownGenerator(other.to_string())),
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_generators() {
        for name in ["Ninja", "Unix Makefiles", "NMake Makefiles", "Visual Studio"] {
            let generator: Generator = name.parse().unwrap();
            assert_eq!(generator.name(), name);
        }
    }

    #[test]
    fn unknown_generator() {
        let err = "Xcode".parse::<Generator>().unwrap_err();
        assert!(matches!(err, Error::UnknownGenerator(name) if name == "Xcode"));
    }

    #[test]
    fn only_visual_studio_omits_flag() {
        assert_eq!(Generator::VisualStudio.cmake_flag(), None);
        assert_eq!(Generator::Ninja.cmake_flag(), Some("Ninja"));
        assert_eq!(Generator::UnixMakefiles.cmake_flag(), Some("Unix Makefiles"));
        assert_eq!(Generator::NMakeMakefiles.cmake_flag(), Some("NMake Makefiles"));
    }

    #[test]
    fn no_extra_env_off_windows() {
        assert!(Generator::Ninja.env(Platform::Linux).is_empty());
        assert!(Generator::VisualStudio.env(Platform::Osx).is_empty());
    }

    #[test]
    fn ninja_pattern_depends_on_platform() {
        assert_eq!(Generator::Ninja.build_output_pattern(Platform::Linux), GCC_PATTERN);
        assert_eq!(Generator::Ninja.build_output_pattern(Platform::Windows), MSVC_PATTERN);
    }
}
