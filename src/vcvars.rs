//! MSVC developer environment, as set up by `vcvarsall.bat`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// `vcvarsall` target argument for a 64-bit target on this host.
pub fn host_arch() -> &'static str {
    if cfg!(target_pointer_width = "32") {
        "x86_amd64"
    } else {
        "amd64"
    }
}

/// Find `vcvarsall.bat` of the newest Visual Studio installation.
pub fn locate() -> Result<PathBuf> {
    let vswhere = std::env::var_os("ProgramFiles(x86)")
        .or_else(|| std::env::var_os("ProgramFiles"))
        .map(|dir| {
            PathBuf::from(dir)
                .join("Microsoft Visual Studio")
                .join("Installer")
                .join("vswhere.exe")
        })
        .filter(|path| path.is_file())
        .map_or_else(|| which::which("vswhere"), Ok)
        .map_err(|_| Error::ToolNotFound("vswhere".to_string()))?;

    let output = std::process::Command::new(vswhere)
        .args(["-latest", "-products", "*", "-property", "installationPath"])
        .output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let install = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| Error::ToolNotFound("Visual Studio".to_string()))?;

    let bat = PathBuf::from(install)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat");
    if bat.is_file() {
        Ok(bat)
    } else {
        Err(Error::ToolNotFound("vcvarsall.bat".to_string()))
    }
}

#[cfg(windows)]
pub fn query(arch: &str) -> Result<BTreeMap<String, String>> {
    use std::os::windows::process::CommandExt;

    let bat = locate()?;
    let output = std::process::Command::new("cmd")
        .raw_arg(format!("/s /c \"\"{}\" {} && set\"", bat.display(), arch))
        .output()?;
    if !output.status.success() {
        return Err(Error::Io(std::io::Error::other(format!(
            "vcvarsall.bat {arch} exited with {}",
            output.status
        ))));
    }
    tracing::debug!(path = %bat.display(), arch, "loaded vcvarsall environment");
    Ok(parse_set_output(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(not(windows))]
pub fn query(_arch: &str) -> Result<BTreeMap<String, String>> {
    Ok(BTreeMap::new())
}

/// Parse the `NAME=value` lines printed by `set`. Banner lines are skipped.
pub fn parse_set_output(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| !key.is_empty() && !key.contains(' '))
        .map(|(key, value)| (key.to_string(), value.trim_end_matches('\r').to_string()))
        .collect()
}
