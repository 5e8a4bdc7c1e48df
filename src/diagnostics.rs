//! Turn tool output into file/line locations the editor can jump to.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::generator::Generator;
use crate::platform::Platform;

/// Matches `CMake Error at <file>:<line> (<command>):` and the
/// `Warning` / `Warning (dev)` variants.
pub const CONFIGURE_PATTERN: &str =
    r"CMake\s(?:Error|Warning)(?:\s\(dev\))?\sat\s(.+):(\d+)()\s?\(?(\w*)\)?:";

static CONFIGURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONFIGURE_PATTERN).expect("configure pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
    /// The cmake command for configure output, the compiler message for
    /// build output.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// A line-oriented parser around a pattern with four groups:
/// file, line, column (may be empty) and message.
#[derive(Debug, Clone)]
pub struct OutputParser {
    regex: Regex,
}

impl OutputParser {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn configure() -> Self {
        Self {
            regex: CONFIGURE.clone(),
        }
    }

    pub fn build(generator: Generator, platform: Platform) -> Result<Self, regex::Error> {
        Self::new(generator.build_output_pattern(platform))
    }

    pub fn parse_line(&self, line: &str) -> Option<Diagnostic> {
        let caps = self.regex.captures(line)?;
        let file = caps.get(1)?.as_str().to_string();
        let line_no = caps.get(2)?.as_str().parse().ok()?;
        let column = caps.get(3).and_then(|m| m.as_str().parse().ok());
        let message = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        Some(Diagnostic {
            file,
            line: line_no,
            column,
            message,
        })
    }

    pub fn parse(&self, output: &str) -> Vec<Diagnostic> {
        output.lines().filter_map(|line| self.parse_line(line)).collect()
    }
}
