use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort an invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown variable in cmake dictionary: {0}")]
    UnknownVariable(String),

    #[error("Invalid placeholder in cmake dictionary: line {line}, col {col}")]
    InvalidPlaceholder { line: usize, col: usize },

    #[error("Failed to create build directory {}: {source}", path.display())]
    CreateBuildFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "No \"CMakeLists.txt\" file in the project folder is present and no \"root_folder\" \
         specified in the \"cmake\" dictionary of the project file"
    )]
    MissingRootFolder,

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown generator: {0}")]
    UnknownGenerator(String),

    #[error("No project file is open")]
    NoProject,

    #[error("\"{key}\" in the cmake dictionary {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("There was an error loading cmake's capabilities: {0}")]
    Capabilities(String),

    #[error(
        "No support for the file API. This was introduced in cmake version 3.15. \
         You have version {0}"
    )]
    NoFileApi(String),

    #[error("Malformed file API reply: {0}")]
    FileApi(String),

    #[error("Cannot remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
