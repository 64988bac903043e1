use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(keel_utils::path::current_dir))]
    CurrentDir { source: std::io::Error },

    #[error("Path is empty")]
    #[diagnostic(code(keel_utils::path::empty))]
    Empty,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(
        code(keel_utils::path::missing_env_var),
        help("Export the variable or remove it from the path")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(keel_utils::path::unclosed_variable))]
    UnclosedVariable { input: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum FileSystemError {
    #[error("Failed to {action} file `{}`: {source}", path.display())]
    #[diagnostic(code(keel_utils::fs::file))]
    File {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    #[error("Failed to {action} directory `{}`: {source}", path.display())]
    #[diagnostic(code(keel_utils::fs::directory))]
    Directory {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    #[error("`{}` is not a directory", path.display())]
    #[diagnostic(code(keel_utils::fs::not_a_directory))]
    NotADirectory { path: PathBuf },
}

#[derive(Error, Diagnostic, Debug)]
pub enum UtilsError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type PathResult<T> = std::result::Result<T, PathError>;

pub type UtilsResult<T> = std::result::Result<T, UtilsError>;
