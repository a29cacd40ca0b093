use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Root '{}' is not a readable directory", .0.display())]
    InvalidRoot(PathBuf),
    #[error("No HTML documents found under '{}'", .0.display())]
    EmptyRegistry(PathBuf),
    #[error("No page produced any PDF output")]
    NoOutput,
}

pub type Result<T> = std::result::Result<T, SiteError>;
