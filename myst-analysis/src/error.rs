use std::path::PathBuf;

/// Failures while loading project files.
///
/// None of these reach a caller of the query functions: loaders log them and
/// treat the file as absent.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
    #[error("failed to list directory {}: {source}", path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
