#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response from log source: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("failed to export log view to '{path}': {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
