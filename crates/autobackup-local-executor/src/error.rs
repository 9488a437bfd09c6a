use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalExecutorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LocalExecutorError>;

impl From<LocalExecutorError> for autobackup_core::Error {
    fn from(err: LocalExecutorError) -> Self {
        match err {
            LocalExecutorError::Io(e) => autobackup_core::Error::Io(e),
            LocalExecutorError::CommandFailed {
                program,
                code,
                stderr,
            } => autobackup_core::Error::CommandFailed {
                program,
                code,
                stderr,
            },
            LocalExecutorError::Zip(e) => autobackup_core::Error::Archive(e.to_string()),
            LocalExecutorError::Walk(e) => autobackup_core::Error::Archive(e.to_string()),
            LocalExecutorError::Other(e) => autobackup_core::Error::Other(e),
            other => autobackup_core::Error::Other(anyhow::Error::new(other)),
        }
    }
}
