use {sbf::Error as SbfError, std::fmt::Display};

pub type BResult<T> = Result<T, Error>;

/// CLI-level errors: the filter core rejected something. Argument parsing
/// itself is handled entirely by `clap`, which exits the process before
/// `run()` is ever called on a malformed command line.
pub enum Error {
    /// an error originating from the `sbf` crate (store failure, corrupt
    /// header, ...)
    Filter(SbfError),
}

impl From<SbfError> for Error {
    fn from(e: SbfError) -> Self {
        Self::Filter(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Filter(e) => write!(f, "filter error: {e}"),
        }
    }
}
