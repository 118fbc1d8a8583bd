use {crate::store::StoreError, std::fmt::Display};

pub type SbfResult<T> = Result<T, Error>;

/// Errors surfaced by the filter core.
pub enum Error {
    /// `create` was called on a `refer` that already exists.
    AlreadyExists,
    /// `load` found no header at `refer`.
    NotFound,
    /// the header's magic bytes didn't read `"SBF"`.
    Corrupt,
    /// the header's version compares greater than the version this crate
    /// implements.
    UnsupportedVersion,
    /// a caller-supplied parameter failed validation, e.g. `slice_size`
    /// not a multiple of 8.
    InvalidParameter(String),
    /// the underlying store failed; the operation's state is otherwise
    /// unchanged, since atomic batches mean a failed `add` never partially
    /// applies.
    Store(StoreError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AlreadyExists => write!(f, "a filter already exists at this refer"),
            Error::NotFound => write!(f, "no filter found at this refer"),
            Error::Corrupt => write!(f, "header magic mismatch"),
            Error::UnsupportedVersion => write!(f, "unsupported header version"),
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {e}"),
            Error::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
