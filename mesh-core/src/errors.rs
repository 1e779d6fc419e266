use std::path::PathBuf;
use thiserror::Error;

/// Result alias for [`Error`](./enum.Error.html)
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by mesh loading, saving, and structural repair.
///
/// Diagnostic predicates never produce an `Error`: on malformed or
/// inconsistent input they report zeros or the documented undefined
/// sentinel (e.g. `hole_count == -1`) instead. See the crate-level
/// docs for the full propagation policy.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file is missing, unreadable, or the decoder hit a
    /// critical parse error partway through.
    /// # Examples
    /// ```
    /// use mesh_core::Error;
    /// let err = Error::UnreadableInput {
    ///     path: "missing.stl".into(),
    ///     source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    /// };
    /// assert!(err.to_string().contains("missing.stl"));
    /// ```
    #[error("could not read mesh from {path}: {source}")]
    UnreadableInput {
        /// path that was being read
        path: PathBuf,
        /// underlying I/O or decode error
        #[source]
        source: std::io::Error,
    },
    /// The file extension was not recognised on load or save.
    #[error("unsupported mesh format for {path}")]
    UnsupportedFormat {
        /// path whose extension could not be resolved
        path: PathBuf,
    },
    /// A post-condition failed after a structural rebuild — a
    /// programmer error in this crate, not a malformed-input case.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}
