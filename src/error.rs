use std::sync::Arc;

/// An error that can occur in this crate.
///
/// All fallible operations in this crate return this one error type. This
/// follows the "one true error type" pattern: finer grained error types
/// proved difficult in the face of composition, since a single high level
/// operation (like opening a zone from a catalog) can fail in the collaborator
/// layer, in a decoder or in rule validation.
///
/// # Introspection
///
/// Other than implementing the [`std::error::Error`] trait, the
/// [`core::fmt::Debug`] trait and the [`core::fmt::Display`] trait, this
/// error type provides introspection through a small set of predicates like
/// [`Error::is_invalid_zone`]. Each predicate corresponds to one of the
/// error categories emitted at the boundaries of this crate.
///
/// An error may wrap a lower level cause. The cause chain is rendered as part
/// of the `Display` implementation.
#[derive(Clone)]
pub struct Error {
    /// The internal representation of an error.
    ///
    /// This is in an `Arc` to make an `Error` cheap to clone. It also makes
    /// the size of the error itself equal to one word.
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    message: String,
    cause: Option<Error>,
}

/// The category of an error.
///
/// Each variant corresponds to one boundary at which this crate reports
/// failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ErrorKind {
    /// A zone identifier could not be resolved by the catalog or its
    /// collaborator.
    ZoneNotFound,
    /// Bytes or fields that were supposed to describe a zone do not satisfy
    /// the format invariants.
    InvalidZone,
    /// The collaborator reported a permission problem.
    Security,
    /// A conversion was asked to convert a wall time that falls in the
    /// invalid window of a transition.
    InvalidTime,
    /// The ambiguous-offsets query was given a time that isn't ambiguous.
    NotAmbiguous,
    /// The textual codec could not round-trip its input.
    Serialization,
    /// A conversion received a time whose tag disagrees with the designation
    /// of the source zone.
    TagMismatch,
}

impl Error {
    /// Returns true when this error came from a failed zone lookup.
    pub fn is_zone_not_found(&self) -> bool {
        self.root().kind == ErrorKind::ZoneNotFound
    }

    /// Returns true when this error came from malformed zone data. This
    /// covers bad magic bytes, malformed counts, out of order or overlapping
    /// rule arrays, out of range offsets and the rejected Julian-day forms
    /// of the extended-future rule.
    pub fn is_invalid_zone(&self) -> bool {
        self.root().kind == ErrorKind::InvalidZone
    }

    /// Returns true when the collaborator reported a permission error.
    pub fn is_security(&self) -> bool {
        self.root().kind == ErrorKind::Security
    }

    /// Returns true when a conversion was given a wall time inside the
    /// invalid window of a daylight saving transition.
    pub fn is_invalid_time(&self) -> bool {
        self.root().kind == ErrorKind::InvalidTime
    }

    /// Returns true when the ambiguous-offsets query was given a time that
    /// is not ambiguous.
    pub fn is_not_ambiguous(&self) -> bool {
        self.root().kind == ErrorKind::NotAmbiguous
    }

    /// Returns true when the textual codec rejected its input.
    pub fn is_serialization(&self) -> bool {
        self.root().kind == ErrorKind::Serialization
    }

    /// Returns true when a conversion received a time whose tag disagrees
    /// with the source zone given.
    pub fn is_tag_mismatch(&self) -> bool {
        self.root().kind == ErrorKind::TagMismatch
    }
}

impl Error {
    /// Creates a not-found error for a zone lookup.
    ///
    /// This is the error a [`ZoneSource`](crate::tz::ZoneSource)
    /// implementation reports when it has no data for an identifier.
    pub fn zone_not_found(message: impl Into<String>) -> Error {
        Error::new(ErrorKind::ZoneNotFound, message.into())
    }

    /// Creates a permission error.
    ///
    /// This is the error a [`ZoneSource`](crate::tz::ZoneSource)
    /// implementation reports when the platform denies access to zone
    /// data.
    pub fn security(message: impl Into<String>) -> Error {
        Error::new(ErrorKind::Security, message.into())
    }

    /// Creates a new error with the given kind and message.
    #[inline(never)]
    #[cold]
    pub(crate) fn new(kind: ErrorKind, message: String) -> Error {
        Error { inner: Arc::new(ErrorInner { kind, message, cause: None }) }
    }

    /// Returns a new error with this error attached as its cause.
    ///
    /// The kind of the returned error is the kind given, so predicates
    /// report the outermost category while `Display` renders the chain.
    #[inline(never)]
    #[cold]
    pub(crate) fn context(
        self,
        kind: ErrorKind,
        message: String,
    ) -> Error {
        Error {
            inner: Arc::new(ErrorInner { kind, message, cause: Some(self) }),
        }
    }

    /// Returns the outermost error in the chain. (The kind reported by the
    /// predicates is the kind at the boundary, not the kind of the root
    /// cause.)
    fn root(&self) -> &ErrorInner {
        &self.inner
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.inner.message)?;
        let mut cause = self.inner.cause.as_ref();
        while let Some(err) = cause {
            write!(f, ": {}", err.inner.message)?;
            cause = err.inner.cause.as_ref();
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            write!(f, "{:?}: {}", self.inner.kind, self)
        } else {
            f.debug_struct("Error")
                .field("kind", &self.inner.kind)
                .field("message", &self.inner.message)
                .field("cause", &self.inner.cause)
                .finish()
        }
    }
}

/// A convenience macro for building an `Error` from a kind and a format
/// string.
///
/// ```text
/// err!(InvalidZone, "magic bytes mismatch")
/// err!(ZoneNotFound, "zone `{id}` does not exist")
/// ```
macro_rules! err {
    ($kind:ident, $($tt:tt)*) => {
        crate::error::Error::new(
            crate::error::ErrorKind::$kind,
            std::format!($($tt)*),
        )
    }
}

/// Like `err!`, but wraps an existing error as the cause.
macro_rules! err_context {
    ($cause:expr, $kind:ident, $($tt:tt)*) => {
        $cause.context(
            crate::error::ErrorKind::$kind,
            std::format!($($tt)*),
        )
    }
}

pub(crate) use {err, err_context};
