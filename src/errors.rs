// Error types for the upload path. Each variant is one failure class the
// caller can tell apart; the original cause is always kept as `source` so
// the binary can print the whole chain.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a `Transport` when the request never completed.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong while uploading an artifact.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The artifact could not be opened or stat'd. Nothing was sent.
    #[error("Cannot read artifact file {path}")]
    ArtifactAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No usable credentials: either the token file is unreadable or the
    /// server answered 401. Both mean the user has to log in again.
    #[error("Unauthorized. Please login first")]
    NotLoggedIn(#[source] Option<io::Error>),

    /// Copying the artifact into the multipart body failed.
    #[error("error preparing multipart request")]
    PrepareRequest(#[source] io::Error),

    /// The request could not be assembled (e.g. the token is not a legal
    /// header value).
    #[error("Cannot create request: {0}")]
    InvalidRequest(String),

    /// The request did not complete: DNS, connect, TLS, timeout.
    #[error("POST /artifacts request failed")]
    Transport(#[source] TransportError),

    /// The server completed the request and rejected it.
    #[error("artifact upload failed with status {status}, reason: {body}")]
    Rejected { status: u16, body: String },

    /// The rejection body could not be read.
    #[error("can't read response body")]
    ResponseRead(#[source] io::Error),
}

impl UploadError {
    /// True for both flavours of "you are not authenticated".
    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, UploadError::NotLoggedIn(_))
    }

    /// HTTP status carried by a server rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_logged_in_reads_the_same_for_both_causes() {
        let missing = UploadError::NotLoggedIn(Some(io::Error::new(
            io::ErrorKind::NotFound,
            "no such file",
        )));
        let rejected = UploadError::NotLoggedIn(None);

        assert_eq!(missing.to_string(), rejected.to_string());
        assert!(missing.is_not_logged_in());
        assert!(rejected.is_not_logged_in());
        assert!(missing.source().is_some());
        assert!(rejected.source().is_none());
    }

    #[test]
    fn rejected_carries_status_and_body() {
        let err = UploadError::Rejected {
            status: 403,
            body: "forbidden".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            err.to_string(),
            "artifact upload failed with status 403, reason: forbidden"
        );
        assert!(!err.is_not_logged_in());
    }

    #[test]
    fn wrappers_keep_their_cause() {
        let err = UploadError::PrepareRequest(io::Error::new(io::ErrorKind::Other, "disk gone"));
        let cause = err.source().map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("disk gone"));
    }
}
