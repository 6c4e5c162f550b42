// Library root
// -----------
// This crate exposes the library surface behind the `deploy-cli` binary.
//
// Module responsibilities:
// - `api`: the upload client: endpoint URL, multipart body, request and
//   response classification.
// - `transport`: the HTTP seam and its blocking reqwest implementation.
// - `files`: reading the artifact and the login token.
// - `multipart`: multipart/form-data encoding into any writer.
// - `progress`: byte-counting reader/writer decorators and terminal bars.
// - `errors`: the upload failure taxonomy.
// - `cli` and `ui`: argument parsing and the command flows used by `main`.
pub mod api;
pub mod cli;
pub mod errors;
pub mod files;
pub mod multipart;
pub mod progress;
pub mod transport;
pub mod ui;

pub use api::{join_url, UploadClient, UploadRequest, ARTIFACT_UPLOAD_PATH};
pub use errors::{UploadError, UploadResult};
