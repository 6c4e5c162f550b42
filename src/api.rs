// API client module: uploads artifacts to the deployments service. One
// blocking call per upload, no retries. The artifact is buffered into a
// multipart body first so the request can carry an exact Content-Length.

use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::errors::{UploadError, UploadResult};
use crate::files::{FileSource, LocalFiles};
use crate::multipart::MultipartWriter;
use crate::progress::{
    ProgressFactory, ProgressReader, ProgressSink, ProgressWriter, TerminalProgress,
};
use crate::transport::{HttpTransport, OutgoingRequest, Transport};

/// Relative path of the artifact upload endpoint.
pub const ARTIFACT_UPLOAD_PATH: &str = "/api/management/v1/deployments/artifacts";

/// Form field carrying the artifact content.
pub const ARTIFACT_FIELD: &str = "artifact";

/// Inputs of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub description: String,
    pub artifact_path: PathBuf,
    pub token_path: PathBuf,
    pub no_progress: bool,
}

/// Client for the deployments service.
///
/// Holds the base URL, the precomputed upload URL and the collaborators
/// used to reach the network, the filesystem and the terminal.
pub struct UploadClient {
    base_url: String,
    artifact_upload_url: String,
    skip_verify: bool,
    transport: Box<dyn Transport>,
    files: Box<dyn FileSource>,
    progress: Box<dyn ProgressFactory>,
}

impl UploadClient {
    /// Build a client for `base_url`. No I/O happens here; a malformed URL
    /// is reported when the first request is attempted.
    pub fn new(base_url: &str, skip_verify: bool) -> Self {
        UploadClient {
            base_url: base_url.to_string(),
            artifact_upload_url: join_url(base_url, ARTIFACT_UPLOAD_PATH),
            skip_verify,
            transport: Box::new(HttpTransport::new(skip_verify)),
            files: Box::new(LocalFiles),
            progress: Box::new(TerminalProgress::default()),
        }
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_files(mut self, files: impl FileSource + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressFactory + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn upload_url(&self) -> &str {
        &self.artifact_upload_url
    }

    pub fn skip_verify(&self) -> bool {
        self.skip_verify
    }

    /// Upload one artifact. Only `201 Created` counts as success.
    pub fn upload_artifact(&self, request: &UploadRequest) -> UploadResult<()> {
        let artifact = self
            .files
            .open_artifact(&request.artifact_path)
            .map_err(|source| UploadError::ArtifactAccess {
                path: request.artifact_path.clone(),
                source,
            })?;
        let size = artifact.size;

        let buf = Vec::with_capacity(usize::try_from(size).unwrap_or(0));

        let token = self
            .files
            .read_token(&request.token_path)
            .map_err(|e| UploadError::NotLoggedIn(Some(e)))?;

        let buffering = if request.no_progress {
            None
        } else {
            info!("Buffering request");
            Some(self.progress.start(size))
        };

        let (buf, content_type) = encode_form(
            buf,
            &size.to_string(),
            &request.description,
            &artifact.name,
            artifact.reader,
            buffering.clone(),
        )?;
        let content_length = buf.len() as u64;

        let body: Box<dyn Read + Send> = match buffering {
            Some(bar) => {
                bar.finish();
                info!("Uploading artifact to: {}", self.artifact_upload_url);
                let sending = self.progress.start(content_length);
                Box::new(ProgressReader::new(Cursor::new(buf), sending))
            }
            None => Box::new(Cursor::new(buf)),
        };

        let outgoing = OutgoingRequest {
            url: self.artifact_upload_url.clone(),
            headers: upload_headers(&content_type, &token)?,
            content_length,
            body,
        };
        debug!("sending request: \n{}", dump_request(&outgoing));

        let mut response = self
            .transport
            .post(outgoing)
            .map_err(UploadError::Transport)?;

        let mut text = Vec::new();
        let read = response.body.read_to_end(&mut text);
        debug!(
            "response: \n{}\n{}\n{}\n",
            response.status,
            dump_headers(&response.headers),
            String::from_utf8_lossy(&text)
        );

        if response.status == StatusCode::CREATED {
            return Ok(());
        }
        read.map_err(UploadError::ResponseRead)?;
        let body = String::from_utf8_lossy(&text).into_owned();

        if response.status == StatusCode::UNAUTHORIZED {
            debug!(
                "artifact upload failed with status {}, reason: {}",
                response.status.as_u16(),
                body
            );
            return Err(UploadError::NotLoggedIn(None));
        }
        Err(UploadError::Rejected {
            status: response.status.as_u16(),
            body,
        })
    }
}

/// Join `base` and `path` with exactly one slash between them.
///
/// One leading slash is stripped from `path` and a slash is appended to
/// `base` if it lacks one. Nothing is validated.
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    if base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Write the upload form into `out`: `size`, `description`, then the
/// artifact under `ARTIFACT_FIELD`.
///
/// If copying the artifact fails the writer is still closed, but only the
/// copy error is returned; a close failure on that path is dropped.
fn encode_form<W: Write>(
    out: W,
    size: &str,
    description: &str,
    file_name: &str,
    mut artifact: impl Read,
    progress: Option<Arc<dyn ProgressSink>>,
) -> UploadResult<(W, String)> {
    let mut writer = MultipartWriter::new(out);
    let content_type = writer.content_type();

    let copied = (|| -> io::Result<u64> {
        writer.write_field("size", size)?;
        writer.write_field("description", description)?;
        let part = writer.create_form_file(ARTIFACT_FIELD, file_name)?;
        match progress {
            Some(sink) => io::copy(&mut artifact, &mut ProgressWriter::new(part, sink)),
            None => {
                let mut part = part;
                io::copy(&mut artifact, &mut part)
            }
        }
    })();

    if let Err(e) = copied {
        let _ = writer.close();
        return Err(UploadError::PrepareRequest(e));
    }
    writer.close().map_err(UploadError::PrepareRequest)?;

    Ok((writer.into_inner(), content_type))
}

fn upload_headers(content_type: &str, token: &[u8]) -> UploadResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(content_type)
        .map_err(|e| UploadError::InvalidRequest(format!("Content-Type: {e}")))?;
    headers.insert(CONTENT_TYPE, content_type);

    let mut bearer = b"Bearer ".to_vec();
    bearer.extend_from_slice(token);
    let authorization = HeaderValue::from_bytes(&bearer).map_err(|_| {
        UploadError::InvalidRequest("token is not a valid Authorization header value".into())
    })?;
    headers.insert(AUTHORIZATION, authorization);
    Ok(headers)
}

fn dump_request(request: &OutgoingRequest) -> String {
    format!(
        "POST {} HTTP/1.1\r\n{}Content-Length: {}\r\n",
        request.url,
        dump_headers(&request.headers),
        request.content_length
    )
}

fn dump_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes())))
        .collect()
}
