// Local file access used by an upload: the artifact to send and the token
// left behind by `login`. Kept behind a trait so tests can hand in
// in-memory contents.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// An opened artifact, ready to be streamed.
pub struct ArtifactFile {
    /// Base name of the file, sent as the multipart filename.
    pub name: String,
    /// Length in bytes as reported by the filesystem when opened.
    pub size: u64,
    pub reader: Box<dyn Read + Send>,
}

#[cfg_attr(test, automock)]
pub trait FileSource: Send + Sync {
    /// Open the artifact and report its name and size.
    fn open_artifact(&self, path: &Path) -> io::Result<ArtifactFile>;

    /// Read the whole token file. Contents are returned untouched.
    fn read_token(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// `FileSource` backed by the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn open_artifact(&self, path: &Path) -> io::Result<ArtifactFile> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ArtifactFile {
            name,
            size: metadata.len(),
            reader: Box::new(file),
        })
    }

    fn read_token(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}
