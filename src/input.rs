//! Staged user input: one file, an ordered list of files, or text.
//!
//! A [`PendingInput`] is owned by the session and replaced wholesale on tool
//! switch or reset. The merge tool's file list is ordered and can be
//! reordered in place; the order is the page order of the merged PDF.

use crate::error::DocdashError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file held in memory, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent in the multipart `filename` parameter.
    pub name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Build an upload from raw bytes, guessing the MIME type from the name.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).map(str::to_string);
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Read a local file into memory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocdashError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocdashError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => DocdashError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => DocdashError::Internal(format!("reading {}: {e}", path.display())),
        })?;

        let name = file_name_of(path);
        debug!("Staged {} ({} bytes)", name, bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

/// What the user has staged for the active tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PendingInput {
    #[default]
    Empty,
    File(UploadFile),
    /// Ordered; order is preserved on the wire.
    Files(Vec<UploadFile>),
    Text(String),
}

impl PendingInput {
    pub fn is_empty(&self) -> bool {
        match self {
            PendingInput::Empty => true,
            PendingInput::Files(files) => files.is_empty(),
            PendingInput::Text(t) => t.is_empty(),
            PendingInput::File(_) => false,
        }
    }

    /// Number of staged files (0 for text).
    pub fn file_count(&self) -> usize {
        match self {
            PendingInput::File(_) => 1,
            PendingInput::Files(files) => files.len(),
            PendingInput::Empty | PendingInput::Text(_) => 0,
        }
    }

    /// Append a file, promoting a single staged file to a list.
    pub fn push_file(&mut self, file: UploadFile) {
        *self = match std::mem::take(self) {
            PendingInput::File(first) => PendingInput::Files(vec![first, file]),
            PendingInput::Files(mut files) => {
                files.push(file);
                PendingInput::Files(files)
            }
            PendingInput::Empty | PendingInput::Text(_) => PendingInput::Files(vec![file]),
        };
    }

    /// Remove and return the file at `index`.
    pub fn remove_file(&mut self, index: usize) -> Result<UploadFile, DocdashError> {
        let len = self.file_count();
        match self {
            PendingInput::Files(files) if index < files.len() => Ok(files.remove(index)),
            PendingInput::File(_) if index == 0 => match std::mem::take(self) {
                PendingInput::File(f) => Ok(f),
                _ => Err(DocdashError::Internal("staged file vanished".into())),
            },
            _ => Err(DocdashError::FileIndexOutOfRange { index, len }),
        }
    }

    /// Move the file at `from` so it ends up at position `to`.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<(), DocdashError> {
        let len = self.file_count();
        match self {
            PendingInput::Files(files) if from < files.len() && to < files.len() => {
                let f = files.remove(from);
                files.insert(to, f);
                Ok(())
            }
            PendingInput::File(_) if from == 0 && to == 0 => Ok(()),
            _ => Err(DocdashError::FileIndexOutOfRange {
                index: from.max(to),
                len,
            }),
        }
    }

    /// Names of the staged files, in order.
    pub fn file_names(&self) -> Vec<&str> {
        match self {
            PendingInput::File(f) => vec![f.name.as_str()],
            PendingInput::Files(files) => files.iter().map(|f| f.name.as_str()).collect(),
            PendingInput::Empty | PendingInput::Text(_) => vec![],
        }
    }
}

/// Load several local files in order.
pub async fn load_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>, DocdashError> {
    let mut files = Vec::with_capacity(paths.len());
    for p in paths {
        files.push(UploadFile::from_path(p).await?);
    }
    Ok(files)
}

/// MIME type for the extensions the services deal with.
pub fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Preferred file extension for a MIME type (inverse of [`guess_content_type`]).
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "text/plain" => "txt",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/tiff" => "tiff",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "application/zip" => "zip",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str) -> UploadFile {
        UploadFile::from_bytes(name, b"%PDF-1.7".to_vec())
    }

    #[test]
    fn push_promotes_single_file_to_list() {
        let mut input = PendingInput::File(pdf("a.pdf"));
        input.push_file(pdf("b.pdf"));
        assert_eq!(input.file_names(), vec!["a.pdf", "b.pdf"]);

        let mut input = PendingInput::Text("hello".into());
        input.push_file(pdf("c.pdf"));
        assert_eq!(input.file_count(), 1);
    }

    #[test]
    fn move_file_reorders() {
        let mut input = PendingInput::Files(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")]);
        input.move_file(2, 0).unwrap();
        assert_eq!(input.file_names(), vec!["c.pdf", "a.pdf", "b.pdf"]);
        input.move_file(0, 1).unwrap();
        assert_eq!(input.file_names(), vec!["a.pdf", "c.pdf", "b.pdf"]);
    }

    #[test]
    fn move_and_remove_out_of_range() {
        let mut input = PendingInput::Files(vec![pdf("a.pdf")]);
        assert!(matches!(
            input.move_file(0, 3),
            Err(DocdashError::FileIndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(input.remove_file(5).is_err());
        let removed = input.remove_file(0).unwrap();
        assert_eq!(removed.name, "a.pdf");
        assert!(input.is_empty());
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_content_type("Scan.PDF"), Some("application/pdf"));
        assert_eq!(guess_content_type("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(guess_content_type("README"), None);
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("image/png; charset=binary"), "png");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadFile::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, DocdashError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn from_path_reads_name_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.mp3");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "voice.mp3");
        assert_eq!(file.content_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(file.size(), 3);
    }
}
