// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writing graph documents to disk and finding them again.

use crate::graph::GraphDocument;
use crate::serialization::{deserialize_any, serialize, DeserializeError, Encoding, SerializeError};
use crate::validation::{Validated, ValidationError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of persisted graph documents
pub const DOCUMENT_EXTENSION: &str = "shadergraph";

/// Notified after a document has been written, so the host can import it
pub trait AssetImportHook {
    /// Called with the path of a freshly written document
    fn document_written(&self, path: &Path);
}

impl<F: Fn(&Path)> AssetImportHook for F {
    fn document_written(&self, path: &Path) {
        self(path);
    }
}

/// Validate, encode and write a document to any byte sink
pub fn write_to<W: Write>(
    doc: &GraphDocument,
    writer: &mut W,
    encoding: Encoding,
) -> Result<usize, PersistError> {
    let validated = Validated::new(doc)?;
    let bytes = serialize(&validated, encoding)?;
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(PersistError::Sink)?;
    Ok(bytes.len())
}

/// Validate, encode and write a document to `path`.
///
/// The parent directory is created when missing. The import hook only
/// runs once the file has been written and closed.
pub fn write_document(
    doc: &GraphDocument,
    path: &Path,
    encoding: Encoding,
    hook: Option<&dyn AssetImportHook>,
) -> Result<(), PersistError> {
    let validated = Validated::new(doc)?;
    let bytes = serialize(&validated, encoding)?;

    let io_err = |source: std::io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
            tracing::info!("Created folder: {}", parent.display());
        }
    }

    {
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes).map_err(io_err)?;
        let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
        file.sync_all().map_err(io_err)?;
    }

    tracing::info!(
        bytes = bytes.len(),
        encoding = encoding.name(),
        "Saved graph to {}",
        path.display()
    );
    if let Some(hook) = hook {
        hook.document_written(path);
    }
    Ok(())
}

/// Read and validate a document, detecting its encoding
pub fn read_document(path: &Path) -> Result<GraphDocument, PersistError> {
    let bytes = std::fs::read(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = deserialize_any(&bytes).map_err(|source| PersistError::Deserialize {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(nodes = doc.node_count(), "Loaded graph from {}", path.display());
    Ok(doc)
}

/// All files under `root` accepted by `predicate`, sorted by path.
///
/// Unreadable directory entries are skipped.
pub fn find_documents<P>(root: &Path, mut predicate: P) -> Vec<PathBuf>
where
    P: FnMut(&Path) -> bool,
{
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| predicate(path.as_path()))
        .collect();
    found.sort();
    found
}

/// Whether a path carries the graph document extension
pub fn is_graph_document(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

/// Error while persisting or loading a document
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The document failed validation and was not written
    #[error("Refusing to write invalid graph: {0}")]
    Validation(#[from] ValidationError),

    /// Encoding failed
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// The file could not be decoded
    #[error("{}: {source}", .path.display())]
    Deserialize {
        /// File being read
        path: PathBuf,
        /// Decoding failure
        source: DeserializeError,
    },

    /// The file could not be opened, written or closed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// A caller-supplied writer failed
    #[error("Failed to write graph: {0}")]
    Sink(#[source] std::io::Error),
}
