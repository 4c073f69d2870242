//! Document sources: the manifest of raw texts and async loading with timeouts.
//!
//! Matching never waits on I/O. Everything that does (reading files, or any
//! caller-provided future) goes through [`with_timeout`] so a stuck source
//! aborts the run with [`SourceError::Timeout`] instead of hanging.

use crate::declarative::model::DocumentDecl;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Errors while sourcing document text.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Loading did not finish within the caller's timeout.
    #[error("timed out after {timeout:?} loading document `{name}`")]
    Timeout {
        /// Logical document name.
        name: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// IO error reading a document file.
    #[error("failed to read document `{name}` from {path}: {source}")]
    Io {
        /// Logical document name.
        name: String,
        /// Resolved path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The loader task panicked or was cancelled.
    #[error("loader task for document `{name}` failed: {message}")]
    Task {
        /// Logical document name.
        name: String,
        /// Join error message.
        message: String,
    },

    /// The async runtime could not be started.
    #[error("failed to start document loader runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Mapping from logical document name to raw text, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentManifest {
    entries: Vec<(String, String)>,
}

impl DocumentManifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, replacing any earlier text under the same name.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((name, text)),
        }
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Text of a document by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the manifest has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, text)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for DocumentManifest {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut manifest = Self::new();
        for (name, text) in iter {
            manifest.insert(name, text);
        }
        manifest
    }
}

/// Runs a document load, failing with [`SourceError::Timeout`] if it takes
/// longer than `timeout`.
///
/// # Errors
///
/// Returns the loader's own error, or `Timeout`.
pub async fn with_timeout<F>(name: &str, timeout: Duration, load: F) -> Result<String, SourceError>
where
    F: Future<Output = Result<String, SourceError>>,
{
    match tokio::time::timeout(timeout, load).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            name: name.to_string(),
            timeout,
        }),
    }
}

/// Reads one document file with a timeout.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, or `Timeout`.
pub async fn read_document(
    name: String,
    path: PathBuf,
    timeout: Duration,
) -> Result<String, SourceError> {
    debug!("Loading document `{}` from {}", name, path.display());
    let load = async {
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SourceError::Io {
                name: name.clone(),
                path: path.clone(),
                source: e,
            })
    };
    with_timeout(&name, timeout, load).await
}

/// Loads declared documents concurrently, resolving paths against `base_dir`.
///
/// Each document gets its own timeout. The manifest keeps declaration
/// order regardless of which load finishes first.
///
/// # Errors
///
/// Returns the first error in declaration order.
pub async fn load_manifest<'a, I>(
    documents: I,
    base_dir: &Path,
    timeout: Duration,
) -> Result<DocumentManifest, SourceError>
where
    I: IntoIterator<Item = &'a DocumentDecl>,
{
    let handles: Vec<_> = documents
        .into_iter()
        .map(|decl| {
            let name = decl.name().as_str().to_string();
            let path = base_dir.join(decl.path());
            let handle = tokio::spawn(read_document(name.clone(), path, timeout));
            (name, handle)
        })
        .collect();

    let mut manifest = DocumentManifest::new();
    for (name, handle) in handles {
        let text = handle.await.map_err(|e| SourceError::Task {
            name: name.clone(),
            message: e.to_string(),
        })??;
        manifest.insert(name, text);
    }
    Ok(manifest)
}

/// Blocking wrapper around [`load_manifest`] for synchronous callers.
///
/// # Errors
///
/// Returns `Runtime` if no runtime can be started, otherwise as [`load_manifest`].
pub fn load_manifest_blocking<'a, I>(
    documents: I,
    base_dir: &Path,
    timeout: Duration,
) -> Result<DocumentManifest, SourceError>
where
    I: IntoIterator<Item = &'a DocumentDecl>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SourceError::Runtime)?;
    let result = runtime.block_on(load_manifest(documents, base_dir, timeout));
    // Dropping the runtime joins blocking-pool reads, including ones that
    // already timed out; detach them instead.
    runtime.shutdown_background();
    result
}
