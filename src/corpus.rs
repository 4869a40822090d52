//! Document corpus provider.
//!
//! The corpus is the raw material embedded into exploration prompts: market
//! notes, interview summaries, product docs. Ingestion and text extraction
//! are out of scope; this module only loads already-extracted text files.
//! An empty corpus is reported as-is and turned into a fatal setup condition
//! by the execution engine.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::CorpusError;

/// One source document fed into prompt context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Title derived from the file name.
    pub title: String,
    /// Extracted text content.
    pub body: String,
}

/// Trait for corpus sources.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Loads all available documents. Zero documents is not an error here.
    async fn load_documents(&self) -> Result<Vec<Document>, CorpusError>;
}

/// Corpus provider backed by a directory of `.md` and `.txt` files.
pub struct FileCorpus {
    root: PathBuf,
}

impl FileCorpus {
    /// Creates a provider rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn is_corpus_file(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("md") | Some("txt")
        )
    }
}

#[async_trait]
impl CorpusProvider for FileCorpus {
    async fn load_documents(&self) -> Result<Vec<Document>, CorpusError> {
        if !self.root.is_dir() {
            return Err(CorpusError::MissingDirectory(
                self.root.display().to_string(),
            ));
        }

        let mut documents = Vec::new();

        // Sorted walk so prompt context is stable across runs.
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !Self::is_corpus_file(path) {
                continue;
            }

            let body = tokio::fs::read_to_string(path).await?;
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string();

            documents.push(Document { title, body });
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_markdown_and_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-notes.md"), "market notes").unwrap();
        std::fs::write(dir.path().join("b-interview.txt"), "interview").unwrap();
        std::fs::write(dir.path().join("ignore.csv"), "1,2,3").unwrap();

        let corpus = FileCorpus::new(dir.path());
        let docs = corpus.load_documents().await.unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "a-notes");
        assert_eq!(docs[0].body, "market notes");
        assert_eq!(docs[1].title, "b-interview");
    }

    #[tokio::test]
    async fn test_empty_directory_yields_zero_documents() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = FileCorpus::new(dir.path());
        let docs = corpus.load_documents().await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let corpus = FileCorpus::new("/definitely/not/a/real/path");
        let result = corpus.load_documents().await;
        assert!(matches!(result, Err(CorpusError::MissingDirectory(_))));
    }
}
