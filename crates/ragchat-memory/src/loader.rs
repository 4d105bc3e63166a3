use async_trait::async_trait;
use ragchat_core::{RagError, RagResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A loaded piece of source text plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Raw text content.
    pub text: String,
    /// String metadata; `source` names where the text came from.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// A document with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    /// A document tagged with its `source`.
    pub fn with_source(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut doc = Self::new(text);
        doc.metadata.insert("source".to_string(), source.into());
        doc
    }
}

/// Anything that can produce documents. Failures surface as
/// [`RagError::SourceLoadFailure`].
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every document this source provides.
    async fn load(&self) -> RagResult<Vec<Document>>;
}

/// Loads a single UTF-8 text file as one document.
pub struct TextFileLoader {
    path: PathBuf,
}

impl TextFileLoader {
    /// Loader for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for TextFileLoader {
    async fn load(&self) -> RagResult<Vec<Document>> {
        let doc = read_document(&self.path, &self.path.display().to_string()).await?;
        Ok(vec![doc])
    }
}

/// Loads every text file under a directory, one document per file.
///
/// `ignore_paths` takes simple glob patterns (`*` matches any run of
/// characters); a file is skipped when a pattern matches either its file
/// name or its path relative to the root. Files are visited in sorted order.
pub struct DirectoryLoader {
    root: PathBuf,
    recursive: bool,
    ignore: Vec<Regex>,
}

impl DirectoryLoader {
    /// Non-recursive loader with no ignore patterns.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            ignore: Vec::new(),
        }
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Skip files matching any of `patterns`.
    pub fn ignore_paths<I, S>(mut self, patterns: I) -> RagResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.ignore.push(glob_to_regex(pattern.as_ref())?);
        }
        Ok(self)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        self.ignore
            .iter()
            .any(|re| re.is_match(&name) || re.is_match(&relative))
    }
}

#[async_trait]
impl DocumentSource for DirectoryLoader {
    async fn load(&self) -> RagResult<Vec<Document>> {
        let root_id = self.root.display().to_string();
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| RagError::source_load(dir.display().to_string(), e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| RagError::source_load(&root_id, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| RagError::source_load(path.display().to_string(), e))?;
                if file_type.is_dir() {
                    if self.recursive {
                        pending.push(path);
                    }
                } else if !self.is_ignored(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        let mut docs = Vec::with_capacity(files.len());
        for path in &files {
            docs.push(read_document(path, &path.display().to_string()).await?);
        }

        tracing::info!(root = %root_id, documents = docs.len(), "directory loaded");
        Ok(docs)
    }
}

async fn read_document(path: &Path, source_id: &str) -> RagResult<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RagError::source_load(source_id, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| RagError::source_load(source_id, "file is not valid UTF-8"))?;
    Ok(Document::with_source(text, source_id))
}

/// Translate a `*`-only glob into an anchored regex.
fn glob_to_regex(pattern: &str) -> RagResult<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|e| {
        RagError::InvalidConfiguration(format!("bad ignore pattern '{pattern}': {e}"))
    })
}
