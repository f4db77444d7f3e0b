//! Split numbered markdown files into one knowledge-base document per heading.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbDocument {
    pub docid: String,
    pub folder_name: String,
    pub header_title: String,
    pub content_text: String,
}

impl KbDocument {
    /// Returns `None` for sections with no header or blank content.
    pub fn new(folder_name: &str, header_title: &str, content_text: &str) -> Option<Self> {
        let content = content_text.trim();
        if content.is_empty() || header_title.is_empty() {
            return None;
        }
        Some(KbDocument {
            docid: doc_id(folder_name, header_title),
            folder_name: folder_name.to_string(),
            header_title: header_title.to_string(),
            content_text: content.to_string(),
        })
    }

    /// Custom inline document in the managed ingest API's request shape.
    pub fn ingest_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "metadata": {
                "type": "IN_LINE_ATTRIBUTE",
                "inlineAttributes": [
                    { "key": "header", "value": { "type": "STRING", "stringValue": self.header_title } },
                    { "key": "folder", "value": { "type": "STRING", "stringValue": self.folder_name } },
                ],
            },
            "content": {
                "dataSourceType": "CUSTOM",
                "custom": {
                    "customDocumentIdentifier": { "id": self.docid },
                    "sourceType": "IN_LINE",
                    "inlineContent": {
                        "type": "TEXT",
                        "textContent": { "data": self.content_text },
                    },
                },
            },
        })
    }
}

/// `<folder>_<first 10 hex chars of sha1("<folder>__<header>")>`
pub fn doc_id(folder_name: &str, header_title: &str) -> String {
    let digest = Sha1::digest(format!("{}__{}", folder_name, header_title).as_bytes());
    let hex = hex::encode(digest);
    format!("{}_{}", folder_name, &hex[..10])
}

/// Compiled patterns for headings and numbered file names.
pub struct Splitter {
    heading: Regex,
    numbered: Regex,
}

impl Splitter {
    pub fn new() -> Result<Self> {
        Ok(Splitter {
            heading: Regex::new(r"^#{1,6}\s+")?,
            numbered: Regex::new(r"^(\d+)")?,
        })
    }

    /// One document per heading section. Text before the first heading is dropped.
    pub fn split_sections(&self, folder_name: &str, text: &str) -> Vec<KbDocument> {
        let mut docs = Vec::new();
        let mut header: Option<String> = None;
        let mut section = String::new();
        for line in text.split_inclusive('\n') {
            if self.heading.is_match(line) {
                if let Some(h) = header.as_deref() {
                    docs.extend(KbDocument::new(folder_name, h, &section));
                }
                section.clear();
                header = Some(line.trim().to_string());
                section.push_str(line);
            } else if header.is_some() {
                section.push_str(line);
            }
        }
        if let Some(h) = header.as_deref() {
            docs.extend(KbDocument::new(folder_name, h, &section));
        }
        docs
    }

    /// Files in `folder` whose names start with digits, in numeric order of that prefix.
    pub fn numbered_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<(u64, String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(folder).with_context(|| format!("reading {}", folder.display()))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(caps) = self.numbered.captures(&name) else {
                debug!(file = %name, "skipping unnumbered file");
                continue;
            };
            let n = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            files.push((n, name, entry.path()));
        }
        files.sort();
        Ok(files.into_iter().map(|(_, _, p)| p).collect())
    }

    /// Every section of every numbered file in every subfolder of `docs_dir`.
    pub fn scan_docs(&self, docs_dir: &Path) -> Result<Vec<KbDocument>> {
        let mut folders = Vec::new();
        for entry in fs::read_dir(docs_dir).with_context(|| format!("reading {}", docs_dir.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                folders.push(entry.path());
            }
        }
        folders.sort();

        let mut docs = Vec::new();
        for folder in folders {
            let folder_name = folder.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            for file in self.numbered_files(&folder)? {
                let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
                let found = self.split_sections(&folder_name, &text);
                debug!(file = %file.display(), sections = found.len(), "split file");
                docs.extend(found);
            }
        }
        info!(dir = %docs_dir.display(), documents = docs.len(), "scanned knowledge-base docs");
        Ok(docs)
    }
}

/// Ingest payloads grouped into request-sized batches.
pub fn ingest_batches(docs: &[KbDocument], batch_size: usize) -> Vec<Vec<serde_json::Value>> {
    docs.chunks(batch_size.max(1))
        .map(|chunk| chunk.iter().map(KbDocument::ingest_payload).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "intro text is dropped\n# Assets\nAll about assets.\n\n## Domains\nDomain rows.\n# Empty\n";

    #[test]
    fn split_by_heading_keeps_header_line() {
        let s = Splitter::new().unwrap();
        let docs = s.split_sections("guide", SAMPLE);
        let titles: Vec<_> = docs.iter().map(|d| d.header_title.as_str()).collect();
        assert_eq!(titles, vec!["# Assets", "## Domains", "# Empty"]);
        assert_eq!(docs[0].content_text, "# Assets\nAll about assets.");
        assert_eq!(docs[1].content_text, "## Domains\nDomain rows.");
    }

    #[test]
    fn seven_hashes_is_not_a_heading() {
        let s = Splitter::new().unwrap();
        let docs = s.split_sections("f", "# A\n####### not a heading\n");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content_text.ends_with("####### not a heading"));
    }

    #[test]
    fn no_heading_means_no_docs() {
        let s = Splitter::new().unwrap();
        assert!(s.split_sections("f", "just text\nmore\n").is_empty());
    }

    #[test]
    fn doc_id_is_folder_plus_short_sha1() {
        let id = doc_id("guide", "# Assets");
        let (folder, hash) = id.split_once('_').unwrap();
        assert_eq!(folder, "guide");
        assert_eq!(hash.len(), 10);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, doc_id("guide", "# Assets"));
        assert_ne!(id, doc_id("other", "# Assets"));
    }

    #[test]
    fn doc_id_matches_known_digest() {
        assert_eq!(doc_id("guide", "# Assets"), "guide_2bacc3dd12");
    }

    #[test]
    fn batches_are_capped() {
        let docs: Vec<_> = (0..23).filter_map(|i| KbDocument::new("f", &format!("# H{i}"), "# body")).collect();
        let batches = ingest_batches(&docs, DEFAULT_BATCH_SIZE);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![10, 10, 3]);
        let first = &batches[0][0];
        assert_eq!(first["content"]["custom"]["customDocumentIdentifier"]["id"], docs[0].docid);
        assert_eq!(first["metadata"]["inlineAttributes"][1]["value"]["stringValue"], "f");
    }

    #[test]
    fn scan_orders_numbered_files_numerically() {
        let root = std::env::temp_dir().join(format!("kb-docs-test-{}", std::process::id()));
        let folder = root.join("platform");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("10-late.md"), "# Late\nz\n").unwrap();
        fs::write(folder.join("2-early.md"), "# Early\na\n").unwrap();
        fs::write(folder.join("readme.md"), "# Ignored\nx\n").unwrap();
        fs::write(root.join("loose.md"), "# Loose\nx\n").unwrap();

        let docs = Splitter::new().unwrap().scan_docs(&root).unwrap();
        let titles: Vec<_> = docs.iter().map(|d| d.header_title.as_str()).collect();
        assert_eq!(titles, vec!["# Early", "# Late"]);
        assert!(docs.iter().all(|d| d.folder_name == "platform"));
        fs::remove_dir_all(&root).unwrap();
    }
}
