// src/services/dedup.rs

//! Corpus deduplication across page artifacts.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::utils::fs::write_atomic;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Merges artifacts into one sorted set of unique, trimmed, non-empty lines.
#[derive(Debug, Clone)]
pub struct CorpusDeduplicator {
    encodings: Vec<&'static Encoding>,
    suffix: String,
    max_concurrent_reads: usize,
}

impl CorpusDeduplicator {
    pub fn new(config: &Config) -> Result<Self> {
        let encodings = config
            .dedup
            .encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                    AppError::validation(format!("unknown encoding label '{label}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            encodings,
            suffix: config.output.artifact_suffix.clone(),
            max_concurrent_reads: config.dedup.max_concurrent_reads.max(1),
        })
    }

    /// Artifacts in `dir` ending with the artifact suffix and matching no
    /// excluded pattern (case-insensitive), sorted by name.
    pub async fn artifacts(&self, dir: &Path, excluded: &[String]) -> Result<Vec<PathBuf>> {
        let excluded: Vec<String> = excluded.iter().map(|p| p.to_lowercase()).collect();
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(&self.suffix.to_lowercase()) {
                continue;
            }
            if excluded.iter().any(|pattern| name.contains(pattern)) {
                log::debug!("Excluded artifact {}", entry.path().display());
                continue;
            }
            paths.push(entry.path());
        }

        paths.sort();
        Ok(paths)
    }

    /// Union of the lines of every eligible artifact in `dir`.
    ///
    /// Unreadable or undecodable artifacts are skipped with a warning.
    pub async fn merge(&self, dir: &Path, excluded: &[String]) -> Result<BTreeSet<String>> {
        let paths = self.artifacts(dir, excluded).await?;
        log::info!("Merging {} artifacts from {}", paths.len(), dir.display());

        let mut reads = stream::iter(paths)
            .map(|path| async move {
                let bytes = tokio::fs::read(&path).await;
                (path, bytes)
            })
            .buffer_unordered(self.max_concurrent_reads);

        let mut lines = BTreeSet::new();
        let mut skipped = 0;
        while let Some((path, bytes)) = reads.next().await {
            let bytes = match bytes {
                Ok(bytes) => bytes,
                Err(e) => {
                    skipped += 1;
                    log::warn!("Artifact read failed for {}: {e}", path.display());
                    continue;
                }
            };
            match self.decode_with_fallback(&path, &bytes) {
                Ok(text) => lines.extend(
                    text.lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(String::from),
                ),
                Err(e) => {
                    skipped += 1;
                    log::warn!("{e}");
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} unreadable artifacts");
        }
        Ok(lines)
    }

    /// Decode with the first encoding that yields no malformed sequences.
    pub fn decode_with_fallback(&self, path: &Path, bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        self.encodings
            .iter()
            .find_map(|encoding| {
                encoding
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(|text| {
                        log::debug!("Decoded {} as {}", path.display(), encoding.name());
                        text.into_owned()
                    })
            })
            .ok_or_else(|| {
                let tried: Vec<_> = self.encodings.iter().map(|e| e.name()).collect();
                AppError::decode(path, format!("not decodable as any of {}", tried.join(", ")))
            })
    }

    /// Write `lines` one per row, replacing any previous file.
    pub async fn write(&self, lines: &BTreeSet<String>, output: &Path) -> Result<()> {
        let mut body = lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        write_atomic(output, body.as_bytes())
            .await
            .map_err(|e| AppError::write(output, e))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn dedup() -> CorpusDeduplicator {
        CorpusDeduplicator::new(&Config::default()).unwrap()
    }

    fn excluded() -> Vec<String> {
        Config::default().dedup.excluded_artifact_patterns
    }

    #[tokio::test]
    async fn test_merge_is_set_union_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x\n  y  \nx\n\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "y\nz\n").unwrap();

        let lines = dedup().merge(dir.path(), &excluded()).await.unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), ["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_merge_is_independent_of_file_order() {
        let forward = TempDir::new().unwrap();
        std::fs::write(forward.path().join("1.txt"), "x\ny\nx").unwrap();
        std::fs::write(forward.path().join("2.txt"), "y\nz").unwrap();
        let reverse = TempDir::new().unwrap();
        std::fs::write(reverse.path().join("1.txt"), "y\nz").unwrap();
        std::fs::write(reverse.path().join("2.txt"), "x\ny\nx").unwrap();

        let d = dedup();
        assert_eq!(
            d.merge(forward.path(), &[]).await.unwrap(),
            d.merge(reverse.path(), &[]).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_encoding_fallback_matches_utf8() {
        let text = "日本語のテキスト\nカタカナ\n";
        let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode(text);
        let (eucjp, _, _) = encoding_rs::EUC_JP.encode(text);

        let utf8_dir = TempDir::new().unwrap();
        std::fs::write(utf8_dir.path().join("page.txt"), text).unwrap();
        let sjis_dir = TempDir::new().unwrap();
        std::fs::write(sjis_dir.path().join("page.txt"), &sjis).unwrap();
        let eucjp_dir = TempDir::new().unwrap();
        std::fs::write(eucjp_dir.path().join("page.txt"), &eucjp).unwrap();

        let d = dedup();
        let expected = d.merge(utf8_dir.path(), &[]).await.unwrap();
        assert_eq!(expected.len(), 2);
        assert_eq!(d.merge(sjis_dir.path(), &[]).await.unwrap(), expected);

        let eucjp_only = CorpusDeduplicator {
            encodings: vec![encoding_rs::UTF_8, encoding_rs::EUC_JP],
            ..d
        };
        assert_eq!(eucjp_only.merge(eucjp_dir.path(), &[]).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_undecodable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.txt"), b"\xff\xfe\xfd\n").unwrap();
        std::fs::write(dir.path().join("good.txt"), "kept line\n").unwrap();

        let d = CorpusDeduplicator {
            encodings: vec![encoding_rs::UTF_8],
            ..dedup()
        };
        let lines = d.merge(dir.path(), &[]).await.unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), ["kept line"]);
    }

    #[tokio::test]
    async fn test_excluded_and_foreign_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site_intro.txt"), "text line\n").unwrap();
        std::fs::write(dir.path().join("site_media_clip_MP4.txt"), "video placeholder\n").unwrap();
        std::fs::write(dir.path().join("combined.md"), "markdown line\n").unwrap();
        std::fs::write(dir.path().join("crawl_report.json"), "{}\n").unwrap();

        let lines = dedup().merge(dir.path(), &excluded()).await.unwrap();
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), ["text line"]);
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let d = dedup();
        let text = d
            .decode_with_fallback(Path::new("bom.txt"), b"\xEF\xBB\xBFhello")
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("corpus/unique.txt");
        let d = dedup();

        let first: BTreeSet<String> = ["old".to_string()].into();
        d.write(&first, &output).await.unwrap();
        let second: BTreeSet<String> = ["b".to_string(), "a".to_string()].into();
        d.write(&second, &output).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "a\nb\n");
    }
}
