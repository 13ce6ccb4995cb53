use crate::enrichment::EnrichmentCache;
use crate::loader::{Dataset, DatasetLoader, parse_and_enrich};
use crate::record::RequestRecord;
use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

/// Bytes from the start of the file remembered to spot an in-place rewrite.
const HEAD_LEN: u64 = 64;

/// Parses only what was appended since the previous call.
///
/// The cursor always sits just past a newline: a trailing line that is still
/// being written is left for the next call. Parsing restarts from the
/// beginning when the file was replaced or rewritten: it is shorter than the
/// cursor, it is a different file (device and inode, on unix), or its first
/// bytes no longer match what was read before.
#[derive(Debug, Clone)]
pub struct TailLoader {
    path: PathBuf,
    cursor: u64,
    identity: Option<(u64, u64)>,
    head: Vec<u8>,
    records: Vec<RequestRecord>,
}

impl TailLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cursor: 0,
            identity: None,
            head: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.identity = None;
        self.head.clear();
        self.records.clear();
    }

    fn replaced(&self, file: &mut File, meta: &Metadata) -> io::Result<Option<&'static str>> {
        if meta.len() < self.cursor {
            return Ok(Some("access log shrank"));
        }
        if self.identity.is_some() && file_identity(meta) != self.identity {
            return Ok(Some("access log replaced"));
        }
        if read_head(file, self.head.len() as u64)? != self.head {
            return Ok(Some("access log rewritten"));
        }
        Ok(None)
    }

    fn read_appended(&mut self) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        let meta = file.metadata()?;
        let len = meta.len();

        if let Some(reason) = self.replaced(&mut file, &meta)? {
            tracing::info!(path = %self.path.display(), reason, "rescanning");
            self.reset();
        }
        self.identity = file_identity(&meta);

        file.seek(SeekFrom::Start(self.cursor))?;
        let mut appended = Vec::new();
        file.by_ref().take(len - self.cursor).read_to_end(&mut appended)?;

        if (self.head.len() as u64) < HEAD_LEN && !appended.is_empty() {
            self.head = read_head(&mut file, len.min(HEAD_LEN))?;
        }
        Ok(appended)
    }
}

fn read_head(file: &mut File, n: u64) -> io::Result<Vec<u8>> {
    let mut head = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.by_ref().take(n).read_to_end(&mut head)?;
    Ok(head)
}

#[cfg(unix)]
fn file_identity(meta: &Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_: &Metadata) -> Option<(u64, u64)> {
    None
}

impl DatasetLoader for TailLoader {
    fn load(&mut self, cache: &EnrichmentCache) -> Dataset {
        let appended = match self.read_appended() {
            Ok(appended) => appended,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "access log unreadable");
                self.reset();
                return Dataset::unreadable();
            }
        };

        if let Some(last_newline) = appended.iter().rposition(|b| *b == b'\n') {
            let complete = &appended[..=last_newline];
            let text = String::from_utf8_lossy(complete);
            let parsed = parse_and_enrich(text.lines(), cache);

            tracing::debug!(
                bytes = complete.len(),
                records = parsed.len(),
                "access log tail read"
            );
            self.cursor += complete.len() as u64;
            self.records.extend(parsed);
        }

        Dataset::read(self.records.clone())
    }
}
