//! Chunked streaming over a directory of raw text documents.
//!
//! Training consumes a plain `Iterator<Item = String>`, so documents
//! are fed as fixed-size chunks instead of whole files; peak memory is
//! bounded by the chunk size, not the corpus. Reader state for a file
//! is dropped as soon as it is exhausted.

use crate::errors::{Error, Result};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Upper bound on the byte length of a yielded chunk. Chunks are split
/// at a UTF-8 boundary, so one may come out a few bytes shorter.
pub const CHUNK_BYTES: usize = 100_000;

#[derive(Debug)]
pub struct ChunkedCorpus {
    files: VecDeque<PathBuf>,
    current: Option<BufReader<File>>,
    carry: Vec<u8>,
    error: Option<Error>,
}

impl ChunkedCorpus {
    /// Enumerate `*.txt` files under `dir`, sorted by name for a stable
    /// feed order. An empty directory is a hard error: there is nothing
    /// to train on.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|err| {
            Error::Artifact(format!(
                "cannot read corpus directory {}: {err}",
                dir.display()
            ))
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file()
                && path
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"))
            {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(Error::EmptyCorpus {
                dir: dir.to_path_buf(),
            });
        }
        files.sort();

        Ok(Self {
            files: VecDeque::from(files),
            current: None,
            carry: Vec::new(),
            error: None,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + usize::from(self.current.is_some())
    }

    /// An I/O failure mid-stream ends iteration; callers must check for
    /// the captured error once the consumer returns.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            if self.current.is_none() {
                let next = match self.files.pop_front() {
                    Some(path) => path,
                    None => return Ok(None),
                };
                let file = File::open(&next)?;
                self.current = Some(BufReader::new(file));
            }

            // The carried suffix counts against the chunk budget so a
            // yielded chunk never exceeds CHUNK_BYTES.
            let mut buf = vec![0u8; CHUNK_BYTES - self.carry.len()];
            let read = {
                let reader = self
                    .current
                    .as_mut()
                    .expect("reader state exists while chunking");
                read_full(reader, &mut buf)?
            };
            buf.truncate(read);

            if read == 0 {
                // File exhausted; release the reader and flush whatever
                // tail bytes were carried past the last chunk boundary.
                self.current = None;
                if !self.carry.is_empty() {
                    let tail = std::mem::take(&mut self.carry);
                    return String::from_utf8(tail)
                        .map(Some)
                        .map_err(|_| truncated_utf8());
                }
                continue;
            }

            let mut bytes = std::mem::take(&mut self.carry);
            bytes.extend_from_slice(&buf);

            let boundary = match std::str::from_utf8(&bytes) {
                Ok(_) => bytes.len(),
                // A clean cut through a multi-byte character: keep the
                // incomplete suffix for the next chunk.
                Err(err) if err.error_len().is_none() => err.valid_up_to(),
                Err(_) => return Err(invalid_utf8()),
            };

            self.carry = bytes.split_off(boundary);
            if bytes.is_empty() {
                continue;
            }

            return String::from_utf8(bytes).map(Some).map_err(|_| invalid_utf8());
        }
    }
}

impl Iterator for ChunkedCorpus {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        match self.next_chunk() {
            Ok(chunk) => chunk,
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn invalid_utf8() -> Error {
    Error::Validation("corpus document is not valid UTF-8".into())
}

fn truncated_utf8() -> Error {
    Error::Validation("corpus document ends mid-way through a UTF-8 character".into())
}
