//! Folders of documents, one value per file.

use std::fs;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::vec;

use tracing::debug;

use crate::bind::Decode;
use crate::error::Result;
use crate::parser::Parser;

/// Files in `dir` with the given extension, sorted by file name.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Documents of a folder, each read and decoded when pulled.
#[derive(Debug)]
pub struct Folder<T> {
    parser: Parser<T>,
    files: vec::IntoIter<PathBuf>,
}

impl<T: Decode> Folder<T> {
    pub(crate) fn new(parser: Parser<T>, files: Vec<PathBuf>) -> Self {
        Self {
            parser,
            files: files.into_iter(),
        }
    }

    /// Files not yet decoded.
    pub fn remaining(&self) -> &[PathBuf] {
        self.files.as_slice()
    }
}

impl<T: Decode> Iterator for Folder<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        let path = self.files.next()?;
        debug!(path = %path.display(), "decoding file");
        Some(self.parser.parse_file(&path))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

impl<T: Decode> ExactSizeIterator for Folder<T> {}

impl<T: Decode> FusedIterator for Folder<T> {}
