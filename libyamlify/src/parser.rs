//! Phase 4: Parser Façade
//!
//! `Parser<T>` wires the scanner, reader, and binder together behind the
//! access modes callers use: one object, an eager list, a lazy sequence, and
//! a folder of documents read eagerly or on demand.

use std::fmt;
use std::fs;
use std::io::{BufRead, Read};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::bind::{bind_with, Decode};
use crate::cache::DescriptorCache;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, ParseContext, Result};
use crate::folder::{list_files, Folder};
use crate::reader::{read_block, read_sequence};
use crate::scanner::scan;
use crate::sequence::Sequence;

/// Extension of the documents a folder parse picks up.
pub const DEFAULT_EXTENSION: &str = "yaml";

/// Decoder of documents into `T`.
pub struct Parser<T> {
    cache: DescriptorCache,
    descriptor: Arc<TypeDescriptor>,
    extension: String,
    filename: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

/// Parser for `T` backed by the global descriptor cache.
pub fn parser<T: Decode>() -> Parser<T> {
    Parser::new()
}

impl<T: Decode> Parser<T> {
    pub fn new() -> Self {
        Self::with_cache(DescriptorCache::global())
    }

    /// Parser describing `T` and every nested type through `cache`.
    pub fn with_cache(cache: &DescriptorCache) -> Self {
        Self {
            cache: cache.clone(),
            descriptor: cache.get::<T>(),
            extension: DEFAULT_EXTENSION.to_string(),
            filename: None,
            _marker: PhantomData,
        }
    }

    /// Recognise `extension` (without the dot) in folder parses.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Label structural errors with `filename`.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    fn context<'a>(&self, filename: Option<&'a str>) -> ParseContext<'a> {
        ParseContext::new(filename).with_type_name(self.descriptor.type_name())
    }

    fn object_in(&self, source: &str, filename: Option<&str>) -> Result<T> {
        let ctx = self.context(filename);
        let lines = scan(source, &ctx)?;
        if lines.is_empty() {
            return Err(Error::EmptyInput(format!(
                "no document for {}",
                self.descriptor.type_name()
            )));
        }
        let node = read_block(&lines, &ctx)?;
        bind_with(&self.cache, &self.descriptor, &node)
    }

    /// Decode a single document.
    pub fn parse_object_str(&self, source: &str) -> Result<T> {
        self.object_in(source, self.filename.as_deref())
    }

    /// Decode a single document read in full from `reader`.
    pub fn parse_object<R: Read>(&self, mut reader: R) -> Result<T> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        self.parse_object_str(&source)
    }

    /// Decode every item of a top-level sequence.
    pub fn parse_list_str(&self, source: &str) -> Result<Vec<T>> {
        let ctx = ParseContext::new(self.filename.as_deref())
            .with_item_type_name(self.descriptor.type_name());
        let lines = scan(source, &ctx)?;
        read_sequence(&lines, &ctx)?
            .iter()
            .map(|node| bind_with(&self.cache, &self.descriptor, node))
            .collect()
    }

    pub fn parse_list<R: Read>(&self, mut reader: R) -> Result<Vec<T>> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        self.parse_list_str(&source)
    }

    /// Decode the items of a top-level sequence one at a time, as they are
    /// pulled.
    pub fn parse_sequence<R: BufRead>(&self, reader: R) -> Sequence<R, T> {
        Sequence::new(
            reader,
            self.cache.clone(),
            Arc::clone(&self.descriptor),
            self.filename.clone(),
        )
    }

    /// Decode the document at `path`. Errors are labelled with its file name.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let name = path.file_name().map(|name| name.to_string_lossy());
        self.object_in(&source, name.as_deref())
    }

    /// Decode every document in `dir`, in file-name order.
    pub fn parse_folder_eager(&self, dir: impl AsRef<Path>) -> Result<Vec<T>> {
        let files = list_files(dir.as_ref(), &self.extension)?;
        debug!(
            dir = %dir.as_ref().display(),
            files = files.len(),
            "parsing folder"
        );
        files.iter().map(|path| self.parse_file(path)).collect()
    }

    /// List the documents in `dir` now; read and decode each one only when
    /// it is pulled.
    pub fn parse_folder_lazy(&self, dir: impl AsRef<Path>) -> Result<Folder<T>> {
        let files = list_files(dir.as_ref(), &self.extension)?;
        Ok(Folder::new(self.clone(), files))
    }
}

impl<T: Decode> Default for Parser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            descriptor: Arc::clone(&self.descriptor),
            extension: self.extension.clone(),
            filename: self.filename.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("type_name", &self.descriptor.type_name())
            .field("extension", &self.extension)
            .field("filename", &self.filename)
            .finish()
    }
}
