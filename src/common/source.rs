use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A loaded script, kept around for the lifetime of the compile so that
/// every `Span` can point back into it instead of carrying its own copy
/// of the text.
#[derive(Debug, Eq, PartialEq)]
pub struct Source {
    pub path: Option<PathBuf>,
    pub contents: String,
}

impl Source {
    /// Wraps an in-memory string as a source, used by tests and the REPL-less
    /// one-shot driver when no file is involved.
    pub fn source(contents: &str) -> Rc<Source> {
        Rc::new(Source { path: None, contents: contents.to_string() })
    }

    /// Reads a script from disk.
    pub fn path(path: &Path) -> std::io::Result<Rc<Source>> {
        let contents = fs::read_to_string(path)?;
        Ok(Rc::new(Source { path: Some(path.to_path_buf()), contents }))
    }

    pub fn name(&self) -> &str {
        match &self.path {
            Some(p) => p.to_str().unwrap_or("<script>"),
            None => "<script>",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
