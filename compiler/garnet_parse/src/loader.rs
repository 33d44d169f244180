//! Locating and reading source units.
//!
//! A unit is an AST dump produced by the external parser. `require` names
//! are looked up in the load path, `require_relative` names next to the
//! requiring unit; both try the name as given, then with `.sexp`, then
//! with `.rb` when a front-end command is configured to turn source into a
//! dump. Every unit is read at most once per compilation.

use std::path::{Path, PathBuf};
use std::process::Command;

use rustc_hash::{FxHashMap, FxHashSet};

use garnet_ast::SyntaxNode;
use garnet_diagnostic::{CompileResult, Diagnostic, ErrorCode};
use garnet_ir::Span;

/// A unit ready to be walked.
#[derive(Clone, Debug)]
pub struct Unit {
    /// Display name used in diagnostics.
    pub name: String,
    /// Location on disk; `None` for in-memory units.
    pub path: Option<PathBuf>,
    pub root: SyntaxNode,
}

/// Finds units and remembers which ones were already loaded.
#[derive(Default, Debug)]
pub struct SourceLoader {
    load_paths: Vec<PathBuf>,
    frontend: Option<String>,
    in_memory: FxHashMap<String, String>,
    loaded: FxHashSet<String>,
    sources: FxHashMap<String, String>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.load_paths.extend(paths);
        self
    }

    /// Command that prints the AST dump of the `.rb` file given as its last
    /// argument.
    pub fn with_frontend(mut self, command: impl Into<String>) -> Self {
        self.frontend = Some(command.into());
        self
    }

    /// Register a unit that lives in memory under `name`.
    pub fn add_unit(&mut self, name: impl Into<String>, dump: impl Into<String>) {
        self.in_memory.insert(name.into(), dump.into());
    }

    /// Text of a unit read so far, for rendering diagnostics.
    pub fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Read the unit at `path` as the main unit of a compilation.
    pub fn open(&mut self, path: &Path) -> CompileResult<Unit> {
        let key = path.display().to_string();
        if let Some(text) = self.in_memory.get(&key).cloned() {
            self.loaded.insert(key.clone());
            return self.parse(key, None, text);
        }
        self.loaded.insert(key.clone());
        let text = self.read(path, Span::DUMMY)?;
        self.parse(key, Some(path.to_path_buf()), text)
    }

    /// Read the in-memory unit `name` as the main unit.
    pub fn open_in_memory(&mut self, name: &str, dump: &str) -> CompileResult<Unit> {
        self.loaded.insert(name.to_string());
        self.parse(name.to_string(), None, dump.to_string())
    }

    /// Resolve and read a required unit. `Ok(None)` when it was loaded
    /// before.
    pub fn require(
        &mut self,
        name: &str,
        from: Option<&Path>,
        relative: bool,
        span: Span,
    ) -> CompileResult<Option<Unit>> {
        if let Some((key, text)) = self.find_in_memory(name) {
            if !self.loaded.insert(key.clone()) {
                tracing::debug!(unit = %key, "already loaded");
                return Ok(None);
            }
            return self.parse(key, None, text).map(Some);
        }

        let Some(path) = self.resolve(name, from, relative) else {
            let searched = if relative {
                from.and_then(Path::parent)
                    .map_or_else(|| ".".to_string(), |p| p.display().to_string())
            } else {
                self.search_dirs()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            return Err(Diagnostic::error(ErrorCode::E5005)
                .with_message(format!("cannot find unit `{name}`"))
                .with_label(span, "required here")
                .with_note(format!("searched: {searched}")));
        };
        let key = path.display().to_string();
        if !self.loaded.insert(key.clone()) {
            tracing::debug!(unit = %key, "already loaded");
            return Ok(None);
        }
        let text = self.read(&path, span)?;
        self.parse(key, Some(path), text).map(Some)
    }

    fn find_in_memory(&self, name: &str) -> Option<(String, String)> {
        [name.to_string(), format!("{name}.sexp"), format!("{name}.rb")]
            .into_iter()
            .find_map(|key| self.in_memory.get(&key).map(|text| (key, text.clone())))
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.load_paths.clone();
        dirs.push(PathBuf::from("."));
        dirs
    }

    fn resolve(&self, name: &str, from: Option<&Path>, relative: bool) -> Option<PathBuf> {
        let dirs = if relative {
            vec![from
                .and_then(Path::parent)
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)]
        } else {
            self.search_dirs()
        };
        let mut names = vec![name.to_string(), format!("{name}.sexp")];
        if self.frontend.is_some() {
            names.push(format!("{name}.rb"));
        }
        dirs.iter()
            .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
            .find(|candidate| candidate.is_file())
    }

    fn read(&self, path: &Path, span: Span) -> CompileResult<String> {
        let is_source = path.extension().is_some_and(|ext| ext == "rb");
        match (&self.frontend, is_source) {
            (Some(command), true) => run_frontend(command, path, span),
            _ => std::fs::read_to_string(path).map_err(|e| {
                Diagnostic::error(ErrorCode::E5005)
                    .with_message(format!("cannot read `{}`: {e}", path.display()))
                    .with_label(span, "required here")
            }),
        }
    }

    fn parse(&mut self, name: String, path: Option<PathBuf>, text: String) -> CompileResult<Unit> {
        tracing::debug!(unit = %name, bytes = text.len(), "loading unit");
        let root = garnet_ast::read(&text).map_err(|e| Diagnostic::from(e).in_file(name.clone()));
        self.sources.insert(name.clone(), text);
        Ok(Unit { name, path, root: root? })
    }
}

/// Run the external parser on `path` and return its dump.
fn run_frontend(command: &str, path: &Path, span: Span) -> CompileResult<String> {
    let mut words = command.split_whitespace();
    let Some(program) = words.next() else {
        return Err(Diagnostic::error(ErrorCode::E5005).with_message("empty front-end command"));
    };
    tracing::debug!(program, path = %path.display(), "running front end");
    let output = Command::new(program)
        .args(words)
        .arg(path)
        .output()
        .map_err(|e| {
            Diagnostic::error(ErrorCode::E5005)
                .with_message(format!("cannot run front end `{program}`: {e}"))
                .with_label(span, "required here")
        })?;
    if !output.status.success() {
        return Err(Diagnostic::error(ErrorCode::E5003)
            .with_message(format!("front end failed on `{}`", path.display()))
            .with_note(String::from_utf8_lossy(&output.stderr).trim().to_string()));
    }
    String::from_utf8(output.stdout).map_err(|_| {
        Diagnostic::error(ErrorCode::E5003)
            .with_message(format!("front end output for `{}` is not UTF-8", path.display()))
    })
}
