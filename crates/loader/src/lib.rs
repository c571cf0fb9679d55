//! Loads a WordPress plugin into an in-memory [`Corpus`] from a directory,
//! a single file or a `.zip` archive.
//!
//! Paths inside a corpus are relative to the scanned root and always use
//! `/` as separator, so results are identical across platforms.

use anyhow::{bail, Context};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

mod walk;
pub use walk::visit;

/// Bytes of one file, or the reason they were not read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    Loaded(Vec<u8>),
    /// Size in bytes; larger than the configured cap, never read.
    TooLarge(u64),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative, `/`-separated path.
    pub path: String,
    pub content: SourceContent,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: SourceContent::Loaded(content.into()),
        }
    }

    /// Byte length of the file, also for files that were not read.
    pub fn size(&self) -> u64 {
        match &self.content {
            SourceContent::Loaded(bytes) => bytes.len() as u64,
            SourceContent::TooLarge(size) => *size,
            SourceContent::Unreadable(_) => 0,
        }
    }
}

/// Files of one plugin, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub plugin_name: String,
    files: Vec<SourceFile>,
    /// Files found but filtered out because they are not source files.
    pub ignored: usize,
}

impl Corpus {
    pub fn new(plugin_name: impl Into<String>, mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            plugin_name: plugin_name.into(),
            files,
            ignored: 0,
        }
    }

    /// Builds a corpus from in-memory `(path, content)` pairs.
    ///
    /// # Example
    /// ```
    /// use loader::Corpus;
    /// let corpus = Corpus::from_pairs("demo", [("b.php", "<?php"), ("a.php", "<?php")]);
    /// assert_eq!(corpus.files()[0].path, "a.php");
    /// ```
    pub fn from_pairs<I, P, C>(plugin_name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let files = pairs
            .into_iter()
            .map(|(p, c)| SourceFile::new(p, c))
            .collect();
        Self::new(plugin_name, files)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// What to load and what to leave out.
pub struct LoadOptions<'a> {
    /// Overrides the name derived from the path.
    pub plugin_name: Option<String>,
    /// Files above this size are recorded but not read. `0` disables the cap.
    pub max_file_size: u64,
    /// Paths (relative, `/`-separated) to skip entirely.
    pub exclude: &'a dyn Fn(&str) -> bool,
    /// Files worth reading; the rest only count towards [`Corpus::ignored`].
    pub include: &'a dyn Fn(&Path) -> bool,
}

fn exclude_nothing(_: &str) -> bool {
    false
}

fn include_everything(_: &Path) -> bool {
    true
}

impl Default for LoadOptions<'_> {
    fn default() -> Self {
        Self {
            plugin_name: None,
            max_file_size: 0,
            exclude: &exclude_nothing,
            include: &include_everything,
        }
    }
}

/// Name of a plugin given the path it was loaded from: the directory name
/// or the file stem.
pub fn plugin_name_for(path: &Path) -> String {
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let name = if path.is_dir() {
        path.file_name()
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "plugin".to_string())
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("zip"))
}

/// Loads a directory, a `.zip` archive or a single file.
pub fn load_path(path: &Path, opts: &LoadOptions) -> anyhow::Result<Corpus> {
    let meta = fs::metadata(path).with_context(|| format!("Cannot access {}", path.display()))?;
    let mut corpus = if meta.is_dir() {
        load_dir(path, opts)?
    } else if is_zip(path) {
        load_zip(path, opts)?
    } else if meta.is_file() {
        load_single(path, opts)?
    } else {
        bail!("{} is neither a file nor a directory", path.display());
    };
    if let Some(name) = &opts.plugin_name {
        corpus.plugin_name = name.clone();
    }
    info!(
        plugin = %corpus.plugin_name,
        files = corpus.len(),
        ignored = corpus.ignored,
        "Corpus loaded"
    );
    Ok(corpus)
}

fn read_capped(path: &Path, size: u64, max: u64) -> SourceContent {
    if max > 0 && size > max {
        warn!(path = %path.display(), size, max, "File exceeds size limit");
        return SourceContent::TooLarge(size);
    }
    match fs::read(path) {
        Ok(bytes) => SourceContent::Loaded(bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "File unreadable");
            SourceContent::Unreadable(e.to_string())
        }
    }
}

fn load_single(path: &Path, opts: &LoadOptions) -> anyhow::Result<Corpus> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut files = Vec::new();
    let mut ignored = 0;
    if (opts.include)(path) {
        let size = fs::metadata(path)?.len();
        files.push(SourceFile {
            path: name,
            content: read_capped(path, size, opts.max_file_size),
        });
    } else {
        ignored += 1;
    }
    let mut corpus = Corpus::new(plugin_name_for(path), files);
    corpus.ignored = ignored;
    Ok(corpus)
}

/// Converts `path` to a `/`-separated path relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn load_dir(root: &Path, opts: &LoadOptions) -> anyhow::Result<Corpus> {
    let mut files = Vec::new();
    let mut ignored = 0;
    let excluded = |p: &Path| p != root && (opts.exclude)(&relative_path(root, p));
    visit(root, &excluded, &mut |p: &Path| {
        if !(opts.include)(p) {
            ignored += 1;
            return Ok(());
        }
        let size = fs::symlink_metadata(p).map(|m| m.len()).unwrap_or(0);
        debug!(path = %p.display(), size, "Queued source file");
        files.push(SourceFile {
            path: relative_path(root, p),
            content: read_capped(p, size, opts.max_file_size),
        });
        Ok(())
    })?;
    let mut corpus = Corpus::new(plugin_name_for(root), files);
    corpus.ignored = ignored;
    Ok(corpus)
}

/// Zip headers declare the uncompressed size, but nothing forces the data
/// to match it. Pre-allocation is bounded and reading stops one byte past
/// the cap.
const ZIP_PREALLOC_LIMIT: u64 = 1 << 20;

fn read_entry<R: Read>(entry: &mut R, declared: u64, max: u64) -> SourceContent {
    let limit = if max > 0 { max.saturating_add(1) } else { u64::MAX };
    let mut buf = Vec::with_capacity(declared.min(ZIP_PREALLOC_LIMIT) as usize);
    match entry.take(limit).read_to_end(&mut buf) {
        Ok(_) if max > 0 && buf.len() as u64 > max => {
            warn!(declared, max, "Zip entry larger than declared");
            SourceContent::TooLarge(buf.len() as u64)
        }
        Ok(_) => SourceContent::Loaded(buf),
        Err(e) => SourceContent::Unreadable(e.to_string()),
    }
}

fn load_zip(path: &Path, opts: &LoadOptions) -> anyhow::Result<Corpus> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Invalid zip archive: {}", path.display()))?;
    let mut files = Vec::new();
    let mut ignored = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        // Entries escaping the archive root (`../x`) are dropped.
        let Some(name) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "Unsafe zip entry skipped");
            continue;
        };
        let rel = name.to_string_lossy().replace('\\', "/");
        if (opts.exclude)(&rel) {
            debug!(path = %rel, "Path excluded");
            continue;
        }
        if !(opts.include)(name.as_path()) {
            ignored += 1;
            continue;
        }
        let size = entry.size();
        let content = if opts.max_file_size > 0 && size > opts.max_file_size {
            warn!(path = %rel, size, "File exceeds size limit");
            SourceContent::TooLarge(size)
        } else {
            read_entry(&mut entry, size, opts.max_file_size)
        };
        files.push(SourceFile { path: rel, content });
    }
    let mut corpus = Corpus::new(plugin_name_for(path), files);
    corpus.ignored = ignored;
    Ok(corpus)
}
