//! Output file naming: `{stem}_{group}.{ext}` next to the source file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::NamingCollisionError;

/// Make a group name safe to embed in a file name
///
/// Path separators, `: * ? " < > |` and control characters become `_`;
/// surrounding whitespace and trailing dots are removed.
pub fn sanitize_group_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced.trim().trim_end_matches('.').trim_end().to_string()
}

/// Plans unique output paths for the groups of one source file
#[derive(Debug)]
pub struct OutputNamer {
    source: PathBuf,
    dir: PathBuf,
    stem: String,
    extension: String,
    /// Lowercased group parts handed out so far
    used: HashSet<String>,
}

impl OutputNamer {
    /// Namer for outputs of `source`, using `extension` (without the dot)
    pub fn for_source(source: &Path, extension: &str) -> Self {
        let dir = match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source: source.to_path_buf(),
            dir,
            stem,
            extension: extension.to_string(),
            used: HashSet::new(),
        }
    }

    /// Path for the next group of the file
    ///
    /// Names that collide, ASCII case-insensitively, with an earlier group
    /// get a numeric suffix (`name_2`, `name_3`, ...). Groups whose name
    /// sanitizes to nothing are numbered `1`, `2`, ...
    pub fn next_path(&mut self, group: &str) -> Result<PathBuf, NamingCollisionError> {
        let base = sanitize_group_name(group);
        let part = if base.is_empty() {
            (1..)
                .map(|n| n.to_string())
                .find(|candidate| !self.used.contains(candidate))
        } else {
            std::iter::once(base.clone())
                .chain((2..).map(|n| format!("{base}_{n}")))
                .find(|candidate| !self.used.contains(&candidate.to_ascii_lowercase()))
        }
        .unwrap_or_default();
        self.used.insert(part.to_ascii_lowercase());

        let file_name = if self.extension.is_empty() {
            format!("{}_{}", self.stem, part)
        } else {
            format!("{}_{}.{}", self.stem, part, self.extension)
        };
        let path = self.dir.join(file_name);

        if self.could_be_source(&path) {
            return Err(NamingCollisionError::SourceFile(path));
        }
        Ok(path)
    }

    /// An output sharing the source's extension could replace another source
    fn could_be_source(&self, path: &Path) -> bool {
        match (path.extension(), self.source.extension()) {
            (Some(out), Some(src)) => out.to_string_lossy().eq_ignore_ascii_case(&src.to_string_lossy()),
            _ => path == self.source,
        }
    }
}
