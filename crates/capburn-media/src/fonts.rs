//! Font file index for the fonts directory handed to libass and drawtext.
//!
//! Built once at startup. Keys are normalized (lowercase ASCII alphanumerics
//! only), so `Cormorant Garamond`, `cormorant-garamond` and
//! `CormorantGaramond` all hit the same entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::MediaResult;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

const BOLD_MARKERS: &[&str] = &["bold", "black", "heavy", "extrabold", "semibold"];

#[derive(Debug, Default, Clone)]
struct FamilyFonts {
    regular: Option<PathBuf>,
    bold: Option<PathBuf>,
    other: Vec<PathBuf>,
}

/// Family and file-stem lookup over a fonts directory.
#[derive(Debug, Default, Clone)]
pub struct FontIndex {
    root: Option<PathBuf>,
    by_stem: HashMap<String, PathBuf>,
    by_family: HashMap<String, FamilyFonts>,
}

impl FontIndex {
    /// Index every font file under `root`, recursively.
    pub fn build(root: &Path) -> MediaResult<Self> {
        let mut index = FontIndex {
            root: Some(root.to_path_buf()),
            ..Default::default()
        };

        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if is_font_file(&path) {
                    index.insert(path);
                }
            }
        }

        debug!(
            root = %root.display(),
            files = index.by_stem.len(),
            families = index.by_family.len(),
            "Built font index"
        );
        Ok(index)
    }

    /// Like [`FontIndex::build`], but a missing or unreadable directory gives an empty index.
    pub fn build_or_empty(root: Option<&Path>) -> Self {
        match root {
            Some(dir) => Self::build(dir).unwrap_or_else(|e| {
                warn!(dir = %dir.display(), "Font directory unavailable: {}", e);
                FontIndex {
                    root: Some(dir.to_path_buf()),
                    ..Default::default()
                }
            }),
            None => Self::default(),
        }
    }

    fn insert(&mut self, path: PathBuf) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let stem_key = normalize(stem);
        let family_part = stem.split('-').next().unwrap_or(stem);
        let style_part = stem[family_part.len()..].trim_start_matches('-');
        let family_key = normalize(family_part);

        let entry = self.by_family.entry(family_key).or_default();
        let style = normalize(style_part);
        if style.is_empty() || style == "regular" {
            entry.regular.get_or_insert_with(|| path.clone());
        } else if BOLD_MARKERS.contains(&style.as_str()) {
            if entry.bold.is_none() || style == "bold" {
                entry.bold = Some(path.clone());
            }
        } else {
            entry.other.push(path.clone());
        }

        self.by_stem.entry(stem_key).or_insert(path);
    }

    /// Directory this index was built from.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stem.is_empty()
    }

    /// Best file for a family name or file stem. Bold requests prefer a bold face.
    pub fn resolve(&self, name: &str, bold: bool) -> Option<&Path> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }

        if let Some(fonts) = self.by_family.get(&key) {
            let preferred = if bold {
                fonts.bold.as_ref().or(fonts.regular.as_ref())
            } else {
                fonts.regular.as_ref().or(fonts.bold.as_ref())
            };
            if let Some(path) = preferred.or_else(|| fonts.other.first()) {
                return Some(path.as_path());
            }
        }

        self.by_stem.get(&key).map(PathBuf::as_path)
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)))
        .unwrap_or(false)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"font").unwrap();
        path
    }

    #[test]
    fn test_family_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let regular = touch(dir.path(), "Lexend-Regular.ttf");
        let bold = touch(dir.path(), "Lexend-Bold.ttf");
        let cormorant = touch(dir.path(), "nested/CormorantGaramond-Medium.otf");
        touch(dir.path(), "README.txt");

        let index = FontIndex::build(dir.path()).unwrap();
        assert_eq!(index.resolve("Lexend", false), Some(regular.as_path()));
        assert_eq!(index.resolve("lexend", true), Some(bold.as_path()));
        assert_eq!(index.resolve("Cormorant Garamond", false), Some(cormorant.as_path()));
        assert_eq!(index.resolve("Lexend-Bold", false), Some(bold.as_path()));
        assert!(index.resolve("Inter", false).is_none());
        assert!(index.resolve("", false).is_none());
        assert_eq!(index.root(), Some(dir.path()));
    }

    #[test]
    fn test_bold_request_falls_back_to_regular() {
        let dir = tempfile::tempdir().unwrap();
        let regular = touch(dir.path(), "Inter.ttf");
        let index = FontIndex::build(dir.path()).unwrap();
        assert_eq!(index.resolve("Inter", true), Some(regular.as_path()));
    }

    #[test]
    fn test_missing_directory() {
        assert!(FontIndex::build(Path::new("/nonexistent/capburn/fonts")).is_err());
        let index = FontIndex::build_or_empty(Some(Path::new("/nonexistent/capburn/fonts")));
        assert!(index.is_empty());
        assert!(FontIndex::build_or_empty(None).root().is_none());
    }
}
