use std::path::{Path, PathBuf};

use rand::Rng;

use crate::catalog::Catalog;

const MAX_STEM_CHARS: usize = 15;
const STEM_HEAD_CHARS: usize = 10;
const STEM_TAIL_CHARS: usize = 5;
const TRIM_TAIL_CHARS: usize = 15;
const ELLIPSIS: &str = "...";

/// One random draw from the catalog, with the numbers shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub image: PathBuf,
    /// 1-based position within the catalog at draw time.
    pub ordinal: usize,
    pub total: usize,
    pub display_name: String,
}

impl Selection {
    pub fn stats_label(&self) -> String {
        format!("{} ({}/{})", self.display_name, self.ordinal, self.total)
    }
}

pub struct Selector {
    catalog: Catalog,
}

impl Selector {
    /// Build a selector and run the initial scan.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            catalog: Catalog::new(roots),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        self.catalog.roots()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn refresh(&self) {
        self.catalog.refresh();
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Draw uniformly at random; `None` when the catalog is empty.
    pub fn pick(&self) -> Option<(usize, PathBuf)> {
        self.pick_with(&mut rand::rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, PathBuf)> {
        self.draw(rng).map(|(ordinal, image, _)| (ordinal, image))
    }

    /// Draw and package the display stats.
    pub fn next(&self) -> Option<Selection> {
        self.next_with(&mut rand::rng())
    }

    pub fn next_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Selection> {
        let (ordinal, image, total) = self.draw(rng)?;
        let display_name = display_name(&image);

        Some(Selection {
            image,
            ordinal,
            total,
            display_name,
        })
    }

    // Ordinal and total come from the same snapshot
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, PathBuf, usize)> {
        let entries = self.catalog.snapshot();
        if entries.is_empty() {
            return None;
        }

        let index = rng.random_range(0..entries.len());
        Some((index + 1, entries[index].clone(), entries.len()))
    }
}

/// Base file name of `path` with its stem shortened for display.
pub fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    truncate_name(&name)
}

/// Shorten a file name whose stem is longer than 15 characters to
/// `first 10 + "..." + last 5`, keeping the extension.
pub fn truncate_name(name: &str) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) => name.split_at(dot),
        None => (name, ""),
    };

    let stem_chars: Vec<char> = stem.chars().collect();
    if stem_chars.len() <= MAX_STEM_CHARS {
        return name.to_owned();
    }

    let head: String = stem_chars[..STEM_HEAD_CHARS].iter().collect();
    let tail: String = stem_chars[stem_chars.len() - STEM_TAIL_CHARS..].iter().collect();
    format!("{head}{ELLIPSIS}{tail}{extension}")
}

/// Shorten `text` to `max_width` characters around an ellipsis, keeping the
/// last 15 characters.
pub fn trim_label(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        return text.to_owned();
    }

    let head_len = max_width.saturating_sub(TRIM_TAIL_CHARS);
    let tail_len = TRIM_TAIL_CHARS.min(chars.len());
    let head: String = chars[..head_len].iter().collect();
    let tail: String = chars[chars.len() - tail_len..].iter().collect();
    format!("{head}{ELLIPSIS}{tail}")
}
