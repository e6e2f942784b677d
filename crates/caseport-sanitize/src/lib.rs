//! Sanitization utilities for caseport.
//!
//! Attachment names come straight from the source system and end up as file
//! names on whatever machine runs the import, so they are cleaned to the
//! strictest common rules.

use std::collections::HashSet;

/// Characters that are illegal in a file name on at least one major platform.
pub const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const FALLBACK_NAME: &str = "attachment";

/// Replace every illegal or control character with `_`.
///
/// Empty names and names made only of dots become `attachment`.
pub fn sanitize_filename(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// Split `name.ext` into (`name`, `.ext`). Dotfiles keep their leading dot in the stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(i) => name.split_at(i),
    }
}

/// Tracks the names already stored for one owner and hands out unique ones.
#[derive(Debug, Default, Clone)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with names that already exist, e.g. files found on disk.
    pub fn with_taken(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            taken: names.into_iter().collect(),
        }
    }

    /// Sanitize `suggested` and reserve a name nobody else holds.
    ///
    /// `shot.png`, then `shot_1.png`, `shot_2.png`, ...
    pub fn reserve(&mut self, suggested: &str) -> String {
        let base = sanitize_filename(suggested);
        if self.taken.insert(base.clone()) {
            return base;
        }
        let (stem, ext) = split_extension(&base);
        let mut n = 1usize;
        loop {
            let candidate = format!("{stem}_{n}{ext}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
