//! crates/publishing_core/src/slug.rs
//!
//! Derives URL-safe, unique identifiers for named entities. Normalization is
//! pure and deterministic; uniqueness is settled against the store before the
//! owning entity is persisted, never as a background step.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::ports::{ContentStore, EngineResult};

/// Lowercases, folds common Latin diacritics to ASCII, strips punctuation and
/// collapses whitespace runs to a single `-`. Idempotent: slugifying a slug
/// returns it unchanged.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    let mut push = |ch: char, out: &mut String, pending_sep: &mut bool| {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            if *pending_sep && !out.is_empty() {
                out.push('-');
            }
            *pending_sep = false;
            out.push(lower);
        } else if lower.is_ascii_whitespace() || lower == '-' || lower == '_' {
            *pending_sep = true;
        }
        // Any other punctuation is stripped without acting as a separator.
    };
    for ch in name.chars() {
        if ch.is_ascii() {
            push(ch, &mut out, &mut pending_sep);
        } else {
            for &folded in fold_char(ch) {
                push(folded, &mut out, &mut pending_sep);
            }
        }
    }
    out
}

/// Folds one non-ASCII character to its ASCII spelling. Unmapped characters
/// are dropped.
fn fold_char(ch: char) -> &'static [char] {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => &['a'],
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => &['e'],
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => &['i'],
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => &['o'],
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => &['u'],
        'ý' | 'ÿ' | 'Ý' => &['y'],
        'ñ' | 'Ñ' => &['n'],
        'ç' | 'Ç' => &['c'],
        'ß' => &['s', 's'],
        'æ' | 'Æ' => &['a', 'e'],
        'œ' | 'Œ' => &['o', 'e'],
        _ => &[],
    }
}

/// A short, time-based suffix used when normalization yields nothing or a
/// freshly derived slug collides with a different entity.
fn disambiguator() -> String {
    format!("{}", Utc::now().timestamp_millis() % 1_000_000)
}

/// Derives slugs for content and categories against the injected store.
#[derive(Clone)]
pub struct SlugRegistry {
    store: Arc<dyn ContentStore>,
}

impl SlugRegistry {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Derives a unique slug for a content title. `exclude` carries the id of
    /// the entity being renamed so its own current slug never counts as a
    /// collision (renaming to an unchanged title is a no-op).
    pub async fn derive_content_slug(
        &self,
        title: &str,
        exclude: Option<Uuid>,
    ) -> EngineResult<String> {
        let mut candidate = base_or_disambiguated(title);
        while self.store.content_slug_exists(&candidate, exclude).await? {
            candidate = format!("{}-{}", base_or_disambiguated(title), disambiguator());
        }
        Ok(candidate)
    }

    /// Same derivation, checked against the category collection.
    pub async fn derive_category_slug(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> EngineResult<String> {
        let mut candidate = base_or_disambiguated(name);
        while self.store.category_slug_exists(&candidate, exclude).await? {
            candidate = format!("{}-{}", base_or_disambiguated(name), disambiguator());
        }
        Ok(candidate)
    }
}

fn base_or_disambiguated(name: &str) -> String {
    let base = slugify(name);
    if base.is_empty() {
        disambiguator()
    } else {
        base
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn collapses_whitespace_and_strips_punctuation() {
        assert_eq!(slugify("  Rust:   a (quick)   tour!  "), "rust-a-quick-tour");
    }

    #[test]
    fn folds_latin_diacritics() {
        assert_eq!(slugify("Café Société"), "cafe-societe");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn is_idempotent() {
        let once = slugify("Hello, World & Friends");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn punctuation_only_input_yields_empty() {
        assert_eq!(slugify("!!! ??? ..."), "");
    }

    #[test]
    fn underscores_act_as_separators() {
        assert_eq!(slugify("snake_case_title"), "snake-case-title");
    }
}
