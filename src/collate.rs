//! Locale-aware string ordering.
//!
//! Uses the root (CLDR) collation from ICU4X with its default options, the
//! same ordering `localeCompare` gives without an explicit locale: letters
//! compare without regard to case or accents first, then accents, then case
//! (lowercase first). Punctuation is not ignored and sorts before digits and
//! letters.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use icu_collator::{Collator, CollatorOptions};

pub struct Collation {
    collator: Collator,
}

impl Collation {
    pub fn root() -> Result<Self> {
        let collator = Collator::try_new(&Default::default(), CollatorOptions::new())
            .map_err(|e| anyhow!("root collation unavailable: {:?}", e))?;
        Ok(Self { collator })
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }
}
