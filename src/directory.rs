//! Memorial directory (demo collaborator)
//!
//! Serves published memorial content by slug. The code resolver only ever
//! produces the slug string; this directory is the separate collaborator
//! that turns a slug into renderable content, or "not found."
//!
//! The demo backs it with a fixed in-memory table seeded from the two
//! sample memorials.

use std::collections::HashMap;

use crate::model::{Memorial, MemorialLinks, MemorialPhoto};

/// Slug -> memorial lookup table
#[derive(Debug, Clone, Default)]
pub struct MemorialDirectory {
    entries: HashMap<String, Memorial>,
}

impl MemorialDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the demo directory with the jane-doe and john-doe samples
    pub fn demo() -> Self {
        let mut directory = Self::new();
        directory.insert(Memorial {
            slug: "jane-doe".to_string(),
            name: "Jane A. Doe".to_string(),
            dates: "1950 - 2020".to_string(),
            bio: "Jane loved the mountains, baking sourdough, and reading to her \
                  grandkids. This demo page shows how a real memorial might look."
                .to_string(),
            cover_img: "https://placehold.co/1200x400?text=Jane+Doe+Memorial".to_string(),
            photos: vec![
                MemorialPhoto {
                    src: "https://placehold.co/600x400?text=Photo+1".to_string(),
                    alt: "Family picnic".to_string(),
                },
                MemorialPhoto {
                    src: "https://placehold.co/600x400?text=Photo+2".to_string(),
                    alt: "Hiking trail".to_string(),
                },
                MemorialPhoto {
                    src: "https://placehold.co/600x400?text=Photo+3".to_string(),
                    alt: "Baking bread".to_string(),
                },
            ],
            links: MemorialLinks {
                youtube: Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string()),
                vimeo: None,
                website: Some("https://example.com".to_string()),
            },
            unlisted: true,
        });
        directory.insert(Memorial {
            slug: "john-doe".to_string(),
            name: "John Q. Doe".to_string(),
            dates: "1948 - 2015".to_string(),
            bio: "John served his community for decades. He enjoyed jazz records \
                  and restoring old radios. This is a second sample memorial."
                .to_string(),
            cover_img: "https://placehold.co/1200x400?text=John+Doe+Memorial".to_string(),
            photos: vec![
                MemorialPhoto {
                    src: "https://placehold.co/600x400?text=Photo+1".to_string(),
                    alt: "At the workshop".to_string(),
                },
                MemorialPhoto {
                    src: "https://placehold.co/600x400?text=Photo+2".to_string(),
                    alt: "Jazz night".to_string(),
                },
            ],
            links: MemorialLinks {
                youtube: None,
                vimeo: Some("https://player.vimeo.com/video/76979871".to_string()),
                website: None,
            },
            unlisted: true,
        });
        directory
    }

    /// Adds or replaces a memorial, keyed by its slug
    pub fn insert(&mut self, memorial: Memorial) {
        self.entries.insert(memorial.slug.clone(), memorial);
    }

    /// Looks up a memorial by slug
    ///
    /// Slugs are lowercase by convention; the lookup normalizes to match.
    pub fn lookup(&self, slug: &str) -> Option<&Memorial> {
        self.entries.get(&slug.trim().to_lowercase())
    }
}
