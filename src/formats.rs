use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::{parse_positive_int, parse_rating};

pub const DEFAULT_COVER_URL: &str = "https://kellybearclawz.github.io//mybooks/default-cover.jpg";
const OPEN_LIBRARY_COVERS: &str = "https://covers.openlibrary.org/b/isbn";
const MAX_STARS: u8 = 5;

/// One row of the reading export, validated once at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: Option<String>,
    pub exclusive_shelf: Option<String>,
    pub date_read: Option<String>,
    /// `0..=5`; 0 means unrated.
    pub rating: u8,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub year_published: Option<i64>,
    pub isbn: Option<String>,
    pub goodreads_url: Option<String>,
    pub author_gender: Option<String>,
    pub author_nationality: Option<String>,
    pub author_age: Option<i64>,
}

impl Book {
    /// Builds a book from a header-keyed row. Returns `None` when the row has no title.
    pub fn from_row(row: &HashMap<String, String>) -> Option<Self> {
        let get = |column: &str| {
            row.get(column)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };

        let title = get("Title")?;
        let year_published = get("Year Published")
            .or_else(|| get("Original Publication Year"))
            .as_deref()
            .and_then(parse_positive_int);

        Some(Self {
            title,
            author: get("Author"),
            exclusive_shelf: get("Exclusive Shelf"),
            date_read: get("Date Read"),
            rating: parse_rating(get("My Rating").as_deref()),
            genre: get("Genre"),
            publisher: get("Publisher"),
            year_published,
            isbn: get("ISBN"),
            goodreads_url: get("Goodreads URL"),
            author_gender: get("Author Gender"),
            author_nationality: get("Author Nationality"),
            author_age: get("Author Age When Written")
                .as_deref()
                .and_then(parse_positive_int),
        })
    }
}

/// What a card widget needs to draw one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    pub title: String,
    pub author: String,
    pub rating: u8,
    pub stars: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_read: Option<String>,
    pub cover_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goodreads_url: Option<String>,
}

impl BookCard {
    pub fn new(book: &Book, default_cover_url: &str) -> Self {
        let cover_url = match book.isbn.as_deref().map(clean_isbn) {
            Some(isbn) if !isbn.is_empty() => format!("{OPEN_LIBRARY_COVERS}/{isbn}-M.jpg"),
            _ => default_cover_url.to_owned(),
        };

        Self {
            title: book.title.clone(),
            author: book
                .author
                .clone()
                .unwrap_or_else(|| "Unknown Author".to_owned()),
            rating: book.rating,
            stars: stars(book.rating),
            date_read: book.date_read.clone(),
            cover_url,
            goodreads_url: book.goodreads_url.clone(),
        }
    }
}

/// Keeps digits and the ISBN-10 check character.
pub fn clean_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'X' | 'x'))
        .collect()
}

pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_STARS) as usize;
    let mut out = "★".repeat(filled);
    out.push_str(&"☆".repeat(MAX_STARS as usize - filled));
    out
}
