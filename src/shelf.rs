use serde::Serialize;

use crate::aggregate::aggregate;
use crate::filter::filter_min_rating;
use crate::formats::{Book, BookCard};
use crate::normalize::{Bucket, Field, normalize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShelfSection {
    pub year: String,
    pub anchor: String,
    pub books: Vec<BookCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShelfView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<u8>,
    pub total: usize,
    pub year_links: Vec<String>,
    pub sections: Vec<ShelfSection>,
}

/// Books grouped by the year they were read, newest year first and books
/// without a usable read date last.
pub fn build_shelf(books: &[Book], min_rating: Option<u8>, default_cover_url: &str) -> ShelfView {
    let books = match min_rating {
        Some(min) => filter_min_rating(books, min),
        None => books.to_vec(),
    };

    let mut years: Vec<Bucket> = aggregate(&books, Field::ReadYear)
        .into_entries()
        .into_iter()
        .map(|entry| entry.bucket)
        .collect();
    years.sort_by(|a, b| match (a, b) {
        (Bucket::Number(x), Bucket::Number(y)) => y.cmp(x),
        (Bucket::Number(_), _) => std::cmp::Ordering::Less,
        (_, Bucket::Number(_)) => std::cmp::Ordering::Greater,
        _ => std::cmp::Ordering::Equal,
    });

    let sections: Vec<ShelfSection> = years
        .into_iter()
        .map(|year| {
            let label = year.label();
            ShelfSection {
                anchor: format!("year-{label}"),
                books: books
                    .iter()
                    .filter(|book| normalize(book, Field::ReadYear) == year)
                    .map(|book| BookCard::new(book, default_cover_url))
                    .collect(),
                year: label,
            }
        })
        .collect();

    ShelfView {
        min_rating,
        total: books.len(),
        year_links: sections.iter().map(|section| section.year.clone()).collect(),
        sections,
    }
}
