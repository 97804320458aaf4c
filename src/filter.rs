use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::bucket::is_other;
use crate::formats::{Book, BookCard};
use crate::normalize::{Bucket, Field, normalize};
use crate::series::Series;

/// A legend click: which chart, which label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvent {
    pub chart: String,
    pub label: String,
}

/// Books that land in `selected` for `field`, in their original order.
///
/// Selecting [`Bucket::Other`] recounts `books` and collects every book whose
/// bucket `threshold` merged, plus books that normalize to `Other` outright.
/// That matches what the chart showed as long as the same books and threshold
/// are used.
pub fn filter<'a>(
    books: &'a [Book],
    field: Field,
    selected: &Bucket,
    threshold: usize,
) -> Vec<&'a Book> {
    if *selected == Bucket::Other {
        let counts = aggregate(books, field);
        return books
            .iter()
            .filter(|book| {
                let bucket = normalize(book, field);
                bucket == Bucket::Other || is_other(&bucket, &counts, threshold)
            })
            .collect();
    }

    books
        .iter()
        .filter(|book| normalize(book, field) == *selected)
        .collect()
}

/// Rating dropdown: keeps books rated at least `min_rating`.
pub fn filter_min_rating(books: &[Book], min_rating: u8) -> Vec<Book> {
    books
        .iter()
        .filter(|book| book.rating >= min_rating)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionView {
    pub caption: String,
    pub field: Field,
    pub label: String,
    pub count: usize,
    pub books: Vec<BookCard>,
    /// Set when nothing matched; the page shows this instead of cards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

/// Resolves a label clicked on `series` into the matching books.
pub fn select(
    books: &[Book],
    series: &Series,
    label: &str,
    default_cover_url: &str,
) -> SelectionView {
    let field = series.spec.field;
    let bucket = series
        .points
        .iter()
        .find(|point| point.label == label)
        .map(|point| point.bucket.clone())
        .unwrap_or_else(|| Bucket::from_label(field, label));

    let matched = filter(books, field, &bucket, series.spec.threshold);
    tracing::debug!(%field, label, matched = matched.len(), "selection");

    let count = matched.len();
    let noun = if count == 1 { "book" } else { "books" };
    SelectionView {
        caption: format!("{field}: {label} ({count} {noun})"),
        field,
        label: label.to_owned(),
        count,
        books: matched
            .into_iter()
            .map(|book| BookCard::new(book, default_cover_url))
            .collect(),
        empty_message: (count == 0).then(|| format!("No books found for: {label}")),
    }
}
