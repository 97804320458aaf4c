use std::fmt;

use chrono::{DateTime, Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::formats::Book;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const OTHER_LABEL: &str = "Other";

pub const MAX_RATING: u8 = 5;

/// A field a chart can group books by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Calendar year taken from `Date Read`.
    ReadYear,
    Genre,
    Publisher,
    Author,
    AuthorGender,
    AuthorNationality,
    YearPublished,
    AuthorAge,
    Rating,
}

impl Field {
    /// Dataset column(s) the field is read from; any one of them being present is enough.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Field::ReadYear => &["Date Read"],
            Field::Genre => &["Genre"],
            Field::Publisher => &["Publisher"],
            Field::Author => &["Author"],
            Field::AuthorGender => &["Author Gender"],
            Field::AuthorNationality => &["Author Nationality"],
            Field::YearPublished => &["Year Published", "Original Publication Year"],
            Field::AuthorAge => &["Author Age When Written"],
            Field::Rating => &["My Rating"],
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::ReadYear | Field::YearPublished | Field::AuthorAge | Field::Rating
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::ReadYear => "Year Read",
            Field::YearPublished => "Year Published",
            other => other.columns()[0],
        };
        f.write_str(name)
    }
}

/// A normalized grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Bucket {
    Number(i64),
    Text(String),
    Unknown,
    Other,
}

impl Bucket {
    pub fn label(&self) -> String {
        match self {
            Bucket::Number(n) => n.to_string(),
            Bucket::Text(text) => text.clone(),
            Bucket::Unknown => UNKNOWN_LABEL.to_owned(),
            Bucket::Other => OTHER_LABEL.to_owned(),
        }
    }

    /// Reads a chart label back into a bucket of `field`.
    ///
    /// The sentinel labels always resolve to the sentinels; [`normalize`]
    /// folds free text spelled the same way into them, so no other bucket
    /// can carry those labels.
    pub fn from_label(field: Field, label: &str) -> Bucket {
        let label = label.trim();
        match label {
            UNKNOWN_LABEL => Bucket::Unknown,
            OTHER_LABEL => Bucket::Other,
            _ if field.is_numeric() => match label.parse::<i64>() {
                Ok(n) => Bucket::Number(n),
                Err(_) => Bucket::Text(label.to_owned()),
            },
            _ => Bucket::Text(label.to_owned()),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Maps one book onto its bucket for `field`. Never fails: anything
/// unparseable lands in [`Bucket::Unknown`].
pub fn normalize(book: &Book, field: Field) -> Bucket {
    match field {
        Field::ReadYear => book
            .date_read
            .as_deref()
            .and_then(year_from_date)
            .map_or(Bucket::Unknown, |year| Bucket::Number(i64::from(year))),
        Field::Genre => text_bucket(book.genre.as_deref()),
        Field::Publisher => text_bucket(book.publisher.as_deref()),
        Field::Author => text_bucket(book.author.as_deref()),
        Field::AuthorGender => text_bucket(book.author_gender.as_deref()),
        Field::AuthorNationality => text_bucket(book.author_nationality.as_deref()),
        Field::YearPublished => book
            .year_published
            .filter(|year| *year > 0)
            .map_or(Bucket::Unknown, Bucket::Number),
        Field::AuthorAge => book
            .author_age
            .filter(|age| *age > 0)
            .map_or(Bucket::Unknown, Bucket::Number),
        Field::Rating => Bucket::Number(i64::from(book.rating)),
    }
}

fn text_bucket(value: Option<&str>) -> Bucket {
    match value.map(str::trim) {
        None | Some("") | Some(UNKNOWN_LABEL) => Bucket::Unknown,
        Some(OTHER_LABEL) => Bucket::Other,
        Some(text) => Bucket::Text(text.to_owned()),
    }
}

/// Takes the leading signed integer of `raw` (after trimming), so `"4.0"`
/// reads as 4 and `"12 pages"` as 12.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

pub fn parse_positive_int(raw: &str) -> Option<i64> {
    parse_leading_int(raw).filter(|n| *n > 0)
}

/// Rating policy: missing or unparseable ratings read as 0 (unrated), and
/// everything else is clamped into `0..=5`.
pub fn parse_rating(raw: Option<&str>) -> u8 {
    let rating = raw.and_then(parse_leading_int).unwrap_or(0);
    rating.clamp(0, i64::from(MAX_RATING)) as u8
}

pub fn year_from_date(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y/%m/%d", "%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.year());
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.year());
    }
    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse().ok();
    }
    None
}
