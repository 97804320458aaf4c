use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::formats::Book;
use crate::normalize::Field;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the export comes from.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    fn describe(&self) -> String;
    async fn fetch_text(&self) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for LocalFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_text(&self) -> anyhow::Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read dataset: {}", self.path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: Url,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: Url) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("build dataset http client")?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_text(&self) -> anyhow::Result<String> {
        let resp = self
            .client
            .get(self.url.clone())
            .header(USER_AGENT, "bookstats/0.1")
            .header(ACCEPT, "text/csv,text/plain;q=0.9,*/*;q=0.8")
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("GET {} returned {status}", self.url);
        }
        resp.text()
            .await
            .with_context(|| format!("read body: {}", self.url))
    }
}

/// `http(s)://` locations are fetched; `file://` URLs and anything else are read from disk.
pub fn source_for(location: &str) -> anyhow::Result<Box<dyn DatasetSource>> {
    if let Ok(url) = Url::parse(location) {
        match url.scheme() {
            "http" | "https" => return Ok(Box::new(HttpSource::new(url)?)),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| anyhow::anyhow!("file url has no local path: {url}"))?;
                return Ok(Box::new(LocalFileSource::new(path)));
            }
            _ => {}
        }
    }
    Ok(Box::new(LocalFileSource::new(location)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep only rows whose `Exclusive Shelf` equals this.
    pub shelf: Option<String>,
    /// Drop rows without a `Date Read`.
    pub require_date_read: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            shelf: Some("read".to_owned()),
            require_date_read: false,
        }
    }
}

/// An immutable snapshot of the loaded export. Replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct Library {
    pub books: Vec<Book>,
    pub columns: Vec<String>,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl Library {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Whether the dataset carries any column `field` is read from.
    pub fn has_field(&self, field: Field) -> bool {
        field.columns().iter().any(|column| self.has_column(column))
    }
}

pub async fn load_library(location: &str, options: &LoadOptions) -> anyhow::Result<Library> {
    let source = source_for(location)?;
    load_from(source.as_ref(), options).await
}

pub async fn load_from(
    source: &dyn DatasetSource,
    options: &LoadOptions,
) -> anyhow::Result<Library> {
    let name = source.describe();
    let text = source
        .fetch_text()
        .await
        .with_context(|| format!("failed to load book data from {name}"))?;
    let library = parse_library(&text, &name, options)?;
    tracing::info!(
        source = %library.source,
        books = library.books.len(),
        "loaded books"
    );
    Ok(library)
}

pub fn parse_library(text: &str, source: &str, options: &LoadOptions) -> anyhow::Result<Library> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("parse csv header from {source}"))?
        .iter()
        .map(|header| header.trim().to_owned())
        .collect();

    let mut rows = 0usize;
    let mut books = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("parse csv row {} from {source}", idx + 1))?;
        rows += 1;

        let row: HashMap<String, String> = columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_owned))
            .collect();
        let Some(book) = Book::from_row(&row) else {
            continue;
        };
        if let Some(shelf) = options.shelf.as_deref()
            && book.exclusive_shelf.as_deref() != Some(shelf)
        {
            continue;
        }
        if options.require_date_read && book.date_read.is_none() {
            continue;
        }
        books.push(book);
    }

    if books.is_empty() {
        anyhow::bail!("no book data found in {source}");
    }
    tracing::debug!(rows, kept = books.len(), "parsed dataset");

    Ok(Library {
        books,
        columns,
        source: source.to_owned(),
        loaded_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\u{feff}Title,Author,Exclusive Shelf,Date Read,My Rating,Genre\n\
Dune,Frank Herbert,read,2023/01/02,5,Sci-Fi\n\
Emma,Jane Austen,to-read,,0,Romance\n\
,Nobody,read,2023/01/02,3,Sci-Fi\n\
\n\
Kindred,Octavia Butler,read,,4\n";

    #[test]
    fn keeps_titled_rows_on_the_read_shelf() -> anyhow::Result<()> {
        let library = parse_library(EXPORT, "export.csv", &LoadOptions::default())?;
        let titles: Vec<&str> = library.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Kindred"]);
        assert_eq!(library.books[1].genre, None);
        assert!(library.has_column("Title"));
        assert!(library.has_field(Field::Genre));
        assert!(!library.has_field(Field::Publisher));
        Ok(())
    }

    #[test]
    fn shelf_filter_can_be_disabled() -> anyhow::Result<()> {
        let options = LoadOptions {
            shelf: None,
            require_date_read: false,
        };
        let library = parse_library(EXPORT, "export.csv", &options)?;
        assert_eq!(library.books.len(), 3);
        Ok(())
    }

    #[test]
    fn bookshelf_mode_requires_a_read_date() -> anyhow::Result<()> {
        let options = LoadOptions {
            require_date_read: true,
            ..LoadOptions::default()
        };
        let library = parse_library(EXPORT, "export.csv", &options)?;
        assert_eq!(library.books.len(), 1);
        Ok(())
    }

    #[test]
    fn zero_rows_is_a_load_failure() {
        let err = parse_library("Title,Exclusive Shelf\n", "empty.csv", &LoadOptions::default())
            .expect_err("empty dataset");
        assert_eq!(err.to_string(), "no book data found in empty.csv");
    }

    #[test]
    fn picks_http_for_urls_and_files_otherwise() -> anyhow::Result<()> {
        assert_eq!(
            source_for("https://example.com/books.csv")?.describe(),
            "https://example.com/books.csv"
        );
        assert_eq!(source_for("data/books.csv")?.describe(), "data/books.csv");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_reports_the_source() {
        let err = load_library("/definitely/not/here.csv", &LoadOptions::default())
            .await
            .expect_err("missing file");
        assert!(format!("{err:#}").contains("failed to load book data from /definitely/not/here.csv"));
    }
}
