use clap::{Args, Parser, Subcommand};

use crate::dataset::LoadOptions;
use crate::normalize::Field;
use crate::order::OrderMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render every dashboard chart to JSON files.
    Charts(ChartsArgs),
    /// Print one ad-hoc series.
    Series(SeriesArgs),
    /// Print the books behind one chart label (legend click).
    Select(SelectArgs),
    /// Print the bookshelf grouped by read year.
    Shelf(ShelfArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Reading export (CSV): a file path or an http/https URL.
    #[arg(long)]
    pub data: String,

    /// Keep only rows on this `Exclusive Shelf`.
    #[arg(long, default_value = "read")]
    pub shelf: String,

    /// Keep rows from every shelf.
    #[arg(long, conflicts_with = "shelf")]
    pub all_shelves: bool,

    /// Drop rows without a `Date Read`.
    #[arg(long)]
    pub require_date_read: bool,
}

impl DataArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            shelf: (!self.all_shelves).then(|| self.shelf.clone()),
            require_date_read: self.require_date_read,
        }
    }
}

#[derive(Debug, Args)]
pub struct ChartsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Dashboard YAML (default: genre, year published, publisher and rating charts).
    #[arg(long)]
    pub dashboard: Option<String>,

    /// Output directory for `<chart id>.json` and `index.json`.
    #[arg(long)]
    pub out: String,

    /// Overwrite existing chart files.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, value_enum)]
    pub field: Field,

    /// Buckets with fewer books than this fold into `Other`.
    #[arg(long, default_value_t = 3)]
    pub threshold: usize,

    #[arg(long, value_enum, default_value = "proportion")]
    pub order: OrderMode,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long)]
    pub dashboard: Option<String>,

    /// Chart id, as in the dashboard.
    #[arg(long)]
    pub chart: String,

    /// Legend label, e.g. `Sci-Fi`, `2019`, `Unknown` or `Other`.
    #[arg(long)]
    pub label: String,
}

#[derive(Debug, Args)]
pub struct ShelfArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Only books rated at least this (0-5).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub min_rating: Option<u8>,

    /// Cover shown for books without an ISBN.
    #[arg(long)]
    pub default_cover_url: Option<String>,
}
