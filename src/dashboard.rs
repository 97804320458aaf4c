use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::color::Theme;
use crate::dataset::Library;
use crate::formats::DEFAULT_COVER_URL;
use crate::normalize::Field;
use crate::order::OrderMode;
use crate::series::{Series, SeriesSpec, build_series};

const INDEX_FILE_STEM: &str = "index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Doughnut,
    Pie,
    Bar,
}

impl ChartKind {
    pub fn default_order(self) -> OrderMode {
        match self {
            ChartKind::Doughnut | ChartKind::Pie => OrderMode::Proportion,
            ChartKind::Bar => OrderMode::Trend,
        }
    }
}

/// One chart on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub field: Field,
    pub kind: ChartKind,
    /// Buckets with fewer books than this fold into `Other`; 0 or 1 disables folding.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderMode>,
}

fn default_threshold() -> usize {
    3
}

impl ChartSpec {
    pub fn series_spec(&self) -> SeriesSpec {
        SeriesSpec {
            field: self.field,
            threshold: self.threshold,
            order: self.order.unwrap_or_else(|| self.kind.default_order()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_cover_url")]
    pub default_cover_url: String,
    pub charts: Vec<ChartSpec>,
}

fn default_cover_url() -> String {
    DEFAULT_COVER_URL.to_owned()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let chart = |id: &str, title: &str, field: Field, kind: ChartKind, threshold: usize| ChartSpec {
            id: id.to_owned(),
            title: title.to_owned(),
            field,
            kind,
            threshold,
            order: None,
        };
        Self {
            theme: Theme::default(),
            default_cover_url: default_cover_url(),
            charts: vec![
                chart("genreChart", "Books by Genre", Field::Genre, ChartKind::Doughnut, 3),
                chart(
                    "yearPublishedChart",
                    "Books by Year Published",
                    Field::YearPublished,
                    ChartKind::Bar,
                    5,
                ),
                chart(
                    "publisherChart",
                    "Books by Publisher",
                    Field::Publisher,
                    ChartKind::Doughnut,
                    5,
                ),
                chart("ratingChart", "Books by Rating", Field::Rating, ChartKind::Pie, 1),
            ],
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("parse dashboard yaml")?;
        for chart in &config.charts {
            validate_chart_id(&chart.id)?;
        }
        Ok(config)
    }

    /// Reads `path`, or falls back to the built-in dashboard when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read dashboard: {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("load dashboard: {}", path.display()))
    }

    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|chart| chart.id == id)
    }
}

/// Chart ids double as output file stems, so they must stay inside the
/// output directory and clear of `index.json`.
pub fn validate_chart_id(id: &str) -> anyhow::Result<()> {
    if id.trim().is_empty() {
        anyhow::bail!("chart id must not be empty");
    }
    if id == INDEX_FILE_STEM {
        anyhow::bail!("chart id is reserved: {id}");
    }
    if id.contains(['/', '\\']) || id.contains("..") {
        anyhow::bail!("chart id must not contain path separators or '..': {id}");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub dataset_label: String,
    pub series: Series,
}

pub fn render_chart(library: &Library, chart: &ChartSpec, theme: &Theme) -> ChartView {
    ChartView {
        id: chart.id.clone(),
        title: chart.title.clone(),
        kind: chart.kind,
        dataset_label: format!("{} Distribution", chart.field),
        series: build_series(&library.books, chart.series_spec(), theme),
    }
}

/// Renders every chart that has somewhere to go. A chart whose column is
/// missing from the dataset, or whose id was already used, is skipped with a
/// warning; the rest still render.
pub fn render_dashboard(library: &Library, config: &DashboardConfig) -> Vec<ChartView> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(config.charts.len());

    for chart in &config.charts {
        if !seen.insert(chart.id.as_str()) {
            tracing::warn!(chart = %chart.id, "duplicate chart id; skipping");
            continue;
        }
        if !library.has_field(chart.field) {
            tracing::warn!(
                chart = %chart.id,
                field = %chart.field,
                source = %library.source,
                "dataset has no column for chart field; skipping"
            );
            continue;
        }
        out.push(render_chart(library, chart, &config.theme));
    }

    out
}

#[derive(Debug, Clone, Serialize)]
struct ChartIndexEntry<'a> {
    id: &'a str,
    title: &'a str,
    file: String,
}

/// Writes `<id>.json` per chart plus `index.json` into `out_dir`. Ids are
/// checked before anything is written.
pub fn write_charts(out_dir: &Path, charts: &[ChartView], force: bool) -> anyhow::Result<()> {
    for chart in charts {
        validate_chart_id(&chart.id)?;
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create chart output dir: {}", out_dir.display()))?;

    let mut index = Vec::with_capacity(charts.len());
    for chart in charts {
        let file = format!("{}.json", chart.id);
        write_json(&out_dir.join(&file), chart, force)?;
        index.push(ChartIndexEntry {
            id: &chart.id,
            title: &chart.title,
            file,
        });
    }
    write_json(&out_dir.join(format!("{INDEX_FILE_STEM}.json")), &index, force)?;

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T, force: bool) -> anyhow::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("open chart output: {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("serialize: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::formats::Book;

    fn library(columns: &[&str], books: Vec<Book>) -> Library {
        Library {
            books,
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            source: "test.csv".to_owned(),
            loaded_at: Utc::now(),
        }
    }

    fn genre_book(genre: &str, rating: u8) -> Book {
        Book {
            title: "t".to_owned(),
            genre: Some(genre.to_owned()),
            rating,
            ..Book::default()
        }
    }

    #[test]
    fn default_dashboard_matches_the_stats_page() {
        let config = DashboardConfig::default();
        let ids: Vec<&str> = config.charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["genreChart", "yearPublishedChart", "publisherChart", "ratingChart"]
        );
        let year = config.chart("yearPublishedChart").expect("year chart");
        assert_eq!(year.series_spec().order, OrderMode::Trend);
        assert_eq!(year.threshold, 5);
    }

    #[test]
    fn yaml_config_fills_defaults() -> anyhow::Result<()> {
        let config = DashboardConfig::from_yaml(
            r#"
theme:
  lightness: 70
charts:
  - id: genres
    title: Genres
    field: genre
    kind: bar
    order: proportion
  - id: nationality
    title: Author nationality
    field: author_nationality
    kind: pie
    threshold: 2
"#,
        )?;
        assert_eq!(config.theme.lightness, 70);
        assert_eq!(config.theme.saturation, 55);
        assert_eq!(config.default_cover_url, DEFAULT_COVER_URL);
        assert_eq!(config.charts[0].threshold, 3);
        assert_eq!(config.charts[0].series_spec().order, OrderMode::Proportion);
        assert_eq!(config.charts[1].field, Field::AuthorNationality);
        Ok(())
    }

    #[test]
    fn missing_columns_and_duplicate_ids_are_skipped() {
        let library = library(
            &["Title", "Genre", "My Rating"],
            vec![genre_book("A", 5), genre_book("B", 4)],
        );
        let mut config = DashboardConfig::default();
        config.charts.push(config.charts[0].clone());

        let charts = render_dashboard(&library, &config);
        let ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["genreChart", "ratingChart"]);
        assert_eq!(charts[0].dataset_label, "Genre Distribution");
        assert_eq!(charts[1].dataset_label, "My Rating Distribution");
    }

    #[test]
    fn rating_chart_never_folds() {
        let library = library(
            &["Title", "My Rating"],
            vec![genre_book("A", 5), genre_book("A", 4), genre_book("A", 0)],
        );
        let config = DashboardConfig::default();
        let chart = config.chart("ratingChart").expect("rating chart");
        let view = render_chart(&library, chart, &config.theme);
        assert!(view.series.point("Other").is_none());
        assert_eq!(view.series.points.len(), 3);
    }

    #[test]
    fn writes_chart_files_and_index() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let library = library(&["Title", "Genre"], vec![genre_book("A", 1)]);
        let charts = render_dashboard(&library, &DashboardConfig::default());

        let out = temp.path().join("charts");
        write_charts(&out, &charts, false)?;
        assert!(out.join("genreChart.json").exists());
        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("index.json"))?)?;
        assert_eq!(index[0]["file"], "genreChart.json");

        assert!(write_charts(&out, &charts, false).is_err());
        write_charts(&out, &charts, true)?;
        Ok(())
    }

    #[test]
    fn chart_ids_that_escape_or_clash_are_rejected() {
        for id in ["index", "", "  ", "../up", "nested/chart", "win\\chart", "a..b"] {
            let yaml = format!(
                "charts:\n  - id: {id:?}\n    title: T\n    field: genre\n    kind: pie\n"
            );
            let err = DashboardConfig::from_yaml(&yaml).expect_err(id);
            assert!(format!("{err:#}").contains("chart id"), "{id}: {err:#}");
        }
        assert!(validate_chart_id("genreChart").is_ok());
        assert!(validate_chart_id("index2").is_ok());
    }

    #[test]
    fn reserved_id_writes_nothing() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let library = library(&["Title", "Genre"], vec![genre_book("A", 1)]);
        let mut config = DashboardConfig::default();
        config.charts[0].id = "index".to_owned();
        let charts = render_dashboard(&library, &config);

        let out = temp.path().join("charts");
        let err = write_charts(&out, &charts, true).expect_err("reserved id");
        assert!(format!("{err:#}").contains("chart id is reserved: index"));
        assert!(!out.join("index.json").exists());
        Ok(())
    }
}
