use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;

use crate::cli::{ChartsArgs, SelectArgs, SeriesArgs, ShelfArgs};
use crate::color::Theme;
use crate::dashboard::{DashboardConfig, render_dashboard, write_charts};
use crate::dataset::load_library;
use crate::filter::select as select_books;
use crate::formats::DEFAULT_COVER_URL;
use crate::series::{SeriesSpec, build_series};
use crate::shelf::build_shelf;

pub async fn charts(args: ChartsArgs) -> anyhow::Result<()> {
    let out_dir = PathBuf::from(&args.out);
    let dashboard = DashboardConfig::load(args.dashboard.as_deref().map(Path::new))?;
    let library = load_library(&args.data.data, &args.data.load_options()).await?;

    let charts = render_dashboard(&library, &dashboard);
    write_charts(&out_dir, &charts, args.force).context("write charts")?;
    tracing::info!(
        charts = charts.len(),
        out = %out_dir.display(),
        "wrote charts"
    );
    Ok(())
}

pub async fn series(args: SeriesArgs) -> anyhow::Result<()> {
    let library = load_library(&args.data.data, &args.data.load_options()).await?;
    if !library.has_field(args.field) {
        tracing::warn!(field = %args.field, source = %library.source, "dataset has no column for field");
    }
    let spec = SeriesSpec {
        field: args.field,
        threshold: args.threshold,
        order: args.order,
    };
    print_json(&build_series(&library.books, spec, &Theme::default()))
}

pub async fn select(args: SelectArgs) -> anyhow::Result<()> {
    let dashboard = DashboardConfig::load(args.dashboard.as_deref().map(Path::new))?;
    let library = load_library(&args.data.data, &args.data.load_options()).await?;

    let chart = render_dashboard(&library, &dashboard)
        .into_iter()
        .find(|chart| chart.id == args.chart)
        .ok_or_else(|| anyhow::anyhow!("chart not found: {}", args.chart))?;

    print_json(&select_books(
        &library.books,
        &chart.series,
        &args.label,
        &dashboard.default_cover_url,
    ))
}

pub async fn shelf(args: ShelfArgs) -> anyhow::Result<()> {
    let library = load_library(&args.data.data, &args.data.load_options()).await?;
    let cover = args.default_cover_url.as_deref().unwrap_or(DEFAULT_COVER_URL);
    print_json(&build_shelf(&library.books, args.min_rating, cover))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("serialize output")?;
    stdout.write_all(b"\n").context("write stdout")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}
