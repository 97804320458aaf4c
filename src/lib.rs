#![forbid(unsafe_code)]

pub mod aggregate;
pub mod app;
pub mod bucket;
pub mod cli;
pub mod color;
pub mod commands;
pub mod dashboard;
pub mod dataset;
pub mod filter;
pub mod formats;
pub mod logging;
pub mod normalize;
pub mod order;
pub mod series;
pub mod shelf;
