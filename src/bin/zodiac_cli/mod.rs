//! CLI subcommand implementations for zodiac

pub mod constellation;
pub mod typegen;
