//! CLI subcommand implementations.

pub mod input;
pub mod normalize;
pub mod report;
pub mod summary;
pub mod util;
pub mod zones;
