mod date_format;
mod model;
mod og;
mod project;
mod search;
mod tags;
mod timezone;

// Re-export public items
pub use model::{Config, MarkdownConfig};
pub use og::OgConfig;
pub use project::{CONFIG_FILE, find_project_root, is_project_root, missing_output_hint};
pub use search::{SearchConfig, StatsConfig};
pub use tags::TagConfig;
pub use timezone::parse_timezone;
