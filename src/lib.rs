pub mod build;
pub mod config;
pub mod content;
pub mod dates;
pub mod markdown;
pub mod og;
pub mod search;
pub mod stats;
pub mod tags;
pub mod text;
