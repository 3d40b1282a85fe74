//! Terminal rendering of a [`crate::report::Report`].

pub mod panels;
pub mod tables;

pub use panels::render_text;
