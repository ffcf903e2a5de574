//! Helper functions for templates
//!
//! URL building and date display shared by the views and the Tera filters.

mod date;
mod url;

pub use date::*;
pub use url::*;
