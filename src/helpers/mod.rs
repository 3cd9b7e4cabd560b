//! Helper functions shared by templates, the content pipeline and outgoing mail

mod date;
mod html;

pub use date::*;
pub use html::*;
