//! Record types, JSONL storage primitives and data-dir layout

mod io;
mod paths;
mod types;

pub use io::{append_jsonl, atomic_write, read_json, read_jsonl, write_jsonl, ReadError};
pub use paths::{Paths, HOME_ENV};
pub use types::{Action, ContentItem, InteractionEvent, ParseKindError, Source};
