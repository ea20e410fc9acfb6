//! Data directory layout, JSONL persistence and run records

mod io;
mod paths;
mod text;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::{Paths, HOME_ENV};
pub use text::truncate_chars;
pub use types::NoteRunRecord;
