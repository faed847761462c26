mod error;
mod extractor;
pub mod route;
mod state;

pub use error::HttpError;
pub use state::{AppState, Entry, EntryState, EntryStatus, SharedState};
