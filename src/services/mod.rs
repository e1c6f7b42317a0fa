pub mod lookup;
pub use lookup::Lookup;

pub mod search;
pub use search::{HistoryEntry, SearchError, SearchOptions, SearchOutcome, SearchService};
