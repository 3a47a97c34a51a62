pub mod record;
pub mod source;

pub use record::TrendingRecord;
pub use source::{SourceSpec, TimeRange};
