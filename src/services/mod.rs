pub mod shortener;
pub mod slug;
pub mod visits;

pub use shortener::Shortener;
pub use slug::SlugGenerator;
pub use visits::VisitAggregator;
