pub mod post;
pub mod report;

pub use post::{Post, Submolt};
pub use report::{
    DailyReport, ExtractionTier, Insight, RecommendedReading, ReportOrigin, Solution, Stats,
    Topic, TopicHeat, TrendPoint,
};
