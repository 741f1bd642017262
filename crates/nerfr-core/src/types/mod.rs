pub mod result;
pub mod statistics;

pub use result::{Analysis, BasicPrediction};
pub use statistics::{StatisticsSummary, TypeStatistics, summarize};
