pub mod analytics;
pub mod config;
pub mod cron;
pub mod indexer;
pub mod store;
pub mod utils;

pub use self::analytics::{ChartData, GlobalData, PricePoint, RankedPosition, Transactions};
pub use self::config::Settings;
pub use self::cron::CronScheduler;
pub use self::indexer::{GraphqlIndexer, Indexer};
pub use self::store::{Store, Update};
