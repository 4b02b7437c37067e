mod bar;
mod crawl_status;
mod kind;
mod pool;
mod score;

pub use bar::{Bar, Series};
pub use crawl_status::{CrawlRecord, CrawlState};
pub use kind::DataKind;
pub use pool::{Bucket, Pool, PoolEntry};
pub use score::{AuxSignals, HoldingsProfile, ScoreRecord};
