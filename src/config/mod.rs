mod config;

pub use self::config::{
    AssetSettings, IndexerSettings, RankingSettings, RefreshSettings, Settings, TrackedAsset,
};
