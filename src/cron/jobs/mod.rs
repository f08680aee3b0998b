//! Store refresh jobs. Each job fails when its refresh produced nothing, so
//! the scheduler logs it; the previously stored value stays in place.

pub mod refresh_chart;
pub mod refresh_directory;
pub mod refresh_global;
pub mod refresh_prices;
pub mod refresh_transactions;
