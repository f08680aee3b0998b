use std::time::Duration;

use log::{error, info};
use serde::Serialize;

use super::with_timeout;
use crate::indexer::{Burn, Indexer, Mint, Swap, TransactionRecord};

/// Recent protocol events, flattened across transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transactions {
    pub mints: Vec<Mint>,
    pub burns: Vec<Burn>,
    pub swaps: Vec<Swap>,
}

impl Transactions {
    pub fn is_empty(&self) -> bool {
        self.mints.is_empty() && self.burns.is_empty() && self.swaps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mints.len() + self.burns.len() + self.swaps.len()
    }
}

impl FromIterator<TransactionRecord> for Transactions {
    fn from_iter<I: IntoIterator<Item = TransactionRecord>>(records: I) -> Self {
        let mut transactions = Transactions::default();
        for record in records {
            transactions.mints.extend(record.mints);
            transactions.burns.extend(record.burns);
            transactions.swaps.extend(record.swaps);
        }
        transactions
    }
}

/// Latest mints, burns and swaps in transaction order (newest first).
pub async fn fetch_transactions(indexer: &dyn Indexer, timeout: Duration) -> Transactions {
    match with_timeout(timeout, "transactions", indexer.transactions()).await {
        Ok(records) => {
            let transactions: Transactions = records.into_iter().collect();
            info!(
                "Fetched {} transactions: {} mints, {} burns, {} swaps",
                transactions.len(),
                transactions.mints.len(),
                transactions.burns.len(),
                transactions.swaps.len()
            );
            transactions
        },
        Err(e) => {
            error!("Failed to fetch transactions: {:#}", e);
            Transactions::default()
        },
    }
}
