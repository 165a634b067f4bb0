//! Trading task records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Status value of tasks currently being watched for signals
pub const STATUS_RUNNING: &str = "running";

/// A stored trading task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub user_id: String,
    /// Instrument symbol, e.g. `AAPL` or `BTCUSDT`
    pub stock: String,
    /// Candle interval, e.g. `1d`
    pub kline_type: String,
    pub buy_strategy: String,
    pub sell_strategy: String,
    pub status: String,
    pub timestamp: NaiveDateTime,
}

impl Task {
    pub fn is_running(&self) -> bool {
        self.status == STATUS_RUNNING
    }
}

/// Fields supplied by the caller when creating a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub user_id: String,
    pub stock: String,
    pub kline_type: String,
    pub buy_strategy: String,
    pub sell_strategy: String,
    pub status: String,
}

impl NewTask {
    pub fn new(
        user_id: impl Into<String>,
        stock: impl Into<String>,
        kline_type: impl Into<String>,
        buy_strategy: impl Into<String>,
        sell_strategy: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            stock: stock.into(),
            kline_type: kline_type.into(),
            buy_strategy: buy_strategy.into(),
            sell_strategy: sell_strategy.into(),
            status: status.into(),
        }
    }

    /// Materialize the record with server-assigned fields
    pub fn into_task(self, id: i32, timestamp: NaiveDateTime) -> Task {
        Task {
            id,
            user_id: self.user_id,
            stock: self.stock,
            kline_type: self.kline_type,
            buy_strategy: self.buy_strategy,
            sell_strategy: self.sell_strategy,
            status: self.status,
            timestamp,
        }
    }
}
