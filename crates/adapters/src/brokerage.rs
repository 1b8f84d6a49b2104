//! Brokerage client collaborator (spec §6). Read-only access plus buy/sell;
//! wire protocol and connection management are out of scope.

use async_trait::async_trait;

use crate::domain::{CashBalance, CashFlow, OrderResult, PendingOrder, Position, Quote};
use crate::error::AdapterError;

#[async_trait]
pub trait BrokerageClient: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn positions(&self) -> Result<Vec<Position>, AdapterError>;
    async fn cash_balances(&self) -> Result<Vec<CashBalance>, AdapterError>;
    async fn pending_orders(&self) -> Result<Vec<PendingOrder>, AdapterError>;
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, AdapterError>;
    async fn cash_flows(&self, since_epoch: u64) -> Result<Vec<CashFlow>, AdapterError>;

    async fn buy(
        &self,
        symbol: &str,
        quantity: i64,
        limit_price_minor: Option<i64>,
    ) -> Result<OrderResult, AdapterError>;

    async fn sell(
        &self,
        symbol: &str,
        quantity: i64,
        limit_price_minor: Option<i64>,
    ) -> Result<OrderResult, AdapterError>;
}
