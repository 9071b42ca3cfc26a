use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::gateway::{OrderResult, ReturnCode, SymbolInfo, Tick};
use common::{Error, Gateway, OrderRequest, OrderSide, Result};

/// One simulated open position.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperPosition {
    pub ticket: u64,
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

/// Simulated broker gateway for paper trading.
///
/// Every order fills in full at its request price and is assigned a
/// ticket from a monotonic counter. No real terminal is ever touched.
/// Symbols must be registered before use; quotes are pushed in by
/// whoever drives the simulation.
pub struct PaperGateway {
    symbols: RwLock<HashMap<String, SymbolInfo>>,
    quotes: RwLock<HashMap<String, Tick>>,
    positions: RwLock<Vec<PaperPosition>>,
    next_ticket: AtomicU64,
}

impl PaperGateway {
    pub fn new() -> Self {
        info!("PaperGateway initialized");
        Self {
            symbols: RwLock::new(HashMap::new()),
            quotes: RwLock::new(HashMap::new()),
            positions: RwLock::new(Vec::new()),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub async fn register_symbol(&self, info: SymbolInfo) {
        self.symbols.write().await.insert(info.name.clone(), info);
    }

    pub async fn update_quote(&self, symbol: &str, bid: f64, ask: f64) {
        self.quotes
            .write()
            .await
            .insert(symbol.to_string(), Tick { bid, ask });
    }

    pub async fn positions(&self) -> Vec<PaperPosition> {
        self.positions.read().await.clone()
    }
}

impl Default for PaperGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for PaperGateway {
    async fn symbol_info(&self, symbol: &str) -> Result<SymbolInfo> {
        self.symbols
            .read()
            .await
            .get(symbol)
            .cloned()
            .ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))
    }

    async fn tick(&self, symbol: &str) -> Result<Tick> {
        self.quotes
            .read()
            .await
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::TickUnavailable(symbol.to_string()))
    }

    async fn open_position_count(&self, symbol: &str) -> Result<u32> {
        Ok(self
            .positions
            .read()
            .await
            .iter()
            .filter(|p| p.symbol == symbol)
            .count() as u32)
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult> {
        if !self.symbols.read().await.contains_key(&request.symbol) {
            return Err(Error::SymbolNotFound(request.symbol.clone()));
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        debug!(
            symbol = %request.symbol,
            side = %request.side,
            volume = request.volume,
            price = request.price,
            ticket,
            "Paper fill simulated"
        );

        self.positions.write().await.push(PaperPosition {
            ticket,
            symbol: request.symbol.clone(),
            side: request.side,
            volume: request.volume,
            price: request.price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
        });

        Ok(OrderResult {
            retcode: ReturnCode::Done,
            order_id: Some(ticket),
            comment: String::new(),
        })
    }

    async fn modify_stop_levels(
        &self,
        position_id: u64,
        symbol: &str,
        stop_loss: f64,
        take_profit: f64,
    ) -> Result<OrderResult> {
        let mut positions = self.positions.write().await;
        match positions
            .iter_mut()
            .find(|p| p.ticket == position_id && p.symbol == symbol)
        {
            Some(position) => {
                position.stop_loss = (stop_loss != 0.0).then_some(stop_loss);
                position.take_profit = (take_profit != 0.0).then_some(take_profit);
                Ok(OrderResult {
                    retcode: ReturnCode::Done,
                    order_id: Some(position_id),
                    comment: String::new(),
                })
            }
            None => Ok(OrderResult {
                retcode: ReturnCode::Rejected,
                order_id: None,
                comment: format!("no open position with ticket {position_id}"),
            }),
        }
    }
}
