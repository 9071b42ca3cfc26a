use tracing::debug;

use common::gateway::{FillMode, SymbolInfo};
use common::{OrderRequest, TradeIntent};

/// Identifying tag stamped on every order this bot submits.
pub const ORDER_MAGIC: u64 = 123_456;

pub const ORDER_COMMENT: &str = "atr-breakout";

/// Fill modes to try for a symbol, in candidate order (FOK, IOC,
/// Return). An unset bitmask, or a mask matching no candidate, yields
/// the symbol's single reported default mode.
pub fn allowed_fill_modes(info: &SymbolInfo) -> Vec<FillMode> {
    if info.fill_modes_mask == 0 {
        return vec![info.default_fill_mode];
    }
    let modes: Vec<FillMode> = FillMode::CANDIDATES
        .into_iter()
        .filter(|m| info.fill_modes_mask & m.bit() != 0)
        .collect();
    if modes.is_empty() {
        vec![info.default_fill_mode]
    } else {
        modes
    }
}

/// Build one market-order submission from a sized trade intent.
pub fn build_market_order(
    intent: &TradeIntent,
    deviation: u32,
    fill_mode: FillMode,
    with_stops: bool,
) -> OrderRequest {
    let request = OrderRequest {
        symbol: intent.symbol.clone(),
        side: intent.side,
        volume: intent.volume,
        price: intent.price,
        deviation,
        stop_loss: if with_stops { intent.stop_loss } else { None },
        take_profit: if with_stops { intent.take_profit } else { None },
        fill_mode,
        magic: ORDER_MAGIC,
        comment: ORDER_COMMENT.to_string(),
    };
    debug!(symbol = %request.symbol, side = %request.side, volume = request.volume,
           fill_mode = ?request.fill_mode, "Built order request");
    request
}
