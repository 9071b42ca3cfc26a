use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use backtest::load_bars_csv;
use common::config::BacktestConfig;
use common::gateway::{FillMode, SymbolInfo};
use common::{AppConfig, BarFeed, Gateway, Notifier, OrderSide, TradeIntent};
use exec::{kill_switch_active, parse_sessions, ExecutionPipeline};
use monitor::{CsvJournal, NullNotifier, TelegramNotifier};
use paper::{PaperGateway, ReplayFeed};
use risk::RiskManager;
use strategy::compute_signal;

/// Consecutive bar-feed failures tolerated before the loop gives up.
const MAX_FEED_FAILURES: u32 = 5;

/// The decision loop: poll bars, derive a signal, gate it through the
/// risk manager, hand the sized intent to the execution pipeline.
///
/// The loop itself is gateway-agnostic; the `live` command wires it to
/// the paper gateway, the only shipped `Gateway` implementation.
pub struct TradeLoop {
    gateway: Arc<dyn Gateway>,
    feed: Arc<dyn BarFeed>,
    pipeline: ExecutionPipeline,
    risk: RiskManager,
    config: AppConfig,
    dry_run: bool,
    balance: f64,
    /// Open time of the last bar acted on, per symbol. Guarantees at
    /// most one decision per symbol per bar.
    last_bar_time: HashMap<String, DateTime<Utc>>,
    feed_failures: u32,
}

impl TradeLoop {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        feed: Arc<dyn BarFeed>,
        pipeline: ExecutionPipeline,
        risk: RiskManager,
        config: AppConfig,
        dry_run: bool,
    ) -> Self {
        let balance = config.backtest.initial_balance;
        Self {
            gateway,
            feed,
            pipeline,
            risk,
            config,
            dry_run,
            balance,
            last_bar_time: HashMap::new(),
            feed_failures: 0,
        }
    }

    pub fn feed_failures(&self) -> u32 {
        self.feed_failures
    }

    /// One poll cycle over every configured symbol.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) {
        self.risk.reset_if_new_day(now);

        if kill_switch_active(&self.config.execution.kill_switch_file) {
            warn!(
                file = %self.config.execution.kill_switch_file,
                "Kill switch active, no new submissions"
            );
            return;
        }

        let symbols = self.config.symbols.clone();
        for symbol in &symbols {
            self.process_symbol(symbol, now).await;
        }
    }

    async fn process_symbol(&mut self, symbol: &str, now: DateTime<Utc>) {
        let warmup = self.config.strategy.warmup_bars();
        let bars = match self.feed.recent_bars(symbol, warmup + 5).await {
            Ok(bars) => {
                self.feed_failures = 0;
                bars
            }
            Err(e) => {
                self.feed_failures += 1;
                warn!(symbol, error = %e, failures = self.feed_failures, "Bar feed failure");
                return;
            }
        };
        if bars.len() < warmup {
            debug!(symbol, bars = bars.len(), warmup, "Not enough history yet");
            return;
        }

        // Act at most once per bar close.
        let bar_time = bars[bars.len() - 1].time;
        if self.last_bar_time.get(symbol) == Some(&bar_time) {
            return;
        }
        self.last_bar_time.insert(symbol.to_string(), bar_time);

        let signal = compute_signal(&bars, &self.config.strategy);
        let Some(side) = signal.direction else {
            return;
        };
        info!(symbol, side = %side, atr = signal.atr, "Signal fired");

        match self.gateway.open_position_count(symbol).await {
            Ok(count) if count >= self.config.risk.max_concurrent_positions_per_symbol => {
                debug!(symbol, count, "Per-symbol position cap reached");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(symbol, error = %e, "Position count unavailable");
                return;
            }
        }

        if let Err(veto) = self.risk.can_trade(self.balance, now) {
            warn!(symbol, veto = %veto, "Risk limits block trade");
            return;
        }

        let sl_distance = self.config.strategy.sl_atr_mult * signal.atr;
        if sl_distance <= 0.0 {
            return;
        }

        let info = match self.gateway.symbol_info(symbol).await {
            Ok(info) => info,
            Err(e) => {
                warn!(symbol, error = %e, "Symbol info unavailable");
                return;
            }
        };
        let tick = match self.gateway.tick(symbol).await {
            Ok(tick) => tick,
            Err(e) => {
                warn!(symbol, error = %e, "Tick unavailable");
                return;
            }
        };

        let entry = match side {
            OrderSide::Buy => tick.ask,
            OrderSide::Sell => tick.bid,
        };
        let stop_loss = entry - side.sign() * sl_distance;
        let take_profit = entry + side.sign() * self.config.strategy.rr_ratio * sl_distance;

        let volume = self.risk.position_size(
            self.balance,
            sl_distance,
            info.point,
            info.tick_value,
            info.volume_step,
            info.volume_min,
            info.volume_max,
        );
        if volume <= 0.0 {
            return;
        }

        let intent = TradeIntent {
            symbol: symbol.to_string(),
            side,
            volume,
            price: entry,
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
        };

        if self.dry_run || self.config.execution.dry_run {
            info!(
                symbol,
                side = %side,
                volume,
                entry,
                stop_loss,
                take_profit,
                "DRY RUN order"
            );
            return;
        }

        match self.pipeline.execute(&intent, now).await {
            Err(rejection) => {
                warn!(symbol, reason = %rejection, "Order rejected before submission");
            }
            Ok(outcome) if outcome.is_success() => {
                // Count the submission against the daily trade budget.
                self.risk.record_trade(0.0);
                info!(symbol, ticket = ?outcome.order_id, "Trade opened");
            }
            Ok(outcome) => {
                warn!(
                    symbol,
                    retcode = %outcome.retcode,
                    reason = %outcome.reason,
                    "Submission failed"
                );
            }
        }
    }
}

/// Default FX-style instrument constraints for the paper gateway, built
/// from the instrument economics in the backtest config section.
fn paper_symbol_info(symbol: &str, cfg: &BacktestConfig) -> SymbolInfo {
    SymbolInfo {
        name: symbol.to_string(),
        tradable: true,
        point: cfg.point,
        tick_value: cfg.tick_value,
        stops_level: 10.0,
        volume_min: cfg.volume_min,
        volume_max: cfg.volume_max,
        volume_step: cfg.volume_step,
        fill_modes_mask: FillMode::Fok.bit() | FillMode::Ioc.bit(),
        default_fill_mode: FillMode::Fok,
    }
}

/// `pipbot live`: drive the decision loop over a recorded bar history
/// against the paper gateway, one poll cycle per bar.
pub async fn run(config_path: &str, data_path: &str, dry_run: bool) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path)?;
    let bars = load_bars_csv(data_path)?;
    let warmup = cfg.strategy.warmup_bars();

    let gateway = Arc::new(PaperGateway::new());
    for symbol in &cfg.symbols {
        gateway
            .register_symbol(paper_symbol_info(symbol, &cfg.backtest))
            .await;
    }
    let feed = Arc::new(ReplayFeed::new(bars, warmup));

    let journal = Arc::new(CsvJournal::new(&cfg.journal.path));
    let notifier: Arc<dyn Notifier> = match TelegramNotifier::from_env() {
        Some(notifier) => Arc::new(notifier),
        None => Arc::new(NullNotifier),
    };
    let sessions = parse_sessions(&cfg.sessions)?;
    let pipeline = ExecutionPipeline::new(
        gateway.clone(),
        journal,
        notifier,
        cfg.execution.clone(),
        sessions,
    );
    let risk = RiskManager::new(cfg.risk);

    let mut trade_loop = TradeLoop::new(
        gateway.clone(),
        feed.clone(),
        pipeline,
        risk,
        cfg.clone(),
        dry_run,
    );

    info!(symbols = ?cfg.symbols, dry_run, "Paper session starting");
    loop {
        let Some(bar) = feed.current_bar() else { break };

        // Quotes track the latest close, spread from the cost model.
        let half_spread = cfg.backtest.spread_points * cfg.backtest.point / 2.0;
        for symbol in &cfg.symbols {
            gateway
                .update_quote(symbol, bar.close - half_spread, bar.close + half_spread)
                .await;
        }

        trade_loop.poll_once(bar.time).await;

        if trade_loop.feed_failures() >= MAX_FEED_FAILURES {
            warn!("Bar feed unavailable, shutting down");
            break;
        }
        if !feed.advance() {
            break;
        }
    }

    let positions = gateway.positions().await;
    info!(positions = positions.len(), "Paper session complete");
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
