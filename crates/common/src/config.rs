use serde::Deserialize;

use crate::{Error, Result};

/// Top-level application config, loaded once at startup from a TOML file.
///
/// Example `config/pipbot.toml`:
/// ```toml
/// symbols = ["EURUSD", "GBPUSD"]
/// timeframe = "M15"
///
/// [strategy]
/// breakout_n = 20
/// atr_period = 14
/// atr_min = 0.0001
/// sl_atr_mult = 1.5
/// rr_ratio = 2.0
/// ema_period = 50
/// use_trend_filter = true
///
/// [sessions]
/// timezone = "Europe/London"
/// [[sessions.windows]]
/// name = "london"
/// start = "08:00"
/// end = "17:00"
///
/// [risk]
/// risk_per_trade_pct = 1.0
/// daily_loss_limit_pct = 3.0
/// max_trades_per_day = 5
/// max_concurrent_positions_per_symbol = 1
///
/// [execution]
/// deviation = 10
/// max_spread_points = 30
/// dry_run = false
/// retry_attempts = 3
/// retry_backoff_secs = 2
/// kill_switch_file = "KILL_SWITCH"
///
/// [backtest]
/// initial_balance = 10000.0
/// commission_per_lot = 7.0
/// spread_points = 10
/// slippage_points = 2
/// point = 0.0001
/// tick_value = 10.0
/// volume_step = 0.01
/// volume_min = 0.01
/// volume_max = 100.0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub strategy: StrategyConfig,
    pub sessions: SessionConfig,
    pub risk: RiskLimits,
    pub execution: ExecutionConfig,
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Signal generator parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StrategyConfig {
    /// Breakout band lookback, excluding the current bar.
    pub breakout_n: usize,
    pub atr_period: usize,
    /// Volatility floor: no signal when ATR is below this.
    pub atr_min: f64,
    /// Stop distance = this multiplier times ATR.
    pub sl_atr_mult: f64,
    /// Reward:risk ratio used to derive the take-profit level.
    pub rr_ratio: f64,
    pub ema_period: usize,
    pub use_trend_filter: bool,
}

impl StrategyConfig {
    /// Bars required before a signal can fire at all.
    pub fn warmup_bars(&self) -> usize {
        self.breakout_n.max(self.atr_period).max(self.ema_period) + 1
    }

    /// Indicator periods must be at least one bar and the stop/target
    /// multipliers positive, otherwise signal generation has no
    /// meaning. The ATR floor may be zero (no floor).
    pub fn validate(&self) -> Result<()> {
        if self.breakout_n == 0 || self.atr_period == 0 || self.ema_period == 0 {
            return Err(Error::Config(
                "strategy periods must be at least 1 bar".to_string(),
            ));
        }
        if self.sl_atr_mult <= 0.0 || self.rr_ratio <= 0.0 || self.atr_min < 0.0 {
            return Err(Error::Config(
                "strategy multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trading-session windows, evaluated in the configured timezone.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// IANA timezone name, e.g. "Europe/London".
    pub timezone: String,
    pub windows: Vec<SessionWindowConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionWindowConfig {
    #[serde(default = "default_window_name")]
    pub name: String,
    /// "HH:MM", local to the session timezone.
    pub start: String,
    pub end: String,
}

fn default_window_name() -> String {
    "session".to_string()
}

/// User-configurable risk limits. All values must be positive.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RiskLimits {
    /// Percent of balance risked per trade (e.g. 1.0 = 1%).
    pub risk_per_trade_pct: f64,
    /// Daily realized loss, as a percent of current balance, that stops
    /// trading for the rest of the UTC day.
    pub daily_loss_limit_pct: f64,
    pub max_trades_per_day: u32,
    pub max_concurrent_positions_per_symbol: u32,
}

impl RiskLimits {
    pub fn validate(&self) -> Result<()> {
        if self.risk_per_trade_pct <= 0.0
            || self.daily_loss_limit_pct <= 0.0
            || self.max_trades_per_day == 0
            || self.max_concurrent_positions_per_symbol == 0
        {
            return Err(Error::Config(
                "all risk limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Order-submission settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum accepted price deviation, in points.
    pub deviation: u32,
    /// Spread ceiling in points; wider markets are skipped.
    pub max_spread_points: f64,
    /// Log fully built orders instead of submitting them.
    #[serde(default)]
    pub dry_run: bool,
    /// Attempt ceiling for transient broker rejections.
    pub retry_attempts: u32,
    /// Fixed delay between retry attempts.
    pub retry_backoff_secs: u64,
    /// New submissions are suspended while this file exists.
    pub kill_switch_file: String,
}

/// Replay engine inputs: cost model plus the instrument economics the
/// live path would read from `SymbolInfo`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub commission_per_lot: f64,
    pub spread_points: f64,
    pub slippage_points: f64,
    pub point: f64,
    pub tick_value: f64,
    pub volume_step: f64,
    pub volume_min: f64,
    pub volume_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    pub path: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: "trades/trade_journal.csv".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate the config file. Malformed limits are fatal at
    /// startup; nothing else in the core terminates the process.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read '{path}': {e}")))?;
        let cfg: AppConfig = toml::from_str(&content)?;
        cfg.strategy.validate()?;
        cfg.risk.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        symbols = ["EURUSD"]
        timeframe = "M15"

        [strategy]
        breakout_n = 20
        atr_period = 14
        atr_min = 0.0001
        sl_atr_mult = 1.5
        rr_ratio = 2.0
        ema_period = 50
        use_trend_filter = true

        [sessions]
        timezone = "Europe/London"
        [[sessions.windows]]
        start = "08:00"
        end = "17:00"

        [risk]
        risk_per_trade_pct = 1.0
        daily_loss_limit_pct = 3.0
        max_trades_per_day = 5
        max_concurrent_positions_per_symbol = 1

        [execution]
        deviation = 10
        max_spread_points = 30
        retry_attempts = 3
        retry_backoff_secs = 2
        kill_switch_file = "KILL_SWITCH"

        [backtest]
        initial_balance = 10000.0
        commission_per_lot = 7.0
        spread_points = 10
        slippage_points = 2
        point = 0.0001
        tick_value = 10.0
        volume_step = 0.01
        volume_min = 0.01
        volume_max = 100.0
    "#;

    #[test]
    fn parses_sample_config() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.symbols, vec!["EURUSD"]);
        assert_eq!(cfg.strategy.breakout_n, 20);
        assert_eq!(cfg.strategy.warmup_bars(), 51);
        assert_eq!(cfg.sessions.windows[0].name, "session");
        assert!(!cfg.execution.dry_run);
        assert_eq!(cfg.journal.path, "trades/trade_journal.csv");
    }

    #[test]
    fn zero_indicator_period_is_rejected() {
        let mut cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert!(cfg.strategy.validate().is_ok());

        cfg.strategy.ema_period = 0;
        assert!(cfg.strategy.validate().is_err());

        cfg.strategy.ema_period = 50;
        cfg.strategy.sl_atr_mult = 0.0;
        assert!(cfg.strategy.validate().is_err());
    }

    #[test]
    fn zero_risk_limit_is_rejected() {
        let limits = RiskLimits {
            risk_per_trade_pct: 0.0,
            daily_loss_limit_pct: 3.0,
            max_trades_per_day: 5,
            max_concurrent_positions_per_symbol: 1,
        };
        assert!(limits.validate().is_err());
    }
}
