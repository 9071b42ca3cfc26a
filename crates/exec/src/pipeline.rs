use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use common::config::ExecutionConfig;
use common::gateway::{OrderResult, RetCategory, ReturnCode, SymbolInfo};
use common::{
    Error, ExecutionOutcome, Gateway, Journal, JournalEntry, Notifier, OrderRequest, TradeIntent,
};

use crate::request::{allowed_fill_modes, build_market_order};
use crate::session::SessionClock;
use crate::validate::{check_spread, check_stop_distance, check_tradable, ValidationError};

/// The order-submission state machine:
/// Validating → Submitting → {Done, Retrying, FallbackFilling, FallbackNoStops, Failed}.
///
/// Holds two independently bounded loops that must never be conflated:
/// the transient-error retry loop (same request, fixed backoff) and the
/// fill-mode fallback loop (next candidate mode, no backoff). A third
/// fallback resubmits without stops when the broker rejects the stop
/// levels of an otherwise valid order, then attaches them via a
/// separate modify call.
pub struct ExecutionPipeline {
    gateway: Arc<dyn Gateway>,
    journal: Arc<dyn Journal>,
    notifier: Arc<dyn Notifier>,
    config: ExecutionConfig,
    sessions: SessionClock,
}

impl ExecutionPipeline {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        journal: Arc<dyn Journal>,
        notifier: Arc<dyn Notifier>,
        config: ExecutionConfig,
        sessions: SessionClock,
    ) -> Self {
        Self {
            gateway,
            journal,
            notifier,
            config,
            sessions,
        }
    }

    /// Run one sized trade intent through validation and submission.
    ///
    /// `Err` is a pre-submission validation rejection: nothing was sent
    /// to the gateway and no side effects occurred. `Ok` carries the
    /// terminal outcome of an actual submission cycle, success or not.
    pub async fn execute(
        &self,
        intent: &TradeIntent,
        now: DateTime<Utc>,
    ) -> Result<ExecutionOutcome, ValidationError> {
        // ── Validating ───────────────────────────────────────────────
        if !self.sessions.is_in_session(now) {
            return Err(ValidationError::OutsideSession);
        }

        let info = match self.gateway.symbol_info(&intent.symbol).await {
            Ok(info) => info,
            Err(e) => return Ok(transport_failure(e)),
        };
        check_tradable(&info)?;

        let tick = match self.gateway.tick(&intent.symbol).await {
            Ok(tick) => tick,
            Err(e) => return Ok(transport_failure(e)),
        };
        check_spread(&tick, info.point, self.config.max_spread_points)?;
        check_stop_distance(&info, intent.price, intent.stop_loss, intent.take_profit)?;

        // ── Submitting ───────────────────────────────────────────────
        let mut outcome = self.submit_across_fill_modes(intent, &info, true).await;

        // ── FallbackNoStops ──────────────────────────────────────────
        // Brokers sometimes reject a combined open+protect request but
        // accept the open and the protect separately.
        if outcome.retcode.category() == RetCategory::StopsRejected {
            warn!(
                symbol = %intent.symbol,
                "Stop levels rejected, resubmitting without stops"
            );
            outcome = self.submit_across_fill_modes(intent, &info, false).await;
            if outcome.is_success() {
                if let Some(ticket) = outcome.order_id {
                    outcome = self.attach_stops(ticket, intent, outcome).await;
                }
            }
        }

        if outcome.is_success() {
            self.record_success(intent, &outcome, now).await;
        } else {
            error!(
                symbol = %intent.symbol,
                retcode = %outcome.retcode,
                reason = %outcome.reason,
                "Order submission failed"
            );
        }
        Ok(outcome)
    }

    /// FallbackFilling: try each advertised fill mode in candidate
    /// order. Only an "invalid fill mode" rejection advances to the
    /// next candidate; success and every other rejection terminate.
    async fn submit_across_fill_modes(
        &self,
        intent: &TradeIntent,
        info: &SymbolInfo,
        with_stops: bool,
    ) -> ExecutionOutcome {
        let mut last = ExecutionOutcome {
            retcode: ReturnCode::InvalidFill,
            order_id: None,
            reason: "no acceptable fill mode".to_string(),
        };
        for mode in allowed_fill_modes(info) {
            let request = build_market_order(intent, self.config.deviation, mode, with_stops);
            let outcome = self.submit_with_retry(&request).await;
            if outcome.retcode.category() == RetCategory::FillModeRejected {
                warn!(symbol = %intent.symbol, fill_mode = ?mode, "Invalid filling mode, trying next candidate");
                last = outcome;
                continue;
            }
            return outcome;
        }
        last
    }

    /// Retrying: resubmit the identical request on transient broker
    /// rejections, with a fixed backoff, up to the attempt ceiling.
    async fn submit_with_retry(&self, request: &OrderRequest) -> ExecutionOutcome {
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match self.gateway.submit_order(request).await {
                Ok(result) => result,
                Err(e) => {
                    error!(symbol = %request.symbol, error = %e, "Order transport failure");
                    return transport_failure(e);
                }
            };
            let outcome = outcome_from(result);
            match outcome.retcode.category() {
                RetCategory::Transient if attempt < attempts => {
                    warn!(
                        symbol = %request.symbol,
                        retcode = %outcome.retcode,
                        attempt,
                        "Transient rejection, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(Duration::from_secs(self.config.retry_backoff_secs)).await;
                }
                RetCategory::Transient => {
                    error!(symbol = %request.symbol, attempts, "Retry budget exhausted");
                    return outcome;
                }
                _ => return outcome,
            }
        }
    }

    /// Second phase of FallbackNoStops: the order is open, attach the
    /// originally intended protection levels to the position.
    async fn attach_stops(
        &self,
        ticket: u64,
        intent: &TradeIntent,
        open_outcome: ExecutionOutcome,
    ) -> ExecutionOutcome {
        let sl = intent.stop_loss.unwrap_or(0.0);
        let tp = intent.take_profit.unwrap_or(0.0);
        match self
            .gateway
            .modify_stop_levels(ticket, &intent.symbol, sl, tp)
            .await
        {
            Ok(result) if result.retcode.category() == RetCategory::Success => {
                info!(symbol = %intent.symbol, ticket, "Stops attached after naked fill");
                open_outcome
            }
            Ok(result) => ExecutionOutcome {
                retcode: result.retcode,
                order_id: Some(ticket),
                reason: format!("stop attach rejected: {}", result.comment),
            },
            Err(e) => ExecutionOutcome {
                retcode: ReturnCode::Error,
                order_id: Some(ticket),
                reason: format!("stop attach transport failure: {e}"),
            },
        }
    }

    /// Done: one journal row, one alert. Both collaborators swallow
    /// their own failures, so neither can fail the pipeline.
    async fn record_success(
        &self,
        intent: &TradeIntent,
        outcome: &ExecutionOutcome,
        now: DateTime<Utc>,
    ) {
        info!(
            symbol = %intent.symbol,
            side = %intent.side,
            volume = intent.volume,
            ticket = ?outcome.order_id,
            "Order executed"
        );
        self.journal
            .append(&JournalEntry {
                time: now,
                symbol: intent.symbol.clone(),
                direction: intent.side,
                volume: intent.volume,
                price: intent.price,
                stop_loss: intent.stop_loss,
                take_profit: intent.take_profit,
                ticket: outcome.order_id,
                comment: outcome.reason.clone(),
            })
            .await;
        self.notifier
            .send(&format!(
                "Trade executed {} {} {:.2} lots @ {:.5}",
                intent.symbol, intent.side, intent.volume, intent.price
            ))
            .await;
    }
}

fn outcome_from(result: OrderResult) -> ExecutionOutcome {
    let reason = if result.comment.is_empty() {
        result.retcode.message().to_string()
    } else {
        result.comment
    };
    ExecutionOutcome {
        retcode: result.retcode,
        order_id: result.order_id,
        reason,
    }
}

fn transport_failure(e: Error) -> ExecutionOutcome {
    ExecutionOutcome {
        retcode: ReturnCode::Error,
        order_id: None,
        reason: format!("transport failure: {e}"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
