//! # Prometheus Metrics
//!
//! Operational metrics for a harness run: how many calls were accepted or
//! reverted per operation, how many events were emitted, and the state of
//! the books against the pool when the run ended.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] prefixed with
//! `simplebank`, and are rendered in the text exposition format so the file
//! written by `--metrics-out` can be fed to a node exporter textfile
//! collector as-is.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use simplebank_contracts::{Custody, SimpleBank};

/// Outcome label for accepted calls.
pub const OUTCOME_OK: &str = "ok";

/// Outcome label for reverted calls.
pub const OUTCOME_REVERTED: &str = "reverted";

/// Holds every metric handle for a run.
#[derive(Clone)]
pub struct RunMetrics {
    /// Registry that owns the metrics below.
    registry: Registry,
    /// Calls processed, labelled by operation and outcome.
    pub calls_total: IntCounterVec,
    /// Events appended to the bank's log.
    pub events_emitted_total: IntCounter,
    /// Value held in custody.
    pub custody_held: IntGauge,
    /// Sum of all ledger balances, saturated at `i64::MAX`.
    pub ledger_total: IntGauge,
    /// Enrolled accounts, owner included.
    pub enrolled_accounts: IntGauge,
}

impl RunMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("simplebank".into()), None)?;

        let calls_total = IntCounterVec::new(
            Opts::new("calls_total", "Calls processed by operation and outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(calls_total.clone()))?;

        let events_emitted_total =
            IntCounter::new("events_emitted_total", "Events appended to the audit log")?;
        registry.register(Box::new(events_emitted_total.clone()))?;

        let custody_held = IntGauge::new("custody_held", "Value held in custody, base units")?;
        registry.register(Box::new(custody_held.clone()))?;

        let ledger_total =
            IntGauge::new("ledger_total", "Sum of all ledger balances, base units")?;
        registry.register(Box::new(ledger_total.clone()))?;

        let enrolled_accounts =
            IntGauge::new("enrolled_accounts", "Number of enrolled accounts")?;
        registry.register(Box::new(enrolled_accounts.clone()))?;

        Ok(Self {
            registry,
            calls_total,
            events_emitted_total,
            custody_held,
            ledger_total,
            enrolled_accounts,
        })
    }

    /// Counts one call.
    pub fn record_call(&self, operation: &str, accepted: bool) {
        let outcome = if accepted { OUTCOME_OK } else { OUTCOME_REVERTED };
        self.calls_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Refreshes the gauges and the event counter from the bank's state.
    pub fn observe<C: Custody>(&self, bank: &SimpleBank<C>) {
        let audit = bank.audit();
        self.custody_held
            .set(i64::try_from(audit.custody_held).unwrap_or(i64::MAX));
        self.ledger_total
            .set(i64::try_from(audit.ledger_total).unwrap_or(i64::MAX));
        self.enrolled_accounts
            .set(i64::try_from(bank.enrolled_count()).unwrap_or(i64::MAX));

        let emitted = bank.events().len() as u64;
        let counted = self.events_emitted_total.get();
        if emitted > counted {
            self.events_emitted_total.inc_by(emitted - counted);
        }
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplebank_contracts::{Address, InMemoryCustody};

    #[test]
    fn encode_includes_prefixed_names() {
        let m = RunMetrics::new().unwrap();
        m.record_call("withdraw", true);
        m.record_call("withdraw", false);
        let text = m.encode().unwrap();
        assert!(text.contains("simplebank_calls_total"));
        assert!(text.contains("outcome=\"reverted\""));
    }

    #[test]
    fn observe_tracks_bank_state() {
        let owner = Address::from_index(1);
        let custody = InMemoryCustody::with_accounts([&owner], 10_000);
        let mut bank = SimpleBank::deploy(owner, 5_000, custody).unwrap();
        bank.withdraw(owner, 1_000).unwrap();

        let m = RunMetrics::new().unwrap();
        m.observe(&bank);
        m.observe(&bank);
        assert_eq!(m.custody_held.get(), 4_000);
        assert_eq!(m.ledger_total.get(), 4_000);
        assert_eq!(m.enrolled_accounts.get(), 1);
        assert_eq!(m.events_emitted_total.get(), 1);
    }
}
