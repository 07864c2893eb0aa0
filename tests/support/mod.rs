#![allow(dead_code)]

use std::sync::Arc;

use guardian::adapter::PaperExchange;
use guardian::application::{GuardianSettings, PassReport, PassTrigger, Reconciler};
use guardian::domain::{OrderId, RiskParams};
use guardian::testkit::domain::{position_event, settings, SYMBOL};
use rust_decimal::Decimal;

/// A paper venue and a reconciler driving it directly, without the engine's
/// worker task.
pub struct Harness {
    pub venue: Arc<PaperExchange>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new(risk: RiskParams) -> Self {
        Self::with_settings(settings(risk))
    }

    pub fn with_settings(settings: GuardianSettings) -> Self {
        let venue = Arc::new(PaperExchange::new(SYMBOL));
        let reconciler = Reconciler::new(settings, venue.clone());
        Self { venue, reconciler }
    }

    /// Move the venue position and run the pass its event would trigger.
    pub async fn position(&mut self, amount: Decimal, entry_price: Decimal) -> PassReport {
        self.venue.set_position(amount, entry_price);
        self.reconciler
            .run_pass(PassTrigger::Event(position_event(amount, entry_price)))
            .await
    }

    pub async fn pass(&mut self, trigger: PassTrigger) -> PassReport {
        self.reconciler.run_pass(trigger).await
    }

    pub async fn safety_net(&mut self) -> PassReport {
        self.pass(PassTrigger::SafetyNet).await
    }

    /// Id of the stop the reconciler currently remembers.
    pub fn stop_id(&self) -> OrderId {
        self.reconciler
            .snapshot()
            .stop_order
            .map(|order| order.id)
            .expect("a remembered stop order")
    }
}
