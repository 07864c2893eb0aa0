//! Composition root: wires a configured engine to the paper venue.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::adapter::PaperExchange;
use crate::application::{GuardianEngine, LogObserver};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// A running engine guarding a paper position.
pub struct PaperRuntime {
    pub venue: Arc<PaperExchange>,
    pub engine: GuardianEngine,
    price_feed: JoinHandle<()>,
}

impl PaperRuntime {
    /// Build the venue and engine, start the engine, then seed the venue's
    /// price and position so the engine sees them as events.
    pub async fn start(config: &Config) -> Result<Self> {
        let settings = config.settings();
        let venue = Arc::new(PaperExchange::new(settings.symbol.clone()));
        let tick = settings.risk.price_tick;

        let engine = GuardianEngine::new(settings, venue.clone())?;
        engine.register_observer(Box::new(LogObserver::new()));
        engine.start().await?;

        let paper = &config.paper;
        venue.set_price(paper.start_price());
        if !paper.position.is_zero() {
            info!(
                position = %paper.position,
                entry = %paper.entry_price,
                "Seeding paper position"
            );
            venue.set_position(paper.position, paper.entry_price);
        }

        let price_feed = venue.spawn_price_feed(
            paper.start_price(),
            Duration::from_millis(paper.tick_interval_ms),
            paper.volatility,
            tick,
        );

        Ok(Self {
            venue,
            engine,
            price_feed,
        })
    }

    /// Stop the price feed and the engine.
    pub async fn shutdown(self) {
        self.price_feed.abort();
        self.engine.stop().await;
    }
}
