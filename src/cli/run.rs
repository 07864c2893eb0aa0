//! Handler for the `run` command.

use tokio::signal;
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::bootstrap::PaperRuntime;
use crate::infrastructure::Config;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load_unchecked(&args.config)?;

    // Apply CLI overrides
    if let Some(ref symbol) = args.symbol {
        config.guardian.symbol = symbol.trim().to_string();
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(position) = args.position {
        config.paper.position = position;
    }
    if let Some(entry_price) = args.entry_price {
        config.paper.entry_price = entry_price;
    }
    config.validate()?;

    config.init_logging();
    info!(
        symbol = %config.guardian.symbol,
        stop_distance = ?config.guardian.stop_distance,
        trailing = config.guardian.trailing.is_some(),
        "guardian starting"
    );

    let runtime = PaperRuntime::start(&config).await?;
    let mut updates = runtime.engine.updates();
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                debug!(
                    version = snapshot.version,
                    status = %snapshot.guard_status,
                    price = ?snapshot.last_price,
                    position = %snapshot.position.amount,
                    pnl = %snapshot.pnl,
                    "Snapshot"
                );
            }
        }
    }

    runtime.shutdown().await;
    info!("guardian stopped");
    Ok(())
}
