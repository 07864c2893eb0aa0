//! Configuration validation command.

use std::path::Path;

use crate::domain::StopDistance;
use crate::error::Result;
use crate::infrastructure::Config;

/// Validate configuration file without starting the engine.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;
    let settings = config.settings();

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Symbol: {}", settings.symbol);
    match settings.risk.stop_distance {
        StopDistance::Percent(pct) => println!("  Stop distance: {pct} of entry"),
        StopDistance::MaxLoss(loss) => println!("  Stop distance: max loss {loss}"),
    }
    match settings.risk.trailing {
        Some(trailing) => println!(
            "  Trailing: arms at {} from entry, callback {}%",
            trailing.activation_pct, trailing.callback_rate
        ),
        None => println!("  Trailing: disabled"),
    }
    println!("  Price tolerance: {}", settings.price_tolerance);
    println!("  Price tick: {}", settings.risk.price_tick);
    println!(
        "  Safety net: every {}ms",
        settings.safety_net_interval.as_millis()
    );
    println!("  Adapter timeout: {}ms", settings.adapter_timeout.as_millis());
    if settings.open_order_resync_ticks == 0 {
        println!("  Open order resync: disabled");
    } else {
        println!(
            "  Open order resync: every {} safety-net ticks",
            settings.open_order_resync_ticks
        );
    }
    println!("  Trade log cap: {}", settings.trade_log_cap);
    println!();
    println!("Configuration is ready to use.");

    Ok(())
}
