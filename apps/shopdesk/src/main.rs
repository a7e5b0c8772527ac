//! # ShopDesk
//!
//! Headless entry point: loads the config, opens the database and prints the
//! sales and customer dashboards.
//!
//! ## Usage
//! ```bash
//! shopdesk                      # default config location
//! shopdesk --config ./shop.toml
//! RUST_LOG=debug shopdesk       # verbose logging
//! ```

use std::path::PathBuf;

use tracing::{error, info};

use shopdesk::config::ShopConfig;
use shopdesk::{init_tracing, App};
use shopdesk_core::order::SalesPeriod;

#[tokio::main]
async fn main() {
    init_tracing();

    let config_path = parse_config_arg();
    let config = match ShopConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = match App::bootstrap(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    info!(store = %app.config.store_name, "ShopDesk ready");

    for period in [SalesPeriod::Today, SalesPeriod::ThisMonth] {
        match app.pos.sales_stats(period).await {
            Ok(stats) => info!(
                ?period,
                orders = stats.total_sales,
                revenue = %app.config.format_currency(stats.total_revenue.minor()),
                items = stats.total_items,
                "Sales"
            ),
            Err(e) => error!(?period, "Failed to load sales stats: {}", e),
        }
    }

    match app.customers.stats().await {
        Ok(stats) => info!(
            total = stats.total,
            unread = stats.unread,
            gold = stats.gold,
            platinum = stats.platinum,
            "Customers"
        ),
        Err(e) => error!("Failed to load customer stats: {}", e),
    }
}

/// `--config <path>` / `-c <path>`.
fn parse_config_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => {
                return Some(PathBuf::from(&args[i + 1]));
            }
            _ => i += 1,
        }
    }
    None
}
