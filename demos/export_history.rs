//! Export measurement history to CSV
//!
//! Run with: cargo run --example export_history

use std::fs::File;

use bodyscale_ble::{export_csv, PersistenceGateway, Result, SqliteStore};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let store = SqliteStore::open("weights.db")?;

    let user = match store.profile()? {
        Some(user) => user,
        None => {
            println!("No profile saved yet; nothing to export.");
            return Ok(());
        }
    };

    let records = store.recent_measurements(user.id, 1000)?;
    println!("Exporting {} measurements for {}", records.len(), user.profile.name);

    let mut file = File::create("history.csv")?;
    export_csv(&mut file, &records)?;

    println!("Wrote history.csv");
    Ok(())
}
