//! One-shot weigh-in example
//!
//! Run with: cargo run --example weigh_once

use std::sync::Arc;
use std::time::Duration;

use bodyscale_ble::{
    BmiCategory, FirstDiscovered, PersistenceGateway, Result, ScaleManager, SqliteStore,
    UserProfile,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Weigh-In");
    println!("========\n");

    let store = Arc::new(SqliteStore::open("weights.db")?);

    // Save a profile on first run; BMI needs a height.
    if store.profile()?.is_none() {
        store.save_profile(&UserProfile::new("Alex", 180).with_target(75.0))?;
        println!("Saved default profile (Alex, 180 cm)\n");
    }

    let manager = ScaleManager::new(store.clone()).await?;

    println!("Step on the scale...\n");

    // The library imposes no deadline of its own; wrap the whole
    // locate/negotiate/subscribe sequence in one here.
    let record = tokio::time::timeout(
        Duration::from_secs(60),
        manager.weigh_once(&FirstDiscovered),
    )
    .await
    .map_err(|_| bodyscale_ble::Error::ConnectionFailed {
        reason: "no measurement within 60s".to_string(),
    })??;

    let category = BmiCategory::from_bmi(record.bmi);
    println!("Weight: {:.1} kg", record.weight_kg);
    println!("BMI:    {:.1} ({})", record.bmi, category.label());

    println!("\nRecent history:");
    for entry in store.recent_measurements(record.user_id, 5)? {
        println!(
            "  {}  {:.1} kg  BMI {:.1}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.weight_kg,
            entry.bmi
        );
    }

    Ok(())
}
