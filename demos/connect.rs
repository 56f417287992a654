//! Example: Connect to a panel and dump the partition/zone roster.

use qolsys_panel::{ControllerEvent, PanelConfig, QolsysController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = PanelConfig::builder()
        .host(std::env::var("QOLSYS_HOST").unwrap_or_else(|_| "192.168.0.100".to_string()))
        .port(14999)
        .secure_token(std::env::var("QOLSYS_TOKEN").unwrap_or_default())
        .user_pin_code(std::env::var("QOLSYS_PIN").unwrap_or_default())
        .build();

    let mut controller = QolsysController::new(config);
    let mut events = controller.subscribe();

    println!("Connecting to panel...");
    controller.connect().await?;

    // Wait for the first summary to be ingested
    loop {
        match events.recv().await? {
            ControllerEvent::PanelReadyForOperation(true) => break,
            ControllerEvent::ControllerError { kind, message } => {
                eprintln!("{kind}: {message}");
            }
            _ => {}
        }
    }

    let partitions = controller.partitions().await;
    let zones = controller.zones().await;

    println!("\n--- Partitions ({}) ---", partitions.len());
    let mut part_ids: Vec<_> = partitions.keys().copied().collect();
    part_ids.sort_unstable();
    for id in &part_ids {
        let part = &partitions[id];
        println!(
            "  Partition {:2}: {:20} status={} secure_arm={}",
            part.id,
            part.name,
            part.status(),
            part.secure_arm,
        );
    }

    println!("\n--- Zones ({}) ---", zones.len());
    let mut zone_ids: Vec<_> = zones.keys().copied().collect();
    zone_ids.sort_unstable();
    for id in &zone_ids {
        let zone = &zones[id];
        println!(
            "  Zone {:3}: {:24} type={} status={} partition={}",
            zone.zone_id,
            zone.name,
            zone.zone_type(),
            zone.status(),
            zone.partition_id,
        );
    }

    println!("\nPress Ctrl+C to disconnect...");
    tokio::signal::ctrl_c().await?;
    controller.disconnect().await;
    println!("Disconnected.");

    Ok(())
}
