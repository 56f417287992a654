//! Example: Stream live zone and partition notifications.

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
    controller.connect().await?;

    println!("Watching for events. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            event = events.recv() => match event? {
                ControllerEvent::PanelReadyForOperation(true) => {
                    println!("Panel ready, starting notifications");
                    controller.start_operation().await?;
                }
                ControllerEvent::PanelReceivingNotification(receiving) => {
                    println!("Receiving notifications: {receiving}");
                }
                ControllerEvent::ZoneStatusChange(zone) => {
                    println!(
                        "Zone {:3} ({}) -> {}",
                        zone.zone_id,
                        zone.name,
                        zone.status()
                    );
                }
                ControllerEvent::PartitionAlarmModeChange(partition) => {
                    println!(
                        "Partition {} ({}) -> {} (was {})",
                        partition.id,
                        partition.name,
                        partition.status(),
                        partition.previous_status()
                    );
                }
                ControllerEvent::ControllerError { kind, message } => {
                    eprintln!("{kind}: {message}");
                }
                _ => {}
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.disconnect().await;
    Ok(())
}
