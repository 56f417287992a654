//! Example: Arm a partition stay, then disarm it again.

use std::time::Duration;

use qolsys_panel::{AlarmMode, ControllerEvent, PanelConfig, QolsysController};

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

    // Wait for readiness, then start live notifications
    loop {
        if let ControllerEvent::PanelReadyForOperation(true) = events.recv().await? {
            controller.start_operation().await?;
            break;
        }
    }

    println!("Arming partition 0 (stay, no exit delay, force-arm)...");
    controller
        .send_arm_command(AlarmMode::ArmStay, 0, 0, true)
        .await?;

    // Watch the partition walk through its transitions for a while
    let watch = tokio::time::sleep(Duration::from_secs(30));
    tokio::pin!(watch);
    loop {
        tokio::select! {
            event = events.recv() => {
                if let ControllerEvent::PartitionAlarmModeChange(partition) = event? {
                    println!("Partition {} -> {}", partition.id, partition.status());
                }
            }
            _ = &mut watch => break,
        }
    }

    println!("Disarming partition 0...");
    controller
        .send_arm_command(AlarmMode::Disarm, 0, 0, true)
        .await?;

    tokio::time::sleep(Duration::from_secs(3)).await;
    controller.disconnect().await;
    Ok(())
}
