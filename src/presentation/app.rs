use crate::domain::models::LoopExit;
use crate::domain::settings::{HubSettings, Settings};
use crate::infrastructure::bluetooth::connection::HubLink;
use crate::infrastructure::bluetooth::{CommandTiming, TrainHub};
use crate::infrastructure::shutdown::{self, Signal};
use crate::presentation::keyboard::KeyReader;
use crate::presentation::{console, controls};
use crossterm::event::KeyEvent;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Connect to the hub, drive it from the keyboard, and always try to stop it on the way out
pub async fn run(settings: &Settings) -> anyhow::Result<LoopExit> {
    let mut hub: TrainHub = TrainHub::new(CommandTiming::from(&settings.hub));

    // One signal future for the whole session, so a signal that lands while
    // the hub is still connecting ends the control loop right away
    let interrupt = shutdown::interrupted();
    tokio::pin!(interrupt);

    let result = session(&mut hub, &settings.hub, interrupt.as_mut()).await;

    teardown(&mut hub).await;
    result
}

async fn session<F>(
    hub: &mut TrainHub,
    settings: &HubSettings,
    mut interrupt: Pin<&mut F>,
) -> anyhow::Result<LoopExit>
where
    F: Future<Output = Signal>,
{
    if !hub.connect(settings, interrupt.as_mut()).await? {
        return Ok(LoopExit::Interrupted);
    }

    console::print_banner();

    let (reader, mut keys) = KeyReader::spawn()?;
    let exit = drive(hub, &mut keys, settings.speed_step, interrupt).await;
    reader.shutdown();
    Ok(exit)
}

/// Feed key presses into the hub until one of them, or `interrupt`, ends the loop
pub async fn drive<L, F>(
    hub: &mut TrainHub<L>,
    keys: &mut mpsc::UnboundedReceiver<KeyEvent>,
    step: i32,
    interrupt: F,
) -> LoopExit
where
    L: HubLink,
    F: Future<Output = Signal>,
{
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            key = keys.recv() => match key {
                Some(key) => {
                    let action = controls::action_for_key(&key);
                    if let Some(exit) = controls::apply(hub, action, step).await {
                        info!("Leaving control loop: {:?}", exit);
                        return exit;
                    }
                }
                None => {
                    error!("Keyboard input closed");
                    return LoopExit::InputClosed;
                }
            },
            _ = &mut interrupt => return LoopExit::Interrupted,
        }
    }
}

/// Best-effort stop and disconnect
pub async fn teardown<L: HubLink>(hub: &mut TrainHub<L>) {
    if hub.is_connected() {
        match hub.stop().await {
            Ok(speed) => console::show_speed(speed),
            Err(e) => error!("Error stopping train: {}", e),
        }
        if let Err(e) = hub.disconnect().await {
            error!("Error disconnecting from hub: {}", e);
        }
        debug!("Hub state after teardown: {:?}", hub.state());
    }
    console::print_disconnected();
}
