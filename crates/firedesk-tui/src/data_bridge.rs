//! Data bridge: starts the console pollers and forwards every
//! [`ConsoleUpdate`] into the TUI action loop.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use firedesk_core::{Console, ConsoleUpdate};

use crate::action::{Action, Notification};

/// Runs until `cancel` fires, then stops the console's background tasks.
pub async fn run_data_bridge(console: Console, action_tx: mpsc::UnboundedSender<Action>, cancel: CancellationToken) {
    // Open the channel before start() so the first load is not lost.
    let mut updates = console.take_updates();
    let _ = action_tx.send(Action::Connection(*console.connection_state().borrow()));

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("data bridge cancelled during start-up");
            return;
        }
        () = console.start() => {}
    }
    info!(db = %console.store().describe(), "data bridge running");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            update = updates.recv() => {
                let Some(update) = update else { break };
                if action_tx.send(to_action(&console, update)).is_err() {
                    break;
                }
            }
        }
    }

    console.shutdown().await;
    debug!("data bridge shut down");
}

fn to_action(console: &Console, update: ConsoleUpdate) -> Action {
    match update {
        ConsoleUpdate::Objects(objects) => Action::ObjectsUpdated(objects),
        ConsoleUpdate::Alarms(snapshot) => Action::AlarmsUpdated(snapshot),
        ConsoleUpdate::NewFireAlarm(alarm) => Action::NewFireAlarm(alarm),
        // The batch only says something changed; panes filter the whole log.
        ConsoleUpdate::Events(_) => Action::EventsUpdated(console.events().events()),
        ConsoleUpdate::EventsReset => Action::EventsReset,
        ConsoleUpdate::Details(details) => Action::DetailsLoaded(details),
        ConsoleUpdate::Connection(state) => Action::Connection(state),
        ConsoleUpdate::Reconnected { target } => Action::Notify(Notification::success(format!("Перепідключено: {target}"))),
    }
}
