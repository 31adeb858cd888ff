//! Event loop around a [`RefreshController`].
//!
//! [`run`] multiplexes three sources on a single task: host events from a channel, the scroll
//! debounce deadline, and refreshes suspended on the symbol provider. Refreshes are resolved
//! concurrently with new events, so a slow symbol provider never blocks input handling; results
//! that were superseded in the meantime are dropped by [`RefreshController::complete`].

use crate::controller::{FocusEvent, Reaction, RefreshController, ResolvedRefresh};
use crate::outcome::RefreshOutcome;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

type InFlight = FuturesUnordered<Pin<Box<dyn Future<Output = ResolvedRefresh>>>>;

/// Drive `controller` until [`FocusEvent::Shutdown`] arrives or the sender is dropped.
///
/// The style is disposed before returning. Every outcome is passed to `observe`, in the order it
/// happened.
pub async fn run<F>(
    mut controller: RefreshController,
    mut events: mpsc::Receiver<FocusEvent>,
    mut observe: F,
) where
    F: FnMut(&RefreshOutcome),
{
    let mut in_flight: InFlight = FuturesUnordered::new();

    let initial = controller.start();
    dispatch(initial, &mut in_flight, &mut observe);

    loop {
        let deadline = controller.deadline();
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::debug!("event channel closed");
                    break;
                };
                if event == FocusEvent::Shutdown {
                    break;
                }
                match controller.handle(event, Instant::now()) {
                    Ok(reaction) => dispatch(reaction, &mut in_flight, &mut observe),
                    Err(err) => tracing::error!(error = %err, "focus highlighting setup failed"),
                }
            }
            _ = async {
                if let Some(deadline) = deadline {
                    sleep_until(deadline).await;
                }
            }, if deadline.is_some() => {
                let reaction = controller.debounce_elapsed();
                dispatch(reaction, &mut in_flight, &mut observe);
            }
            Some(resolved) = in_flight.next(), if !in_flight.is_empty() => {
                let outcome = controller.complete(resolved);
                observe(&outcome);
            }
        }
    }

    controller.deactivate();
}

fn dispatch<F>(reaction: Reaction, in_flight: &mut InFlight, observe: &mut F)
where
    F: FnMut(&RefreshOutcome),
{
    match reaction {
        Reaction::Nothing => {}
        Reaction::Settled(outcome) => observe(&outcome),
        Reaction::Resolve(pending) => in_flight.push(Box::pin(pending.resolve())),
    }
}
