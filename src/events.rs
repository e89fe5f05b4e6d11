//! Event types and the input/tick driver for the event loop.
//!
//! [`EventHandler`] owns a background task that polls crossterm for key
//! presses and emits periodic [`Event::Tick`]s. Geolocation and weather tasks
//! post their results through a clone of [`EventHandler::tx`].

use crate::error::{FetchError, GeolocationError};
use crate::location::Position;
use crate::models::WeatherSnapshot;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick; drives the loading spinner.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Outcome of a geolocation request, tagged with the request id the
    /// resolver handed out.
    PositionResolved {
        request: u64,
        result: Result<Position, GeolocationError>,
    },
    /// Outcome of a weather fetch, tagged with the generation it was issued
    /// under.
    WeatherLoaded {
        generation: u64,
        result: Result<WeatherSnapshot, FetchError>,
    },
}

/// Multiplexes terminal input, ticks and task results into one stream.
pub struct EventHandler {
    /// Sender for posting events from spawned tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates the handler and spawns the input/tick task.
    ///
    /// The task polls crossterm with a timeout of `tick_rate_ms`. If reading
    /// the terminal fails the task logs the error and stops; the loop then
    /// only sees task results.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));

                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(Event::Input(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
