use color_eyre::Result;
use crossterm::{cursor, execute, terminal};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, error, info};
use weather_now::{
    api::WeatherProvider,
    app::{App, Effect},
    config::Config,
    consent::ConsentStore,
    error::GeolocationError,
    events::{Event, EventHandler},
    location::IpGeolocator,
    logging,
    resolver::LocationResolver,
    storage, ui,
};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard =
        logging::initialize_logging(logging::log_dir(std::env::var(logging::LOG_DIR_ENV).ok()));
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let geolocator = IpGeolocator::from_config(&config.location);
    let consent = ConsentStore::new(storage::open_or_memory(&config.storage.path));
    let mut app = App::new(LocationResolver::new(consent, geolocator.is_some()));

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut events = EventHandler::new(config.ui.tick_rate_ms);
    let mut runner = EffectRunner {
        tx: events.tx.clone(),
        provider: Arc::new(WeatherProvider::new(&config.api)?),
        geolocator,
        inflight_fetch: None,
    };

    if let Some(effect) = app.start() {
        runner.run(effect);
    }

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        let Some(event) = events.next().await else {
            break;
        };
        let effect = match event {
            Event::Tick => {
                app.on_tick();
                None
            }
            Event::Input(key) => app.handle_key(key),
            Event::PositionResolved { request, result } => app.on_position(request, result),
            Event::WeatherLoaded { generation, result } => {
                app.on_weather(generation, result);
                None
            }
        };
        if let Some(effect) = effect {
            runner.run(effect);
        }
    }

    info!("Shutting down");
    restore_terminal(&mut terminal)?;
    Ok(())
}

/// Spawns the tasks behind each [`Effect`] and routes their results back
/// into the event loop.
struct EffectRunner {
    tx: UnboundedSender<Event>,
    provider: Arc<WeatherProvider>,
    geolocator: Option<IpGeolocator>,
    inflight_fetch: Option<JoinHandle<()>>,
}

impl EffectRunner {
    fn run(&mut self, effect: Effect) {
        let tx = self.tx.clone();
        match effect {
            Effect::RequestPosition(request) => {
                let Some(geo) = self.geolocator.clone() else {
                    let result = Err(GeolocationError::Unavailable);
                    let _ = tx.send(Event::PositionResolved { request, result });
                    return;
                };
                // The lookup runs in its own task so that a panic inside it
                // still produces an answer and the spinner stops.
                tokio::spawn(async move {
                    let lookup = tokio::spawn(async move { geo.current_position().await });
                    let result = match lookup.await {
                        Ok(result) => result,
                        Err(e) => {
                            error!("Geolocation task #{} failed: {}", request, e);
                            Err(GeolocationError::Denied("geolocation task failed".to_string()))
                        }
                    };
                    let _ = tx.send(Event::PositionResolved { request, result });
                });
            }
            Effect::FetchWeather(ticket) => {
                // The generation check already drops stale results; aborting
                // just stops paying for them.
                if let Some(previous) = self.inflight_fetch.take() {
                    debug!("Aborting superseded fetch");
                    previous.abort();
                }
                let provider = Arc::clone(&self.provider);
                self.inflight_fetch = Some(tokio::spawn(async move {
                    let result = provider.fetch_weather(&ticket.query).await;
                    let _ = tx.send(Event::WeatherLoaded {
                        generation: ticket.generation,
                        result,
                    });
                }));
            }
        }
    }
}

fn setup_terminal() -> Result<Tui> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

// Leaves raw mode and the alternate screen. Shared by normal shutdown and the
// panic hook.
fn reset_terminal() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    reset_terminal()?;
    terminal.show_cursor()?;
    Ok(())
}

/// Panics on the UI thread restore the terminal before reporting. Panics in
/// worker tasks only get logged: the UI keeps running and the task's
/// `JoinHandle` reports the failure. Builds with `panic = "abort"` always
/// restore, since any panic ends the process there.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let fatal = cfg!(panic = "abort") || std::thread::current().name() == Some("main");
        if fatal {
            let _ = reset_terminal();
            original_hook(panic_info);
        } else {
            error!("Background task panicked: {}", panic_info);
        }
    }));
}
