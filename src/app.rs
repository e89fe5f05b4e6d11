use crate::error::{FetchError, GeolocationError};
use crate::fetcher::{FetchTicket, WeatherFetcher};
use crate::location::Position;
use crate::models::WeatherSnapshot;
use crate::resolver::{LocationResolver, ResolverAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// Side effects requested by the state machine; `main` runs them as tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Locate the device; the answer comes back tagged with this request id.
    RequestPosition(u64),
    FetchWeather(FetchTicket),
}

// Which widget receives key presses.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum Focus {
    #[default]
    Search,
    Panel,
}

pub struct App {
    pub resolver: LocationResolver,
    pub fetcher: WeatherFetcher,
    pub input: String,
    pub focus: Focus,
    pub tick_count: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(resolver: LocationResolver) -> Self {
        Self {
            resolver,
            fetcher: WeatherFetcher::new(),
            input: String::new(),
            focus: Focus::Search,
            tick_count: 0,
            should_quit: false,
        }
    }

    /// Runs the on-load part of the consent flow.
    pub fn start(&mut self) -> Option<Effect> {
        let action = self.resolver.start();
        if self.resolver.is_prompt_visible() {
            self.focus = Focus::Panel;
        }
        self.apply(action)
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Panel => self.handle_panel_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Enter => {
                let action = self.resolver.submit_manual(&self.input);
                self.apply(action)
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Esc | KeyCode::Tab => {
                self.focus = Focus::Panel;
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_panel_key(&mut self, key: KeyEvent) -> Option<Effect> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab | KeyCode::Char('/') => {
                self.focus = Focus::Search;
                None
            }
            KeyCode::Char('y') if self.resolver.is_prompt_visible() => {
                self.focus = Focus::Search;
                let action = self.resolver.accept_prompt();
                self.apply(action)
            }
            KeyCode::Char('n') if self.resolver.is_prompt_visible() => {
                self.focus = Focus::Search;
                let action = self.resolver.decline_prompt();
                self.apply(action)
            }
            KeyCode::Char('t') => {
                let action = self.resolver.reset();
                self.apply(action)
            }
            KeyCode::Char('r') => self.fetcher.refresh().map(Effect::FetchWeather),
            _ => None,
        }
    }

    pub fn on_position(
        &mut self,
        request: u64,
        result: Result<Position, GeolocationError>,
    ) -> Option<Effect> {
        let action = self.resolver.on_position(request, result);
        self.apply(action)
    }

    pub fn on_weather(&mut self, generation: u64, result: Result<WeatherSnapshot, FetchError>) {
        self.fetcher.complete(generation, result);
    }

    fn apply(&mut self, action: ResolverAction) -> Option<Effect> {
        match action {
            ResolverAction::Nothing => None,
            ResolverAction::RequestPosition(request) => Some(Effect::RequestPosition(request)),
            ResolverAction::QueryChanged(query) => {
                debug!("Query changed, fetching weather");
                Some(Effect::FetchWeather(self.fetcher.begin(query)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::{ConsentStore, DENIED_KEY, PROMPT_SHOWN_KEY};
    use crate::fetcher::FetchState;
    use crate::location::LocationQuery;
    use crate::resolver::ResolverState;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn app_with(flags: &[(&str, &str)]) -> App {
        let mut mem = MemoryStore::new();
        for (k, v) in flags {
            mem.set(k, v).unwrap();
        }
        App::new(LocationResolver::new(ConsentStore::new(Box::new(mem)), true))
    }

    fn press(app: &mut App, code: KeyCode) -> Option<Effect> {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn denied_app() -> App {
        let mut app = app_with(&[(PROMPT_SHOWN_KEY, "true"), (DENIED_KEY, "true")]);
        assert_eq!(app.start(), None);
        app
    }

    #[test]
    fn typing_paris_and_enter_fetches_paris() {
        let mut app = denied_app();
        type_text(&mut app, "Paris");
        let effect = press(&mut app, KeyCode::Enter);

        match effect {
            Some(Effect::FetchWeather(ticket)) => {
                assert_eq!(ticket.query, LocationQuery::manual("Paris").unwrap());
            }
            other => panic!("expected a fetch, got {:?}", other),
        }
        assert_eq!(app.fetcher.state(), &FetchState::Loading);
    }

    #[test]
    fn whitespace_enter_does_nothing() {
        let mut app = denied_app();
        type_text(&mut app, "   ");
        assert_eq!(press(&mut app, KeyCode::Enter), None);
        assert_eq!(app.fetcher.state(), &FetchState::Idle);
        assert!(app.resolver.query().is_none());
    }

    #[test]
    fn backspace_edits_input() {
        let mut app = denied_app();
        type_text(&mut app, "Romx");
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "e");
        assert_eq!(app.input, "Rome");
    }

    #[test]
    fn prompt_takes_focus_on_first_run() {
        let mut app = app_with(&[]);
        app.start();
        assert_eq!(app.focus, Focus::Panel);
        assert!(app.resolver.is_prompt_visible());
    }

    #[test]
    fn accepting_prompt_requests_position_then_fetches() {
        let mut app = app_with(&[]);
        app.start();
        let request = match press(&mut app, KeyCode::Char('y')) {
            Some(Effect::RequestPosition(id)) => id,
            other => panic!("expected a position request, got {:?}", other),
        };

        let effect = app.on_position(request, Ok(Position {
            latitude: 35.6762,
            longitude: 139.6503,
        }));
        match effect {
            Some(Effect::FetchWeather(ticket)) => {
                assert_eq!(ticket.query.value, "35.6762,139.6503");
                assert!(ticket.query.is_coordinates);
            }
            other => panic!("expected a fetch, got {:?}", other),
        }
    }

    #[test]
    fn denied_geolocation_does_not_fetch() {
        let mut app = app_with(&[]);
        app.start();
        let request = match press(&mut app, KeyCode::Char('y')) {
            Some(Effect::RequestPosition(id)) => id,
            other => panic!("expected a position request, got {:?}", other),
        };
        let effect = app.on_position(request, Err(GeolocationError::Denied("blocked".into())));

        assert_eq!(effect, None);
        assert_eq!(app.resolver.state(), ResolverState::Denied);
        assert_eq!(app.fetcher.state(), &FetchState::Idle);
        assert_eq!(app.focus, Focus::Search);

        type_text(&mut app, "Oslo");
        assert!(matches!(press(&mut app, KeyCode::Enter), Some(Effect::FetchWeather(_))));
    }

    #[test]
    fn try_again_shows_prompt() {
        let mut app = denied_app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('t'));
        assert!(app.resolver.is_prompt_visible());
    }

    #[test]
    fn refresh_issues_new_generation() {
        let mut app = denied_app();
        type_text(&mut app, "Paris");
        let first = match press(&mut app, KeyCode::Enter) {
            Some(Effect::FetchWeather(t)) => t,
            other => panic!("expected a fetch, got {:?}", other),
        };

        // Same query again: no refetch.
        assert_eq!(press(&mut app, KeyCode::Enter), None);

        press(&mut app, KeyCode::Esc);
        match press(&mut app, KeyCode::Char('r')) {
            Some(Effect::FetchWeather(t)) => {
                assert_eq!(t.query, first.query);
                assert!(t.generation > first.generation);
            }
            other => panic!("expected a refresh, got {:?}", other),
        }
    }

    #[test]
    fn letters_in_search_are_not_commands() {
        let mut app = denied_app();
        type_text(&mut app, "qrt");
        assert!(!app.should_quit);
        assert_eq!(app.input, "qrt");
        assert_eq!(app.resolver.state(), ResolverState::Denied);
    }

    #[test]
    fn ctrl_c_quits_from_search() {
        let mut app = denied_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn server_error_shows_error_state() {
        let mut app = denied_app();
        type_text(&mut app, "Paris");
        let ticket = match press(&mut app, KeyCode::Enter) {
            Some(Effect::FetchWeather(t)) => t,
            other => panic!("expected a fetch, got {:?}", other),
        };
        app.on_weather(ticket.generation, Err(FetchError::Status(500)));
        assert!(matches!(app.fetcher.state(), FetchState::Error(_)));
        assert!(app.fetcher.snapshot().is_none());
    }
}
