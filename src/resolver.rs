//! The location resolver: decides which query drives the weather fetch and
//! runs the one-time geolocation consent flow.
//!
//! ```text
//!  Unresolved ──start──▶ PromptPending ──accept──▶ Locating ──ok──▶ UsingCoordinates
//!       │                  │      ▲                  │
//!       │               decline   └──── reset ────┐  └──err──▶ Denied
//!       │                  ▼                      │
//!       └─(denied before)─▶ Denied ───────────────┘
//! ```
//!
//! Manual search is independent of this graph: it replaces the query from any
//! state and never touches the persisted flags.

use crate::consent::{ConsentFlags, ConsentStore};
use crate::error::GeolocationError;
use crate::location::{LocationQuery, Position};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverState {
    #[default]
    Unresolved,
    PromptPending,
    Locating,
    UsingCoordinates,
    UsingManualSearch,
    Denied,
}

/// What the caller has to do after a resolver transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverAction {
    Nothing,
    /// Ask the geolocation capability for the current position and feed the
    /// outcome back through [`LocationResolver::on_position`] together with
    /// this request id.
    RequestPosition(u64),
    /// The active query changed; a new fetch is due.
    QueryChanged(LocationQuery),
}

// Tracks the single in-flight geolocation request by id. Answers for any
// other id are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Idle,
    Locating(u64),
    // A manual search arrived first; the answer only updates consent.
    Superseded(u64),
}

pub struct LocationResolver {
    consent: ConsentStore,
    geolocation_supported: bool,
    state: ResolverState,
    pending: Pending,
    last_request: u64,
    query: Option<LocationQuery>,
}

impl LocationResolver {
    pub fn new(consent: ConsentStore, geolocation_supported: bool) -> Self {
        Self {
            consent,
            geolocation_supported,
            state: ResolverState::Unresolved,
            pending: Pending::Idle,
            last_request: 0,
            query: None,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn query(&self) -> Option<&LocationQuery> {
        self.query.as_ref()
    }

    pub fn is_prompt_visible(&self) -> bool {
        self.state == ResolverState::PromptPending
    }

    pub fn is_locating(&self) -> bool {
        matches!(self.pending, Pending::Locating(_))
    }

    /// Reads the persisted consent flags and picks the initial state.
    pub fn start(&mut self) -> ResolverAction {
        let flags = match self.consent.get_consent_state() {
            Ok(flags) => flags,
            Err(e) => {
                warn!("Could not read consent flags: {}. Treating as first run.", e);
                ConsentFlags::default()
            }
        };
        debug!("Loaded consent flags {:?}", flags);

        if flags.needs_prompt() {
            self.state = ResolverState::PromptPending;
            ResolverAction::Nothing
        } else if flags.denied {
            self.state = ResolverState::Denied;
            ResolverAction::Nothing
        } else {
            info!("Location access granted previously, locating");
            self.begin_locating()
        }
    }

    pub fn accept_prompt(&mut self) -> ResolverAction {
        if self.state != ResolverState::PromptPending {
            return ResolverAction::Nothing;
        }
        info!("Location prompt accepted");
        self.begin_locating()
    }

    pub fn decline_prompt(&mut self) -> ResolverAction {
        if self.state != ResolverState::PromptPending {
            return ResolverAction::Nothing;
        }
        info!("Location prompt declined");
        self.state = ResolverState::Denied;
        self.persist(true, true);
        ResolverAction::Nothing
    }

    pub fn on_position(
        &mut self,
        request: u64,
        result: Result<Position, GeolocationError>,
    ) -> ResolverAction {
        match self.pending {
            Pending::Locating(id) | Pending::Superseded(id) if id == request => {}
            _ => {
                debug!("Ignoring stale position result #{}: {:?}", request, result);
                return ResolverAction::Nothing;
            }
        }

        let pending = std::mem::replace(&mut self.pending, Pending::Idle);
        match pending {
            Pending::Idle => ResolverAction::Nothing,
            Pending::Superseded(_) => {
                debug!("Position arrived after a manual search; recording consent only");
                match result {
                    Ok(_) => self.persist(true, false),
                    Err(_) => self.persist(true, true),
                }
                ResolverAction::Nothing
            }
            Pending::Locating(_) => match result {
                Ok(position) => {
                    self.state = ResolverState::UsingCoordinates;
                    self.persist(true, false);
                    self.set_query(LocationQuery::coordinates(position))
                }
                Err(e) => {
                    warn!("Geolocation permission denied or unavailable: {}", e);
                    self.state = ResolverState::Denied;
                    self.persist(true, true);
                    ResolverAction::Nothing
                }
            },
        }
    }

    /// "Try again": forget the stored answer and offer the prompt again.
    pub fn reset(&mut self) -> ResolverAction {
        info!("Resetting location consent");
        if let Err(e) = self.consent.reset_consent_state() {
            warn!("Could not clear consent flags: {}", e);
        }
        self.pending = Pending::Idle;
        self.state = ResolverState::PromptPending;
        ResolverAction::Nothing
    }

    pub fn submit_manual(&mut self, text: &str) -> ResolverAction {
        let query = match LocationQuery::manual(text) {
            Ok(q) => q,
            Err(e) => {
                debug!("Ignoring manual search: {}", e);
                return ResolverAction::Nothing;
            }
        };

        if let Pending::Locating(id) = self.pending {
            self.pending = Pending::Superseded(id);
        }
        // Denied keeps its banner so "try again" stays reachable.
        if self.state != ResolverState::Denied {
            self.state = ResolverState::UsingManualSearch;
        }
        self.set_query(query)
    }

    fn begin_locating(&mut self) -> ResolverAction {
        self.last_request += 1;
        let request = self.last_request;
        self.pending = Pending::Locating(request);
        if !self.geolocation_supported {
            return self.on_position(request, Err(GeolocationError::Unavailable));
        }
        self.state = ResolverState::Locating;
        ResolverAction::RequestPosition(request)
    }

    fn set_query(&mut self, query: LocationQuery) -> ResolverAction {
        if self.query.as_ref() == Some(&query) {
            return ResolverAction::Nothing;
        }
        info!("Location query set to '{}'", query.value);
        self.query = Some(query.clone());
        ResolverAction::QueryChanged(query)
    }

    fn persist(&mut self, shown: bool, denied: bool) {
        if let Err(e) = self.consent.set_consent_state(shown, denied) {
            warn!("Could not persist consent flags: {}", e);
        }
    }
}
