use serde_json::json;
use weather_now::config::LocationConfig;
use weather_now::consent::{ConsentFlags, ConsentStore};
use weather_now::location::IpGeolocator;
use weather_now::resolver::{LocationResolver, ResolverAction, ResolverState};
use weather_now::storage::SqliteStore;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn geolocator(service_url: String) -> IpGeolocator {
    IpGeolocator::from_config(&LocationConfig {
        service_url,
        timeout_seconds: 5,
        ..LocationConfig::default()
    })
    .expect("geolocation is enabled")
}

fn stored_flags(db: &std::path::Path) -> ConsentFlags {
    ConsentStore::new(Box::new(SqliteStore::open(db).unwrap()))
        .get_consent_state()
        .unwrap()
}

#[tokio::test]
async fn unreachable_service_ends_in_denied() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("consent.db");
    let mut resolver =
        LocationResolver::new(ConsentStore::new(Box::new(SqliteStore::open(&db).unwrap())), true);

    resolver.start();
    let request = match resolver.accept_prompt() {
        ResolverAction::RequestPosition(id) => id,
        other => panic!("expected a position request, got {:?}", other),
    };

    let result = geolocator(format!("http://{}/json", addr)).current_position().await;
    assert!(result.is_err());

    assert_eq!(resolver.on_position(request, result), ResolverAction::Nothing);
    assert_eq!(resolver.state(), ResolverState::Denied);
    assert!(!resolver.is_locating());
    drop(resolver);

    assert_eq!(
        stored_flags(&db),
        ConsentFlags { prompt_shown: true, denied: true }
    );
}

#[tokio::test]
async fn located_position_drives_coordinate_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "lat": 59.9139,
            "lon": 10.7522
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("consent.db");
    let mut resolver =
        LocationResolver::new(ConsentStore::new(Box::new(SqliteStore::open(&db).unwrap())), true);

    resolver.start();
    let request = match resolver.accept_prompt() {
        ResolverAction::RequestPosition(id) => id,
        other => panic!("expected a position request, got {:?}", other),
    };

    let result = geolocator(format!("{}/json", server.uri())).current_position().await;
    match resolver.on_position(request, result) {
        ResolverAction::QueryChanged(query) => {
            assert_eq!(query.value, "59.9139,10.7522");
            assert!(query.is_coordinates);
        }
        other => panic!("expected a coordinate query, got {:?}", other),
    }
    assert_eq!(resolver.state(), ResolverState::UsingCoordinates);
    drop(resolver);

    assert_eq!(
        stored_flags(&db),
        ConsentFlags { prompt_shown: true, denied: false }
    );
}
