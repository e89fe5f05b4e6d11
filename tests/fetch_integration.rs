use serde_json::json;
use weather_now::api::WeatherProvider;
use weather_now::config::ApiConfig;
use weather_now::error::FetchError;
use weather_now::location::LocationQuery;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> WeatherProvider {
    WeatherProvider::new(&ApiConfig {
        base_url: format!("{}/timeline", server.uri()),
        api_key: "test-key".into(),
        timeout_seconds: 5,
    })
    .expect("client should build")
}

fn timeline_body(hours: usize) -> serde_json::Value {
    let hours: Vec<_> = (0..hours)
        .map(|i| {
            json!({
                "datetime": format!("{:02}:00:00", i % 24),
                "temp": 10.0 + i as f64,
                "conditions": "Overcast",
                "humidity": 70.0
            })
        })
        .collect();
    json!({
        "resolvedAddress": "Paris, Île-de-France, France",
        "currentConditions": {
            "temp": 17.3,
            "conditions": "Overcast",
            "windspeed": 14.8,
            "humidity": 72.0
        },
        "days": [{ "hours": hours }]
    })
}

#[tokio::test]
async fn paris_search_hits_timeline_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timeline/Paris"))
        .and(query_param("unitGroup", "metric"))
        .and(query_param("key", "test-key"))
        .and(query_param("include", "hours,current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body(30)))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery::manual("Paris").unwrap();
    let snapshot = provider_for(&server).fetch_weather(&query).await.unwrap();

    assert_eq!(snapshot.resolved_address, "Paris, Île-de-France, France");
    assert_eq!(snapshot.current.temp, 17.3);
    assert_eq!(snapshot.hours.len(), 24);
    assert_eq!(snapshot.hours[0].temp, 10.0);
    assert_eq!(snapshot.hours[23].temp, 33.0);
}

#[tokio::test]
async fn coordinates_go_into_the_path_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/timeline/48.8566,2.3522"))
        .respond_with(ResponseTemplate::new(200).set_body_json(timeline_body(3)))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery {
        value: "48.8566,2.3522".into(),
        is_coordinates: true,
    };
    let snapshot = provider_for(&server).fetch_weather(&query).await.unwrap();
    assert_eq!(snapshot.hours.len(), 3);
}

#[tokio::test]
async fn server_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let query = LocationQuery::manual("Paris").unwrap();
    let err = provider_for(&server).fetch_weather(&query).await.unwrap_err();
    assert_eq!(err, FetchError::Status(500));
    assert_eq!(err.user_message(), "Could not load weather data.");
}

#[tokio::test]
async fn unauthorized_key_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("No account found with API key"))
        .mount(&server)
        .await;

    let query = LocationQuery::manual("Paris").unwrap();
    let err = provider_for(&server).fetch_weather(&query).await.unwrap_err();
    assert_eq!(err, FetchError::Status(401));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let query = LocationQuery::manual("Paris").unwrap();
    let err = provider_for(&server).fetch_weather(&query).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let provider = WeatherProvider::new(&ApiConfig {
        base_url: format!("{}/timeline", closed_port_url()),
        api_key: "test-key".into(),
        timeout_seconds: 5,
    })
    .expect("client should build");

    let query = LocationQuery::manual("Paris").unwrap();
    let err = provider.fetch_weather(&query).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "got {:?}", err);
}

// A loopback address nothing listens on: bind an ephemeral port, then free it.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
