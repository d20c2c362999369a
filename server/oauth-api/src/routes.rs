use crate::{
    handlers::{auth, health, weather},
    middleware::require_bearer,
    server::OAuthApiServer,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Create health check routes
pub fn health_routes() -> Router<OAuthApiServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create token issuance routes
pub fn auth_routes() -> Router<OAuthApiServer> {
    Router::new().route("/Auth/token", post(auth::issue_token))
}

/// Create forecast routes; the secured ones require a bearer token
pub fn weather_routes(server: &OAuthApiServer) -> Router<OAuthApiServer> {
    let secured = Router::new()
        .route("/WeatherForecast/GetSecured", get(weather::get_secured))
        .route("/WeatherForecast/secured", get(weather::get_secured))
        .route_layer(from_fn_with_state(server.clone(), require_bearer));

    Router::new()
        .route("/WeatherForecast/Get1", get(weather::get1))
        .route("/WeatherForecast/Get2", get(weather::get2))
        .route("/WeatherForecast/public", get(weather::get1))
        .merge(secured)
}

pub fn create_routes(server: &OAuthApiServer) -> Router<OAuthApiServer> {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(weather_routes(server))
}
