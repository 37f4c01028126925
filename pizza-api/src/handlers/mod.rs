pub mod pizza;
pub mod restaurant;
pub mod restaurant_pizza;

use std::sync::Arc;

use axum::{response::Html, routing::get, Json, Router};
use pizza_store::{establish_connection, PizzaStore};
use utoipa::OpenApi;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub database_url: Arc<str>,
}

impl AppState {
    pub fn new(database_url: impl Into<Arc<str>>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api-docs/openapi.json", get(openapi))
        .merge(restaurant::router())
        .merge(pizza::router())
        .merge(restaurant_pizza::router())
}

async fn index() -> Html<&'static str> {
    Html("<h1>Code challenge</h1>")
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Runs `f` against a fresh connection on the blocking pool.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut PizzaStore<'_>) -> Result<T, ApiError> + Send + 'static,
{
    let database_url = state.database_url.clone();
    tokio::task::spawn_blocking(move || {
        let conn = &mut establish_connection(&database_url)?;
        f(&mut PizzaStore::new(conn))
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("store task failed: {e}")))?
}

/// Only plain decimal digits name a row; signs and whitespace do not.
fn parse_id(raw: &str, not_found: &'static str) -> Result<i32, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound(not_found));
    }
    raw.parse().map_err(|_| ApiError::NotFound(not_found))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        restaurant::list_restaurants,
        restaurant::get_restaurant,
        restaurant::delete_restaurant,
        pizza::list_pizzas,
        restaurant_pizza::create_restaurant_pizza,
    ),
    components(
        schemas(
            crate::models::RestaurantSummary,
            crate::models::RestaurantDetail,
            crate::models::PizzaSummary,
            crate::models::PizzaDetail,
            crate::models::RestaurantPizzaWithPizza,
            crate::models::RestaurantPizzaWithRestaurant,
            crate::models::RestaurantPizzaDetail,
            crate::models::CreateRestaurantPizzaRequest,
            crate::models::ApiErrorResponse,
            crate::models::ValidationErrorResponse
        )
    ),
    tags(
        (name = "restaurants", description = "Restaurant endpoints"),
        (name = "pizzas", description = "Pizza endpoints"),
        (name = "restaurant_pizzas", description = "Pizza prices per restaurant")
    ),
    info(
        title = "Pizza Restaurants API",
        description = "Restaurants, pizzas and the prices restaurants charge for them",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::parse_id;
    use crate::error::ApiError;
    use crate::test_support::TestApp;

    #[test]
    fn test_parse_id_accepts_only_digits() {
        assert_eq!(parse_id("5", "missing").unwrap(), 5);
        assert_eq!(parse_id("007", "missing").unwrap(), 7);
        for raw in ["+5", "-5", " 5", "5 ", "", "abc", "99999999999"] {
            assert!(
                matches!(parse_id(raw, "missing"), Err(ApiError::NotFound("missing"))),
                "{raw:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_index_is_html() {
        let app = TestApp::new();
        let response = app.get("/").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.content_type.starts_with("text/html"));
        assert_eq!(response.text(), "<h1>Code challenge</h1>");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let app = TestApp::new();
        let response = app.get("/api-docs/openapi.json").await;

        assert_eq!(response.status, StatusCode::OK);
        let document = response.json();
        let paths = &document["paths"];
        assert!(paths.get("/restaurants").is_some());
        assert!(paths.get("/restaurants/{id}").is_some());
        assert!(paths.get("/pizzas").is_some());
        assert!(paths.get("/restaurant_pizzas").is_some());
    }
}
