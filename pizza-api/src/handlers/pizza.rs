use axum::{extract::State, routing::get, Router};
use tracing::instrument;

use crate::error::ApiError;
use crate::json::PrettyJson;
use crate::models::*;
use crate::serializer::serialize_pizza_summary;

use super::{with_store, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/pizzas", get(list_pizzas))
}

#[utoipa::path(
    get,
    path = "/pizzas",
    responses(
        (status = 200, description = "Pizzas without their restaurants", body = [PizzaSummary]),
    ),
    tag = "pizzas"
)]
#[instrument(skip(state))]
pub async fn list_pizzas(
    State(state): State<AppState>,
) -> Result<PrettyJson<Vec<PizzaSummary>>, ApiError> {
    let pizzas = with_store(&state, |store| Ok(store.list_pizzas()?)).await?;

    Ok(PrettyJson(pizzas.iter().map(serialize_pizza_summary).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_list_pizzas_is_flat() {
        let app = TestApp::seeded();
        let response = app.get("/pizzas").await;

        assert_eq!(response.status, StatusCode::OK);
        let pizzas = response.json();
        let pizzas = pizzas.as_array().unwrap();
        assert_eq!(pizzas.len(), 3);
        for pizza in pizzas {
            assert_eq!(pizza.as_object().unwrap().len(), 3);
            assert!(pizza.get("restaurant_pizzas").is_none());
            assert!(pizza["ingredients"].is_string());
        }
    }

    #[tokio::test]
    async fn test_list_pizzas_empty() {
        let app = TestApp::new();
        let response = app.get("/pizzas").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), serde_json::json!([]));
    }
}
