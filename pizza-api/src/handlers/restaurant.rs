use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use pizza_store::StoreError;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::json::PrettyJson;
use crate::models::*;
use crate::serializer::{serialize_restaurant_detail, serialize_restaurant_summary};

use super::{parse_id, with_store, AppState};

const RESTAURANT_NOT_FOUND: &str = "Restaurant not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", get(list_restaurants))
        .route(
            "/restaurants/{id}",
            get(get_restaurant).delete(delete_restaurant),
        )
}

fn restaurant_not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::NotFound(RESTAURANT_NOT_FOUND),
        other => other.into(),
    }
}

#[utoipa::path(
    get,
    path = "/restaurants",
    responses(
        (status = 200, description = "Restaurants without their pizzas", body = [RestaurantSummary]),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<PrettyJson<Vec<RestaurantSummary>>, ApiError> {
    let restaurants = with_store(&state, |store| Ok(store.list_restaurants()?)).await?;

    Ok(PrettyJson(
        restaurants.iter().map(serialize_restaurant_summary).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    responses(
        (status = 200, description = "Restaurant with its pizzas", body = RestaurantDetail),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<PrettyJson<RestaurantDetail>, ApiError> {
    let restaurant_id = parse_id(&id, RESTAURANT_NOT_FOUND)?;

    let detail = with_store(&state, move |store| {
        let restaurant = store
            .get_restaurant(restaurant_id)
            .map_err(restaurant_not_found)?;
        let restaurant_pizzas = store.restaurant_pizzas_of(&restaurant)?;
        Ok(serialize_restaurant_detail(&restaurant, &restaurant_pizzas))
    })
    .await?;

    Ok(PrettyJson(detail))
}

#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    responses(
        (status = 204, description = "Restaurant and its pizza prices deleted"),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = i32, Path, description = "Restaurant ID")
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let restaurant_id = parse_id(&id, RESTAURANT_NOT_FOUND)?;

    let removed_prices = with_store(&state, move |store| {
        store
            .delete_restaurant(restaurant_id)
            .map_err(restaurant_not_found)
    })
    .await?;
    info!(restaurant_id, removed_prices, "restaurant deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_list_restaurants_is_flat() {
        let app = TestApp::seeded();
        let response = app.get("/restaurants").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.content_type.starts_with("application/json"));
        let restaurants = response.json();
        let restaurants = restaurants.as_array().unwrap();
        assert_eq!(restaurants.len(), 3);
        for restaurant in restaurants {
            let keys: Vec<_> = restaurant.as_object().unwrap().keys().cloned().collect();
            assert_eq!(keys.len(), 3);
            assert!(restaurant.get("restaurant_pizzas").is_none());
            assert!(restaurant["id"].is_i64());
            assert!(restaurant["name"].is_string());
            assert!(restaurant["address"].is_string());
        }
    }

    #[tokio::test]
    async fn test_get_restaurant_with_pizzas() {
        let app = TestApp::seeded();
        let restaurant_id = app.first_restaurant_id().await;

        let response = app.get(&format!("/restaurants/{restaurant_id}")).await;

        assert_eq!(response.status, StatusCode::OK);
        let body = response.json();
        assert_eq!(body["id"], restaurant_id);
        let restaurant_pizzas = body["restaurant_pizzas"].as_array().unwrap();
        assert_eq!(restaurant_pizzas.len(), 1);
        let restaurant_pizza = &restaurant_pizzas[0];
        assert_eq!(restaurant_pizza["restaurant_id"], restaurant_id);
        assert_eq!(restaurant_pizza["pizza"]["id"], restaurant_pizza["pizza_id"]);
        assert!(restaurant_pizza["pizza"].get("restaurant_pizzas").is_none());
        assert!(restaurant_pizza.get("restaurant").is_none());
    }

    #[tokio::test]
    async fn test_get_restaurant_not_found() {
        let app = TestApp::seeded();

        for uri in ["/restaurants/0", "/restaurants/9999", "/restaurants/abc"] {
            let response = app.get(uri).await;
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(response.json(), json!({"error": "Restaurant not found"}));
        }

        let restaurant_id = app.first_restaurant_id().await;
        for uri in [
            format!("/restaurants/+{restaurant_id}"),
            format!("/restaurants/{restaurant_id}.0"),
        ] {
            let response = app.get(&uri).await;
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
            let response = app.delete(&uri).await;
            assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        }
        let response = app.get(&format!("/restaurants/{restaurant_id}")).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_restaurant_cascades() {
        let app = TestApp::seeded();
        let restaurant_id = app.first_restaurant_id().await;

        let response = app.delete(&format!("/restaurants/{restaurant_id}")).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_empty());

        let response = app.get(&format!("/restaurants/{restaurant_id}")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({"error": "Restaurant not found"}));

        assert_eq!(app.count_restaurant_pizzas_for(restaurant_id), 0);
        assert_eq!(app.get("/restaurants").await.json().as_array().unwrap().len(), 2);
        assert_eq!(app.get("/pizzas").await.json().as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_restaurant_not_found() {
        let app = TestApp::seeded();

        let response = app.delete("/restaurants/9999").await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({"error": "Restaurant not found"}));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let app = TestApp::seeded();
        let restaurant_id = app.first_restaurant_id().await;
        let uri = format!("/restaurants/{restaurant_id}");

        let first = app.get(&uri).await;
        let second = app.get(&uri).await;
        assert_eq!(first.body, second.body);

        for uri in ["/restaurants", "/pizzas"] {
            let first = app.get(uri).await;
            let second = app.get(uri).await;
            assert_eq!(first.body, second.body, "{uri}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_racing_price_insert() {
        let app = TestApp::seeded();
        let restaurant_id = app.first_restaurant_id().await;
        let pizza_id = app.first_pizza_id().await;
        let uri = format!("/restaurants/{restaurant_id}");
        let body =
            json!({"price": 9, "pizza_id": pizza_id, "restaurant_id": restaurant_id}).to_string();

        let (deleted, created) = tokio::join!(
            app.delete(&uri),
            app.post_json("/restaurant_pizzas", body)
        );

        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        assert!(
            created.status == StatusCode::CREATED || created.status == StatusCode::BAD_REQUEST,
            "{}",
            created.status
        );
        assert_eq!(app.get(&uri).await.status, StatusCode::NOT_FOUND);
        assert_eq!(app.count_restaurant_pizzas_for(restaurant_id), 0);
    }
}
