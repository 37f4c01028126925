use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use pizza_store::models::NewRestaurantPizza;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::json::PrettyJson;
use crate::models::*;
use crate::serializer::serialize_restaurant_pizza_detail;

use super::{with_store, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/restaurant_pizzas", post(create_restaurant_pizza))
}

#[utoipa::path(
    post,
    path = "/restaurant_pizzas",
    request_body = CreateRestaurantPizzaRequest,
    responses(
        (status = 201, description = "Price row created", body = RestaurantPizzaDetail),
        (status = 400, description = "Invalid price, unknown pizza or restaurant, or malformed body", body = ValidationErrorResponse),
    ),
    tag = "restaurant_pizzas"
)]
#[instrument(skip(state, payload))]
pub async fn create_restaurant_pizza(
    State(state): State<AppState>,
    payload: Result<Json<CreateRestaurantPizzaRequest>, JsonRejection>,
) -> Result<(StatusCode, PrettyJson<RestaurantPizzaDetail>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!(%rejection, "rejected request body");
        ApiError::Validation
    })?;

    let new_restaurant_pizza = NewRestaurantPizza {
        price: payload.price,
        pizza_id: payload.pizza_id,
        restaurant_id: payload.restaurant_id,
    };

    let detail = with_store(&state, move |store| {
        let (restaurant_pizza, pizza, restaurant) =
            store.insert_restaurant_pizza(new_restaurant_pizza)?;
        Ok(serialize_restaurant_pizza_detail(
            &restaurant_pizza,
            &pizza,
            &restaurant,
        ))
    })
    .await?;
    info!(id = detail.id, price = detail.price, "restaurant pizza created");

    Ok((StatusCode::CREATED, PrettyJson(detail)))
}
