use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantSummary {
    pub id: i32,
    pub name: String,
    pub address: String,
}

/// A restaurant with every pizza it sells.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDetail {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub restaurant_pizzas: Vec<RestaurantPizzaWithPizza>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PizzaSummary {
    pub id: i32,
    pub name: String,
    pub ingredients: String,
}

/// A pizza with every restaurant selling it.
#[derive(Debug, Serialize, ToSchema)]
pub struct PizzaDetail {
    pub id: i32,
    pub name: String,
    pub ingredients: String,
    pub restaurant_pizzas: Vec<RestaurantPizzaWithRestaurant>,
}

/// Price row nested under a restaurant.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantPizzaWithPizza {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: PizzaSummary,
}

/// Price row nested under a pizza.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantPizzaWithRestaurant {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub restaurant: RestaurantSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantPizzaDetail {
    pub id: i32,
    pub price: i32,
    pub pizza_id: i32,
    pub restaurant_id: i32,
    pub pizza: PizzaSummary,
    pub restaurant: RestaurantSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRestaurantPizzaRequest {
    /// Price between 1 and 30; `7.0` is read as `7`
    #[serde(deserialize_with = "whole_number")]
    pub price: i32,
    /// Existing pizza
    pub pizza_id: i32,
    /// Existing restaurant
    pub restaurant_id: i32,
}

/// Accepts any JSON number without a fractional part that fits an `i32`.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(de::Error::invalid_value(
            de::Unexpected::Float(value),
            &"a whole number",
        ));
    }
    Ok(value as i32)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    /// Always `["validation errors"]`
    pub errors: Vec<String>,
}
