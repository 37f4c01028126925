use pizza_store::models;

use crate::models::{
    PizzaDetail, PizzaSummary, RestaurantDetail, RestaurantPizzaDetail, RestaurantPizzaWithPizza,
    RestaurantPizzaWithRestaurant, RestaurantSummary,
};

pub fn serialize_restaurant_summary(restaurant: &models::Restaurant) -> RestaurantSummary {
    RestaurantSummary {
        id: restaurant.id,
        name: restaurant.name.clone(),
        address: restaurant.address.clone(),
    }
}

pub fn serialize_pizza_summary(pizza: &models::Pizza) -> PizzaSummary {
    PizzaSummary {
        id: pizza.id,
        name: pizza.name.clone(),
        ingredients: pizza.ingredients.clone(),
    }
}

pub fn serialize_restaurant_detail(
    restaurant: &models::Restaurant,
    restaurant_pizzas: &[(models::RestaurantPizza, models::Pizza)],
) -> RestaurantDetail {
    RestaurantDetail {
        id: restaurant.id,
        name: restaurant.name.clone(),
        address: restaurant.address.clone(),
        restaurant_pizzas: restaurant_pizzas
            .iter()
            .map(|(rp, pizza)| RestaurantPizzaWithPizza {
                id: rp.id,
                price: rp.price,
                pizza_id: rp.pizza_id,
                restaurant_id: rp.restaurant_id,
                pizza: serialize_pizza_summary(pizza),
            })
            .collect(),
    }
}

pub fn serialize_pizza_detail(
    pizza: &models::Pizza,
    restaurant_pizzas: &[(models::RestaurantPizza, models::Restaurant)],
) -> PizzaDetail {
    PizzaDetail {
        id: pizza.id,
        name: pizza.name.clone(),
        ingredients: pizza.ingredients.clone(),
        restaurant_pizzas: restaurant_pizzas
            .iter()
            .map(|(rp, restaurant)| RestaurantPizzaWithRestaurant {
                id: rp.id,
                price: rp.price,
                pizza_id: rp.pizza_id,
                restaurant_id: rp.restaurant_id,
                restaurant: serialize_restaurant_summary(restaurant),
            })
            .collect(),
    }
}

pub fn serialize_restaurant_pizza_detail(
    restaurant_pizza: &models::RestaurantPizza,
    pizza: &models::Pizza,
    restaurant: &models::Restaurant,
) -> RestaurantPizzaDetail {
    RestaurantPizzaDetail {
        id: restaurant_pizza.id,
        price: restaurant_pizza.price,
        pizza_id: restaurant_pizza.pizza_id,
        restaurant_id: restaurant_pizza.restaurant_id,
        pizza: serialize_pizza_summary(pizza),
        restaurant: serialize_restaurant_summary(restaurant),
    }
}
