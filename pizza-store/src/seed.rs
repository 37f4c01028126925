//! Demo data for local development.

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::models::{NewPizza, NewRestaurant, NewRestaurantPizza};
use crate::schema::{pizzas, restaurant_pizzas, restaurants};
use crate::store::{PizzaStore, StoreError};

const RESTAURANTS: &[(&str, &str)] = &[
    ("Karen's Pizza Shack", "address1"),
    ("Sanjay's Pizza", "address2"),
    ("Kiki's Pizza", "address3"),
];

const PIZZAS: &[(&str, &str)] = &[
    ("Emma", "Dough, Tomato Sauce, Cheese"),
    ("Geri", "Dough, Tomato Sauce, Cheese, Pepperoni"),
    ("Melanie", "Dough, Sauce, Ricotta, Red peppers, Mustard"),
];

/// Price of pizza `PIZZAS[i]` at restaurant `RESTAURANTS[i]`.
const PRICES: &[i32] = &[1, 4, 5];

pub struct SeedSummary {
    pub restaurants: usize,
    pub pizzas: usize,
    pub restaurant_pizzas: usize,
}

/// Replaces the contents of every table with the demo data.
pub fn run(conn: &mut SqliteConnection) -> Result<SeedSummary, StoreError> {
    conn.immediate_transaction::<_, StoreError, _>(|conn| {
        diesel::delete(restaurant_pizzas::table).execute(conn)?;
        diesel::delete(restaurants::table).execute(conn)?;
        diesel::delete(pizzas::table).execute(conn)?;

        let mut store = PizzaStore::new(conn);
        let mut summary = SeedSummary {
            restaurants: 0,
            pizzas: 0,
            restaurant_pizzas: 0,
        };

        for ((&(restaurant_name, address), &(pizza_name, ingredients)), &price) in
            RESTAURANTS.iter().zip(PIZZAS).zip(PRICES)
        {
            let restaurant = store.insert_restaurant(&NewRestaurant {
                name: restaurant_name,
                address,
            })?;
            let pizza = store.insert_pizza(&NewPizza {
                name: pizza_name,
                ingredients,
            })?;
            // The store's validated insert opens its own immediate transaction,
            // which cannot nest inside this one.
            diesel::insert_into(restaurant_pizzas::table)
                .values(&NewRestaurantPizza {
                    price,
                    pizza_id: pizza.id,
                    restaurant_id: restaurant.id,
                })
                .execute(store.connection())?;

            summary.restaurants += 1;
            summary.pizzas += 1;
            summary.restaurant_pizzas += 1;
        }

        info!(
            restaurants = summary.restaurants,
            pizzas = summary.pizzas,
            restaurant_pizzas = summary.restaurant_pizzas,
            "seeded database"
        );
        Ok(summary)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDatabase;

    #[test]
    fn test_seed_replaces_existing_rows() {
        let db = TestDatabase::new();
        let conn = &mut db.connect();

        run(conn).unwrap();
        let summary = run(conn).unwrap();
        assert_eq!(summary.restaurants, 3);

        let mut store = PizzaStore::new(conn);
        let restaurants = store.list_restaurants().unwrap();
        assert_eq!(restaurants.len(), 3);
        assert_eq!(store.list_pizzas().unwrap().len(), 3);
        for restaurant in &restaurants {
            assert_eq!(store.restaurant_pizzas_of(restaurant).unwrap().len(), 1);
        }
    }
}
