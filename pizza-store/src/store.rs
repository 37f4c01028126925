use diesel::prelude::*;
use diesel::result::{ConnectionError, DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;
use tracing::debug;

use crate::models::{
    NewPizza, NewRestaurant, NewRestaurantPizza, Pizza, Restaurant, RestaurantPizza, PRICE_RANGE,
};
use crate::schema::{pizzas, restaurant_pizzas, restaurants};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unsupported database url {0:?}: in-memory databases do not outlive a connection")]
    UnsupportedDatabase(String),
    #[error("failed to connect to database: {0}")]
    Connection(#[from] ConnectionError),
    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

impl StoreError {
    /// Constraint violations reported by the engine are input problems, not faults.
    fn from_write(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => StoreError::Validation(info.message().to_string()),
            other => StoreError::Database(other),
        }
    }
}

pub struct PizzaStore<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> PizzaStore<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub(crate) fn connection(&mut self) -> &mut SqliteConnection {
        self.conn
    }

    pub fn list_restaurants(&mut self) -> Result<Vec<Restaurant>, StoreError> {
        let results = restaurants::table
            .order(restaurants::id)
            .select(Restaurant::as_select())
            .load(self.conn)?;
        Ok(results)
    }

    pub fn get_restaurant(&mut self, restaurant_id: i32) -> Result<Restaurant, StoreError> {
        restaurants::table
            .find(restaurant_id)
            .select(Restaurant::as_select())
            .first(self.conn)
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    /// Price rows of a restaurant, each paired with the pizza it prices.
    pub fn restaurant_pizzas_of(
        &mut self,
        restaurant: &Restaurant,
    ) -> Result<Vec<(RestaurantPizza, Pizza)>, StoreError> {
        let results = RestaurantPizza::belonging_to(restaurant)
            .inner_join(pizzas::table)
            .order(restaurant_pizzas::id)
            .select((RestaurantPizza::as_select(), Pizza::as_select()))
            .load(self.conn)?;
        Ok(results)
    }

    /// Deletes the restaurant together with its price rows in one transaction.
    /// Returns how many price rows went with it.
    pub fn delete_restaurant(&mut self, restaurant_id: i32) -> Result<usize, StoreError> {
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let removed_prices = diesel::delete(
                restaurant_pizzas::table.filter(restaurant_pizzas::restaurant_id.eq(restaurant_id)),
            )
            .execute(conn)?;
            let removed = diesel::delete(restaurants::table.find(restaurant_id)).execute(conn)?;
            if removed == 0 {
                return Err(StoreError::NotFound);
            }
            debug!(restaurant_id, removed_prices, "deleted restaurant");
            Ok(removed_prices)
        })
    }

    pub fn insert_restaurant(
        &mut self,
        restaurant: &NewRestaurant<'_>,
    ) -> Result<Restaurant, StoreError> {
        diesel::insert_into(restaurants::table)
            .values(restaurant)
            .returning(Restaurant::as_returning())
            .get_result(self.conn)
            .map_err(StoreError::from_write)
    }

    pub fn list_pizzas(&mut self) -> Result<Vec<Pizza>, StoreError> {
        let results = pizzas::table
            .order(pizzas::id)
            .select(Pizza::as_select())
            .load(self.conn)?;
        Ok(results)
    }

    pub fn get_pizza(&mut self, pizza_id: i32) -> Result<Pizza, StoreError> {
        pizzas::table
            .find(pizza_id)
            .select(Pizza::as_select())
            .first(self.conn)
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    /// Price rows of a pizza, each paired with the restaurant offering it.
    pub fn restaurant_pizzas_for_pizza(
        &mut self,
        pizza: &Pizza,
    ) -> Result<Vec<(RestaurantPizza, Restaurant)>, StoreError> {
        let results = RestaurantPizza::belonging_to(pizza)
            .inner_join(restaurants::table)
            .order(restaurant_pizzas::id)
            .select((RestaurantPizza::as_select(), Restaurant::as_select()))
            .load(self.conn)?;
        Ok(results)
    }

    pub fn insert_pizza(&mut self, pizza: &NewPizza<'_>) -> Result<Pizza, StoreError> {
        diesel::insert_into(pizzas::table)
            .values(pizza)
            .returning(Pizza::as_returning())
            .get_result(self.conn)
            .map_err(StoreError::from_write)
    }

    /// Inserts a price row after checking the price range and both parents.
    /// Nothing is written unless every check passes.
    ///
    /// The write lock is taken before the parent lookups. A deferred
    /// transaction would have to upgrade a read lock, which SQLite refuses
    /// with "database is locked" instead of waiting out `busy_timeout`.
    pub fn insert_restaurant_pizza(
        &mut self,
        new_restaurant_pizza: NewRestaurantPizza,
    ) -> Result<(RestaurantPizza, Pizza, Restaurant), StoreError> {
        if !PRICE_RANGE.contains(&new_restaurant_pizza.price) {
            return Err(StoreError::Validation(format!(
                "price must be between {} and {}",
                PRICE_RANGE.start(),
                PRICE_RANGE.end()
            )));
        }

        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let pizza = pizzas::table
                .find(new_restaurant_pizza.pizza_id)
                .select(Pizza::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    StoreError::Validation(format!(
                        "pizza {} does not exist",
                        new_restaurant_pizza.pizza_id
                    ))
                })?;
            let restaurant = restaurants::table
                .find(new_restaurant_pizza.restaurant_id)
                .select(Restaurant::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| {
                    StoreError::Validation(format!(
                        "restaurant {} does not exist",
                        new_restaurant_pizza.restaurant_id
                    ))
                })?;

            let restaurant_pizza = diesel::insert_into(restaurant_pizzas::table)
                .values(&new_restaurant_pizza)
                .returning(RestaurantPizza::as_returning())
                .get_result(conn)
                .map_err(StoreError::from_write)?;

            Ok((restaurant_pizza, pizza, restaurant))
        })
    }
}
