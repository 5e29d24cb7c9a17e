use axum::Router;

use crate::state::AppState;

pub mod areas;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod promos;
pub mod settings;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/areas", areas::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/promos", promos::router())
        .nest("/users", users::router())
        .merge(settings::router())
}
