pub mod areas;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod promos;
pub mod settings;
pub mod users;
