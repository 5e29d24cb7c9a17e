pub mod area_service;
pub mod auth_service;
pub mod category_service;
pub mod order_service;
pub mod product_service;
pub mod promo_service;
pub mod settings_service;
pub mod user_service;
