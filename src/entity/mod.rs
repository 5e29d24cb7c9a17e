pub mod areas;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod promos;
pub mod sessions;
pub mod site_settings;
pub mod users;

pub use areas::Entity as Areas;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use promos::Entity as Promos;
pub use sessions::Entity as Sessions;
pub use site_settings::Entity as SiteSettings;
pub use users::Entity as Users;
