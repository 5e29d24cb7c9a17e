use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    customization::{CustomizationGroup, CustomizationOption, SelectionMode, SelectionValue},
    dto::{
        areas::{AreaList, CreateAreaRequest, UpdateAreaRequest},
        auth::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{
            BatchOrderRequest, BatchOrderResponse, CustomerDetails, OrderInput, OrderItemInput,
            OrderItemList, OrderList, OrderWithItems, UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        promos::{CreatePromoRequest, PromoList, UpdatePromoRequest, ValidatePromoRequest},
        settings::UpdateSettingsRequest,
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    entity::{orders::PaymentMethod, users::Role},
    error::FieldError,
    middleware::auth::SESSION_COOKIE,
    models::{Area, Category, Order, OrderItem, Product, Promo, SiteSettings, User},
    pricing::{DiscountType, PricingBreakdown},
    response::{ApiResponse, Meta},
    routes::{
        areas, auth, categories, health, orders, products as product_routes, promos, settings,
        users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::logout,
        auth::me,
        auth::update_me,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        areas::list_areas,
        areas::get_area,
        areas::create_area,
        areas::update_area,
        areas::delete_area,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        orders::list_orders,
        orders::my_orders,
        orders::get_order,
        orders::get_order_items,
        orders::create_order,
        orders::create_batch,
        orders::update_order_status,
        promos::list_promos,
        promos::validate_promo,
        promos::create_promo,
        promos::update_promo,
        promos::delete_promo,
        settings::get_settings,
        settings::update_settings,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Area,
            Product,
            Promo,
            DiscountType,
            Order,
            OrderItem,
            PaymentMethod,
            SiteSettings,
            CustomizationGroup,
            CustomizationOption,
            SelectionMode,
            SelectionValue,
            PricingBreakdown,
            FieldError,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            AuthResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateAreaRequest,
            UpdateAreaRequest,
            AreaList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreatePromoRequest,
            UpdatePromoRequest,
            ValidatePromoRequest,
            PromoList,
            UpdateSettingsRequest,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            CustomerDetails,
            OrderItemInput,
            OrderInput,
            BatchOrderRequest,
            BatchOrderResponse,
            OrderWithItems,
            OrderList,
            OrderItemList,
            UpdateOrderStatusRequest,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<BatchOrderResponse>,
            ApiResponse<AuthResponse>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Session cookie login and profile"),
        (name = "Categories", description = "Menu categories"),
        (name = "Areas", description = "Delivery areas and their fees"),
        (name = "Products", description = "Catering menu"),
        (name = "Orders", description = "Orders, one per delivery date"),
        (name = "Promos", description = "Promo codes"),
        (name = "Settings", description = "Site branding and banner"),
        (name = "Users", description = "User administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/orders/batch",
            "/api/promos/validate",
            "/api/pengaturan",
            "/api/site-settings",
            "/api/auth/me",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("session_cookie"));
    }
}
