use chrono::{NaiveDate, Utc};
use catering_api::{
    batch::BatchError,
    config::AppConfig,
    customization::{CustomizationGroup, CustomizationOption, Selection, SelectionMode, SelectionValue},
    db::{create_pool, run_migrations},
    dto::{
        areas::CreateAreaRequest,
        auth::{LoginRequest, RegisterRequest},
        categories::CreateCategoryRequest,
        orders::{CustomerDetails, UpdateOrderStatusRequest},
        products::CreateProductRequest,
        promos::CreatePromoRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders, PaymentMethod},
        users::{ActiveModel as UserActive, Role},
    },
    error::AppError,
    middleware::auth::{AuthUser, authenticate},
    models::{Area, Product, Promo},
    pricing::DiscountType,
    services::{
        area_service, auth_service, category_service, order_service,
        order_service::LocalSubmitter, product_service, promo_service,
    },
    state::AppState,
    storefront::{
        cart::{Cart, NewCartLine},
        checkout::{Checkout, CheckoutError},
        storage::MemoryStore,
    },
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

// Integration flows run against a real Postgres and are skipped without one.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let state = AppState::new(pool, AppConfig::for_database(database_url));
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&state.orm).await })
        .await?;
    Ok(Some(state))
}

fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2031, 5, day).unwrap()
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(format!("{}-{}", role_label(role), tag())),
        password_hash: Set("unused".into()),
        role: Set(role),
        name: Set(None),
        email: Set(None),
        phone: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
        session_id: Uuid::new_v4(),
    })
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        _ => "customer",
    }
}

struct Menu {
    admin: AuthUser,
    area: Area,
    nasi: Product,
    snack: Product,
    promo: Promo,
}

async fn menu(state: &AppState) -> anyhow::Result<Menu> {
    let admin = create_user(state, Role::Admin).await?;
    let tag = tag();

    let category = category_service::create_category(
        state,
        &admin,
        CreateCategoryRequest {
            name: format!("Nasi Box {tag}"),
            slug: None,
            is_active: None,
            parent_id: None,
        },
    )
    .await?
    .data
    .unwrap();

    let area = area_service::create_area(
        state,
        &admin,
        CreateAreaRequest {
            name: format!("Jakarta {tag}"),
            slug: None,
            is_active: None,
            delivery_fee: Decimal::from(5000),
            service_fee: Decimal::from(2000),
        },
    )
    .await?
    .data
    .unwrap();

    let rice = CustomizationGroup {
        kind: "Nasi".into(),
        selection_mode: SelectionMode::Single,
        options: vec![
            CustomizationOption {
                name: "Putih".into(),
                surcharge: Decimal::ZERO,
            },
            CustomizationOption {
                name: "Uduk".into(),
                surcharge: Decimal::from(3000),
            },
        ],
    };
    let nasi = create_product(state, &admin, &format!("Ayam Bakar {tag}"), 25000, category.id, vec![rice]).await?;
    let snack = create_product(state, &admin, &format!("Snack {tag}"), 15000, category.id, vec![]).await?;

    let promo = promo_service::create_promo(
        state,
        &admin,
        CreatePromoRequest {
            title: "Diskon".into(),
            description: None,
            code: format!("HEMAT{tag}").to_uppercase(),
            discount_type: DiscountType::Percent,
            discount_value: Decimal::from(15),
            start_date: None,
            end_date: None,
            is_active: Some(true),
        },
    )
    .await?
    .data
    .unwrap();

    Ok(Menu {
        admin,
        area,
        nasi,
        snack,
        promo,
    })
}

async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    price: i64,
    category_id: Uuid,
    groups: Vec<CustomizationGroup>,
) -> anyhow::Result<Product> {
    let product = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            slug: None,
            description: None,
            price: Decimal::from(price),
            original_price: None,
            image: Some("/img/menu.jpg".into()),
            category_id,
            area_id: None,
            is_active: None,
            is_featured: None,
            badge: None,
            customization_options: groups,
            min_order_qty: None,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(product)
}

fn white_rice() -> Selection {
    let mut selection = Selection::new();
    selection.insert("Nasi".into(), SelectionValue::One("Putih".into()));
    selection
}

fn line(product: &Product, quantity: u32, day: u32, customization: Selection) -> NewCartLine {
    NewCartLine {
        product_id: product.id,
        name: product.name.clone(),
        image: product.image.clone(),
        price: product.price,
        quantity,
        customization,
        delivery_date: Some(date(day)),
        delivery_time: Some("11:00".into()),
    }
}

fn customer(name: &str) -> CustomerDetails {
    CustomerDetails {
        customer_name: name.into(),
        customer_phone: "08123456789".into(),
        customer_address: "Jl. Sudirman 1".into(),
        payment_method: PaymentMethod::Cod,
    }
}

async fn orders_for(state: &AppState, customer_name: &str) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::CustomerName.eq(customer_name))
        .count(&state.orm)
        .await?)
}

#[tokio::test]
async fn checkout_creates_one_order_per_delivery_date() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let name = format!("Customer {}", tag());

    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.nasi, 2, 10, white_rice()));
    cart.add_item(line(&menu.snack, 1, 11, Selection::new()));

    let mut checkout = Checkout::new();
    checkout.select_area(Some(menu.area.clone()));
    checkout.apply_promo(
        &menu.promo.code.to_lowercase(),
        std::slice::from_ref(&menu.promo),
        state.config.store_now(),
    )?;

    let submitter = LocalSubmitter {
        state: state.clone(),
        user: None,
    };
    let created = checkout.submit(&mut cart, &customer(&name), &submitter).await?;
    assert_eq!(created, 2);
    assert!(cart.is_empty());

    let orders = Orders::find()
        .filter(OrderCol::CustomerName.eq(name.as_str()))
        .all(&state.orm)
        .await?;
    assert_eq!(orders.len(), 2);

    // 50000 + 7000 fees - 15% of 50000, and 15000 + 7000 - 2250.
    let mut totals: Vec<Decimal> = orders.iter().map(|o| o.total).collect();
    totals.sort();
    assert_eq!(totals, vec![Decimal::from(19750), Decimal::from(49500)]);
    for order in &orders {
        assert_eq!(order.status, "pending");
        assert!(order.code.starts_with("ORD-"));
        assert_eq!(order.promo_code.as_deref(), Some(menu.promo.code.as_str()));
        assert_eq!(order.area_id, Some(menu.area.id));
    }

    let first = orders[0].id;
    let (audited,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM audit_logs WHERE action = 'order_batch_create' AND metadata::text LIKE $1",
    )
    .bind(format!("%{first}%"))
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(audited, 1);

    let detail = order_service::get_order(&state, &menu.admin, first).await?.data.unwrap();
    assert!(!detail.items.is_empty());
    assert!(detail.items.iter().all(|i| i.product_image.as_deref() == Some("/img/menu.jpg")));
    Ok(())
}

#[tokio::test]
async fn missing_delivery_time_saves_nothing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let name = format!("Customer {}", tag());

    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.nasi, 1, 10, white_rice()));
    let mut no_time = line(&menu.snack, 1, 11, Selection::new());
    no_time.delivery_time = None;
    cart.add_item(no_time);

    let submitter = LocalSubmitter {
        state: state.clone(),
        user: None,
    };
    let err = Checkout::new()
        .submit(&mut cart, &customer(&name), &submitter)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Schedule(BatchError::MissingDeliveryTime(1))
    ));
    assert_eq!(cart.lines().len(), 2);
    assert_eq!(orders_for(&state, &name).await?, 0);
    Ok(())
}

#[tokio::test]
async fn later_invalid_order_rolls_back_the_batch() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let name = format!("Customer {}", tag());

    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.nasi, 2, 10, white_rice()));
    cart.add_item(line(&menu.snack, 3, 12, Selection::new()));

    let mut checkout = Checkout::new();
    checkout.select_area(Some(menu.area.clone()));
    let mut batch = checkout.compose(cart.lines(), &customer(&name))?;
    assert_eq!(batch.orders.len(), 2);
    batch.orders[1].total += Decimal::ONE;

    let err = order_service::create_batch(&state, None, batch).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Pricing mismatch"));
    assert_eq!(orders_for(&state, &name).await?, 0);
    Ok(())
}

#[tokio::test]
async fn server_recomputes_customization_prices() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let name = format!("Customer {}", tag());

    // Uduk costs 3000 extra but the client claims the base price.
    let mut uduk = Selection::new();
    uduk.insert("Nasi".into(), SelectionValue::One("Uduk".into()));
    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.nasi, 1, 10, uduk));

    let batch = Checkout::new().compose(cart.lines(), &customer(&name))?;
    let order = batch.orders.into_iter().next().unwrap();
    let err = order_service::create_order(&state, None, order).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Pricing mismatch"));

    // A missing single-select choice is a validation error.
    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.nasi, 1, 10, Selection::new()));
    let batch = Checkout::new().compose(cart.lines(), &customer(&name))?;
    let err = order_service::create_batch(&state, None, batch).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(orders_for(&state, &name).await?, 0);
    Ok(())
}

#[tokio::test]
async fn orders_are_visible_to_owner_and_admin_only() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let owner = create_user(&state, Role::Customer).await?;
    let stranger = create_user(&state, Role::Customer).await?;

    let mut cart = Cart::hydrate(MemoryStore::new());
    cart.add_item(line(&menu.snack, 4, 15, Selection::new()));
    let batch = Checkout::new().compose(cart.lines(), &customer("Owner"))?;
    let input = batch.orders.into_iter().next().unwrap();
    let order = order_service::create_order(&state, Some(&owner), input)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(order.user_id, Some(owner.user_id));
    assert_eq!(order.total, Decimal::from(60000));

    let mine = order_service::my_orders(&state, &owner).await?.data.unwrap();
    assert!(mine.items.iter().any(|o| o.order.id == order.id));
    assert!(order_service::get_order(&state, &owner, order.id).await.is_ok());
    assert!(matches!(
        order_service::get_order(&state, &stranger, order.id).await,
        Err(AppError::NotFound)
    ));

    let forbidden = order_service::update_order_status(
        &state,
        &owner,
        order.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let invalid = order_service::update_order_status(
        &state,
        &menu.admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "paid".into(),
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));

    let updated = order_service::update_order_status(
        &state,
        &menu.admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Confirmed".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, "confirmed");
    Ok(())
}

#[tokio::test]
async fn duplicate_category_conflicts_but_product_slug_is_suffixed() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;
    let tag = tag();

    let request = || CreateCategoryRequest {
        name: format!("Tumpeng {tag}"),
        slug: None,
        is_active: None,
        parent_id: None,
    };
    category_service::create_category(&state, &menu.admin, request()).await?;
    let err = category_service::create_category(&state, &menu.admin, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Category slug must be unique"));

    let first = create_product(&state, &menu.admin, &format!("Tumpeng {tag}"), 150000, menu.nasi.category_id, vec![]).await?;
    let second = create_product(&state, &menu.admin, &format!("Tumpeng {tag}"), 150000, menu.nasi.category_id, vec![]).await?;
    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with(&format!("{}-", first.slug)));

    let customer = create_user(&state, Role::Customer).await?;
    let err = category_service::create_category(&state, &customer, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn promo_codes_are_unique_regardless_of_case() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let menu = menu(&state).await?;

    let err = promo_service::create_promo(
        &state,
        &menu.admin,
        CreatePromoRequest {
            title: "Copy".into(),
            description: None,
            code: menu.promo.code.to_lowercase(),
            discount_type: DiscountType::Amount,
            discount_value: Decimal::from(1000),
            start_date: None,
            end_date: None,
            is_active: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let found = promo_service::find_valid(
        &state.orm,
        &format!("  {}  ", menu.promo.code.to_lowercase()),
        state.config.store_now(),
    )
    .await?;
    assert_eq!(found.id, menu.promo.id);
    Ok(())
}

#[tokio::test]
async fn session_lives_until_logout() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let username = format!("sari-{}", tag());

    let signed_in = auth_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            password: "rahasia123".into(),
            name: "Sari".into(),
            email: None,
            phone: None,
        },
    )
    .await?;
    let user = authenticate(&state, &signed_in.token).await?;
    assert_eq!(user.role, Role::Customer);

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            password: "rahasia123".into(),
            name: "Sari".into(),
            email: None,
            phone: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let wrong = auth_service::login_user(
        &state,
        LoginRequest {
            username: username.clone(),
            password: "salah".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized)));

    let unknown = auth_service::login_user(
        &state,
        LoginRequest {
            username: format!("{username}-missing"),
            password: "rahasia123".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::Unauthorized)));

    let again = auth_service::login_user(
        &state,
        LoginRequest {
            username,
            password: "rahasia123".into(),
        },
    )
    .await?;
    let second = authenticate(&state, &again.token).await?;

    auth_service::logout_user(&state, &user).await?;
    assert!(matches!(
        authenticate(&state, &signed_in.token).await,
        Err(AppError::Unauthorized)
    ));
    // Other sessions of the same user stay valid.
    assert!(authenticate(&state, &again.token).await.is_ok());
    Ok(())
}
