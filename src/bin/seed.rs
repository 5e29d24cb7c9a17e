use catering_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    services::auth_service::hash_password,
    slug::slugify,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&create_orm_conn(&pool)).await?;

    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let admin_id = ensure_user(&pool, "admin", &admin_password, "admin", "Administrator").await?;
    let customer_id = ensure_user(&pool, "budi", "budi123", "customer", "Budi Santoso").await?;

    seed_settings(&pool).await?;
    let categories = seed_categories(&pool).await?;
    seed_areas(&pool).await?;
    seed_products(&pool, &categories).await?;
    seed_promos(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    password: &str,
    role: &str,
    name: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, password_hash, role, name)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(name)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(id)
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO site_settings (id, site_name, title, company_name, company_phone)
        VALUES (1, 'Catering Aja', 'Catering Aja - Solusi Katering Anda', 'PT Catering Aja', '0812-0000-0000')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;
    println!("Seeded site settings");
    Ok(())
}

/// Returns (slug, id) for every seeded category.
async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<Vec<(String, Uuid)>> {
    let mut seeded = Vec::new();
    for name in ["Nasi Box", "Prasmanan", "Snack Box", "Tumpeng"] {
        let slug = slugify(name);
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&slug)
        .fetch_one(pool)
        .await?;
        seeded.push((slug, id));
    }
    println!("Seeded categories");
    Ok(seeded)
}

async fn seed_areas(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let areas = [
        ("Jakarta Selatan", 15000, 2000),
        ("Jakarta Pusat", 20000, 2000),
        ("Depok", 25000, 3000),
    ];
    for (name, delivery_fee, service_fee) in areas {
        sqlx::query(
            r#"
            INSERT INTO areas (id, name, slug, delivery_fee, service_fee)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(Decimal::from(delivery_fee))
        .bind(Decimal::from(service_fee))
        .execute(pool)
        .await?;
    }
    println!("Seeded areas");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, categories: &[(String, Uuid)]) -> anyhow::Result<()> {
    let category = |slug: &str| {
        categories
            .iter()
            .find(|(s, _)| s == slug)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow::anyhow!("category {slug} was not seeded"))
    };

    let nasi_box_options = json!([
        {
            "type": "Nasi",
            "selectionMode": "single",
            "options": [
                { "name": "Nasi Putih", "harga": 0 },
                { "name": "Nasi Uduk", "harga": 3000 }
            ]
        },
        {
            "type": "Ekstra",
            "selectionMode": "multi",
            "options": [
                { "name": "Telur Balado", "harga": 4000 },
                { "name": "Kerupuk", "harga": 1000 }
            ]
        }
    ]);

    let products = [
        ("Nasi Box Ayam Bakar", "nasi-box", 25000, Some("Terlaris"), true, nasi_box_options.clone(), 10),
        ("Nasi Box Rendang", "nasi-box", 32000, None, false, nasi_box_options, 10),
        ("Prasmanan Paket Hemat", "prasmanan", 45000, Some("Hemat"), true, json!([]), 50),
        ("Snack Box Manis", "snack-box", 15000, None, false, json!([]), 20),
        ("Tumpeng Mini", "tumpeng", 150000, None, true, json!([]), 1),
    ];

    for (name, category_slug, price, badge, featured, options, min_qty) in products {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, price, category_id, is_featured, badge,
                 customization_options, min_order_qty)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(format!("{name} untuk acara kantor dan keluarga"))
        .bind(Decimal::from(price))
        .bind(category(category_slug)?)
        .bind(featured)
        .bind(badge)
        .bind(options)
        .bind(min_qty)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_promos(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let promos = [
        ("Diskon 10%", "HEMAT10", "percent", 10),
        ("Potongan 25 ribu", "POTONG25", "amount", 25000),
    ];
    for (title, code, kind, value) in promos {
        sqlx::query(
            r#"
            INSERT INTO promos (id, title, code, discount_type, discount_value)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (lower(code)) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(code)
        .bind(kind)
        .bind(Decimal::from(value))
        .execute(pool)
        .await?;
    }
    println!("Seeded promos");
    Ok(())
}
