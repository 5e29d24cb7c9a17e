use sea_orm::entity::prelude::*;

/// Singleton row, always `id = 1`.
pub const SETTINGS_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "site_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub site_name: String,
    pub title: String,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub promo_banner_enabled: bool,
    pub promo_banner_text: Option<String>,
    pub promo_banner_bg_color: String,
    pub promo_banner_text_color: String,
    pub company_name: Option<String>,
    pub company_phone: Option<String>,
    pub company_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
