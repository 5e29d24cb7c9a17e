use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cod")]
    Cod,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "ewallet")]
    Ewallet,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub user_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub delivery_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub service_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub status: String,
    pub promo_code: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
