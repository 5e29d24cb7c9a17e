use sea_orm::entity::prelude::*;

use crate::pricing::DiscountType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub discount_type: DiscountType,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount_value: Decimal,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
