//! `SeaORM` Entity for dividends table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dividends")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub netuid: i32,
    pub hotkey: String,
    #[sea_orm(column_type = "Double")]
    pub dividends: f64,
    pub observed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
