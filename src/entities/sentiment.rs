//! `SeaORM` Entity for sentiment table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sentiment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub netuid: i32,
    pub hotkey: String,
    #[sea_orm(column_type = "Double")]
    pub sentiment_score: f64,
    pub tweet_count: i64,
    pub observed_at: DateTimeWithTimeZone,
    pub action_taken: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub action_amount: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
