use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Kind of stock movement recorded by the ledger
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    /// Stock received; adds to quantity on hand
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Stock sold; subtracts from quantity on hand
    #[sea_orm(string_value = "sale")]
    Sale,
    /// Stock count correction; replaces quantity on hand
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Immutable record of one applied stock movement
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "stock_transactions")]
#[schema(as = StockTransaction)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub user_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.transaction_date {
                active_model.transaction_date = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;
    use std::str::FromStr;

    #[test]
    fn transaction_type_parses_lowercase_names() {
        assert_eq!(
            TransactionType::from_str("purchase").unwrap(),
            TransactionType::Purchase
        );
        assert_eq!(TransactionType::from_str("sale").unwrap(), TransactionType::Sale);
        assert_eq!(
            TransactionType::from_str("adjustment").unwrap(),
            TransactionType::Adjustment
        );
        assert!(TransactionType::from_str("refund").is_err());
        assert!(TransactionType::from_str("Purchase").is_err());
    }

    #[test]
    fn transaction_type_display_matches_stored_value() {
        for kind in TransactionType::iter() {
            assert_eq!(kind.to_string(), kind.to_value());
        }
    }
}
