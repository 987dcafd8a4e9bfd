use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    entities::{inventory, product},
    errors::ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    OutOfStock,
}

/// A product whose quantity on hand is at or below its minimum stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StockAlert {
    pub product_id: i32,
    pub product_name: String,
    pub current_quantity: i32,
    pub min_stock_level: i32,
    pub alert_type: AlertType,
}

/// Returns an alert for `stock` when it has fallen to its minimum level.
pub fn derive_alert(stock: &inventory::Model, product: &product::Model) -> Option<StockAlert> {
    if stock.quantity > stock.min_stock_level {
        return None;
    }

    let alert_type = if stock.quantity == 0 {
        AlertType::OutOfStock
    } else {
        AlertType::LowStock
    };

    Some(StockAlert {
        product_id: product.id,
        product_name: product.name.clone(),
        current_quantity: stock.quantity,
        min_stock_level: stock.min_stock_level,
        alert_type,
    })
}

/// Read-only scan of inventory levels.
#[derive(Clone)]
pub struct AlertService {
    db: Arc<DatabaseConnection>,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn low_stock_alerts(&self) -> Result<Vec<StockAlert>, ServiceError> {
        let rows = inventory::Entity::find()
            .find_also_related(product::Entity)
            .order_by_asc(inventory::Column::Id)
            .all(&*self.db)
            .await?;

        let alerts: Vec<StockAlert> = rows
            .iter()
            .filter_map(|(stock, product)| {
                product
                    .as_ref()
                    .and_then(|product| derive_alert(stock, product))
            })
            .collect();

        debug!(scanned = rows.len(), alerts = alerts.len(), "Low-stock scan finished");
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn product() -> product::Model {
        product::Model {
            id: 7,
            name: "Widget".into(),
            description: None,
            category: "parts".into(),
            price: 2.5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stock(quantity: i32, min_stock_level: i32) -> inventory::Model {
        inventory::Model {
            id: 1,
            product_id: 7,
            quantity,
            min_stock_level,
            max_stock_level: 1000,
            last_updated: Utc::now(),
        }
    }

    #[rstest]
    #[case(0, 10, Some(AlertType::OutOfStock))]
    #[case(5, 10, Some(AlertType::LowStock))]
    #[case(10, 10, Some(AlertType::LowStock))]
    #[case(11, 10, None)]
    #[case(0, 0, Some(AlertType::OutOfStock))]
    fn classifies_stock_levels(
        #[case] quantity: i32,
        #[case] min: i32,
        #[case] expected: Option<AlertType>,
    ) {
        let alert = derive_alert(&stock(quantity, min), &product());
        assert_eq!(alert.as_ref().map(|a| a.alert_type), expected);
        if let Some(alert) = alert {
            assert_eq!(alert.product_name, "Widget");
            assert_eq!(alert.current_quantity, quantity);
            assert_eq!(alert.min_stock_level, min);
        }
    }

    #[test]
    fn alert_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AlertType::OutOfStock).unwrap(),
            "\"out_of_stock\""
        );
        assert_eq!(
            serde_json::to_string(&AlertType::LowStock).unwrap(),
            "\"low_stock\""
        );
    }
}
