use std::sync::Arc;

use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::{locks::ProductLocks, require_text, Page};
use crate::{
    db::run_in_transaction,
    entities::{inventory, product, stock_transaction},
    errors::ServiceError,
};

/// Product together with its stock row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductWithInventory {
    #[serde(flatten)]
    pub product: product::Model,
    pub inventory: Option<inventory::Model>,
}

impl From<(product::Model, Option<inventory::Model>)> for ProductWithInventory {
    fn from((product, inventory): (product::Model, Option<inventory::Model>)) -> Self {
        Self { product, inventory }
    }
}

/// Input for creating a product and its inventory row.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: f64,
    pub initial_quantity: i32,
}

/// Fields of a product that may be changed after creation. Anything not
/// listed here is immutable through the API.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub price: Option<f64>,
}

const MAX_NAME_CHARS: usize = 200;
const MAX_CATEGORY_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 2000;

fn ensure_description_len(description: Option<&str>) -> Result<(), ServiceError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_CHARS => {
            Err(ServiceError::InvalidInput(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_CHARS
            )))
        }
        _ => Ok(()),
    }
}

fn ensure_positive_price(price: f64) -> Result<(), ServiceError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(
            "Price must be greater than zero".to_string(),
        ))
    }
}

/// Escapes LIKE wildcards so user text only ever matches literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::Conflict(format!("Product with name '{}' already exists", name))
}

fn map_unique_violation(err: DbErr, name: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_name(name),
        _ => ServiceError::DatabaseError(err),
    }
}

async fn ensure_name_available(
    txn: &DatabaseTransaction,
    name: &str,
    except_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = product::Entity::find().filter(product::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(product::Column::Id.ne(id));
    }
    match query.one(txn).await? {
        Some(_) => Err(duplicate_name(name)),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    locks: ProductLocks,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, locks: ProductLocks) -> Self {
        Self { db, locks }
    }

    /// Creates a product and its inventory row in one transaction.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: NewProduct,
    ) -> Result<ProductWithInventory, ServiceError> {
        require_text("name", &input.name, MAX_NAME_CHARS)?;
        require_text("category", &input.category, MAX_CATEGORY_CHARS)?;
        ensure_description_len(input.description.as_deref())?;
        ensure_positive_price(input.price)?;
        if input.initial_quantity < 0 {
            return Err(ServiceError::InvalidInput(
                "Initial quantity must not be negative".to_string(),
            ));
        }

        let created = run_in_transaction::<_, _, ServiceError>(&self.db, "create_product", move |txn| {
            Box::pin(async move {
                ensure_name_available(txn, &input.name, None).await?;

                let product = product::ActiveModel {
                    name: Set(input.name.clone()),
                    description: Set(input.description),
                    category: Set(input.category),
                    price: Set(input.price),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| map_unique_violation(e, &input.name))?;

                let stock = inventory::ActiveModel {
                    product_id: Set(product.id),
                    quantity: Set(input.initial_quantity),
                    min_stock_level: Set(inventory::DEFAULT_MIN_STOCK_LEVEL),
                    max_stock_level: Set(inventory::DEFAULT_MAX_STOCK_LEVEL),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok(ProductWithInventory {
                    product,
                    inventory: Some(stock),
                })
            })
        })
        .await?;

        info!(product_id = created.product.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductWithInventory, ServiceError> {
        product::Entity::find_by_id(id)
            .find_also_related(inventory::Entity)
            .one(&*self.db)
            .await?
            .map(ProductWithInventory::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, page: Page) -> Result<Vec<ProductWithInventory>, ServiceError> {
        self.find_products(Condition::all(), page).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category: &str,
        page: Page,
    ) -> Result<Vec<ProductWithInventory>, ServiceError> {
        self.find_products(
            Condition::all().add(product::Column::Category.eq(category)),
            page,
        )
        .await
    }

    /// Case-insensitive substring search over name and description.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        query: &str,
        page: Page,
    ) -> Result<Vec<ProductWithInventory>, ServiceError> {
        let pattern = like_pattern(query.trim());
        let matches = |column: product::Column| {
            Expr::expr(Func::lower(Expr::col((product::Entity, column))))
                .like(LikeExpr::new(pattern.clone()).escape('\\'))
        };
        let condition = Condition::any()
            .add(matches(product::Column::Name))
            .add(matches(product::Column::Description));

        self.find_products(condition, page).await
    }

    async fn find_products(
        &self,
        condition: Condition,
        page: Page,
    ) -> Result<Vec<ProductWithInventory>, ServiceError> {
        let rows = product::Entity::find()
            .filter(condition)
            .find_also_related(inventory::Entity)
            .order_by_asc(product::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(ProductWithInventory::from).collect())
    }

    /// Applies the allow-listed `changes` to a product.
    #[instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<ProductWithInventory, ServiceError> {
        if let Some(name) = &changes.name {
            require_text("name", name, MAX_NAME_CHARS)?;
        }
        if let Some(category) = &changes.category {
            require_text("category", category, MAX_CATEGORY_CHARS)?;
        }
        if let Some(description) = &changes.description {
            ensure_description_len(description.as_deref())?;
        }
        if let Some(price) = changes.price {
            ensure_positive_price(price)?;
        }

        let updated = run_in_transaction::<_, _, ServiceError>(&self.db, "update_product", move |txn| {
            Box::pin(async move {
                let existing = product::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

                let mut model: product::ActiveModel = existing.into();
                let mut new_name = None;
                if let Some(name) = changes.name {
                    ensure_name_available(txn, &name, Some(id)).await?;
                    model.name = Set(name.clone());
                    new_name = Some(name);
                }
                if let Some(description) = changes.description {
                    model.description = Set(description);
                }
                if let Some(category) = changes.category {
                    model.category = Set(category);
                }
                if let Some(price) = changes.price {
                    model.price = Set(price);
                }

                let product = model.update(txn).await.map_err(|e| match &new_name {
                    Some(name) => map_unique_violation(e, name),
                    None => ServiceError::DatabaseError(e),
                })?;

                let stock = inventory::Entity::find()
                    .filter(inventory::Column::ProductId.eq(id))
                    .one(txn)
                    .await?;

                Ok(ProductWithInventory {
                    product,
                    inventory: stock,
                })
            })
        })
        .await?;

        info!(product_id = id, "Product updated");
        Ok(updated)
    }

    /// Removes a product along with its inventory row and transaction history.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let guard = self.locks.acquire(id).await;

        let removed = run_in_transaction::<_, _, ServiceError>(&self.db, "delete_product", move |txn| {
            Box::pin(async move {
                product::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

                let transactions = stock_transaction::Entity::delete_many()
                    .filter(stock_transaction::Column::ProductId.eq(id))
                    .exec(txn)
                    .await?;
                inventory::Entity::delete_many()
                    .filter(inventory::Column::ProductId.eq(id))
                    .exec(txn)
                    .await?;
                product::Entity::delete_by_id(id).exec(txn).await?;

                Ok(transactions.rows_affected)
            })
        })
        .await;

        drop(guard);
        self.locks.release_idle(id);

        let removed_transactions = removed?;
        info!(product_id = id, removed_transactions, "Product deleted");
        Ok(())
    }
}
