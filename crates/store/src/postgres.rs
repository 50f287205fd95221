use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use common::{OrderId, ProductId, UserId};
use domain::order::{Order, OrderChangeset, OrderStatus};
use domain::product::{Product, ProductStatus};
use domain::repos::{NewUser, OrderDetails, OrderRepo, ProductRepo, RepoError, UserRepo};
use domain::user::{User, UserRole};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_user(row: &PgRow) -> Result<User, RepoError> {
        let role: String = row.try_get("role").map_err(backend)?;
        Ok(User {
            id: UserId::new(row.try_get("id").map_err(backend)?),
            email: row.try_get("email").map_err(backend)?,
            name: row.try_get("name").map_err(backend)?,
            role: UserRole::parse(&role)
                .ok_or_else(|| RepoError::Backend(format!("unknown user role {role:?}")))?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product, RepoError> {
        let status: String = row.try_get("status").map_err(backend)?;
        Ok(Product {
            id: Some(ProductId::new(row.try_get("id").map_err(backend)?)),
            name: row.try_get("name").map_err(backend)?,
            description: row.try_get("description").map_err(backend)?,
            price: row.try_get("price").map_err(backend)?,
            seller_id: UserId::new(row.try_get("seller_id").map_err(backend)?),
            is_active: row.try_get("is_active").map_err(backend)?,
            status: ProductStatus::parse(&status)
                .ok_or_else(|| RepoError::Backend(format!("unknown product status {status:?}")))?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order, RepoError> {
        let status: String = row.try_get("status").map_err(backend)?;
        Ok(Order {
            id: Some(OrderId::new(row.try_get("id").map_err(backend)?)),
            buyer_id: UserId::new(row.try_get("buyer_id").map_err(backend)?),
            seller_id: UserId::new(row.try_get("seller_id").map_err(backend)?),
            product_id: ProductId::new(row.try_get("product_id").map_err(backend)?),
            price: row.try_get("price").map_err(backend)?,
            status: OrderStatus::parse(&status)
                .ok_or_else(|| RepoError::Backend(format!("unknown order status {status:?}")))?,
            created_at: row.try_get("created_at").map_err(backend)?,
            updated_at: row.try_get("updated_at").map_err(backend)?,
            paid_at: row.try_get("paid_at").map_err(backend)?,
        })
    }

    fn row_to_details(row: &PgRow) -> Result<OrderDetails, RepoError> {
        let status: String = row.try_get("status").map_err(backend)?;
        Ok(OrderDetails {
            id: OrderId::new(row.try_get("id").map_err(backend)?),
            buyer_id: UserId::new(row.try_get("buyer_id").map_err(backend)?),
            seller_id: UserId::new(row.try_get("seller_id").map_err(backend)?),
            product_id: ProductId::new(row.try_get("product_id").map_err(backend)?),
            price: row.try_get("price").map_err(backend)?,
            status: OrderStatus::parse(&status)
                .ok_or_else(|| RepoError::Backend(format!("unknown order status {status:?}")))?,
            created_at: row.try_get("created_at").map_err(backend)?,
            paid_at: row.try_get("paid_at").map_err(backend)?,
            product_name: row.try_get("product_name").map_err(backend)?,
            buyer_name: row.try_get("buyer_name").map_err(backend)?,
            seller_name: row.try_get("seller_name").map_err(backend)?,
        })
    }
}

fn backend(e: sqlx::Error) -> RepoError {
    RepoError::Backend(e.to_string())
}

const DETAILS_SELECT: &str = r#"
    SELECT o.id, o.buyer_id, o.seller_id, o.product_id, o.price, o.status,
           o.created_at, o.paid_at,
           p.name AS product_name,
           COALESCE(NULLIF(b.name, ''), split_part(b.email, '@', 1)) AS buyer_name,
           COALESCE(NULLIF(s.name, ''), split_part(s.email, '@', 1)) AS seller_name
    FROM orders o
    JOIN products p ON p.id = o.product_id
    JOIN users b ON b.id = o.buyer_id
    JOIN users s ON s.id = o.seller_id
"#;

#[async_trait]
impl UserRepo for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepoError::Conflict { entity: "user" };
            }
            backend(e)
        })?;

        Self::row_to_user(&row)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let row = sqlx::query("SELECT id, email, name, role FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, password_hash
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => {
                let user = Self::row_to_user(&row)?;
                let hash: String = row.try_get("password_hash").map_err(backend)?;
                Ok(Some((user, hash)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProductRepo for PostgresStore {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, seller_id, is_active, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, seller_id, is_active, status
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.seller_id.as_i64())
        .bind(product.is_active)
        .bind(product.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Self::row_to_product(&row)
    }

    async fn get_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price, seller_id, is_active, status
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn get_product_with_seller(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, User)>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.seller_id, p.is_active, p.status,
                   u.id AS user_id, u.email, u.name AS user_name, u.role
            FROM products p
            JOIN users u ON u.id = p.seller_id
            WHERE p.id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let product = Self::row_to_product(&row)?;
        let role: String = row.try_get("role").map_err(backend)?;
        let seller = User {
            id: UserId::new(row.try_get("user_id").map_err(backend)?),
            email: row.try_get("email").map_err(backend)?,
            name: row.try_get("user_name").map_err(backend)?,
            role: UserRole::parse(&role)
                .ok_or_else(|| RepoError::Backend(format!("unknown user role {role:?}")))?,
        };
        Ok(Some((product, seller)))
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RepoError> {
        let id = product
            .id
            .ok_or(RepoError::NotFound { entity: "product" })?;
        let row = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price = $4, is_active = $5, status = $6
            WHERE id = $1
            RETURNING id, name, description, price, seller_id, is_active, status
            "#,
        )
        .bind(id.as_i64())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.is_active)
        .bind(product.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(RepoError::NotFound { entity: "product" })?;

        Self::row_to_product(&row)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_products_by_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<Product>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, seller_id, is_active, status
            FROM products
            WHERE seller_id = $1
            ORDER BY id
            "#,
        )
        .bind(seller_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(Self::row_to_product).collect()
    }

    async fn list_available_products(&self) -> Result<Vec<Product>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price, seller_id, is_active, status
            FROM products
            WHERE is_active AND status = 'available'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl OrderRepo for PostgresStore {
    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, product_id, price, status,
                   created_at, updated_at, paid_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn create_order(&self, changeset: OrderChangeset) -> Result<Order, RepoError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Reserve first: the guarded UPDATE is the race arbiter.
        if let Some(product) = &changeset.product {
            let id = product
                .id
                .ok_or(RepoError::NotFound { entity: "product" })?;
            let updated = sqlx::query(
                "UPDATE products SET status = $2 WHERE id = $1 AND status = 'available'",
            )
            .bind(id.as_i64())
            .bind(product.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            if updated.rows_affected() == 0 {
                return Err(RepoError::Conflict { entity: "product" });
            }
        }

        let order = &changeset.order;
        let row = sqlx::query(
            r#"
            INSERT INTO orders (buyer_id, seller_id, product_id, price, status,
                                created_at, updated_at, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, buyer_id, seller_id, product_id, price, status,
                      created_at, updated_at, paid_at
            "#,
        )
        .bind(order.buyer_id.as_i64())
        .bind(order.seller_id.as_i64())
        .bind(order.product_id.as_i64())
        .bind(order.price)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let created = Self::row_to_order(&row)?;
        tx.commit().await.map_err(backend)?;
        tracing::debug!(order_id = ?created.id, "order created with product reservation");
        Ok(created)
    }

    async fn commit_transition(&self, changeset: OrderChangeset) -> Result<Order, RepoError> {
        let order = &changeset.order;
        let id = order.id.ok_or(RepoError::NotFound { entity: "order" })?;

        let mut tx = self.pool.begin().await.map_err(backend)?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3, paid_at = $4
            WHERE id = $1 AND status = 'pending_payment'
            "#,
        )
        .bind(id.as_i64())
        .bind(order.status.as_str())
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if updated.rows_affected() == 0 {
            return Err(RepoError::Conflict { entity: "order" });
        }

        if let Some(product) = &changeset.product {
            let pid = product
                .id
                .ok_or(RepoError::NotFound { entity: "product" })?;
            sqlx::query("UPDATE products SET status = $2 WHERE id = $1")
                .bind(pid.as_i64())
                .bind(product.status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        tracing::debug!(%id, status = order.status.as_str(), "order transition committed");
        Ok(order.clone())
    }

    async fn get_buyer_orders_with_details(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError> {
        let sql = format!("{DETAILS_SELECT} WHERE o.buyer_id = $1 ORDER BY o.created_at DESC");
        let rows = sqlx::query(&sql)
            .bind(buyer_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(Self::row_to_details).collect()
    }

    async fn get_seller_orders_with_details(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError> {
        let sql = format!("{DETAILS_SELECT} WHERE o.seller_id = $1 ORDER BY o.created_at DESC");
        let rows = sqlx::query(&sql)
            .bind(seller_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(Self::row_to_details).collect()
    }
}
