//! Database service for kasse-service.

use crate::models::{Account, BeverageType, CreateAccount, Profile, Purchase, PurchaseCount};
use crate::query::{AccountOrder, CountOrder, PurchaseOrder};
use kasse_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "kasse-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Account Operations
    // -------------------------------------------------------------------------

    /// Create an account with its profile and bearer token in one
    /// transaction. The profile and token rows share the account's lifetime;
    /// they exist before the transaction commits or not at all.
    #[instrument(skip(self, input, token), fields(username = %input.username))]
    pub async fn create_account(
        &self,
        input: &CreateAccount,
        token: &str,
    ) -> Result<(Account, Profile), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, password_hash, is_staff)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, is_staff, date_joined
            "#,
        )
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(input.is_staff)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Username '{}' is already taken",
                    input.username
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create account: {}", e)),
        })?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (account_id, bio)
            VALUES ($1, $2)
            RETURNING account_id, is_freeloader, balance, bio
            "#,
        )
        .bind(account.id)
        .bind(input.bio.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create profile: {}", e)))?;

        sqlx::query("INSERT INTO auth_tokens (token, account_id, created) VALUES ($1, $2, now())")
            .bind(token)
            .bind(account.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create token: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        info!(account_id = account.id, "Account created");

        Ok((account, profile))
    }

    /// Get an account by id.
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: i64) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, password_hash, is_staff, date_joined FROM accounts WHERE id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))?;

        Ok(account)
    }

    /// Get an account by username (credential checks).
    #[instrument(skip(self))]
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, is_staff, date_joined
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))?;

        Ok(account)
    }

    /// Resolve a bearer token to its account.
    #[instrument(skip(self, token))]
    pub async fn get_account_by_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.username, a.password_hash, a.is_staff, a.date_joined
            FROM accounts a
            JOIN auth_tokens t ON t.account_id = a.id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to resolve token: {}", e)))?;

        Ok(account)
    }

    /// Get the bearer token issued to an account.
    #[instrument(skip(self))]
    pub async fn get_token_for_account(&self, account_id: i64) -> Result<Option<String>, AppError> {
        let token =
            sqlx::query_scalar::<_, String>("SELECT token FROM auth_tokens WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to get token: {}", e))
                })?;

        Ok(token)
    }

    /// List accounts with optional staff-flag and username-substring filters.
    ///
    /// The `purchase_count` column backs the purchase-count orderings; extra
    /// columns are ignored when the row maps to `Account`.
    #[instrument(skip(self))]
    pub async fn list_accounts(
        &self,
        is_staff: Option<bool>,
        username: Option<&str>,
        order: Option<AccountOrder>,
    ) -> Result<Vec<Account>, AppError> {
        let order_by = order.map(AccountOrder::sql).unwrap_or("id ASC");

        let query = format!(
            r#"
            SELECT id, username, password_hash, is_staff, date_joined,
                   (SELECT COUNT(*) FROM purchases p WHERE p.account_id = accounts.id) AS purchase_count
            FROM accounts
            WHERE ($1::boolean IS NULL OR is_staff = $1)
              AND ($2::varchar IS NULL OR username ILIKE '%' || $2 || '%')
            ORDER BY {}
            "#,
            order_by
        );

        let accounts = sqlx::query_as::<_, Account>(&query)
            .bind(is_staff)
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list accounts: {}", e))
            })?;

        Ok(accounts)
    }

    /// Partially update an account. Absent fields keep their current value.
    #[instrument(skip(self, password_hash))]
    pub async fn update_account(
        &self,
        account_id: i64,
        username: Option<&str>,
        password_hash: Option<&str>,
        is_staff: Option<bool>,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                is_staff = COALESCE($4, is_staff)
            WHERE id = $1
            RETURNING id, username, password_hash, is_staff, date_joined
            "#,
        )
        .bind(account_id)
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Username is already taken"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update account: {}", e)),
        })?;

        Ok(account)
    }

    /// Delete an account. Profile, token and purchases go with it.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, account_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete account: {}", e))
            })?;

        if result.rows_affected() > 0 {
            info!(account_id = account_id, "Account deleted");
        }

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Profile Operations
    // -------------------------------------------------------------------------

    /// Get a profile by its owning account id.
    #[instrument(skip(self))]
    pub async fn get_profile(&self, account_id: i64) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT account_id, is_freeloader, balance, bio FROM profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get profile: {}", e)))?;

        Ok(profile)
    }

    /// List profiles with optional freeloader-flag and bio-substring filters.
    #[instrument(skip(self))]
    pub async fn list_profiles(
        &self,
        is_freeloader: Option<bool>,
        bio: Option<&str>,
    ) -> Result<Vec<Profile>, AppError> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT account_id, is_freeloader, balance, bio
            FROM profiles
            WHERE ($1::boolean IS NULL OR is_freeloader = $1)
              AND ($2::varchar IS NULL OR bio ILIKE '%' || $2 || '%')
            ORDER BY account_id
            "#,
        )
        .bind(is_freeloader)
        .bind(bio)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list profiles: {}", e)))?;

        Ok(profiles)
    }

    /// Partially update a profile. Absent fields keep their current value.
    #[instrument(skip(self))]
    pub async fn update_profile(
        &self,
        account_id: i64,
        is_freeloader: Option<bool>,
        balance: Option<Decimal>,
        bio: Option<&str>,
    ) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET is_freeloader = COALESCE($2, is_freeloader),
                balance = COALESCE($3, balance),
                bio = COALESCE($4, bio)
            WHERE account_id = $1
            RETURNING account_id, is_freeloader, balance, bio
            "#,
        )
        .bind(account_id)
        .bind(is_freeloader)
        .bind(balance)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update profile: {}", e)))?;

        Ok(profile)
    }

    /// Add `amount` to a profile's balance as a single relational update.
    /// Negative amounts are staff corrections.
    #[instrument(skip(self))]
    pub async fn add_balance(
        &self,
        account_id: i64,
        amount: Decimal,
    ) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET balance = balance + $2
            WHERE account_id = $1
            RETURNING account_id, is_freeloader, balance, bio
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to add balance: {}", e)))?;

        if let Some(ref p) = profile {
            info!(
                account_id = account_id,
                amount = %amount,
                balance = %p.balance,
                "Balance adjusted"
            );
        }

        Ok(profile)
    }

    // -------------------------------------------------------------------------
    // Beverage Catalog Operations
    // -------------------------------------------------------------------------

    /// Create a catalog entry.
    #[instrument(skip(self))]
    pub async fn create_beverage_type(
        &self,
        name: &str,
        price: Decimal,
    ) -> Result<BeverageType, AppError> {
        let beverage = sqlx::query_as::<_, BeverageType>(
            "INSERT INTO beverage_types (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(name)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create beverage type: {}", e))
        })?;

        info!(beverage_type_id = beverage.id, name = %beverage.name, "Beverage type created");

        Ok(beverage)
    }

    /// Get a catalog entry by id.
    #[instrument(skip(self))]
    pub async fn get_beverage_type(
        &self,
        beverage_type_id: i64,
    ) -> Result<Option<BeverageType>, AppError> {
        let beverage = sqlx::query_as::<_, BeverageType>(
            "SELECT id, name, price FROM beverage_types WHERE id = $1",
        )
        .bind(beverage_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get beverage type: {}", e))
        })?;

        Ok(beverage)
    }

    /// List catalog entries with an optional name-substring filter.
    #[instrument(skip(self))]
    pub async fn list_beverage_types(
        &self,
        name: Option<&str>,
    ) -> Result<Vec<BeverageType>, AppError> {
        let beverages = sqlx::query_as::<_, BeverageType>(
            r#"
            SELECT id, name, price
            FROM beverage_types
            WHERE ($1::varchar IS NULL OR name ILIKE '%' || $1 || '%')
            ORDER BY id
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list beverage types: {}", e))
        })?;

        Ok(beverages)
    }

    /// Partially update a catalog entry.
    #[instrument(skip(self))]
    pub async fn update_beverage_type(
        &self,
        beverage_type_id: i64,
        name: Option<&str>,
        price: Option<Decimal>,
    ) -> Result<Option<BeverageType>, AppError> {
        let beverage = sqlx::query_as::<_, BeverageType>(
            r#"
            UPDATE beverage_types
            SET name = COALESCE($2, name),
                price = COALESCE($3, price)
            WHERE id = $1
            RETURNING id, name, price
            "#,
        )
        .bind(beverage_type_id)
        .bind(name)
        .bind(price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update beverage type: {}", e))
        })?;

        Ok(beverage)
    }

    /// Delete a catalog entry. Dependent purchases are removed with it
    /// (cascade policy).
    #[instrument(skip(self))]
    pub async fn delete_beverage_type(&self, beverage_type_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM beverage_types WHERE id = $1")
            .bind(beverage_type_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete beverage type: {}", e))
            })?;

        if result.rows_affected() > 0 {
            info!(
                beverage_type_id = beverage_type_id,
                "Beverage type deleted (purchase history cascaded)"
            );
        }

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Purchase Operations
    // -------------------------------------------------------------------------

    /// Create a purchase and debit the buyer in one transaction.
    ///
    /// The debit is a single relational `balance = balance - price` update so
    /// concurrent purchases against the same account serialize at the
    /// storage layer; there is no read-modify-write in process memory.
    /// Freeloader accounts skip the debit. If any step fails the purchase
    /// row is not inserted.
    #[instrument(skip(self))]
    pub async fn create_purchase(
        &self,
        account_id: i64,
        beverage_type_id: i64,
    ) -> Result<Purchase, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let price = sqlx::query_scalar::<_, Decimal>(
            "SELECT price FROM beverage_types WHERE id = $1",
        )
        .bind(beverage_type_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to resolve price: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Beverage type {} not found", beverage_type_id))
        })?;

        let is_freeloader = sqlx::query_scalar::<_, bool>(
            "SELECT is_freeloader FROM profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to resolve profile: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account {} not found", account_id)))?;

        if !is_freeloader {
            sqlx::query("UPDATE profiles SET balance = balance - $2 WHERE account_id = $1")
                .bind(account_id)
                .bind(price)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to debit balance: {}", e))
                })?;
        }

        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (account_id, beverage_type_id, date)
            VALUES ($1, $2, now())
            RETURNING id, account_id, beverage_type_id, date
            "#,
        )
        .bind(account_id)
        .bind(beverage_type_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert purchase: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        info!(
            purchase_id = purchase.id,
            account_id = account_id,
            beverage_type_id = beverage_type_id,
            debited = !is_freeloader,
            price = %price,
            "Purchase recorded"
        );

        Ok(purchase)
    }

    /// Get a purchase by id.
    #[instrument(skip(self))]
    pub async fn get_purchase(&self, purchase_id: i64) -> Result<Option<Purchase>, AppError> {
        let purchase = sqlx::query_as::<_, Purchase>(
            "SELECT id, account_id, beverage_type_id, date FROM purchases WHERE id = $1",
        )
        .bind(purchase_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get purchase: {}", e)))?;

        Ok(purchase)
    }

    /// List purchases with optional account/beverage-type filters and order.
    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        account_id: Option<i64>,
        beverage_type_id: Option<i64>,
        order: Option<PurchaseOrder>,
    ) -> Result<Vec<Purchase>, AppError> {
        let order_by = order.map(PurchaseOrder::sql).unwrap_or("id ASC");

        let query = format!(
            r#"
            SELECT id, account_id, beverage_type_id, date
            FROM purchases
            WHERE ($1::bigint IS NULL OR account_id = $1)
              AND ($2::bigint IS NULL OR beverage_type_id = $2)
            ORDER BY {}
            "#,
            order_by
        );

        let purchases = sqlx::query_as::<_, Purchase>(&query)
            .bind(account_id)
            .bind(beverage_type_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list purchases: {}", e))
            })?;

        Ok(purchases)
    }

    /// Partially update a purchase's references. The timestamp is immutable.
    /// Balances are never adjusted here; corrections go through add_balance.
    #[instrument(skip(self))]
    pub async fn update_purchase(
        &self,
        purchase_id: i64,
        account_id: Option<i64>,
        beverage_type_id: Option<i64>,
    ) -> Result<Option<Purchase>, AppError> {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            UPDATE purchases
            SET account_id = COALESCE($2, account_id),
                beverage_type_id = COALESCE($3, beverage_type_id)
            WHERE id = $1
            RETURNING id, account_id, beverage_type_id, date
            "#,
        )
        .bind(purchase_id)
        .bind(account_id)
        .bind(beverage_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!("Referenced account or beverage type does not exist"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update purchase: {}", e)),
        })?;

        Ok(purchase)
    }

    /// Delete a purchase. No balance reversal.
    #[instrument(skip(self))]
    pub async fn delete_purchase(&self, purchase_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(purchase_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete purchase: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Group the (optionally account-filtered) purchase set by beverage type.
    #[instrument(skip(self))]
    pub async fn purchase_counts(
        &self,
        account_id: Option<i64>,
        order: CountOrder,
    ) -> Result<Vec<PurchaseCount>, AppError> {
        let query = format!(
            r#"
            SELECT beverage_type_id, COUNT(*) AS count
            FROM purchases
            WHERE ($1::bigint IS NULL OR account_id = $1)
            GROUP BY beverage_type_id
            ORDER BY {}, beverage_type_id
            "#,
            order.sql()
        );

        let counts = sqlx::query_as::<_, PurchaseCount>(&query)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate purchases: {}", e))
            })?;

        Ok(counts)
    }
}
