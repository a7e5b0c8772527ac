//! # Customer Repository
//!
//! ## Tables
//! ```text
//! customers ──┬── customer_payments  (one row per payment, order_id optional)
//!             └── customer_notes     (staff notes, newest first)
//! ```
//!
//! `customers.total_spent` is kept in step with `customer_payments` inside
//! the same transaction, so list pages never need to sum payments.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::clean;
use crate::error::{DbError, DbResult};
use shopdesk_core::customer::{Customer, CustomerInput, CustomerNote, CustomerPayment, LoyaltyLevel};
use shopdesk_core::{CustomerType, Money, PaymentMethod};

const SELECT_CUSTOMER: &str = r#"
    SELECT id, name, phone, email, whatsapp, city, customer_type, loyalty_level,
           color_tag, referral_source, points, total_spent, birth_month, birth_day,
           is_active, is_read, joined_at, last_visit_at
    FROM customers
"#;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    whatsapp: Option<String>,
    city: Option<String>,
    customer_type: CustomerType,
    loyalty_level: Option<LoyaltyLevel>,
    color_tag: Option<String>,
    referral_source: Option<String>,
    points: i64,
    total_spent: i64,
    birth_month: Option<i64>,
    birth_day: Option<i64>,
    is_active: bool,
    is_read: bool,
    joined_at: DateTime<Utc>,
    last_visit_at: Option<DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            whatsapp: row.whatsapp,
            city: row.city,
            customer_type: row.customer_type,
            loyalty_level: row.loyalty_level,
            color_tag: row.color_tag,
            referral_source: row.referral_source,
            points: row.points,
            total_spent: Some(Money::from_minor(row.total_spent)),
            payments: Vec::new(),
            notes: Vec::new(),
            birth_month: row.birth_month.and_then(|m| u32::try_from(m).ok()),
            birth_day: row.birth_day.and_then(|d| u32::try_from(d).ok()),
            is_active: row.is_active,
            is_read: row.is_read,
            joined_at: row.joined_at,
            last_visit_at: row.last_visit_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    order_id: Option<String>,
    amount: i64,
    method: PaymentMethod,
    paid_at: DateTime<Utc>,
}

impl From<PaymentRow> for CustomerPayment {
    fn from(row: PaymentRow) -> Self {
        CustomerPayment {
            id: row.id,
            order_id: row.order_id,
            amount: Money::from_minor(row.amount),
            method: row.method,
            paid_at: row.paid_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NoteRow {
    id: String,
    content: String,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for CustomerNote {
    fn from(row: NoteRow) -> Self {
        CustomerNote {
            id: row.id,
            content: row.content,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Every customer, newest first. Payments and notes are not loaded;
    /// `total_spent` carries the lifetime spend.
    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("{SELECT_CUSTOMER} ORDER BY joined_at DESC");
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded customers");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Full customer record including payments and notes.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("{SELECT_CUSTOMER} WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut customer = Customer::from(row);

        customer.payments = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, order_id, amount, method, paid_at
            FROM customer_payments
            WHERE customer_id = ?1
            ORDER BY paid_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CustomerPayment::from)
        .collect();

        customer.notes = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, content, created_by, created_at
            FROM customer_notes
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CustomerNote::from)
        .collect();

        Ok(Some(customer))
    }

    async fn require(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Inserts a customer created at the counter. The input must already
    /// be validated.
    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: clean(&input.email),
            whatsapp: clean(&input.whatsapp),
            city: clean(&input.city),
            customer_type: input.customer_type,
            loyalty_level: Some(LoyaltyLevel::default()),
            color_tag: clean(&input.color_tag),
            referral_source: clean(&input.referral_source),
            points: 0,
            total_spent: Some(Money::zero()),
            payments: Vec::new(),
            notes: Vec::new(),
            birth_month: input.birth_month,
            birth_day: input.birth_day,
            is_active: true,
            is_read: true,
            joined_at: now,
            last_visit_at: None,
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, email, whatsapp, city, customer_type, loyalty_level,
                color_tag, referral_source, points, total_spent, birth_month, birth_day,
                is_active, is_read, joined_at, last_visit_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, 0, ?11, ?12, 1, 1, ?13, NULL)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.whatsapp)
        .bind(&customer.city)
        .bind(customer.customer_type)
        .bind(customer.loyalty_level)
        .bind(&customer.color_tag)
        .bind(&customer.referral_source)
        .bind(customer.birth_month.map(i64::from))
        .bind(customer.birth_day.map(i64::from))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Replaces the profile fields. Points, spend and history are untouched.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?2, phone = ?3, email = ?4, whatsapp = ?5, city = ?6,
                customer_type = ?7, color_tag = ?8, referral_source = ?9,
                birth_month = ?10, birth_day = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(input.phone.trim())
        .bind(clean(&input.email))
        .bind(clean(&input.whatsapp))
        .bind(clean(&input.city))
        .bind(input.customer_type)
        .bind(clean(&input.color_tag))
        .bind(clean(&input.referral_source))
        .bind(input.birth_month.map(i64::from))
        .bind(input.birth_day.map(i64::from))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        self.require(id).await
    }

    pub async fn mark_as_read(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }

    /// Records a shop visit: awards `points`, upgrades the tier if earned
    /// and stamps `last_visit_at`.
    pub async fn check_in(&self, id: &str, points: i64) -> DbResult<Customer> {
        let mut customer = self.require(id).await?;
        customer.check_in(points, Utc::now());

        debug!(
            id = %id,
            points = customer.points,
            level = %customer.effective_level(),
            "Customer checked in"
        );

        sqlx::query(
            r#"
            UPDATE customers
            SET points = ?2, loyalty_level = ?3, last_visit_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(customer.points)
        .bind(customer.loyalty_level)
        .bind(customer.last_visit_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn add_note(
        &self,
        id: &str,
        content: &str,
        created_by: Option<&str>,
    ) -> DbResult<CustomerNote> {
        let note = CustomerNote {
            id: Uuid::new_v4().to_string(),
            content: content.trim().to_string(),
            created_by: created_by.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO customer_notes (id, customer_id, content, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&note.id)
        .bind(id)
        .bind(&note.content)
        .bind(&note.created_by)
        .bind(note.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| missing_customer(e, id))?;

        Ok(note)
    }

    /// Records a payment outside a sale (installment, settling a balance).
    pub async fn record_payment(
        &self,
        id: &str,
        amount: Money,
        method: PaymentMethod,
        order_id: Option<&str>,
    ) -> DbResult<CustomerPayment> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let payment = insert_payment(&mut tx, id, amount, method, order_id, Utc::now()).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(payment)
    }
}

/// Inserts a payment row and bumps `total_spent` on the caller's
/// transaction. Shared with the order repository.
pub(crate) async fn insert_payment(
    tx: &mut Transaction<'_, Sqlite>,
    customer_id: &str,
    amount: Money,
    method: PaymentMethod,
    order_id: Option<&str>,
    paid_at: DateTime<Utc>,
) -> DbResult<CustomerPayment> {
    let payment = CustomerPayment {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.map(str::to_string),
        amount,
        method,
        paid_at,
    };

    debug!(
        customer_id = %customer_id,
        amount = %payment.amount,
        method = %payment.method,
        "Recording customer payment"
    );

    sqlx::query(
        r#"
        INSERT INTO customer_payments (id, customer_id, order_id, amount, method, paid_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&payment.id)
    .bind(customer_id)
    .bind(&payment.order_id)
    .bind(payment.amount.minor())
    .bind(payment.method)
    .bind(payment.paid_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| missing_customer(e, customer_id))?;

    sqlx::query("UPDATE customers SET total_spent = total_spent + ?2 WHERE id = ?1")
        .bind(customer_id)
        .bind(payment.amount.minor())
        .execute(&mut **tx)
        .await?;

    Ok(payment)
}

fn missing_customer(err: sqlx::Error, id: &str) -> DbError {
    match DbError::from(err) {
        DbError::ForeignKeyViolation { .. } => DbError::not_found("Customer", id),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    fn amina() -> CustomerInput {
        CustomerInput {
            name: "Amina Juma".into(),
            phone: "+255 712 345 678".into(),
            whatsapp: Some(" ".into()),
            city: Some("Arusha".into()),
            birth_month: Some(3),
            birth_day: Some(14),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let db = memory_db().await;
        let repo = db.customers();

        let created = repo.create(&amina()).await.unwrap();
        assert_eq!(created.whatsapp, None);

        let loaded = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Amina Juma");
        assert_eq!(loaded.birth_month, Some(3));
        assert_eq!(loaded.loyalty_level, Some(LoyaltyLevel::Bronze));
        assert_eq!(loaded.spent(), Money::zero());
        assert!(loaded.is_read);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_in_awards_points_and_visit() {
        let db = memory_db().await;
        let repo = db.customers();
        let c = repo.create(&amina()).await.unwrap();

        let after = repo.check_in(&c.id, 5).await.unwrap();
        assert_eq!(after.points, 5);
        assert!(after.last_visit_at.is_some());

        let upgraded = repo.check_in(&c.id, 1_000).await.unwrap();
        assert_eq!(upgraded.loyalty_level, Some(LoyaltyLevel::Silver));

        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.points, 1_005);
        assert_eq!(stored.loyalty_level, Some(LoyaltyLevel::Silver));
    }

    #[tokio::test]
    async fn test_payment_updates_total_spent() {
        let db = memory_db().await;
        let repo = db.customers();
        let c = repo.create(&amina()).await.unwrap();

        repo.record_payment(&c.id, Money::from_minor(20_000), PaymentMethod::MobileMoney, None)
            .await
            .unwrap();
        repo.record_payment(&c.id, Money::from_minor(5_000), PaymentMethod::Cash, None)
            .await
            .unwrap();

        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.payments.len(), 2);
        assert_eq!(stored.spent().minor(), 25_000);

        let err = repo
            .record_payment("ghost", Money::from_minor(1), PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_notes_and_read_flag() {
        let db = memory_db().await;
        let repo = db.customers();
        let c = repo.create(&amina()).await.unwrap();

        sqlx::query("UPDATE customers SET is_read = 0 WHERE id = ?1")
            .bind(&c.id)
            .execute(db.pool())
            .await
            .unwrap();
        repo.mark_as_read(&c.id).await.unwrap();

        repo.add_note(&c.id, "  Wants a screen protector  ", Some("cashier-1"))
            .await
            .unwrap();

        let stored = repo.get_by_id(&c.id).await.unwrap().unwrap();
        assert!(stored.is_read);
        assert_eq!(stored.notes[0].content, "Wants a screen protector");
        assert!(repo.mark_as_read("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = memory_db().await;
        let repo = db.customers();
        let c = repo.create(&amina()).await.unwrap();

        let edited = CustomerInput {
            customer_type: CustomerType::Wholesale,
            color_tag: Some("vip".into()),
            ..amina()
        };
        let updated = repo.update(&c.id, &edited).await.unwrap();
        assert_eq!(updated.customer_type, CustomerType::Wholesale);
        assert_eq!(updated.color_tag.as_deref(), Some("vip"));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
