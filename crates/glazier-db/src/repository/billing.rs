//! # Billing Service
//!
//! Back-office workflows on top of the document store: customers, bills,
//! quotations and the daily sales ledger.
//!
//! ## Saving a Bill
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_bill(bill)                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────── ONE TRANSACTION ───────────────────────┐  │
//! │  │  INSERT bills      ← the bill as given                            │  │
//! │  │  INSERT dailySales ← bill.daily_sale()                            │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  publish(bills), publish(dailySales)                                    │
//! │       └── ChangePublisher writes the fresh listing to the sync store,   │
//! │           so every open view picks it up on its next poll               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use glazier_core::billing::{Bill, Quotation};
use glazier_core::types::{Customer, DailySale, DailySummary, DataType};
use glazier_core::validation::validate_customer;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::document::{insert_document, Document, DocumentRow, StoredRecord, SELECT_COLUMNS};

/// Receives the full listing of a collection after it changed.
///
/// Implementations handle their own failures; a mutation that already
/// committed is never reported as failed because publishing did not work.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, data_type: DataType, snapshot: Value);
}

/// Customers, bills, quotations and daily sales.
#[derive(Clone)]
pub struct BillingService {
    db: Database,
    publisher: Option<Arc<dyn ChangePublisher>>,
}

impl fmt::Debug for BillingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingService")
            .field("publishing", &self.publisher.is_some())
            .finish()
    }
}

impl BillingService {
    pub fn new(db: Database) -> Self {
        BillingService { db, publisher: None }
    }

    /// Publishes every collection this service changes.
    pub fn with_publisher(mut self, publisher: Arc<dyn ChangePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Validates and stores a new customer.
    ///
    /// ## Errors
    /// - `Validation` when the name or phone is missing or malformed
    pub async fn add_customer(&self, customer: Customer) -> DbResult<Document<Customer>> {
        validate_customer(&customer)?;
        let doc = self.db.documents::<Customer>().create(customer).await?;
        info!(id = %doc.id, name = %doc.data.name, "Customer added");
        self.publish::<Customer>().await;
        Ok(doc)
    }

    pub async fn customers(&self) -> DbResult<Vec<Document<Customer>>> {
        self.db.documents::<Customer>().list().await
    }

    pub async fn customer(&self, id: &str) -> DbResult<Option<Document<Customer>>> {
        self.db.documents::<Customer>().get_by_id(id).await
    }

    /// Merges `patch` into a customer (see `DocumentRepository::update`).
    pub async fn update_customer(&self, id: &str, patch: Value) -> DbResult<Document<Customer>> {
        let doc = self.db.documents::<Customer>().update(id, patch).await?;
        self.publish::<Customer>().await;
        Ok(doc)
    }

    pub async fn delete_customer(&self, id: &str) -> DbResult<bool> {
        let removed = self.db.documents::<Customer>().delete(id).await?;
        if removed {
            self.publish::<Customer>().await;
        }
        Ok(removed)
    }

    /// Customers matching the search box, newest first.
    /// See [`Customer::matches`] for the matching rules.
    pub async fn search_customers(&self, term: &str) -> DbResult<Vec<Document<Customer>>> {
        let mut customers = self.customers().await?;
        customers.retain(|doc| doc.data.matches(term));
        Ok(customers)
    }

    // =========================================================================
    // Bills
    // =========================================================================

    /// Stores a bill together with its daily-sales entry.
    ///
    /// Both rows are written in one transaction: either the bill and its
    /// ledger entry exist, or neither does.
    pub async fn add_bill(&self, bill: Bill) -> DbResult<Document<Bill>> {
        let sale = bill.daily_sale();

        let mut tx = self.db.pool().begin().await?;
        let doc = insert_document(&mut tx, bill).await?;
        insert_document(&mut tx, sale).await?;
        tx.commit().await?;

        info!(
            id = %doc.id,
            invoice = %doc.data.invoice_number,
            total = doc.data.total,
            "Bill saved"
        );

        self.publish::<Bill>().await;
        self.publish::<DailySale>().await;
        Ok(doc)
    }

    pub async fn bills(&self) -> DbResult<Vec<Document<Bill>>> {
        self.db.documents::<Bill>().list().await
    }

    pub async fn bill(&self, id: &str) -> DbResult<Option<Document<Bill>>> {
        self.db.documents::<Bill>().get_by_id(id).await
    }

    /// Deletes a bill. Its daily-sales entry is kept.
    pub async fn delete_bill(&self, id: &str) -> DbResult<bool> {
        let removed = self.db.documents::<Bill>().delete(id).await?;
        if removed {
            self.publish::<Bill>().await;
        }
        Ok(removed)
    }

    // =========================================================================
    // Quotations
    // =========================================================================

    pub async fn add_quotation(&self, quotation: Quotation) -> DbResult<Document<Quotation>> {
        let doc = self.db.documents::<Quotation>().create(quotation).await?;
        info!(
            id = %doc.id,
            quotation = %doc.data.quotation_number,
            "Quotation saved"
        );
        self.publish::<Quotation>().await;
        Ok(doc)
    }

    pub async fn quotations(&self) -> DbResult<Vec<Document<Quotation>>> {
        self.db.documents::<Quotation>().list().await
    }

    pub async fn quotation(&self, id: &str) -> DbResult<Option<Document<Quotation>>> {
        self.db.documents::<Quotation>().get_by_id(id).await
    }

    pub async fn delete_quotation(&self, id: &str) -> DbResult<bool> {
        let removed = self.db.documents::<Quotation>().delete(id).await?;
        if removed {
            self.publish::<Quotation>().await;
        }
        Ok(removed)
    }

    // =========================================================================
    // Daily Sales
    // =========================================================================

    /// Sales recorded on `date`, earliest first.
    pub async fn daily_sales(&self, date: NaiveDate) -> DbResult<Vec<Document<DailySale>>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE collection = ?1 AND json_extract(payload, '$.date') = ?2 \
             ORDER BY json_extract(payload, '$.time') ASC, rowid ASC"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(DataType::DailySales.as_str())
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(DocumentRow::decode_or_skip::<DailySale>)
            .collect())
    }

    /// Totals for `date`.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let sales = self.daily_sales(date).await?;
        Ok(DailySummary::from_sales(sales.iter().map(|doc| &doc.data)))
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publishes every collection, e.g. to fill an empty sync store on
    /// startup. No-op without a publisher.
    pub async fn publish_all(&self) {
        self.publish::<Customer>().await;
        self.publish::<Bill>().await;
        self.publish::<Quotation>().await;
        self.publish::<DailySale>().await;
    }

    async fn publish<T: StoredRecord>(&self) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let listing = match self.db.documents::<T>().list().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(collection = %T::COLLECTION, error = %e, "Could not list collection for publishing");
                return;
            }
        };

        match serde_json::to_value(&listing) {
            Ok(snapshot) => publisher.publish(T::COLLECTION, snapshot).await,
            Err(e) => warn!(collection = %T::COLLECTION, error = %e, "Could not encode collection for publishing"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::DbConfig;
    use glazier_core::billing::BillItem;
    use glazier_core::catalog::Catalog;
    use glazier_core::pricing::Dimensions;
    use glazier_core::types::{PaymentMethod, WALK_IN_CUSTOMER};
    use glazier_core::units::Unit;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(DataType, usize)>>,
    }

    #[async_trait]
    impl ChangePublisher for RecordingPublisher {
        async fn publish(&self, data_type: DataType, snapshot: Value) {
            let len = snapshot.as_array().map_or(0, |items| items.len());
            self.published.lock().unwrap().push((data_type, len));
        }
    }

    async fn setup() -> (BillingService, Arc<RecordingPublisher>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let publisher = Arc::new(RecordingPublisher::default());
        let service = db.billing().with_publisher(publisher.clone());
        (service, publisher)
    }

    fn bill_at(day: u32, hour: u32, customer: Option<Customer>) -> Bill {
        let catalog = Catalog::standard();
        let items = vec![
            BillItem::priced(
                catalog.product_by_id("clear-5mm").unwrap(),
                &Dimensions::new(24.0, 36.0, Unit::Inch),
                2,
            ),
            BillItem::priced(
                catalog.product_by_id("mirror-5mm").unwrap(),
                &Dimensions::new(1.0, 1.0, Unit::Feet),
                1,
            ),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        Bill::new(
            format!("GGC/2610{day:02}/{hour:04}"),
            date,
            customer,
            "Sunil",
            PaymentMethod::Cash,
            items,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_bill_records_daily_sale() {
        let (service, _) = setup().await;

        let doc = service.add_bill(bill_at(18, 11, None)).await.unwrap();
        assert_eq!(doc.data.total, 905.0);

        let sales = service
            .daily_sales(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].data.sale_id, doc.data.invoice_number);
        assert_eq!(sales[0].data.customer, WALK_IN_CUSTOMER);
        assert_eq!(sales[0].data.amount, 905.0);
        assert_eq!(sales[0].data.items, 3);
    }

    #[tokio::test]
    async fn test_daily_sales_filters_by_day_and_sorts_by_time() {
        let (service, _) = setup().await;
        let meera = Some(Customer::new("Meera", "9876543210"));

        service.add_bill(bill_at(18, 16, None)).await.unwrap();
        service.add_bill(bill_at(17, 12, None)).await.unwrap();
        service.add_bill(bill_at(18, 9, meera)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let sales = service.daily_sales(day).await.unwrap();
        let customers: Vec<&str> = sales.iter().map(|s| s.data.customer.as_str()).collect();
        assert_eq!(customers, vec!["Meera", WALK_IN_CUSTOMER]);

        let summary = service.daily_summary(day).await.unwrap();
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.total, 1810.0);
        assert_eq!(summary.items, 6);
        assert_eq!(summary.average, 905.0);

        let empty = service
            .daily_summary(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
            .await
            .unwrap();
        assert_eq!(empty, DailySummary::default());
    }

    #[tokio::test]
    async fn test_customer_validation_and_search() {
        let (service, _) = setup().await;

        let rejected = service.add_customer(Customer::new("", "9876543210")).await;
        assert!(matches!(rejected, Err(DbError::Validation(_))));

        let mut meera = Customer::new("Meera Glass House", "98765 43210");
        meera.email = Some("accounts@meera.in".to_string());
        service.add_customer(meera).await.unwrap();
        service.add_customer(Customer::new("Ravi", "9123456780")).await.unwrap();

        assert_eq!(service.search_customers("GLASS").await.unwrap().len(), 1);
        assert_eq!(service.search_customers("accounts").await.unwrap().len(), 1);
        assert_eq!(service.search_customers("91234").await.unwrap().len(), 1);
        assert_eq!(service.search_customers("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mutations_publish_listings() {
        let (service, publisher) = setup().await;

        let customer = service
            .add_customer(Customer::new("Meera", "9876543210"))
            .await
            .unwrap();
        service.add_bill(bill_at(18, 10, None)).await.unwrap();
        service.delete_customer(&customer.id).await.unwrap();
        // nothing removed, nothing published
        service.delete_customer(&customer.id).await.unwrap();

        let published = publisher.published.lock().unwrap().clone();
        assert_eq!(
            published,
            vec![
                (DataType::Customers, 1),
                (DataType::Bills, 1),
                (DataType::DailySales, 1),
                (DataType::Customers, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_quotation_round_trip() {
        let (service, publisher) = setup().await;
        let bill = bill_at(18, 10, None);
        let quotation = Quotation::new("QTN-1760781600000", bill.date, None, bill.items).unwrap();

        let doc = service.add_quotation(quotation).await.unwrap();
        let fetched = service.quotation(&doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.data.quotation_number, "QTN-1760781600000");
        assert_eq!(service.quotations().await.unwrap().len(), 1);

        assert!(service.delete_quotation(&doc.id).await.unwrap());
        assert!(service.quotations().await.unwrap().is_empty());

        let published = publisher.published.lock().unwrap().clone();
        assert_eq!(published, vec![(DataType::Quotations, 1), (DataType::Quotations, 0)]);
    }

    #[tokio::test]
    async fn test_publish_all_covers_every_collection() {
        let (service, publisher) = setup().await;
        service.add_customer(Customer::new("Sharma Builders", "99887 76655")).await.unwrap();
        publisher.published.lock().unwrap().clear();

        service.publish_all().await;

        let published = publisher.published.lock().unwrap().clone();
        assert_eq!(
            published,
            vec![
                (DataType::Customers, 1),
                (DataType::Bills, 0),
                (DataType::Quotations, 0),
                (DataType::DailySales, 0),
            ]
        );
    }
}
