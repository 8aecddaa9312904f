//! # Seed Data Generator
//!
//! Populates a development database with customers, bills and quotations.
//!
//! ## Usage
//! ```bash
//! # 20 bills spread over the last 7 days (default)
//! cargo run -p glazier-db --bin seed
//!
//! # Custom amount
//! cargo run -p glazier-db --bin seed -- --bills 200
//!
//! # Specify database path
//! cargo run -p glazier-db --bin seed -- --db ./data/glazier.db
//! ```
//!
//! ## Generated Data
//! - A fixed set of customers
//! - Bills rotating through customers (every fourth one walk-in), products,
//!   sizes and payment methods
//! - One quotation per five bills

use chrono::{Duration, Local, NaiveDateTime, Utc};
use glazier_core::billing::{generate_invoice_number, generate_quotation_number};
use glazier_core::{Bill, BillItem, Catalog, Customer, Dimensions, PaymentMethod, Quotation, Unit};
use glazier_db::{Database, DbConfig};
use std::env;

const CUSTOMERS: &[(&str, &str, Option<&str>)] = &[
    ("Meera Glass House", "98765 43210", Some("accounts@meeraglass.in")),
    ("Ravi Interiors", "91234 56780", None),
    ("Sharma Builders", "99887 76655", Some("office@sharmabuilders.in")),
    ("Anand Furniture", "90000 11122", None),
    ("Lakshmi Aluminium Works", "98450 12345", None),
];

const SIZES: &[(f64, f64, Unit)] = &[
    (24.0, 36.0, Unit::Inch),
    (18.0, 24.0, Unit::Inch),
    (1200.0, 900.0, Unit::Mm),
    (60.0, 45.0, Unit::Cm),
    (4.0, 3.0, Unit::Feet),
];

const PAYMENTS: [PaymentMethod; 4] = [
    PaymentMethod::Cash,
    PaymentMethod::Upi,
    PaymentMethod::Card,
    PaymentMethod::Cheque,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut bills: usize = 20;
    let mut db_path = String::from("./glazier_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bills" | "-b" => {
                if i + 1 < args.len() {
                    bills = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Glazier Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --bills <N>    Number of bills to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./glazier_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Glazier Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Bills:    {}", bills);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let billing = db.billing();
    println!("✓ Connected to database, migrations applied");

    let existing = db.documents::<Customer>().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut customers = Vec::new();
    for (name, phone, email) in CUSTOMERS {
        let mut customer = Customer::new(*name, *phone);
        customer.email = email.map(str::to_string);
        customers.push(billing.add_customer(customer).await?.data);
    }
    println!("✓ Added {} customers", customers.len());

    let catalog = Catalog::standard();
    let products = catalog.products();
    let now = Local::now().naive_local();

    let mut quotations = 0;
    for n in 0..bills {
        let date = now - Duration::hours((n as i64 * 7) % (7 * 24));
        let items = vec![
            line(&catalog, &products[n % products.len()].id, n),
            line(&catalog, &products[(n * 7 + 3) % products.len()].id, n + 1),
        ];
        let customer = (n % 4 != 3).then(|| customers[n % customers.len()].clone());

        if n % 5 == 0 {
            let quotation = Quotation::new(
                generate_quotation_number(Utc::now() + Duration::milliseconds(n as i64)),
                date,
                customer.clone(),
                items.clone(),
            )?;
            billing.add_quotation(quotation).await?;
            quotations += 1;
        }

        let bill = seed_bill(date, customer, n, items)?;
        if let Err(e) = billing.add_bill(bill).await {
            eprintln!("Failed to insert bill {}: {}", n, e);
        }
    }

    println!("✓ Added {} bills and {} quotations", bills, quotations);

    let today = billing.daily_summary(now.date()).await?;
    println!();
    println!(
        "Today: {} sales, ₹{:.2} total, ₹{:.2} average",
        today.transactions, today.total, today.average
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn line(catalog: &Catalog, product_id: &str, n: usize) -> BillItem {
    let (width, height, unit) = &SIZES[n % SIZES.len()];
    let product = catalog
        .product_by_id(product_id)
        .cloned()
        .unwrap_or_else(|| catalog.products()[0].clone());
    BillItem::priced(&product, &Dimensions::new(*width, *height, unit.clone()), (n % 3) as u32 + 1)
}

fn seed_bill(
    date: NaiveDateTime,
    customer: Option<Customer>,
    n: usize,
    items: Vec<BillItem>,
) -> Result<Bill, glazier_core::CoreError> {
    Bill::new(
        generate_invoice_number(date.date()),
        date,
        customer,
        "Seed",
        PAYMENTS[n % PAYMENTS.len()],
        items,
    )
}
