//! Cross-repository checkout flows, including concurrent sales contending
//! for the same batch.

use chrono::{Duration, Utc};

use apotek_db::{
    CreateSaleRequest, CustomerInfo, Database, DbConfig, DbError, NewBatch, NewMedicine, SaleLine,
};

async fn seed(db: &Database, stock: i64) -> i64 {
    let category = db.categories().get_or_create("Analgesik").await.unwrap();
    let medicine = db
        .medicines()
        .create(NewMedicine {
            barcode_id: None,
            name: "Paracetamol".to_string(),
            generic_name: None,
            category_id: category.id,
            manufacturer: None,
            unit: "tablet".to_string(),
            capacity: None,
            minimum_stock: None,
            purchase_price_cents: 4_000_00,
            selling_price_cents: 8_000_00,
            description: None,
            storage_location: None,
            image_url: None,
        })
        .await
        .unwrap()
        .medicine;

    if stock > 0 {
        db.batches()
            .insert(NewBatch {
                medicine_id: medicine.id,
                batch_number: "B-1".to_string(),
                expiry_date: Utc::now().date_naive() + Duration::days(180),
                quantity: stock,
                purchase_price_cents: 4_000_00,
                supplier: None,
                received_date: None,
            })
            .await
            .unwrap();
    }
    medicine.id
}

fn request(nik_tail: u8, medicine_id: i64, quantity: i64) -> CreateSaleRequest {
    CreateSaleRequest {
        customer: CustomerInfo {
            name: format!("Pelanggan {nik_tail}"),
            nik: format!("32010115039000{nik_tail:02}"),
            phone: None,
            whatsapp: None,
            address: None,
        },
        doctor: None,
        prescription_number: None,
        items: vec![SaleLine { medicine_id, quantity }],
        payment_method: Default::default(),
        cash_cents: None,
        notes: None,
        cashier: "kasir1".to_string(),
    }
}

#[tokio::test]
async fn concurrent_sales_never_oversell() {
    // File-backed with a multi-connection pool so the two transactions
    // genuinely overlap; the in-memory config pins one connection and
    // would serialize them before the quantity guard is ever contended
    let dir = tempfile::TempDir::new().unwrap();
    let config = DbConfig::new(dir.path().join("race.db")).max_connections(4);
    let db = Database::new(config).await.unwrap();
    // Stock covers exactly one of the two competing sales
    let medicine = seed(&db, 10).await;

    let a = {
        let db = db.clone();
        tokio::spawn(async move { db.sales().create_sale(request(1, medicine, 8)).await })
    };
    let b = {
        let db = db.clone();
        tokio::spawn(async move { db.sales().create_sale(request(2, medicine, 8)).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(DbError::InsufficientStock { .. })))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(refused, 1);
    assert_eq!(db.batches().total_stock(medicine).await.unwrap(), 2);
    assert_eq!(db.sales().recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeat_customer_keeps_one_record_across_sales() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let medicine = seed(&db, 50).await;

    let mut first = request(1, medicine, 2);
    first.customer.whatsapp = Some("0811111111".to_string());
    db.sales().create_sale(first).await.unwrap();

    // Same NIK, different spelling of the name
    let mut second = request(1, medicine, 3);
    second.customer.name = "Pelanggan Satu".to_string();
    db.sales().create_sale(second).await.unwrap();

    let hits = db.customers().search("3201011503900001").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Pelanggan Satu");
    // Contact kept from the first sale
    assert_eq!(hits[0].whatsapp.as_deref(), Some("62811111111"));

    assert_eq!(db.batches().total_stock(medicine).await.unwrap(), 45);
    assert_eq!(db.sales().recent(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn batch_expiring_tomorrow_is_still_sellable_today() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let medicine = seed(&db, 0).await;

    // The earliest legal expiry is tomorrow; it is sellable today only
    db.batches()
        .insert(NewBatch {
            medicine_id: medicine,
            batch_number: "B-EDGE".to_string(),
            expiry_date: Utc::now().date_naive() + Duration::days(1),
            quantity: 10,
            purchase_price_cents: 4_000_00,
            supplier: None,
            received_date: None,
        })
        .await
        .unwrap();

    // Still strictly-future today, so the sale goes through
    let sale = db.sales().create_sale(request(1, medicine, 5)).await;
    assert!(sale.is_ok());
}

#[tokio::test]
async fn top_selling_aggregates_across_sales() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let medicine = seed(&db, 50).await;

    db.sales().create_sale(request(1, medicine, 4)).await.unwrap();
    db.sales().create_sale(request(2, medicine, 6)).await.unwrap();

    let top = db.sales().top_selling(5).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "Paracetamol");
    assert_eq!(top[0].total_sold, 10);
}
