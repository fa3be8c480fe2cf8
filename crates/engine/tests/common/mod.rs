#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};

use engine::{CanonicalFilter, Engine, NewAccount, NewCategory, NewStore, RawFilter, Role};
use migration::MigratorTrait;

/// Two stores, one income and one expense category, three entries:
///
/// | store    | category | amount | time                |
/// |----------|----------|--------|---------------------|
/// | Downtown | Sales    | +100   | 2024-01-05 10:00:00 |
/// | Downtown | Rent     | -40    | 2024-01-31 23:30:00 |
/// | Harbor   | Sales    | +30    | 2024-02-03 09:15:00 |
///
/// `staff` may see Downtown only; `outsider` has no grants.
pub struct Ledger {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub admin: i64,
    pub staff: i64,
    pub outsider: i64,
    pub downtown: i64,
    pub harbor: i64,
    pub sales: i64,
    pub rent: i64,
}

pub async fn empty_engine() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn ledger() -> Ledger {
    let (engine, db) = empty_engine().await;

    let admin = engine
        .create_user("admin", Some("Boss"), Role::Admin)
        .await
        .unwrap();
    let staff = engine.create_user("bob", None, Role::Staff).await.unwrap();
    let outsider = engine.create_user("carol", None, Role::Staff).await.unwrap();

    let downtown = engine
        .create_store(
            admin,
            NewStore {
                name: "Downtown".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let harbor = engine
        .create_store(
            admin,
            NewStore {
                name: "Harbor".to_string(),
                address: Some("Pier 4".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine
        .grant_store_permission(admin, staff, downtown)
        .await
        .unwrap();

    let sales = engine
        .create_category(
            admin,
            NewCategory {
                name: "Sales".to_string(),
                is_expense: false,
                kind_code: None,
                sort_order: 1,
            },
        )
        .await
        .unwrap();
    let rent = engine
        .create_category(
            admin,
            NewCategory {
                name: "Rent".to_string(),
                is_expense: true,
                kind_code: Some(2),
                sort_order: 2,
            },
        )
        .await
        .unwrap();

    let ledger = Ledger {
        engine,
        db,
        admin,
        staff,
        outsider,
        downtown,
        harbor,
        sales,
        rent,
    };
    ledger
        .entry(downtown, sales, 100.0, "2024-01-05 10:00:00", Some("weekly sales"))
        .await;
    ledger
        .entry(downtown, rent, -40.0, "2024-01-31 23:30:00", Some("January rent"))
        .await;
    ledger
        .entry(harbor, sales, 30.0, "2024-02-03T09:15:00", None)
        .await;
    ledger
}

impl Ledger {
    pub async fn entry(
        &self,
        store_id: i64,
        category_id: i64,
        amount: f64,
        time: &str,
        remark: Option<&str>,
    ) -> i64 {
        self.engine
            .create_account(NewAccount {
                store_id,
                user_id: self.admin,
                category_id,
                amount,
                remark: remark.map(ToString::to_string),
                transaction_time: Some(time.to_string()),
            })
            .await
            .unwrap()
    }
}

pub fn raw_store(store_id: &str) -> RawFilter {
    RawFilter {
        store_id: Some(store_id.to_string()),
        ..Default::default()
    }
}

pub fn all() -> CanonicalFilter {
    CanonicalFilter::default()
}
