mod common;

use std::{collections::BTreeSet, time::Duration};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbBackend, FromQueryResult, Statement};

use engine::{
    CategoryKind, DefaultSettings, Engine, EngineError, NewAccount, NewCategory, NewStore,
    NewUsage, RawFilter, RetryPolicy, Role, Scope, is_contention,
};

use migration::MigratorTrait;

use common::{all, empty_engine, ledger};

#[derive(Debug, FromQueryResult)]
struct Total {
    total: i64,
}

async fn count(db: &sea_orm::DatabaseConnection, sql: &str) -> i64 {
    Total::find_by_statement(Statement::from_string(DbBackend::Sqlite, sql))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .total
}

#[tokio::test]
async fn zero_and_non_finite_amounts_are_rejected() {
    let ledger = ledger().await;

    for amount in [0.0, f64::NAN, f64::INFINITY] {
        let err = ledger
            .engine
            .create_account(NewAccount {
                store_id: ledger.downtown,
                user_id: ledger.admin,
                category_id: ledger.sales,
                amount,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{amount}");
    }
}

#[tokio::test]
async fn staff_cannot_write_to_foreign_store() {
    let ledger = ledger().await;

    let err = ledger
        .engine
        .create_account(NewAccount {
            store_id: ledger.harbor,
            user_id: ledger.staff,
            category_id: ledger.sales,
            amount: 12.5,
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn missing_store_or_category_is_not_found() {
    let ledger = ledger().await;

    let missing_store = ledger
        .engine
        .create_account(NewAccount {
            store_id: 77,
            user_id: ledger.admin,
            category_id: ledger.sales,
            amount: 1.0,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        missing_store,
        EngineError::KeyNotFound("store not exists".to_string())
    );

    let missing_category = ledger
        .engine
        .create_account(NewAccount {
            store_id: ledger.downtown,
            user_id: ledger.admin,
            category_id: 77,
            amount: 1.0,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        missing_category,
        EngineError::KeyNotFound("category not exists".to_string())
    );
}

#[tokio::test]
async fn staff_records_entry_in_own_store() {
    let ledger = ledger().await;

    let id = ledger
        .engine
        .create_account(NewAccount {
            store_id: ledger.downtown,
            user_id: ledger.staff,
            category_id: ledger.rent,
            amount: -15.0,
            remark: Some("  light bulbs  ".to_string()),
            transaction_time: Some("not a date".to_string()),
        })
        .await
        .unwrap();

    let page = ledger.engine.list_accounts(ledger.staff, &all()).await.unwrap();
    let row = page.rows.iter().find(|row| row.id == id).unwrap();
    assert_eq!(row.remark.as_deref(), Some("light bulbs"));
    assert_eq!(row.username.as_deref(), Some("bob"));
    assert_eq!(row.transaction_time.len(), "2024-01-01 00:00:00".len());
}

#[tokio::test]
async fn delete_missing_entry_is_not_found() {
    let ledger = ledger().await;

    let err = ledger
        .engine
        .delete_account(ledger.admin, 4242)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::KeyNotFound("account not exists".to_string()));
}

#[tokio::test]
async fn delete_respects_scope() {
    let ledger = ledger().await;
    let page = ledger.engine.list_accounts(ledger.admin, &all()).await.unwrap();
    let harbor_entry = page
        .rows
        .iter()
        .find(|row| row.store_id == ledger.harbor)
        .unwrap()
        .id;
    let downtown_entry = page
        .rows
        .iter()
        .find(|row| row.store_id == ledger.downtown)
        .unwrap()
        .id;

    let err = ledger
        .engine
        .delete_account(ledger.staff, harbor_entry)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    ledger
        .engine
        .delete_account(ledger.staff, downtown_entry)
        .await
        .unwrap();
    assert_eq!(
        ledger.engine.count_accounts(ledger.admin, &all()).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn administration_is_admin_only() {
    let ledger = ledger().await;

    let store = ledger
        .engine
        .create_store(
            ledger.staff,
            NewStore {
                name: "Airport".to_string(),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(store, Err(EngineError::Forbidden(_))));

    let grant = ledger
        .engine
        .grant_store_permission(ledger.staff, ledger.staff, ledger.harbor)
        .await;
    assert!(matches!(grant, Err(EngineError::Forbidden(_))));

    let delete = ledger
        .engine
        .delete_store(ledger.staff, ledger.downtown)
        .await;
    assert!(matches!(delete, Err(EngineError::Forbidden(_))));
}

#[tokio::test]
async fn names_are_validated_and_unique() {
    let ledger = ledger().await;

    let blank = ledger.engine.create_user("   ", None, Role::Staff).await;
    assert!(matches!(blank, Err(EngineError::InvalidName(_))));

    let duplicate = ledger.engine.create_user("bob", None, Role::Staff).await;
    assert_eq!(duplicate, Err(EngineError::ExistingKey("bob".to_string())));

    let store = ledger
        .engine
        .create_store(
            ledger.admin,
            NewStore {
                name: " Harbor ".to_string(),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(store, Err(EngineError::ExistingKey("Harbor".to_string())));

    // Same name on the other side of the ledger is allowed.
    let refund = ledger
        .engine
        .create_category(
            ledger.admin,
            NewCategory {
                name: "Sales".to_string(),
                is_expense: true,
                kind_code: None,
                sort_order: 9,
            },
        )
        .await;
    assert!(refund.is_ok());

    let contradictory = ledger
        .engine
        .create_category(
            ledger.admin,
            NewCategory {
                name: "Tips".to_string(),
                is_expense: false,
                kind_code: Some(2),
                sort_order: 0,
            },
        )
        .await;
    assert!(matches!(contradictory, Err(EngineError::InvalidCategory(_))));
}

#[tokio::test]
async fn categories_are_listed_by_sort_order() {
    let ledger = ledger().await;
    ledger
        .engine
        .create_category(
            ledger.admin,
            NewCategory {
                name: "Catering".to_string(),
                is_expense: false,
                kind_code: Some(1),
                sort_order: 0,
            },
        )
        .await
        .unwrap();

    let categories = ledger.engine.list_categories(ledger.staff).await.unwrap();

    let names: Vec<(&str, CategoryKind)> = categories
        .iter()
        .map(|c| (c.name.as_str(), c.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Catering", CategoryKind::Income),
            ("Sales", CategoryKind::Income),
            ("Rent", CategoryKind::Expense),
        ]
    );
}

#[tokio::test]
async fn grants_are_idempotent_and_revocable() {
    let ledger = ledger().await;

    for _ in 0..2 {
        ledger
            .engine
            .grant_store_permission(ledger.admin, ledger.outsider, ledger.harbor)
            .await
            .unwrap();
    }
    let stores = ledger.engine.list_stores(ledger.outsider).await.unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].address.as_deref(), Some("Pier 4"));

    ledger
        .engine
        .revoke_store_permission(ledger.admin, ledger.outsider, ledger.harbor)
        .await
        .unwrap();
    assert!(ledger.engine.list_stores(ledger.outsider).await.unwrap().is_empty());

    let again = ledger
        .engine
        .revoke_store_permission(ledger.admin, ledger.outsider, ledger.harbor)
        .await;
    assert!(matches!(again, Err(EngineError::KeyNotFound(_))));
}

#[tokio::test]
async fn default_store_must_be_in_scope() {
    let ledger = ledger().await;

    assert_eq!(ledger.engine.default_store(ledger.staff).await, Ok(None));
    ledger
        .engine
        .set_default_store(ledger.staff, ledger.downtown)
        .await
        .unwrap();
    assert_eq!(
        ledger.engine.default_store(ledger.staff).await,
        Ok(Some(ledger.downtown))
    );

    let foreign = ledger
        .engine
        .set_default_store(ledger.staff, ledger.harbor)
        .await;
    assert!(matches!(foreign, Err(EngineError::Forbidden(_))));
}

#[tokio::test]
async fn delete_store_cascades_in_one_step() {
    let ledger = ledger().await;
    ledger
        .engine
        .set_default_store(ledger.staff, ledger.downtown)
        .await
        .unwrap();
    ledger
        .engine
        .set_default_store(ledger.admin, ledger.harbor)
        .await
        .unwrap();

    ledger
        .engine
        .delete_store(ledger.admin, ledger.downtown)
        .await
        .unwrap();

    // Grant gone, default moved to the remaining store, entries kept.
    assert_eq!(
        ledger.engine.scope_for(ledger.staff).await,
        Ok(engine::Scope::RestrictedTo(Default::default()))
    );
    assert_eq!(
        ledger.engine.default_store(ledger.staff).await,
        Ok(Some(ledger.harbor))
    );
    assert_eq!(
        ledger.engine.default_store(ledger.admin).await,
        Ok(Some(ledger.harbor))
    );
    assert_eq!(count(&ledger.db, "SELECT COUNT(*) AS total FROM accounts").await, 3);

    ledger
        .engine
        .delete_store(ledger.admin, ledger.harbor)
        .await
        .unwrap();
    assert_eq!(ledger.engine.default_store(ledger.admin).await, Ok(None));

    let missing = ledger.engine.delete_store(ledger.admin, ledger.harbor).await;
    assert_eq!(
        missing,
        Err(EngineError::KeyNotFound("store not exists".to_string()))
    );
}

#[tokio::test]
async fn failed_store_delete_leaves_everything_in_place() {
    let ledger = ledger().await;
    ledger
        .engine
        .set_default_store(ledger.staff, ledger.downtown)
        .await
        .unwrap();
    ledger
        .db
        .execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TRIGGER block_store_delete BEFORE DELETE ON stores \
             BEGIN SELECT RAISE(ABORT, 'store delete blocked'); END",
        ))
        .await
        .unwrap();

    let err = ledger
        .engine
        .delete_store(ledger.admin, ledger.downtown)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Database(_)));
    assert!(err.to_string().contains("store delete blocked"));
    assert!(ledger.engine.scope_for(ledger.staff).await.unwrap().permits(ledger.downtown));
    assert_eq!(
        ledger.engine.default_store(ledger.staff).await,
        Ok(Some(ledger.downtown))
    );
}

#[tokio::test]
async fn usage_is_recorded_with_defaults() {
    let ledger = ledger().await;

    let first = ledger
        .engine
        .record_usage(NewUsage {
            store_id: ledger.downtown,
            user_id: ledger.staff,
            item: " Coffee beans ".to_string(),
            quantity: 2.5,
            usage_date: Some("2024/03/02".to_string()),
        })
        .await
        .unwrap();
    let second = ledger
        .engine
        .record_usage(NewUsage {
            store_id: ledger.downtown,
            user_id: ledger.staff,
            item: "Milk".to_string(),
            quantity: 1.0,
            usage_date: None,
        })
        .await
        .unwrap();

    assert!(second > first);
    assert_eq!(
        count(
            &ledger.db,
            "SELECT COUNT(*) AS total FROM usage_records \
             WHERE item = 'Coffee beans' AND usage_date = '2024-03-02'"
        )
        .await,
        1
    );
}

#[tokio::test]
async fn usage_is_validated_before_writing() {
    let ledger = ledger().await;
    let usage = |store_id: i64, quantity: f64| NewUsage {
        store_id,
        user_id: ledger.staff,
        item: "Milk".to_string(),
        quantity,
        usage_date: None,
    };

    let negative = ledger.engine.record_usage(usage(ledger.downtown, -1.0)).await;
    assert!(matches!(negative, Err(EngineError::InvalidAmount(_))));

    let foreign = ledger.engine.record_usage(usage(ledger.harbor, 1.0)).await;
    assert!(matches!(foreign, Err(EngineError::Forbidden(_))));

    assert_eq!(count(&ledger.db, "SELECT COUNT(*) AS total FROM usage_records").await, 0);
}

#[tokio::test]
async fn fresh_database_has_no_rows() {
    let (engine, _db) = empty_engine().await;
    let admin = engine.create_user("root", None, Role::Admin).await.unwrap();

    let page = engine
        .list_accounts_raw(admin, &RawFilter::default())
        .await
        .unwrap();
    assert!(page.rows.is_empty());
    assert!(engine.list_stores(admin).await.unwrap().is_empty());

    engine.close().await.unwrap();
}

#[tokio::test]
async fn default_settings_remember_categories() {
    let ledger = ledger().await;
    let engine = &ledger.engine;
    let saved = DefaultSettings {
        store_id: Some(ledger.downtown),
        income_category_id: Some(ledger.sales),
        expense_category_id: Some(ledger.rent),
    };

    assert_eq!(engine.default_settings(ledger.staff).await, Ok(None));
    engine
        .save_default_settings(ledger.staff, saved)
        .await
        .unwrap();
    assert_eq!(engine.default_settings(ledger.staff).await, Ok(Some(saved)));

    // Changing the store keeps the categories.
    engine
        .grant_store_permission(ledger.admin, ledger.staff, ledger.harbor)
        .await
        .unwrap();
    engine
        .set_default_store(ledger.staff, ledger.harbor)
        .await
        .unwrap();
    assert_eq!(
        engine.default_settings(ledger.staff).await,
        Ok(Some(DefaultSettings {
            store_id: Some(ledger.harbor),
            ..saved
        }))
    );
}

#[tokio::test]
async fn default_settings_are_validated() {
    let ledger = ledger().await;
    let engine = &ledger.engine;

    let swapped = engine
        .save_default_settings(
            ledger.staff,
            DefaultSettings {
                income_category_id: Some(ledger.rent),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(swapped, Err(EngineError::InvalidCategory(_))));

    let missing = engine
        .save_default_settings(
            ledger.staff,
            DefaultSettings {
                expense_category_id: Some(999),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(
        missing,
        Err(EngineError::KeyNotFound("category not exists".to_string()))
    );

    let foreign = engine
        .save_default_settings(
            ledger.staff,
            DefaultSettings {
                store_id: Some(ledger.harbor),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(foreign, Err(EngineError::Forbidden(_))));

    assert_eq!(engine.default_settings(ledger.staff).await, Ok(None));
}

#[tokio::test]
async fn deleting_a_category_clears_it_from_defaults() {
    let ledger = ledger().await;
    ledger
        .engine
        .save_default_settings(
            ledger.staff,
            DefaultSettings {
                store_id: Some(ledger.downtown),
                income_category_id: Some(ledger.sales),
                expense_category_id: Some(ledger.rent),
            },
        )
        .await
        .unwrap();

    ledger
        .engine
        .delete_category(ledger.admin, ledger.rent)
        .await
        .unwrap();

    assert_eq!(
        ledger.engine.default_settings(ledger.staff).await,
        Ok(Some(DefaultSettings {
            store_id: Some(ledger.downtown),
            income_category_id: Some(ledger.sales),
            expense_category_id: None,
        }))
    );
}

#[tokio::test]
async fn user_stores_are_replaced_as_a_whole() {
    let ledger = ledger().await;
    let engine = &ledger.engine;

    engine
        .set_user_stores(ledger.admin, ledger.staff, &[ledger.harbor, ledger.harbor])
        .await
        .unwrap();
    assert_eq!(
        engine.scope_for(ledger.staff).await,
        Ok(Scope::RestrictedTo(BTreeSet::from([ledger.harbor])))
    );

    let unknown = engine
        .set_user_stores(ledger.admin, ledger.staff, &[ledger.downtown, 999])
        .await;
    assert_eq!(
        unknown,
        Err(EngineError::KeyNotFound("store not exists".to_string()))
    );
    assert_eq!(
        engine.scope_for(ledger.staff).await,
        Ok(Scope::RestrictedTo(BTreeSet::from([ledger.harbor])))
    );

    let not_admin = engine
        .set_user_stores(ledger.staff, ledger.outsider, &[ledger.harbor])
        .await;
    assert!(matches!(not_admin, Err(EngineError::Forbidden(_))));

    engine
        .set_user_stores(ledger.admin, ledger.staff, &[])
        .await
        .unwrap();
    assert_eq!(
        engine.scope_for(ledger.staff).await,
        Ok(Scope::RestrictedTo(BTreeSet::new()))
    );
    assert!(engine.list_accounts(ledger.staff, &all()).await.unwrap().rows.is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_grants_and_defaults() {
    let ledger = ledger().await;
    let engine = &ledger.engine;
    engine
        .create_account(NewAccount {
            store_id: ledger.downtown,
            user_id: ledger.staff,
            category_id: ledger.sales,
            amount: 7.0,
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .set_default_store(ledger.staff, ledger.downtown)
        .await
        .unwrap();

    engine.delete_user(ledger.admin, ledger.staff).await.unwrap();

    assert!(matches!(
        engine.scope_for(ledger.staff).await,
        Err(EngineError::Unauthorized(_))
    ));
    let staff = ledger.staff;
    assert_eq!(
        count(
            &ledger.db,
            &format!("SELECT COUNT(*) AS total FROM user_store_permissions WHERE user_id = {staff}")
        )
        .await,
        0
    );
    assert_eq!(
        count(
            &ledger.db,
            &format!("SELECT COUNT(*) AS total FROM user_default_settings WHERE user_id = {staff}")
        )
        .await,
        0
    );
    // Their entry is still in the ledger.
    assert_eq!(engine.count_accounts(ledger.admin, &all()).await, Ok(4));
}

#[tokio::test]
async fn user_deletion_is_guarded() {
    let ledger = ledger().await;
    let engine = &ledger.engine;

    let by_staff = engine.delete_user(ledger.staff, ledger.outsider).await;
    assert!(matches!(by_staff, Err(EngineError::Forbidden(_))));

    let own = engine.delete_user(ledger.admin, ledger.admin).await;
    assert!(matches!(own, Err(EngineError::Forbidden(_))));

    let missing = engine.delete_user(ledger.admin, 999).await;
    assert_eq!(
        missing,
        Err(EngineError::KeyNotFound("user not exists".to_string()))
    );
    assert!(engine.scope_for(ledger.outsider).await.is_ok());
}

#[tokio::test]
async fn usage_write_gives_up_while_the_database_is_locked() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("ledger.db").display());

    let mut options = ConnectOptions::new(url.clone());
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    // Fail fast on a held lock instead of waiting in the driver.
    db.execute_unprepared("PRAGMA busy_timeout = 0")
        .await
        .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
        })
        .build()
        .await
        .unwrap();

    let admin = engine
        .create_user("admin", None, Role::Admin)
        .await
        .unwrap();
    let store = engine
        .create_store(
            admin,
            NewStore {
                name: "Downtown".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let usage = || NewUsage {
        store_id: store,
        user_id: admin,
        item: "Milk".to_string(),
        quantity: 1.0,
        usage_date: None,
    };

    let mut holder_options = ConnectOptions::new(url);
    holder_options.max_connections(1).min_connections(1);
    let holder = Database::connect(holder_options).await.unwrap();
    holder.execute_unprepared("BEGIN IMMEDIATE").await.unwrap();

    match engine.record_usage(usage()).await {
        Err(EngineError::RetryExhausted { attempts, source }) => {
            assert_eq!(attempts, 3);
            assert!(is_contention(&source), "{source}");
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }

    holder.execute_unprepared("COMMIT").await.unwrap();
    let id = engine.record_usage(usage()).await.unwrap();
    assert!(id > 0);
    assert_eq!(
        count(&db, "SELECT COUNT(*) AS total FROM usage_records").await,
        1
    );
}
