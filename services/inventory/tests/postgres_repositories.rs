//! Repository tests against a real PostgreSQL database
//!
//! Run with `cargo test -- --ignored` and `DATABASE_URL` pointing at a
//! disposable database; the tables are truncated before each test.

use chrono::NaiveDate;
use serial_test::serial;
use sqlx::PgPool;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use inventory::{
    credentials::PasswordHash,
    models::{ItemFields, NewUser, Role},
    repositories::{
        ITEMS_SERIAL_NUMBER_KEY, ItemRepository, PgItemRepository, PgUserRepository,
        RepositoryError, USERS_EMAIL_KEY, UserRepository,
    },
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

async fn fresh_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool, &MIGRATOR).await?;
    sqlx::query("TRUNCATE items, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await?;
    Ok(pool)
}

fn new_user(email: &str, phone: &str) -> NewUser {
    NewUser {
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        dob: NaiveDate::from_ymd_opt(1990, 1, 1),
        phone_no: phone.to_string(),
        email: email.to_string(),
        password_hash: PasswordHash::from_stored("$argon2id$stub"),
        role: Role::User,
    }
}

fn laptop(serial: &str, bill: &str) -> ItemFields {
    ItemFields {
        name: "Laptop".to_string(),
        serial_number: serial.to_string(),
        bill_number: bill.to_string(),
        date_of_purchase: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        warranty: Some("2 years".to_string()),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_user_round_trip_and_unique_email() -> Result<(), Box<dyn std::error::Error>> {
    let users = PgUserRepository::new(fresh_pool().await?);

    let created = users.insert(new_user("a@corp.com", "1111111111")).await?;
    let found = users.find_by_email("a@corp.com").await?.expect("user stored");
    assert_eq!(found.id, created.id);
    assert_eq!(found.role, Role::User);
    assert_eq!(found.dob, NaiveDate::from_ymd_opt(1990, 1, 1));

    let err = users
        .insert(new_user("a@corp.com", "2222222222"))
        .await
        .unwrap_err();
    assert_eq!(err.unique_constraint(), Some(USERS_EMAIL_KEY));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_item_constraints_and_assignment() -> Result<(), Box<dyn std::error::Error>> {
    let pool = fresh_pool().await?;
    let users = PgUserRepository::new(pool.clone());
    let items = PgItemRepository::new(pool);

    let user = users.insert(new_user("a@corp.com", "1111111111")).await?;
    let item = items.insert(laptop("SN1", "BN1")).await?;

    let err = items.insert(laptop("SN1", "BN2")).await.unwrap_err();
    assert_eq!(err.unique_constraint(), Some(ITEMS_SERIAL_NUMBER_KEY));

    assert!(items.set_assignee(item.id, Some(user.id)).await?);
    assert!(items.find_assigned_by_name(user.id, "Laptop").await?.is_some());

    let err = items
        .set_assignee(item.id, Some(inventory::models::UserId(9999)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation));

    assert!(users.delete(user.id).await?);
    let item = items.find_by_id(item.id).await?.expect("item kept");
    assert_eq!(item.assigned_to, None);

    Ok(())
}
