#![cfg(feature = "postgres")]

use chrono::{DateTime, NaiveDate, Utc};
use named_sql::mapper::column;
use named_sql::prelude::*;

/// Connection settings from `NAMED_SQL_PG_*`; the test is skipped when no host is given.
fn pg_config() -> Option<DbConfig> {
    let host = std::env::var("NAMED_SQL_PG_HOST").ok()?;
    let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    let port = var("NAMED_SQL_PG_PORT", "5432").parse().ok()?;
    Some(
        DbConfig::postgres(
            host,
            port,
            var("NAMED_SQL_PG_USER", "postgres"),
            var("NAMED_SQL_PG_PASSWORD", "postgres"),
            var("NAMED_SQL_PG_DATABASE", "postgres"),
        )
        .with_extra("application_name", "named-sql-tests")
        .with_extra("pool_max_size", "2"),
    )
}

#[derive(Debug, Clone, Copy)]
enum Mood {
    Happy,
    Sad,
}

impl SqlEnum for Mood {
    fn sql_label(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Mood::Happy => "happy".into(),
            Mood::Sad => "sad".into(),
        }
    }
}

#[test]
fn postgres_named_parameters_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = pg_config() else {
        eprintln!("NAMED_SQL_PG_HOST not set; skipping postgres test");
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = Database::connect(config).await?;
        db.use_connection(async |conn| {
            let client = conn.postgres_client()?;
            client
                .batch_execute(
                    "DROP TABLE IF EXISTS named_sql_people;
                     DROP TYPE IF EXISTS named_sql_mood;
                     CREATE TYPE named_sql_mood AS ENUM ('happy', 'sad');
                     CREATE TABLE named_sql_people (
                        id BIGSERIAL PRIMARY KEY,
                        name TEXT NOT NULL,
                        age INTEGER NOT NULL,
                        mood named_sql_mood NOT NULL,
                        born DATE,
                        seen_at TIMESTAMPTZ NOT NULL
                     );",
                )
                .await?;
            Ok(())
        })
        .await?;

        let seen_at: DateTime<Utc> = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let insert = "INSERT INTO named_sql_people (name, age, mood, born, seen_at)
                      VALUES (:name, :age, :mood::named_sql_mood, :born, :seen_at);";

        let first = db
            .execute_with_generated_keys(
                insert,
                &named_params! {
                    "name" => "ada",
                    "age" => 36,
                    "mood" => &Mood::Happy,
                    "born" => NaiveDate::from_ymd_opt(1815, 12, 10),
                    "seen_at" => seen_at,
                },
                column::<i64, _>("id"),
            )
            .await?;
        assert_eq!(first.len(), 1);

        let more = db
            .execute_batch_with_generated_keys(
                insert,
                &[
                    named_params! { "name" => "bob", "age" => 40, "mood" => &Mood::Sad, "born" => None::<NaiveDate>, "seen_at" => seen_at },
                    named_params! { "name" => "cy", "age" => 50, "mood" => &Mood::Happy, "born" => None::<NaiveDate>, "seen_at" => seen_at },
                ],
                column::<i64, _>("id"),
            )
            .await?;
        assert_eq!(more.len(), 2);
        assert!(first[0] < more[0] && more[0] < more[1]);

        let happy = db
            .find_all(
                "SELECT name, mood::text AS mood, seen_at FROM named_sql_people
                 WHERE mood = :mood::named_sql_mood OR id = :id ORDER BY id",
                &named_params! { "mood" => &Mood::Happy, "id" => more[0] },
                |row: &Row| {
                    Ok::<_, NamedSqlError>((
                        row.try_get::<String>("name")?,
                        row.try_get::<String>("mood")?,
                        row.try_get::<DateTime<Utc>>("seen_at")?,
                    ))
                },
            )
            .await?;
        assert_eq!(
            happy,
            vec![
                ("ada".to_string(), "happy".to_string(), seen_at),
                ("bob".to_string(), "sad".to_string(), seen_at),
                ("cy".to_string(), "happy".to_string(), seen_at),
            ]
        );

        let older = db
            .execute_query(
                "SELECT COUNT(*) FROM named_sql_people WHERE age > :age",
                &named_params! { "age" => 39 },
                |rows| rows.next().map(|row| row.try_get::<i64>(0_usize)).transpose(),
            )
            .await?;
        assert_eq!(older, Some(2));

        let counts = db
            .execute_batch(
                "UPDATE named_sql_people SET age = age + 1 WHERE age >= :age",
                &[named_params! { "age" => 40 }, named_params! { "age" => 100 }],
            )
            .await?;
        assert_eq!(counts, vec![2, 0]);

        let deleted = db
            .execute_update_positional("DELETE FROM named_sql_people WHERE id = ?", &[SqlValue::Int(first[0])])
            .await?;
        assert_eq!(deleted, 1);

        db.execute_update("DROP TABLE named_sql_people", &NamedParams::new())
            .await?;
        db.execute_update("DROP TYPE named_sql_mood", &NamedParams::new())
            .await?;
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn postgres_numeric_keys_and_batch_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = pg_config() else {
        eprintln!("NAMED_SQL_PG_HOST not set; skipping postgres test");
        return Ok(());
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = Database::connect(config).await?;
        db.use_connection(async |conn| {
            conn.postgres_client()?
                .batch_execute(
                    "DROP TABLE IF EXISTS named_sql_prices;
                     CREATE TABLE named_sql_prices (
                        id BIGINT PRIMARY KEY,
                        price NUMERIC(10, 2),
                        tag UUID
                     );",
                )
                .await?;
            Ok(())
        })
        .await?;

        // a trailing comment must not swallow the appended RETURNING
        let ids = db
            .execute_with_generated_keys(
                "INSERT INTO named_sql_prices (id, price) VALUES (:id, :price) -- audit",
                &named_params! { "id" => 1, "price" => 2.5 },
                column::<i64, _>("id"),
            )
            .await?;
        assert_eq!(ids, vec![1]);

        db.execute_update(
            "INSERT INTO named_sql_prices (id, price, tag)
             VALUES (:id, :price::numeric, gen_random_uuid())",
            &named_params! { "id" => 2, "price" => SqlValue::decimal("10.05") },
        )
        .await?;

        // numeric and uuid columns never block reading the columns a mapper asks for
        let rows = db
            .find_all(
                "SELECT id, price, tag FROM named_sql_prices ORDER BY id",
                &NamedParams::new(),
                |row: &Row| {
                    Ok::<_, NamedSqlError>((row.try_get::<i64>("id")?, row.try_get::<String>("price")?))
                },
            )
            .await?;
        assert_eq!(rows, vec![(1, "2.50".to_string()), (2, "10.05".to_string())]);

        let total = db
            .execute_query(
                "SELECT SUM(id) FROM named_sql_prices",
                &NamedParams::new(),
                |rows| rows.next().map(|row| row.try_get::<i64>(0_usize)).transpose(),
            )
            .await?;
        assert_eq!(total, Some(3));

        let failed = db
            .execute_batch(
                "INSERT INTO named_sql_prices (id, price) VALUES (:id, :price)",
                &[
                    named_params! { "id" => 100, "price" => 1 },
                    named_params! { "id" => 100, "price" => 2 },
                ],
            )
            .await;
        assert!(failed.is_err());

        let kept = db
            .execute_query(
                "SELECT COUNT(*) FROM named_sql_prices WHERE id = :id",
                &named_params! { "id" => 100 },
                |rows| rows.next().map(|row| row.try_get::<i64>(0_usize)).transpose(),
            )
            .await?;
        assert_eq!(kept, Some(0));

        let counts = db
            .execute_batch(
                "INSERT INTO named_sql_prices (id, price) VALUES (:id, :price)",
                &[
                    named_params! { "id" => 100, "price" => 1 },
                    named_params! { "id" => 101, "price" => 2 },
                ],
            )
            .await?;
        assert_eq!(counts, vec![1, 1]);

        db.execute_update("DROP TABLE named_sql_prices", &NamedParams::new())
            .await?;
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}
