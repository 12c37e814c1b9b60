#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use sql_mapper::prelude::*;
use sql_mapper::session::CachingSession;
use tempfile::TempDir;

const SCHEMA: &str = "
    create table if not exists users (
        id      integer primary key,
        name    text not null unique,
        active  integer not null,
        joined  text
    );
";

#[derive(Debug)]
struct User {
    id: i64,
    name: String,
    active: bool,
}

impl FromRow for User {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError> {
        Ok(User {
            id: i64::from_row_value(row.get("id"))?,
            name: String::from_row_value(row.get("name"))?,
            active: bool::from_row_value(row.get("active"))?,
        })
    }
}

fn manager() -> Result<(TempDir, TransactionManager<CachingSession<SqliteFactory>>), SqlMapperError> {
    let dir = tempfile::tempdir().map_err(|e| SqlMapperError::ConfigError(e.to_string()))?;
    let path = dir.path().join("users.db");
    let manager = SqliteOptionsBuilder::new(path.to_string_lossy())
        .init_sql(SCHEMA)
        .build()?;
    Ok((dir, manager))
}

fn add_user(storage: &Storage<'_, SqliteConnection>, name: &str) -> Result<i64, SqlMapperError> {
    let keys = storage.insert(
        "insert into users (name, active) values (:name, :active)",
        &bindings! { "name" => name, "active" => true },
    )?;
    let key = storage.take_one(keys)?;
    key.as_int()
        .copied()
        .ok_or_else(|| SqlMapperError::ExecutionError("non-integer key".into()))
}

#[test]
fn committed_rows_are_visible_to_later_transactions() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;

    let id = manager.execute(|storage| add_user(storage, "ann"))?;
    assert_eq!(id, 1);

    let users: Vec<User> = manager.execute(|storage| {
        storage.select_as("select id, name, active from users where id = :id", &bindings! { "id" => id })
    })?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, 1);
    assert_eq!(users[0].name, "ann");
    assert!(users[0].active);
    assert!(manager.session().has_free_connection());
    Ok(())
}

#[test]
fn failed_work_leaves_no_trace() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    manager.exec(|storage| add_user(storage, "ann").map(|_| ()))?;

    let err = manager
        .exec(|storage| {
            add_user(storage, "bob")?;
            add_user(storage, "ann")?;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::SqliteError(_)));
    assert!(!manager.in_transaction());
    assert!(!manager.session().has_free_connection());

    let names: Vec<String> = manager.execute(|storage| {
        storage.select_as("select name from users order by name", &[])
    })?;
    assert_eq!(names, vec!["ann".to_string()]);
    Ok(())
}

#[test]
fn caller_error_rolls_back() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let err = manager
        .exec(|storage| {
            add_user(storage, "carl")?;
            Err(SqlMapperError::work("quota exceeded"))
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "quota exceeded");

    let count: Vec<i64> = manager.execute(|storage| storage.select_as("select count(*) from users", &[]))?;
    assert_eq!(count, vec![0]);
    Ok(())
}

#[test]
fn nested_work_commits_once_with_outer() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    manager.exec(|storage| {
        add_user(storage, "ann")?;
        manager.exec(|inner| {
            add_user(inner, "bob")?;
            let n = inner.update(
                "update users set active = :active where name in (:names)",
                &bindings! { "active" => false, "names" => vec!["ann", "bob"] },
            )?;
            inner.update_many(n)
        })
    })?;

    let inactive = manager.execute(|storage| {
        let rows = storage.select("select name from users where active = 0 order by name", &[])?;
        storage.take_first_column(rows)
    })?;
    assert_eq!(inactive, vec![RowValues::Text("ann".into()), RowValues::Text("bob".into())]);
    Ok(())
}

#[test]
fn nested_failure_discards_outer_writes() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let result = manager.exec(|storage| {
        add_user(storage, "ann")?;
        manager.exec(|inner| {
            let n = inner.update("delete from users where name = :name", &bindings! { "name" => "nobody" })?;
            inner.update_one(n)
        })
    });
    assert!(result.unwrap_err().is_cardinality());

    let rows = manager.execute(|storage| storage.select("select * from users", &[]))?;
    assert!(rows.is_empty());
    Ok(())
}

#[test]
fn mapped_selects_and_cardinality() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let joined = NaiveDate::from_ymd_opt(2024, 1, 31)
        .and_then(|d| d.and_hms_milli_opt(8, 30, 0, 125))
        .ok_or_else(|| SqlMapperError::ConfigError("bad date".into()))?;

    manager.exec(|storage| {
        for name in ["ann", "bob", "cy"] {
            storage.insert(
                "insert into users (name, active, joined) values (:name, :active, :joined)",
                &bindings! { "name" => name, "active" => name != "bob", "joined" => joined },
            )?;
        }
        Ok(())
    })?;

    let labels = manager.execute(|storage| {
        storage.select_map(
            |row| {
                let name = row.get("name").and_then(RowValues::as_text).unwrap_or_default();
                let stamp = row.get("joined").and_then(RowValues::as_timestamp);
                Ok(format!("{name}@{}", stamp.map(|t| t.to_string()).unwrap_or_default()))
            },
            "select name, joined from users where active = :active order by name",
            &bindings! { "active" => true },
        )
    })?;
    assert_eq!(
        labels,
        vec![
            "ann@2024-01-31 08:30:00.125".to_string(),
            "cy@2024-01-31 08:30:00.125".to_string()
        ]
    );

    let missing: Option<User> = manager.execute(|storage| {
        let users: Vec<User> = storage.select_as("select id, name, active from users where name = :n", &bindings! { "n" => "zed" })?;
        storage.take_one_or_none(users)
    })?;
    assert!(missing.is_none());

    let err = manager
        .execute(|storage| {
            let users: Vec<User> = storage.select_as("select id, name, active from users", &[])?;
            storage.take_one(users)
        })
        .unwrap_err();
    assert!(err.is_cardinality());
    Ok(())
}

#[test]
fn multi_row_insert_reports_every_key() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let keys = manager.execute(|storage| {
        storage.insert(
            "insert into users (name, active) values (:a, 1), (:b, 1)",
            &bindings! { "a" => "ann", "b" => "bob" },
        )
    })?;
    assert_eq!(keys, vec![RowValues::Int(1), RowValues::Int(2)]);

    let err = manager
        .execute(|storage| {
            let keys = storage.insert(
                "insert into users (name, active) values (:a, 1), (:b, 1)",
                &bindings! { "a" => "cy", "b" => "dee" },
            )?;
            storage.take_one(keys)
        })
        .unwrap_err();
    assert!(err.is_cardinality());

    let count: Vec<i64> = manager.execute(|storage| storage.select_as("select count(*) from users", &[]))?;
    assert_eq!(count, vec![2]);
    Ok(())
}

#[test]
fn escaped_text_round_trips_through_the_database() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let name = "o'brien";
    manager.exec(|storage| {
        let escaped = storage.escape(name);
        storage.insert(
            "insert into users (name, active) values (:name, 1)",
            &bindings! { "name" => escaped },
        )?;
        Ok(())
    })?;

    let names: Vec<String> = manager.execute(|storage| storage.select_as("select name from users", &[]))?;
    assert_eq!(names, vec![name.to_string()]);
    Ok(())
}

#[test]
fn missing_parameter_fails_before_execution() -> Result<(), SqlMapperError> {
    let (_dir, manager) = manager()?;
    let err = manager
        .execute(|storage| storage.update("update users set name = :name where id = :id", &bindings! { "id" => 1 }))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Please pass the missing parameter `name': update users set name = :name where id = :id"
    );
    Ok(())
}
