use sql_dao::prelude::*;

fn field(name: &str, value: ParamValue) -> (String, ParamValue) {
    (name.to_string(), value)
}

fn setup_dao(dir: &tempfile::TempDir) -> Dao<SqliteProvider> {
    let db_path = dir.path().join("test3.db");
    let dao = Dao::new(SqliteProvider::file(&db_path));
    dao.execute_raw("CREATE TABLE ledger (id INTEGER PRIMARY KEY, amount INTEGER NOT NULL);")
        .unwrap();
    dao
}

#[test]
fn successful_unit_commits() {
    let dir = tempfile::tempdir().unwrap();
    let dao = setup_dao(&dir);

    let total = dao
        .with_transaction(|conn| {
            conn.update(
                "insert into ledger (id, amount) values (?, ?)",
                &[ParamValue::Seq(vec![ParamValue::Int(1), ParamValue::Int(100)])],
            )?;
            conn.update(
                "insert into ledger (id, amount) values (?, ?)",
                &[ParamValue::Seq(vec![ParamValue::Int(2), ParamValue::Int(250)])],
            )?;
            conn.find_scalar("select sum(amount) from ledger", &[])
        })
        .unwrap();

    assert_eq!(total, Some(ParamValue::Int(350)));
    assert_eq!(dao.count("ledger").unwrap(), 2);
}

#[test]
fn failing_unit_leaves_table_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let dao = setup_dao(&dir);
    dao.insert("ledger", &[field("id", ParamValue::Int(1)), field("amount", ParamValue::Int(10))])
        .unwrap();
    let before = dao.count("ledger").unwrap();

    let err = dao
        .with_transaction(|conn| {
            conn.update(
                "insert into ledger (id, amount) values (?, ?)",
                &[ParamValue::Seq(vec![ParamValue::Int(2), ParamValue::Int(20)])],
            )?;
            // NOT NULL violation fails the unit after one successful insert.
            conn.update(
                "insert into ledger (id, amount) values (?, ?)",
                &[ParamValue::Seq(vec![ParamValue::Int(3), ParamValue::Null])],
            )
        })
        .unwrap_err();
    assert!(matches!(err, DaoError::ExecutionError { .. }));

    assert_eq!(dao.count("ledger").unwrap(), before);
}

#[test]
fn insert_many_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let dao = setup_dao(&dir);

    let records = vec![
        vec![field("id", ParamValue::Int(1)), field("amount", ParamValue::Int(5))],
        vec![field("id", ParamValue::Int(1)), field("amount", ParamValue::Int(6))],
    ];
    assert!(dao.insert_many("ledger", &records).is_err());
    assert_eq!(dao.count("ledger").unwrap(), 0);

    let records = vec![
        vec![field("id", ParamValue::Int(1)), field("amount", ParamValue::Int(5))],
        vec![field("id", ParamValue::Int(2)), field("amount", ParamValue::Int(6))],
    ];
    dao.insert_many("ledger", &records).unwrap();
    assert_eq!(dao.count("ledger").unwrap(), 2);
}

#[test]
fn with_connection_shares_one_connection_without_txn() {
    let dir = tempfile::tempdir().unwrap();
    let dao = setup_dao(&dir);

    let amount = dao
        .with_connection(|conn| {
            conn.insert(
                "ledger",
                &[field("id", ParamValue::Int(9)), field("amount", ParamValue::Int(90))],
            )?;
            conn.find_scalar(
                "select amount from ledger where id = ?",
                &[ParamValue::Int(9)],
            )
        })
        .unwrap();
    assert_eq!(amount, Some(ParamValue::Int(90)));

    // Autocommit applied: visible from a later unit of work.
    assert_eq!(dao.count("ledger").unwrap(), 1);
}

#[test]
fn unit_error_passes_through_after_clean_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let dao = setup_dao(&dir);

    let err = dao
        .with_transaction(|_conn| -> Result<(), DaoError> {
            Err(DaoError::ConnectionError("caller gave up".to_string()))
        })
        .unwrap_err();
    // The unit's own error survives; rollback succeeded silently.
    assert!(matches!(err, DaoError::ConnectionError(_)));
}
