use anvil::constraint::ConstraintSelector;
use anvil::value::Value;
use anvil::{Engine, EngineConfig};
use tempfile::tempdir;

fn engine() -> Engine {
    let dir = tempdir().unwrap();
    Engine::new(EngineConfig::new(dir.path().to_path_buf()))
}

fn employees(engine: &Engine) {
    engine.create_database("shop", None).unwrap();
    engine
        .create_table(
            "employees",
            vec![
                "id INTEGER PRIMARY KEY".to_string(),
                "name STRING UNIQUE".to_string(),
                "age INTEGER NOT NULL CHECK(age >= 18)".to_string(),
            ],
        )
        .unwrap();
}

#[test]
fn create_insert_select_preserves_insertion_order() {
    let engine = engine();
    employees(&engine);

    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(1), Value::String("John".into()), Value::Integer(30)]],
        )
        .unwrap();
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)]],
        )
        .unwrap();

    let response = engine.select("employees", None, None).unwrap();
    assert_eq!(response.row_count(), 2);
    assert_eq!(response.columns["name"][0], Value::String("John".into()));
    assert_eq!(response.columns["name"][1], Value::String("Alice".into()));
}

#[test]
fn constraint_rejection_names_the_violated_constraint() {
    let engine = engine();
    employees(&engine);
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(1), Value::String("John".into()), Value::Integer(30)]],
        )
        .unwrap();
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)]],
        )
        .unwrap();

    let err = engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(3), Value::String("Petra".into()), Value::Integer(15)]],
        )
        .unwrap_err();
    match err {
        anvil::EngineError::ConstraintViolation { constraint, .. } => {
            assert_eq!(constraint, "age_check_constraint")
        }
        other => panic!("expected constraint violation, got {other:?}"),
    }

    let response = engine.select("employees", None, None).unwrap();
    assert_eq!(response.row_count(), 2);
}

#[test]
fn dropping_a_constraint_admits_rows_that_previously_failed_it() {
    let engine = engine();
    employees(&engine);
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(1), Value::String("John".into()), Value::Integer(30)]],
        )
        .unwrap();
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(2), Value::String("Alice".into()), Value::Integer(25)]],
        )
        .unwrap();

    engine
        .alter_table(
            "employees",
            None,
            None,
            None,
            Some(vec![(
                "age".to_string(),
                ConstraintSelector::Name("age_check_constraint".to_string()),
            )]),
        )
        .unwrap();

    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(4), Value::String("Tom".into()), Value::Integer(15)]],
        )
        .unwrap();

    let response = engine.select("employees", None, None).unwrap();
    assert_eq!(response.row_count(), 3);
}

#[test]
fn transaction_commit_applies_staged_update_and_grows_history() {
    let engine = engine();
    employees(&engine);
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(1), Value::String("John".into()), Value::Integer(30)]],
        )
        .unwrap();

    let before = engine.history_size();
    engine.begin().unwrap();
    engine
        .update("employees", vec![("age".to_string(), Value::Integer(18))], Some("id = 1"))
        .unwrap();
    engine.commit().unwrap();

    let response = engine.select("employees", Some(vec!["age".to_string()]), None).unwrap();
    assert_eq!(response.columns["age"][0], Value::Integer(18));
    assert_eq!(engine.history_size(), before + 1);
    assert!(!engine.is_transaction_active());
}

#[test]
fn transaction_rollback_restores_pre_begin_rows() {
    let engine = engine();
    engine.create_database("scratch", None).unwrap();
    engine
        .create_table("test_table", vec!["id INTEGER PRIMARY KEY".to_string()])
        .unwrap();
    engine
        .insert("test_table", vec!["id".into()], vec![vec![Value::Integer(1)], ])
        .unwrap();
    engine
        .insert("test_table", vec!["id".into()], vec![vec![Value::Integer(2)]])
        .unwrap();

    engine.begin().unwrap();
    engine
        .insert("test_table", vec!["id".into()], vec![vec![Value::Integer(3)]])
        .unwrap();
    engine
        .insert("test_table", vec!["id".into()], vec![vec![Value::Integer(4)]])
        .unwrap();
    engine.rollback().unwrap();

    let response = engine.select("test_table", None, None).unwrap();
    assert_eq!(response.row_count(), 2);
    assert_eq!(response.columns["id"], vec![Value::Integer(1), Value::Integer(2)]);
    assert!(!engine.is_transaction_active());
}

#[test]
fn undo_chain_returns_database_to_empty_in_three_steps() {
    let engine = engine();
    engine.create_database("undo_demo", None).unwrap();
    // CREATE DATABASE is itself historical (undo restores the prior active
    // database), so the three-step chain under test starts from whatever
    // the history already holds.
    let base = engine.history_size();

    engine
        .create_table("users", vec!["id INTEGER".to_string(), "name STRING".to_string()])
        .unwrap();
    assert_eq!(engine.history_size(), base + 1);

    engine
        .alter_table("users", Some(vec!["age INTEGER".to_string()]), None, None, None)
        .unwrap();
    assert_eq!(engine.history_size(), base + 2);

    engine.drop_table("users").unwrap();
    assert_eq!(engine.history_size(), base + 3);

    engine.undo().unwrap();
    assert_eq!(engine.history_size(), base + 2);
    engine.undo().unwrap();
    assert_eq!(engine.history_size(), base + 1);
    engine.undo().unwrap();
    assert_eq!(engine.history_size(), base);
}

#[test]
fn undo_is_the_inverse_of_execute_for_insert() {
    let engine = engine();
    engine.create_database("inverse_demo", None).unwrap();
    engine
        .create_table("t", vec!["id INTEGER PRIMARY KEY".to_string()])
        .unwrap();

    let before = engine.select("t", None, None).unwrap();
    engine.insert("t", vec!["id".into()], vec![vec![Value::Integer(1)]]).unwrap();
    engine.undo().unwrap();
    let after = engine.select("t", None, None).unwrap();

    assert_eq!(before.row_count(), after.row_count());
}

#[test]
fn failed_insert_leaves_table_row_count_unchanged() {
    let engine = engine();
    employees(&engine);
    engine
        .insert(
            "employees",
            vec!["id".into(), "name".into(), "age".into()],
            vec![vec![Value::Integer(1), Value::String("John".into()), Value::Integer(30)]],
        )
        .unwrap();

    let before = engine.select("employees", None, None).unwrap().row_count();
    let err = engine.insert(
        "employees",
        vec!["id".into(), "name".into(), "age".into()],
        vec![vec![Value::Integer(2), Value::String("John".into()), Value::Integer(10)]],
    );
    assert!(err.is_err());
    let after = engine.select("employees", None, None).unwrap().row_count();
    assert_eq!(before, after);
}
