mod common;

use common::{all_students, assert_counts_consistent, entries, manager, seat};
use duty_roster::DutyError;
use duty_roster::manager::{SortKey, StudentQuery, TableFilter};

#[test]
fn distributing_without_tables_changes_nothing() {
    let mut manager = manager();
    manager.import_students(&entries("S", 5)).unwrap();

    let err = manager.distribute().unwrap_err();

    assert!(matches!(err, DutyError::NoTables));
    assert!(err.is_missing_prerequisite());
    assert!(all_students(&mut manager).iter().all(|s| s.table_number.is_none()));
}

#[test]
fn every_student_gets_an_existing_table() {
    let mut manager = manager();
    for number in [1, 2, 3, 4] {
        manager.add_table(number, 8).unwrap();
    }
    manager.import_students(&entries("S", 30)).unwrap();

    let report = manager.distribute().unwrap();

    assert_eq!(report.assigned, 30);
    for student in all_students(&mut manager) {
        let table = student.table_number.expect("student left unassigned");
        assert!((1..=4).contains(&table));
    }
    assert_counts_consistent(&mut manager);

    let total: i32 = manager.get_tables().unwrap().iter().map(|t| t.current_count).sum();
    assert_eq!(total, 30);
}

#[test]
fn distribution_only_touches_unassigned_students() {
    let mut manager = manager();
    manager.add_table(1, 4).unwrap();
    manager.add_table(2, 4).unwrap();
    let seated = seat(&mut manager, 1, "A", 3);
    manager.import_students(&entries("B", 4)).unwrap();

    let report = manager.distribute().unwrap();

    assert_eq!(report.assigned, 4);
    for student in seated {
        let now = manager.get_student(&student.student_id).unwrap();
        assert_eq!(now.table_number, Some(1));
    }
    assert_counts_consistent(&mut manager);

    // Nobody left to place.
    assert_eq!(manager.distribute().unwrap().assigned, 0);
}

#[test]
fn capacity_is_not_enforced() {
    let mut manager = manager();
    manager.add_table(1, 2).unwrap();
    manager.import_students(&entries("S", 5)).unwrap();

    manager.distribute().unwrap();

    let tables = manager.get_tables().unwrap();
    assert_eq!(tables[0].current_count, 5);
    assert_eq!(tables[0].capacity, 2);
}

#[test]
fn redistribution_reseats_everyone() {
    let mut manager = manager();
    manager.add_table(1, 10).unwrap();
    manager.add_table(2, 10).unwrap();
    seat(&mut manager, 1, "S", 12);

    let report = manager.redistribute().unwrap();

    assert_eq!(report.assigned, 12);
    let tables = manager.get_tables().unwrap();
    // With two genders, a third student always collides at a lone occupied table.
    assert!(tables.iter().all(|t| t.current_count > 0));
    assert_counts_consistent(&mut manager);
}

#[test]
fn redistribution_without_tables_changes_nothing() {
    let mut manager = manager();
    manager.add_table(1, 4).unwrap();
    seat(&mut manager, 1, "S", 2);
    // Deleting the only table sends its members back to the unassigned pool.
    manager.delete_table(1).unwrap();
    let before = all_students(&mut manager);

    let err = manager.redistribute().unwrap_err();

    assert!(matches!(err, DutyError::NoTables));
    assert!(err.is_missing_prerequisite());
    assert_eq!(all_students(&mut manager), before);
    assert!(before.iter().all(|s| s.table_number.is_none()));
}

#[test]
fn moving_a_student_updates_both_tables() {
    let mut manager = manager();
    manager.add_table(1, 4).unwrap();
    manager.add_table(2, 4).unwrap();
    let students = seat(&mut manager, 1, "S", 3);

    manager
        .reassign_student(&students[0].student_id, Some(2))
        .unwrap();
    let counts: Vec<i32> = manager
        .get_tables()
        .unwrap()
        .iter()
        .map(|t| t.current_count)
        .collect();
    assert_eq!(counts, vec![2, 1]);

    let unassigned = manager
        .reassign_student(&students[1].student_id, None)
        .unwrap();
    assert_eq!(unassigned.table_number, None);
    assert_counts_consistent(&mut manager);

    assert!(matches!(
        manager.reassign_student(&students[2].student_id, Some(9)),
        Err(DutyError::TableNotFound(9))
    ));
    assert!(matches!(
        manager.reassign_student("nobody", Some(1)),
        Err(DutyError::StudentNotFound(_))
    ));
}

#[test]
fn duplicate_tables_are_rejected() {
    let mut manager = manager();
    manager.add_table(5, 8).unwrap();

    let err = manager.add_table(5, 10).unwrap_err();

    assert!(matches!(err, DutyError::DuplicateTable(5)));
    assert_eq!(manager.get_tables().unwrap().len(), 1);
    assert!(matches!(
        manager.add_table(6, 0),
        Err(DutyError::InvalidCapacity(0))
    ));
}

#[test]
fn renumbering_a_table_takes_its_students_along() {
    let mut manager = manager();
    manager.add_table(1, 8).unwrap();
    manager.add_table(2, 8).unwrap();
    seat(&mut manager, 1, "S", 3);

    assert!(matches!(
        manager.edit_table(1, 2, 8),
        Err(DutyError::DuplicateTable(2))
    ));

    let table = manager.edit_table(1, 7, 12).unwrap();

    assert_eq!(table.table_number, 7);
    assert_eq!(table.capacity, 12);
    assert_eq!(table.current_count, 3);
    assert_eq!(manager.table_members(7).unwrap().len(), 3);
    assert!(manager.table_members(1).unwrap().is_empty());
    assert_counts_consistent(&mut manager);
}

#[test]
fn deleting_a_table_unassigns_its_students() {
    let mut manager = manager();
    manager.add_table(1, 8).unwrap();
    seat(&mut manager, 1, "S", 4);

    let unassigned = manager.delete_table(1).unwrap();

    assert_eq!(unassigned, 4);
    assert!(manager.get_tables().unwrap().is_empty());
    let query = StudentQuery {
        table: TableFilter::Unassigned,
        ..StudentQuery::default()
    };
    assert_eq!(manager.get_roster(&query).unwrap().len(), 4);
}

#[test]
fn roster_queries_filter_and_sort() {
    let mut manager = manager();
    manager.add_table(1, 8).unwrap();
    seat(&mut manager, 1, "A", 3);
    manager.import_students(&entries("B", 3)).unwrap();

    let at_table = StudentQuery {
        table: TableFilter::Table(1),
        ..StudentQuery::default()
    };
    assert_eq!(manager.get_roster(&at_table).unwrap().len(), 3);

    let search = StudentQuery {
        search: Some("b student".to_string()),
        sort: SortKey::Name,
        descending: true,
        ..StudentQuery::default()
    };
    let names: Vec<String> = manager
        .get_roster(&search)
        .unwrap()
        .into_iter()
        .map(|s| s.full_name)
        .collect();
    assert_eq!(names, vec!["B Student 3", "B Student 2", "B Student 1"]);

    let grade = StudentQuery {
        grade: Some(10),
        ..StudentQuery::default()
    };
    // Grades cycle 10, 11, 9 in each batch of three.
    assert_eq!(manager.get_roster(&grade).unwrap().len(), 2);
}
