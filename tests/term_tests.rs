mod common;

use common::{date, manager, seat};
use duty_roster::DutyError;

#[test]
fn a_term_ends_after_its_weeks() {
    let mut manager = manager();

    let term = manager
        .create_term("  Spring  ", date(2024, 1, 1), 2, false)
        .unwrap();

    assert_eq!(term.name, "Spring");
    assert_eq!(term.end_date, date(2024, 1, 15));
    assert_eq!(term.weeks, 2);
    assert!(!term.is_active);
}

#[test]
fn only_one_term_is_active() {
    let mut manager = manager();
    let first = manager
        .create_term("First", date(2024, 1, 1), 10, true)
        .unwrap();
    let second = manager
        .create_term("Second", date(2024, 4, 1), 10, true)
        .unwrap();

    assert_eq!(manager.active_term().unwrap().map(|t| t.id), Some(second.id));

    manager.activate_term(first.id).unwrap();

    let active: Vec<i32> = manager
        .get_terms()
        .unwrap()
        .iter()
        .filter(|t| t.is_active)
        .map(|t| t.id)
        .collect();
    assert_eq!(active, vec![first.id]);

    assert!(matches!(
        manager.activate_term(404),
        Err(DutyError::TermNotFound(404))
    ));
    // A failed activation leaves the previous one in place.
    assert_eq!(manager.active_term().unwrap().map(|t| t.id), Some(first.id));
}

#[test]
fn terms_are_listed_newest_first() {
    let mut manager = manager();
    manager.create_term("Old", date(2023, 9, 4), 12, false).unwrap();
    manager.create_term("New", date(2024, 9, 2), 12, false).unwrap();

    let names: Vec<String> = manager
        .get_terms()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["New", "Old"]);
}

#[test]
fn invalid_terms_are_rejected() {
    let mut manager = manager();

    assert!(matches!(
        manager.create_term("Nothing", date(2024, 1, 1), 0, false),
        Err(DutyError::InvalidWeeks(0))
    ));
    assert!(matches!(
        manager.create_term("   ", date(2024, 1, 1), 4, false),
        Err(DutyError::EmptyTermName)
    ));
    assert!(manager.get_terms().unwrap().is_empty());
}

#[test]
fn deleting_a_term_removes_its_roster() {
    let mut manager = manager();
    manager.add_table(1, 8).unwrap();
    seat(&mut manager, 1, "S", 4);
    let doomed = manager
        .create_term("Doomed", date(2024, 1, 1), 3, true)
        .unwrap();
    let kept = manager
        .create_term("Kept", date(2024, 4, 1), 1, false)
        .unwrap();
    manager.generate_schedule(doomed.id).unwrap();
    manager.generate_schedule(kept.id).unwrap();
    let doomed_weeks = manager.weekly_assignments(doomed.id).unwrap();
    assert_eq!(doomed_weeks.len(), 3);

    let deleted = manager.delete_term(doomed.id).unwrap();

    assert_eq!(deleted.name, "Doomed");
    assert!(manager.weekly_assignments(doomed.id).unwrap().is_empty());
    for week in doomed_weeks {
        assert!(manager.week_duties(week.id).unwrap().is_empty());
    }
    let kept_weeks = manager.weekly_assignments(kept.id).unwrap();
    assert_eq!(kept_weeks.len(), 1);
    assert_eq!(manager.week_duties(kept_weeks[0].id).unwrap().len(), 14);

    assert!(matches!(
        manager.delete_term(doomed.id),
        Err(DutyError::TermNotFound(_))
    ));
}
