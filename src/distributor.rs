//! Spreads unassigned students across dining tables so that every table gets a mix of grades,
//! genders, and countries.
//!
//! This is a greedy heuristic: each student goes to the table where it "collides" least with the
//! students already seated there, with a little random jitter so equally good tables are picked
//! at random instead of always the first one. Capacity is not taken into account.

use crate::error::{DutyError, Result};
use crate::models::Student;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::debug;

/// Penalty for every seated student sharing the candidate's grade.
pub const GRADE_WEIGHT: f64 = 3.0;
/// Penalty for every seated student sharing the candidate's gender.
pub const GENDER_WEIGHT: f64 = 2.0;
/// Penalty for every seated student sharing the candidate's country.
pub const COUNTRY_WEIGHT: f64 = 2.0;
/// Upper bound (exclusive) of the random tie-breaker added to every score.
pub const JITTER: f64 = 2.0;

/// The attributes the heuristic balances on. Absent values compare equal to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Profile<'a> {
    grade: Option<i32>,
    gender: Option<&'a str>,
    country: Option<&'a str>,
}

impl<'a> From<&'a Student> for Profile<'a> {
    fn from(student: &'a Student) -> Self {
        Self {
            grade: student.grade,
            gender: student.gender.as_deref(),
            country: student.country.as_deref(),
        }
    }
}

impl Profile<'_> {
    fn collisions(&self, seated: &[Profile<'_>]) -> f64 {
        seated
            .iter()
            .map(|other| {
                let mut score = 0.0;
                if other.grade == self.grade {
                    score += GRADE_WEIGHT;
                }
                if other.gender == self.gender {
                    score += GENDER_WEIGHT;
                }
                if other.country == self.country {
                    score += COUNTRY_WEIGHT;
                }
                score
            })
            .sum()
    }
}

/// The outcome of a distribution run: which table each student (by database id) was sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub assignments: Vec<(i32, i32)>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// The table a given student was assigned to, if any.
    pub fn table_for(&self, student: i32) -> Option<i32> {
        self.assignments
            .iter()
            .find(|(id, _)| *id == student)
            .map(|(_, table)| *table)
    }
}

/// Splits `students` into groups sharing the same key, in order of first appearance.
fn group_by<'a, K, F>(students: &[&'a Student], key: F) -> Vec<Vec<&'a Student>>
where
    K: Eq + Hash,
    F: Fn(&'a Student) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Student>> = Vec::new();

    for &student in students {
        let slot = *index.entry(key(student)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(student);
    }

    groups
}

/// Assigns every student in `unassigned` to one of `table_numbers`.
///
/// `seated` are students who already sit at one of the tables; they count towards collisions so
/// that newly imported students are balanced against the existing membership. Students in
/// `seated` whose table is not in `table_numbers` are ignored.
///
/// Returns [`DutyError::NoTables`] when `table_numbers` is empty, and an empty [`Distribution`]
/// when there is nobody to place.
pub fn distribute<R: Rng + ?Sized>(
    unassigned: &[Student],
    seated: &[Student],
    table_numbers: &[i32],
    rng: &mut R,
) -> Result<Distribution> {
    if table_numbers.is_empty() {
        return Err(DutyError::NoTables);
    }

    if unassigned.is_empty() {
        return Ok(Distribution::default());
    }

    let mut pending: Vec<&Student> = unassigned.iter().collect();
    pending.shuffle(rng);

    let mut by_grade = group_by(&pending, |s| s.grade);
    let by_gender = group_by(&pending, |s| s.gender.as_deref());
    let by_country = group_by(&pending, |s| s.country.as_deref());
    debug!(
        students = pending.len(),
        grades = by_grade.len(),
        genders = by_gender.len(),
        countries = by_country.len(),
        "grouped students for distribution"
    );

    let mut tables: Vec<(i32, Vec<Profile>)> = table_numbers
        .iter()
        .map(|&number| {
            let members = seated
                .iter()
                .filter(|s| s.table_number == Some(number))
                .map(Profile::from)
                .collect();
            (number, members)
        })
        .collect();

    let mut distribution = Distribution::default();
    let mut placed: HashSet<i32> = HashSet::new();

    by_grade.shuffle(rng);
    for mut group in by_grade {
        group.shuffle(rng);

        for student in group {
            let profile = Profile::from(student);

            let mut best: Option<(usize, f64)> = None;
            for (idx, (_, members)) in tables.iter().enumerate() {
                let score = profile.collisions(members) + rng.random_range(0.0..JITTER);
                if best.is_none_or(|(_, best_score)| score < best_score) {
                    best = Some((idx, score));
                }
            }

            if let Some((idx, _)) = best {
                let (number, members) = &mut tables[idx];
                members.push(profile);
                distribution.assignments.push((student.id, *number));
                placed.insert(student.id);
            }
        }
    }

    // Anyone the scoring pass skipped is dealt out round-robin.
    let mut remaining: Vec<&Student> = pending
        .into_iter()
        .filter(|s| !placed.contains(&s.id))
        .collect();
    remaining.shuffle(rng);
    deal_round_robin(&remaining, &mut tables, &mut distribution);

    Ok(distribution)
}

/// Deals `students` out over `tables` in turn, starting with the first table.
fn deal_round_robin<'a>(
    students: &[&'a Student],
    tables: &mut [(i32, Vec<Profile<'a>>)],
    distribution: &mut Distribution,
) {
    if tables.is_empty() {
        return;
    }

    for (idx, &student) in students.iter().enumerate() {
        let slot = idx % tables.len();
        let (number, members) = &mut tables[slot];
        members.push(Profile::from(student));
        distribution.assignments.push((student.id, *number));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn student(id: i32, grade: Option<i32>, gender: &str, country: &str) -> Student {
        Student {
            id,
            student_id: format!("S{id:03}"),
            full_name: format!("Student {id}"),
            grade,
            gender: Some(gender.to_string()),
            country: Some(country.to_string()),
            table_number: None,
        }
    }

    fn counts(distribution: &Distribution, tables: &[i32]) -> Vec<usize> {
        tables
            .iter()
            .map(|t| {
                distribution
                    .assignments
                    .iter()
                    .filter(|(_, table)| table == t)
                    .count()
            })
            .collect()
    }

    #[test]
    fn no_tables_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let students = vec![student(1, Some(9), "F", "KE")];

        let result = distribute(&students, &[], &[], &mut rng);
        assert!(matches!(result, Err(DutyError::NoTables)));
    }

    #[test]
    fn no_students_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(2);

        let distribution = distribute(&[], &[], &[1, 2], &mut rng).unwrap();
        assert!(distribution.is_empty());
    }

    #[test]
    fn every_student_lands_on_an_existing_table() {
        let mut rng = StdRng::seed_from_u64(3);
        let countries = ["KE", "UG", "TZ", "RW", "GH"];
        let students: Vec<Student> = (1..=47)
            .map(|id| {
                let grade = if id % 6 == 0 { None } else { Some(8 + id % 5) };
                let gender = if id % 2 == 0 { "F" } else { "M" };
                student(id, grade, gender, countries[id as usize % countries.len()])
            })
            .collect();
        let tables = [2, 4, 6, 8];

        let distribution = distribute(&students, &[], &tables, &mut rng).unwrap();

        assert_eq!(distribution.len(), students.len());
        for s in &students {
            let table = distribution.table_for(s.id).expect("student was not placed");
            assert!(tables.contains(&table));
        }
    }

    #[test]
    fn identical_students_are_spread_evenly() {
        let mut rng = StdRng::seed_from_u64(4);
        let students: Vec<Student> = (1..=30).map(|id| student(id, Some(10), "F", "KE")).collect();
        let tables = [1, 2, 3];

        let distribution = distribute(&students, &[], &tables, &mut rng).unwrap();

        // A shared profile costs 7 per seated student, more than the jitter can make up.
        assert_eq!(counts(&distribution, &tables), vec![10, 10, 10]);
    }

    #[test]
    fn seated_students_count_as_collisions() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut already_seated = student(1, Some(11), "M", "NG");
        already_seated.table_number = Some(1);
        let newcomer = student(2, Some(11), "M", "NG");

        let distribution = distribute(&[newcomer], &[already_seated], &[1, 2], &mut rng).unwrap();

        assert_eq!(distribution.table_for(2), Some(2));
    }

    #[test]
    fn leftovers_are_dealt_round_robin() {
        let students: Vec<Student> = (1..=5).map(|id| student(id, Some(9), "M", "KE")).collect();
        let leftovers: Vec<&Student> = students.iter().collect();
        let mut seated_at_seven = student(9, Some(12), "F", "UG");
        seated_at_seven.table_number = Some(7);
        let mut tables = vec![(3, Vec::new()), (7, vec![Profile::from(&seated_at_seven)])];
        let mut distribution = Distribution::default();

        deal_round_robin(&leftovers, &mut tables, &mut distribution);

        assert_eq!(
            distribution.assignments,
            vec![(1, 3), (2, 7), (3, 3), (4, 7), (5, 3)]
        );
        assert_eq!(tables[0].1.len(), 3);
        assert_eq!(tables[1].1.len(), 3);
    }

    #[test]
    fn round_robin_without_tables_places_nobody() {
        let students = vec![student(1, None, "F", "KE")];
        let leftovers: Vec<&Student> = students.iter().collect();
        let mut distribution = Distribution::default();

        deal_round_robin(&leftovers, &mut [], &mut distribution);

        assert!(distribution.is_empty());
    }

    #[test]
    fn grades_are_mixed_across_tables() {
        let mut rng = StdRng::seed_from_u64(6);
        let students: Vec<Student> = (0..20)
            .map(|id| student(id, Some(9 + id % 2), "F", "KE"))
            .collect();
        let tables = [1, 2];

        let distribution = distribute(&students, &[], &tables, &mut rng).unwrap();

        for table in tables {
            let grades: HashSet<Option<i32>> = distribution
                .assignments
                .iter()
                .filter(|(_, t)| *t == table)
                .map(|(id, _)| students[*id as usize].grade)
                .collect();
            assert_eq!(grades.len(), 2, "table {table} only has {grades:?}");
        }
    }
}
