//! Ordered, id-deduplicated sets of criteria.
//!
//! Every operation returns a new `Criteria`; nothing is edited in place, so a
//! rule set can be shared across profiling workers.

use crate::domain::criterion::{Criterion, CriterionRecord};
use crate::domain::error::ScreenerError;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Criteria {
    members: Vec<Criterion>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.members.iter()
    }

    pub fn contains(&self, criterion: &Criterion) -> bool {
        self.contains_id(criterion.id())
    }

    pub fn contains_id(&self, id: Uuid) -> bool {
        self.members.iter().any(|c| c.id() == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Criterion> {
        self.members.iter().find(|c| c.id() == id)
    }

    /// Adding a criterion whose id is already present changes nothing.
    pub fn add(&self, criterion: Criterion) -> Criteria {
        let mut next = self.clone();
        if !next.contains(&criterion) {
            next.members.push(criterion);
        }
        next
    }

    pub fn remove(&self, id: Uuid) -> Criteria {
        Criteria {
            members: self.members.iter().filter(|c| c.id() != id).cloned().collect(),
        }
    }

    /// Union by id; members of `self` keep their place and win on conflict.
    pub fn merge(&self, other: &Criteria) -> Criteria {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Members of `self` whose id is not in `other`.
    pub fn difference(&self, other: &Criteria) -> Criteria {
        Criteria {
            members: self
                .members
                .iter()
                .filter(|c| !other.contains(c))
                .cloned()
                .collect(),
        }
    }

    /// True when both sets hold the same ids with identical functions and
    /// operators, in the same order.
    pub fn same_contents(&self, other: &Criteria) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.same_contents(b))
    }
}

impl PartialEq for Criteria {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.id() == b.id())
    }
}

impl FromIterator<Criterion> for Criteria {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let members = iter.into_iter().filter(|c| seen.insert(c.id())).collect();
        Criteria { members }
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Union of any number of criteria sets, first occurrence of an id wins.
pub fn merge_criterias<'a, I>(sets: I) -> Criteria
where
    I: IntoIterator<Item = &'a Criteria>,
{
    sets.into_iter().flat_map(Criteria::iter).cloned().collect()
}

/// Builds criteria from persisted records, validating every function.
pub fn structure(records: &[CriterionRecord], ignore_unsupported_func: bool) -> Result<Criteria, ScreenerError> {
    records
        .iter()
        .map(|record| Criterion::from_record(record, ignore_unsupported_func))
        .collect::<Result<Vec<_>, _>>()
        .map(Criteria::from_iter)
}

pub fn unstructure(criteria: &Criteria) -> Vec<CriterionRecord> {
    criteria.iter().map(Criterion::to_record).collect()
}

/// [`structure`] over a JSON array of records.
pub fn structure_json(json: &str, ignore_unsupported_func: bool) -> Result<Criteria, ScreenerError> {
    let records: Vec<CriterionRecord> = serde_json::from_str(json)?;
    structure(&records, ignore_unsupported_func)
}

pub fn unstructure_json(criteria: &Criteria) -> Result<String, ScreenerError> {
    Ok(serde_json::to_string_pretty(&unstructure(criteria))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::ComparisonOperator;
    use crate::domain::criterion::make_criterion;
    use crate::domain::function_spec::RawFunctionSpec;
    use proptest::prelude::*;

    fn criterion(fast: i64, slow: i64, op: ComparisonOperator) -> Criterion {
        make_criterion(
            &RawFunctionSpec::new("SMA").with_kwarg("timeperiod", fast),
            &RawFunctionSpec::new("EMA").with_kwarg("timeperiod", slow),
            op,
            None,
            false,
        )
        .unwrap()
    }

    fn op_strategy() -> impl Strategy<Value = ComparisonOperator> {
        prop::sample::select(ComparisonOperator::ALL.to_vec())
    }

    fn criteria_strategy() -> impl Strategy<Value = Criteria> {
        prop::collection::vec((2i64..60, 2i64..60, op_strategy()), 1..8)
            .prop_map(|items| items.into_iter().map(|(f, s, op)| criterion(f, s, op)).collect())
    }

    #[test]
    fn add_remove_contains() {
        let a = criterion(5, 20, ComparisonOperator::GreaterThan);
        let b = criterion(10, 50, ComparisonOperator::LessThan);
        let set = Criteria::new().add(a.clone()).add(b.clone());
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
        let smaller = set.remove(a.id());
        assert_eq!(smaller.len(), 1);
        assert!(!smaller.contains(&a));
        assert_eq!(set.len(), 2, "original untouched");
        assert_eq!(set.get(b.id()).map(|c| c.id()), Some(b.id()));
    }

    #[test]
    fn difference_by_id() {
        let a = criterion(5, 20, ComparisonOperator::GreaterThan);
        let b = criterion(10, 50, ComparisonOperator::LessThan);
        let both: Criteria = [a.clone(), b.clone()].into_iter().collect();
        let only_a: Criteria = [a.clone()].into_iter().collect();
        let rest = both.difference(&only_a);
        assert_eq!(rest.len(), 1);
        assert!(rest.contains(&b));
    }

    #[test]
    fn collect_and_merge_keep_first_occurrence_order() {
        let a = criterion(5, 20, ComparisonOperator::GreaterThan);
        let b = criterion(10, 50, ComparisonOperator::LessThan);
        let c = criterion(3, 7, ComparisonOperator::Equals);
        let collected: Criteria = [a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(collected.iter().map(|x| x.id()).collect::<Vec<_>>(), vec![a.id(), b.id()]);

        let other: Criteria = [c.clone(), b.clone()].into_iter().collect();
        let merged = collected.merge(&other);
        assert_eq!(
            merged.iter().map(|x| x.id()).collect::<Vec<_>>(),
            vec![a.id(), b.id(), c.id()]
        );
        assert_eq!(merge_criterias([&other, &collected]).iter().next().map(|x| x.id()), Some(c.id()));
    }

    #[test]
    fn large_sets_build_without_duplicates() {
        let members: Vec<Criterion> = (2..402)
            .map(|p| criterion(p, p + 1, ComparisonOperator::GreaterThan))
            .collect();
        let set: Criteria = members.iter().cloned().chain(members.iter().cloned()).collect();
        assert_eq!(set.len(), 400);
        assert_eq!(set.merge(&set).len(), 400);
    }

    #[test]
    fn structure_tolerates_unsupported_when_asked() {
        let json = r#"[{"func1": {"name": "GONE"}, "func2": {"name": "CLOSE"}, "op": ">"}]"#;
        assert!(structure_json(json, false).is_err());
        let criteria = structure_json(json, true).unwrap();
        assert_eq!(criteria.len(), 1);
        assert!(!criteria.iter().next().unwrap().is_supported());
    }

    #[test]
    fn structure_rejects_malformed_json() {
        assert!(matches!(
            structure_json(r#"[{"func1": {}}]"#, true),
            Err(ScreenerError::Json(_))
        ));
    }

    proptest! {
        #[test]
        fn add_is_idempotent(set in criteria_strategy()) {
            let first = set.iter().next().unwrap().clone();
            let once = set.add(first.clone());
            let twice = once.add(first);
            prop_assert_eq!(once.len(), set.len());
            prop_assert_eq!(twice.len(), set.len());
        }

        #[test]
        fn merge_counts_distinct_ids(a in criteria_strategy(), b in criteria_strategy(), shared in 0usize..3) {
            let b = a.iter().take(shared).cloned().fold(b, |acc, c| acc.add(c));
            let merged = merge_criterias([&a, &b]);
            let mut ids: Vec<Uuid> = a.iter().chain(b.iter()).map(|c| c.id()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(merged.len(), ids.len());
        }

        #[test]
        fn structure_round_trips(set in criteria_strategy()) {
            let back = structure(&unstructure(&set), false).unwrap();
            prop_assert!(back.same_contents(&set));
            prop_assert!(back == set);
        }
    }
}
