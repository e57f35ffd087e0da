use crate::analyzers::types::{
    AggFn, AggregateResult, CellValue, GroupKey, GroupedAggregate, KeyField, ValueField,
};
use crate::error::{AnalysisError, Result};
use crate::record::EnrichedRecord;
use std::collections::HashMap;
use tracing::debug;

/// Whether groups with no matching records appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyGroups {
    Omit,
    Include,
}

/// Output order of a group-by.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOrder {
    /// Groups appear in the order their first record appears.
    FirstSeen,
    /// Groups follow `universe`. Keys found in the data but missing from
    /// `universe` are appended afterwards in first-seen order.
    Canonical {
        universe: Vec<GroupKey>,
        empty: EmptyGroups,
    },
}

/// Cartesian product of the domains of `keys`, or `None` when any of them is
/// a free-text field.
pub fn canonical_universe(keys: &[KeyField]) -> Option<Vec<GroupKey>> {
    let mut universe = vec![Vec::new()];

    for field in keys {
        let domain = field.domain()?;
        universe = universe
            .into_iter()
            .flat_map(|prefix| {
                domain.iter().map(move |v| {
                    let mut key = prefix.clone();
                    key.push(v.clone());
                    key
                })
            })
            .collect();
    }

    Some(universe.into_iter().map(GroupKey).collect())
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn finish(self, function: AggFn) -> CellValue {
        match function {
            AggFn::Sum => CellValue::Observed(self.sum),
            AggFn::Count => CellValue::Observed(self.count as f64),
            AggFn::Mean if self.count == 0 => CellValue::NoData,
            AggFn::Mean => CellValue::Observed(self.sum / self.count as f64),
        }
    }
}

/// A group-by over enriched records: key fields, a value column, and the
/// aggregations to compute for each group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    keys: Vec<KeyField>,
    value: ValueField,
    functions: Vec<AggFn>,
    order: GroupOrder,
}

impl GroupBy {
    pub fn new(keys: &[KeyField], value: ValueField, function: AggFn) -> Self {
        GroupBy {
            keys: keys.to_vec(),
            value,
            functions: vec![function],
            order: GroupOrder::FirstSeen,
        }
    }

    /// Adds another aggregation, computed in the same pass.
    pub fn also(mut self, function: AggFn) -> Self {
        if !self.functions.contains(&function) {
            self.functions.push(function);
        }
        self
    }

    pub fn ordered(mut self, order: GroupOrder) -> Self {
        self.order = order;
        self
    }

    /// Orders groups by the full domain of the key fields.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Schema`] when a key field has no fixed domain.
    pub fn canonical(self, empty: EmptyGroups) -> Result<Self> {
        let universe = canonical_universe(&self.keys).ok_or_else(|| {
            AnalysisError::schema(format!(
                "no canonical order for key fields {:?}",
                self.keys
            ))
        })?;
        Ok(self.ordered(GroupOrder::Canonical { universe, empty }))
    }

    /// Runs the group-by in a single pass over `records`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Schema`] with no key fields,
    /// [`AnalysisError::EmptyData`] with no records.
    pub fn run(&self, records: &[EnrichedRecord]) -> Result<GroupedAggregate> {
        if self.keys.is_empty() {
            return Err(AnalysisError::schema("group-by needs at least one key field"));
        }
        if records.is_empty() {
            return Err(AnalysisError::empty(format!(
                "cannot aggregate {} over zero records",
                self.value
            )));
        }

        let mut index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Accumulator)> = Vec::new();

        for record in records {
            let key = GroupKey(self.keys.iter().map(|f| record.key(*f)).collect());
            let slot = match index.get(&key) {
                Some(&i) => i,
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, Accumulator::default()));
                    groups.len() - 1
                }
            };
            let acc = &mut groups[slot].1;
            acc.sum += record.value(self.value);
            acc.count += 1;
        }

        let ordered = match &self.order {
            GroupOrder::FirstSeen => groups,
            GroupOrder::Canonical { universe, empty } => {
                let mut found: Vec<Option<Accumulator>> =
                    groups.iter().map(|(_, acc)| Some(*acc)).collect();
                let mut out = Vec::with_capacity(universe.len().max(groups.len()));

                for key in universe {
                    match index.get(key) {
                        Some(&i) => {
                            if let Some(acc) = found[i].take() {
                                out.push((key.clone(), acc));
                            }
                        }
                        None if *empty == EmptyGroups::Include => {
                            out.push((key.clone(), Accumulator::default()));
                        }
                        None => {}
                    }
                }

                let leftovers: Vec<_> = groups
                    .into_iter()
                    .zip(found)
                    .filter_map(|((key, _), acc)| acc.map(|a| (key, a)))
                    .collect();
                if !leftovers.is_empty() {
                    debug!(count = leftovers.len(), "Groups outside the canonical universe appended");
                }
                out.extend(leftovers);
                out
            }
        };

        debug!(
            keys = ?self.keys,
            value = %self.value,
            groups = ordered.len(),
            records = records.len(),
            "Group-by complete"
        );

        let results = ordered
            .into_iter()
            .flat_map(|(key, acc)| {
                self.functions.iter().map(move |f| AggregateResult {
                    key: key.clone(),
                    function: *f,
                    value: acc.finish(*f),
                })
            })
            .collect();

        Ok(GroupedAggregate {
            keys: self.keys.clone(),
            value: self.value,
            functions: self.functions.clone(),
            results,
        })
    }
}
