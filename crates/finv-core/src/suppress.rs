//! Logical suppression.
//!
//! A template says: an invariant of kind `target` over variables `V` is
//! implied when accepted invariants of the antecedent kinds exist over
//! transforms of `V` and the template's [`Rule`] holds between them.
//! Templates are plain data; [`find_suppression`] is the only interpreter.
//!
//! Matching is permissive: an unresolvable transform or a missing
//! antecedent means "not suppressed", never an error.

use std::cmp::Ordering;

use finv_inv::relation::Relation;
use finv_inv::{InvState, Invariant};
use finv_types::{InvKindTag, Value, VarId};
use smallvec::SmallVec;

/// How a template slot picks a variable from the target's variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarTransform {
    /// The target's variable at this canonical position.
    Var(usize),
    /// The sequence the target's variable at this position is an element of.
    Source(usize),
    /// Any other leader of the location.
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSlot {
    pub kind: InvKindTag,
    pub vars: &'static [VarTransform],
}

/// The algebraic condition a template checks between target and antecedents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `x >= c > 0` or `x <= c < 0` implies `x != 0`.
    BoundExcludesZero,
    /// `x in S`, `0 not in S` implies `x != 0`.
    OneOfExcludesZero,
    /// `x in S` with every element of `S` inside the bound implies the bound.
    OneOfWithinBound,
    /// Element bound away from zero implies elements are non-zero.
    EltBoundExcludesZero,
    /// `x` drawn from `a`, `a[] >= c`, `c >= m` implies `x >= m`.
    EltBoundImpliesBound,
    /// `x` drawn from `a`, `a[] != 0` implies `x != 0`.
    ElementsExcludeZero,
    /// `x` drawn from `b`, `b` contained in `a` implies `x in a`.
    ContainmentImpliesMember,
    /// `x` drawn from `b`, `b == a` implies `x in a`.
    SeqEqualImpliesMember,
    /// A subsequence is a subset.
    SubsequenceImpliesSubset,
    /// `x R1 z`, `z R2 y`, `R1;R2` implies `R` gives `x R y`.
    Transitivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionTemplate {
    pub target: InvKindTag,
    pub antecedents: &'static [TemplateSlot],
    pub rule: Rule,
}

const fn slot(kind: InvKindTag, vars: &'static [VarTransform]) -> TemplateSlot {
    TemplateSlot { kind, vars }
}

const V0: &[VarTransform] = &[VarTransform::Var(0)];
const SRC0: &[VarTransform] = &[VarTransform::Source(0)];
const SRC1_V0: &[VarTransform] = &[VarTransform::Source(1), VarTransform::Var(0)];
const V0_V1: &[VarTransform] = &[VarTransform::Var(0), VarTransform::Var(1)];
const V0_FREE: &[VarTransform] = &[VarTransform::Var(0), VarTransform::Free];
const FREE_V1: &[VarTransform] = &[VarTransform::Free, VarTransform::Var(1)];

/// Every template, in evaluation order.
pub static TEMPLATES: &[SuppressionTemplate] = &[
    SuppressionTemplate {
        target: InvKindTag::NonZero,
        antecedents: &[slot(InvKindTag::LowerBound, V0)],
        rule: Rule::BoundExcludesZero,
    },
    SuppressionTemplate {
        target: InvKindTag::NonZero,
        antecedents: &[slot(InvKindTag::UpperBound, V0)],
        rule: Rule::BoundExcludesZero,
    },
    SuppressionTemplate {
        target: InvKindTag::NonZero,
        antecedents: &[slot(InvKindTag::OneOf, V0)],
        rule: Rule::OneOfExcludesZero,
    },
    SuppressionTemplate {
        target: InvKindTag::NonZero,
        antecedents: &[slot(InvKindTag::EltNonZero, SRC0)],
        rule: Rule::ElementsExcludeZero,
    },
    SuppressionTemplate {
        target: InvKindTag::LowerBound,
        antecedents: &[slot(InvKindTag::OneOf, V0)],
        rule: Rule::OneOfWithinBound,
    },
    SuppressionTemplate {
        target: InvKindTag::UpperBound,
        antecedents: &[slot(InvKindTag::OneOf, V0)],
        rule: Rule::OneOfWithinBound,
    },
    SuppressionTemplate {
        target: InvKindTag::LowerBound,
        antecedents: &[slot(InvKindTag::EltLowerBound, SRC0)],
        rule: Rule::EltBoundImpliesBound,
    },
    SuppressionTemplate {
        target: InvKindTag::UpperBound,
        antecedents: &[slot(InvKindTag::EltUpperBound, SRC0)],
        rule: Rule::EltBoundImpliesBound,
    },
    SuppressionTemplate {
        target: InvKindTag::EltNonZero,
        antecedents: &[slot(InvKindTag::EltLowerBound, V0)],
        rule: Rule::EltBoundExcludesZero,
    },
    SuppressionTemplate {
        target: InvKindTag::EltNonZero,
        antecedents: &[slot(InvKindTag::EltUpperBound, V0)],
        rule: Rule::EltBoundExcludesZero,
    },
    SuppressionTemplate {
        target: InvKindTag::Member,
        antecedents: &[slot(InvKindTag::SubSet, SRC1_V0)],
        rule: Rule::ContainmentImpliesMember,
    },
    SuppressionTemplate {
        target: InvKindTag::Member,
        antecedents: &[slot(InvKindTag::SubSequence, SRC1_V0)],
        rule: Rule::ContainmentImpliesMember,
    },
    SuppressionTemplate {
        target: InvKindTag::Member,
        antecedents: &[slot(InvKindTag::Comparison, SRC1_V0)],
        rule: Rule::SeqEqualImpliesMember,
    },
    SuppressionTemplate {
        target: InvKindTag::SubSet,
        antecedents: &[slot(InvKindTag::SubSequence, V0_V1)],
        rule: Rule::SubsequenceImpliesSubset,
    },
    SuppressionTemplate {
        target: InvKindTag::Comparison,
        antecedents: &[
            slot(InvKindTag::Comparison, V0_FREE),
            slot(InvKindTag::Comparison, FREE_V1),
        ],
        rule: Rule::Transitivity,
    },
];

/// An accepted invariant found for a template slot.
#[derive(Debug, Clone, Copy)]
pub struct Found<'a> {
    pub inv: &'a Invariant,
    /// The invariant's slice holds the two requested variables in reverse.
    pub swapped: bool,
}

/// What the interpreter may ask of a location.
pub trait FactBase {
    /// An accepted invariant of `kind` over exactly `vars`.
    fn accepted(&self, kind: InvKindTag, vars: &[VarId]) -> Option<Found<'_>>;

    /// Leader of the sequence `var` is drawn from.
    fn element_source(&self, var: VarId) -> Option<VarId>;

    /// Every leader, ascending.
    fn leaders(&self) -> Vec<VarId>;
}

/// A successful template match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    /// Index into [`TEMPLATES`].
    pub template: usize,
    /// Antecedents as `(kind, variables)` in slot order.
    pub by: Vec<(InvKindTag, SmallVec<[VarId; 3]>)>,
}

/// Target variables in the order templates address them: Member puts the
/// sequence first.
fn canonical(target: &Invariant, vars: &[VarId]) -> SmallVec<[VarId; 3]> {
    let mut out: SmallVec<[VarId; 3]> = SmallVec::from_slice(vars);
    if let InvState::Member(m) = target.state() {
        if !m.seq_first() {
            out.reverse();
        }
    }
    out
}

fn resolve(
    slot: &TemplateSlot,
    vars: &[VarId],
    free: Option<VarId>,
    facts: &dyn FactBase,
) -> Option<SmallVec<[VarId; 3]>> {
    let mut out: SmallVec<[VarId; 3]> = SmallVec::new();
    for transform in slot.vars {
        let var = match *transform {
            VarTransform::Var(i) => *vars.get(i)?,
            VarTransform::Source(i) => facts.element_source(*vars.get(i)?)?,
            VarTransform::Free => free?,
        };
        if out.contains(&var) {
            return None;
        }
        out.push(var);
    }
    Some(out)
}

/// The first template that suppresses `target` over `vars`, if any.
pub fn find_suppression(
    facts: &dyn FactBase,
    target: &Invariant,
    vars: &[VarId],
) -> Option<Suppression> {
    let vars = canonical(target, vars);
    for (index, template) in TEMPLATES.iter().enumerate() {
        if template.target != target.kind() {
            continue;
        }
        let needs_free = template
            .antecedents
            .iter()
            .any(|s| s.vars.contains(&VarTransform::Free));
        let frees: Vec<Option<VarId>> = if needs_free {
            facts
                .leaders()
                .into_iter()
                .filter(|l| !vars.contains(l))
                .map(Some)
                .collect()
        } else {
            vec![None]
        };
        for free in frees {
            let mut found = Vec::with_capacity(template.antecedents.len());
            let mut by = Vec::with_capacity(template.antecedents.len());
            for slot in template.antecedents {
                let Some(resolved) = resolve(slot, &vars, free, facts) else {
                    break;
                };
                let Some(hit) = facts.accepted(slot.kind, &resolved) else {
                    break;
                };
                found.push(hit);
                by.push((slot.kind, resolved));
            }
            if found.len() == template.antecedents.len() && template.rule.holds(target, &found) {
                return Some(Suppression {
                    template: index,
                    by,
                });
            }
        }
    }
    None
}

fn sign(value: &Value) -> Option<Ordering> {
    match value {
        Value::Int(v) => Some(v.cmp(&0)),
        Value::Float(v) => v.partial_cmp(&0.0),
        _ => None,
    }
}

fn oriented(relation: Option<Relation>, swapped: bool) -> Option<Relation> {
    relation.map(|r| if swapped { r.flip() } else { r })
}

impl Rule {
    /// Whether the antecedents (in slot order) imply `target`.
    #[must_use]
    pub fn holds(self, target: &Invariant, found: &[Found<'_>]) -> bool {
        let Some(first) = found.first() else {
            return false;
        };
        match (self, target.state(), first.inv.state()) {
            (Self::BoundExcludesZero, InvState::NonZero(nz), InvState::LowerBound(b))
            | (Self::EltBoundExcludesZero, InvState::EltNonZero(nz), InvState::EltLowerBound(b)) => {
                !nz.is_pointer() && b.min().and_then(sign) == Some(Ordering::Greater)
            }
            (Self::BoundExcludesZero, InvState::NonZero(nz), InvState::UpperBound(b))
            | (Self::EltBoundExcludesZero, InvState::EltNonZero(nz), InvState::EltUpperBound(b)) => {
                !nz.is_pointer() && b.max().and_then(sign) == Some(Ordering::Less)
            }
            (Self::OneOfExcludesZero, InvState::NonZero(_), InvState::OneOf(o)) => {
                !o.values().is_empty() && !o.values().iter().any(Value::is_zero)
            }
            (Self::OneOfWithinBound, InvState::LowerBound(b), InvState::OneOf(o)) => {
                b.min().is_some_and(|m| {
                    !o.values().is_empty()
                        && o.values().iter().all(|v| v.compare(m).is_some_and(Ordering::is_ge))
                })
            }
            (Self::OneOfWithinBound, InvState::UpperBound(b), InvState::OneOf(o)) => {
                b.max().is_some_and(|m| {
                    !o.values().is_empty()
                        && o.values().iter().all(|v| v.compare(m).is_some_and(Ordering::is_le))
                })
            }
            (Self::EltBoundImpliesBound, InvState::LowerBound(t), InvState::EltLowerBound(e)) => {
                match (e.min(), t.min()) {
                    (Some(elt), Some(own)) => elt.compare(own).is_some_and(Ordering::is_ge),
                    _ => false,
                }
            }
            (Self::EltBoundImpliesBound, InvState::UpperBound(t), InvState::EltUpperBound(e)) => {
                match (e.max(), t.max()) {
                    (Some(elt), Some(own)) => elt.compare(own).is_some_and(Ordering::is_le),
                    _ => false,
                }
            }
            (Self::ElementsExcludeZero, InvState::NonZero(nz), InvState::EltNonZero(_)) => {
                !nz.is_pointer()
            }
            (Self::ContainmentImpliesMember, InvState::Member(_), InvState::SubSet(s)) => {
                let c = s.containment();
                if first.swapped { c.second_in_first() } else { c.first_in_second() }
            }
            (Self::ContainmentImpliesMember, InvState::Member(_), InvState::SubSequence(s)) => {
                let c = s.containment();
                if first.swapped { c.second_in_first() } else { c.first_in_second() }
            }
            (Self::SeqEqualImpliesMember, InvState::Member(_), InvState::Comparison(c)) => {
                c.relation() == Some(Relation::Eq)
            }
            (Self::SubsequenceImpliesSubset, InvState::SubSet(s), InvState::SubSequence(q)) => {
                let (want_fwd, want_back) = (s.containment().first_in_second(), s.containment().second_in_first());
                let c = q.containment();
                let (fwd, back) = if first.swapped {
                    (c.second_in_first(), c.first_in_second())
                } else {
                    (c.first_in_second(), c.second_in_first())
                };
                (want_fwd || want_back) && (!want_fwd || fwd) && (!want_back || back)
            }
            (Self::Transitivity, InvState::Comparison(t), InvState::Comparison(c1)) => {
                let Some(second) = found.get(1) else {
                    return false;
                };
                let InvState::Comparison(c2) = second.inv.state() else {
                    return false;
                };
                let (Some(want), Some(r1), Some(r2)) = (
                    t.relation(),
                    oriented(c1.relation(), first.swapped),
                    oriented(c2.relation(), second.swapped),
                ) else {
                    return false;
                };
                r1.compose(r2).is_some_and(|r| r.implies(want))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use finv_inv::binary::{Comparison, Member, SubSequence, SubSet};
    use finv_inv::scalar::{Bound, NonZero, OneOf};
    use finv_types::ModBit;

    use super::*;

    /// Hand-built facts: invariants over positional variables, plus element
    /// provenance.
    #[derive(Default)]
    struct Facts {
        invs: Vec<(Vec<VarId>, Invariant)>,
        sources: BTreeMap<VarId, VarId>,
        leaders: Vec<VarId>,
    }

    impl Facts {
        fn with(mut self, vars: &[u32], inv: Invariant) -> Self {
            self.invs.push((vars.iter().map(|v| VarId(*v)).collect(), inv));
            self
        }
    }

    impl FactBase for Facts {
        fn accepted(&self, kind: InvKindTag, vars: &[VarId]) -> Option<Found<'_>> {
            self.invs.iter().find_map(|(have, inv)| {
                if inv.kind() != kind {
                    return None;
                }
                if have.as_slice() == vars {
                    return Some(Found { inv, swapped: false });
                }
                let reversed = have.len() == 2 && have[0] == vars[1] && have[1] == vars[0];
                reversed.then_some(Found { inv, swapped: true })
            })
        }

        fn element_source(&self, var: VarId) -> Option<VarId> {
            self.sources.get(&var).copied()
        }

        fn leaders(&self) -> Vec<VarId> {
            self.leaders.clone()
        }
    }

    fn fed(state: InvState, samples: &[&[Value]]) -> Invariant {
        let mut inv = Invariant::new(state);
        for s in samples {
            let refs: Vec<&Value> = s.iter().collect();
            inv.update(&refs, &vec![ModBit::Modified; refs.len()]).unwrap();
        }
        inv
    }

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().map(|x| Value::Int(*x)).collect()
    }

    fn cmp(pairs: &[(i64, i64)]) -> Invariant {
        let rows: Vec<Vec<Value>> = pairs.iter().map(|(a, b)| ints(&[*a, *b])).collect();
        let refs: Vec<&[Value]> = rows.iter().map(Vec::as_slice).collect();
        fed(InvState::Comparison(Comparison::new(false)), &refs)
    }

    fn nonzero() -> Invariant {
        Invariant::new(InvState::NonZero(NonZero::new(false, 50)))
    }

    fn lower(min: i64) -> Invariant {
        fed(InvState::LowerBound(Bound::new(50)), &[&ints(&[min])])
    }

    fn upper(max: i64) -> Invariant {
        fed(InvState::UpperBound(Bound::new(50)), &[&ints(&[max])])
    }

    fn elt(state: InvState, items: &[i64]) -> Invariant {
        fed(state, &[&[Value::int_seq(items.to_vec())]])
    }

    fn seqs(a: &[i64], b: &[i64]) -> Vec<Value> {
        vec![Value::int_seq(a.to_vec()), Value::int_seq(b.to_vec())]
    }

    fn rule_for(facts: &Facts, target: &Invariant, vars: &[u32]) -> Option<Rule> {
        let vars: Vec<VarId> = vars.iter().map(|v| VarId(*v)).collect();
        find_suppression(facts, target, &vars).map(|s| TEMPLATES[s.template].rule)
    }

    /// `x` (0) drawn from `a` (1).
    fn drawn(mut facts: Facts) -> Facts {
        facts.sources.insert(VarId(0), VarId(1));
        facts
    }

    #[test]
    fn test_positive_lower_bound_suppresses_nonzero() {
        let facts = Facts::default().with(&[0], lower(1));
        let s = find_suppression(&facts, &nonzero(), &[VarId(0)]).unwrap();
        assert_eq!(TEMPLATES[s.template].rule, Rule::BoundExcludesZero);

        // x >= 0 and x >= -1 admit zero.
        for min in [0, -1] {
            let facts = Facts::default().with(&[0], lower(min));
            assert_eq!(find_suppression(&facts, &nonzero(), &[VarId(0)]), None);
        }
    }

    #[test]
    fn test_one_of_with_zero_does_not_suppress_nonzero() {
        let with_zero = fed(InvState::OneOf(OneOf::new(3)), &[&ints(&[0]), &ints(&[1])]);
        let facts = Facts::default().with(&[0], with_zero);
        assert_eq!(find_suppression(&facts, &nonzero(), &[VarId(0)]), None);

        let without = fed(InvState::OneOf(OneOf::new(3)), &[&ints(&[2]), &ints(&[1])]);
        let facts = Facts::default().with(&[0], without);
        assert!(find_suppression(&facts, &nonzero(), &[VarId(0)]).is_some());
    }

    #[test]
    fn test_one_of_within_bound() {
        let one_of = fed(InvState::OneOf(OneOf::new(3)), &[&ints(&[2]), &ints(&[5])]);
        let facts = Facts::default().with(&[0], one_of);
        assert!(find_suppression(&facts, &lower(2), &[VarId(0)]).is_some());
        // x >= 3 is not implied by x in {2, 5}.
        assert!(find_suppression(&facts, &lower(3), &[VarId(0)]).is_none());
    }

    #[test]
    fn test_transitivity() {
        let x_lt_y = cmp(&[(1, 2)]);
        let facts = Facts {
            leaders: vec![VarId(0), VarId(1), VarId(2)],
            ..Facts::default()
        }
        .with(&[0, 2], cmp(&[(1, 3)]))
        // Stored as (y, z) with y > z; the interpreter flips it to z < y.
        .with(&[1, 2], cmp(&[(5, 3), (6, 2)]));
        let s = find_suppression(&facts, &x_lt_y, &[VarId(0), VarId(1)]).unwrap();
        assert_eq!(s.by.len(), 2);
        assert_eq!(s.by[0].1.as_slice(), &[VarId(0), VarId(2)]);
    }

    #[test]
    fn test_transitivity_counterexamples() {
        let leaders = vec![VarId(0), VarId(1), VarId(2)];
        // x < z and z > y say nothing about x vs y.
        let facts = Facts {
            leaders: leaders.clone(),
            ..Facts::default()
        }
        .with(&[0, 2], cmp(&[(1, 3)]))
        .with(&[2, 1], cmp(&[(3, 1)]));
        assert!(find_suppression(&facts, &cmp(&[(1, 2)]), &[VarId(0), VarId(1)]).is_none());

        // x <= z <= y gives x <= y, not x < y.
        let facts = Facts {
            leaders,
            ..Facts::default()
        }
        .with(&[0, 2], cmp(&[(1, 1), (0, 1)]))
        .with(&[2, 1], cmp(&[(1, 1), (0, 1)]));
        assert!(find_suppression(&facts, &cmp(&[(1, 2)]), &[VarId(0), VarId(1)]).is_none());
        assert!(find_suppression(&facts, &cmp(&[(1, 2), (2, 2)]), &[VarId(0), VarId(1)]).is_some());
    }

    #[test]
    fn test_subset_of_source_suppresses_member() {
        // x = b[0]; slice (x, a) holds "x in a" with the scalar first.
        let (x, a, b) = (VarId(0), VarId(1), VarId(2));
        let member = Invariant::new(InvState::Member(Member::new(false)));
        let b_in_a = fed(
            InvState::SubSet(SubSet::new()),
            &[&[Value::int_seq(vec![1]), Value::int_seq(vec![1, 2])]],
        );
        let mut facts = Facts::default().with(&[2, 1], b_in_a.clone());
        facts.sources.insert(x, b);
        assert!(find_suppression(&facts, &member, &[x, a]).is_some());

        // Containment in the wrong direction proves nothing.
        let mut wrong = Facts::default().with(&[1, 2], b_in_a);
        wrong.sources.insert(x, b);
        assert!(find_suppression(&wrong, &member, &[x, a]).is_none());

        // Unknown provenance: no suppression.
        let unknown = Facts::default();
        assert!(find_suppression(&unknown, &member, &[x, a]).is_none());
    }

    #[test]
    fn test_negative_upper_bound_suppresses_nonzero() {
        let facts = Facts::default().with(&[0], upper(-1));
        assert_eq!(rule_for(&facts, &nonzero(), &[0]), Some(Rule::BoundExcludesZero));
        for max in [0, 4] {
            let facts = Facts::default().with(&[0], upper(max));
            assert_eq!(rule_for(&facts, &nonzero(), &[0]), None);
        }
    }

    #[test]
    fn test_one_of_within_upper_bound() {
        let one_of = fed(InvState::OneOf(OneOf::new(3)), &[&ints(&[2]), &ints(&[5])]);
        let facts = Facts::default().with(&[0], one_of);
        assert_eq!(rule_for(&facts, &upper(5), &[0]), Some(Rule::OneOfWithinBound));
        // x <= 4 is not implied by x in {2, 5}.
        assert_eq!(rule_for(&facts, &upper(4), &[0]), None);
    }

    #[test]
    fn test_element_bounds_bound_the_drawn_scalar() {
        let a_at_least_2 = elt(InvState::EltLowerBound(Bound::new(50)), &[2, 6, 9]);
        let facts = drawn(Facts::default().with(&[1], a_at_least_2));
        assert_eq!(rule_for(&facts, &lower(1), &[0]), Some(Rule::EltBoundImpliesBound));
        assert_eq!(rule_for(&facts, &lower(2), &[0]), Some(Rule::EltBoundImpliesBound));
        assert_eq!(rule_for(&facts, &lower(3), &[0]), None);

        let a_at_most_9 = elt(InvState::EltUpperBound(Bound::new(50)), &[2, 6, 9]);
        let facts = drawn(Facts::default().with(&[1], a_at_most_9));
        assert_eq!(rule_for(&facts, &upper(10), &[0]), Some(Rule::EltBoundImpliesBound));
        assert_eq!(rule_for(&facts, &upper(8), &[0]), None);

        // Without provenance the element bound says nothing about x.
        let a_at_least_2 = elt(InvState::EltLowerBound(Bound::new(50)), &[2, 6, 9]);
        let facts = Facts::default().with(&[1], a_at_least_2);
        assert_eq!(rule_for(&facts, &lower(1), &[0]), None);
    }

    #[test]
    fn test_nonzero_elements_suppress_drawn_scalar() {
        let a_nonzero = elt(InvState::EltNonZero(NonZero::new(false, 50)), &[-3, 4]);
        let facts = drawn(Facts::default().with(&[1], a_nonzero.clone()));
        assert_eq!(rule_for(&facts, &nonzero(), &[0]), Some(Rule::ElementsExcludeZero));

        let not_null = Invariant::new(InvState::NonZero(NonZero::new(true, 50)));
        assert_eq!(rule_for(&facts, &not_null, &[0]), None);

        let unrelated = Facts::default().with(&[1], a_nonzero);
        assert_eq!(rule_for(&unrelated, &nonzero(), &[0]), None);
    }

    #[test]
    fn test_element_bound_away_from_zero_suppresses_elements_nonzero() {
        let target = Invariant::new(InvState::EltNonZero(NonZero::new(false, 50)));
        let positive = elt(InvState::EltLowerBound(Bound::new(50)), &[1, 5]);
        let facts = Facts::default().with(&[0], positive);
        assert_eq!(rule_for(&facts, &target, &[0]), Some(Rule::EltBoundExcludesZero));

        let negative = elt(InvState::EltUpperBound(Bound::new(50)), &[-7, -1]);
        let facts = Facts::default().with(&[0], negative);
        assert_eq!(rule_for(&facts, &target, &[0]), Some(Rule::EltBoundExcludesZero));

        for (lo, hi) in [(0, 3), (-4, 0)] {
            let facts = Facts::default()
                .with(&[0], elt(InvState::EltLowerBound(Bound::new(50)), &[lo, hi]))
                .with(&[0], elt(InvState::EltUpperBound(Bound::new(50)), &[lo, hi]));
            assert_eq!(rule_for(&facts, &target, &[0]), None, "elements {lo}..={hi}");
        }
    }

    #[test]
    fn test_equal_source_suppresses_member() {
        // x = b[0]; slice (x, a) holds "x in a" with the scalar first.
        let member = Invariant::new(InvState::Member(Member::new(false)));
        let equal = fed(
            InvState::Comparison(Comparison::new(true)),
            &[&seqs(&[1, 2], &[1, 2]), &seqs(&[4], &[4])],
        );
        let mut facts = Facts::default().with(&[1, 2], equal);
        facts.sources.insert(VarId(0), VarId(2));
        assert_eq!(rule_for(&facts, &member, &[0, 1]), Some(Rule::SeqEqualImpliesMember));

        let shorter = fed(
            InvState::Comparison(Comparison::new(false)),
            &[&seqs(&[1, 2], &[1, 2, 3])],
        );
        let mut facts = Facts::default().with(&[1, 2], shorter);
        facts.sources.insert(VarId(0), VarId(2));
        assert_eq!(rule_for(&facts, &member, &[0, 1]), None);
    }

    #[test]
    fn test_subsequence_suppresses_subset() {
        let subset = fed(InvState::SubSet(SubSet::new()), &[&seqs(&[2, 3], &[1, 2, 3])]);
        let run = fed(InvState::SubSequence(SubSequence::new()), &[&seqs(&[2, 3], &[1, 2, 3])]);
        let facts = Facts::default().with(&[0, 1], run);
        assert_eq!(rule_for(&facts, &subset, &[0, 1]), Some(Rule::SubsequenceImpliesSubset));

        // Stored the other way round, the run is flipped back before checking.
        let stored_reversed =
            fed(InvState::SubSequence(SubSequence::new()), &[&seqs(&[1, 2, 3], &[2, 3])]);
        let facts = Facts::default().with(&[1, 0], stored_reversed);
        assert_eq!(rule_for(&facts, &subset, &[0, 1]), Some(Rule::SubsequenceImpliesSubset));

        // b is a run of a, which says nothing about a inside b.
        let backwards = fed(InvState::SubSequence(SubSequence::new()), &[&seqs(&[1, 2, 3], &[2, 3])]);
        let facts = Facts::default().with(&[0, 1], backwards);
        assert_eq!(rule_for(&facts, &subset, &[0, 1]), None);
    }
}
