//! Two-variable kinds.

use finv_error::{InferError, Result};
use finv_types::Value;

use crate::UpdateOutcome;
use crate::relation::{OrderFlags, Relation};
use crate::tracker::ValueTracker;

/// Tracker reordering for a swapped pair.
const SWAPPED: [usize; 2] = [1, 0];

fn shape_error(kind: &str, a: &Value, b: &Value) -> InferError {
    InferError::internal(format!("{kind} cannot relate {a} and {b}"))
}

/// `x R y` for scalars or whole sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    flags: OrderFlags,
    tracker: ValueTracker,
}

impl Comparison {
    /// `only_eq` for operands without a meaningful order.
    #[must_use]
    pub fn new(only_eq: bool) -> Self {
        Self {
            flags: OrderFlags::new(only_eq),
            tracker: ValueTracker::new(),
        }
    }

    pub fn update(&mut self, x: &Value, y: &Value) -> Result<UpdateOutcome> {
        let ord = x
            .compare(y)
            .ok_or_else(|| shape_error("Comparison", x, y))?;
        self.tracker.add(&[x, y]);
        Ok(self.flags.observe(ord))
    }

    #[must_use]
    pub const fn relation(&self) -> Option<Relation> {
        self.flags.relation()
    }

    #[must_use]
    pub const fn only_eq(&self) -> bool {
        self.flags.only_eq()
    }

    pub fn swap_operands(&mut self) {
        self.flags.flip();
        self.tracker.permute(&SWAPPED);
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.tracker.coin_flip_confidence()
    }
}

/// `a * x + b * y + c == 0` with integers `a > 0`, `b != 0` and
/// `gcd(a, b, c) == 1`.
///
/// The form is symmetric in its operands: swapping them swaps `a` and `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearBinary {
    first: Option<(i64, i64)>,
    line: Option<[i64; 3]>,
    tracker: ValueTracker,
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Divide out the common factor and make `a` positive.
fn normalize([a, b, c]: [i128; 3]) -> Option<[i64; 3]> {
    let common = gcd(gcd(a.unsigned_abs(), b.unsigned_abs()), c.unsigned_abs());
    let divisor = i128::try_from(common).ok().filter(|d| *d != 0)?;
    let sign = if a < 0 { -1 } else { 1 };
    let scale = |coef: i128| i64::try_from(coef / divisor * sign).ok();
    Some([scale(a)?, scale(b)?, scale(c)?])
}

fn line_through((x0, y0): (i64, i64), (x1, y1): (i64, i64)) -> Option<[i64; 3]> {
    let a = i128::from(y1) - i128::from(y0);
    let b = i128::from(x0) - i128::from(x1);
    let c = a
        .checked_mul(i128::from(x0))?
        .checked_add(b.checked_mul(i128::from(y0))?)?
        .checked_neg()?;
    normalize([a, b, c])
}

fn on_line([a, b, c]: [i64; 3], (px, py): (i64, i64)) -> bool {
    let ax = i128::from(a) * i128::from(px);
    let by = i128::from(b) * i128::from(py);
    ax.checked_add(by)
        .and_then(|sum| sum.checked_add(i128::from(c)))
        .is_some_and(|sum| sum == 0)
}

/// `v == m * w + k` from `p * w + q * v + r == 0`, when `q` divides both.
fn solve(p: i64, q: i64, r: i64) -> Option<(i64, i64)> {
    if p.checked_rem(q)? != 0 || r.checked_rem(q)? != 0 {
        return None;
    }
    Some((p.checked_div(q)?.checked_neg()?, r.checked_div(q)?.checked_neg()?))
}

impl LinearBinary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, x: &Value, y: &Value) -> Result<UpdateOutcome> {
        let (Some(xv), Some(yv)) = (x.as_int(), y.as_int()) else {
            return Err(shape_error("LinearBinary", x, y));
        };
        self.tracker.add(&[x, y]);
        let holds = match (self.line, self.first) {
            (Some(line), _) => on_line(line, (xv, yv)),
            (None, None) => {
                self.first = Some((xv, yv));
                true
            }
            (None, Some(first)) if first == (xv, yv) => true,
            // Both operands must move together.
            (None, Some((x0, y0))) if x0 == xv || y0 == yv => false,
            (None, Some(first)) => {
                self.line = line_through(first, (xv, yv));
                self.line.is_some()
            }
        };
        Ok(if holds {
            UpdateOutcome::Continue
        } else {
            UpdateOutcome::Falsified
        })
    }

    /// `[a, b, c]` once two distinct points fixed the line.
    #[must_use]
    pub const fn line(&self) -> Option<[i64; 3]> {
        self.line
    }

    /// `(m, k)` with `y == m * x + k`, when both are integers.
    #[must_use]
    pub fn y_of_x(&self) -> Option<(i64, i64)> {
        let [a, b, c] = self.line?;
        solve(a, b, c)
    }

    /// `(m, k)` with `x == m * y + k`, when both are integers.
    #[must_use]
    pub fn x_of_y(&self) -> Option<(i64, i64)> {
        let [a, b, c] = self.line?;
        solve(b, a, c)
    }

    pub fn swap_operands(&mut self) {
        self.first = self.first.map(|(x, y)| (y, x));
        self.line = self
            .line
            .and_then(|[a, b, c]| normalize([i128::from(b), i128::from(a), i128::from(c)]));
        self.tracker.permute(&SWAPPED);
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.line.is_none() {
            return 0.0;
        }
        self.tracker.coin_flip_confidence()
    }
}

/// The scalar occurs in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    seq_first: bool,
}

impl Member {
    #[must_use]
    pub const fn new(seq_first: bool) -> Self {
        Self { seq_first }
    }

    /// Slice position of the sequence operand.
    #[must_use]
    pub const fn seq_first(&self) -> bool {
        self.seq_first
    }

    pub const fn swap_operands(&mut self) {
        self.seq_first = !self.seq_first;
    }

    pub fn update(&mut self, seq: &Value, scalar: &Value) -> Result<UpdateOutcome> {
        if !seq.is_sequence() {
            return Err(shape_error("Member", seq, scalar));
        }
        Ok(if seq.elements().any(|e| e == *scalar) {
            UpdateOutcome::Continue
        } else {
            UpdateOutcome::Falsified
        })
    }
}

/// Every element of the sequence relates to the scalar: `a[] R x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqScalarComparison {
    seq_first: bool,
    flags: OrderFlags,
    tracker: ValueTracker,
}

impl SeqScalarComparison {
    #[must_use]
    pub fn new(seq_first: bool) -> Self {
        Self {
            seq_first,
            flags: OrderFlags::new(false),
            tracker: ValueTracker::new(),
        }
    }

    #[must_use]
    pub const fn seq_first(&self) -> bool {
        self.seq_first
    }

    /// The relation and tracker are kept sequence first, so only the
    /// position changes.
    pub const fn swap_operands(&mut self) {
        self.seq_first = !self.seq_first;
    }

    pub fn update(&mut self, seq: &Value, scalar: &Value) -> Result<UpdateOutcome> {
        if !seq.is_sequence() {
            return Err(shape_error("SeqScalarComparison", seq, scalar));
        }
        self.tracker.add(&[seq, scalar]);
        for elt in seq.elements() {
            let ord = elt
                .compare(scalar)
                .ok_or_else(|| shape_error("SeqScalarComparison", &elt, scalar))?;
            if self.flags.observe(ord) == UpdateOutcome::Falsified {
                return Ok(UpdateOutcome::Falsified);
            }
        }
        Ok(UpdateOutcome::Continue)
    }

    /// Relation of each element to the scalar.
    #[must_use]
    pub const fn relation(&self) -> Option<Relation> {
        self.flags.relation()
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.relation().is_none() {
            return 0.0;
        }
        self.tracker.coin_flip_confidence()
    }
}

fn is_contiguous_subsequence(needle: &[Value], hay: &[Value]) -> bool {
    needle.is_empty() || hay.windows(needle.len()).any(|w| w == needle)
}

fn is_subset(small: &[Value], big: &[Value]) -> bool {
    small.iter().all(|e| big.contains(e))
}

/// Containment in either direction; falsified when neither direction holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Containment {
    first_in_second: bool,
    second_in_first: bool,
}

impl Default for Containment {
    fn default() -> Self {
        Self {
            first_in_second: true,
            second_in_first: true,
        }
    }
}

impl Containment {
    fn observe(&mut self, forward: bool, backward: bool) -> UpdateOutcome {
        self.first_in_second &= forward;
        self.second_in_first &= backward;
        if self.first_in_second || self.second_in_first {
            UpdateOutcome::Continue
        } else {
            UpdateOutcome::Falsified
        }
    }

    const fn swapped(self) -> Self {
        Self {
            first_in_second: self.second_in_first,
            second_in_first: self.first_in_second,
        }
    }

    /// Slice operand 0 is contained in operand 1.
    #[must_use]
    pub const fn first_in_second(&self) -> bool {
        self.first_in_second
    }

    /// Slice operand 1 is contained in operand 0.
    #[must_use]
    pub const fn second_in_first(&self) -> bool {
        self.second_in_first
    }
}

/// One sequence is a contiguous run of the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubSequence {
    containment: Containment,
}

impl SubSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: &Value, b: &Value) -> UpdateOutcome {
        let a: Vec<Value> = a.elements().collect();
        let b: Vec<Value> = b.elements().collect();
        self.containment.observe(
            is_contiguous_subsequence(&a, &b),
            is_contiguous_subsequence(&b, &a),
        )
    }

    #[must_use]
    pub const fn containment(&self) -> Containment {
        self.containment
    }

    pub const fn swap_operands(&mut self) {
        self.containment = self.containment.swapped();
    }
}

/// Every element of one sequence occurs in the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubSet {
    containment: Containment,
}

impl SubSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: &Value, b: &Value) -> UpdateOutcome {
        let a: Vec<Value> = a.elements().collect();
        let b: Vec<Value> = b.elements().collect();
        self.containment.observe(is_subset(&a, &b), is_subset(&b, &a))
    }

    #[must_use]
    pub const fn containment(&self) -> Containment {
        self.containment
    }

    pub const fn swap_operands(&mut self) {
        self.containment = self.containment.swapped();
    }
}

/// Same-length sequences related element by element: `a[i] R b[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairwiseComparison {
    flags: OrderFlags,
    tracker: ValueTracker,
}

impl PairwiseComparison {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: &Value, b: &Value) -> Result<UpdateOutcome> {
        if a.seq_len() != b.seq_len() {
            return Ok(UpdateOutcome::Falsified);
        }
        self.tracker.add(&[a, b]);
        for (x, y) in a.elements().zip(b.elements()) {
            let ord = x
                .compare(&y)
                .ok_or_else(|| shape_error("PairwiseComparison", &x, &y))?;
            if self.flags.observe(ord) == UpdateOutcome::Falsified {
                return Ok(UpdateOutcome::Falsified);
            }
        }
        Ok(UpdateOutcome::Continue)
    }

    #[must_use]
    pub const fn relation(&self) -> Option<Relation> {
        self.flags.relation()
    }

    pub fn swap_operands(&mut self) {
        self.flags.flip();
        self.tracker.permute(&SWAPPED);
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.relation().is_none() {
            return 0.0;
        }
        self.tracker.coin_flip_confidence()
    }
}

/// One sequence is the other reversed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reverse {
    tracker: ValueTracker,
}

impl Reverse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, a: &Value, b: &Value) -> UpdateOutcome {
        if a.seq_len() != b.seq_len() {
            return UpdateOutcome::Falsified;
        }
        if a.seq_len().is_some_and(|n| n >= 2) {
            self.tracker.add(&[a, b]);
        }
        let a: Vec<Value> = a.elements().collect();
        let b: Vec<Value> = b.elements().collect();
        if a.iter().eq(b.iter().rev()) {
            UpdateOutcome::Continue
        } else {
            UpdateOutcome::Falsified
        }
    }

    pub fn swap_operands(&mut self) {
        self.tracker.permute(&SWAPPED);
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.tracker.coin_flip_confidence()
    }
}
