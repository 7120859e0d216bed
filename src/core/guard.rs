//! Guard predicates for controlling transition selection.
//!
//! Guards are pure boolean functions over the current state. A guard
//! expression composes inline predicates with named guard slots whose
//! implementations are bound later (see [`crate::slots`]).

use std::fmt;
use std::sync::Arc;

/// Pure predicate over a state.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Guard;
///
/// let is_high = Guard::new(|value: &u32| *value >= 70);
///
/// assert!(is_high.check(&75));
/// assert!(!is_high.check(&10));
/// ```
pub struct Guard<S> {
    predicate: Arc<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S> Guard<S> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard passes for this state.
    pub fn check(&self, state: &S) -> bool {
        (self.predicate)(state)
    }
}

impl<S> Clone for Guard<S> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S> fmt::Debug for Guard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(<fn>)")
    }
}

/// Guard expression attached to a transition or always-transition.
///
/// `And` and `Or` evaluate left to right and short-circuit, so the right
/// operand is never evaluated when the left one decides the result.
///
/// # Example
///
/// ```rust
/// use statecraft::core::GuardExpr;
///
/// let expr: GuardExpr<u32> = GuardExpr::slot("isHigh")
///     .or(GuardExpr::slot("isMedium"))
///     .and(GuardExpr::predicate(|v: &u32| *v < 100));
///
/// assert_eq!(expr.slot_names(), vec!["isHigh", "isMedium"]);
/// ```
pub enum GuardExpr<S> {
    /// Inline predicate over the state.
    Predicate(Guard<S>),
    /// Named guard slot, resolved against the bindings table.
    Slot(String),
    And(Box<GuardExpr<S>>, Box<GuardExpr<S>>),
    Or(Box<GuardExpr<S>>, Box<GuardExpr<S>>),
    Not(Box<GuardExpr<S>>),
}

impl<S> GuardExpr<S> {
    /// Reference a named guard slot.
    pub fn slot(name: impl Into<String>) -> Self {
        GuardExpr::Slot(name.into())
    }

    /// Wrap an inline predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        GuardExpr::Predicate(Guard::new(predicate))
    }

    /// Fallback guard that always passes.
    pub fn otherwise() -> Self {
        GuardExpr::predicate(|_| true)
    }

    pub fn and(self, other: GuardExpr<S>) -> Self {
        GuardExpr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: GuardExpr<S>) -> Self {
        GuardExpr::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        GuardExpr::Not(Box::new(self))
    }

    /// Names of every guard slot referenced by this expression, in
    /// left-to-right order.
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_slots(&mut names);
        names
    }

    fn collect_slots<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            GuardExpr::Predicate(_) => {}
            GuardExpr::Slot(name) => names.push(name.as_str()),
            GuardExpr::And(left, right) | GuardExpr::Or(left, right) => {
                left.collect_slots(names);
                right.collect_slots(names);
            }
            GuardExpr::Not(inner) => inner.collect_slots(names),
        }
    }

    /// Evaluate the expression with a synchronous slot lookup.
    ///
    /// Used where guard slots are known to be immediate; the actor runtime
    /// goes through [`crate::slots::Bindings::check`] instead.
    pub fn evaluate<F>(&self, state: &S, lookup: &mut F) -> bool
    where
        F: FnMut(&str, &S) -> bool,
    {
        match self {
            GuardExpr::Predicate(guard) => guard.check(state),
            GuardExpr::Slot(name) => lookup(name, state),
            GuardExpr::And(left, right) => {
                left.evaluate(state, lookup) && right.evaluate(state, lookup)
            }
            GuardExpr::Or(left, right) => {
                left.evaluate(state, lookup) || right.evaluate(state, lookup)
            }
            GuardExpr::Not(inner) => !inner.evaluate(state, lookup),
        }
    }
}

impl<S> Clone for GuardExpr<S> {
    fn clone(&self) -> Self {
        match self {
            GuardExpr::Predicate(guard) => GuardExpr::Predicate(guard.clone()),
            GuardExpr::Slot(name) => GuardExpr::Slot(name.clone()),
            GuardExpr::And(left, right) => GuardExpr::And(left.clone(), right.clone()),
            GuardExpr::Or(left, right) => GuardExpr::Or(left.clone(), right.clone()),
            GuardExpr::Not(inner) => GuardExpr::Not(inner.clone()),
        }
    }
}

impl<S> fmt::Debug for GuardExpr<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardExpr::Predicate(_) => f.write_str("<predicate>"),
            GuardExpr::Slot(name) => write!(f, "{name}"),
            GuardExpr::And(left, right) => write!(f, "and({left:?}, {right:?})"),
            GuardExpr::Or(left, right) => write!(f, "or({left:?}, {right:?})"),
            GuardExpr::Not(inner) => write!(f, "not({inner:?})"),
        }
    }
}

impl<S> From<Guard<S>> for GuardExpr<S> {
    fn from(guard: Guard<S>) -> Self {
        GuardExpr::Predicate(guard)
    }
}
