//! Tagged variants shared by states and events.
//!
//! A machine never compares whole values to decide what applies; it
//! dispatches on the discriminant of a closed enum. The `Tagged` trait
//! exposes that discriminant as a small `Copy` value that can key tables.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for closed, tagged variants (machine states and events).
///
/// # Required Traits
///
/// - `Clone`: values are snapshotted for subscribers and traces
/// - `Debug`: values appear in logs and diagnostics
/// - `Send + Sync + 'static`: values cross into actor tasks
///
/// # Example
///
/// ```rust
/// use statecraft::core::Tagged;
///
/// #[derive(Clone, Debug)]
/// enum Door {
///     Open,
///     Closed { locked: bool },
/// }
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum DoorTag {
///     Open,
///     Closed,
/// }
///
/// impl Tagged for Door {
///     type Tag = DoorTag;
///
///     fn tag(&self) -> DoorTag {
///         match self {
///             Self::Open => DoorTag::Open,
///             Self::Closed { .. } => DoorTag::Closed,
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed { .. } => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Closed { locked: true }.tag(), DoorTag::Closed);
/// ```
pub trait Tagged: Clone + Debug + Send + Sync + 'static {
    /// Discriminant type, one value per variant.
    type Tag: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Get the discriminant of this value.
    fn tag(&self) -> Self::Tag;

    /// Get the variant's name for display/logging.
    fn name(&self) -> &'static str;

    /// Check whether this value carries the given tag.
    fn is(&self, tag: Self::Tag) -> bool {
        self.tag() == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    enum TestState {
        Initial,
        Processing { progress: u8 },
        Complete,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestTag {
        Initial,
        Processing,
        Complete,
    }

    impl Tagged for TestState {
        type Tag = TestTag;

        fn tag(&self) -> TestTag {
            match self {
                Self::Initial => TestTag::Initial,
                Self::Processing { .. } => TestTag::Processing,
                Self::Complete => TestTag::Complete,
            }
        }

        fn name(&self) -> &'static str {
            match self {
                Self::Initial => "Initial",
                Self::Processing { .. } => "Processing",
                Self::Complete => "Complete",
            }
        }
    }

    #[test]
    fn tag_ignores_payload() {
        let a = TestState::Processing { progress: 10 };
        let b = TestState::Processing { progress: 90 };

        assert_ne!(a, b);
        assert_eq!(a.tag(), b.tag());
    }

    #[test]
    fn name_matches_variant() {
        assert_eq!(TestState::Initial.name(), "Initial");
        assert_eq!(TestState::Processing { progress: 1 }.name(), "Processing");
        assert_eq!(TestState::Complete.name(), "Complete");
    }

    #[test]
    fn is_compares_tags() {
        let state = TestState::Processing { progress: 3 };
        assert!(state.is(TestTag::Processing));
        assert!(!state.is(TestTag::Complete));
    }
}
