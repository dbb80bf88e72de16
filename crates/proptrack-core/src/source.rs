//! Property sources.
//!
//! Every pollable value implements the [`PropertySource`] trait. Two bindings
//! ship with the crate:
//!
//! - [`BoundProperty`] wraps a closure resolved ahead of time. This is the
//!   preferred binding: it is typed and cannot go stale.
//! - [`LiveProperty`] looks a member up on a live object every time it is
//!   sampled, so it observes mutation of the target. The target is held
//!   weakly; once it is dropped the source reports
//!   [`CaptureError::TargetDropped`] and the channel prunes it.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::error::CaptureError;

/// How a source obtains its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// Accessor closure supplied in code.
    CodeBinding,
    /// Member lookup on a live object, re-resolved at every sample.
    LiveLookup { member: String },
}

impl std::fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeBinding => write!(f, "code"),
            Self::LiveLookup { member } => write!(f, "live:{member}"),
        }
    }
}

/// Trait that every property source must implement.
pub trait PropertySource: Send {
    /// Name the values are recorded under. Unique within a channel.
    fn name(&self) -> &str;

    fn origin(&self) -> SourceOrigin;

    /// Produce the current value as text.
    fn sample(&self) -> Result<String, CaptureError>;
}

// ---------------------------------------------------------------------------
// Code-bound accessor
// ---------------------------------------------------------------------------

type Accessor = Box<dyn Fn() -> String + Send>;

/// A source backed by an accessor closure.
pub struct BoundProperty {
    name: String,
    accessor: Accessor,
}

impl BoundProperty {
    /// Bind `accessor`; its result is stringified with [`ToString`] at each sample.
    pub fn new<F, T>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn() -> T + Send + 'static,
        T: ToString,
    {
        Self {
            name: name.into(),
            accessor: Box::new(move || accessor().to_string()),
        }
    }
}

impl std::fmt::Debug for BoundProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundProperty")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PropertySource for BoundProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> SourceOrigin {
        SourceOrigin::CodeBinding
    }

    fn sample(&self) -> Result<String, CaptureError> {
        catch_unwind(AssertUnwindSafe(|| (self.accessor)())).map_err(|_| CaptureError::Panicked {
            name: self.name.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Live lookup
// ---------------------------------------------------------------------------

/// A live object whose members can be read by name.
pub trait MemberLookup: Send + Sync {
    /// Current value of `member`, or `None` if the object has no such member.
    fn lookup(&self, member: &str) -> Option<String>;
}

impl<F> MemberLookup for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, member: &str) -> Option<String> {
        self(member)
    }
}

/// A source that resolves `member` on a weakly held target at every sample.
pub struct LiveProperty {
    name: String,
    member: String,
    target: Weak<dyn MemberLookup>,
}

impl LiveProperty {
    pub fn new<T>(name: impl Into<String>, target: &Arc<T>, member: impl Into<String>) -> Self
    where
        T: MemberLookup + 'static,
    {
        let weak: Weak<T> = Arc::downgrade(target);
        Self {
            name: name.into(),
            member: member.into(),
            target: weak,
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }
}

impl std::fmt::Debug for LiveProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveProperty")
            .field("name", &self.name)
            .field("member", &self.member)
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

impl PropertySource for LiveProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> SourceOrigin {
        SourceOrigin::LiveLookup {
            member: self.member.clone(),
        }
    }

    fn sample(&self) -> Result<String, CaptureError> {
        let target = self.target.upgrade().ok_or_else(|| CaptureError::TargetDropped {
            name: self.name.clone(),
        })?;
        let resolved = catch_unwind(AssertUnwindSafe(|| target.lookup(&self.member)))
            .map_err(|_| CaptureError::Panicked {
                name: self.name.clone(),
            })?;
        resolved.ok_or_else(|| CaptureError::MemberMissing {
            name: self.name.clone(),
            member: self.member.clone(),
        })
    }
}

/// A simple live object: a named set of string members that can be updated
/// and removed while sources are bound to it.
#[derive(Debug, Default)]
pub struct LiveObject {
    members: RwLock<BTreeMap<String, String>>,
}

impl LiveObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, member: impl Into<String>, value: impl ToString) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(member.into(), value.to_string());
    }

    pub fn remove(&self, member: &str) -> Option<String> {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(member)
    }
}

impl MemberLookup for LiveObject {
    fn lookup(&self, member: &str) -> Option<String> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .cloned()
    }
}
