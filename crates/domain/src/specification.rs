//! Composable business-rule predicates.

use std::marker::PhantomData;

/// A business rule evaluated against a candidate.
pub trait Specification<T: ?Sized> {
    /// Returns true if the candidate satisfies the rule.
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    /// Human-readable description, for logs and diagnostics.
    fn describe(&self) -> String;
}

impl<T: ?Sized, S: Specification<T> + ?Sized> Specification<T> for Box<S> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: ?Sized, S: Specification<T> + ?Sized> Specification<T> for &S {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (**self).is_satisfied_by(candidate)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Satisfied when both sides are. Described as `(A AND B)`.
#[derive(Debug, Clone)]
pub struct AndSpecification<L, R> {
    left: L,
    right: R,
}

impl<T: ?Sized, L: Specification<T>, R: Specification<T>> Specification<T>
    for AndSpecification<L, R>
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }

    fn describe(&self) -> String {
        format!("({} AND {})", self.left.describe(), self.right.describe())
    }
}

/// Satisfied when either side is. Described as `(A OR B)`.
#[derive(Debug, Clone)]
pub struct OrSpecification<L, R> {
    left: L,
    right: R,
}

impl<T: ?Sized, L: Specification<T>, R: Specification<T>> Specification<T>
    for OrSpecification<L, R>
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }

    fn describe(&self) -> String {
        format!("({} OR {})", self.left.describe(), self.right.describe())
    }
}

/// Negates a specification. Described as `NOT A`.
#[derive(Debug, Clone)]
pub struct NotSpecification<S> {
    inner: S,
}

impl<T: ?Sized, S: Specification<T>> Specification<T> for NotSpecification<S> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }

    fn describe(&self) -> String {
        format!("NOT {}", self.inner.describe())
    }
}

pub fn and<L, R>(left: L, right: R) -> AndSpecification<L, R> {
    AndSpecification { left, right }
}

pub fn or<L, R>(left: L, right: R) -> OrSpecification<L, R> {
    OrSpecification { left, right }
}

pub fn not<S>(inner: S) -> NotSpecification<S> {
    NotSpecification { inner }
}

/// Fluent combinators for any specification.
pub trait SpecificationExt<T: ?Sized>: Specification<T> + Sized {
    fn and<S: Specification<T>>(self, other: S) -> AndSpecification<Self, S> {
        and(self, other)
    }

    fn or<S: Specification<T>>(self, other: S) -> OrSpecification<Self, S> {
        or(self, other)
    }

    fn not(self) -> NotSpecification<Self> {
        not(self)
    }
}

impl<T: ?Sized, S: Specification<T>> SpecificationExt<T> for S {}

/// Specification backed by a closure.
pub struct PredicateSpecification<T: ?Sized, F> {
    description: String,
    predicate: F,
    _candidate: PhantomData<fn(&T)>,
}

impl<T: ?Sized, F: Fn(&T) -> bool> PredicateSpecification<T, F> {
    pub fn new(description: impl Into<String>, predicate: F) -> Self {
        Self {
            description: description.into(),
            predicate,
            _candidate: PhantomData,
        }
    }
}

impl<T: ?Sized, F: Fn(&T) -> bool> Specification<T> for PredicateSpecification<T, F> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

impl<T: ?Sized, F> std::fmt::Debug for PredicateSpecification<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateSpecification")
            .field("description", &self.description)
            .finish()
    }
}
