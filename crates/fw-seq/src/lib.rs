#![forbid(unsafe_code)]

//! Restartable lazy sequences.
//!
//! A `LazySeq<T>` is a producer of values, not a container: every call to
//! [`LazySeq::iter`] starts a fresh, independent traversal from the beginning,
//! even for conceptually infinite sequences. Chained combinators are lazy
//! (no upstream element is consumed until the corresponding downstream
//! element is requested) and restartability means recomputation, not caching: user
//! callbacks fire again from the start on every re-traversal.

use std::sync::Arc;

type Producer<T> = Arc<dyn Fn() -> Box<dyn Iterator<Item = T>>>;

pub struct LazySeq<T> {
    make: Producer<T>,
}

impl<T> Clone for LazySeq<T> {
    fn clone(&self) -> Self {
        Self {
            make: Arc::clone(&self.make),
        }
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for LazySeq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Bounded preview so Debug never hangs on infinite producers.
        let preview: Vec<T> = self.iter().take(8).collect();
        f.debug_struct("LazySeq").field("head", &preview).finish()
    }
}

impl<T: 'static> LazySeq<T> {
    /// Wrap a producer function. The function is called once per traversal
    /// and must yield the whole sequence from the start each time.
    pub fn from_fn(make: impl Fn() -> Box<dyn Iterator<Item = T>> + 'static) -> Self {
        Self {
            make: Arc::new(make),
        }
    }

    /// A sequence over owned values. Storage is shared between traversals
    /// and clones; elements are cloned out on demand.
    pub fn from_values(values: Vec<T>) -> Self
    where
        T: Clone,
    {
        let shared = Arc::new(values);
        Self::from_fn(move || {
            let shared = Arc::clone(&shared);
            Box::new((0..shared.len()).map(move |i| shared[i].clone()))
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_fn(|| Box::new(std::iter::empty()))
    }

    /// Begin a fresh traversal.
    pub fn iter(&self) -> Box<dyn Iterator<Item = T>> {
        (self.make)()
    }

    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> LazySeq<U> {
        let make = Arc::clone(&self.make);
        let f = Arc::new(f);
        LazySeq::from_fn(move || {
            let f = Arc::clone(&f);
            Box::new(make().map(move |item| f(item)))
        })
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let make = Arc::clone(&self.make);
        let predicate = Arc::new(predicate);
        Self::from_fn(move || {
            let predicate = Arc::clone(&predicate);
            Box::new(make().filter(move |item| predicate(item)))
        })
    }

    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        let make = Arc::clone(&self.make);
        Self::from_fn(move || Box::new(make().take(n)))
    }

    #[must_use]
    pub fn skip(&self, n: usize) -> Self {
        let make = Arc::clone(&self.make);
        Self::from_fn(move || Box::new(make().skip(n)))
    }

    /// Chain `other` after `self`. Lazy on both sides.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let left = Arc::clone(&self.make);
        let right = Arc::clone(&other.make);
        Self::from_fn(move || Box::new(left().chain(right())))
    }

    /// Pair elements positionally. The result ends with the shorter input,
    /// which bounds traversal even when one side is infinite.
    pub fn zip<U: 'static>(&self, other: &LazySeq<U>) -> LazySeq<(T, U)> {
        let left = Arc::clone(&self.make);
        let right = Arc::clone(&other.make);
        LazySeq::from_fn(move || Box::new(left().zip(right())))
    }

    /// Terminal: materialize the whole sequence. Diverges on infinite input.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Terminal: element count. Diverges on infinite input.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Terminal: left fold in traversal order.
    pub fn fold<A>(&self, init: A, f: impl Fn(A, T) -> A) -> A {
        self.iter().fold(init, f)
    }
}

impl LazySeq<usize> {
    /// The infinite sequence 0, 1, 2, and so on. Callers must bound it with `take`
    /// or consume it through `zip` against a finite sequence.
    #[must_use]
    pub fn counter() -> Self {
        Self::from_fn(|| Box::new(0..))
    }

    #[must_use]
    pub fn range(start: usize, len: usize) -> Self {
        Self::from_fn(move || Box::new(start..start + len))
    }
}
