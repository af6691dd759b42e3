//! Small structural sets used for table, CTE and aggregate accounting

use serde::Serialize;

/// An unordered collection of distinct identities.
///
/// Equality ignores order. Iteration follows insertion order so diagnostics
/// list elements deterministically.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TypeSet<T> {
    items: Vec<T>,
}

impl<T> Default for TypeSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq + Clone> TypeSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element, returns false if it was already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.contains(&item) {
            false
        } else {
            self.items.push(item);
            true
        }
    }

    /// Consuming variant of [`TypeSet::insert`]
    pub fn with(mut self, item: T) -> Self {
        self.insert(item);
        self
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        joined.extend(other.iter().cloned());
        joined
    }

    /// Elements of `self` that are not in `other`
    pub fn difference(&self, other: &Self) -> Self {
        self.iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect()
    }

    pub fn intersect(&self, other: &Self) -> Self {
        self.iter()
            .filter(|item| other.contains(item))
            .cloned()
            .collect()
    }

    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.iter().all(|item| other.contains(item))
    }

    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.is_subset_of(self)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        !self.iter().any(|item| other.contains(item))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq> PartialEq for TypeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|item| other.items.contains(item))
    }
}

impl<T: Eq> Eq for TypeSet<T> {}

impl<T: PartialEq + Clone> FromIterator<T> for TypeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TypeSet::new();
        set.extend(iter);
        set
    }
}

impl<T: PartialEq + Clone> Extend<T> for TypeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T> IntoIterator for TypeSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a TypeSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

pub fn are_disjoint<T: PartialEq + Clone>(lhs: &TypeSet<T>, rhs: &TypeSet<T>) -> bool {
    lhs.is_disjoint(rhs)
}

/// Whether any element of the list occurs more than once
pub fn has_duplicates<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(index, item)| items[index + 1..].contains(item))
}

/// Table identities are compared by name
pub type TableSet = TypeSet<String>;
