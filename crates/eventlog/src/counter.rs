//! Name frequency tables in first-seen order.

use std::collections::HashMap;

use crate::types::{Count, CountResult};

/// Indexed access to the names being counted.
pub trait NameSupplier {
    fn len(&self) -> usize;

    /// Name at `index`, or `None` when the item has no usable name.
    fn name(&self, index: usize) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: AsRef<str>> NameSupplier for [S] {
    fn len(&self) -> usize {
        <[S]>::len(self)
    }

    fn name(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

/// Count names produced by `name_at` for every index in `0..length`.
///
/// Missing or empty names are skipped. Entries appear in the order their
/// name was first seen; no sorting is applied (see [`CountResult::sort`]).
pub fn count<S, F>(length: usize, mut name_at: F) -> CountResult
where
    S: AsRef<str>,
    F: FnMut(usize) -> Option<S>,
{
    let mut result = CountResult::default();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for i in 0..length {
        let Some(name) = name_at(i) else {
            continue;
        };
        let name = name.as_ref();
        if name.is_empty() {
            continue;
        }

        match index_of.get(name) {
            Some(&slot) => result.count[slot].count += 1,
            None => {
                index_of.insert(name.to_string(), result.count.len());
                result.count.push(Count {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    tracing::trace!(items = length, distinct = result.count.len(), "counted names");
    result
}

/// Count every name a [`NameSupplier`] yields.
pub fn count_supplier<N: NameSupplier + ?Sized>(supplier: &N) -> CountResult {
    count(supplier.len(), |i| supplier.name(i))
}
