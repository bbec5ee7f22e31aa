//! Process-wide memo of type descriptors.
//!
//! Each target type is described at most once. Lookups from many threads are
//! safe: the map lock is only held long enough to fetch the per-type cell,
//! and the descriptor is built outside it, so describing one type may look
//! up others.
//!
//! A cache is a handle: clones share the same entries. Binding resolves
//! every nested field and element type through the cache that described
//! the root type.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::bind::Decode;
use crate::descriptor::TypeDescriptor;

type Slot = Arc<OnceCell<Arc<TypeDescriptor>>>;

/// Memo keyed by type identity.
#[derive(Debug, Default, Clone)]
pub struct DescriptorCache {
    entries: Arc<Mutex<HashMap<TypeId, Slot>>>,
}

static GLOBAL: Lazy<DescriptorCache> = Lazy::new(DescriptorCache::new);

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static DescriptorCache {
        &GLOBAL
    }

    /// Descriptor of `T`, built on first request.
    pub fn get<T: Decode>(&self) -> Arc<TypeDescriptor> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(entries.entry(TypeId::of::<T>()).or_default())
        };
        Arc::clone(slot.get_or_init(|| {
            debug!(type_name = type_name::<T>(), "describing type");
            Arc::new(T::describe())
        }))
    }

    /// Whether `T` has been described.
    pub fn contains<T: 'static>(&self) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of described types.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Descriptor of `T` from the global cache.
pub fn descriptor<T: Decode>() -> Arc<TypeDescriptor> {
    DescriptorCache::global().get::<T>()
}
