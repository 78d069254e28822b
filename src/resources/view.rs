//! Resource View Cache
//!
//! Views are typed re-interpretations of a sub-range of a base resource (a
//! mip range of a texture, an element range of a buffer). Creating them on
//! the device is not free, and two passes asking for the same sub-range must
//! end up sharing one object, so views live in a cache keyed by the base
//! resource and the full view descriptor.
//!
//! # Design
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  ResourceViewCache<R>                     │
//! │                                                           │
//! │  lookup: FxHashMap<(ResourceId, R::ViewDesc), ViewId>     │
//! │  views:  SlotMap<ViewId, { Arc<ResourceView<R>>, count }> │
//! │                                                           │
//! │  request_view()  → count + 1, same Arc for equal keys     │
//! │  release_view()  → count - 1, destroyed at zero           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Views are **never** destroyed by dropping an `Arc`: the cache keeps its own
//! reference until the matching number of [`ResourceViewCache::release_view`]
//! calls has been made. Slot map keys are versioned, so releasing a stale view
//! after its slot was reused is caught instead of decrementing the new entry.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use super::ResourceId;
use crate::errors::{ContractViolation, Result, contract_violation};

new_key_type! {
    /// Cache-assigned identity of a view.
    pub struct ViewId;
}

bitflags! {
    /// How a view is going to be bound.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct GpuViewUsage: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET   = 1 << 1;
        const DEPTH_STENCIL   = 1 << 2;
        const RANDOM_ACCESS   = 1 << 3;
    }
}

impl Default for GpuViewUsage {
    fn default() -> Self {
        Self::SHADER_RESOURCE
    }
}

/// A base resource that views can be created over.
pub trait ViewableResource: fmt::Debug + Send + Sync + 'static {
    /// Structural view descriptor. Every field takes part in equality and
    /// hashing; two descriptors that compare equal are interchangeable.
    type ViewDesc: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn resource_id(&self) -> ResourceId;

    fn label(&self) -> &str;
}

/// An immutable view over a base resource.
pub struct ResourceView<R: ViewableResource> {
    id: ViewId,
    resource: Arc<R>,
    desc: R::ViewDesc,
}

impl<R: ViewableResource> ResourceView<R> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The base resource this view was created over.
    #[inline]
    #[must_use]
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &R::ViewDesc {
        &self.desc
    }
}

impl<R: ViewableResource> fmt::Debug for ResourceView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceView")
            .field("id", &self.id)
            .field("resource", &self.resource.label())
            .field("desc", &self.desc)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct ViewKey<D> {
    resource: ResourceId,
    desc: D,
}

struct CachedView<R: ViewableResource> {
    view: Arc<ResourceView<R>>,
    ref_count: u32,
}

struct ViewTable<R: ViewableResource> {
    views: SlotMap<ViewId, CachedView<R>>,
    lookup: FxHashMap<ViewKey<R::ViewDesc>, ViewId>,
}

/// Reference-counted, descriptor-keyed view pool.
///
/// # Thread Safety
///
/// One lock guards the whole table; views may be requested and released from
/// any thread.
pub struct ResourceViewCache<R: ViewableResource> {
    table: Mutex<ViewTable<R>>,
}

impl<R: ViewableResource> ResourceViewCache<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Mutex::new(ViewTable {
                views: SlotMap::with_key(),
                lookup: FxHashMap::default(),
            }),
        }
    }

    /// Returns the view of `resource` described by `desc`.
    ///
    /// An equal descriptor requested earlier for the same resource yields the
    /// same instance with its reference count bumped by one.
    pub fn request_view(&self, resource: &Arc<R>, desc: R::ViewDesc) -> Arc<ResourceView<R>> {
        let mut guard = self.table.lock();
        let table = &mut *guard;

        let key = ViewKey {
            resource: resource.resource_id(),
            desc,
        };

        if let Some(&id) = table.lookup.get(&key) {
            let entry = &mut table.views[id];
            entry.ref_count += 1;
            return Arc::clone(&entry.view);
        }

        let desc = key.desc.clone();
        let id = table.views.insert_with_key(|id| CachedView {
            view: Arc::new(ResourceView {
                id,
                resource: Arc::clone(resource),
                desc,
            }),
            ref_count: 1,
        });
        table.lookup.insert(key, id);

        let view = Arc::clone(&table.views[id].view);
        log::debug!("Created view {:?} of '{}'", view.desc(), resource.label());
        view
    }

    /// Drops one reference to `view`, destroying it once none remain.
    ///
    /// Releasing a view that is not (or no longer) held by this cache is a
    /// contract violation.
    pub fn release_view(&self, view: &ResourceView<R>) -> Result<()> {
        let mut guard = self.table.lock();
        let table = &mut *guard;

        let held = table
            .views
            .get(view.id)
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(&entry.view), view));
        if !held {
            drop(guard);
            return Err(contract_violation(ContractViolation::ViewNotCached {
                view: format!("{view:?}"),
            }));
        }

        let entry = &mut table.views[view.id];
        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(());
        }

        table.views.remove(view.id);
        table.lookup.remove(&ViewKey {
            resource: view.resource.resource_id(),
            desc: view.desc.clone(),
        });
        log::debug!(
            "Destroyed view {:?} of '{}'",
            view.desc(),
            view.resource.label()
        );
        Ok(())
    }

    /// Outstanding references to `view`, 0 when it isn't cached.
    #[must_use]
    pub fn ref_count(&self, view: &ResourceView<R>) -> u32 {
        let table = self.table.lock();
        table
            .views
            .get(view.id)
            .filter(|entry| std::ptr::eq(Arc::as_ptr(&entry.view), view))
            .map_or(0, |entry| entry.ref_count)
    }

    /// Number of live views across all resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: ViewableResource> Default for ResourceViewCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ViewableResource> fmt::Debug for ResourceViewCache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceViewCache")
            .field("live_views", &self.len())
            .finish()
    }
}

impl<R: ViewableResource> Drop for ResourceViewCache<R> {
    fn drop(&mut self) {
        let table = self.table.get_mut();
        if !table.views.is_empty() {
            log::warn!(
                "View cache dropped with {} views still referenced",
                table.views.len()
            );
        }
    }
}
