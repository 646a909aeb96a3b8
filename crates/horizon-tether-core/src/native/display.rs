//! The headless native display.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;

use slotmap::SlotMap;

use super::{Attr, NativeEvent, NativeId, ResourceId};
use crate::error::NativeError;
use crate::handle::Style;
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// Internal data stored for each native widget.
struct NativeWidget {
    /// Widget class, e.g. `"Text"`.
    class: &'static str,
    /// Style bits the widget was created with.
    style: Style,
    /// Parent native widget, `None` for top-level surfaces.
    parent: Option<NativeId>,
    /// Native children in creation order.
    children: Vec<NativeId>,
    /// Attribute values (type-erased).
    attributes: HashMap<&'static str, Box<dyn Any>>,
    /// Creation serial number, strictly increasing per display.
    serial: u64,
}

/// A native sub-resource such as a font or color.
struct NativeResource {
    kind: &'static str,
    description: String,
}

/// The native context owned by the owner thread.
///
/// All methods must be called on the thread that created the display; the
/// type is `!Send` and debug builds additionally assert the thread on every
/// mutation.
pub struct Display {
    name: String,
    affinity: ThreadAffinity,
    widgets: SlotMap<NativeId, NativeWidget>,
    resources: SlotMap<ResourceId, NativeResource>,
    events: VecDeque<NativeEvent>,
    /// Number of API writes per (widget, attribute).
    writes: HashMap<(NativeId, &'static str), u32>,
    next_serial: u64,
    _not_send: PhantomData<*const ()>,
}

impl Display {
    /// Create a new display bound to the current thread.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affinity: ThreadAffinity::current(),
            widgets: SlotMap::with_key(),
            resources: SlotMap::with_key(),
            events: VecDeque::new(),
            writes: HashMap::new(),
            next_serial: 0,
            _not_send: PhantomData,
        }
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // -------------------------------------------------------------------------
    // Widgets
    // -------------------------------------------------------------------------

    /// Create a native widget under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`NativeError::ParentDestroyed`] if `parent` no longer exists.
    pub fn create(
        &mut self,
        class: &'static str,
        parent: Option<NativeId>,
        style: Style,
    ) -> Result<NativeId, NativeError> {
        self.affinity.debug_assert_same_thread();

        if let Some(parent_id) = parent {
            if !self.widgets.contains_key(parent_id) {
                return Err(NativeError::ParentDestroyed(parent_id));
            }
        }

        self.next_serial += 1;
        let id = self.widgets.insert(NativeWidget {
            class,
            style,
            parent,
            children: Vec::new(),
            attributes: HashMap::new(),
            serial: self.next_serial,
        });

        if let Some(parent_id) = parent {
            if let Some(parent_data) = self.widgets.get_mut(parent_id) {
                parent_data.children.push(id);
            }
        }

        tracing::trace!(target: targets::NATIVE, ?id, class, ?parent, "created native widget");
        Ok(id)
    }

    /// Destroy a native widget and all of its native descendants.
    ///
    /// Returns the number of widgets destroyed.
    pub fn destroy(&mut self, id: NativeId) -> Result<usize, NativeError> {
        self.affinity.debug_assert_same_thread();

        let mut doomed = Vec::new();
        self.collect_descendants(id, &mut doomed)?;

        if let Some(parent_id) = self.widgets.get(id).and_then(|w| w.parent) {
            if let Some(parent_data) = self.widgets.get_mut(parent_id) {
                parent_data.children.retain(|&child| child != id);
            }
        }

        doomed.push(id);
        for widget in &doomed {
            self.widgets.remove(*widget);
        }
        self.writes.retain(|(widget, _), _| !doomed.contains(widget));

        tracing::trace!(target: targets::NATIVE, ?id, count = doomed.len(), "destroyed native widget tree");
        Ok(doomed.len())
    }

    /// Collect all descendant IDs in depth-first order (children before parents).
    fn collect_descendants(&self, id: NativeId, out: &mut Vec<NativeId>) -> Result<(), NativeError> {
        let data = self.widgets.get(id).ok_or(NativeError::InvalidWidget(id))?;
        for &child in &data.children {
            self.collect_descendants(child, out)?;
            out.push(child);
        }
        Ok(())
    }

    /// Check if a native widget exists.
    pub fn contains(&self, id: NativeId) -> bool {
        self.widgets.contains_key(id)
    }

    /// The class of a native widget.
    pub fn class(&self, id: NativeId) -> Result<&'static str, NativeError> {
        self.widget(id).map(|w| w.class)
    }

    /// The style bits of a native widget.
    pub fn style(&self, id: NativeId) -> Result<Style, NativeError> {
        self.widget(id).map(|w| w.style)
    }

    /// The native parent of a widget.
    pub fn parent(&self, id: NativeId) -> Result<Option<NativeId>, NativeError> {
        self.widget(id).map(|w| w.parent)
    }

    /// The native children of a widget, in creation order.
    pub fn children(&self, id: NativeId) -> Result<&[NativeId], NativeError> {
        self.widget(id).map(|w| w.children.as_slice())
    }

    /// The creation serial of a widget. Serials increase strictly with each
    /// creation, so a lower serial means the widget was realized earlier.
    pub fn serial(&self, id: NativeId) -> Result<u64, NativeError> {
        self.widget(id).map(|w| w.serial)
    }

    /// Number of live native widgets.
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Number of live native widgets of the given class.
    pub fn count_class(&self, class: &str) -> usize {
        self.widgets.values().filter(|w| w.class == class).count()
    }

    fn widget(&self, id: NativeId) -> Result<&NativeWidget, NativeError> {
        self.widgets.get(id).ok_or(NativeError::InvalidWidget(id))
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Set an attribute on a native widget.
    pub fn set<T: Any>(&mut self, id: NativeId, attr: Attr<T>, value: T) -> Result<(), NativeError> {
        self.affinity.debug_assert_same_thread();
        let data = self.widgets.get_mut(id).ok_or(NativeError::InvalidWidget(id))?;
        data.attributes.insert(attr.name(), Box::new(value));
        *self.writes.entry((id, attr.name())).or_insert(0) += 1;
        Ok(())
    }

    /// Read an attribute from a native widget.
    ///
    /// Returns `Ok(None)` if the attribute was never set or holds a value of a
    /// different type.
    pub fn get<T: Any + Clone>(&self, id: NativeId, attr: Attr<T>) -> Result<Option<T>, NativeError> {
        let data = self.widget(id)?;
        Ok(data
            .attributes
            .get(attr.name())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned())
    }

    /// Read an attribute, falling back to `default` if it was never set.
    pub fn get_or<T: Any + Clone>(&self, id: NativeId, attr: Attr<T>, default: T) -> Result<T, NativeError> {
        Ok(self.get(id, attr)?.unwrap_or(default))
    }

    /// How many times `attr` was written through [`Display::set`].
    ///
    /// Changes that arrive as native events are not counted.
    pub fn write_count<T>(&self, id: NativeId, attr: Attr<T>) -> u32 {
        self.writes.get(&(id, attr.name())).copied().unwrap_or(0)
    }

    /// Apply a native state change that did not originate from the API.
    pub fn apply_change(
        &mut self,
        id: NativeId,
        attr: &'static str,
        value: Box<dyn Any + Send>,
    ) -> Result<(), NativeError> {
        self.affinity.debug_assert_same_thread();
        let data = self.widgets.get_mut(id).ok_or(NativeError::InvalidWidget(id))?;
        let value: Box<dyn Any> = value;
        data.attributes.insert(attr, value);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    /// Allocate a native sub-resource.
    pub fn alloc_resource(&mut self, kind: &'static str, description: impl Into<String>) -> ResourceId {
        self.affinity.debug_assert_same_thread();
        self.resources.insert(NativeResource {
            kind,
            description: description.into(),
        })
    }

    /// Release a native sub-resource.
    pub fn free_resource(&mut self, id: ResourceId) -> Result<(), NativeError> {
        self.affinity.debug_assert_same_thread();
        self.resources
            .remove(id)
            .map(|_| ())
            .ok_or(NativeError::InvalidResource(id))
    }

    /// The kind and description of a resource.
    pub fn resource(&self, id: ResourceId) -> Result<(&'static str, &str), NativeError> {
        self.resources
            .get(id)
            .map(|r| (r.kind, r.description.as_str()))
            .ok_or(NativeError::InvalidResource(id))
    }

    /// Number of live native resources.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Queue a native event for the next dispatch cycle.
    pub fn post(&mut self, event: NativeEvent) {
        self.events.push_back(event);
    }

    /// Check if native events are waiting to be dispatched.
    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Number of native events waiting to be dispatched.
    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    /// Take the next pending native event.
    pub fn next_event(&mut self) -> Option<NativeEvent> {
        self.events.pop_front()
    }

    /// Dispatch a single native event.
    pub fn dispatch(&mut self, event: NativeEvent) -> Result<(), NativeError> {
        match event {
            NativeEvent::Changed { widget, attr, value } => self.apply_change(widget, attr, value),
            NativeEvent::Run(f) => {
                f(self);
                Ok(())
            }
        }
    }

    /// Release every native widget, resource and pending event.
    ///
    /// Returns the number of widgets released. Resources still alive at this
    /// point were leaked by their owners and are reported.
    pub fn release_all(&mut self) -> usize {
        self.affinity.debug_assert_same_thread();
        let widgets = self.widgets.len();
        if !self.resources.is_empty() {
            tracing::warn!(
                target: targets::NATIVE,
                display = %self.name,
                leaked = self.resources.len(),
                "releasing native resources that were never freed"
            );
        }
        self.widgets.clear();
        self.resources.clear();
        self.events.clear();
        self.writes.clear();
        widgets
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        if !self.widgets.is_empty() {
            self.release_all();
        }
    }
}
