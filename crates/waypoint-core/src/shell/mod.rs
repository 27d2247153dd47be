//! # Host Surface Interfaces
//!
//! The host is an imperative tab/drawer navigation surface shaped
//! items → sections → contents, each section owning one push stack and one
//! modal stack. The engine never owns host elements: it reads them through
//! [`ShellSurface`], mutates them through the same trait, and is told about
//! structural changes through [`ShellStructureEvents`].
//!
//! Identity is by segment name at every level (stable identity, per the
//! read-through-view strategy); page slots carry only weak component
//! associations, so a host caching a visual element never extends a page's
//! life.

mod proxy;

pub use proxy::{
    NavigationStackPage, ShellContentProxy, ShellItemProxy, ShellProxy, ShellSectionProxy,
};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use thiserror::Error;

use crate::page::{PageComponent, PageHandle, ScreenType};

/// A failure reported by the host surface.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Convenience constructor.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Identifies a section on the host surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SectionRef {
    /// Segment name of the owning item.
    pub item: String,
    /// Segment name of the section.
    pub section: String,
}

/// Identifies a content slot on the host surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentRef {
    /// Segment name of the owning item.
    pub item: String,
    /// Segment name of the owning section.
    pub section: String,
    /// Segment name of the content.
    pub content: String,
}

impl ContentRef {
    /// The owning section's reference.
    pub fn section_ref(&self) -> SectionRef {
        SectionRef {
            item: self.item.clone(),
            section: self.section.clone(),
        }
    }
}

/// Shape of one content slot.
#[derive(Clone, Debug)]
pub struct ShellContentDescriptor {
    /// Segment name of the content.
    pub segment: String,
    /// Screen type rendered by this content's root page.
    pub screen: ScreenType,
}

/// Shape of one section.
#[derive(Clone, Debug)]
pub struct ShellSectionDescriptor {
    /// Segment name of the section.
    pub segment: String,
    /// Contents, in display order.
    pub contents: Vec<ShellContentDescriptor>,
}

/// Shape of one top-level item (tab or drawer entry).
#[derive(Clone, Debug)]
pub struct ShellItemDescriptor {
    /// Segment name of the item.
    pub segment: String,
    /// Sections, in display order.
    pub sections: Vec<ShellSectionDescriptor>,
}

/// The host's handle to one materialized page.
///
/// Holds only a weak association to the logical component; presence of a
/// slot does not extend the page's lifetime. The removal mark lets host
/// listeners distinguish engine-initiated removals from external ones.
#[derive(Clone)]
pub struct PageSlot {
    segment: String,
    component: Weak<dyn PageComponent>,
    removal_mark: Arc<AtomicBool>,
}

impl PageSlot {
    /// Creates a slot weakly associated with `component`.
    pub fn new(segment: impl Into<String>, component: &PageHandle) -> Self {
        Self {
            segment: segment.into(),
            component: Arc::downgrade(component),
            removal_mark: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Route segment of the page in this slot.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The logical component, if it is still alive.
    pub fn component(&self) -> Option<PageHandle> {
        self.component.upgrade()
    }

    /// Marks this slot as about to be removed by the engine.
    pub fn mark_for_removal(&self) {
        self.removal_mark.store(true, Ordering::Release);
    }

    /// Whether the engine marked this slot for removal.
    pub fn is_marked_for_removal(&self) -> bool {
        self.removal_mark.load(Ordering::Acquire)
    }

    /// Whether two slots refer to the same host entry.
    pub fn same_slot(&self, other: &PageSlot) -> bool {
        Arc::ptr_eq(&self.removal_mark, &other.removal_mark)
    }
}

impl fmt::Debug for PageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSlot")
            .field("segment", &self.segment)
            .field("alive", &(self.component.strong_count() > 0))
            .field("marked_for_removal", &self.is_marked_for_removal())
            .finish()
    }
}

/// The imperative host navigation surface.
///
/// All reads reflect the host's *current* state; the engine reads through
/// on every navigation rather than caching stacks.
pub trait ShellSurface: Send + Sync {
    /// Current structural shape of the surface.
    fn structure(&self) -> Vec<ShellItemDescriptor>;

    /// Segment name of the currently selected item, if the host has
    /// settled on one.
    fn current_item(&self) -> Option<String>;

    /// Segment name of the item's currently selected section, if settled.
    fn current_section(&self, item: &str) -> Option<String>;

    /// Segment name of the section's currently selected content. `None`
    /// immediately after a structural mutation, before the host settles.
    fn current_content(&self, section: &SectionRef) -> Option<String>;

    /// The section's push stack, bottom first.
    fn navigation_stack(&self, section: &SectionRef) -> Vec<PageSlot>;

    /// The section's modal stack, bottom first.
    fn modal_stack(&self, section: &SectionRef) -> Vec<PageSlot>;

    /// The content's materialized root page, if any.
    fn content_page(&self, content: &ContentRef) -> Option<PageSlot>;

    /// Materializes the content's root page if needed, through the bound
    /// [`PageMaterializer`](crate::registry::PageMaterializer).
    fn ensure_content_page(&self, content: &ContentRef) -> Result<PageSlot, HostError>;

    /// Makes `content` the current content (selecting its item and section).
    fn switch_current_content(&self, content: &ContentRef) -> Result<(), HostError>;

    /// Pushes a new page for `screen` onto the section's push stack,
    /// materializing through the bound materializer.
    fn push_page(&self, section: &SectionRef, screen: ScreenType) -> Result<(), HostError>;

    /// Removes one page slot from the section's stacks.
    fn remove_page(&self, section: &SectionRef, slot: &PageSlot) -> Result<(), HostError>;

    /// Drops the content's materialized root page from the host cache.
    fn destroy_content_page(&self, content: &ContentRef) -> Result<(), HostError>;
}

/// Structural-change notifications the host delivers to the engine.
///
/// The engine hands an implementation to the host at wiring time; the host
/// must call these on the same execution context it serves reads on.
pub trait ShellStructureEvents: Send + Sync {
    /// Items, sections or contents were added or removed.
    fn items_changed(&self);

    /// The current item (or a section's current item) changed.
    fn current_item_changed(&self);

    /// A section's current content changed.
    fn current_content_changed(&self, section: &SectionRef);
}
