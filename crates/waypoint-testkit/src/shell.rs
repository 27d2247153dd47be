//! In-memory fake host surface.
//!
//! [`FakeShell`] implements the full [`ShellSurface`] contract: a mutable
//! items/sections/contents tree, live push and modal stacks per section,
//! materialization through the bound [`PageMaterializer`], and structural
//! notifications fired after every mutation — with the state lock released
//! first, matching the single-threaded host discipline.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use waypoint_core::page::{PageHandle, Screen, ScreenType};
use waypoint_core::registry::PageMaterializer;
use waypoint_core::shell::{
    ContentRef, HostError, PageSlot, SectionRef, ShellContentDescriptor, ShellItemDescriptor,
    ShellSectionDescriptor, ShellStructureEvents, ShellSurface,
};

struct FakeContent {
    segment: String,
    screen: ScreenType,
    page: Option<PageSlot>,
}

struct FakeSection {
    segment: String,
    contents: Vec<FakeContent>,
    current_content: Option<String>,
    nav_stack: Vec<PageSlot>,
    modal_stack: Vec<PageSlot>,
}

struct FakeItem {
    segment: String,
    sections: Vec<FakeSection>,
    current_section: Option<String>,
}

#[derive(Default)]
struct ShellState {
    items: Vec<FakeItem>,
    current_item: Option<String>,
}

impl ShellState {
    fn item_mut(&mut self, name: &str) -> Option<&mut FakeItem> {
        self.items.iter_mut().find(|i| i.segment == name)
    }

    fn section(&self, sref: &SectionRef) -> Option<&FakeSection> {
        self.items
            .iter()
            .find(|i| i.segment == sref.item)?
            .sections
            .iter()
            .find(|s| s.segment == sref.section)
    }

    fn section_mut(&mut self, sref: &SectionRef) -> Option<&mut FakeSection> {
        self.items
            .iter_mut()
            .find(|i| i.segment == sref.item)?
            .sections
            .iter_mut()
            .find(|s| s.segment == sref.section)
    }

    fn content(&self, cref: &ContentRef) -> Option<&FakeContent> {
        self.section(&cref.section_ref())?
            .contents
            .iter()
            .find(|c| c.segment == cref.content)
    }

    fn content_mut(&mut self, cref: &ContentRef) -> Option<&mut FakeContent> {
        self.section_mut(&cref.section_ref())?
            .contents
            .iter_mut()
            .find(|c| c.segment == cref.content)
    }
}

/// An in-memory tab/drawer host surface for tests.
pub struct FakeShell {
    state: Mutex<ShellState>,
    materializer: RwLock<Option<Arc<dyn PageMaterializer>>>,
    events: RwLock<Option<Arc<dyn ShellStructureEvents>>>,
}

impl FakeShell {
    fn new(state: ShellState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            materializer: RwLock::new(None),
            events: RwLock::new(None),
        })
    }

    /// Binds the engine-side handles. Call before the first navigation.
    pub fn bind(
        &self,
        materializer: Arc<dyn PageMaterializer>,
        events: Arc<dyn ShellStructureEvents>,
    ) {
        *self.materializer.write() = Some(materializer);
        *self.events.write() = Some(events);
    }

    fn events(&self) -> Option<Arc<dyn ShellStructureEvents>> {
        self.events.read().clone()
    }

    /// Segments of the section's push stack, bottom first. Assertion helper.
    pub fn nav_stack_segments(&self, section: &SectionRef) -> Vec<String> {
        self.state
            .lock()
            .section(section)
            .map(|s| s.nav_stack.iter().map(|p| p.segment().to_owned()).collect())
            .unwrap_or_default()
    }

    /// Removes the topmost pushed page the way a platform back gesture
    /// would: directly, without consulting the engine and without any
    /// removal mark. Returns the removed slot.
    pub fn externally_pop(&self, section: &SectionRef) -> Option<PageSlot> {
        self.state
            .lock()
            .section_mut(section)
            .and_then(|s| s.nav_stack.pop())
    }

    /// Presents a modal page the way host-level chrome would, outside the
    /// engine's own push path.
    pub fn present_modal(
        &self,
        section: &SectionRef,
        segment: impl Into<String>,
        component: &PageHandle,
    ) {
        if let Some(s) = self.state.lock().section_mut(section) {
            s.modal_stack.push(PageSlot::new(segment, component));
        }
    }

    /// Adds a collapsed single-content item for screen `T` at runtime and
    /// fires the structural-change notification.
    pub fn add_single_item<T: Screen>(&self) {
        let segment = T::segment().to_owned();
        {
            let mut state = self.state.lock();
            state.items.push(FakeItem {
                segment: segment.clone(),
                current_section: None,
                sections: vec![FakeSection {
                    segment: segment.clone(),
                    current_content: None,
                    nav_stack: Vec::new(),
                    modal_stack: Vec::new(),
                    contents: vec![FakeContent {
                        segment,
                        screen: ScreenType::of::<T>(),
                        page: None,
                    }],
                }],
            });
        }
        if let Some(events) = self.events() {
            events.items_changed();
        }
    }

    /// Removes a top-level item and fires the structural-change
    /// notification.
    pub fn remove_item(&self, segment: &str) {
        {
            let mut state = self.state.lock();
            state.items.retain(|i| i.segment != segment);
            if state.current_item.as_deref() == Some(segment) {
                state.current_item = None;
            }
        }
        if let Some(events) = self.events() {
            events.items_changed();
        }
    }
}

impl ShellSurface for FakeShell {
    fn structure(&self) -> Vec<ShellItemDescriptor> {
        self.state
            .lock()
            .items
            .iter()
            .map(|item| ShellItemDescriptor {
                segment: item.segment.clone(),
                sections: item
                    .sections
                    .iter()
                    .map(|section| ShellSectionDescriptor {
                        segment: section.segment.clone(),
                        contents: section
                            .contents
                            .iter()
                            .map(|content| ShellContentDescriptor {
                                segment: content.segment.clone(),
                                screen: content.screen,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn current_item(&self) -> Option<String> {
        self.state.lock().current_item.clone()
    }

    fn current_section(&self, item: &str) -> Option<String> {
        self.state
            .lock()
            .items
            .iter()
            .find(|i| i.segment == item)
            .and_then(|i| i.current_section.clone())
    }

    fn current_content(&self, section: &SectionRef) -> Option<String> {
        self.state
            .lock()
            .section(section)
            .and_then(|s| s.current_content.clone())
    }

    fn navigation_stack(&self, section: &SectionRef) -> Vec<PageSlot> {
        self.state
            .lock()
            .section(section)
            .map(|s| s.nav_stack.clone())
            .unwrap_or_default()
    }

    fn modal_stack(&self, section: &SectionRef) -> Vec<PageSlot> {
        self.state
            .lock()
            .section(section)
            .map(|s| s.modal_stack.clone())
            .unwrap_or_default()
    }

    fn content_page(&self, content: &ContentRef) -> Option<PageSlot> {
        self.state
            .lock()
            .content(content)
            .and_then(|c| c.page.clone())
    }

    fn ensure_content_page(&self, content: &ContentRef) -> Result<PageSlot, HostError> {
        let screen = {
            let state = self.state.lock();
            let slot = state
                .content(content)
                .ok_or_else(|| HostError::new(format!("unknown content `{}`", content.content)))?;
            if let Some(page) = &slot.page {
                return Ok(page.clone());
            }
            slot.screen
        };

        let materializer = self
            .materializer
            .read()
            .clone()
            .ok_or_else(|| HostError::new("no materializer bound"))?;
        let page = materializer
            .materialize(screen)
            .map_err(|e| HostError::new(e.to_string()))?;
        let slot = PageSlot::new(content.content.clone(), &page.component);

        self.state
            .lock()
            .content_mut(content)
            .ok_or_else(|| HostError::new(format!("unknown content `{}`", content.content)))?
            .page = Some(slot.clone());
        Ok(slot)
    }

    fn switch_current_content(&self, content: &ContentRef) -> Result<(), HostError> {
        {
            let mut state = self.state.lock();
            state
                .content(content)
                .ok_or_else(|| HostError::new(format!("unknown content `{}`", content.content)))?;
            state.current_item = Some(content.item.clone());
            if let Some(item) = state.item_mut(&content.item) {
                item.current_section = Some(content.section.clone());
            }
            if let Some(section) = state.section_mut(&content.section_ref()) {
                section.current_content = Some(content.content.clone());
            }
        }
        if let Some(events) = self.events() {
            events.current_item_changed();
            events.current_content_changed(&content.section_ref());
        }
        Ok(())
    }

    fn push_page(&self, section: &SectionRef, screen: ScreenType) -> Result<(), HostError> {
        let materializer = self
            .materializer
            .read()
            .clone()
            .ok_or_else(|| HostError::new("no materializer bound"))?;
        let page = materializer
            .materialize(screen)
            .map_err(|e| HostError::new(e.to_string()))?;
        let slot = PageSlot::new(screen.segment(), &page.component);

        self.state
            .lock()
            .section_mut(section)
            .ok_or_else(|| HostError::new(format!("unknown section `{}`", section.section)))?
            .nav_stack
            .push(slot);
        Ok(())
    }

    fn remove_page(&self, section: &SectionRef, slot: &PageSlot) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let section = state
            .section_mut(section)
            .ok_or_else(|| HostError::new(format!("unknown section `{}`", section.section)))?;
        if let Some(pos) = section.modal_stack.iter().position(|s| s.same_slot(slot)) {
            section.modal_stack.remove(pos);
            return Ok(());
        }
        match section.nav_stack.iter().position(|s| s.same_slot(slot)) {
            Some(pos) => {
                section.nav_stack.remove(pos);
                Ok(())
            }
            None => Err(HostError::new("slot not found on any stack")),
        }
    }

    fn destroy_content_page(&self, content: &ContentRef) -> Result<(), HostError> {
        self.state
            .lock()
            .content_mut(content)
            .ok_or_else(|| HostError::new(format!("unknown content `{}`", content.content)))?
            .page = None;
        Ok(())
    }
}

/// Builds a [`FakeShell`] structure declaratively.
///
/// The host starts unsettled: no current item, section or content is
/// reported until something selects one, exercising the engine's
/// first-child fallbacks.
#[derive(Default)]
pub struct ShellBuilder {
    state: ShellState,
}

impl ShellBuilder {
    /// An empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collapsed item/section/content chain for screen `T`, all
    /// three levels named after the content segment — the shape implicit
    /// host routes produce.
    pub fn single<T: Screen>(self) -> Self {
        let segment = T::segment();
        self.content_with_route::<T>(segment, segment, segment)
    }

    /// Adds a content for screen `T` under the named item and section,
    /// creating them as needed.
    pub fn content<T: Screen>(self, item: &str, section: &str) -> Self {
        self.content_with_route::<T>(item, section, T::segment())
    }

    /// Adds a content for screen `T` under a custom route.
    pub fn content_with_route<T: Screen>(mut self, item: &str, section: &str, route: &str) -> Self {
        let content = FakeContent {
            segment: route.to_owned(),
            screen: ScreenType::of::<T>(),
            page: None,
        };

        if let Some(existing_item) = self.state.item_mut(item) {
            if let Some(existing_section) = existing_item
                .sections
                .iter_mut()
                .find(|s| s.segment == section)
            {
                existing_section.contents.push(content);
            } else {
                existing_item.sections.push(FakeSection {
                    segment: section.to_owned(),
                    contents: vec![content],
                    current_content: None,
                    nav_stack: Vec::new(),
                    modal_stack: Vec::new(),
                });
            }
        } else {
            self.state.items.push(FakeItem {
                segment: item.to_owned(),
                current_section: None,
                sections: vec![FakeSection {
                    segment: section.to_owned(),
                    contents: vec![content],
                    current_content: None,
                    nav_stack: Vec::new(),
                    modal_stack: Vec::new(),
                }],
            });
        }
        self
    }

    /// Finishes the surface.
    pub fn build(self) -> Arc<FakeShell> {
        FakeShell::new(self.state)
    }
}
