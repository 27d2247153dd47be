//! # Shell Proxies
//!
//! Read-mostly mirrors of the host's item/section/content structure. The
//! proxies never own host elements: they hold segment-name identities plus
//! the host handle, recompute derived state (the current content) on host
//! change notifications, and read page stacks live from the host on every
//! enumeration.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::errors::NavigationError;
use crate::page::{PageHandle, ScreenType};
use crate::shell::{
    ContentRef, HostError, PageSlot, SectionRef, ShellStructureEvents, ShellSurface,
};

/// A logical descriptor of one entry in the effective navigation stack:
/// the content root plus pushed and modal pages.
#[derive(Clone)]
pub struct NavigationStackPage {
    /// Accumulated route of this entry, e.g. `//inbox/detail`.
    pub route: String,
    /// Route segment of this entry.
    pub segment: String,
    /// The live page component.
    pub component: PageHandle,
    /// Whether the entry sits on the modal stack.
    pub is_modal: bool,
}

impl std::fmt::Debug for NavigationStackPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationStackPage")
            .field("route", &self.route)
            .field("segment", &self.segment)
            .field("is_modal", &self.is_modal)
            .finish()
    }
}

/// Mirror of one top-level item.
pub struct ShellItemProxy {
    segment: String,
    sections: Vec<Arc<ShellSectionProxy>>,
}

impl ShellItemProxy {
    /// Segment name of the item.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The item's sections, in display order.
    pub fn sections(&self) -> &[Arc<ShellSectionProxy>] {
        &self.sections
    }
}

/// Mirror of one section: contents plus the host-owned page stacks.
pub struct ShellSectionProxy {
    segment: String,
    sref: SectionRef,
    host: Arc<dyn ShellSurface>,
    contents: Vec<Arc<ShellContentProxy>>,
    current: RwLock<Option<Arc<ShellContentProxy>>>,
}

impl ShellSectionProxy {
    /// Segment name of the section.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Host reference of this section.
    pub fn section_ref(&self) -> &SectionRef {
        &self.sref
    }

    /// The section's contents, in display order.
    pub fn contents(&self) -> &[Arc<ShellContentProxy>] {
        &self.contents
    }

    /// The currently selected content.
    pub fn current_content(&self) -> Option<Arc<ShellContentProxy>> {
        self.current.read().clone()
    }

    /// Recomputes the current content from host state. Falls back to the
    /// first content when the host reports none — the state immediately
    /// after a structural mutation, before the host settles.
    fn recompute_current(&self) {
        let reported = self.host.current_content(&self.sref);
        let current = match reported {
            Some(name) => self.contents.iter().find(|c| c.segment == name).cloned(),
            None => None,
        }
        .or_else(|| self.contents.first().cloned());
        *self.current.write() = current;
    }

    /// Enumerates the logical navigation stack for `content` (the current
    /// content when `None`): the content root, then — only for the current
    /// content, which owns the live stack — every pushed page followed by
    /// every modal page, with routes accumulated along the way.
    ///
    /// Returns an empty stack when the content has no materialized page.
    pub fn get_navigation_stack(
        &self,
        content: Option<&Arc<ShellContentProxy>>,
    ) -> Vec<NavigationStackPage> {
        let Some(content) = content.cloned().or_else(|| self.current_content()) else {
            return Vec::new();
        };
        let Some(root_slot) = self.host.content_page(&content.cref) else {
            return Vec::new();
        };

        let mut route = format!("//{}", content.segment);
        let mut pages = Vec::new();
        if let Some(component) = root_slot.component() {
            pages.push(NavigationStackPage {
                route: route.clone(),
                segment: content.segment.clone(),
                component,
                is_modal: false,
            });
        }

        let owns_stack = self
            .current_content()
            .is_some_and(|current| current.cref == content.cref);
        if !owns_stack {
            return pages;
        }

        for slot in self.host.navigation_stack(&self.sref) {
            route.push('/');
            route.push_str(slot.segment());
            if let Some(component) = slot.component() {
                pages.push(NavigationStackPage {
                    route: route.clone(),
                    segment: slot.segment().to_owned(),
                    component,
                    is_modal: false,
                });
            }
        }

        for slot in self.host.modal_stack(&self.sref) {
            route.push('/');
            route.push_str(slot.segment());
            if let Some(component) = slot.component() {
                pages.push(NavigationStackPage {
                    route: route.clone(),
                    segment: slot.segment().to_owned(),
                    component,
                    is_modal: true,
                });
            }
        }

        pages
    }

    /// Removes the top `count` pages from the host stacks (all of them when
    /// `None`), topmost first. Each page is marked for removal before the
    /// host removes it, so host listeners can tell these removals apart
    /// from external ones.
    pub fn remove_stack_pages(&self, count: Option<usize>) -> Result<(), HostError> {
        let removable =
            self.host.navigation_stack(&self.sref).len() + self.host.modal_stack(&self.sref).len();
        let count = count.unwrap_or(removable).min(removable);

        for _ in 0..count {
            // Re-read each iteration: the top slot moves as pages go.
            let top = self
                .host
                .modal_stack(&self.sref)
                .last()
                .cloned()
                .or_else(|| self.host.navigation_stack(&self.sref).last().cloned());
            let Some(slot) = top else { break };
            slot.mark_for_removal();
            self.host.remove_page(&self.sref, &slot)?;
        }
        Ok(())
    }

    /// Whether any page on the host stacks is marked for removal.
    pub fn has_pages_marked_for_removal(&self) -> bool {
        self.host
            .navigation_stack(&self.sref)
            .iter()
            .chain(self.host.modal_stack(&self.sref).iter())
            .any(PageSlot::is_marked_for_removal)
    }
}

/// Mirror of one content slot.
pub struct ShellContentProxy {
    segment: String,
    cref: ContentRef,
    screen: ScreenType,
    host: Arc<dyn ShellSurface>,
    parent: Weak<ShellSectionProxy>,
}

impl ShellContentProxy {
    /// Segment name of the content.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Host reference of this content.
    pub fn content_ref(&self) -> &ContentRef {
        &self.cref
    }

    /// Screen type rendered by this content's root page.
    pub fn screen(&self) -> ScreenType {
        self.screen
    }

    /// The owning section.
    pub fn parent(&self) -> Option<Arc<ShellSectionProxy>> {
        self.parent.upgrade()
    }

    /// The materialized root page slot, if any.
    pub fn page(&self) -> Option<PageSlot> {
        self.host.content_page(&self.cref)
    }

    /// Whether the content has a materialized root page.
    pub fn has_page(&self) -> bool {
        self.page().is_some()
    }

    /// Drops the content's materialized page from the host cache.
    pub fn destroy_page(&self) -> Result<(), HostError> {
        self.host.destroy_content_page(&self.cref)
    }
}

/// Mirror of the whole host surface.
pub struct ShellProxy {
    host: Arc<dyn ShellSurface>,
    items: RwLock<Vec<Arc<ShellItemProxy>>>,
}

impl ShellProxy {
    /// Observes the host's structure and builds the proxy tree.
    pub fn new(host: Arc<dyn ShellSurface>) -> Arc<Self> {
        let proxy = Arc::new(Self {
            host,
            items: RwLock::new(Vec::new()),
        });
        proxy.rebuild();
        proxy
    }

    /// Rebuilds the proxy tree from the host's current structure.
    fn rebuild(&self) {
        let structure = self.host.structure();
        let mut items = Vec::with_capacity(structure.len());

        for item_desc in structure {
            let mut sections = Vec::with_capacity(item_desc.sections.len());
            for section_desc in item_desc.sections {
                let sref = SectionRef {
                    item: item_desc.segment.clone(),
                    section: section_desc.segment.clone(),
                };
                let host = self.host.clone();
                let section = Arc::new_cyclic(|weak_section: &Weak<ShellSectionProxy>| {
                    let contents = section_desc
                        .contents
                        .iter()
                        .map(|content_desc| {
                            Arc::new(ShellContentProxy {
                                segment: content_desc.segment.clone(),
                                cref: ContentRef {
                                    item: sref.item.clone(),
                                    section: sref.section.clone(),
                                    content: content_desc.segment.clone(),
                                },
                                screen: content_desc.screen,
                                host: host.clone(),
                                parent: weak_section.clone(),
                            })
                        })
                        .collect();
                    ShellSectionProxy {
                        segment: section_desc.segment.clone(),
                        sref: sref.clone(),
                        host: host.clone(),
                        contents,
                        current: RwLock::new(None),
                    }
                });
                section.recompute_current();
                sections.push(section);
            }
            items.push(Arc::new(ShellItemProxy {
                segment: item_desc.segment,
                sections,
            }));
        }

        *self.items.write() = items;
        debug!("shell proxy tree rebuilt");
    }

    /// The top-level items.
    pub fn items(&self) -> Vec<Arc<ShellItemProxy>> {
        self.items.read().clone()
    }

    /// The currently selected item; falls back to the first one while the
    /// host has not settled.
    pub fn current_item(&self) -> Option<Arc<ShellItemProxy>> {
        let items = self.items.read();
        match self.host.current_item() {
            Some(name) => items.iter().find(|i| i.segment == name).cloned(),
            None => None,
        }
        .or_else(|| items.first().cloned())
    }

    /// The currently selected section of the current item.
    pub fn current_section(&self) -> Option<Arc<ShellSectionProxy>> {
        let item = self.current_item()?;
        match self.host.current_section(&item.segment) {
            Some(name) => item.sections.iter().find(|s| s.segment == name).cloned(),
            None => None,
        }
        .or_else(|| item.sections.first().cloned())
    }

    /// Resolves leading path segments to a content node.
    ///
    /// Tries, in order: a strict item/section/content walk, a
    /// section/content walk, and finally a surface-wide search by content
    /// segment (the shape absolute requests use — content segments are
    /// expected to be unique across the surface). Returns the content and
    /// the number of segments consumed; the rest are stack pages.
    pub fn find_content(
        &self,
        segments: &[&str],
    ) -> Result<(Arc<ShellContentProxy>, usize), NavigationError> {
        let not_found = || NavigationError::ContentNotFound {
            path: segments.join("/"),
        };
        let first = *segments.first().ok_or_else(not_found)?;
        let items = self.items.read();

        if segments.len() >= 3 {
            let found = items
                .iter()
                .find(|i| i.segment == first)
                .and_then(|item| item.sections.iter().find(|s| s.segment == segments[1]))
                .and_then(|section| {
                    section.contents.iter().find(|c| c.segment == segments[2])
                });
            if let Some(content) = found {
                return Ok((content.clone(), 3));
            }
        }

        if segments.len() >= 2 {
            let found = items
                .iter()
                .flat_map(|i| i.sections.iter())
                .find(|s| s.segment == first)
                .and_then(|section| {
                    section.contents.iter().find(|c| c.segment == segments[1])
                });
            if let Some(content) = found {
                return Ok((content.clone(), 2));
            }
        }

        items
            .iter()
            .flat_map(|i| i.sections.iter())
            .flat_map(|s| s.contents.iter())
            .find(|c| c.segment == first)
            .map(|content| (content.clone(), 1))
            .ok_or_else(not_found)
    }
}

impl ShellStructureEvents for ShellProxy {
    fn items_changed(&self) {
        self.rebuild();
    }

    fn current_item_changed(&self) {
        for item in self.items.read().iter() {
            for section in &item.sections {
                section.recompute_current();
            }
        }
    }

    fn current_content_changed(&self, section: &SectionRef) {
        for item in self.items.read().iter() {
            for candidate in &item.sections {
                if candidate.sref == *section {
                    candidate.recompute_current();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageComponent, Screen};
    use crate::shell::{ShellContentDescriptor, ShellItemDescriptor, ShellSectionDescriptor};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct InboxPage;
    impl Screen for InboxPage {}
    impl PageComponent for InboxPage {}

    struct ArchivePage;
    impl Screen for ArchivePage {}
    impl PageComponent for ArchivePage {}

    /// Minimal static host: fixed structure, preset content pages, no
    /// materializer. Enough to exercise the proxy walks and enumeration.
    struct StubShell {
        items: Vec<ShellItemDescriptor>,
        current_content: Mutex<HashMap<SectionRef, String>>,
        pages: Mutex<HashMap<ContentRef, PageSlot>>,
        nav_stack: Mutex<Vec<PageSlot>>,
        modal_stack: Mutex<Vec<PageSlot>>,
    }

    impl StubShell {
        fn new() -> Self {
            let content = |segment: &str, screen| ShellContentDescriptor {
                segment: segment.to_owned(),
                screen,
            };
            Self {
                items: vec![ShellItemDescriptor {
                    segment: "main".to_owned(),
                    sections: vec![ShellSectionDescriptor {
                        segment: "mail".to_owned(),
                        contents: vec![
                            content("InboxPage", ScreenType::of::<InboxPage>()),
                            content("ArchivePage", ScreenType::of::<ArchivePage>()),
                        ],
                    }],
                }],
                current_content: Mutex::new(HashMap::new()),
                pages: Mutex::new(HashMap::new()),
                nav_stack: Mutex::new(Vec::new()),
                modal_stack: Mutex::new(Vec::new()),
            }
        }

        fn mail_section() -> SectionRef {
            SectionRef {
                item: "main".to_owned(),
                section: "mail".to_owned(),
            }
        }

        fn inbox_content() -> ContentRef {
            ContentRef {
                item: "main".to_owned(),
                section: "mail".to_owned(),
                content: "InboxPage".to_owned(),
            }
        }
    }

    impl ShellSurface for StubShell {
        fn structure(&self) -> Vec<ShellItemDescriptor> {
            self.items.clone()
        }

        fn current_item(&self) -> Option<String> {
            None
        }

        fn current_section(&self, _item: &str) -> Option<String> {
            None
        }

        fn current_content(&self, section: &SectionRef) -> Option<String> {
            self.current_content.lock().get(section).cloned()
        }

        fn navigation_stack(&self, _section: &SectionRef) -> Vec<PageSlot> {
            self.nav_stack.lock().clone()
        }

        fn modal_stack(&self, _section: &SectionRef) -> Vec<PageSlot> {
            self.modal_stack.lock().clone()
        }

        fn content_page(&self, content: &ContentRef) -> Option<PageSlot> {
            self.pages.lock().get(content).cloned()
        }

        fn ensure_content_page(&self, content: &ContentRef) -> Result<PageSlot, HostError> {
            self.content_page(content)
                .ok_or_else(|| HostError::new("no page preset"))
        }

        fn switch_current_content(&self, content: &ContentRef) -> Result<(), HostError> {
            self.current_content
                .lock()
                .insert(content.section_ref(), content.content.clone());
            Ok(())
        }

        fn push_page(&self, _section: &SectionRef, _screen: ScreenType) -> Result<(), HostError> {
            Err(HostError::new("stub has no materializer"))
        }

        fn remove_page(&self, _section: &SectionRef, slot: &PageSlot) -> Result<(), HostError> {
            let mut modal = self.modal_stack.lock();
            if let Some(pos) = modal.iter().position(|s| s.same_slot(slot)) {
                modal.remove(pos);
                return Ok(());
            }
            let mut nav = self.nav_stack.lock();
            match nav.iter().position(|s| s.same_slot(slot)) {
                Some(pos) => {
                    nav.remove(pos);
                    Ok(())
                }
                None => Err(HostError::new("slot not on any stack")),
            }
        }

        fn destroy_content_page(&self, content: &ContentRef) -> Result<(), HostError> {
            self.pages.lock().remove(content);
            Ok(())
        }
    }

    #[test]
    fn find_content_walks_three_levels() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        let (content, consumed) = proxy
            .find_content(&["main", "mail", "ArchivePage"])
            .unwrap();
        assert_eq!(content.segment(), "ArchivePage");
        assert_eq!(consumed, 3);
    }

    #[test]
    fn find_content_walks_section_and_content() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        let (content, consumed) = proxy.find_content(&["mail", "InboxPage"]).unwrap();
        assert_eq!(content.segment(), "InboxPage");
        assert_eq!(consumed, 2);
    }

    #[test]
    fn find_content_searches_by_unique_content_segment() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        let (content, consumed) = proxy
            .find_content(&["InboxPage", "DetailPage", "MorePage"])
            .unwrap();
        assert_eq!(content.segment(), "InboxPage");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn find_content_misses_are_not_found() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        assert!(matches!(
            proxy.find_content(&["nowhere"]),
            Err(NavigationError::ContentNotFound { .. })
        ));
    }

    #[test]
    fn current_content_falls_back_to_first_child() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        let section = proxy.current_section().unwrap();
        // Host reports no current content: first child wins.
        assert_eq!(
            section.current_content().map(|c| c.segment().to_owned()),
            Some("InboxPage".to_owned())
        );
    }

    #[test]
    fn stack_is_empty_without_a_materialized_root() {
        let proxy = ShellProxy::new(Arc::new(StubShell::new()));
        let section = proxy.current_section().unwrap();
        assert!(section.get_navigation_stack(None).is_empty());
    }

    #[test]
    fn stack_accumulates_routes_and_flags_modals() {
        let host = Arc::new(StubShell::new());
        let root: PageHandle = Arc::new(InboxPage);
        let pushed: PageHandle = Arc::new(ArchivePage);
        let modal: PageHandle = Arc::new(ArchivePage);
        host.pages
            .lock()
            .insert(StubShell::inbox_content(), PageSlot::new("InboxPage", &root));
        host.nav_stack
            .lock()
            .push(PageSlot::new("DetailPage", &pushed));
        host.modal_stack.lock().push(PageSlot::new("sheet", &modal));

        let proxy = ShellProxy::new(host);
        let section = proxy.current_section().unwrap();
        let stack = section.get_navigation_stack(None);

        let routes: Vec<_> = stack.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(
            routes,
            vec![
                "//InboxPage",
                "//InboxPage/DetailPage",
                "//InboxPage/DetailPage/sheet"
            ]
        );
        assert!(!stack[1].is_modal);
        assert!(stack[2].is_modal);
    }

    #[test]
    fn non_current_content_only_yields_its_root() {
        let host = Arc::new(StubShell::new());
        let root: PageHandle = Arc::new(InboxPage);
        let archive_ref = ContentRef {
            item: "main".to_owned(),
            section: "mail".to_owned(),
            content: "ArchivePage".to_owned(),
        };
        host.pages
            .lock()
            .insert(archive_ref, PageSlot::new("ArchivePage", &root));
        let pushed: PageHandle = Arc::new(ArchivePage);
        host.nav_stack
            .lock()
            .push(PageSlot::new("DetailPage", &pushed));

        let proxy = ShellProxy::new(host);
        let section = proxy.current_section().unwrap();
        let archive = section
            .contents()
            .iter()
            .find(|c| c.segment() == "ArchivePage")
            .cloned()
            .unwrap();
        // Archive is not the current content: the live stack is not its.
        let stack = section.get_navigation_stack(Some(&archive));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].route, "//ArchivePage");
    }

    #[test]
    fn remove_stack_pages_marks_then_removes_topmost_first() {
        let host = Arc::new(StubShell::new());
        let root: PageHandle = Arc::new(InboxPage);
        host.pages
            .lock()
            .insert(StubShell::inbox_content(), PageSlot::new("InboxPage", &root));
        let a: PageHandle = Arc::new(ArchivePage);
        let b: PageHandle = Arc::new(ArchivePage);
        host.nav_stack.lock().push(PageSlot::new("a", &a));
        host.nav_stack.lock().push(PageSlot::new("b", &b));

        let proxy = ShellProxy::new(host.clone());
        let section = proxy.current_section().unwrap();
        section.remove_stack_pages(Some(1)).unwrap();

        let remaining = host.navigation_stack(&StubShell::mail_section());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].segment(), "a");

        section.remove_stack_pages(None).unwrap();
        assert!(host.navigation_stack(&StubShell::mail_section()).is_empty());
    }

    #[test]
    fn dead_components_are_skipped_in_enumeration() {
        let host = Arc::new(StubShell::new());
        let root: PageHandle = Arc::new(InboxPage);
        host.pages
            .lock()
            .insert(StubShell::inbox_content(), PageSlot::new("InboxPage", &root));
        {
            // The slot's weak association dies with this strong handle.
            let ephemeral: PageHandle = Arc::new(ArchivePage);
            host.nav_stack
                .lock()
                .push(PageSlot::new("DetailPage", &ephemeral));
        }

        let proxy = ShellProxy::new(host);
        let section = proxy.current_section().unwrap();
        let stack = section.get_navigation_stack(None);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack[0].segment, "InboxPage");
    }
}
