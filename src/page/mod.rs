//! In-memory page model
//!
//! The engine renders into named element slots instead of a browser DOM.
//! Containers are declared up front (the index page's placeholder divs);
//! mounting a component fragment registers the element ids found in its
//! HTML, and renderers address those slots directly. Child ordering is
//! tracked per container so list sorts preserve and rearrange document
//! order the way a real DOM reflow would.

use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};

/// Maximum number of queued user feedback messages
const MAX_FEEDBACK: usize = 50;

/// A single element slot
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub text: String,
    pub html: String,
    pub class_name: String,
    pub src: String,
    pub visible: bool,
}

/// A stylesheet link injected by the component loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetLink {
    pub href: String,
    pub component: String,
}

/// Severity of a user-facing feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
    Info,
}

/// A transient message surfaced to the user (the toast analog)
#[derive(Debug, Clone)]
pub struct Feedback {
    pub message: String,
    pub kind: FeedbackKind,
}

#[derive(Default)]
struct PageInner {
    elements: HashMap<String, Element>,
    /// Ordered child ids per container (document order)
    children: HashMap<String, Vec<String>>,
    /// Element ids registered by mounting a fragment into a container,
    /// so remounting replaces the previous fragment's slots
    fragment_ids: HashMap<String, Vec<String>>,
    stylesheets: Vec<StylesheetLink>,
    feedback: VecDeque<Feedback>,
}

/// Shared handle to the page model
///
/// Cheap to clone; all services hold the same page. Mutation is
/// single-writer per container by convention (each controller only
/// touches its own container's slots), the mutex just keeps the map
/// itself consistent.
#[derive(Clone, Default)]
pub struct Page {
    inner: Arc<Mutex<PageInner>>,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"id\s*=\s*["']([^"']+)["']"#).unwrap())
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bare element slot (a placeholder container)
    pub fn register(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.elements.entry(id.to_string()).or_insert(Element {
            visible: true,
            ..Element::default()
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().unwrap().elements.contains_key(id)
    }

    /// Remove an element slot (with its child list and any slots its
    /// mounted fragment registered)
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.children.remove(id);
        for children in inner.children.values_mut() {
            children.retain(|c| c != id);
        }
        if let Some(fragment_ids) = inner.fragment_ids.remove(id) {
            for fragment_id in fragment_ids {
                inner.elements.remove(&fragment_id);
            }
        }
        inner.elements.remove(id).is_some()
    }

    /// Mount HTML into a container, registering any element ids the
    /// fragment declares. Slots from a previously mounted fragment are
    /// dropped first so a remount starts clean.
    pub fn set_html(&self, id: &str, html: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elements.contains_key(id) {
            return false;
        }

        if let Some(old_ids) = inner.fragment_ids.remove(id) {
            for old in old_ids {
                inner.elements.remove(&old);
                inner.children.remove(&old);
            }
        }

        let mut registered = Vec::new();
        for capture in id_pattern().captures_iter(html) {
            let child_id = capture[1].to_string();
            if child_id != id {
                inner.elements.insert(
                    child_id.clone(),
                    Element {
                        visible: true,
                        ..Element::default()
                    },
                );
                registered.push(child_id);
            }
        }
        inner.fragment_ids.insert(id.to_string(), registered);

        if let Some(element) = inner.elements.get_mut(id) {
            element.html = html.to_string();
        }
        true
    }

    pub fn html(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.html.clone())
    }

    /// Set an element's text content; no-op when the slot is absent
    pub fn set_text(&self, id: &str, text: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                element.text = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn text(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.text.clone())
    }

    pub fn set_class(&self, id: &str, class_name: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                element.class_name = class_name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn add_class(&self, id: &str, class: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                if !element.class_name.split_whitespace().any(|c| c == class) {
                    if !element.class_name.is_empty() {
                        element.class_name.push(' ');
                    }
                    element.class_name.push_str(class);
                }
                true
            }
            None => false,
        }
    }

    pub fn remove_class(&self, id: &str, class: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                element.class_name = element
                    .class_name
                    .split_whitespace()
                    .filter(|c| *c != class)
                    .collect::<Vec<_>>()
                    .join(" ");
                true
            }
            None => false,
        }
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.class_name.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn class_name(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.class_name.clone())
    }

    pub fn set_src(&self, id: &str, src: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                element.src = src.to_string();
                true
            }
            None => false,
        }
    }

    pub fn src(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.src.clone())
    }

    pub fn set_visible(&self, id: &str, visible: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.elements.get_mut(id) {
            Some(element) => {
                element.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .elements
            .get(id)
            .map(|e| e.visible)
            .unwrap_or(false)
    }

    // ── Child lists (document order) ─────────────────────────────────

    /// Append a dynamically created child element to a container
    pub fn append_child(&self, container: &str, child_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.elements.contains_key(container) {
            return false;
        }
        inner.elements.insert(
            child_id.to_string(),
            Element {
                visible: true,
                ..Element::default()
            },
        );
        inner
            .children
            .entry(container.to_string())
            .or_default()
            .push(child_id.to_string());
        true
    }

    pub fn children(&self, container: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .children
            .get(container)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace a container's child ordering (re-appending in sorted order).
    /// Ids not currently children of the container are ignored.
    pub fn reorder_children(&self, container: &str, order: &[String]) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(current) = inner.children.get_mut(container) {
            let mut reordered: Vec<String> = order
                .iter()
                .filter(|id| current.contains(id))
                .cloned()
                .collect();
            // Anything the caller forgot keeps its relative position at the end
            for id in current.iter() {
                if !reordered.contains(id) {
                    reordered.push(id.clone());
                }
            }
            *current = reordered;
        }
    }

    /// Drop a container's children and their element slots
    pub fn clear_children(&self, container: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ids) = inner.children.remove(container) {
            for id in ids {
                inner.elements.remove(&id);
            }
        }
    }

    // ── Stylesheets ──────────────────────────────────────────────────

    /// Register an injected stylesheet link; duplicate hrefs are ignored
    pub fn add_stylesheet(&self, href: &str, component: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.stylesheets.iter().any(|s| s.href == href) {
            return false;
        }
        inner.stylesheets.push(StylesheetLink {
            href: href.to_string(),
            component: component.to_string(),
        });
        true
    }

    pub fn stylesheets(&self) -> Vec<StylesheetLink> {
        self.inner.lock().unwrap().stylesheets.clone()
    }

    /// Remove every component-injected stylesheet link
    pub fn remove_component_stylesheets(&self) {
        self.inner.lock().unwrap().stylesheets.clear();
    }

    // ── User feedback ────────────────────────────────────────────────

    /// Queue a transient user-facing message
    pub fn push_feedback(&self, message: &str, kind: FeedbackKind) {
        let mut inner = self.inner.lock().unwrap();
        if inner.feedback.len() >= MAX_FEEDBACK {
            inner.feedback.pop_front();
        }
        inner.feedback.push_back(Feedback {
            message: message.to_string(),
            kind,
        });
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        self.inner.lock().unwrap().feedback.iter().cloned().collect()
    }
}
