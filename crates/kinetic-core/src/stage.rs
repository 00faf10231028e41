//! # Stage Module
//!
//! Arena-based model of everything the engine reads from and writes to: the
//! element tree with its boxes, the viewport, the scroll offset and the
//! pointer. A host mirrors its real surface into a `Stage` and reads the
//! written `VisualProps` back out.
//!
//! ## Responsibilities
//! - **Element Storage**: append-only `Vec<Option<ElementNode>>` arena with `ElementId` indices.
//! - **Hierarchy**: parent/child links with cycle prevention.
//! - **Geometry**: document rects, viewport-relative rects, clamped scrolling.
//! - **Writes**: idempotent style writes with per-element write counters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::{ElementId, Paint, Rect, Viewport, VisualProps};

/// Static facts about an element used for cursor classification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementTraits {
    /// Tag name, lower case (`"a"`, `"button"`, `"section"`).
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Label shown inside the cursor ring while hovering.
    #[serde(default)]
    pub cursor_text: Option<String>,
    /// Marks a light surface (white buttons) so the cursor turns dark.
    #[serde(default)]
    pub light_bg: bool,
}

fn default_tag() -> String {
    "div".to_string()
}

impl ElementTraits {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_cursor_text(mut self, text: &str) -> Self {
        self.cursor_text = Some(text.to_string());
        self
    }

    pub fn with_light_bg(mut self) -> Self {
        self.light_bg = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Result of a style write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
    Missing,
}

/// One element of the stage.
#[derive(Clone, Debug)]
pub struct ElementNode {
    pub traits: ElementTraits,
    /// Document-space box. `None` until the host lays the element out.
    pub rect: Option<Rect>,
    /// Fixed elements ignore the scroll offset.
    pub fixed: bool,
    pub children: Vec<ElementId>,
    pub parent: Option<ElementId>,
    pub style: VisualProps,
    pub paint: Option<Paint>,
    pub text: Option<String>,
    /// Writes that changed the style.
    pub writes: u64,
    /// Writes that carried an identical value and were dropped.
    pub skipped_writes: u64,
}

impl ElementNode {
    pub fn new(traits: ElementTraits, rect: Option<Rect>) -> Self {
        Self {
            traits,
            rect,
            fixed: false,
            children: Vec::new(),
            parent: None,
            style: VisualProps::IDENTITY,
            paint: None,
            text: None,
            writes: 0,
            skipped_writes: 0,
        }
    }
}

/// The stage arena plus the global signals (viewport, scroll, pointer).
#[derive(Clone, Debug)]
pub struct Stage {
    pub nodes: Vec<Option<ElementNode>>,
    pub viewport: Viewport,
    pub document_height: f32,
    scroll_y: f32,
    pub pointer: Vec2,
    pub pointer_inside: bool,
    pub pointer_down: bool,
    pub hovered: Option<ElementId>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(Viewport::default(), 0.0)
    }
}

impl Stage {
    pub fn new(viewport: Viewport, document_height: f32) -> Self {
        Self {
            nodes: Vec::new(),
            viewport,
            document_height: document_height.max(0.0),
            scroll_y: 0.0,
            pointer: Vec2::ZERO,
            pointer_inside: false,
            pointer_down: false,
            hovered: None,
        }
    }

    /// Adds a new element and returns its ID. IDs are never reused, so a
    /// handle to a detached element keeps resolving to nothing.
    pub fn add_element(&mut self, traits: ElementTraits, rect: Option<Rect>) -> ElementId {
        self.nodes.push(Some(ElementNode::new(traits, rect)));
        self.nodes.len() - 1
    }

    /// Moves `child` under `parent`. Returns `false` for missing elements,
    /// self-parenting and links that would close a cycle.
    pub fn attach(&mut self, parent: ElementId, child: ElementId) -> bool {
        let Some(previous) = self.get(child).map(|n| n.parent) else {
            return false;
        };
        if self.ancestors(parent).any(|id| id == child) {
            return false;
        }
        if previous == Some(parent) {
            return true;
        }
        match self.get_mut(parent) {
            Some(node) => node.children.push(child),
            None => return false,
        }
        if let Some(old) = previous.and_then(|pid| self.get_mut(pid)) {
            old.children.retain(|&c| c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        true
    }

    /// Removes an element and its whole subtree from the stage. Later writes
    /// through any of their handles report `WriteOutcome::Missing`.
    pub fn detach(&mut self, id: ElementId) {
        if let Some(pid) = self.get(id).and_then(|n| n.parent) {
            if let Some(parent) = self.get_mut(pid) {
                parent.children.retain(|&c| c != id);
            }
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(node) = self.nodes.get_mut(next).and_then(Option::take) else {
                continue;
            };
            pending.extend(node.children);
            if self.hovered == Some(next) {
                self.hovered = None;
            }
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(id).and_then(|n| n.as_mut())
    }

    /// The element followed by its ancestors, innermost first.
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            stage: self,
            next: self.get(id).map(|_| id),
        }
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn max_scroll(&self) -> f32 {
        (self.document_height - self.viewport.height).max(0.0)
    }

    /// Scrolls to `y`, clamped into `[0, max_scroll]`.
    pub fn set_scroll(&mut self, y: f32) -> f32 {
        self.scroll_y = if y.is_finite() {
            y.clamp(0.0, self.max_scroll())
        } else {
            0.0
        };
        self.scroll_y
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let y = self.scroll_y;
        self.set_scroll(y);
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(node) = self.get_mut(id) {
            node.rect = Some(rect);
        }
    }

    /// Element box relative to the viewport. `None` only when the element is
    /// missing; an element that is not laid out yet measures as `Rect::ZERO`.
    pub fn viewport_rect(&self, id: ElementId) -> Option<Rect> {
        let node = self.get(id)?;
        let Some(rect) = node.rect else {
            return Some(Rect::ZERO);
        };
        if node.fixed {
            Some(rect)
        } else {
            Some(rect.translated(0.0, -self.scroll_y))
        }
    }

    /// Innermost element under a viewport point. Later siblings win.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ElementId> {
        let mut best: Option<(ElementId, usize)> = None;
        for (id, slot) in self.nodes.iter().enumerate() {
            let Some(node) = slot else {
                continue;
            };
            let Some(rect) = self.viewport_rect(id) else {
                continue;
            };
            if rect.is_empty() || node.rect.is_none() || !rect.contains(x, y) {
                continue;
            }
            let depth = self.ancestors(id).count();
            if best.map_or(true, |(_, d)| depth >= d) {
                best = Some((id, depth));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Writes a style, skipping identical values.
    pub fn write_style(&mut self, id: ElementId, props: VisualProps) -> WriteOutcome {
        let Some(node) = self.get_mut(id) else {
            return WriteOutcome::Missing;
        };
        let props = props.clamped();
        if node.style == props {
            node.skipped_writes += 1;
            WriteOutcome::Unchanged
        } else {
            node.style = props;
            node.writes += 1;
            WriteOutcome::Written
        }
    }

    pub fn write_paint(&mut self, id: ElementId, paint: Paint) -> WriteOutcome {
        let Some(node) = self.get_mut(id) else {
            return WriteOutcome::Missing;
        };
        if node.paint.as_ref() == Some(&paint) {
            node.skipped_writes += 1;
            WriteOutcome::Unchanged
        } else {
            node.paint = Some(paint);
            node.writes += 1;
            WriteOutcome::Written
        }
    }

    pub fn write_text(&mut self, id: ElementId, text: Option<&str>) -> WriteOutcome {
        let Some(node) = self.get_mut(id) else {
            return WriteOutcome::Missing;
        };
        if node.text.as_deref() == text {
            WriteOutcome::Unchanged
        } else {
            node.text = text.map(str::to_string);
            WriteOutcome::Written
        }
    }

    pub fn style(&self, id: ElementId) -> Option<VisualProps> {
        self.get(id).map(|n| n.style)
    }

    pub fn total_writes(&self) -> u64 {
        self.nodes.iter().flatten().map(|n| n.writes).sum()
    }
}

pub struct Ancestors<'a> {
    stage: &'a Stage,
    next: Option<ElementId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.stage.get(id).and_then(|n| n.parent);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::new(Viewport::new(1000.0, 800.0), 3000.0)
    }

    #[test]
    fn attach_rejects_self_parent_and_cycles() {
        let mut stage = stage();
        let a = stage.add_element(ElementTraits::default(), None);
        let b = stage.add_element(ElementTraits::default(), None);
        let c = stage.add_element(ElementTraits::default(), None);

        assert!(!stage.attach(a, a));
        assert!(stage.attach(a, b));
        assert!(stage.attach(b, c));
        assert!(!stage.attach(c, a), "cycle creation must be rejected");
        assert!(!stage.attach(99, a));
        assert_eq!(stage.get(a).unwrap().parent, None);
    }

    #[test]
    fn attach_moves_between_parents() {
        let mut stage = stage();
        let first = stage.add_element(ElementTraits::default(), None);
        let second = stage.add_element(ElementTraits::default(), None);
        let child = stage.add_element(ElementTraits::default(), None);

        assert!(stage.attach(first, child));
        assert!(stage.attach(first, child));
        assert_eq!(stage.get(first).unwrap().children, vec![child]);

        assert!(stage.attach(second, child));
        assert!(stage.get(first).unwrap().children.is_empty());
        assert_eq!(stage.get(child).unwrap().parent, Some(second));
    }

    #[test]
    fn detach_removes_subtree() {
        let mut stage = stage();
        let section = stage.add_element(ElementTraits::default(), None);
        let root = stage.add_element(ElementTraits::default(), None);
        let child = stage.add_element(ElementTraits::default(), None);
        let leaf = stage.add_element(ElementTraits::default(), None);
        stage.attach(section, root);
        stage.attach(root, child);
        stage.attach(child, leaf);
        stage.hovered = Some(leaf);

        stage.detach(root);
        assert!(stage.get(root).is_none());
        assert!(stage.get(leaf).is_none());
        assert!(stage.get(section).unwrap().children.is_empty());
        assert_eq!(stage.hovered, None);
        assert_eq!(
            stage.write_style(leaf, VisualProps::IDENTITY),
            WriteOutcome::Missing
        );

        let fresh = stage.add_element(ElementTraits::default(), None);
        assert!(![root, child, leaf].contains(&fresh));
    }

    #[test]
    fn scroll_is_clamped() {
        let mut stage = stage();
        assert_eq!(stage.set_scroll(-50.0), 0.0);
        assert_eq!(stage.set_scroll(10_000.0), 2200.0);
        assert_eq!(stage.set_scroll(f32::NAN), 0.0);

        let mut short = Stage::new(Viewport::new(1000.0, 800.0), 500.0);
        assert_eq!(short.max_scroll(), 0.0);
        assert_eq!(short.set_scroll(100.0), 0.0);
    }

    #[test]
    fn viewport_rect_follows_scroll_unless_fixed() {
        let mut stage = stage();
        let flowing = stage.add_element(
            ElementTraits::default(),
            Some(Rect::new(0.0, 1000.0, 100.0, 100.0)),
        );
        let fixed = stage.add_element(
            ElementTraits::default(),
            Some(Rect::new(0.0, 0.0, 100.0, 2.0)),
        );
        stage.get_mut(fixed).unwrap().fixed = true;
        let unmeasured = stage.add_element(ElementTraits::default(), None);

        stage.set_scroll(400.0);
        assert_eq!(stage.viewport_rect(flowing).unwrap().top, 600.0);
        assert_eq!(stage.viewport_rect(fixed).unwrap().top, 0.0);
        assert_eq!(stage.viewport_rect(unmeasured), Some(Rect::ZERO));
        assert_eq!(stage.viewport_rect(99), None);
    }

    #[test]
    fn identical_writes_are_skipped() {
        let mut stage = stage();
        let id = stage.add_element(ElementTraits::default(), None);
        let props = VisualProps::hidden();

        assert_eq!(stage.write_style(id, props), WriteOutcome::Written);
        let before = stage.style(id);
        assert_eq!(stage.write_style(id, props), WriteOutcome::Unchanged);
        assert_eq!(stage.style(id), before);

        let node = stage.get(id).unwrap();
        assert_eq!((node.writes, node.skipped_writes), (1, 1));
        assert_eq!(stage.write_style(42, props), WriteOutcome::Missing);
    }

    #[test]
    fn hit_test_prefers_innermost() {
        let mut stage = stage();
        let section = stage.add_element(
            ElementTraits::tag("section"),
            Some(Rect::new(0.0, 0.0, 1000.0, 800.0)),
        );
        let button = stage.add_element(
            ElementTraits::tag("button"),
            Some(Rect::new(100.0, 100.0, 200.0, 50.0)),
        );
        stage.attach(section, button);

        assert_eq!(stage.hit_test(150.0, 120.0), Some(button));
        assert_eq!(stage.hit_test(600.0, 600.0), Some(section));
        assert_eq!(stage.hit_test(600.0, 900.0), None);
    }
}
