//! The list of video files and their checked state
//!
//! Items live in an arena and are addressed by `ItemId`. Each node keeps its
//! parent and an ordered child list, so the store can hold a tree even though
//! the shell only ever builds a flat list.

use std::path::{Path, PathBuf};

use super::aggregate::format_duration;
use super::error::ProbeError;
use crate::probe::{DurationProber, checked_duration};

/// Stable handle to an item, never reused within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(usize);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single video file in the list
#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub id: ItemId,
    /// Full path, shown as supplementary info next to the name
    pub path: PathBuf,
    /// Base name of the path
    pub display_name: String,
    pub checked: bool,
    /// Duration read when the item was added (never negative)
    pub duration_seconds: f64,
    parent: Option<ItemId>,
    children: Vec<ItemId>,
}

impl VideoItem {
    fn new(id: ItemId, path: &Path, duration_seconds: f64, parent: Option<ItemId>) -> Self {
        Self {
            id,
            path: path.to_path_buf(),
            display_name: display_name_for(path),
            checked: false,
            duration_seconds,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    #[cfg(test)]
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// Duration as HH:MM:SS
    pub fn duration_text(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

/// Probe a file, rejecting durations that cannot be stored
fn probe_checked(path: &Path, prober: &dyn DurationProber) -> Result<f64, ProbeError> {
    prober
        .probe(path)
        .and_then(|seconds| checked_duration(path, seconds))
}

/// Base name of a path, falling back to the whole path
fn display_name_for(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Ordered collection of video items
#[derive(Debug, Default)]
pub struct ItemStore {
    /// Arena slots; removed items leave `None` behind so ids stay unique
    nodes: Vec<Option<VideoItem>>,
    /// Top-level items in display order
    roots: Vec<ItemId>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe `path` and append it to the top level, unchecked
    ///
    /// On a probe failure the store is left untouched.
    pub fn add(
        &mut self,
        path: &Path,
        prober: &dyn DurationProber,
    ) -> Result<&VideoItem, ProbeError> {
        let duration = probe_checked(path, prober)?;
        Ok(self.insert(path, duration, None))
    }

    /// Probe `path` and append it as the last child of `parent`
    ///
    /// Returns `None` if `parent` is not in the store.
    pub fn add_child(
        &mut self,
        parent: ItemId,
        path: &Path,
        prober: &dyn DurationProber,
    ) -> Option<Result<&VideoItem, ProbeError>> {
        self.get(parent)?;
        let duration = match probe_checked(path, prober) {
            Ok(d) => d,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(self.insert(path, duration, Some(parent))))
    }

    fn insert(&mut self, path: &Path, duration: f64, parent: Option<ItemId>) -> &VideoItem {
        // Ids are arena slots and never reused
        let id = ItemId(self.nodes.len());

        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }

        log::debug!("Added {} {} ({:.3}s)", id, path.display(), duration);
        self.nodes.push(None);
        self.nodes[id.0].insert(VideoItem::new(id, path, duration, parent))
    }

    pub fn get(&self, id: ItemId) -> Option<&VideoItem> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut VideoItem> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    /// Number of items at any depth
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Remove every item (ids are still not reused afterwards)
    pub fn clear(&mut self) {
        // Keep the slots so ids handed out earlier stay dead
        for slot in &mut self.nodes {
            *slot = None;
        }
        self.roots.clear();
    }

    /// Returns false if the item does not exist
    pub fn set_checked(&mut self, id: ItemId, checked: bool) -> bool {
        match self.get_mut(id) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }

    /// Flip the checked flag, returning the new value
    pub fn toggle(&mut self, id: ItemId) -> Option<bool> {
        let item = self.get_mut(id)?;
        item.checked = !item.checked;
        Some(item.checked)
    }

    pub fn check_all(&mut self, checked: bool) {
        for item in self.nodes.iter_mut().flatten() {
            item.checked = checked;
        }
    }

    /// Ids of checked items in flatten order
    pub fn checked_ids(&self) -> Vec<ItemId> {
        self.flatten()
            .into_iter()
            .filter(|item| item.checked)
            .map(|item| item.id)
            .collect()
    }

    /// Every item, depth first, parents before children, siblings in order
    pub fn flatten(&self) -> Vec<&VideoItem> {
        let mut out = Vec::with_capacity(self.nodes.len());
        // Reversed pushes so the first sibling pops first
        let mut stack: Vec<ItemId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if let Some(item) = self.get(id) {
                out.push(item);
                stack.extend(item.children.iter().rev().copied());
            }
        }
        out
    }

    /// Remove every checked item at any depth
    ///
    /// A checked item is detached from its parent (or the top level) together
    /// with its whole subtree, so unchecked descendants of a checked item go
    /// with it. Remaining siblings keep their relative order.
    ///
    /// Returns the removed items in flatten order.
    pub fn remove_checked(&mut self) -> Vec<VideoItem> {
        let targets = self.checked_ids();
        let mut removed = Vec::new();

        for id in targets {
            // Already gone as part of a checked ancestor's subtree
            let Some(parent) = self.get(id).map(|item| item.parent) else {
                continue;
            };

            match parent {
                Some(parent) => {
                    if let Some(parent_node) = self.get_mut(parent) {
                        parent_node.children.retain(|c| *c != id);
                    }
                }
                None => self.roots.retain(|r| *r != id),
            }

            removed.extend(self.take_subtree(id));
        }

        if !removed.is_empty() {
            log::debug!("Removed {} items", removed.len());
        }
        removed
    }

    /// Take `id` and all of its descendants out of the arena, pre-order
    fn take_subtree(&mut self, id: ItemId) -> Vec<VideoItem> {
        let mut out = Vec::new();
        let mut stack = vec![id];

        while let Some(next) = stack.pop() {
            if let Some(item) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(item.children.iter().rev().copied());
                out.push(item);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FakeProber;

    fn names(items: &[&VideoItem]) -> Vec<String> {
        items.iter().map(|i| i.display_name.clone()).collect()
    }

    fn prober_for(paths: &[(&str, f64)]) -> FakeProber {
        paths
            .iter()
            .fold(FakeProber::new(), |p, (path, secs)| p.with(Path::new(path), *secs))
    }

    #[test]
    fn test_store_new() {
        let store = ItemStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.flatten().is_empty());
    }

    #[test]
    fn test_add_appends_unchecked_item() {
        let prober = prober_for(&[("/videos/intro.mp4", 61.5)]);
        let mut store = ItemStore::new();

        let item = store.add(Path::new("/videos/intro.mp4"), &prober).unwrap();

        assert_eq!(item.display_name, "intro.mp4");
        assert_eq!(item.path, PathBuf::from("/videos/intro.mp4"));
        assert!(!item.checked);
        assert_eq!(item.duration_seconds, 61.5);
        assert_eq!(item.duration_text(), "00:01:01");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_failure_leaves_store_untouched() {
        let prober = FakeProber::new().failing(Path::new("/videos/bad.avi"), "corrupt header");
        let mut store = ItemStore::new();

        let err = store.add(Path::new("/videos/bad.avi"), &prober).unwrap_err();

        assert_eq!(err.path, PathBuf::from("/videos/bad.avi"));
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_add_rejects_unusable_durations() {
        let prober = FakeProber::new()
            .with(Path::new("/videos/negative.mp4"), -5.0)
            .with(Path::new("/videos/nan.mp4"), f64::NAN)
            .with(Path::new("/videos/endless.mp4"), f64::INFINITY);
        let mut store = ItemStore::new();

        for name in ["/videos/negative.mp4", "/videos/nan.mp4", "/videos/endless.mp4"] {
            let err = store.add(Path::new(name), &prober).unwrap_err();
            assert_eq!(err.path, PathBuf::from(name));
        }
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_add_child_rejects_negative_duration() {
        let prober = prober_for(&[("/videos/a.mp4", 10.0), ("/videos/b.mp4", -1.0)]);
        let mut store = ItemStore::new();
        let parent = store.add(Path::new("/videos/a.mp4"), &prober).unwrap().id;

        let result = store.add_child(parent, Path::new("/videos/b.mp4"), &prober).unwrap();

        assert!(result.unwrap_err().message.contains("negative"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_path_can_be_added_twice() {
        let prober = prober_for(&[("/videos/a.mp4", 10.0)]);
        let mut store = ItemStore::new();

        let first = store.add(Path::new("/videos/a.mp4"), &prober).unwrap().id;
        let second = store.add(Path::new("/videos/a.mp4"), &prober).unwrap().id;

        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_child_to_unknown_parent() {
        let prober = prober_for(&[("/a.mp4", 1.0)]);
        let mut store = ItemStore::new();
        let parent = store.add(Path::new("/a.mp4"), &prober).unwrap().id;
        store.set_checked(parent, true);
        store.remove_checked();

        assert!(store.add_child(parent, Path::new("/a.mp4"), &prober).is_none());
    }

    #[test]
    fn test_flatten_parent_before_children() {
        let prober = prober_for(&[
            ("/v/parent.mkv", 1.0),
            ("/v/child1.mkv", 2.0),
            ("/v/child2.mkv", 3.0),
            ("/v/leaf.mkv", 4.0),
        ]);
        let mut store = ItemStore::new();
        let parent = store.add(Path::new("/v/parent.mkv"), &prober).unwrap().id;
        store.add_child(parent, Path::new("/v/child1.mkv"), &prober).unwrap().unwrap();
        store.add_child(parent, Path::new("/v/child2.mkv"), &prober).unwrap().unwrap();
        store.add(Path::new("/v/leaf.mkv"), &prober).unwrap();

        assert_eq!(
            names(&store.flatten()),
            vec!["parent.mkv", "child1.mkv", "child2.mkv", "leaf.mkv"]
        );
    }

    #[test]
    fn test_flatten_nested_depth_first() {
        let prober = prober_for(&[("/a", 1.0), ("/b", 1.0), ("/c", 1.0), ("/d", 1.0), ("/e", 1.0)]);
        let mut store = ItemStore::new();
        let a = store.add(Path::new("/a"), &prober).unwrap().id;
        let b = store.add_child(a, Path::new("/b"), &prober).unwrap().unwrap().id;
        store.add_child(b, Path::new("/c"), &prober).unwrap().unwrap();
        store.add_child(a, Path::new("/d"), &prober).unwrap().unwrap();
        store.add(Path::new("/e"), &prober).unwrap();

        assert_eq!(names(&store.flatten()), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(store.get(b).unwrap().parent(), Some(a));
        assert_eq!(store.get(a).unwrap().children().len(), 2);
    }

    #[test]
    fn test_remove_checked_keeps_order() {
        let prober = prober_for(&[("/v/A.mp4", 1.0), ("/v/B.mp4", 2.0), ("/v/C.mp4", 3.0)]);
        let mut store = ItemStore::new();
        let a = store.add(Path::new("/v/A.mp4"), &prober).unwrap().id;
        store.add(Path::new("/v/B.mp4"), &prober).unwrap();
        let c = store.add(Path::new("/v/C.mp4"), &prober).unwrap().id;
        store.set_checked(a, true);
        store.set_checked(c, true);

        let removed = store.remove_checked();

        assert_eq!(removed.len(), 2);
        assert_eq!(names(&store.flatten()), vec!["B.mp4"]);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn test_remove_checked_child_only() {
        let prober = prober_for(&[("/p", 1.0), ("/c1", 1.0), ("/c2", 1.0), ("/c3", 1.0)]);
        let mut store = ItemStore::new();
        let p = store.add(Path::new("/p"), &prober).unwrap().id;
        store.add_child(p, Path::new("/c1"), &prober).unwrap().unwrap();
        let c2 = store.add_child(p, Path::new("/c2"), &prober).unwrap().unwrap().id;
        store.add_child(p, Path::new("/c3"), &prober).unwrap().unwrap();
        store.set_checked(c2, true);

        store.remove_checked();

        assert_eq!(names(&store.flatten()), vec!["p", "c1", "c3"]);
        assert_eq!(store.get(p).unwrap().children().len(), 2);
    }

    #[test]
    fn test_remove_checked_parent_takes_unchecked_children() {
        let prober = prober_for(&[("/p", 1.0), ("/c1", 1.0), ("/c2", 1.0), ("/leaf", 1.0)]);
        let mut store = ItemStore::new();
        let p = store.add(Path::new("/p"), &prober).unwrap().id;
        let c1 = store.add_child(p, Path::new("/c1"), &prober).unwrap().unwrap().id;
        let c2 = store.add_child(p, Path::new("/c2"), &prober).unwrap().unwrap().id;
        store.add(Path::new("/leaf"), &prober).unwrap();
        store.set_checked(p, true);
        store.set_checked(c2, true);

        let removed = store.remove_checked();

        let removed_ids: Vec<ItemId> = removed.iter().map(|i| i.id).collect();
        assert_eq!(removed_ids, vec![p, c1, c2]);
        assert_eq!(names(&store.flatten()), vec!["leaf"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_with_nothing_checked() {
        let prober = prober_for(&[("/a", 1.0)]);
        let mut store = ItemStore::new();
        store.add(Path::new("/a"), &prober).unwrap();

        assert!(store.remove_checked().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let prober = prober_for(&[("/a", 1.0), ("/b", 1.0)]);
        let mut store = ItemStore::new();
        let a = store.add(Path::new("/a"), &prober).unwrap().id;
        store.set_checked(a, true);
        store.remove_checked();

        let b = store.add(Path::new("/b"), &prober).unwrap().id;
        assert_ne!(a, b);
        assert!(store.get(a).is_none());
    }

    #[test]
    fn test_toggle_and_check_all() {
        let prober = prober_for(&[("/a", 1.0), ("/b", 1.0)]);
        let mut store = ItemStore::new();
        let a = store.add(Path::new("/a"), &prober).unwrap().id;
        let b = store.add(Path::new("/b"), &prober).unwrap().id;

        assert_eq!(store.toggle(a), Some(true));
        assert_eq!(store.checked_ids(), vec![a]);

        store.check_all(true);
        assert_eq!(store.checked_ids(), vec![a, b]);

        store.check_all(false);
        assert!(store.checked_ids().is_empty());
    }

    #[test]
    fn test_clear() {
        let prober = prober_for(&[("/a", 1.0)]);
        let mut store = ItemStore::new();
        let a = store.add(Path::new("/a"), &prober).unwrap().id;

        store.clear();

        assert!(store.is_empty());
        assert!(!store.set_checked(a, true));
        assert_eq!(store.toggle(a), None);
    }

    #[test]
    fn test_display_name_without_file_name() {
        assert_eq!(display_name_for(Path::new("/")), "/");
        assert_eq!(display_name_for(Path::new("clip.mov")), "clip.mov");
    }
}
