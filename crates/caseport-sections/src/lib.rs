//! Section tree construction.
//!
//! Turns whatever folder/suite/section listing a source system exposes into
//! the canonical [`Section`] forest and remembers which canonical id each
//! source section got. Items look their section up here by source id or by a
//! slash-separated path.

use caseport_ids::{CanonicalId, SourceId};
use caseport_ports::{SectionListing, SectionNode, SectionRecord};
use caseport_schema::section::find_in_mut;
use caseport_schema::{Section, Step};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Separator for section paths such as `feature/story`.
pub const PATH_SEPARATOR: char = '/';

/// The section forest of one export plus its lookup tables.
///
/// Lookup tables only ever grow during a run.
#[derive(Debug, Clone)]
pub struct SectionTree {
    sections: Vec<Section>,
    ids: HashMap<SourceId, CanonicalId>,
    order: Vec<SourceId>,
    paths: HashMap<String, CanonicalId>,
    default_name: String,
    default_section: Option<CanonicalId>,
}

impl SectionTree {
    /// Empty tree. The synthetic root is created on first use.
    pub fn empty(default_name: impl Into<String>) -> Self {
        Self {
            sections: Vec::new(),
            ids: HashMap::new(),
            order: Vec::new(),
            paths: HashMap::new(),
            default_name: default_name.into(),
            default_section: None,
        }
    }

    pub fn from_listing(
        listing: &SectionListing,
        root_sentinel: Option<&SourceId>,
        default_name: &str,
    ) -> Self {
        match listing {
            SectionListing::Flat(records) => Self::from_flat(records, root_sentinel, default_name),
            SectionListing::Nested(nodes) => Self::from_nested(nodes, default_name),
        }
    }

    /// Build from flat records with parent pointers.
    ///
    /// Records whose parent is `None` or `root_sentinel` are top level.
    /// Records whose parent is missing from the listing are attached at top
    /// level too.
    pub fn from_flat(
        records: &[SectionRecord],
        root_sentinel: Option<&SourceId>,
        default_name: &str,
    ) -> Self {
        let mut tree = Self::empty(default_name);
        let known: HashSet<&SourceId> = records.iter().map(|r| &r.id).collect();
        let mut children: HashMap<Option<&SourceId>, Vec<&SectionRecord>> = HashMap::new();
        for record in records {
            let parent = record
                .parent_id
                .as_ref()
                .filter(|p| Some(*p) != root_sentinel);
            children.entry(parent).or_default().push(record);
        }

        let mut visited: HashSet<&SourceId> = HashSet::new();
        let roots = children.get(&None).cloned().unwrap_or_default();
        for record in roots {
            let section = tree.build_flat(record, &children, &mut visited);
            tree.sections.extend(section);
        }

        // Orphans first so their subtrees stay intact; whatever is left sits on a parent cycle.
        let dangling = |r: &SectionRecord| r.parent_id.as_ref().is_some_and(|p| !known.contains(p));
        let (orphans, rest): (Vec<&SectionRecord>, Vec<&SectionRecord>) =
            records.iter().partition(|r| dangling(r));
        for record in orphans.into_iter().chain(rest) {
            if visited.contains(&record.id) {
                continue;
            }
            warn!(
                section = %record.id,
                parent = ?record.parent_id,
                dangling = dangling(record),
                "section is not reachable from a root; attaching at top level"
            );
            let section = tree.build_flat(record, &children, &mut visited);
            tree.sections.extend(section);
        }

        tree.seed_paths();
        tree
    }

    fn build_flat<'r>(
        &mut self,
        record: &'r SectionRecord,
        children: &HashMap<Option<&'r SourceId>, Vec<&'r SectionRecord>>,
        visited: &mut HashSet<&'r SourceId>,
    ) -> Option<Section> {
        if !visited.insert(&record.id) {
            return None;
        }
        let mut section = self.mint(&record.id, &record.name, record.description.as_deref());
        if let Some(kids) = children.get(&Some(&record.id)) {
            for kid in kids.iter().copied() {
                section
                    .sections
                    .extend(self.build_flat(kid, children, visited));
            }
        }
        Some(section)
    }

    /// Build from an already nested listing.
    pub fn from_nested(nodes: &[SectionNode], default_name: &str) -> Self {
        let mut tree = Self::empty(default_name);
        let mut visited = HashSet::new();
        for node in nodes {
            let section = tree.build_nested(node, &mut visited);
            tree.sections.extend(section);
        }
        tree.seed_paths();
        tree
    }

    fn build_nested<'n>(
        &mut self,
        node: &'n SectionNode,
        visited: &mut HashSet<&'n SourceId>,
    ) -> Option<Section> {
        if !visited.insert(&node.id) {
            warn!(section = %node.id, "section listed twice; keeping the first occurrence");
            return None;
        }
        let mut section = self.mint(&node.id, &node.name, node.description.as_deref());
        for child in &node.children {
            section.sections.extend(self.build_nested(child, visited));
        }
        Some(section)
    }

    /// New section with a fresh id, recorded before any child is built.
    fn mint(&mut self, source: &SourceId, name: &str, description: Option<&str>) -> Section {
        let mut section = Section::new(name);
        self.ids.insert(source.clone(), section.id);
        self.order.push(source.clone());
        if let Some(text) = description.filter(|d| !d.trim().is_empty()) {
            section.precondition_steps.push(Step::text(text, ""));
        }
        section
    }

    /// Make the existing tree addressable by name path.
    fn seed_paths(&mut self) {
        fn walk(prefix: &str, sections: &[Section], paths: &mut HashMap<String, CanonicalId>) {
            for s in sections {
                let path = join_path(prefix, &s.name);
                paths.entry(path.clone()).or_insert(s.id);
                walk(&path, &s.sections, paths);
            }
        }
        let mut paths = HashMap::new();
        walk("", &self.sections, &mut paths);
        self.paths = paths;
    }

    /// Canonical id of a source section, if the listing had it.
    pub fn section_for(&self, source: &SourceId) -> Option<CanonicalId> {
        self.ids.get(source).copied()
    }

    /// Id of the section at `path`, creating missing segments on the way.
    ///
    /// Empty segments are ignored; a path with no segments maps to the
    /// default section.
    pub fn ensure_path(&mut self, path: &str) -> CanonicalId {
        let segments: Vec<&str> = path
            .split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if segments.is_empty() {
            return self.default_section();
        }

        let mut prefix = String::new();
        let mut parent: Option<CanonicalId> = None;
        for segment in segments {
            prefix = join_path(&prefix, segment);
            let id = match self.paths.get(&prefix) {
                Some(id) => *id,
                None => {
                    let section = Section::new(segment);
                    let id = section.id;
                    self.attach(parent, section);
                    self.paths.insert(prefix.clone(), id);
                    debug!(path = %prefix, section = %id, "created section for path");
                    id
                }
            };
            parent = Some(id);
        }
        parent.unwrap_or_else(|| self.default_section())
    }

    /// Section for items that name none.
    ///
    /// A project without sections gets exactly one synthetic root. A project
    /// with sections gets an extra top-level section the first time an item
    /// without a section shows up.
    pub fn default_section(&mut self) -> CanonicalId {
        if let Some(id) = self.default_section {
            return id;
        }
        let id = match self.paths.get(&self.default_name) {
            Some(id) => *id,
            None => {
                let section = Section::new(self.default_name.clone());
                let id = section.id;
                self.sections.push(section);
                self.paths.insert(self.default_name.clone(), id);
                id
            }
        };
        self.default_section = Some(id);
        id
    }

    /// Resolve an item's section: path first, then source id, then default.
    pub fn resolve(&mut self, source: Option<&SourceId>, path: Option<&str>) -> CanonicalId {
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            return self.ensure_path(path);
        }
        match source {
            Some(source) => match self.section_for(source) {
                Some(id) => id,
                None => {
                    warn!(section = %source, "item names an unknown section; using the default section");
                    self.default_section()
                }
            },
            None => self.default_section(),
        }
    }

    fn attach(&mut self, parent: Option<CanonicalId>, section: Section) {
        match parent.and_then(|p| find_in_mut(&mut self.sections, p)) {
            Some(node) => node.sections.push(section),
            None => self.sections.push(section),
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Source id → canonical id for every listed section.
    pub fn id_map(&self) -> &HashMap<SourceId, CanonicalId> {
        &self.ids
    }

    /// Listed source sections in the order their ids were minted (pre-order).
    pub fn source_ids(&self) -> &[SourceId] {
        &self.order
    }

    /// Finished forest. Guarantees at least one section.
    pub fn into_sections(mut self) -> Vec<Section> {
        if self.sections.is_empty() {
            self.default_section();
        }
        self.sections
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{name}")
    }
}
