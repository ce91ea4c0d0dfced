//! Arena-backed Bayes tree
//!
//! Cliques live in a slot arena addressed by [`CliqueId`]. Children are held
//! by id in their parent; the parent link is a plain id and never owns
//! anything. A key index maps every frontal variable to its clique.
//!
//! Structural edits go through three steps so that the incremental updater
//! can do all fallible work before touching the tree:
//!
//! 1. [`BayesTree::plan_top`] selects the cliques to remove (read-only)
//! 2. [`BayesTree::freed_factors`] turns their conditionals back into factors
//!    (read-only, may fail)
//! 3. [`BayesTree::detach`] removes them and hands back the [`Orphans`]
//!
//! [`BayesTree::remove_top`] runs all three at once.

use std::collections::{HashMap, HashSet};

use super::clique::{Clique, CliqueId};
use crate::conditionals::Conditional;
use crate::factors::{Factor, FactorGraph};
use crate::inference::errors::{Result, StructuralError};
use crate::inference::BayesNet;
use crate::types::{Key, KeyDisplay};

/// Subtrees cut loose by [`BayesTree::remove_top`]
///
/// The cliques stay in the tree's arena but are reachable only through this
/// value until [`BayesTree::reattach`] hangs them back in.
#[must_use = "orphaned subtrees are lost unless passed to `reattach`"]
#[derive(Debug)]
pub struct Orphans {
    ids: Vec<CliqueId>,
}

impl Orphans {
    /// Root ids of the detached subtrees
    pub fn ids(&self) -> &[CliqueId] {
        &self.ids
    }

    /// Number of detached subtrees
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was detached
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Cliques selected for removal and the children that will become orphans
#[derive(Debug, Clone, Default)]
pub(crate) struct TopPlan {
    removed: Vec<CliqueId>,
    orphans: Vec<CliqueId>,
}

impl TopPlan {
    pub(crate) fn removed(&self) -> &[CliqueId] {
        &self.removed
    }

    pub(crate) fn orphans(&self) -> &[CliqueId] {
        &self.orphans
    }
}

/// Tree of cliques over a factored joint density
#[derive(Debug, Clone, Default)]
pub struct BayesTree {
    cliques: Vec<Option<Clique>>,
    free: Vec<usize>,
    index: HashMap<Key, CliqueId>,
    roots: Vec<CliqueId>,
    live: usize,
}

impl BayesTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a Bayes net in elimination order
    ///
    /// Conditionals are inserted last-eliminated first.
    pub fn from_bayes_net(net: BayesNet) -> Result<Self> {
        let mut tree = Self::new();
        for conditional in net.into_conditionals().into_iter().rev() {
            tree.insert(conditional)?;
        }
        Ok(tree)
    }

    /// Insert a conditional as a new clique
    ///
    /// A conditional without parents becomes a root. Otherwise the owners of
    /// its parent keys must all lie on one root path; the deepest of them
    /// becomes the parent.
    ///
    /// # Errors
    /// - [`StructuralError::DuplicateFrontal`] if a frontal is already owned
    /// - [`StructuralError::MissingSeparatorKey`] if a parent key has no owner
    /// - [`StructuralError::NoUniqueParent`] if the owners sit on different branches
    pub fn insert(&mut self, conditional: impl Into<Conditional>) -> Result<CliqueId> {
        let conditional = conditional.into();
        let frontals = conditional.frontals();
        if let Some(&key) = frontals.iter().find(|k| self.index.contains_key(k)) {
            return Err(StructuralError::DuplicateFrontal { key }.into());
        }
        let first = frontals.first().copied().unwrap_or_default();
        let parent = self.find_parent(first, &conditional.parents())?;

        let id = self.alloc(Clique::new(conditional));
        self.link(id, parent);
        for key in frontals {
            self.index.insert(key, id);
        }
        log::trace!(
            "inserted clique {} under {:?}",
            KeyDisplay(first),
            parent.map(CliqueId::index)
        );
        Ok(id)
    }

    /// Clique owning a key as frontal
    pub fn find(&self, key: Key) -> Option<CliqueId> {
        self.index.get(&key).copied()
    }

    /// Clique by id
    pub fn clique(&self, id: CliqueId) -> Option<&Clique> {
        self.cliques.get(id.0).and_then(Option::as_ref)
    }

    /// Root cliques
    pub fn roots(&self) -> &[CliqueId] {
        &self.roots
    }

    /// Live cliques with their ids
    pub fn cliques(&self) -> impl Iterator<Item = (CliqueId, &Clique)> {
        self.cliques
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (CliqueId(i), c)))
    }

    /// Number of cliques
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree has no cliques
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of variables in the index
    pub fn num_variables(&self) -> usize {
        self.index.len()
    }

    /// All indexed keys, sorted
    pub fn keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.index.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Conditional of the clique owning `key`
    pub fn conditional_of(&self, key: Key) -> Option<&Conditional> {
        self.find(key)
            .and_then(|id| self.clique(id))
            .map(Clique::conditional)
    }

    /// Ids from `id` up to its root, `id` first
    pub fn path_to_root(&self, id: CliqueId) -> Vec<CliqueId> {
        let mut path = vec![id];
        let mut current = self.clique(id).and_then(Clique::parent);
        while let Some(p) = current {
            path.push(p);
            current = self.clique(p).and_then(Clique::parent);
        }
        path
    }

    /// Choose the parent for a clique with the given separator
    fn find_parent(
        &self,
        frontal: Key,
        separator: &[Key],
    ) -> std::result::Result<Option<CliqueId>, StructuralError> {
        if separator.is_empty() {
            return Ok(None);
        }
        let owners = separator
            .iter()
            .map(|&key| {
                self.find(key)
                    .ok_or(StructuralError::MissingSeparatorKey { key })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut deepest: Option<(CliqueId, usize)> = None;
        for &owner in &owners {
            let depth = self.path_to_root(owner).len();
            if deepest.map_or(true, |(_, d)| depth > d) {
                deepest = Some((owner, depth));
            }
        }
        let Some((parent, _)) = deepest else {
            return Ok(None);
        };
        let path: HashSet<CliqueId> = self.path_to_root(parent).into_iter().collect();
        if owners.iter().all(|o| path.contains(o)) {
            Ok(Some(parent))
        } else {
            Err(StructuralError::NoUniqueParent {
                frontal,
                separator: separator.to_vec(),
            })
        }
    }

    fn alloc(&mut self, clique: Clique) -> CliqueId {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.cliques[slot] = Some(clique);
                CliqueId(slot)
            }
            None => {
                self.cliques.push(Some(clique));
                CliqueId(self.cliques.len() - 1)
            }
        }
    }

    fn link(&mut self, id: CliqueId, parent: Option<CliqueId>) {
        match parent {
            Some(p) => {
                if let Some(parent) = self.cliques[p.0].as_mut() {
                    parent.children.push(id);
                }
                if let Some(child) = self.cliques[id.0].as_mut() {
                    child.parent = Some(p);
                }
            }
            None => self.roots.push(id),
        }
    }

    /// Select the cliques owning `keys` and all their ancestors
    ///
    /// Unknown keys are skipped. Children of selected cliques that are not
    /// selected themselves become orphans.
    pub(crate) fn plan_top(&self, keys: &[Key]) -> TopPlan {
        let mut selected: HashSet<CliqueId> = HashSet::new();
        let mut removed = Vec::new();
        for &key in keys {
            let Some(id) = self.find(key) else { continue };
            for clique in self.path_to_root(id) {
                if !selected.insert(clique) {
                    break;
                }
                removed.push(clique);
            }
        }

        let mut orphans = Vec::new();
        for &id in &removed {
            if let Some(clique) = self.clique(id) {
                orphans.extend(
                    clique
                        .children
                        .iter()
                        .filter(|child| !selected.contains(child))
                        .copied(),
                );
            }
        }
        TopPlan { removed, orphans }
    }

    /// Conditionals of the planned cliques as plain factors
    pub(crate) fn freed_factors(&self, plan: &TopPlan) -> Result<FactorGraph> {
        plan.removed
            .iter()
            .filter_map(|&id| self.clique(id))
            .map(|clique| clique.conditional.to_factor())
            .collect::<Result<Vec<Factor>>>()
            .map(FactorGraph::from_iter)
    }

    /// Remove the planned cliques, unindex their frontals and cut the orphans loose
    pub(crate) fn detach(&mut self, plan: TopPlan) -> Orphans {
        let removed: HashSet<CliqueId> = plan.removed.iter().copied().collect();
        self.roots.retain(|r| !removed.contains(r));
        for &id in &plan.orphans {
            if let Some(orphan) = self.cliques[id.0].as_mut() {
                orphan.parent = None;
            }
        }
        for &id in &plan.removed {
            if let Some(clique) = self.cliques[id.0].take() {
                for key in clique.frontals() {
                    self.index.remove(&key);
                }
                self.free.push(id.0);
                self.live -= 1;
            }
        }
        Orphans { ids: plan.orphans }
    }

    /// Remove the top of the tree above `keys`
    ///
    /// Removes the cliques owning `keys` together with their paths to the
    /// root. Returns their conditionals as factors and the detached subtrees
    /// hanging below them. Keys not in the tree are ignored.
    ///
    /// The orphans keep their arena slots and index entries until they are
    /// handed to [`BayesTree::reattach`] or [`BayesTree::discard`]. Dropping
    /// them leaves unreachable cliques behind and `check_invariants` fails.
    pub fn remove_top(&mut self, keys: &[Key]) -> Result<(FactorGraph, Orphans)> {
        let plan = self.plan_top(keys);
        let freed = self.freed_factors(&plan)?;
        Ok((freed, self.detach(plan)))
    }

    /// Hang detached subtrees back below the clique owning their separator
    ///
    /// # Errors
    /// - [`StructuralError::OrphanReattachment`] if an orphan's separator is
    ///   owned by cliques on different branches
    /// - [`StructuralError::MissingSeparatorKey`] if a separator key has no owner
    pub fn reattach(&mut self, orphans: Orphans) -> Result<()> {
        for id in orphans.ids {
            let (frontal, separator) = match self.clique(id) {
                Some(clique) => (
                    clique.frontals().first().copied().unwrap_or_default(),
                    clique.separator(),
                ),
                None => {
                    return Err(StructuralError::BrokenInvariant {
                        description: format!("orphan slot {} is empty", id.0),
                    }
                    .into())
                }
            };
            let parent = self
                .find_parent(frontal, &separator)
                .map_err(|err| match err {
                    StructuralError::NoUniqueParent { separator, .. } => {
                        StructuralError::OrphanReattachment { separator }
                    }
                    other => other,
                })?;
            self.link(id, parent);
        }
        Ok(())
    }

    /// Free detached subtrees instead of reattaching them
    ///
    /// Every clique below each orphan root is dropped and its frontals are
    /// removed from the index.
    pub fn discard(&mut self, orphans: Orphans) {
        let mut stack = orphans.ids;
        while let Some(id) = stack.pop() {
            let Some(clique) = self.cliques.get_mut(id.0).and_then(Option::take) else {
                continue;
            };
            for key in clique.frontals() {
                self.index.remove(&key);
            }
            stack.extend(clique.children.iter().copied());
            self.free.push(id.0);
            self.live -= 1;
        }
    }

    /// Deep comparison of structure and conditionals within `tol`
    ///
    /// Cliques are matched through their first frontal key, so arena layout
    /// and child order do not matter.
    pub fn equals(&self, other: &BayesTree, tol: f64) -> bool {
        if self.len() != other.len() || self.index.len() != other.index.len() {
            return false;
        }
        let parent_key = |tree: &BayesTree, clique: &Clique| {
            clique
                .parent
                .and_then(|p| tree.clique(p))
                .and_then(|p| p.frontals().first().copied())
        };
        self.cliques().all(|(_, clique)| {
            let Some(theirs) = clique
                .frontals()
                .first()
                .and_then(|&k| other.find(k))
                .and_then(|id| other.clique(id))
            else {
                return false;
            };
            clique.conditional.equals(&theirs.conditional, tol)
                && parent_key(self, clique) == parent_key(other, theirs)
        })
    }

    /// Verify index, link and running-intersection invariants
    pub fn check_invariants(&self) -> Result<()> {
        let broken = |description: String| -> crate::inference::InferenceError {
            StructuralError::BrokenInvariant { description }.into()
        };

        for (&key, &id) in &self.index {
            let owns = self
                .clique(id)
                .is_some_and(|c| c.conditional.is_frontal(key));
            if !owns {
                return Err(broken(format!("index entry {} is stale", KeyDisplay(key))));
            }
        }

        for (id, clique) in self.cliques() {
            for key in clique.frontals() {
                if self.find(key) != Some(id) {
                    return Err(broken(format!("frontal {} is not indexed", KeyDisplay(key))));
                }
            }
            for &child in clique.children() {
                if self.clique(child).and_then(Clique::parent) != Some(id) {
                    return Err(broken(format!("child link {} -> {} is one-way", id.0, child.0)));
                }
            }
            match clique.parent {
                None => {
                    if !self.roots.contains(&id) {
                        return Err(broken(format!("clique {} is detached", id.0)));
                    }
                }
                Some(p) => {
                    let parent = self
                        .clique(p)
                        .ok_or_else(|| broken(format!("parent {} is missing", p.0)))?;
                    if !parent.children.contains(&id) {
                        return Err(broken(format!("parent link {} -> {} is one-way", id.0, p.0)));
                    }
                }
            }

            // every separator key is frontal in a strict ancestor
            let ancestors = self.path_to_root(id);
            for key in clique.separator() {
                let owner = self.find(key);
                if !owner.is_some_and(|o| ancestors[1..].contains(&o)) {
                    return Err(broken(format!(
                        "running intersection fails for {} above clique {}",
                        KeyDisplay(key),
                        id.0
                    )));
                }
            }
        }

        let mut reached = 0;
        let mut stack: Vec<CliqueId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            reached += 1;
            if let Some(clique) = self.clique(id) {
                stack.extend(clique.children.iter().copied());
            }
        }
        if reached != self.len() {
            return Err(broken(format!(
                "{} of {} cliques reachable from the roots",
                reached,
                self.len()
            )));
        }
        Ok(())
    }
}
