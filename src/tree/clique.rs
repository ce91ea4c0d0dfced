//! Cliques of a Bayes tree

use smallvec::SmallVec;

use crate::conditionals::Conditional;
use crate::types::Key;

/// Index of a clique in its tree's arena
///
/// Ids are only meaningful for the tree that issued them and may be reused
/// after the clique is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CliqueId(pub(crate) usize);

impl CliqueId {
    /// Arena slot
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the Bayes tree holding one conditional
///
/// The frontal keys of the conditional are owned by this clique; its parent
/// keys form the separator.
#[derive(Debug, Clone)]
pub struct Clique {
    pub(crate) conditional: Conditional,
    pub(crate) parent: Option<CliqueId>,
    pub(crate) children: SmallVec<[CliqueId; 4]>,
}

impl Clique {
    pub(crate) fn new(conditional: Conditional) -> Self {
        Self {
            conditional,
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Conditional stored in the clique
    pub fn conditional(&self) -> &Conditional {
        &self.conditional
    }

    /// Frontal keys
    pub fn frontals(&self) -> Vec<Key> {
        self.conditional.frontals()
    }

    /// Separator keys
    pub fn separator(&self) -> Vec<Key> {
        self.conditional.parents()
    }

    /// Parent clique, `None` for a root or a detached orphan
    pub fn parent(&self) -> Option<CliqueId> {
        self.parent
    }

    /// Child cliques
    pub fn children(&self) -> &[CliqueId] {
        &self.children
    }

    /// Whether the clique has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
