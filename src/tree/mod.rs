//! Bayes tree of cliques
//!
//! - [`BayesTree`] - arena of cliques with a frontal-key index
//! - [`Clique`] - one conditional plus parent and child links
//! - [`Orphans`] - subtrees detached by [`BayesTree::remove_top`]
//!
//! [`BayesTree::choose`] and [`BayesTree::optimize`] resolve a hybrid tree
//! under a discrete assignment.

pub mod bayes_tree;
pub mod clique;
mod hybrid;

pub use bayes_tree::{BayesTree, Orphans};
pub use clique::{Clique, CliqueId};
