// ==========================================
// Production Output Core - genealogy tracker
// ==========================================
// Derives the parent set for an output lot's lineage edges. One edge
// per distinct input lot, however many drawdowns referenced it. A
// duplicate (parent, child) pair inside one registration is a bug in
// the caller's write set, so it is rejected rather than deduplicated.
// ==========================================

use crate::engine::allocation::AllocationPlan;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenealogyError {
    #[error("duplicate genealogy edge for parent lot {0} within one registration")]
    DuplicateEdge(String),
}

// ==========================================
// GenealogyTracker
// ==========================================
pub struct GenealogyTracker;

impl GenealogyTracker {
    pub fn new() -> Self {
        Self
    }

    /// Distinct input lot ids referenced by the plan, in first-draw order.
    /// Multiple lines against the same lot collapse to a single parent.
    pub fn derive_parents(&self, plan: &AllocationPlan) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut parents = Vec::new();
        for line in &plan.lines {
            if seen.insert(line.lp_id.clone()) {
                parents.push(line.lp_id.clone());
            }
        }
        parents
    }

    /// All edges of one registration share the same child lot, so a
    /// repeated parent id means a repeated (parent, child) pair.
    pub fn validate(&self, parents: &[String]) -> Result<(), GenealogyError> {
        let mut seen = HashSet::new();
        for parent in parents {
            if !seen.insert(parent.as_str()) {
                return Err(GenealogyError::DuplicateEdge(parent.clone()));
            }
        }
        Ok(())
    }
}

impl Default for GenealogyTracker {
    fn default() -> Self {
        Self::new()
    }
}
