//! Bulk discovery of which candidate properties declare a given constraint
//! type (spec §4.2). Mirrors `evaluator.py::get_item_constraints`'s
//! loaded-vs-uncached split: properties whose constraints are already
//! cached are checked locally; the rest are resolved with a single batched
//! SPARQL query rather than one `get_constraints` call each.

use axiom_core::PropertyId;

use crate::predicate::PredicateTag;
use crate::sparql::{discovery_query_conditional, discovery_query_unconditional};
use crate::store::parse::PropertyDatatype;
use crate::store::{ConstraintsStore, StoreError};

impl ConstraintsStore {
    /// Which of `candidates` declare a constraint tagged `tag` (addressed by
    /// its `P2302` target item `constraint_item`). `changed`, when given,
    /// restricts the batched query to declarations whose `P2306`
    /// related-property qualifier names one of the changed properties —
    /// used by `SubjectType`'s dispatch, which only cares when `P31`/`P279`
    /// moved.
    pub fn get_item_constraints(
        &self,
        candidates: &[PropertyId],
        tag: PredicateTag,
        constraint_item: &str,
        changed: Option<&[PropertyId]>,
    ) -> Result<Vec<PropertyId>, StoreError> {
        let mut found = Vec::new();
        let mut uncached = Vec::new();
        {
            let cache = self.cache.read().expect("constraint cache lock poisoned");
            for prop in candidates {
                match cache.get(prop) {
                    Some(constraints) => {
                        if constraints.iter().any(|c| c.predicate.tag() == tag) {
                            found.push(prop.clone());
                        }
                    }
                    None => uncached.push(prop.clone()),
                }
            }
        }

        if uncached.is_empty() {
            return Ok(found);
        }

        if uncached.len() < self.config.effective_item_constraint_batch_threshold() {
            tracing::debug!(count = uncached.len(), ?tag, "loading item constraints individually, below batch threshold");
            for prop in &uncached {
                let constraints = self.get_constraints(prop, PropertyDatatype::Other)?;
                if constraints.iter().any(|c| c.predicate.tag() == tag) {
                    found.push(prop.clone());
                }
            }
            return Ok(found);
        }

        tracing::debug!(count = uncached.len(), ?tag, "batching SPARQL item constraint discovery query");
        let query = match changed {
            Some(changed) => discovery_query_conditional(&uncached, changed, constraint_item),
            None => discovery_query_unconditional(&uncached, constraint_item),
        };
        let hits = self.sparql.select_entities(&query, "prop")?;
        found.extend(hits.into_iter().map(|id| id.as_str().to_string()));
        Ok(found)
    }
}
