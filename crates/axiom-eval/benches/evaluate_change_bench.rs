//! Throughput of `evaluate_change` over a synthetic entity with a handful
//! of updated `OneOf`-constrained claims. Mirrors the teacher's
//! `drift-storage::benches::engine_benchmark` shape (seed a fixture,
//! bench the public trait surface, no `harness`-managed test assertions).

use std::sync::Arc;

use axiom_constraints::{ConstraintsStore, PropertyDatatype};
use axiom_core::{
    CollaboratorError, EntityId, EntityStore, HttpClient, HttpResponse, Rank, Revision, SnakType, SparqlClient,
    SparqlRow, Value,
};
use axiom_eval::{ConstraintEvaluator, PropertyDatatypes};
use criterion::{criterion_group, criterion_main, Criterion};

struct EmptyStore;

impl EntityStore for EmptyStore {
    fn load(&self, id: &EntityId) -> Result<Revision, CollaboratorError> {
        Ok(Revision {
            entity_id: id.clone(),
            revision_id: 1,
            claims: indexmap::IndexMap::new(),
            labels: rustc_hash::FxHashMap::default(),
            descriptions: rustc_hash::FxHashMap::default(),
        })
    }
    fn load_old_revision(&self, id: &EntityId, _revision_id: u64) -> Result<Revision, CollaboratorError> {
        self.load(id)
    }
}

struct NullSparql;
impl SparqlClient for NullSparql {
    fn ask(&self, _query: &str) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
    fn select(&self, _query: &str) -> Result<Vec<SparqlRow>, CollaboratorError> {
        Ok(Vec::new())
    }
}

struct NullHttp;
impl HttpClient for NullHttp {
    fn get(&self, _url: &str) -> Result<HttpResponse, CollaboratorError> {
        Ok(HttpResponse { ok: false, status: 0 })
    }
}

struct AllOther;
impl PropertyDatatypes for AllOther {
    fn datatype_of(&self, _prop: &str) -> PropertyDatatype {
        PropertyDatatype::Other
    }
}

fn claim(id: &str, property: &str, target: Option<Value>) -> axiom_core::Claim {
    axiom_core::Claim {
        id: id.to_string(),
        on_item: EntityId::from("Q1"),
        property: property.to_string(),
        snak_type: SnakType::Value,
        target,
        rank: Rank::Normal,
        qualifiers: indexmap::IndexMap::new(),
        sources: Vec::new(),
        is_qualifier: false,
        is_reference: false,
    }
}

fn revision(claims: Vec<axiom_core::Claim>) -> Revision {
    let mut map: indexmap::IndexMap<String, Vec<axiom_core::Claim>> = indexmap::IndexMap::new();
    for c in claims {
        map.entry(c.property.clone()).or_default().push(c);
    }
    Revision {
        entity_id: EntityId::from("Q1"),
        revision_id: 1,
        claims: map,
        labels: rustc_hash::FxHashMap::default(),
        descriptions: rustc_hash::FxHashMap::default(),
    }
}

fn bench_evaluate_change(c: &mut Criterion) {
    let store = ConstraintsStore::new(Arc::new(EmptyStore), Arc::new(NullSparql), Arc::new(NullHttp), Default::default());
    let evaluator = ConstraintEvaluator::new(store, Arc::new(AllOther));

    let old = revision((0..20).map(|i| claim(&format!("c{i}"), &format!("P{i}"), Some(Value::Str(format!("old{i}"))))).collect());
    let new = revision((0..20).map(|i| claim(&format!("c{i}"), &format!("P{i}"), Some(Value::Str(format!("new{i}"))))).collect());

    c.bench_function("evaluate_change_20_updated_claims", |b| {
        b.iter(|| evaluator.evaluate_change(&old, &new, None).unwrap())
    });

    c.bench_function("evaluate_entity_20_claims", |b| b.iter(|| evaluator.evaluate_entity(&new).unwrap()));
}

criterion_group!(benches, bench_evaluate_change);
criterion_main!(benches);
