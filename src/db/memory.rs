//! In-memory document store
//!
//! Used in dev mode when MongoDB is unreachable and by the test suite. It
//! evaluates the subset of the MongoDB query language this service issues:
//!
//! - filters: equality, `$eq $ne $gt $gte $lt $lte $in $nin $exists`, `$and`,
//!   `$or`, dotted paths
//! - updates: `$set $unset $inc`
//! - pipelines: `$match $group $sort $skip $limit`, with `$sum` accumulators
//!   and `$year`/`$month`/`$dayOfMonth` date expressions
//!
//! Anything else is rejected with a store error rather than silently ignored.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, DateTime, Document};
use chrono::Datelike;
use dashmap::DashMap;
use std::cmp::Ordering;
use tracing::warn;

use crate::db::store::{id_to_string, stamp_updated_at, DocumentStore, FindSpec};
use crate::types::{ApiError, Result};

/// Document store held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        warn!("Document store running in memory-only mode (no MongoDB)");
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<String> {
        if !doc.contains_key("_id") {
            doc.insert("_id", ObjectId::new());
        }
        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(ApiError::Store(format!(
                "Insert failed: duplicate key {} in '{}'",
                id, collection
            )));
        }
        docs.push(doc);

        Ok(id_to_string(&id))
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        for doc in docs.iter() {
            if matches(doc, &filter)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> Result<Vec<Document>> {
        let mut results = Vec::new();
        if let Some(docs) = self.collections.get(collection) {
            for doc in docs.iter() {
                if matches(doc, &filter)? {
                    results.push(doc.clone());
                }
            }
        }

        if let Some(sort) = &spec.sort {
            sort_documents(&mut results, sort);
        }
        if let Some(skip) = spec.skip {
            let skip = usize::try_from(skip).unwrap_or(usize::MAX).min(results.len());
            results.drain(..skip);
        }
        if let Some(limit) = spec.limit {
            // MongoDB treats 0 as "no limit" and a negative limit like its absolute value
            let limit = limit.unsigned_abs() as usize;
            if limit > 0 {
                results.truncate(limit);
            }
        }

        Ok(results)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        mut patch: Document,
    ) -> Result<u64> {
        stamp_updated_at(&mut patch, DateTime::now());

        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        for doc in docs.iter_mut() {
            if matches(doc, &filter)? {
                apply_update(doc, &patch)?;
                return Ok(1);
            }
        }
        Ok(0)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut position = None;
        for (i, doc) in docs.iter().enumerate() {
            if matches(doc, &filter)? {
                position = Some(i);
                break;
            }
        }
        match position {
            Some(i) => {
                docs.remove(i);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, collection: &str, filter: Option<Document>) -> Result<u64> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(0);
        };
        let filter = filter.unwrap_or_default();
        let mut count = 0;
        for doc in docs.iter() {
            if matches(doc, &filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| docs.value().clone())
            .unwrap_or_default();

        for stage in &pipeline {
            docs = run_stage(docs, stage)?;
        }
        Ok(docs)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Paths and comparison
// =============================================================================

/// Resolve a dotted path inside a document
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Cross-type ordering bracket, lowest first
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 1,
        Bson::String(_) | Bson::Symbol(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::ObjectId(_) => 5,
        Bson::Boolean(_) => 6,
        Bson::DateTime(_) => 7,
        _ => 8,
    }
}

fn compare(a: &Bson, b: &Bson) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.timestamp_millis().cmp(&y.timestamp_millis()),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Document(x), Bson::Document(y)) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
                let ord = kx.cmp(ky).then_with(|| compare(vx, vy));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn values_equal(a: Option<&Bson>, b: &Bson) -> bool {
    let a = a.unwrap_or(&Bson::Null);
    type_rank(a) == type_rank(b) && compare(a, b) == Ordering::Equal
}

/// Range comparison; only values of the same type bracket are comparable
fn range_matches(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    match value {
        Some(v) if type_rank(v) == type_rank(operand) => accept(compare(v, operand)),
        _ => false,
    }
}

fn sort_documents(docs: &mut [Document], sort: &Document) {
    docs.sort_by(|a, b| {
        for (key, direction) in sort {
            let descending = as_f64(direction).map(|d| d < 0.0).unwrap_or(false);
            let va = lookup(a, key).unwrap_or(&Bson::Null);
            let vb = lookup(b, key).unwrap_or(&Bson::Null);
            let ord = compare(va, vb);
            let ord = if descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

// =============================================================================
// Filters
// =============================================================================

fn is_operator_document(value: &Bson) -> bool {
    match value {
        Bson::Document(d) => d.keys().next().map(|k| k.starts_with('$')).unwrap_or(false),
        _ => false,
    }
}

fn matches(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => all_clauses(doc, condition, true)?,
            "$or" => all_clauses(doc, condition, false)?,
            op if op.starts_with('$') => {
                return Err(ApiError::Store(format!("Unsupported query operator {}", op)));
            }
            path => {
                let value = lookup(doc, path);
                if is_operator_document(condition) {
                    operators_match(value, condition)?
                } else {
                    values_equal(value, condition)
                }
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `$and` when `require_all`, `$or` otherwise
fn all_clauses(doc: &Document, clauses: &Bson, require_all: bool) -> Result<bool> {
    let Bson::Array(clauses) = clauses else {
        return Err(ApiError::Store("$and/$or expects an array".into()));
    };
    for clause in clauses {
        let Bson::Document(clause) = clause else {
            return Err(ApiError::Store("$and/$or clauses must be documents".into()));
        };
        let hit = matches(doc, clause)?;
        if require_all && !hit {
            return Ok(false);
        }
        if !require_all && hit {
            return Ok(true);
        }
    }
    Ok(require_all)
}

fn operators_match(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let Bson::Document(ops) = condition else {
        return Ok(false);
    };
    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => values_equal(value, operand),
            "$ne" => !values_equal(value, operand),
            "$gt" => range_matches(value, operand, |o| o == Ordering::Greater),
            "$gte" => range_matches(value, operand, |o| o != Ordering::Less),
            "$lt" => range_matches(value, operand, |o| o == Ordering::Less),
            "$lte" => range_matches(value, operand, |o| o != Ordering::Greater),
            "$in" | "$nin" => {
                let Bson::Array(candidates) = operand else {
                    return Err(ApiError::Store(format!("{} expects an array", op)));
                };
                let found = candidates.iter().any(|c| values_equal(value, c));
                if op == "$in" {
                    found
                } else {
                    !found
                }
            }
            "$exists" => {
                let wanted = !matches!(operand, Bson::Boolean(false));
                value.is_some() == wanted
            }
            other => {
                return Err(ApiError::Store(format!("Unsupported query operator {}", other)));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

// =============================================================================
// Updates
// =============================================================================

fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Ok(inner) = doc.get_document_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

fn unset_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Ok(inner) = doc.get_document_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

fn add_numbers(current: Option<&Bson>, delta: &Bson) -> Result<Bson> {
    let current = current.cloned().unwrap_or(Bson::Int32(0));
    match (&current, delta) {
        (Bson::Int32(a), Bson::Int32(b)) => Ok(a
            .checked_add(*b)
            .map(Bson::Int32)
            .unwrap_or(Bson::Int64(i64::from(*a) + i64::from(*b)))),
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            let a = as_f64(&current).unwrap_or(0.0) as i64;
            let b = as_f64(delta).unwrap_or(0.0) as i64;
            Ok(Bson::Int64(a + b))
        }
        _ => match (as_f64(&current), as_f64(delta)) {
            (Some(a), Some(b)) => Ok(Bson::Double(a + b)),
            _ => Err(ApiError::Store("$inc applied to a non-numeric value".into())),
        },
    }
}

fn apply_update(doc: &mut Document, patch: &Document) -> Result<()> {
    for (op, fields) in patch {
        let Bson::Document(fields) = fields else {
            return Err(ApiError::Store(format!("{} expects a document", op)));
        };
        match op.as_str() {
            "$set" => {
                for (path, value) in fields {
                    set_path(doc, path, value.clone());
                }
            }
            "$unset" => {
                for (path, _) in fields {
                    unset_path(doc, path);
                }
            }
            "$inc" => {
                for (path, delta) in fields {
                    let next = add_numbers(lookup(doc, path), delta)?;
                    set_path(doc, path, next);
                }
            }
            other => {
                return Err(ApiError::Store(format!("Unsupported update operator {}", other)));
            }
        }
    }
    Ok(())
}

// =============================================================================
// Aggregation
// =============================================================================

fn run_stage(mut docs: Vec<Document>, stage: &Document) -> Result<Vec<Document>> {
    let Some((name, spec)) = stage.iter().next() else {
        return Err(ApiError::Store("Empty pipeline stage".into()));
    };

    match (name.as_str(), spec) {
        ("$match", Bson::Document(filter)) => {
            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs {
                if matches(&doc, filter)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        ("$group", Bson::Document(spec)) => group(docs, spec),
        ("$sort", Bson::Document(sort)) => {
            sort_documents(&mut docs, sort);
            Ok(docs)
        }
        ("$limit", n) => {
            let n = as_f64(n).ok_or_else(|| ApiError::Store("$limit expects a number".into()))?;
            docs.truncate(n.max(0.0) as usize);
            Ok(docs)
        }
        ("$skip", n) => {
            let n = as_f64(n).ok_or_else(|| ApiError::Store("$skip expects a number".into()))?;
            let n = (n.max(0.0) as usize).min(docs.len());
            docs.drain(..n);
            Ok(docs)
        }
        (other, _) => Err(ApiError::Store(format!("Unsupported pipeline stage {}", other))),
    }
}

fn eval_expression(doc: &Document, expr: &Bson) -> Result<Bson> {
    match expr {
        Bson::String(s) if s.starts_with('$') => {
            Ok(lookup(doc, &s[1..]).cloned().unwrap_or(Bson::Null))
        }
        Bson::Document(inner) if is_operator_document(expr) => {
            let Some((op, arg)) = inner.iter().next() else {
                return Ok(Bson::Null);
            };
            let value = eval_expression(doc, arg)?;
            let Bson::DateTime(dt) = value else {
                return Ok(Bson::Null);
            };
            let dt = dt.to_chrono();
            match op.as_str() {
                "$year" => Ok(Bson::Int32(dt.year())),
                "$month" => Ok(Bson::Int32(dt.month() as i32)),
                "$dayOfMonth" => Ok(Bson::Int32(dt.day() as i32)),
                other => Err(ApiError::Store(format!("Unsupported expression {}", other))),
            }
        }
        Bson::Document(inner) => {
            let mut out = Document::new();
            for (key, value) in inner {
                out.insert(key.clone(), eval_expression(doc, value)?);
            }
            Ok(Bson::Document(out))
        }
        literal => Ok(literal.clone()),
    }
}

fn group(docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| ApiError::Store("$group requires an _id".into()))?;

    // Groups in first-seen order
    let mut groups: Vec<Document> = Vec::new();

    for doc in &docs {
        let key = eval_expression(doc, id_expr)?;
        let index = match groups
            .iter()
            .position(|g| values_equal(g.get("_id"), &key))
        {
            Some(i) => i,
            None => {
                let mut fresh = Document::new();
                fresh.insert("_id", key);
                groups.push(fresh);
                groups.len() - 1
            }
        };

        for (field, accumulator) in spec {
            if field == "_id" {
                continue;
            }
            let Bson::Document(accumulator) = accumulator else {
                return Err(ApiError::Store(format!("Accumulator for {} must be a document", field)));
            };
            let Some((op, arg)) = accumulator.iter().next() else {
                return Err(ApiError::Store(format!("Empty accumulator for {}", field)));
            };
            if op != "$sum" {
                return Err(ApiError::Store(format!("Unsupported accumulator {}", op)));
            }
            let value = eval_expression(doc, arg)?;
            let delta = if as_f64(&value).is_some() { value } else { Bson::Int32(0) };
            let next = add_numbers(groups[index].get(field), &delta)?;
            groups[index].insert(field.clone(), next);
        }
    }

    Ok(groups)
}
