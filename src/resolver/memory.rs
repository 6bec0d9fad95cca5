//! In-memory collections and catalog
//!
//! Stands in for the storage collaborator: collections are plain vectors of
//! documents, `find` filters with the predicate evaluator and then applies
//! sort, skip and limit in that order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::observability::Event;
use crate::query::{Criteria, DocumentSorter, PredicateFilter, SortKey};
use crate::value::Document;

use super::errors::{ResolverError, ResolverResult};
use super::RelationResolver;

static COLLECTION_NAME: OnceLock<Regex> = OnceLock::new();

/// Returns true if `name` is a valid collection identifier
pub fn is_valid_collection_name(name: &str) -> bool {
    COLLECTION_NAME
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"))
        .is_match(name)
}

/// Post-filter options for `find`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A named, materialized collection
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    documents: Vec<Document>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns matching documents with sort, skip and limit applied
    pub fn find(&self, criteria: &Criteria, options: &FindOptions) -> Vec<Document> {
        self.find_by(|doc| PredicateFilter::matches(doc, criteria), options)
    }

    /// Like [`find`](Self::find), with a caller-supplied predicate instead of criteria
    pub fn find_by<F>(&self, predicate: F, options: &FindOptions) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let mut results: Vec<Document> = self
            .documents
            .iter()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect();

        DocumentSorter::sort(&mut results, &options.sort);

        let limit = options.limit.unwrap_or(usize::MAX);
        results.into_iter().skip(options.skip).take(limit).collect()
    }

    /// Returns the first matching document in collection order
    pub fn find_one(&self, criteria: &Criteria) -> Option<Document> {
        self.documents
            .iter()
            .find(|doc| PredicateFilter::matches(doc, criteria))
            .cloned()
    }

    pub fn count(&self, criteria: &Criteria) -> usize {
        self.documents
            .iter()
            .filter(|doc| PredicateFilter::matches(doc, criteria))
            .count()
    }
}

/// A set of named collections that can resolve relation lookups
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    collections: BTreeMap<String, MemoryCollection>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a collection
    pub fn insert_collection(
        &mut self,
        name: &str,
        documents: Vec<Document>,
    ) -> ResolverResult<()> {
        if !is_valid_collection_name(name) {
            return Err(ResolverError::InvalidCollectionName(name.to_string()));
        }
        self.collections
            .insert(name.to_string(), MemoryCollection::new(name, documents));
        Ok(())
    }

    pub fn collection(&self, name: &str) -> ResolverResult<&MemoryCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| ResolverError::UnknownCollection(name.to_string()))
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Loads every `<collection>.json` file in `dir`.
    ///
    /// Each file must hold a JSON array of objects.
    pub fn load_dir(dir: &Path) -> ResolverResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            ResolverError::load_failed(dir.display().to_string(), e.to_string())
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ResolverError::load_failed(dir.display().to_string(), e.to_string())
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut catalog = Self::new();
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let content = fs::read_to_string(&path)
                .map_err(|e| ResolverError::load_failed(&name, e.to_string()))?;
            let documents: Vec<Document> = serde_json::from_str(&content)
                .map_err(|e| ResolverError::load_failed(&name, e.to_string()))?;

            tracing::debug!(
                event = Event::CollectionLoaded.as_str(),
                collection = %name,
                documents = documents.len()
            );
            catalog.insert_collection(&name, documents)?;
        }

        tracing::info!(
            event = Event::CatalogLoaded.as_str(),
            dir = %dir.display(),
            collections = catalog.collections.len()
        );
        Ok(catalog)
    }
}

impl RelationResolver for MemoryCatalog {
    fn find_in_collection(&self, name: &str, criteria: &Criteria) -> ResolverResult<Vec<Document>> {
        Ok(self.collection(name)?.find(criteria, &FindOptions::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn docs(json: serde_json::Value) -> Vec<Document> {
        serde_json::from_value(json).unwrap()
    }

    fn people() -> MemoryCollection {
        MemoryCollection::new(
            "people",
            docs(json!([
                {"name": "ann", "age": 31},
                {"name": "bob", "age": 25},
                {"name": "cid", "age": 40},
                {"name": "dee", "age": 25}
            ])),
        )
    }

    fn names(docs: &[Document]) -> Vec<String> {
        docs.iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_find_filters_in_collection_order() {
        let criteria = Criteria::try_from(&json!({"age": 25})).unwrap();
        let found = people().find(&criteria, &FindOptions::new());
        assert_eq!(names(&found), vec!["bob", "dee"]);
    }

    #[test]
    fn test_find_sort_then_skip_then_limit() {
        let options = FindOptions::new()
            .with_sort(vec![SortKey::desc("age")])
            .with_skip(1)
            .with_limit(2);
        let found = people().find(&Criteria::all(), &options);
        assert_eq!(names(&found), vec!["ann", "bob"]);
    }

    #[test]
    fn test_find_by_closure_predicate() {
        let options = FindOptions::new().with_sort(vec![SortKey::asc("age")]);
        let found = people().find_by(
            |doc| {
                doc.get("name")
                    .and_then(Value::as_str)
                    .map_or(false, |name| name.ends_with('e') || name == "bob")
            },
            &options,
        );
        assert_eq!(names(&found), vec!["bob", "dee"]);
    }

    #[test]
    fn test_find_one_and_count() {
        let criteria = Criteria::try_from(&json!({"age": {"$lt": 35}})).unwrap();
        let collection = people();

        assert_eq!(names(&[collection.find_one(&criteria).unwrap()]), vec!["ann"]);
        assert_eq!(collection.count(&criteria), 3);
    }

    #[test]
    fn test_collection_name_validation() {
        assert!(is_valid_collection_name("orders"));
        assert!(is_valid_collection_name("_tmp_2"));
        assert!(!is_valid_collection_name("2fast"));
        assert!(!is_valid_collection_name("a-b"));
        assert!(!is_valid_collection_name("x'; DROP TABLE y"));
        assert!(!is_valid_collection_name(""));

        let mut catalog = MemoryCatalog::new();
        let err = catalog.insert_collection("bad name", vec![]).unwrap_err();
        assert_eq!(err, ResolverError::InvalidCollectionName("bad name".into()));
    }

    #[test]
    fn test_resolver_unknown_collection() {
        let catalog = MemoryCatalog::new();
        let err = catalog
            .find_in_collection("missing", &Criteria::all())
            .unwrap_err();
        assert_eq!(err.code(), "DOCAGG_RESOLVER_UNKNOWN_COLLECTION");
    }

    #[test]
    fn test_resolver_finds_by_field() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .insert_collection("people", people().documents().to_vec())
            .unwrap();

        let found = catalog
            .find_in_collection("people", &Criteria::field_equals("age", Value::Int(40)))
            .unwrap();
        assert_eq!(names(&found), vec!["cid"]);
    }
}
