//! Read-side relation between two collections
//!
//! A relation links `local_field` of a document to `foreign_field` in a
//! foreign collection. The lookup stage resolves through it.

use crate::query::Criteria;
use crate::value::Document;

use super::errors::ResolverResult;
use super::RelationResolver;

/// A one-to-many link from a local document into a foreign collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub foreign_collection: String,
    pub local_field: String,
    pub foreign_field: String,
}

impl Relation {
    pub fn new(
        foreign_collection: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            foreign_collection: foreign_collection.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
        }
    }

    /// Criteria selecting the foreign documents related to `document`.
    ///
    /// A missing local field reads as Null.
    pub fn criteria_for(&self, document: &Document) -> Criteria {
        Criteria::field_equals(
            self.foreign_field.as_str(),
            document.get_or_null(&self.local_field),
        )
    }

    /// Returns the foreign documents related to `document`
    pub fn get_for<R: RelationResolver + ?Sized>(
        &self,
        resolver: &R,
        document: &Document,
    ) -> ResolverResult<Vec<Document>> {
        resolver.find_in_collection(&self.foreign_collection, &self.criteria_for(document))
    }

    /// Returns how many foreign documents relate to `document`
    pub fn count_for<R: RelationResolver + ?Sized>(
        &self,
        resolver: &R,
        document: &Document,
    ) -> ResolverResult<usize> {
        self.get_for(resolver, document).map(|related| related.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryCatalog;
    use crate::value::Value;
    use serde_json::json;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .insert_collection(
                "orders",
                serde_json::from_value(json!([
                    {"user": 1, "total": 10},
                    {"user": 2, "total": 5},
                    {"user": 1, "total": 7}
                ]))
                .unwrap(),
            )
            .unwrap();
        catalog
    }

    fn user(id: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("_id", id);
        doc
    }

    #[test]
    fn test_get_for() {
        let relation = Relation::new("orders", "_id", "user");
        let related = relation.get_for(&catalog(), &user(1)).unwrap();

        let totals: Vec<_> = related.iter().map(|d| d.get_or_null("total")).collect();
        assert_eq!(totals, vec![Value::Int(10), Value::Int(7)]);
    }

    #[test]
    fn test_count_for() {
        let relation = Relation::new("orders", "_id", "user");
        assert_eq!(relation.count_for(&catalog(), &user(2)).unwrap(), 1);
        assert_eq!(relation.count_for(&catalog(), &user(3)).unwrap(), 0);
    }

    #[test]
    fn test_missing_local_field_matches_missing_foreign_field() {
        let relation = Relation::new("orders", "nope", "absent");
        // Null on both sides: every order lacks "absent"
        assert_eq!(relation.count_for(&catalog(), &user(1)).unwrap(), 3);
    }

    #[test]
    fn test_unknown_foreign_collection() {
        let relation = Relation::new("missing", "_id", "user");
        assert!(relation.get_for(&catalog(), &user(1)).is_err());
    }
}
