//! Pipeline wire format parser
//!
//! A pipeline is an array of single-key objects. The key names the stage,
//! with or without a leading `$`:
//!
//! ```json
//! [
//!   {"$match": {"status": "active"}},
//!   {"$group": {"_id": "$city", "n": {"$sum": 1}}},
//!   {"sort": {"n": -1}},
//!   {"limit": 5}
//! ]
//! ```
//!
//! Everything is validated here. Execution never sees an unknown stage,
//! operator or accumulator.

use crate::query::{parse_sort_keys, Criteria};
use crate::value::{Document, Value};

use super::accumulators::AccumulatorRegistry;
use super::errors::{PipelineError, PipelineResult};
use super::stage::{
    AccumulatorExpr, AccumulatorSource, GroupId, GroupSpec, LookupSpec, Pipeline, PipelineStage,
    ProjectSpec, Projection,
};

type StageParser = fn(&Value, &AccumulatorRegistry) -> PipelineResult<PipelineStage>;

/// Stage name to parser, names without the `$` prefix
const STAGES: &[(&str, StageParser)] = &[
    ("match", parse_match),
    ("group", parse_group),
    ("sort", parse_sort),
    ("limit", parse_limit),
    ("skip", parse_skip),
    ("lookup", parse_lookup),
    ("project", parse_project),
    ("unwind", parse_unwind),
];

/// Returns true if `name` (with or without `$`) is a known stage
pub fn is_known_stage(name: &str) -> bool {
    let bare = name.strip_prefix('$').unwrap_or(name);
    STAGES.iter().any(|(known, _)| *known == bare)
}

impl Pipeline {
    /// Parses a pipeline with the built-in accumulators
    pub fn parse(spec: &Value) -> PipelineResult<Self> {
        Self::parse_with(spec, &AccumulatorRegistry::with_builtins())
    }

    /// Parses a pipeline, resolving accumulators against `registry`
    pub fn parse_with(spec: &Value, registry: &AccumulatorRegistry) -> PipelineResult<Self> {
        let items = spec.as_array().ok_or_else(|| {
            PipelineError::InvalidPipeline(format!(
                "expected an array of stages, got {}",
                spec.type_name()
            ))
        })?;

        let stages = items
            .iter()
            .enumerate()
            .map(|(position, item)| parse_stage(position, item, registry))
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Pipeline::new(stages))
    }

    pub fn from_json(json: &serde_json::Value) -> PipelineResult<Self> {
        Self::parse(&Value::from(json.clone()))
    }
}

fn parse_stage(
    position: usize,
    item: &Value,
    registry: &AccumulatorRegistry,
) -> PipelineResult<PipelineStage> {
    let doc = match item {
        Value::Document(doc) if doc.len() == 1 => doc,
        _ => {
            return Err(PipelineError::InvalidPipeline(format!(
                "stage {} must be an object with exactly one key",
                position
            )))
        }
    };

    let (name, argument) = doc
        .iter()
        .next()
        .ok_or_else(|| PipelineError::InvalidPipeline(format!("stage {} is empty", position)))?;
    let bare = name.strip_prefix('$').unwrap_or(name);

    let parser = STAGES
        .iter()
        .find(|(known, _)| *known == bare)
        .map(|(_, parser)| *parser)
        .ok_or_else(|| PipelineError::UnknownStage(name.to_string()))?;

    parser(argument, registry)
}

fn expect_document<'a>(stage: &str, argument: &'a Value) -> PipelineResult<&'a Document> {
    argument.as_document().ok_or_else(|| {
        PipelineError::invalid_stage(
            stage,
            format!("expected a document, got {}", argument.type_name()),
        )
    })
}

fn expect_string<'a>(stage: &str, key: &str, argument: &'a Value) -> PipelineResult<&'a str> {
    match argument {
        Value::String(s) if !s.is_empty() => Ok(s),
        other => Err(PipelineError::invalid_stage(
            stage,
            format!("'{}' must be a non-empty string, got {}", key, other.type_name()),
        )),
    }
}

/// Strips the `$` from a field reference
fn field_reference(stage: &str, reference: &str) -> PipelineResult<String> {
    match reference.strip_prefix('$') {
        Some(field) if !field.is_empty() => Ok(field.to_string()),
        _ => Err(PipelineError::invalid_stage(
            stage,
            format!("'{}' is not a field reference", reference),
        )),
    }
}

/// Group keys name a field with or without the leading `$`
fn group_field(reference: &str) -> PipelineResult<String> {
    let field = reference.strip_prefix('$').unwrap_or(reference);
    if field.is_empty() {
        return Err(PipelineError::invalid_stage("group", "_id field is empty"));
    }
    Ok(field.to_string())
}

fn expect_count(stage: &str, argument: &Value) -> PipelineResult<usize> {
    match argument {
        Value::Int(n) if *n >= 0 => usize::try_from(*n)
            .map_err(|_| PipelineError::invalid_stage(stage, format!("{} is too large", n))),
        other => Err(PipelineError::invalid_stage(
            stage,
            format!("expected a non-negative integer, got {:?}", other),
        )),
    }
}

// ============================================================================
// Stage parsers
// ============================================================================

fn parse_match(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    Ok(PipelineStage::Match(Criteria::parse(argument)?))
}

fn parse_sort(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    Ok(PipelineStage::Sort(parse_sort_keys(argument)?))
}

fn parse_limit(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    Ok(PipelineStage::Limit(expect_count("limit", argument)?))
}

fn parse_skip(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    Ok(PipelineStage::Skip(expect_count("skip", argument)?))
}

fn parse_group(argument: &Value, registry: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    let doc = expect_document("group", argument)?;

    let id = match doc.get("_id") {
        None | Some(Value::Null) => GroupId::None,
        Some(Value::String(field)) => GroupId::Field(group_field(field)?),
        Some(Value::Document(parts)) => {
            if parts.is_empty() {
                return Err(PipelineError::invalid_stage("group", "composite _id is empty"));
            }
            let parts = parts
                .iter()
                .map(|(alias, reference)| {
                    let reference = expect_string("group", alias, reference)?;
                    Ok((alias.to_string(), group_field(reference)?))
                })
                .collect::<PipelineResult<Vec<_>>>()?;
            GroupId::Composite(parts)
        }
        Some(other) => {
            return Err(PipelineError::invalid_stage(
                "group",
                format!("_id must be null, a field or a document, got {}", other.type_name()),
            ))
        }
    };

    let mut fields = Vec::new();
    for (output, expression) in doc.iter().filter(|(key, _)| *key != "_id") {
        fields.push((output.to_string(), parse_accumulator(output, expression, registry)?));
    }

    Ok(PipelineStage::Group(GroupSpec { id, fields }))
}

/// Parses `{"$op": "$field"}` or `{"$op": literal}`
fn parse_accumulator(
    output: &str,
    expression: &Value,
    registry: &AccumulatorRegistry,
) -> PipelineResult<AccumulatorExpr> {
    let (operator, operand) = match expression {
        Value::Document(doc) if doc.len() == 1 => doc.iter().next().ok_or_else(|| {
            PipelineError::invalid_stage("group", format!("'{}' has no operator", output))
        })?,
        _ => {
            return Err(PipelineError::invalid_stage(
                "group",
                format!("'{}' must be a single-operator document", output),
            ))
        }
    };

    let factory = registry
        .get(operator)
        .ok_or_else(|| PipelineError::UnknownAccumulator(operator.to_string()))?;

    let source = match operand {
        Value::String(reference) => AccumulatorSource::Field(field_reference("group", reference)?),
        Value::Array(_) | Value::Document(_) => {
            return Err(PipelineError::invalid_stage(
                "group",
                format!("operand of {} for '{}' must be a field or scalar", operator, output),
            ))
        }
        literal => AccumulatorSource::Literal(literal.clone()),
    };

    Ok(AccumulatorExpr::new(operator, source, factory))
}

fn parse_lookup(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    let doc = expect_document("lookup", argument)?;

    if let Some(unknown) = doc
        .keys()
        .find(|k| !matches!(*k, "from" | "localField" | "foreignField" | "as"))
    {
        return Err(PipelineError::invalid_stage(
            "lookup",
            format!("unknown option '{}'", unknown),
        ));
    }

    let required = |key: &str| -> PipelineResult<String> {
        let value = doc.get(key).ok_or_else(|| {
            PipelineError::invalid_stage("lookup", format!("missing '{}'", key))
        })?;
        expect_string("lookup", key, value).map(str::to_string)
    };

    Ok(PipelineStage::Lookup(LookupSpec {
        from: required("from")?,
        local_field: required("localField")?,
        foreign_field: required("foreignField")?,
        as_field: required("as")?,
    }))
}

fn parse_project(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    Ok(PipelineStage::Project(parse_project_spec(argument)?))
}

fn parse_project_spec(argument: &Value) -> PipelineResult<ProjectSpec> {
    let doc = expect_document("project", argument)?;
    if doc.is_empty() {
        return Err(PipelineError::invalid_stage("project", "no fields given"));
    }

    let mut fields = Vec::with_capacity(doc.len());
    for (field, value) in doc.iter() {
        if field.split('.').any(str::is_empty) {
            return Err(PipelineError::invalid_stage(
                "project",
                format!("invalid field path '{}'", field),
            ));
        }
        let projection = match value {
            Value::Int(1) | Value::Bool(true) => Projection::Include,
            Value::Document(_) => Projection::Nested(parse_project_spec(value)?),
            other => {
                return Err(PipelineError::invalid_stage(
                    "project",
                    format!("'{}' must be 1 or a nested projection, got {:?}", field, other),
                ))
            }
        };
        fields.push((field.to_string(), projection));
    }

    Ok(ProjectSpec::new(fields))
}

fn parse_unwind(argument: &Value, _: &AccumulatorRegistry) -> PipelineResult<PipelineStage> {
    let reference = expect_string("unwind", "path", argument)?;
    Ok(PipelineStage::Unwind(field_reference("unwind", reference)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;
    use serde_json::json;

    fn parse(json: serde_json::Value) -> PipelineResult<Pipeline> {
        Pipeline::from_json(&json)
    }

    // ==================== Envelope ====================

    #[test]
    fn test_stage_names_with_and_without_dollar() {
        let pipeline = parse(json!([
            {"$match": {"a": 1}},
            {"sort": {"a": 1}},
            {"$limit": 2},
            {"skip": 0}
        ]))
        .unwrap();

        assert_eq!(pipeline.stage_names(), vec!["match", "sort", "limit", "skip"]);
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(parse(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_pipeline_must_be_array() {
        let err = parse(json!({"$match": {}})).unwrap_err();
        assert_eq!(err.code(), "DOCAGG_PIPELINE_INVALID");
    }

    #[test]
    fn test_stage_must_have_one_key() {
        let err = parse(json!([{"$limit": 1, "$skip": 1}])).unwrap_err();
        assert_eq!(err.code(), "DOCAGG_PIPELINE_INVALID");
    }

    #[test]
    fn test_unknown_stage() {
        let err = parse(json!([{"$out": "x"}])).unwrap_err();
        assert_eq!(err, PipelineError::UnknownStage("$out".into()));
    }

    #[test]
    fn test_is_known_stage() {
        assert!(is_known_stage("$lookup"));
        assert!(is_known_stage("unwind"));
        assert!(!is_known_stage("$facet"));
    }

    // ==================== Match / Sort / Limit / Skip ====================

    #[test]
    fn test_match_errors_surface_at_parse() {
        let err = parse(json!([{"$match": {"a": {"$regex": "x"}}}])).unwrap_err();
        assert_eq!(err.code(), "DOCAGG_QUERY_UNKNOWN_OPERATOR");

        let err = parse(json!([{"$match": {"a": {"$in": 3}}}])).unwrap_err();
        assert_eq!(err.code(), "DOCAGG_QUERY_MALFORMED_OPERAND");
    }

    #[test]
    fn test_sort_keys_in_order() {
        let pipeline = parse(json!([{"$sort": {"b": -1, "a": 1}}])).unwrap();
        match &pipeline.stages()[0] {
            PipelineStage::Sort(keys) => {
                assert_eq!(keys[0].field, "b");
                assert_eq!(keys[0].direction, SortDirection::Desc);
                assert_eq!(keys[1].field, "a");
            }
            other => panic!("expected sort, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = parse(json!([{"$limit": -1}])).unwrap_err();
        assert_eq!(err.code(), "DOCAGG_PIPELINE_INVALID_STAGE");
        assert!(parse(json!([{"$skip": "2"}])).is_err());
        assert!(parse(json!([{"$limit": 1.5}])).is_err());
    }

    // ==================== Group ====================

    #[test]
    fn test_group_id_forms() {
        let ids: Vec<GroupId> = [
            json!(null),
            json!("city"),
            json!("$city"),
            json!({"c": "$city"}),
            json!({"c": "city", "y": "$year"}),
        ]
        .into_iter()
        .map(|id| match parse(json!([{"$group": {"_id": id}}])).unwrap().stages()[0].clone() {
            PipelineStage::Group(spec) => spec.id,
            other => panic!("expected group, got {:?}", other),
        })
        .collect();

        assert_eq!(ids[0], GroupId::None);
        assert_eq!(ids[1], GroupId::Field("city".into()));
        assert_eq!(ids[2], GroupId::Field("city".into()));
        assert_eq!(
            ids[3],
            GroupId::Composite(vec![("c".into(), "city".into())])
        );
        assert_eq!(
            ids[4],
            GroupId::Composite(vec![("c".into(), "city".into()), ("y".into(), "year".into())])
        );
    }

    #[test]
    fn test_group_rejects_empty_field_names() {
        for id in [json!("$"), json!(""), json!({"c": "$"}), json!({"c": ""})] {
            let err = parse(json!([{"$group": {"_id": id}}])).unwrap_err();
            assert_eq!(err.code(), "DOCAGG_PIPELINE_INVALID_STAGE");
        }
    }

    #[test]
    fn test_group_missing_id_is_single_group() {
        let pipeline = parse(json!([{"$group": {"n": {"$sum": 1}}}])).unwrap();
        match &pipeline.stages()[0] {
            PipelineStage::Group(spec) => {
                assert_eq!(spec.id, GroupId::None);
                assert_eq!(spec.fields.len(), 1);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_group_accumulator_sources() {
        let pipeline = parse(json!([{"$group": {
            "_id": "$k",
            "total": {"$sum": "$amount"},
            "count": {"$sum": 1}
        }}]))
        .unwrap();

        match &pipeline.stages()[0] {
            PipelineStage::Group(spec) => {
                assert_eq!(spec.fields[0].0, "total");
                assert_eq!(
                    spec.fields[0].1.source,
                    AccumulatorSource::Field("amount".into())
                );
                assert_eq!(spec.fields[1].1.source, AccumulatorSource::Literal(Value::Int(1)));
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_accumulator_fails_at_parse() {
        let err = parse(json!([{"$group": {"_id": null, "m": {"$median": "$x"}}}])).unwrap_err();
        assert_eq!(err, PipelineError::UnknownAccumulator("$median".into()));
    }

    #[test]
    fn test_custom_registry_accepts_operator() {
        let mut registry = AccumulatorRegistry::empty();
        registry.register("$count", || Box::new(CountAll(0)));

        let spec = Value::from(json!([{"$group": {"_id": null, "n": {"$count": 1}}}]));
        assert!(Pipeline::parse_with(&spec, &registry).is_ok());
        assert!(Pipeline::parse_with(
            &Value::from(json!([{"$group": {"n": {"$sum": 1}}}])),
            &registry
        )
        .is_err());
    }

    #[derive(Debug)]
    struct CountAll(i64);

    impl crate::pipeline::Accumulator for CountAll {
        fn accumulate(&mut self, _: Option<&Value>) {
            self.0 += 1;
        }

        fn finalize(self: Box<Self>) -> Value {
            Value::Int(self.0)
        }
    }

    #[test]
    fn test_accumulator_operand_must_be_reference_or_scalar() {
        assert!(parse(json!([{"$group": {"t": {"$sum": "amount"}}}])).is_err());
        assert!(parse(json!([{"$group": {"t": {"$sum": ["$a"]}}}])).is_err());
        assert!(parse(json!([{"$group": {"t": "$a"}}])).is_err());
        assert!(parse(json!([{"$group": {"t": {"$sum": "$a", "$avg": "$a"}}}])).is_err());
    }

    // ==================== Lookup / Project / Unwind ====================

    #[test]
    fn test_lookup_spec() {
        let pipeline = parse(json!([{"$lookup": {
            "from": "orders",
            "localField": "id",
            "foreignField": "user_id",
            "as": "orders"
        }}]))
        .unwrap();

        match &pipeline.stages()[0] {
            PipelineStage::Lookup(spec) => {
                assert_eq!(spec.from, "orders");
                assert_eq!(spec.local_field, "id");
                assert_eq!(spec.foreign_field, "user_id");
                assert_eq!(spec.as_field, "orders");
            }
            other => panic!("expected lookup, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_missing_key_rejected() {
        let err = parse(json!([{"$lookup": {"from": "o", "localField": "a", "as": "x"}}]))
            .unwrap_err();
        assert_eq!(err.code(), "DOCAGG_PIPELINE_INVALID_STAGE");
    }

    #[test]
    fn test_project_spec() {
        let pipeline = parse(json!([{"$project": {"a": 1, "b": true, "c": {"d": 1}, "e.f": 1}}]))
            .unwrap();

        match &pipeline.stages()[0] {
            PipelineStage::Project(spec) => {
                let names: Vec<&str> = spec.fields.iter().map(|(f, _)| f.as_str()).collect();
                assert_eq!(names, vec!["a", "b", "c", "e.f"]);
                assert_eq!(
                    spec.fields[2].1,
                    Projection::Nested(ProjectSpec::new(vec![("d".into(), Projection::Include)]))
                );
            }
            other => panic!("expected project, got {:?}", other),
        }
    }

    #[test]
    fn test_project_exclusion_rejected() {
        assert!(parse(json!([{"$project": {"a": 0}}])).is_err());
        assert!(parse(json!([{"$project": {}}])).is_err());
        assert!(parse(json!([{"$project": {"a..b": 1}}])).is_err());
    }

    #[test]
    fn test_unwind_requires_dollar_reference() {
        let pipeline = parse(json!([{"$unwind": "$tags"}])).unwrap();
        assert!(matches!(&pipeline.stages()[0], PipelineStage::Unwind(f) if f == "tags"));

        assert!(parse(json!([{"$unwind": "tags"}])).is_err());
        assert!(parse(json!([{"$unwind": "$"}])).is_err());
    }
}
