//! Translation of aggregation pipelines into `PostgreSQL`.
//!
//! Documents are rows of `(id TEXT, doc JSONB)`. A pipeline compiles to one
//! `SELECT`:
//!
//! - match stages become `WHERE <path> = $n::jsonb`
//! - a single unwind becomes a lateral `jsonb_array_elements` join
//! - a trailing group becomes `GROUP BY` with `SUM(...::numeric)` columns
//!
//! Grouped queries also return a `complete` flag, false when a summed field
//! was missing or not a scalar in any row of the group, so callers can raise
//! the same missing-field error as the in-process evaluator.

use serde_json::Value;

use emporium_core::pipeline::{Accumulator, FieldPath, Pipeline, PipelineError, Stage};

/// A compiled pipeline ready to bind and execute.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPipeline {
    pub sql: String,
    /// Values for `$1..$n`, bound as `jsonb`.
    pub binds: Vec<Value>,
    /// Whether the query ends in a group (and returns a `complete` column).
    pub grouped: bool,
    /// Summed paths, reported when `complete` is false.
    pub summed: Vec<FieldPath>,
}

/// Compile `pipeline` over `table`.
///
/// # Errors
///
/// Returns `PipelineError::Unsupported` for shapes without a single-statement
/// translation: more than one unwind, stages after a group, or path segments
/// that are not plain identifiers.
pub fn compile(pipeline: &Pipeline, table: &str) -> Result<CompiledPipeline, PipelineError> {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    let mut unwound: Option<FieldPath> = None;
    let mut group: Option<(&FieldPath, &[(String, Accumulator)])> = None;

    for stage in pipeline.stages() {
        if group.is_some() {
            return Err(PipelineError::Unsupported(
                "stages after a group".to_string(),
            ));
        }
        match stage {
            Stage::Match { path, value } => {
                binds.push(value.clone());
                conditions.push(format!(
                    "{} = ${}::jsonb",
                    field_expr(path, unwound.as_ref())?,
                    binds.len()
                ));
            }
            Stage::Unwind { path } => {
                if unwound.is_some() {
                    return Err(PipelineError::Unsupported("more than one unwind".to_string()));
                }
                json_path(path)?;
                unwound = Some(path.clone());
            }
            Stage::Group { key, accumulators } => group = Some((key, accumulators.as_slice())),
        }
    }

    let mut from = format!("{table} d");
    if let Some(path) = &unwound {
        from.push_str(&format!(
            " CROSS JOIN LATERAL jsonb_array_elements(COALESCE(d.doc #> '{}', '[]'::jsonb)) AS unwound(elem)",
            json_path(path)?
        ));
    }
    let filter = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let Some((key, accumulators)) = group else {
        let row = match &unwound {
            Some(path) => format!(
                "jsonb_set(d.doc, '{}', unwound.elem)",
                json_path(path)?
            ),
            None => "d.doc".to_string(),
        };
        return Ok(CompiledPipeline {
            sql: format!("SELECT {row} AS row FROM {from}{filter}"),
            binds,
            grouped: false,
            summed: Vec::new(),
        });
    };

    let key_expr = field_expr(key, unwound.as_ref())?;
    let mut columns = vec![format!("'_id', {key_expr}")];
    let mut checks = Vec::new();
    let mut summed = Vec::new();
    for (name, accumulator) in accumulators {
        let Accumulator::Sum(path) = accumulator;
        let expr = field_expr(path, unwound.as_ref())?;
        columns.push(format!(
            "{}, SUM(({expr} #>> '{{}}')::numeric)::text",
            quote_literal(name)
        ));
        checks.push(format!(
            "COALESCE(jsonb_typeof({expr}) IN ('number', 'string'), false)"
        ));
        summed.push(path.clone());
    }
    let complete = if checks.is_empty() {
        "true".to_string()
    } else {
        format!("bool_and({})", checks.join(" AND "))
    };

    Ok(CompiledPipeline {
        sql: format!(
            "SELECT jsonb_build_object({}) AS row, {complete} AS complete FROM {from}{filter} GROUP BY {key_expr}",
            columns.join(", ")
        ),
        binds,
        grouped: true,
        summed,
    })
}

/// SQL expression for `path`, resolved against the unwound element when the
/// path lies under the unwound array.
fn field_expr(path: &FieldPath, unwound: Option<&FieldPath>) -> Result<String, PipelineError> {
    if let Some(array) = unwound
        && let Some(rest) = path.strip_prefix(array)
    {
        if rest.is_empty() {
            return Ok("unwound.elem".to_string());
        }
        return Ok(format!(
            "unwound.elem #> '{}'",
            json_path(&FieldPath::new(rest))?
        ));
    }
    Ok(format!("d.doc #> '{}'", json_path(path)?))
}

/// `PostgreSQL` text-array path literal body (`{cart,price}`).
fn json_path(path: &FieldPath) -> Result<String, PipelineError> {
    let segments: Vec<&str> = path.segments().collect();
    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if !valid {
        return Err(PipelineError::Unsupported(format!(
            "field path `{path}` is not a plain identifier path"
        )));
    }
    Ok(format!("{{{}}}", segments.join(",")))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const TABLE: &str = "emporium.users";

    #[test]
    fn test_cart_total_compiles_to_grouped_sum() {
        let pipeline = Pipeline::new()
            .matching("_id", json!("5ff1e194b8576f48c2f8c7a1"))
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.price"))]);

        let compiled = compile(&pipeline, TABLE).unwrap();

        assert!(compiled.grouped);
        assert_eq!(compiled.binds, vec![json!("5ff1e194b8576f48c2f8c7a1")]);
        assert!(compiled.sql.contains("WHERE d.doc #> '{_id}' = $1::jsonb"));
        assert!(
            compiled
                .sql
                .contains("jsonb_array_elements(COALESCE(d.doc #> '{cart}', '[]'::jsonb))")
        );
        assert!(
            compiled
                .sql
                .contains("'total', SUM((unwound.elem #> '{price}' #>> '{}')::numeric)::text")
        );
        assert!(compiled.sql.ends_with("GROUP BY d.doc #> '{_id}'"));
        assert_eq!(compiled.summed, vec![FieldPath::new("cart.price")]);
    }

    #[test]
    fn test_match_only_selects_documents() {
        let pipeline = Pipeline::new().matching("email", json!("a@example.com"));
        let compiled = compile(&pipeline, TABLE).unwrap();

        assert!(!compiled.grouped);
        assert_eq!(
            compiled.sql,
            "SELECT d.doc AS row FROM emporium.users d WHERE d.doc #> '{email}' = $1::jsonb"
        );
    }

    #[test]
    fn test_unwind_without_group_replaces_array() {
        let compiled = compile(&Pipeline::new().unwind("cart"), TABLE).unwrap();
        assert!(compiled.sql.starts_with("SELECT jsonb_set(d.doc, '{cart}', unwound.elem) AS row"));
    }

    #[test]
    fn test_second_unwind_is_unsupported() {
        let pipeline = Pipeline::new().unwind("cart").unwind("orders");
        assert!(matches!(
            compile(&pipeline, TABLE),
            Err(PipelineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_stage_after_group_is_unsupported() {
        let pipeline = Pipeline::new()
            .group("_id", [("total", Accumulator::sum("price"))])
            .matching("_id", json!("x"));
        assert!(matches!(
            compile(&pipeline, TABLE),
            Err(PipelineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_injection_in_path_is_rejected() {
        let pipeline = Pipeline::new().matching("email'; DROP TABLE x; --", json!("a"));
        assert!(matches!(
            compile(&pipeline, TABLE),
            Err(PipelineError::Unsupported(_))
        ));
    }

    #[test]
    fn test_accumulator_name_is_quoted() {
        let pipeline = Pipeline::new().group("_id", [("it's", Accumulator::sum("price"))]);
        let compiled = compile(&pipeline, TABLE).unwrap();
        assert!(compiled.sql.contains("'it''s', SUM("));
    }
}
