//! In-process evaluation of pipeline stages.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::{Accumulator, FieldPath, PipelineError, Stage};

pub(super) fn apply(stage: &Stage, rows: Vec<Value>) -> Result<Vec<Value>, PipelineError> {
    match stage {
        Stage::Match { path, value } => Ok(filter(path, value, rows)),
        Stage::Unwind { path } => Ok(unwind(path, rows)),
        Stage::Group { key, accumulators } => group(key, accumulators, &rows),
    }
}

fn filter(path: &FieldPath, value: &Value, mut rows: Vec<Value>) -> Vec<Value> {
    let pointer = path.pointer();
    rows.retain(|doc| doc.pointer(&pointer) == Some(value));
    rows
}

fn unwind(path: &FieldPath, rows: Vec<Value>) -> Vec<Value> {
    let pointer = path.pointer();
    let mut out = Vec::with_capacity(rows.len());

    for doc in rows {
        let items = match doc.pointer(&pointer) {
            Some(Value::Array(items)) => Some(items.clone()),
            // Missing and null arrays produce no rows.
            None | Some(Value::Null) => continue,
            // A scalar behaves like a single-element array.
            Some(_) => None,
        };

        let Some(items) = items else {
            out.push(doc);
            continue;
        };
        for item in items {
            let mut row = doc.clone();
            if let Some(slot) = row.pointer_mut(&pointer) {
                *slot = item;
            }
            out.push(row);
        }
    }
    out
}

struct GroupState {
    key: Value,
    sums: Vec<Decimal>,
}

fn group(
    key: &FieldPath,
    accumulators: &[(String, Accumulator)],
    rows: &[Value],
) -> Result<Vec<Value>, PipelineError> {
    let key_pointer = key.pointer();
    let mut groups: Vec<GroupState> = Vec::new();

    for row in rows {
        let key_value = row.pointer(&key_pointer).cloned().unwrap_or(Value::Null);

        let position = groups.iter().position(|g| g.key == key_value);
        let index = if let Some(index) = position {
            index
        } else {
            groups.push(GroupState {
                key: key_value,
                sums: vec![Decimal::ZERO; accumulators.len()],
            });
            groups.len() - 1
        };

        let Some(state) = groups.get_mut(index) else {
            continue;
        };
        for ((_, accumulator), sum) in accumulators.iter().zip(state.sums.iter_mut()) {
            match accumulator {
                Accumulator::Sum(path) => {
                    *sum = sum
                        .checked_add(decimal_at(row, path)?)
                        .ok_or_else(|| PipelineError::Overflow {
                            path: path.to_string(),
                        })?;
                }
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|state| {
            let mut out = Map::new();
            out.insert("_id".to_string(), state.key);
            for ((name, _), sum) in accumulators.iter().zip(state.sums) {
                out.insert(name.clone(), Value::String(sum.to_string()));
            }
            Value::Object(out)
        })
        .collect())
}

fn decimal_at(row: &Value, path: &FieldPath) -> Result<Decimal, PipelineError> {
    let not_numeric = |value: &Value| PipelineError::NotNumeric {
        path: path.to_string(),
        value: value.to_string(),
    };

    match row.pointer(&path.pointer()) {
        None => Err(PipelineError::MissingField {
            path: path.to_string(),
        }),
        Some(value @ Value::Number(n)) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map_err(|_| not_numeric(value))
        }
        Some(value @ Value::String(s)) => Decimal::from_str(s).map_err(|_| not_numeric(value)),
        Some(other) => Err(not_numeric(other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::pipeline::{Accumulator, Pipeline, PipelineError};

    fn cart_total(user_id: &str) -> Pipeline {
        Pipeline::new()
            .matching("_id", json!(user_id))
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.price"))])
    }

    fn users() -> Vec<serde_json::Value> {
        vec![
            json!({"_id": "u1", "cart": [{"price": "10.00"}, {"price": 2.5}]}),
            json!({"_id": "u2", "cart": [{"price": "99.99"}]}),
            json!({"_id": "u3", "cart": []}),
        ]
    }

    #[test]
    fn test_cart_total_sums_only_matched_user() {
        let rows = cart_total("u1").run(users()).unwrap();
        assert_eq!(rows, vec![json!({"_id": "u1", "total": "12.50"})]);
    }

    #[test]
    fn test_empty_cart_yields_no_rows() {
        let rows = cart_total("u3").run(users()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unknown_user_yields_no_rows() {
        let rows = cart_total("nobody").run(users()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unwind_emits_one_row_per_element() {
        let rows = Pipeline::new()
            .unwind("cart")
            .run([json!({"_id": "u1", "cart": [{"n": 1}, {"n": 2}]})])
            .unwrap();
        assert_eq!(
            rows,
            vec![
                json!({"_id": "u1", "cart": {"n": 1}}),
                json!({"_id": "u1", "cart": {"n": 2}}),
            ]
        );
    }

    #[test]
    fn test_unwind_skips_missing_and_null() {
        let rows = Pipeline::new()
            .unwind("cart")
            .run([json!({"_id": "a"}), json!({"_id": "b", "cart": null})])
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_group_preserves_first_seen_order() {
        let rows = Pipeline::new()
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.price"))])
            .run(users())
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["u1", "u2"]);
    }

    #[test]
    fn test_missing_sum_field_is_an_error() {
        let result = Pipeline::new()
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.cost"))])
            .run(users());
        assert_eq!(
            result,
            Err(PipelineError::MissingField {
                path: "cart.cost".to_string()
            })
        );
    }

    #[test]
    fn test_non_numeric_sum_field_is_an_error() {
        let result = Pipeline::new()
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.price"))])
            .run([json!({"_id": "u1", "cart": [{"price": true}]})]);
        assert!(matches!(result, Err(PipelineError::NotNumeric { .. })));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let max = rust_decimal::Decimal::MAX.to_string();
        let result = Pipeline::new()
            .unwind("cart")
            .group("_id", [("total", Accumulator::sum("cart.price"))])
            .run([json!({"_id": "u1", "cart": [{"price": max}, {"price": max}]})]);
        assert_eq!(
            result,
            Err(PipelineError::Overflow {
                path: "cart.price".to_string()
            })
        );
    }
}
