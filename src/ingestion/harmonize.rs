//! Post-ingestion datatype harmonization.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::column::Column;
use crate::datatypes::{is_null_token, Inferrer};
use crate::error::TableResult;
use crate::table::Table;
use crate::types::{DataType, Value};

/// Infer and commit the datatype of every column of `table`.
///
/// For each column the distinct values are collected and null tokens set aside (their presence
/// makes the column nullable). The first datatype in [`DataType::INFERENCE_ORDER`] that every
/// remaining distinct value infers as becomes the column's datatype; text always qualifies. A
/// column is only rewritten once all of its values have converted.
pub fn find_format(table: &mut Table) -> TableResult<()> {
    let mut inferrer = Inferrer::new();
    let headers: Vec<String> = table.headers().into_iter().map(str::to_string).collect();
    for header in &headers {
        let column = table.column_mut(header)?;
        harmonize_column(column, &mut inferrer)?;
    }
    Ok(())
}

fn harmonize_column(column: &mut Column, inferrer: &mut Inferrer) -> TableResult<()> {
    let distinct: BTreeSet<&Value> = column.iter().collect();
    let has_nulls = distinct.iter().any(|v| is_null_token(v));
    let candidates: Vec<&Value> = distinct.into_iter().filter(|v| !is_null_token(v)).collect();

    let (datatype, mapping) = choose_datatype(&candidates, inferrer)?;
    debug!(
        column = column.header(),
        datatype = %datatype,
        distinct = candidates.len(),
        nullable = has_nulls,
        "inferred column datatype"
    );

    let values: Vec<Value> = column
        .iter()
        .map(|v| mapping.get(v).cloned().unwrap_or(Value::Null))
        .collect();
    column.retype(datatype, has_nulls, values)
}

/// The first datatype covering every candidate, with the converted value for each candidate.
fn choose_datatype(
    candidates: &[&Value],
    inferrer: &mut Inferrer,
) -> TableResult<(DataType, HashMap<Value, Value>)> {
    if candidates.is_empty() {
        return Ok((DataType::Str, HashMap::new()));
    }

    'types: for datatype in DataType::INFERENCE_ORDER {
        let mut mapping = HashMap::with_capacity(candidates.len());
        for &value in candidates {
            match inferrer.infer(value, datatype) {
                Ok(converted) => {
                    mapping.insert(value.clone(), converted);
                }
                Err(_) => continue 'types,
            }
        }
        return Ok((datatype, mapping));
    }

    // Text inference accepts every value, so the loop always returns.
    let mapping = candidates
        .iter()
        .map(|&v| Ok((v.clone(), inferrer.infer(v, DataType::Str)?)))
        .collect::<TableResult<_>>()?;
    Ok((DataType::Str, mapping))
}
