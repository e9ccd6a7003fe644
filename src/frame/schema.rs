//! Arrow schema inference and JSON to Arrow conversion
//!
//! Provides utilities for inferring Arrow schemas from JSON records
//! and converting records to Arrow RecordBatches (and back, for display).

use crate::error::{Error, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray,
    StructArray, TimestampMillisecondArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, SecondsFormat};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Infer an Arrow schema from a set of JSON records
///
/// Fields appear in order of first appearance across the records. All
/// fields are nullable.
pub fn infer_schema(records: &[Value]) -> Schema {
    let mut order: Vec<String> = Vec::new();
    let mut field_types: HashMap<String, DataType> = HashMap::new();

    for record in records {
        if let Value::Object(obj) = record {
            for (key, value) in obj {
                let inferred_type = infer_type(value);
                match field_types.get_mut(key) {
                    Some(existing) => *existing = merge_types(existing, &inferred_type),
                    None => {
                        order.push(key.clone());
                        field_types.insert(key.clone(), inferred_type);
                    }
                }
            }
        }
    }

    let fields: Vec<Field> = order
        .into_iter()
        .map(|name| {
            let dtype = field_types.remove(&name).unwrap_or(DataType::Null);
            Field::new(name, dtype, true)
        })
        .collect();

    Schema::new(fields)
}

/// Convert JSON records to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data.
pub fn json_to_arrow(records: &[Value], schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(records),
    };

    let mut columns: Vec<ArrayRef> = Vec::new();
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(obj) => obj.get(field.name()),
                _ => None,
            })
            .collect();

        columns.push(build_array(&values, field.data_type())?);
    }

    batch_from_columns(Arc::new(schema), columns, records.len())
}

/// Assemble a RecordBatch, keeping the row count even with zero columns
pub fn batch_from_columns(
    schema: Arc<Schema>,
    columns: Vec<ArrayRef>,
    num_rows: usize,
) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(schema, columns, &options)
        .map_err(|e| Error::framing(format!("Failed to create RecordBatch: {e}")))
}

/// Common Arrow type of a set of values (nulls ignored)
pub(crate) fn infer_values_type<'a>(values: impl Iterator<Item = &'a Value>) -> DataType {
    values
        .filter(|v| !v.is_null())
        .map(infer_type)
        .reduce(|a, b| merge_types(&a, &b))
        .unwrap_or(DataType::Null)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(arr) => DataType::List(Arc::new(Field::new(
            "item",
            infer_values_type(arr.iter()),
            true,
        ))),
        // An empty struct cannot carry a row count
        Value::Object(obj) if obj.is_empty() => DataType::Utf8,
        Value::Object(obj) => {
            let fields: Vec<Field> = obj
                .iter()
                .map(|(k, v)| Field::new(k, infer_type(v), true))
                .collect();
            DataType::Struct(Fields::from(fields))
        }
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::List(a), DataType::List(b)) => DataType::List(Arc::new(Field::new(
            "item",
            merge_types(a.data_type(), b.data_type()),
            true,
        ))),

        (DataType::Struct(a), DataType::Struct(b)) => {
            let mut merged: Vec<Field> = a.iter().map(|f| f.as_ref().clone()).collect();
            for field in b {
                match merged.iter_mut().find(|f| f.name() == field.name()) {
                    Some(existing) => {
                        let dtype = merge_types(existing.data_type(), field.data_type());
                        *existing = Field::new(field.name(), dtype, true);
                    }
                    None => merged.push(field.as_ref().clone()),
                }
            }
            DataType::Struct(Fields::from(merged))
        }

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array from JSON values
pub(crate) fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.filter(|v| !v.is_null()).map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        _ => {
            let arr: StringArray = values.iter().map(|v| v.map(ToString::to_string)).collect();
            Ok(Arc::new(arr))
        }
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        if let Some(Value::Array(arr)) = value {
            all_items.extend(arr.iter().map(Some));
        }
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::framing("Array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let offset_buffer = OffsetBuffer::new(offsets.into());

    let list_array = ListArray::try_new(Arc::clone(field), offset_buffer, items_array, None)?;
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::new();

    for field in fields {
        let child_values: Vec<Option<&Value>> = values
            .iter()
            .map(|v| match v {
                Some(Value::Object(obj)) => obj.get(field.name()),
                _ => None,
            })
            .collect();

        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let struct_array = StructArray::try_new(fields.clone(), child_arrays, None)?;
    Ok(Arc::new(struct_array))
}

/// Convert an Arrow RecordBatch to JSON records
///
/// Returns a vector of JSON objects, one per row in the batch.
pub fn arrow_to_json(batch: &RecordBatch) -> Result<Vec<Value>> {
    let schema = batch.schema();
    let num_rows = batch.num_rows();
    let mut records = Vec::with_capacity(num_rows);

    for row_idx in 0..num_rows {
        let mut record = serde_json::Map::new();

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let column = batch.column(col_idx);
            let value = array_value_to_json(column.as_ref(), row_idx)?;
            record.insert(field.name().clone(), value);
        }

        records.push(Value::Object(record));
    }

    Ok(records)
}

fn downcast<'a, T: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::framing(format!("Failed to downcast to {name}")))
}

/// Convert a single array element to JSON
fn array_value_to_json(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),

        DataType::Boolean => {
            let arr = downcast::<BooleanArray>(array, "BooleanArray")?;
            Ok(Value::Bool(arr.value(row)))
        }

        DataType::Int64 => {
            let arr = downcast::<Int64Array>(array, "Int64Array")?;
            Ok(Value::Number(arr.value(row).into()))
        }

        DataType::Float64 => {
            let arr = downcast::<Float64Array>(array, "Float64Array")?;
            Ok(serde_json::Number::from_f64(arr.value(row)).map_or(Value::Null, Value::Number))
        }

        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = downcast::<TimestampMillisecondArray>(array, "TimestampMillisecondArray")?;
            let millis = arr.value(row);
            Ok(DateTime::from_timestamp_millis(millis).map_or_else(
                || Value::Number(millis.into()),
                |ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ))
        }

        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array, "StringArray")?;
            Ok(Value::String(arr.value(row).to_string()))
        }

        DataType::List(_) => {
            let arr = downcast::<ListArray>(array, "ListArray")?;
            let values = arr.value(row);
            let mut items = Vec::with_capacity(values.len());
            for i in 0..values.len() {
                items.push(array_value_to_json(values.as_ref(), i)?);
            }
            Ok(Value::Array(items))
        }

        DataType::Struct(_) => {
            let arr = downcast::<StructArray>(array, "StructArray")?;
            let mut obj = serde_json::Map::new();
            for (i, field) in arr.fields().iter().enumerate() {
                let val = array_value_to_json(arr.column(i).as_ref(), row)?;
                obj.insert(field.name().clone(), val);
            }
            Ok(Value::Object(obj))
        }

        other => Ok(Value::String(format!("{other:?}"))),
    }
}
