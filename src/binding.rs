//! Filling field values from stored drawing records
//!
//! A drawing keeps its common attributes in fixed columns and anything else
//! in `additional_data`. Template fields name the column they display through
//! `targetField`.

use crate::template::TemplateLayout;
use crate::values::{FieldValue, FieldValues};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{trace, warn};

/// The fillable part of a stored drawing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawingRecord {
    pub job_number: Option<String>,
    pub work_order: Option<String>,
    pub drawing_number: Option<String>,
    pub name: Option<String>,
    pub customer: Option<String>,
    pub customer_source: Option<String>,
    pub quantity: Option<i64>,
    pub dl: Option<String>,
    pub checked_by: Option<String>,
    pub prog_by: Option<String>,
    pub material: Option<String>,
    pub thk: Option<String>,
    pub additional_data: Map<String, Value>,
}

/// Outcome of looking a column name up on a record
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// A fixed column, possibly unset
    Value(Option<FieldValue>),
    /// No fixed column has this name
    Unknown,
}

impl DrawingRecord {
    /// Look up a fixed column by its stored name
    pub fn column(&self, name: &str) -> Column {
        let text = |v: &Option<String>| Column::Value(v.clone().map(FieldValue::Text));
        match name {
            "job_number" => text(&self.job_number),
            "work_order" => text(&self.work_order),
            "drawing_number" => text(&self.drawing_number),
            "name" => text(&self.name),
            "customer" => text(&self.customer),
            "customer_source" => text(&self.customer_source),
            "quantity" => Column::Value(self.quantity.map(FieldValue::from)),
            "dl" => text(&self.dl),
            "checked_by" => text(&self.checked_by),
            "prog_by" => text(&self.prog_by),
            "material" => text(&self.material),
            "thk" => text(&self.thk),
            _ => Column::Unknown,
        }
    }

    fn extra(&self, key: &str) -> Option<FieldValue> {
        let raw = self.additional_data.get(key)?.clone();
        let value = FieldValue::from_json(raw);
        if value.is_none() {
            warn!("Ignoring additional_data['{}']: not representable as text", key);
        }
        value
    }
}

impl FieldValues {
    /// Collect values for every field of `layout` from a drawing record
    ///
    /// A field bound to a fixed column takes that column, even when it is
    /// unset. Other fields read `additional_data` by field id, then by their
    /// target name.
    pub fn from_drawing(layout: &TemplateLayout, record: &DrawingRecord) -> Self {
        let mut values = FieldValues::new();

        for field in &layout.fields {
            let target = field.target_field.as_deref();

            let value = match target.map(|t| record.column(t)) {
                Some(Column::Value(value)) => value,
                Some(Column::Unknown) | None => record
                    .extra(&field.id)
                    .or_else(|| target.and_then(|t| record.extra(t))),
            };

            match value {
                Some(value) => values.insert(field.id.clone(), value),
                None => trace!("Drawing has no value for field '{}'", field.id),
            }
        }

        values
    }
}
