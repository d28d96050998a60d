use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::bindings::position_bindings;
use crate::identifier::{quote_identifier, quote_qualified};
use crate::literal::interpolate;

const COMPARISON_OPERATORS: &[&str] = &[
    "=", "<>", "!=", "<", "<=", ">", ">=", "like", "ilike", "not like", "not ilike",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid comparison operator '{0}'")]
    InvalidOperator(String),

    #[error("empty IN list for column '{0}'")]
    EmptyIn(String),

    #[error("missing table name")]
    MissingTable,
}

/// SQL text with numbered `$n` placeholders and its positional bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeQuery {
    pub sql: String,
    #[serde(default)]
    pub bindings: Vec<Value>,
}

impl NativeQuery {
    /// Raw SQL written with `?` placeholders; they are numbered in order.
    pub fn raw(sql: &str, bindings: Vec<Value>) -> Self {
        Self {
            sql: position_bindings(sql),
            bindings,
        }
    }

    /// SQL with bindings inlined. For logging only.
    pub fn interpolated(&self) -> String {
        interpolate(&self.sql, &self.bindings)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    IsNull {
        column: String,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
}

/// `SELECT` statement builder for a single table.
///
/// Methods chain by value. Mistakes such as an unknown operator are kept
/// until [`build`](Self::build), which reports the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    schema: Option<String>,
    table: String,
    columns: Vec<String>,
    conditions: Vec<Condition>,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    error: Option<BuildError>,
}

impl Select {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            error: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Columns to select. No columns selects `*`.
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// `column = value`; a JSON `null` becomes `column is null`.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let condition = match value.into() {
            Value::Null => Condition::IsNull { column },
            value => Condition::Compare {
                column,
                operator: "=".to_owned(),
                value,
            },
        };
        self.conditions.push(condition);
        self
    }

    pub fn where_op(
        mut self,
        column: impl Into<String>,
        operator: &str,
        value: impl Into<Value>,
    ) -> Self {
        let normalized = operator.trim().to_ascii_lowercase();
        if !COMPARISON_OPERATORS.contains(&normalized.as_str()) {
            self.fail(BuildError::InvalidOperator(operator.to_owned()));
            return self;
        }
        self.conditions.push(Condition::Compare {
            column: column.into(),
            operator: normalized,
            value: value.into(),
        });
        self
    }

    pub fn where_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let column = column.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.fail(BuildError::EmptyIn(column));
            return self;
        }
        self.conditions.push(Condition::In { column, values });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(&self) -> Result<NativeQuery, BuildError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.table.trim().is_empty() {
            return Err(BuildError::MissingTable);
        }

        let mut bindings = Vec::new();
        let mut sql = String::from("select ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| quote_qualified(c)).collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" from ");
        if let Some(schema) = &self.schema {
            sql.push_str(&quote_identifier(schema));
            sql.push('.');
        }
        sql.push_str(&quote_identifier(&self.table));

        if !self.conditions.is_empty() {
            let clauses: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| render_condition(condition, &mut bindings))
                .collect();
            sql.push_str(" where ");
            sql.push_str(&clauses.join(" and "));
        }

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| format!("{} {}", quote_qualified(column), order.as_sql()))
                .collect();
            sql.push_str(" order by ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" limit {}", push_binding(&mut bindings, limit.into())));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" offset {}", push_binding(&mut bindings, offset.into())));
        }

        Ok(NativeQuery { sql, bindings })
    }

    fn fail(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

fn render_condition(condition: &Condition, bindings: &mut Vec<Value>) -> String {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => format!(
            "{} {operator} {}",
            quote_qualified(column),
            push_binding(bindings, value.clone())
        ),
        Condition::IsNull { column } => format!("{} is null", quote_qualified(column)),
        Condition::In { column, values } => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|value| push_binding(bindings, value.clone()))
                .collect();
            format!("{} in ({})", quote_qualified(column), placeholders.join(", "))
        }
    }
}

fn push_binding(bindings: &mut Vec<Value>, value: Value) -> String {
    bindings.push(value);
    format!("${}", bindings.len())
}
