use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use vaultline_core::{AppError, AppResult, NonEmptyString};

/// Comparison operator of one playbook condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Strict primitive equality.
    Equals,
    /// Numeric less-than.
    Lt,
    /// Numeric less-than-or-equal.
    Lte,
    /// Numeric greater-than.
    Gt,
    /// Numeric greater-than-or-equal.
    Gte,
    /// Case-sensitive substring containment on string values.
    Includes,
    /// Operator name outside the supported set. Never matches.
    Unsupported(String),
}

impl ConditionOperator {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Includes => "includes",
            Self::Unsupported(name) => name.as_str(),
        }
    }

    /// Parses a storage value. Unknown names are kept as [`ConditionOperator::Unsupported`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "equals" => Self::Equals,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "includes" => Self::Includes,
            other => Self::Unsupported(other.to_owned()),
        }
    }
}

/// Scalar comparison value configured on a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// String literal.
    String(String),
    /// Numeric literal.
    Number(Number),
    /// Boolean literal.
    Bool(bool),
}

impl ConditionValue {
    /// Parses a scalar JSON value.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        match value {
            Value::String(text) => Ok(Self::String(text.clone())),
            Value::Number(number) => Ok(Self::Number(number.clone())),
            Value::Bool(flag) => Ok(Self::Bool(*flag)),
            Value::Null | Value::Array(_) | Value::Object(_) => Err(AppError::Validation(
                "condition value must be a string, number or boolean".to_owned(),
            )),
        }
    }

    /// Returns the JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(text) => Value::String(text.clone()),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Bool(flag) => Value::Bool(*flag),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::String(_) | Self::Bool(_) => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Self::String(text) => text.clone(),
            Self::Number(number) => number.to_string(),
            Self::Bool(flag) => flag.to_string(),
        }
    }

    fn equals_json(&self, actual: &Value) -> bool {
        match (self, actual) {
            (Self::String(expected), Value::String(actual)) => expected == actual,
            (Self::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Self::Number(expected), Value::Number(actual)) => numbers_equal(expected, actual),
            _ => false,
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i32> for ConditionValue {
    fn from(value: i32) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

fn numbers_equal(left: &Number, right: &Number) -> bool {
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return left == right;
    }

    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return left == right;
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// One declarative predicate over an event payload field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct PlaybookCondition {
    field: NonEmptyString,
    operator: ConditionOperator,
    value: ConditionValue,
}

impl PlaybookCondition {
    /// Creates a validated condition.
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<ConditionValue>,
    ) -> AppResult<Self> {
        let field = NonEmptyString::new(field).map_err(|_| {
            AppError::Validation("condition field path must not be empty".to_owned())
        })?;

        Ok(Self {
            field,
            operator,
            value: value.into(),
        })
    }

    /// Returns the dotted payload path.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the condition operator.
    #[must_use]
    pub fn operator(&self) -> &ConditionOperator {
        &self.operator
    }

    /// Returns the configured comparison value.
    #[must_use]
    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    /// Evaluates the condition against one payload.
    ///
    /// Missing fields, type mismatches and unsupported operators all evaluate
    /// to `false`. Numeric operators never coerce strings.
    #[must_use]
    pub fn evaluate(&self, payload: &Value) -> bool {
        let Some(actual) = resolve_path(payload, self.field.as_str()) else {
            return false;
        };

        match &self.operator {
            ConditionOperator::Equals => self.value.equals_json(actual),
            ConditionOperator::Lt => self.compare(actual) == Some(Ordering::Less),
            ConditionOperator::Lte => matches!(
                self.compare(actual),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ConditionOperator::Gt => self.compare(actual) == Some(Ordering::Greater),
            ConditionOperator::Gte => matches!(
                self.compare(actual),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ConditionOperator::Includes => actual
                .as_str()
                .is_some_and(|text| text.contains(self.value.as_text().as_str())),
            ConditionOperator::Unsupported(_) => false,
        }
    }

    fn compare(&self, actual: &Value) -> Option<Ordering> {
        let left = actual.as_f64()?;
        let right = self.value.as_f64()?;
        left.partial_cmp(&right)
    }
}

impl TryFrom<Value> for PlaybookCondition {
    type Error = AppError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Validation("playbook condition must be a JSON object".to_owned())
        })?;

        let field = object
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Validation("playbook condition requires 'field'".to_owned()))?;
        let operator = object
            .get("op")
            .and_then(Value::as_str)
            .map(ConditionOperator::parse)
            .ok_or_else(|| AppError::Validation("playbook condition requires 'op'".to_owned()))?;
        let comparison = object
            .get("value")
            .ok_or_else(|| AppError::Validation("playbook condition requires 'value'".to_owned()))
            .and_then(ConditionValue::from_json)?;

        Self::new(field, operator, comparison)
    }
}

impl From<PlaybookCondition> for Value {
    fn from(condition: PlaybookCondition) -> Self {
        serde_json::json!({
            "field": condition.field.as_str(),
            "op": condition.operator.as_str(),
            "value": condition.value.to_json(),
        })
    }
}

/// Outcome of evaluating a condition list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionEvaluation {
    /// Number of conditions evaluated.
    pub checked: usize,
    /// Number of conditions that held.
    pub matched: usize,
}

impl ConditionEvaluation {
    /// Returns whether every condition held. Vacuously true for an empty list.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.checked == self.matched
    }
}

/// Evaluates all conditions and reports how many held.
#[must_use]
pub fn evaluate_conditions_detailed(
    conditions: &[PlaybookCondition],
    payload: &Value,
) -> ConditionEvaluation {
    let matched = conditions
        .iter()
        .filter(|condition| condition.evaluate(payload))
        .count();

    ConditionEvaluation {
        checked: conditions.len(),
        matched,
    }
}

/// Returns whether every condition holds for the payload.
#[must_use]
pub fn evaluate_conditions(conditions: &[PlaybookCondition], payload: &Value) -> bool {
    conditions
        .iter()
        .all(|condition| condition.evaluate(payload))
}

/// Resolves a dot-separated path against nested JSON objects.
#[must_use]
pub fn resolve_path<'a>(payload: &'a Value, field_path: &str) -> Option<&'a Value> {
    let mut current_value = payload;
    for segment in field_path.split('.') {
        if segment.is_empty() {
            return None;
        }

        current_value = current_value.as_object()?.get(segment)?;
    }

    Some(current_value)
}
