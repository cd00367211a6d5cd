// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Evaluation of parsed filter expressions against sample fields.

use super::parser::{Expression, Operator, Value};
use super::{BoundParameters, FilterError};
use crate::dds::DdsType;
use arc_swap::ArcSwap;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Floats closer than this compare equal.
const FLOAT_TOLERANCE: f64 = 1e-9;

type Lookup<'a> = &'a dyn Fn(&str) -> Option<FieldValue>;

/// Callable form of a [`ContentFilter`](super::ContentFilter).
///
/// Holds the same expression and parameter slot as the filter, so a rebinding
/// applies from the next evaluation on.
#[derive(Clone)]
pub struct FilterEvaluator {
    expression: Arc<Expression>,
    parameters: Arc<ArcSwap<BoundParameters>>,
}

/// Field lookup plus the parameter values pinned for one evaluation.
struct Scope<'a> {
    lookup: Lookup<'a>,
    params: &'a [FieldValue],
}

impl Scope<'_> {
    fn eval(&self, expr: &Expression) -> Result<bool, FilterError> {
        Ok(match expr {
            Expression::Comparison { left, op, right } => {
                compare(&self.operand(left)?, *op, &self.operand(right)?)?
            }
            Expression::And(lhs, rhs) => self.eval(lhs)? && self.eval(rhs)?,
            Expression::Or(lhs, rhs) => self.eval(lhs)? || self.eval(rhs)?,
            Expression::Not(inner) => !self.eval(inner)?,
        })
    }

    fn operand(&self, value: &Value) -> Result<FieldValue, FilterError> {
        match value {
            Value::Field(name) => {
                (self.lookup)(name).ok_or_else(|| FilterError::UnknownField(name.clone()))
            }
            Value::Parameter(idx) => self
                .params
                .get(*idx)
                .cloned()
                .ok_or(FilterError::ParameterOutOfRange(*idx)),
            Value::Integer(n) => Ok(FieldValue::Integer(*n)),
            Value::Unsigned(n) => Ok(FieldValue::Unsigned(*n)),
            Value::Float(x) => Ok(FieldValue::Float(*x)),
            Value::String(text) => Ok(FieldValue::String(text.clone())),
            Value::Boolean(flag) => Ok(FieldValue::Boolean(*flag)),
        }
    }
}

impl FilterEvaluator {
    pub(super) fn new(
        expression: Arc<Expression>,
        parameters: Arc<ArcSwap<BoundParameters>>,
    ) -> Self {
        Self {
            expression,
            parameters,
        }
    }

    /// True when `sample` passes. A sample the expression cannot be evaluated
    /// on (absent field, incomparable operands) does not pass.
    pub fn evaluate<T: DdsType>(&self, sample: &T) -> bool {
        self.matches_with(&|name| sample.field(name))
            .unwrap_or_else(|e| {
                log::warn!("[FILTER] evaluation failed, sample rejected: {}", e);
                false
            })
    }

    pub fn matches(&self, fields: &HashMap<String, FieldValue>) -> Result<bool, FilterError> {
        self.matches_with(&|name| fields.get(name).cloned())
    }

    pub fn matches_with(&self, lookup: Lookup<'_>) -> Result<bool, FilterError> {
        let bound = self.parameters.load();
        Scope {
            lookup,
            params: &bound.values,
        }
        .eval(&self.expression)
    }
}

impl std::fmt::Debug for FilterEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FilterEvaluator({:?}, params={:?})",
            self.expression,
            self.parameters.load().raw
        )
    }
}

fn compare(left: &FieldValue, op: Operator, right: &FieldValue) -> Result<bool, FilterError> {
    use FieldValue::*;

    let ordering = match (left, right) {
        (String(text), String(pattern)) if op == Operator::Like => {
            return Ok(like(text, pattern));
        }
        _ if op == Operator::Like => {
            return Err(FilterError::TypeMismatch(
                "LIKE needs string operands".to_string(),
            ));
        }
        (Boolean(_), Boolean(_)) if !matches!(op, Operator::Eq | Operator::Ne) => {
            return Err(FilterError::TypeMismatch(
                "booleans only support = and <>".to_string(),
            ));
        }
        (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
        (String(a), String(b)) => Some(a.cmp(b)),
        (Float(_), _) | (_, Float(_)) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) if (a - b).abs() < FLOAT_TOLERANCE => Some(Ordering::Equal),
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(mismatch(left, right)),
        },
        (Integer(_) | Unsigned(_), Integer(_) | Unsigned(_)) => {
            match (left.as_i128(), right.as_i128()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => return Err(mismatch(left, right)),
            }
        }
        _ => return Err(mismatch(left, right)),
    };

    // NaN orders against nothing; only <> holds.
    let Some(ordering) = ordering else {
        return Ok(op == Operator::Ne);
    };
    Ok(match op {
        Operator::Eq => ordering.is_eq(),
        Operator::Ne => ordering.is_ne(),
        Operator::Lt => ordering.is_lt(),
        Operator::Le => ordering.is_le(),
        Operator::Gt => ordering.is_gt(),
        Operator::Ge => ordering.is_ge(),
        Operator::Like => false,
    })
}

fn mismatch(left: &FieldValue, right: &FieldValue) -> FilterError {
    FilterError::TypeMismatch(format!("{:?} is not comparable with {:?}", left, right))
}

/// SQL LIKE: `%` spans any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    // Last `%` seen and the text position it is currently absorbing up to.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                resume = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match resume {
                Some((star, absorbed)) => {
                    p = star + 1;
                    t = absorbed + 1;
                    resume = Some((star, t));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '%')
}

/// Runtime field value for filter evaluation and instance keys.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Signed integer value
    Integer(i64),
    /// Unsigned integer (ids, counters)
    Unsigned(u64),
    /// Floating point value
    Float(f64),
    /// String value (also used for enumerators)
    String(String),
    /// Boolean value
    Boolean(bool),
}

impl FieldValue {
    /// Parse a substitution parameter the way it would appear in an expression:
    /// quoted text is a string, then integer, float and boolean literals are
    /// tried, anything else is taken verbatim as a string.
    pub fn from_parameter(raw: &str) -> Self {
        let trimmed = raw.trim();
        for quote in ['\'', '"', '`'] {
            if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
                return FieldValue::String(trimmed[1..trimmed.len() - 1].to_string());
            }
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            FieldValue::Integer(n)
        } else if let Ok(n) = trimmed.parse::<u64>() {
            FieldValue::Unsigned(n)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            FieldValue::Float(f)
        } else if trimmed.eq_ignore_ascii_case("true") {
            FieldValue::Boolean(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            FieldValue::Boolean(false)
        } else {
            FieldValue::String(trimmed.to_string())
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Unsigned(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            FieldValue::Integer(n) => Some(i128::from(*n)),
            FieldValue::Unsigned(n) => Some(i128::from(*n)),
            _ => None,
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Unsigned(u64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Unsigned(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(f64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::filter::ContentFilter;

    fn eval(expr: &str, params: &[&str], sample: &[(&str, FieldValue)]) -> Result<bool, FilterError> {
        let filter = ContentFilter::compile(expr, params.iter().map(|p| p.to_string()).collect())
            .expect("filter compile should succeed");
        let fields: HashMap<String, FieldValue> = sample
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        filter.evaluator().matches(&fields)
    }

    #[test]
    fn test_tempering_alarm_range() {
        for (degrees, alarm) in [(31, false), (33, true), (29, true), (30, false), (32, false)] {
            assert_eq!(
                eval(
                    "degrees > %0 or degrees < %1",
                    &["32", "30"],
                    &[("degrees", degrees.into())]
                ),
                Ok(alarm),
                "degrees={degrees}"
            );
        }
    }

    #[test]
    fn test_numeric_kinds_mix() {
        let cases: [(&str, FieldValue, bool); 6] = [
            ("degrees > 32", 33.5.into(), true),
            ("degrees > 32", 31.0.into(), false),
            ("degrees >= 10", 15.5.into(), true),
            ("lot_id >= 3", 3u32.into(), true),
            ("lot_id >= 3", 2u32.into(), false),
            ("ratio = 0.3", (0.1 + 0.2).into(), true),
        ];
        for (expr, value, expected) in cases {
            let field = expr.split(' ').next().expect("expression has a field");
            assert_eq!(eval(expr, &[], &[(field, value)]), Ok(expected), "{expr}");
        }

        let max_id = [("id", FieldValue::from(u64::MAX))];
        assert_eq!(eval("id = 18446744073709551615", &[], &max_id), Ok(true));
        assert_eq!(eval("id > 9223372036854775807", &[], &max_id), Ok(true));
    }

    #[test]
    fn test_enumerator_parameter() {
        let lot = |station: &str| [("next_station", FieldValue::from(station))];
        let expr = "next_station = %0";
        let param = ["'TEMPERING_CONTROLLER'"];
        assert_eq!(eval(expr, &param, &lot("TEMPERING_CONTROLLER")), Ok(true));
        assert_eq!(eval(expr, &param, &lot("COCOA_BUTTER_CONTROLLER")), Ok(false));
    }

    #[test]
    fn test_connectives() {
        let expr = "lot_id > 10 and not station = 'INVALID_CONTROLLER'";
        let sample = |id: u32, station: &str| {
            [("lot_id", FieldValue::from(id)), ("station", FieldValue::from(station))]
        };
        assert_eq!(eval(expr, &[], &sample(15, "TEMPERING_CONTROLLER")), Ok(true));
        assert_eq!(eval(expr, &[], &sample(15, "INVALID_CONTROLLER")), Ok(false));
        assert_eq!(eval(expr, &[], &sample(5, "TEMPERING_CONTROLLER")), Ok(false));
    }

    #[test]
    fn test_like() {
        for (pattern, expected) in [
            ("TEMPERING_CONTROLLER", true),
            ("TEMPERING%", true),
            ("%CONTROLLER", true),
            ("%BUTTER%", false),
            ("%ER%ER", true),
            ("TEMPERIN__CONTROLLER", true),
            ("T_R%", false),
            ("%", true),
        ] {
            assert_eq!(like("TEMPERING_CONTROLLER", pattern), expected, "{pattern}");
        }
        assert!(like("", "%%"));
        assert!(!like("", "_"));
    }

    #[test]
    fn test_evaluation_errors() {
        assert!(matches!(
            eval("missing > 0", &[], &[]),
            Err(FilterError::UnknownField(_))
        ));
        assert!(matches!(
            eval("sensor_id > 3", &[], &[("sensor_id", "A".into())]),
            Err(FilterError::TypeMismatch(_))
        ));
        assert!(matches!(
            eval("degrees like 'A%'", &[], &[("degrees", 3i32.into())]),
            Err(FilterError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_from_parameter() {
        for (raw, parsed) in [
            ("'A'", FieldValue::String("A".into())),
            ("\"B\"", FieldValue::String("B".into())),
            ("42", FieldValue::Integer(42)),
            ("-7", FieldValue::Integer(-7)),
            ("2.5", FieldValue::Float(2.5)),
            ("TRUE", FieldValue::Boolean(true)),
            ("COCOA_BEAN_PROCESSOR", FieldValue::String("COCOA_BEAN_PROCESSOR".into())),
        ] {
            assert_eq!(FieldValue::from_parameter(raw), parsed);
        }
    }
}
