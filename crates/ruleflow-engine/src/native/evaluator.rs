//! Condition evaluation against facts

use crate::error::EngineError;
use ruleflow_core::{Condition, ConditionGroup, ConditionNode, Fact, Operator, Value};

/// Evaluate a condition group against a fact
pub fn eval_group(group: &ConditionGroup, fact: &Fact) -> Result<bool, EngineError> {
    match group {
        ConditionGroup::All(items) => {
            for item in items {
                if !eval_node(item, fact)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ConditionGroup::Any(items) => {
            for item in items {
                if eval_node(item, fact)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ConditionGroup::Not(items) => {
            for item in items {
                if eval_node(item, fact)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn eval_node(node: &ConditionNode, fact: &Fact) -> Result<bool, EngineError> {
    match node {
        ConditionNode::Leaf(condition) => eval_condition(condition, fact),
        ConditionNode::Group(group) => eval_group(group, fact),
    }
}

/// Evaluate a single condition against a fact
pub fn eval_condition(condition: &Condition, fact: &Fact) -> Result<bool, EngineError> {
    let left = fact.get_path(&condition.field);
    compare(&left, condition.operator, &condition.value)
}

/// Execute a comparison between two values
pub fn compare(left: &Value, op: Operator, right: &Value) -> Result<bool, EngineError> {
    // Null compared to anything is false, except equality against an
    // explicit null literal. This lets rules handle missing fields.
    match (left, right) {
        (Value::Null, Value::Null) => {
            return Ok(matches!(op, Operator::Eq));
        }
        (Value::Null, _) | (_, Value::Null) => {
            return Ok(matches!(op, Operator::Ne));
        }
        _ => {}
    }

    match (left, op, right) {
        (Value::Number(l), Operator::Eq, Value::Number(r)) => Ok(l == r),
        (Value::Number(l), Operator::Ne, Value::Number(r)) => Ok(l != r),
        (Value::Number(l), Operator::Gt, Value::Number(r)) => Ok(l > r),
        (Value::Number(l), Operator::Ge, Value::Number(r)) => Ok(l >= r),
        (Value::Number(l), Operator::Lt, Value::Number(r)) => Ok(l < r),
        (Value::Number(l), Operator::Le, Value::Number(r)) => Ok(l <= r),

        (Value::String(l), Operator::Eq, Value::String(r)) => Ok(l == r),
        (Value::String(l), Operator::Ne, Value::String(r)) => Ok(l != r),

        (Value::Bool(l), Operator::Eq, Value::Bool(r)) => Ok(l == r),
        (Value::Bool(l), Operator::Ne, Value::Bool(r)) => Ok(l != r),

        (l, Operator::In, Value::Array(items)) => Ok(items.contains(l)),
        (l, Operator::NotIn, Value::Array(items)) => Ok(!items.contains(l)),

        (Value::String(l), Operator::Contains, Value::String(r)) => Ok(l.contains(r.as_str())),
        (Value::Array(items), Operator::Contains, r) => Ok(items.contains(r)),

        _ => Err(EngineError::execution(format!(
            "Cannot compare {} and {} with '{}'",
            left.type_name(),
            right.type_name(),
            op.symbol()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleflow_core::condition::ConditionParser;

    fn fact(pairs: &[(&str, Value)]) -> Fact {
        let mut fact = Fact::new();
        for (k, v) in pairs {
            fact.insert(*k, v.clone());
        }
        fact
    }

    fn parse_group(expr: &str) -> ConditionGroup {
        let parser = ConditionParser::new();
        ConditionGroup::All(vec![ConditionNode::Leaf(
            parser.parse_condition(expr).unwrap(),
        )])
    }

    #[test]
    fn test_numeric_comparisons() {
        let f = fact(&[("age", Value::Number(65.0))]);
        assert!(eval_group(&parse_group("age > 60"), &f).unwrap());
        assert!(eval_group(&parse_group("age >= 65"), &f).unwrap());
        assert!(!eval_group(&parse_group("age < 65"), &f).unwrap());
        assert!(eval_group(&parse_group("age == 65"), &f).unwrap());
        assert!(!eval_group(&parse_group("age != 65"), &f).unwrap());
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let f = fact(&[]);
        assert!(!eval_group(&parse_group("age > 60"), &f).unwrap());
        assert!(eval_group(&parse_group("age == null"), &f).unwrap());
        assert!(eval_group(&parse_group("age != 5"), &f).unwrap());
    }

    #[test]
    fn test_membership() {
        let f = fact(&[("country", Value::String("DE".to_string()))]);
        assert!(eval_group(&parse_group(r#"country in ["DE", "AT"]"#), &f).unwrap());
        assert!(!eval_group(&parse_group(r#"country in ["FR"]"#), &f).unwrap());
        assert!(eval_group(&parse_group(r#"country not in ["FR"]"#), &f).unwrap());
    }

    #[test]
    fn test_contains() {
        let f = fact(&[
            ("note", Value::String("priority customer".to_string())),
            (
                "tags",
                Value::Array(vec![Value::String("vip".to_string())]),
            ),
        ]);
        assert!(eval_group(&parse_group(r#"note contains "priority""#), &f).unwrap());
        assert!(eval_group(&parse_group(r#"tags contains "vip""#), &f).unwrap());
        assert!(!eval_group(&parse_group(r#"tags contains "new""#), &f).unwrap());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let f = fact(&[("age", Value::String("old".to_string()))]);
        assert!(eval_group(&parse_group("age > 60"), &f).is_err());
    }

    #[test]
    fn test_group_logic() {
        let parser = ConditionParser::new();
        let f = fact(&[
            ("age", Value::Number(25.0)),
            ("segment", Value::String("student".to_string())),
        ]);

        let all = ConditionGroup::All(vec![
            ConditionNode::Leaf(parser.parse_condition("age < 28").unwrap()),
            ConditionNode::Leaf(parser.parse_condition(r#"segment == "student""#).unwrap()),
        ]);
        assert!(eval_group(&all, &f).unwrap());

        let any = ConditionGroup::Any(vec![
            ConditionNode::Leaf(parser.parse_condition("age > 60").unwrap()),
            ConditionNode::Leaf(parser.parse_condition(r#"segment == "student""#).unwrap()),
        ]);
        assert!(eval_group(&any, &f).unwrap());

        let not = ConditionGroup::Not(vec![ConditionNode::Leaf(
            parser.parse_condition("age > 60").unwrap(),
        )]);
        assert!(eval_group(&not, &f).unwrap());
    }

    #[test]
    fn test_empty_groups() {
        let f = fact(&[]);
        assert!(eval_group(&ConditionGroup::All(vec![]), &f).unwrap());
        assert!(!eval_group(&ConditionGroup::Any(vec![]), &f).unwrap());
        assert!(eval_group(&ConditionGroup::Not(vec![]), &f).unwrap());
    }
}
