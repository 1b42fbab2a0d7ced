use serde_json::{json, Value};

use super::{is_empty_value, member_text, value_number, ErrorKind, RuleError};

fn row_cost(row: &Value) -> Option<u64> {
    let cost = value_number(row.get("cost")?)?;
    if cost < 1.0 || cost.fract() != 0.0 || cost > u64::MAX as f64 {
        return None;
    }
    Some(cost as u64)
}

fn row_is_blank(row: &Value) -> bool {
    ["item", "cost"]
        .iter()
        .all(|key| row.get(*key).map(is_empty_value).unwrap_or(true))
}

/// Sum of every parseable row cost.
pub fn budget_total(value: &Value) -> u64 {
    value
        .as_array()
        .map(|rows| rows.iter().filter_map(row_cost).sum())
        .unwrap_or(0)
}

/// Drops rows where both `item` and `cost` are blank, then checks every remaining row.
/// Half-filled rows stay in place so the error can point at them.
pub fn validate_budget_items(value: &Value, max_items: Option<usize>) -> Result<Value, RuleError> {
    let rows = value
        .as_array()
        .ok_or_else(|| RuleError::new(ErrorKind::InvalidType))?;

    let kept: Vec<&Value> = rows.iter().filter(|row| !row_is_blank(row)).collect();

    if let Some(max) = max_items {
        if kept.len() > max {
            return Err(RuleError::new(ErrorKind::TooManyBudgetItems).with_param("max", max));
        }
    }

    let mut normalized = Vec::with_capacity(kept.len());
    for (index, row) in kept.into_iter().enumerate() {
        let Some(item) = member_text(row, "item") else {
            return Err(RuleError::new(ErrorKind::BudgetItemMissing).at(format!("{index}.item")));
        };
        let cost_present = row.get("cost").is_some_and(|cost| !is_empty_value(cost));
        if !cost_present {
            return Err(RuleError::new(ErrorKind::BudgetCostMissing).at(format!("{index}.cost")));
        }
        let Some(cost) = row_cost(row) else {
            return Err(RuleError::new(ErrorKind::InvalidNumber).at(format!("{index}.cost")));
        };
        normalized.push(json!({ "item": item, "cost": cost }));
    }

    Ok(Value::Array(normalized))
}

pub fn validate_budget_range(
    value: &Value,
    min: Option<u64>,
    max: Option<u64>,
) -> Result<Value, RuleError> {
    let total = budget_total(value);
    if let Some(min) = min {
        if total < min {
            return Err(RuleError::new(ErrorKind::UnderBudget)
                .with_param("min", min)
                .with_param("total", total));
        }
    }
    if let Some(max) = max {
        if total > max {
            return Err(RuleError::new(ErrorKind::OverBudget)
                .with_param("max", max)
                .with_param("total", total));
        }
    }
    Ok(value.clone())
}

/// The declared project total must cover everything requested in the budget.
pub fn project_total_covers_budget(total: &Value, budget: &Value) -> Result<(), RuleError> {
    let Some(declared) = value_number(total) else {
        return Ok(());
    };
    let requested = budget_total(budget);
    if declared < requested as f64 {
        Err(RuleError::new(ErrorKind::UnderProjectBudgetTotal).with_param("budget", requested))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_equals_sum_of_costs() {
        let rows = json!([
            { "item": "New boiler", "cost": 400 },
            { "item": "Posters", "cost": "20" },
            { "item": "Venue hire", "cost": 1250 }
        ]);
        assert_eq!(budget_total(&rows), 1670);
        assert_eq!(budget_total(&json!("not rows")), 0);
    }

    #[test]
    fn blank_rows_are_dropped_but_partial_rows_kept() {
        let rows = json!([
            { "item": "New boiler", "cost": 400 },
            { "item": "", "cost": "" },
            { "item": "  ", "cost": null }
        ]);
        let coerced = validate_budget_items(&rows, Some(10)).expect("blank rows dropped");
        assert_eq!(coerced, json!([{ "item": "New boiler", "cost": 400 }]));

        let partial = json!([
            { "item": "New boiler", "cost": 400 },
            { "item": "", "cost": "" },
            { "item": "Posters", "cost": "" }
        ]);
        let err = validate_budget_items(&partial, None).expect_err("partial row flagged");
        assert_eq!(err.kind, ErrorKind::BudgetCostMissing);
        assert_eq!(err.path.as_deref(), Some("1.cost"));

        let missing_item = json!([{ "cost": 50 }]);
        let err = validate_budget_items(&missing_item, None).expect_err("item required");
        assert_eq!(err.kind, ErrorKind::BudgetItemMissing);
        assert_eq!(err.path.as_deref(), Some("0.item"));
    }

    #[test]
    fn enforces_row_limit() {
        let rows = json!([
            { "item": "a", "cost": 1 },
            { "item": "b", "cost": 1 },
            { "item": "c", "cost": 1 }
        ]);
        assert_eq!(
            validate_budget_items(&rows, Some(2)).map_err(|err| err.kind),
            Err(ErrorKind::TooManyBudgetItems)
        );
    }

    #[test]
    fn range_reports_under_and_over() {
        let rows = json!([
            { "item": "New boiler", "cost": 400 },
            { "item": "Posters", "cost": 20 }
        ]);
        assert!(validate_budget_range(&rows, Some(300), Some(700)).is_ok());
        assert_eq!(
            validate_budget_range(&rows, Some(500), Some(700)).map_err(|err| err.kind),
            Err(ErrorKind::UnderBudget)
        );
        assert_eq!(
            validate_budget_range(&rows, Some(100), Some(400)).map_err(|err| err.kind),
            Err(ErrorKind::OverBudget)
        );
    }

    #[test]
    fn project_total_must_cover_budget() {
        let rows = json!([{ "item": "Posters", "cost": 420 }]);
        assert_eq!(
            project_total_covers_budget(&json!(400), &rows).map_err(|err| err.kind),
            Err(ErrorKind::UnderProjectBudgetTotal)
        );
        assert!(project_total_covers_budget(&json!("1,000"), &rows).is_ok());
        assert!(project_total_covers_budget(&json!(null), &rows).is_ok());
    }
}
