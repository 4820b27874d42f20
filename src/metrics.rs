use crate::error::Result;
use crate::types::{CustomerAggregate, RankEntry, Ranking, SalesTable, SortDirection};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Sum of a column. An empty table sums to 0.
pub fn total(table: &SalesTable, column: &str) -> Result<f64> {
    let idx = table.column_index(column)?;
    Ok(table.rows().iter().map(|r| r.get(idx).as_f64()).sum())
}

/// Number of distinct non-null values in a column.
pub fn distinct_count(table: &SalesTable, column: &str) -> Result<usize> {
    let idx = table.column_index(column)?;
    let seen: HashSet<String> = table
        .rows()
        .iter()
        .filter_map(|r| r.get(idx).as_key())
        .collect();
    Ok(seen.len())
}

/// Sum `value` per distinct combination of `keys`, in first-seen order.
/// Rows with a null in any key column are left out of every group.
pub fn group_totals(
    table: &SalesTable,
    keys: &[&str],
    value: &str,
) -> Result<Vec<(Vec<String>, f64)>> {
    let key_idx = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<Result<Vec<_>>>()?;
    let value_idx = table.column_index(value)?;

    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<String>, f64)> = Vec::new();
    for row in table.rows() {
        let Some(key) = key_idx
            .iter()
            .map(|&i| row.get(i).as_key())
            .collect::<Option<Vec<String>>>()
        else {
            continue;
        };
        let amount = row.get(value_idx).as_f64();
        match index.get(&key) {
            Some(&pos) => groups[pos].1 += amount,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, amount));
            }
        }
    }
    Ok(groups)
}

/// Stable sort by value and keep the first `n`. Equal values keep their
/// incoming order.
pub fn rank(mut entries: Vec<RankEntry>, n: usize, direction: SortDirection) -> Ranking {
    entries.sort_by(|a, b| by_value(a.value, b.value, direction));
    entries.truncate(n);
    entries
}

fn by_value(a: f64, b: f64, direction: SortDirection) -> Ordering {
    let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// [`rank`] over composite keys: group by every column in `keys`, then keep
/// the first `n` groups by total.
pub fn top_groups(
    table: &SalesTable,
    keys: &[&str],
    value: &str,
    n: usize,
    direction: SortDirection,
) -> Result<Vec<(Vec<String>, f64)>> {
    let mut groups = group_totals(table, keys, value)?;
    groups.sort_by(|a, b| by_value(a.1, b.1, direction));
    groups.truncate(n);
    Ok(groups)
}

pub fn top_n(
    table: &SalesTable,
    group_key: &str,
    value_column: &str,
    n: usize,
    direction: SortDirection,
) -> Result<Ranking> {
    let entries = group_totals(table, &[group_key], value_column)?
        .into_iter()
        .map(|(mut key, value)| RankEntry {
            key: key.remove(0),
            value,
        })
        .collect();
    Ok(rank(entries, n, direction))
}

/// Every category with its sales, largest first.
pub fn category_breakdown(table: &SalesTable, category: &str, value: &str) -> Result<Ranking> {
    top_n(table, category, value, usize::MAX, SortDirection::Descending)
}

/// Current vs. prior totals per group, in first-seen group order.
pub fn growth(
    table: &SalesTable,
    group_key: &str,
    current_column: &str,
    prior_column: &str,
) -> Result<Vec<CustomerAggregate>> {
    let current = group_totals(table, &[group_key], current_column)?;
    let prior: HashMap<Vec<String>, f64> = group_totals(table, &[group_key], prior_column)?
        .into_iter()
        .collect();

    Ok(current
        .into_iter()
        .map(|(key, current)| {
            let prior = prior.get(&key).copied().unwrap_or(0.0);
            let dollar_growth = current - prior;
            let percent_growth = if prior == 0.0 {
                None
            } else {
                Some(dollar_growth / prior * 100.0)
            };
            CustomerAggregate {
                customer: key.into_iter().next().unwrap_or_default(),
                current,
                prior,
                dollar_growth,
                percent_growth,
            }
        })
        .collect())
}

fn dollar_entries(aggregates: &[CustomerAggregate]) -> Vec<RankEntry> {
    aggregates
        .iter()
        .map(|a| RankEntry {
            key: a.customer.clone(),
            value: a.dollar_growth,
        })
        .collect()
}

pub fn top_growth_by_dollar(aggregates: &[CustomerAggregate], n: usize) -> Ranking {
    rank(dollar_entries(aggregates), n, SortDirection::Descending)
}

pub fn top_decline_by_dollar(aggregates: &[CustomerAggregate], n: usize) -> Ranking {
    rank(dollar_entries(aggregates), n, SortDirection::Ascending)
}

/// Ranks by percent growth. Groups without a prior-period base are never
/// ranked; with `require_positive` only growing groups are kept.
pub fn top_growth_by_percent(
    aggregates: &[CustomerAggregate],
    n: usize,
    require_positive: bool,
) -> Ranking {
    let entries = aggregates
        .iter()
        .filter_map(|a| {
            let pct = a.percent_growth?;
            if require_positive && pct <= 0.0 {
                return None;
            }
            Some(RankEntry {
                key: a.customer.clone(),
                value: pct,
            })
        })
        .collect();
    rank(entries, n, SortDirection::Descending)
}

/// Share of the budget reached, in percent. No budget means 0.
pub fn percent_to_goal(total: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        total / budget * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::types::{CellValue, Column, ColumnFormat, SalesRow};
    use pretty_assertions::assert_eq;

    pub(crate) fn sales_table(rows: &[(Option<&str>, Option<&str>, f64, f64)]) -> SalesTable {
        let columns = vec![
            Column::new("Customer Name", ColumnFormat::Plain),
            Column::new("Category 1", ColumnFormat::Plain),
            Column::new("Sales Rep", ColumnFormat::Plain),
            Column::new("Current Sales", ColumnFormat::Currency),
            Column::new("Prior Sales", ColumnFormat::Currency),
        ];
        let text = |v: Option<&str>| v.map_or(CellValue::Null, |s| CellValue::Text(s.into()));
        let rows = rows
            .iter()
            .map(|(customer, category, current, prior)| SalesRow {
                cells: vec![
                    text(*customer),
                    text(*category),
                    CellValue::Text("609".into()),
                    CellValue::Number(*current),
                    CellValue::Number(*prior),
                ],
            })
            .collect();
        SalesTable::new(columns, rows)
    }

    fn keys(ranking: &Ranking) -> Vec<&str> {
        ranking.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn empty_table_totals_zero_and_ranks_nothing() {
        let table = sales_table(&[]);
        assert_eq!(total(&table, "Current Sales").unwrap(), 0.0);
        assert!(top_n(&table, "Customer Name", "Current Sales", 10, SortDirection::Descending)
            .unwrap()
            .is_empty());
        let aggs = growth(&table, "Customer Name", "Current Sales", "Prior Sales").unwrap();
        assert!(aggs.is_empty());
        assert!(top_growth_by_dollar(&aggs, 3).is_empty());
        assert!(top_growth_by_percent(&aggs, 3, true).is_empty());
    }

    #[test]
    fn two_customer_scenario() {
        let table = sales_table(&[
            (Some("A"), Some("Fans"), 100.0, 50.0),
            (Some("B"), Some("Fans"), 30.0, 60.0),
        ]);
        assert_eq!(total(&table, "Current Sales").unwrap(), 130.0);

        let aggs = growth(&table, "Customer Name", "Current Sales", "Prior Sales").unwrap();
        assert_eq!(
            aggs,
            vec![
                CustomerAggregate {
                    customer: "A".into(),
                    current: 100.0,
                    prior: 50.0,
                    dollar_growth: 50.0,
                    percent_growth: Some(100.0),
                },
                CustomerAggregate {
                    customer: "B".into(),
                    current: 30.0,
                    prior: 60.0,
                    dollar_growth: -30.0,
                    percent_growth: Some(-50.0),
                },
            ]
        );
        assert_eq!(keys(&top_growth_by_dollar(&aggs, 1)), vec!["A"]);
        assert_eq!(keys(&top_decline_by_dollar(&aggs, 1)), vec!["B"]);
    }

    #[test]
    fn zero_prior_is_never_percent_ranked() {
        let table = sales_table(&[
            (Some("New"), None, 1_000_000.0, 0.0),
            (Some("Old"), None, 110.0, 100.0),
            (Some("Down"), None, 50.0, 100.0),
        ]);
        let aggs = growth(&table, "Customer Name", "Current Sales", "Prior Sales").unwrap();
        assert_eq!(aggs[0].percent_growth, None);

        let ranked = top_growth_by_percent(&aggs, 10, true);
        assert_eq!(keys(&ranked), vec!["Old"]);
        assert!((ranked[0].value - 10.0).abs() < 1e-9);

        let all = top_growth_by_percent(&aggs, 10, false);
        assert_eq!(keys(&all), vec!["Old", "Down"]);
    }

    #[test]
    fn top_n_larger_than_groups_returns_all_sorted() {
        let table = sales_table(&[
            (Some("A"), None, 5.0, 0.0),
            (Some("B"), None, 20.0, 0.0),
            (Some("A"), None, 10.0, 0.0),
            (Some("C"), None, 1.0, 0.0),
        ]);
        let desc = top_n(&table, "Customer Name", "Current Sales", 50, SortDirection::Descending)
            .unwrap();
        assert_eq!(
            desc,
            vec![
                RankEntry { key: "B".into(), value: 20.0 },
                RankEntry { key: "A".into(), value: 15.0 },
                RankEntry { key: "C".into(), value: 1.0 },
            ]
        );
        let asc = top_n(&table, "Customer Name", "Current Sales", 2, SortDirection::Ascending)
            .unwrap();
        assert_eq!(keys(&asc), vec!["C", "A"]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let table = sales_table(&[
            (Some("Zed"), None, 10.0, 0.0),
            (Some("Amy"), None, 10.0, 0.0),
            (Some("Bob"), None, 10.0, 0.0),
        ]);
        for direction in [SortDirection::Descending, SortDirection::Ascending] {
            let ranked = top_n(&table, "Customer Name", "Current Sales", 3, direction).unwrap();
            assert_eq!(keys(&ranked), vec!["Zed", "Amy", "Bob"]);
        }
    }

    #[test]
    fn null_keys_form_no_group_but_count_in_totals() {
        let table = sales_table(&[
            (None, Some("Fans"), 40.0, 0.0),
            (Some("A"), None, 10.0, 0.0),
        ]);
        assert_eq!(total(&table, "Current Sales").unwrap(), 50.0);
        let ranked = top_n(&table, "Customer Name", "Current Sales", 10, SortDirection::Descending)
            .unwrap();
        assert_eq!(keys(&ranked), vec!["A"]);
        let cats = category_breakdown(&table, "Category 1", "Current Sales").unwrap();
        assert_eq!(keys(&cats), vec!["Fans"]);
        assert_eq!(distinct_count(&table, "Customer Name").unwrap(), 1);
    }

    #[test]
    fn composite_group_keys() {
        let table = sales_table(&[
            (Some("A"), Some("Fans"), 1.0, 0.0),
            (Some("A"), Some("Lights"), 2.0, 0.0),
            (Some("A"), Some("Fans"), 3.0, 0.0),
        ]);
        let groups = group_totals(&table, &["Customer Name", "Category 1"], "Current Sales").unwrap();
        assert_eq!(
            groups,
            vec![
                (vec!["A".to_string(), "Fans".to_string()], 4.0),
                (vec!["A".to_string(), "Lights".to_string()], 2.0),
            ]
        );
    }

    #[test]
    fn composite_ranking_is_tie_stable() {
        let table = sales_table(&[
            (Some("Zed"), Some("Fans"), 10.0, 0.0),
            (Some("Amy"), Some("Fans"), 25.0, 0.0),
            (Some("Bob"), Some("Lights"), 10.0, 0.0),
            (Some("Amy"), Some("Lights"), 1.0, 0.0),
        ]);
        let keys = ["Customer Name", "Category 1"];
        let top = top_groups(&table, &keys, "Current Sales", 3, SortDirection::Descending).unwrap();
        let names: Vec<(&str, f64)> = top.iter().map(|(k, v)| (k[0].as_str(), *v)).collect();
        assert_eq!(names, vec![("Amy", 25.0), ("Zed", 10.0), ("Bob", 10.0)]);

        let bottom = top_groups(&table, &keys, "Current Sales", 2, SortDirection::Ascending).unwrap();
        assert_eq!(bottom[0].0, vec!["Amy".to_string(), "Lights".to_string()]);
        assert_eq!(bottom[1].0, vec!["Zed".to_string(), "Fans".to_string()]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let table = sales_table(&[]);
        let err = total(&table, "FY25 Current MTD").unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(c) if c == "FY25 Current MTD"));
    }

    #[test]
    fn percent_to_goal_without_budget_is_zero() {
        assert_eq!(percent_to_goal(500.0, 0.0), 0.0);
        assert_eq!(percent_to_goal(250.0, 1000.0), 25.0);
    }
}
