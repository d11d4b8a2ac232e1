use crate::types::{
    AgeSales, AggregateResult, Dataset, DemographicSummary, Field, GenderSplit, RankedEntry, Record,
};
use crate::util::{pct, EOK};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_TOP_N: usize = 10;
/// Size of the category pre-selection offered by `default_category_selection`.
pub const DEFAULT_CATEGORY_PICKS: usize = 5;

/// Headline metrics. Missing amounts count as zero; missing names are not
/// counted as a distinct value.
pub fn summarize(records: &[&Record]) -> AggregateResult {
    let total_sales = sum_field(records, Field::QuarterlySalesAmount);
    let total_transactions = sum_field(records, Field::QuarterlyTransactionCount);
    let districts: HashSet<&str> = records.iter().filter_map(|r| r.district_name.as_deref()).collect();
    let categories: HashSet<&str> = records.iter().filter_map(|r| r.category.as_deref()).collect();
    AggregateResult {
        total_sales,
        total_transactions,
        distinct_district_count: districts.len(),
        distinct_category_count: categories.len(),
    }
}

fn sum_field(records: &[&Record], field: Field) -> f64 {
    records.iter().filter_map(|r| r.number(field)).sum()
}

/// Categories ranked by summed sales, highest first, truncated to `n`.
///
/// Equal sums keep the order in which each category first appears in
/// `records`. Rows without a category are left out of the ranking.
pub fn top_categories(records: &[&Record], n: usize) -> Vec<RankedEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, f64)> = Vec::new();
    for r in records {
        let Some(cat) = r.category.as_deref() else { continue };
        let sales = r.quarterly_sales_amount.unwrap_or(0.0);
        match index.get(cat) {
            Some(&i) => groups[i].1 += sales,
            None => {
                index.insert(cat, groups.len());
                groups.push((cat, sales));
            }
        }
    }

    // `sort_by` is stable, which gives the first-seen tie-break.
    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    groups
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(idx, (category, sales))| RankedEntry {
            rank: idx + 1,
            category: category.to_string(),
            sales,
            sales_eok: sales / EOK,
        })
        .collect()
}

/// Category names to pre-populate the category filter with.
pub fn default_category_selection(records: &[&Record]) -> Vec<String> {
    top_categories(records, DEFAULT_CATEGORY_PICKS)
        .into_iter()
        .map(|e| e.category)
        .collect()
}

/// Gender and age-bracket breakdowns, each only when the dataset carries
/// the underlying columns.
pub fn demographics(dataset: &Dataset, records: &[&Record]) -> DemographicSummary {
    let gender = dataset.has_gender_columns().then(|| {
        let male_sales = sum_field(records, Field::MaleSalesAmount);
        let female_sales = sum_field(records, Field::FemaleSalesAmount);
        let combined = male_sales + female_sales;
        GenderSplit {
            male_sales,
            female_sales,
            male_share_pct: pct(male_sales, combined),
            female_share_pct: pct(female_sales, combined),
        }
    });

    let age = (!dataset.age_brackets.is_empty()).then(|| {
        dataset
            .age_brackets
            .iter()
            .enumerate()
            .map(|(i, label)| AgeSales {
                bracket: label.clone(),
                sales: records
                    .iter()
                    .filter_map(|r| r.age_sales.get(i).copied().flatten())
                    .sum(),
            })
            .collect()
    });

    DemographicSummary { gender, age }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnSlot;

    fn rec(period: &str, category: &str, sales: Option<f64>, tx: Option<f64>) -> Record {
        Record {
            period_code: Some(period.to_string()),
            category: Some(category.to_string()),
            quarterly_sales_amount: sales,
            quarterly_transaction_count: tx,
            ..Default::default()
        }
    }

    fn scenario() -> Vec<Record> {
        vec![
            rec("20231", "Cafe", Some(100000000.0), Some(50.0)),
            rec("20231", "Cafe", Some(50000000.0), Some(20.0)),
            rec("20232", "Bar", Some(300000000.0), Some(10.0)),
        ]
    }

    #[test]
    fn test_summarize_scenario() {
        let data = scenario();
        let refs: Vec<&Record> = data.iter().collect();
        let s = summarize(&refs);
        assert_eq!(s.total_sales, 450000000.0);
        assert_eq!(s.total_transactions, 80.0);
        assert_eq!(s.distinct_district_count, 0);
        assert_eq!(s.distinct_category_count, 2);
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        assert_eq!(summarize(&[]), AggregateResult::default());
        assert!(top_categories(&[], 10).is_empty());
    }

    #[test]
    fn test_nulls_sum_as_zero() {
        let data = vec![
            rec("20231", "Cafe", None, Some(1.0)),
            rec("20231", "Cafe", Some(7.0), None),
            rec("20231", "Bar", None, None),
        ];
        let refs: Vec<&Record> = data.iter().collect();
        let s = summarize(&refs);
        assert_eq!(s.total_sales, 7.0);
        assert_eq!(s.total_transactions, 1.0);

        let ranking = top_categories(&refs, 10);
        assert_eq!(ranking[0].category, "Cafe");
        assert_eq!(ranking[0].sales, 7.0);
        assert_eq!(ranking[1].sales, 0.0);
    }

    #[test]
    fn test_distinct_counts_skip_missing_names() {
        let mut data = scenario();
        data[0].district_name = Some("이화시장".to_string());
        data[1].district_name = Some("이화시장".to_string());
        data[2].category = None;
        let refs: Vec<&Record> = data.iter().collect();
        let s = summarize(&refs);
        assert_eq!(s.distinct_district_count, 1);
        assert_eq!(s.distinct_category_count, 1);
    }

    #[test]
    fn test_top_categories_scenario() {
        let data = scenario();
        let refs: Vec<&Record> = data.iter().collect();
        let ranking = top_categories(&refs, DEFAULT_TOP_N);
        assert_eq!(
            ranking,
            vec![
                RankedEntry { rank: 1, category: "Bar".to_string(), sales: 300000000.0, sales_eok: 3.0 },
                RankedEntry { rank: 2, category: "Cafe".to_string(), sales: 150000000.0, sales_eok: 1.5 },
            ]
        );
    }

    #[test]
    fn test_top_categories_truncates_and_orders() {
        let data: Vec<Record> = (0..15)
            .map(|i| rec("20231", &format!("cat{}", i), Some((i * 7 % 11) as f64), None))
            .collect();
        let refs: Vec<&Record> = data.iter().collect();

        let ranking = top_categories(&refs, 10);
        assert_eq!(ranking.len(), 10);
        for (pos, e) in ranking.iter().enumerate() {
            assert_eq!(e.rank, pos + 1);
        }
        assert!(ranking.windows(2).all(|w| w[0].sales >= w[1].sales));
        assert_eq!(top_categories(&refs, 100).len(), 15);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let data = vec![
            rec("20231", "Noodles", Some(5.0), None),
            rec("20231", "Bakery", Some(9.0), None),
            rec("20231", "Florist", Some(5.0), None),
            rec("20231", "Apparel", Some(5.0), None),
        ];
        let refs: Vec<&Record> = data.iter().collect();
        let names: Vec<String> = top_categories(&refs, 10).into_iter().map(|e| e.category).collect();
        assert_eq!(names, vec!["Bakery", "Noodles", "Florist", "Apparel"]);
    }

    #[test]
    fn test_default_category_selection_takes_five() {
        let data: Vec<Record> = (0..8)
            .map(|i| rec("20231", &format!("c{}", i), Some(i as f64), None))
            .collect();
        let refs: Vec<&Record> = data.iter().collect();
        assert_eq!(default_category_selection(&refs), vec!["c7", "c6", "c5", "c4", "c3"]);
    }

    #[test]
    fn test_demographics_unavailable_without_columns() {
        let ds = Dataset::default();
        let d = demographics(&ds, &[]);
        assert!(d.gender.is_none());
        assert!(d.age.is_none());
    }

    #[test]
    fn test_demographics_sums_and_shares() {
        let mut ds = Dataset {
            layout: vec![
                ColumnSlot::Field(Field::MaleSalesAmount),
                ColumnSlot::Field(Field::FemaleSalesAmount),
                ColumnSlot::AgeSales(0),
                ColumnSlot::AgeSales(1),
            ],
            age_brackets: vec!["20s".to_string(), "60+".to_string()],
            ..Default::default()
        };
        ds.records = vec![
            Record {
                male_sales_amount: Some(30.0),
                female_sales_amount: Some(10.0),
                age_sales: vec![Some(5.0), None],
                ..Default::default()
            },
            Record {
                male_sales_amount: None,
                female_sales_amount: Some(60.0),
                age_sales: vec![Some(1.0), Some(2.0)],
                ..Default::default()
            },
        ];
        let refs = ds.all();
        let d = demographics(&ds, &refs);

        let g = d.gender.unwrap();
        assert_eq!(g.male_sales, 30.0);
        assert_eq!(g.female_sales, 70.0);
        assert_eq!(g.male_share_pct, 30.0);
        assert_eq!(g.female_share_pct, 70.0);
        assert_eq!(
            d.age.unwrap(),
            vec![
                AgeSales { bracket: "20s".to_string(), sales: 6.0 },
                AgeSales { bracket: "60+".to_string(), sales: 2.0 },
            ]
        );
    }

    #[test]
    fn test_gender_shares_zero_when_no_sales() {
        let ds = Dataset {
            layout: vec![
                ColumnSlot::Field(Field::MaleSalesAmount),
                ColumnSlot::Field(Field::FemaleSalesAmount),
            ],
            ..Default::default()
        };
        let g = demographics(&ds, &[]).gender.unwrap();
        assert_eq!(g.male_share_pct, 0.0);
        assert_eq!(g.female_share_pct, 0.0);
    }
}
