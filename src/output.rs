use crate::error::{DashboardError, Result};
use crate::pipeline::{DashboardView, ViewOutcome};
use crate::types::{
    AggregateResult, CategoryRankingRow, ColumnSlot, Dataset, DemographicSummary, Field, MetricRow,
    PreviewRow, RankedEntry, Record,
};
use crate::util::{format_count, format_eok, format_int, format_man_count, format_number, render_number};
use chrono::Local;
use encoding_rs::Encoding;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

/// Serialize rows with the dataset's canonical headers and encode the text
/// in `encoding`. Reading the bytes back with an identity schema reproduces
/// the same records.
pub fn encode_records(dataset: &Dataset, records: &[&Record], encoding: &'static Encoding) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&dataset.headers)?;
    for r in records {
        wtr.write_record(dataset.layout.iter().map(|slot| render_cell(r, *slot)))?;
    }
    let buf = wtr.into_inner().map_err(|e| DashboardError::Io(e.into_error()))?;
    let text = String::from_utf8(buf).map_err(|_| DashboardError::Encode {
        encoding: "UTF-8".to_string(),
    })?;

    let (bytes, _, unmappable) = encoding.encode(&text);
    if unmappable {
        return Err(DashboardError::Encode { encoding: encoding.name().to_string() });
    }
    Ok(bytes.into_owned())
}

fn render_cell(r: &Record, slot: ColumnSlot) -> String {
    match slot {
        ColumnSlot::Field(f) if f.is_numeric() => render_number(r.number(f)),
        ColumnSlot::Field(f) => r.text(f).unwrap_or_default().to_string(),
        ColumnSlot::AgeSales(i) => render_number(r.age_sales.get(i).copied().flatten()),
        ColumnSlot::Extra(i) => r.extra.get(i).cloned().flatten().unwrap_or_default(),
    }
}

pub fn export_records(
    path: &Path,
    dataset: &Dataset,
    records: &[&Record],
    encoding: &'static Encoding,
) -> Result<()> {
    let bytes = encode_records(dataset, records, encoding)?;
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), rows = records.len(), encoding = encoding.name(), "Filtered rows exported");
    Ok(())
}

/// `<dir>/<stem>_<YYYYmmdd_HHMMSS>.<ext>` using local time.
pub fn timestamped_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.{}", stem, ts, ext))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "Summary written");
    Ok(())
}

pub fn metric_rows(summary: &AggregateResult) -> Vec<MetricRow> {
    vec![
        MetricRow { metric: "💰 총 분기 매출액".to_string(), value: format_eok(summary.total_sales) },
        MetricRow {
            metric: "🧾 총 분기 거래건수".to_string(),
            value: format_man_count(summary.total_transactions),
        },
        MetricRow {
            metric: "🏙️ 분석 상권 수".to_string(),
            value: format_count(summary.distinct_district_count),
        },
        MetricRow {
            metric: "🏷️ 업종 종류".to_string(),
            value: format_count(summary.distinct_category_count),
        },
    ]
}

pub fn ranking_rows(ranking: &[RankedEntry]) -> Vec<CategoryRankingRow> {
    ranking
        .iter()
        .map(|e| {
            let medal = match e.rank {
                1 => "🥇 ",
                2 => "🥈 ",
                3 => "🥉 ",
                _ => "",
            };
            CategoryRankingRow {
                rank: format!("{}{}", medal, e.rank),
                category: e.category.clone(),
                sales: format_eok(e.sales),
            }
        })
        .collect()
}

pub fn preview_rows(records: &[&Record], max_rows: usize) -> Vec<PreviewRow> {
    let text = |r: &Record, f: Field| r.text(f).unwrap_or("-").to_string();
    let num = |v: Option<f64>| v.map(|n| format_number(n, 0)).unwrap_or_else(|| "-".to_string());
    records
        .iter()
        .copied()
        .take(max_rows)
        .map(|r| PreviewRow {
            period_code: text(r, Field::PeriodCode),
            district_type: text(r, Field::DistrictType),
            district_name: text(r, Field::DistrictName),
            category: text(r, Field::Category),
            sales: num(r.quarterly_sales_amount),
            transactions: num(r.quarterly_transaction_count),
        })
        .collect()
}

pub fn demographic_lines(d: &DemographicSummary) -> Vec<String> {
    let mut lines = Vec::new();
    match &d.gender {
        Some(g) => lines.push(format!(
            "성별 매출: 남성 {} ({}%) / 여성 {} ({}%)",
            format_eok(g.male_sales),
            format_number(g.male_share_pct, 1),
            format_eok(g.female_sales),
            format_number(g.female_share_pct, 1)
        )),
        None => lines.push("성별 매출: 데이터 없음".to_string()),
    }
    match &d.age {
        Some(ages) => {
            let parts: Vec<String> = ages
                .iter()
                .map(|a| format!("{} {}", a.bracket, format_eok(a.sales)))
                .collect();
            lines.push(format!("연령대 매출: {}", parts.join(" | ")));
        }
        None => lines.push("연령대 매출: 데이터 없음".to_string()),
    }
    lines
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn print_dashboard(view: &DashboardView<'_>, selection_label: &str) {
    println!("\n📊 서울 상권 분기 대시보드");
    println!("{}", selection_label);

    let metrics = match &view.outcome {
        ViewOutcome::Empty => {
            println!("\n⚠️ 선택한 조건에 해당하는 데이터가 없어요. 필터를 조정해 주세요.\n");
            return;
        }
        ViewOutcome::Populated(m) => m,
    };

    preview_table("주요 지표", None, &metric_rows(&metrics.summary), 4);
    preview_table(
        "업종별 매출 순위",
        Some(format!("상위 {}개 업종", metrics.ranking.len()).as_str()),
        &ranking_rows(&metrics.ranking),
        metrics.ranking.len(),
    );
    for line in demographic_lines(&metrics.demographics) {
        println!("{}", line);
    }
    preview_table(
        "🔎 데이터 미리보기",
        Some(format!("{} rows", format_int(view.filtered.len())).as_str()),
        &preview_rows(&view.filtered, 10),
        10,
    );
}
