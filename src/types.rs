use serde::Serialize;
use tabled::Tabled;

/// Canonical fields the rest of the crate relies on. Raw source headers are
/// mapped onto these names by the loader; nothing downstream sees the raw
/// wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PeriodCode,
    DistrictType,
    DistrictCode,
    DistrictName,
    Category,
    QuarterlySalesAmount,
    QuarterlyTransactionCount,
    MaleSalesAmount,
    FemaleSalesAmount,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::PeriodCode,
        Field::DistrictType,
        Field::DistrictCode,
        Field::DistrictName,
        Field::Category,
        Field::QuarterlySalesAmount,
        Field::QuarterlyTransactionCount,
        Field::MaleSalesAmount,
        Field::FemaleSalesAmount,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::PeriodCode => "period_code",
            Field::DistrictType => "district_type",
            Field::DistrictCode => "district_code",
            Field::DistrictName => "district_name",
            Field::Category => "category",
            Field::QuarterlySalesAmount => "quarterly_sales_amount",
            Field::QuarterlyTransactionCount => "quarterly_transaction_count",
            Field::MaleSalesAmount => "male_sales_amount",
            Field::FemaleSalesAmount => "female_sales_amount",
        }
    }

    pub fn from_canonical(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.canonical_name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::QuarterlySalesAmount
                | Field::QuarterlyTransactionCount
                | Field::MaleSalesAmount
                | Field::FemaleSalesAmount
        )
    }
}

/// Where a column of the normalized table lands inside a `Record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSlot {
    Field(Field),
    /// Index into `Dataset::age_brackets` / `Record::age_sales`.
    AgeSales(usize),
    /// Index into `Dataset::extra_columns` / `Record::extra`.
    Extra(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub period_code: Option<String>,
    pub district_type: Option<String>,
    pub district_code: Option<String>,
    pub district_name: Option<String>,
    pub category: Option<String>,
    pub quarterly_sales_amount: Option<f64>,
    pub quarterly_transaction_count: Option<f64>,
    pub male_sales_amount: Option<f64>,
    pub female_sales_amount: Option<f64>,
    pub age_sales: Vec<Option<f64>>,
    pub extra: Vec<Option<String>>,
}

impl Record {
    pub fn text(&self, field: Field) -> Option<&str> {
        let v = match field {
            Field::PeriodCode => &self.period_code,
            Field::DistrictType => &self.district_type,
            Field::DistrictCode => &self.district_code,
            Field::DistrictName => &self.district_name,
            Field::Category => &self.category,
            _ => return None,
        };
        v.as_deref()
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::QuarterlySalesAmount => self.quarterly_sales_amount,
            Field::QuarterlyTransactionCount => self.quarterly_transaction_count,
            Field::MaleSalesAmount => self.male_sales_amount,
            Field::FemaleSalesAmount => self.female_sales_amount,
            _ => None,
        }
    }

    pub(crate) fn set_text(&mut self, field: Field, value: Option<String>) {
        match field {
            Field::PeriodCode => self.period_code = value,
            Field::DistrictType => self.district_type = value,
            Field::DistrictCode => self.district_code = value,
            Field::DistrictName => self.district_name = value,
            Field::Category => self.category = value,
            _ => {}
        }
    }

    pub(crate) fn set_number(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::QuarterlySalesAmount => self.quarterly_sales_amount = value,
            Field::QuarterlyTransactionCount => self.quarterly_transaction_count = value,
            Field::MaleSalesAmount => self.male_sales_amount = value,
            Field::FemaleSalesAmount => self.female_sales_amount = value,
            _ => {}
        }
    }
}

/// The normalized table. Loaded once and then only borrowed: filtered views
/// are `Vec<&Record>` into `records`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Header names after renaming, in source order.
    pub headers: Vec<String>,
    /// One slot per entry of `headers`.
    pub layout: Vec<ColumnSlot>,
    /// Display labels of the age-bracket columns present, e.g. `"10s"`.
    pub age_brackets: Vec<String>,
    pub extra_columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn has_field(&self, field: Field) -> bool {
        self.layout.contains(&ColumnSlot::Field(field))
    }

    pub fn has_gender_columns(&self) -> bool {
        self.has_field(Field::MaleSalesAmount) && self.has_field(Field::FemaleSalesAmount)
    }

    pub fn all(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub total_sales: f64,
    pub total_transactions: f64,
    pub distinct_district_count: usize,
    pub distinct_category_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub category: String,
    pub sales: f64,
    /// `sales` expressed in units of 100,000,000 (억).
    pub sales_eok: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderSplit {
    pub male_sales: f64,
    pub female_sales: f64,
    pub male_share_pct: f64,
    pub female_share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeSales {
    pub bracket: String,
    pub sales: f64,
}

/// `None` members mean the source has no such columns, which is not the
/// same as zero sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemographicSummary {
    pub gender: Option<GenderSplit>,
    pub age: Option<Vec<AgeSales>>,
}

#[derive(Debug, Tabled, Clone)]
pub struct CategoryRankingRow {
    #[tabled(rename = "Rank")]
    pub rank: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Sales")]
    pub sales: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct PreviewRow {
    #[tabled(rename = "period_code")]
    pub period_code: String,
    #[tabled(rename = "district_type")]
    pub district_type: String,
    #[tabled(rename = "district_name")]
    pub district_name: String,
    #[tabled(rename = "category")]
    pub category: String,
    #[tabled(rename = "quarterly_sales_amount")]
    pub sales: String,
    #[tabled(rename = "quarterly_transaction_count")]
    pub transactions: String,
}

#[derive(Debug, Tabled, Clone)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryExport<'a> {
    pub selection: String,
    pub row_count: usize,
    pub summary: &'a AggregateResult,
    pub ranking: &'a [RankedEntry],
    pub demographics: &'a DemographicSummary,
}
