use crate::config::SchemaConfig;
use crate::error::{DashboardError, Result};
use crate::types::{ColumnSlot, Dataset, Field, Record};
use crate::util::{parse_f64_safe, parse_text};
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows with fewer cells than the header; missing cells read as blank.
    pub short_rows: usize,
    /// Non-blank numeric cells that failed to parse and became missing.
    pub coerced_cells: usize,
}

/// Turns raw extract bytes into a canonical `Dataset`.
///
/// Only structural problems fail: unknown encoding, undecodable bytes,
/// unparseable CSV, or required columns absent after renaming. Bad cells
/// become `None` and are counted in the `LoadReport`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: SchemaConfig,
    encoding: &'static Encoding,
}

impl Normalizer {
    pub fn new(config: SchemaConfig) -> Result<Self> {
        config.validate()?;
        let encoding = config.resolve_encoding()?;
        Ok(Normalizer { config, encoding })
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn load_path(&self, path: &Path) -> Result<(Dataset, LoadReport)> {
        if !path.exists() {
            return Err(DashboardError::FileNotFound { path: path.to_path_buf() });
        }
        let bytes = std::fs::read(path)?;
        self.normalize_bytes(&bytes, &path.display().to_string())
    }

    pub fn normalize_bytes(&self, bytes: &[u8], origin: &str) -> Result<(Dataset, LoadReport)> {
        let body = match Encoding::for_bom(bytes) {
            Some((enc, bom_len)) if enc == self.encoding => &bytes[bom_len..],
            _ => bytes,
        };
        let text = self
            .encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .ok_or_else(|| DashboardError::Decode {
                origin: origin.to_string(),
                encoding: self.encoding.name().to_string(),
            })?;
        self.normalize_text(&text)
    }

    pub fn normalize_text(&self, text: &str) -> Result<(Dataset, LoadReport)> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut dataset = self.map_headers(rdr.headers()?)?;
        let mut report = LoadReport::default();

        for result in rdr.records() {
            let row = result?;
            report.total_rows += 1;
            if row.len() < dataset.headers.len() {
                report.short_rows += 1;
            }

            let mut rec = Record {
                age_sales: vec![None; dataset.age_brackets.len()],
                extra: vec![None; dataset.extra_columns.len()],
                ..Default::default()
            };
            for (idx, slot) in dataset.layout.iter().enumerate() {
                let cell = row.get(idx);
                match *slot {
                    ColumnSlot::Field(field) if field.is_numeric() => {
                        let v = coerce_number(cell, &mut report);
                        rec.set_number(field, v);
                    }
                    ColumnSlot::Field(field) => rec.set_text(field, parse_text(cell)),
                    ColumnSlot::AgeSales(i) => rec.age_sales[i] = coerce_number(cell, &mut report),
                    ColumnSlot::Extra(i) => {
                        rec.extra[i] = cell.filter(|c| !c.is_empty()).map(str::to_string)
                    }
                }
            }
            dataset.records.push(rec);
        }

        if report.coerced_cells > 0 {
            debug!(cells = report.coerced_cells, "Numeric cells coerced to missing");
        }
        debug!(
            rows = report.total_rows,
            columns = dataset.headers.len(),
            age_brackets = dataset.age_brackets.len(),
            "Dataset normalized"
        );
        Ok((dataset, report))
    }

    fn map_headers(&self, raw: &csv::StringRecord) -> Result<Dataset> {
        let mut dataset = Dataset::default();
        let mut taken_brackets = vec![false; self.config.age_brackets.len()];

        for raw_name in raw.iter() {
            let name = self.config.canonical_name(raw_name).to_string();
            let field = Field::from_canonical(&name)
                .filter(|f| !dataset.layout.contains(&ColumnSlot::Field(*f)));
            let bracket = self
                .config
                .age_brackets
                .iter()
                .position(|b| b.column == name)
                .filter(|pos| !taken_brackets[*pos]);

            // A repeated canonical name is kept as a pass-through column.
            let slot = match (field, bracket) {
                (Some(f), _) => ColumnSlot::Field(f),
                (None, Some(pos)) => {
                    taken_brackets[pos] = true;
                    dataset.age_brackets.push(self.config.age_brackets[pos].label.clone());
                    ColumnSlot::AgeSales(dataset.age_brackets.len() - 1)
                }
                (None, None) => {
                    dataset.extra_columns.push(name.clone());
                    ColumnSlot::Extra(dataset.extra_columns.len() - 1)
                }
            };
            dataset.headers.push(name);
            dataset.layout.push(slot);
        }

        let missing: Vec<String> = self
            .config
            .required_columns
            .iter()
            .filter(|c| !dataset.headers.contains(c))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns { missing });
        }
        Ok(dataset)
    }
}

fn coerce_number(cell: Option<&str>, report: &mut LoadReport) -> Option<f64> {
    let v = parse_f64_safe(cell);
    if v.is_none() && cell.map_or(false, |c| !c.trim().is_empty()) {
        report.coerced_cells += 1;
    }
    v
}
