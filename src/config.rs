// Schema configuration for the normalizer.
//
// The rename map and required columns are plain data handed to the loader,
// so several schema versions can be exercised side by side.
use crate::error::{DashboardError, Result};
use crate::types::Field;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBracketColumn {
    /// Display label, e.g. `"20s"` or `"60+"`.
    pub label: String,
    /// Canonical column name after renaming.
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// WHATWG encoding label; `cp949` is accepted as an alias of EUC-KR.
    pub encoding: String,
    /// Raw header -> canonical name. Unmapped headers pass through.
    pub rename_map: BTreeMap<String, String>,
    /// Canonical names that must exist after renaming.
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub age_brackets: Vec<AgeBracketColumn>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::seoul_district_sales()
    }
}

impl SchemaConfig {
    /// Seoul commercial-district quarterly sales extract.
    pub fn seoul_district_sales() -> Self {
        let mut rename_map = BTreeMap::new();
        let pairs = [
            ("기준_년분기_코드", Field::PeriodCode),
            ("상권_구분_코드_명", Field::DistrictType),
            ("상권_코드", Field::DistrictCode),
            ("상권_코드_명", Field::DistrictName),
            ("서비스_업종_코드_명", Field::Category),
            ("당월_매출_금액", Field::QuarterlySalesAmount),
            ("당월_매출_건수", Field::QuarterlyTransactionCount),
            ("남성_매출_금액", Field::MaleSalesAmount),
            ("여성_매출_금액", Field::FemaleSalesAmount),
        ];
        for (raw, field) in pairs {
            rename_map.insert(raw.to_string(), field.canonical_name().to_string());
        }

        let mut age_brackets = Vec::new();
        for age in [10, 20, 30, 40, 50] {
            let column = format!("age_{}_sales_amount", age);
            rename_map.insert(format!("연령대_{}_매출_금액", age), column.clone());
            age_brackets.push(AgeBracketColumn { label: format!("{}s", age), column });
        }
        let column = "age_60_plus_sales_amount".to_string();
        rename_map.insert("연령대_60_이상_매출_금액".to_string(), column.clone());
        age_brackets.push(AgeBracketColumn { label: "60+".to_string(), column });

        SchemaConfig {
            encoding: "cp949".to_string(),
            rename_map,
            required_columns: [
                Field::PeriodCode,
                Field::QuarterlySalesAmount,
                Field::QuarterlyTransactionCount,
                Field::DistrictName,
                Field::Category,
            ]
            .iter()
            .map(|f| f.canonical_name().to_string())
            .collect(),
            age_brackets,
        }
    }

    /// Variant of the extract that also carries the district type.
    pub fn extended() -> Self {
        let mut cfg = Self::seoul_district_sales();
        cfg.required_columns
            .push(Field::DistrictType.canonical_name().to_string());
        cfg
    }

    /// Same schema, but every canonical name maps to itself. Used to read
    /// back files this crate exported.
    pub fn identity(&self) -> Self {
        let rename_map = self
            .rename_map
            .values()
            .map(|c| (c.clone(), c.clone()))
            .collect();
        SchemaConfig {
            encoding: self.encoding.clone(),
            rename_map,
            required_columns: self.required_columns.clone(),
            age_brackets: self.age_brackets.clone(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DashboardError::FileNotFound { path: path.to_path_buf() });
        }
        let s = std::fs::read_to_string(path)?;
        let cfg: SchemaConfig = serde_json::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.resolve_encoding()?;
        for col in &self.required_columns {
            if col.trim().is_empty() {
                return Err(DashboardError::Config {
                    message: "empty name in required_columns".to_string(),
                });
            }
        }
        for b in &self.age_brackets {
            if Field::from_canonical(&b.column).is_some() {
                return Err(DashboardError::Config {
                    message: format!("age bracket column {} collides with a canonical field", b.column),
                });
            }
        }
        Ok(())
    }

    pub fn resolve_encoding(&self) -> Result<&'static Encoding> {
        let label = self.encoding.trim();
        // Windows code page 949 is what WHATWG calls EUC-KR.
        let lookup = if label.eq_ignore_ascii_case("cp949") { "windows-949" } else { label };
        Encoding::for_label(lookup.as_bytes()).ok_or_else(|| DashboardError::UnknownEncoding {
            label: self.encoding.clone(),
        })
    }

    pub fn canonical_name<'a>(&'a self, raw: &'a str) -> &'a str {
        self.rename_map.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cp949_resolves_to_euc_kr() {
        let cfg = SchemaConfig::default();
        assert_eq!(cfg.resolve_encoding().unwrap(), encoding_rs::EUC_KR);
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let mut cfg = SchemaConfig::default();
        cfg.encoding = "klingon-8".to_string();
        assert!(matches!(
            cfg.resolve_encoding(),
            Err(DashboardError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_unmapped_header_passes_through() {
        let cfg = SchemaConfig::default();
        assert_eq!(cfg.canonical_name("당월_매출_금액"), "quarterly_sales_amount");
        assert_eq!(cfg.canonical_name("점포_수"), "점포_수");
    }

    #[test]
    fn test_extended_requires_district_type() {
        assert!(!SchemaConfig::default()
            .required_columns
            .contains(&"district_type".to_string()));
        assert!(SchemaConfig::extended()
            .required_columns
            .contains(&"district_type".to_string()));
    }

    #[test]
    fn test_identity_maps_canonical_to_itself() {
        let id = SchemaConfig::default().identity();
        assert_eq!(id.canonical_name("period_code"), "period_code");
        assert_eq!(id.canonical_name("age_60_plus_sales_amount"), "age_60_plus_sales_amount");
        assert!(!id.rename_map.contains_key("당월_매출_금액"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        let json = r#"{
            "encoding": "utf-8",
            "rename_map": { "Quarter": "period_code", "Sales": "quarterly_sales_amount" },
            "required_columns": ["period_code", "quarterly_sales_amount"]
        }"#;
        std::fs::write(&path, json).unwrap();
        let cfg = SchemaConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.canonical_name("Quarter"), "period_code");
        assert!(cfg.age_brackets.is_empty());
        assert_eq!(cfg.resolve_encoding().unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_age_bracket_colliding_with_field_is_rejected() {
        let mut cfg = SchemaConfig::default();
        cfg.age_brackets.push(AgeBracketColumn {
            label: "bad".to_string(),
            column: "category".to_string(),
        });
        assert!(matches!(cfg.validate(), Err(DashboardError::Config { .. })));
    }
}
