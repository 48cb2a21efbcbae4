// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-product attribute tables for the identify popup.

use chrono::NaiveDate;

use super::query::{AttributeValue, Attributes};

/// Popup tab, one per chart product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductTab {
    /// S-57 electronic navigational chart cell.
    Enc,
    /// S-102 bathymetric surface.
    Bathymetry,
    /// S-111 surface currents.
    SurfaceCurrents,
}

/// Rows rendered for the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTable {
    pub title: &'static str,
    pub rows: Vec<(String, String)>,
}

impl AttributeTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ProductTab {
    pub const ALL: [ProductTab; 3] = [
        ProductTab::Enc,
        ProductTab::Bathymetry,
        ProductTab::SurfaceCurrents,
    ];

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            ProductTab::Enc => "ENC",
            ProductTab::Bathymetry => "S-102 Bathymetry",
            ProductTab::SurfaceCurrents => "S-111 Surface Currents",
        }
    }

    /// Tab opened for a fresh result: surface currents while the forecast
    /// layer is on screen, the chart cell otherwise.
    #[must_use]
    pub fn default_for(forecast_visible: bool) -> Self {
        if forecast_visible {
            ProductTab::SurfaceCurrents
        } else {
            ProductTab::Enc
        }
    }

    fn fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProductTab::Enc => &[
                ("CELL_NAME", "Cell"),
                ("TITLE", "Title"),
                ("EDTN", "Edition"),
                ("UPDN", "Update"),
                ("ISDT", "Issue Date"),
                ("CSCL", "Compilation Scale"),
                ("USAGE", "Usage Band"),
            ],
            ProductTab::Bathymetry => &[
                ("S102_FILE", "Dataset"),
                ("S102_RES", "Resolution"),
                ("S102_VDATUM", "Vertical Datum"),
                ("S102_ISSUE", "Issue Date"),
            ],
            ProductTab::SurfaceCurrents => &[
                ("S111_MODEL", "Model"),
                ("S111_FILE", "Dataset"),
                ("S111_TYPE", "Coding Format"),
                ("S111_ISSUE", "Issue Time"),
            ],
        }
    }

    fn format_value(&self, field: &str, value: &AttributeValue) -> String {
        match (self, field) {
            (ProductTab::Enc | ProductTab::Bathymetry, "ISDT" | "S102_ISSUE") => value
                .as_text()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y%m%d").ok())
                .map_or_else(|| value.to_string(), |d| d.format("%Y-%m-%d").to_string()),
            (ProductTab::Enc, "CSCL") => match value {
                AttributeValue::Integer(n) => format!("1:{n}"),
                #[allow(clippy::cast_possible_truncation, reason = "chart scales are whole numbers")]
                AttributeValue::Float(x) => format!("1:{}", x.round() as i64),
                other => other.to_string(),
            },
            (ProductTab::Bathymetry, "S102_RES") => format!("{value} m"),
            (ProductTab::SurfaceCurrents, "S111_MODEL") => value.to_string().to_uppercase(),
            _ => value.to_string(),
        }
    }

    /// Build this tab's table from a feature's attributes.
    ///
    /// Field names are matched case-insensitively; missing and null fields
    /// are skipped.
    #[must_use]
    pub fn render(&self, attributes: &Attributes) -> AttributeTable {
        let rows = self
            .fields()
            .iter()
            .filter_map(|(field, label)| {
                let value = attributes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(field))
                    .map(|(_, v)| v)?;
                if *value == AttributeValue::Null {
                    return None;
                }
                Some(((*label).to_owned(), self.format_value(field, value)))
            })
            .collect();

        AttributeTable {
            title: self.title(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> Attributes {
        let mut a = Attributes::new();
        a.insert("cell_name".into(), AttributeValue::Text("US5MD22M".into()));
        a.insert("EDTN".into(), AttributeValue::Integer(14));
        a.insert("ISDT".into(), AttributeValue::Text("20191104".into()));
        a.insert("CSCL".into(), AttributeValue::Float(40000.0));
        a.insert("TITLE".into(), AttributeValue::Null);
        a.insert("S102_RES".into(), AttributeValue::Integer(4));
        a.insert("S111_MODEL".into(), AttributeValue::Text("cbofs".into()));
        a
    }

    #[test]
    fn test_enc_table() {
        let table = ProductTab::Enc.render(&attrs());
        assert_eq!(table.title, "ENC");
        assert_eq!(
            table.rows,
            vec![
                ("Cell".to_owned(), "US5MD22M".to_owned()),
                ("Edition".to_owned(), "14".to_owned()),
                ("Issue Date".to_owned(), "2019-11-04".to_owned()),
                ("Compilation Scale".to_owned(), "1:40000".to_owned()),
            ]
        );
    }

    #[test]
    fn test_product_formatters_differ() {
        let bathy = ProductTab::Bathymetry.render(&attrs());
        assert_eq!(bathy.rows, vec![("Resolution".to_owned(), "4 m".to_owned())]);

        let currents = ProductTab::SurfaceCurrents.render(&attrs());
        assert_eq!(currents.rows, vec![("Model".to_owned(), "CBOFS".to_owned())]);
    }

    #[test]
    fn test_missing_product_is_empty() {
        let mut a = Attributes::new();
        a.insert("CELL_NAME".into(), AttributeValue::Text("US4FL1AM".into()));
        assert!(ProductTab::Bathymetry.render(&a).is_empty());
    }

    #[test]
    fn test_default_tab() {
        assert_eq!(ProductTab::default_for(true), ProductTab::SurfaceCurrents);
        assert_eq!(ProductTab::default_for(false), ProductTab::Enc);
    }
}
