use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A canonical per-base-unit price extracted from scraped text. The
/// currency is attached by callers (everything in this system is VND).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPrice {
    pub price_per_unit: f64,
    pub unit: String,
}

static NUMERIC_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[\d.,]*").unwrap()
});

static EMBEDDED_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    // longer alternatives first so "kg" wins over "g" and "lít" over "l"
    Regex::new(r"(?i)/\s*([\d.,]*)\s*(kg|gói|goi|chai|ml|lít|lit|liter|l|g)\b").unwrap()
});

/// Map a raw unit label to its canonical base unit and the factor from one
/// raw unit to base units: kg→g (1000), l/lít/liter→ml (1000), g and ml
/// pass through, "chai"/"gói" packaged goods are atomic. Anything else is
/// treated as grams.
pub fn canonical_unit(raw: &str) -> (&'static str, f64) {
    match raw.trim().to_lowercase().as_str() {
        "kg" => ("g", 1000.0),
        "g" => ("g", 1.0),
        "l" | "lít" | "lit" | "liter" => ("ml", 1000.0),
        "ml" => ("ml", 1.0),
        "chai" => ("chai", 1.0),
        "gói" | "goi" => ("gói", 1.0),
        _ => ("g", 1.0),
    }
}

/// Normalize free-form scraped price text (e.g. "89.000đ", "22.000đ/500g",
/// "150.000đ/kg") into a per-base-unit price.
///
/// VND prices are integral, so "." and "," inside the numeric run are
/// always thousands separators, never decimal points — "89.000" is
/// eighty-nine thousand. A `/<qty><unit>` suffix prices the quantity it
/// names: the parsed total is divided by the quantity expressed in base
/// units. Without a suffix the whole price is the cost of exactly one
/// `declared_unit`; only the unit label is canonicalized, the magnitude is
/// left alone.
///
/// Returns `None` when no positive price can be extracted — an expected
/// miss, not a fault.
pub fn normalize(price_text: &str, declared_unit: &str) -> Option<NormalizedPrice> {
    let text = price_text.trim();
    let run = NUMERIC_RUN.find(text)?;
    let grouped: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    let price: f64 = grouped.parse().ok()?;
    if price <= 0.0 {
        return None;
    }

    if let Some(embedded) = EMBEDDED_UNIT.captures(&text[run.end()..]) {
        let qty = parse_quantity(&embedded[1])?;
        let (unit, factor) = canonical_unit(&embedded[2]);
        return Some(NormalizedPrice {
            price_per_unit: round2(price / (qty * factor)),
            unit: unit.to_string(),
        });
    }

    let (unit, _) = canonical_unit(declared_unit);
    Some(NormalizedPrice {
        price_per_unit: round2(price),
        unit: unit.to_string(),
    })
}

/// Quantity in an embedded suffix. Unlike the price run, a "." here is a
/// decimal point ("/1.5l" means one and a half liters); only "," grouping
/// is stripped. An absent quantity means one unit.
fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return Some(1.0);
    }
    let qty: f64 = cleaned.parse().ok()?;
    if qty <= 0.0 { None } else { Some(qty) }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(text: &str, declared: &str) -> NormalizedPrice {
        normalize(text, declared).unwrap()
    }

    #[test]
    fn bare_price_is_cost_of_one_declared_unit() {
        let result = price("89.000đ", "kg");

        // the unit label is canonicalized but the magnitude stays per
        // declared unit
        assert_eq!(result.price_per_unit, 89000.0);
        assert_eq!(result.unit, "g");
    }

    #[test]
    fn per_kg_suffix_divides_down_to_grams() {
        let result = price("150.000đ/kg", "kg");

        assert_eq!(result.price_per_unit, 150.0);
        assert_eq!(result.unit, "g");
    }

    #[test]
    fn quantity_suffix_divides_by_embedded_amount() {
        let result = price("22.000đ/500g", "g");

        assert_eq!(result.price_per_unit, 44.0);
        assert_eq!(result.unit, "g");
    }

    #[test]
    fn liter_suffix_converts_to_milliliters() {
        let result = price("25.000đ/2l", "l");
        assert_eq!(result.price_per_unit, 12.5);
        assert_eq!(result.unit, "ml");

        let result = price("32.000đ/lít", "l");
        assert_eq!(result.price_per_unit, 32.0);
        assert_eq!(result.unit, "ml");
    }

    #[test]
    fn packaged_units_stay_atomic() {
        let result = price("15.000đ/chai", "chai");
        assert_eq!(result.price_per_unit, 15000.0);
        assert_eq!(result.unit, "chai");

        let result = price("24.000đ/2 gói", "gói");
        assert_eq!(result.price_per_unit, 12000.0);
        assert_eq!(result.unit, "gói");
    }

    #[test]
    fn comma_grouping_parses_like_dot_grouping() {
        assert_eq!(price("1,200,000đ", "kg").price_per_unit, 1200000.0);
        assert_eq!(price("1.200.000đ", "kg").price_per_unit, 1200000.0);
    }

    #[test]
    fn short_dot_group_is_not_a_decimal_point() {
        // integral VND: "22.50" is 2250, not 22.5
        assert_eq!(price("22.50đ", "g").price_per_unit, 2250.0);
    }

    #[test]
    fn declared_unit_fallback_canonicalizes_labels() {
        assert_eq!(price("40.000đ", "lít").unit, "ml");
        assert_eq!(price("40.000đ", "ml").unit, "ml");
        assert_eq!(price("40.000đ", "gói").unit, "gói");
    }

    #[test]
    fn unrecognized_units_default_to_grams() {
        assert_eq!(price("40.000đ", "bó").unit, "g");
        assert_eq!(price("40.000đ/3oz", "oz").unit, "g");
    }

    #[test]
    fn missing_or_zero_price_is_a_miss() {
        assert_eq!(normalize("liên hệ", "kg"), None);
        assert_eq!(normalize("", "kg"), None);
        assert_eq!(normalize("0đ", "kg"), None);
    }

    #[test]
    fn fractional_embedded_quantity_is_a_decimal() {
        let result = price("30.000đ/1.5l", "l");

        assert_eq!(result.price_per_unit, 20.0);
        assert_eq!(result.unit, "ml");
    }

    #[test]
    fn leading_text_before_the_number_is_ignored() {
        let result = price("Giá: 89.000đ / kg", "kg");

        assert_eq!(result.price_per_unit, 89.0);
        assert_eq!(result.unit, "g");
    }
}
