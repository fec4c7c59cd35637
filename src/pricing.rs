use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::Profile;

/// Fixed conversion used for ranking. Not a live exchange rate.
pub const USD_TO_CNY_RATE: f64 = 7.0;

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(\.[0-9]+)?").expect("price pattern is valid"));

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Currency {
    #[default]
    Cny,
    Usd,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Cny => f.write_str("CNY"),
            Currency::Usd => f.write_str("USD"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PriceQuote {
    pub numeric: f64,
    pub currency: Currency,
    pub normalized_cny: f64,
}

/// Parses free-form price text such as `"$3/1M"` or `"¥1.5/1M tokens"`.
///
/// The first number in the text wins. A `$` anywhere marks the value as USD,
/// which is then normalized at [`USD_TO_CNY_RATE`]. Text without a number is
/// worth zero.
pub fn parse_price(text: Option<&str>) -> PriceQuote {
    let Some(text) = text else {
        return PriceQuote::default();
    };
    let numeric = PRICE_NUMBER
        .find(text)
        .and_then(|found| found.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);
    if text.contains('$') {
        PriceQuote {
            numeric,
            currency: Currency::Usd,
            normalized_cny: numeric * USD_TO_CNY_RATE,
        }
    } else {
        PriceQuote {
            numeric,
            currency: Currency::Cny,
            normalized_cny: numeric,
        }
    }
}

/// Input plus output price, in CNY.
pub fn profile_total(profile: &Profile) -> f64 {
    parse_price(profile.input_price()).normalized_cny
        + parse_price(profile.output_price()).normalized_cny
}

pub fn format_total(total: f64) -> String {
    format!("¥{total:.2}")
}
