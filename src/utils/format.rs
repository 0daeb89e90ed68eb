//! Display helpers for numbers, money, ratios and SNIP links.
//!
//! Every helper takes an `Option<f64>` and renders "no value" (including
//! non-finite numbers) as [`MISSING`].

use url::Url;

pub const MISSING: &str = "—";

const SNIP_INFO_URL: &str =
    "https://sistemas.segeplan.gob.gt/guest/SNPPKG$PL_PROYECTOS.INFORMACION";

fn finite(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite())
}

/// Inserts `,` every three digits in the integer part of an already
/// formatted decimal number.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(idx) => unsigned.split_at(idx),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}", sign, grouped, frac_part)
}

pub fn fmt_int(x: Option<f64>) -> String {
    match finite(x) {
        // `+ 0.0` turns a rounded -0.0 into 0.0.
        Some(v) => group_thousands(&format!("{:.0}", v.round() + 0.0)),
        None => MISSING.to_string(),
    }
}

pub fn fmt_float(x: Option<f64>, decimals: usize) -> String {
    match finite(x) {
        Some(v) => group_thousands(&format!("{:.*}", decimals, v)),
        None => MISSING.to_string(),
    }
}

pub fn fmt_money(x: Option<f64>, decimals: usize) -> String {
    match finite(x) {
        Some(v) => format!("Q {}", group_thousands(&format!("{:.*}", decimals, v))),
        None => MISSING.to_string(),
    }
}

pub fn fmt_pct(x: Option<f64>, decimals: usize) -> String {
    match finite(x) {
        Some(v) => format!("{}%", group_thousands(&format!("{:.*}", decimals, 100.0 * v))),
        None => MISSING.to_string(),
    }
}

/// Public SEGEPLAN information page for a project.
pub fn snip_url(snip: i64) -> String {
    let snip = snip.to_string();
    match Url::parse_with_params(SNIP_INFO_URL, &[("prmIdSnip", snip.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?prmIdSnip={}", SNIP_INFO_URL, snip),
    }
}
