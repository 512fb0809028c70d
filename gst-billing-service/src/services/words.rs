//! Rupee amounts spelled out in the Indian numbering system
//! (hundred, thousand, lakh, crore).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u128 = 10_000_000;
const LAKH: u128 = 100_000;
const THOUSAND: u128 = 1_000;

/// `236` → `Rupees Two Hundred And Thirty-Six Only`.
///
/// Paise are rounded to two places and appended as `And <n> Paise` when
/// non-zero.
///
/// Differs from num2words `to='currency', lang='en_IN'` in the currency
/// part only: en_IN has no rupee forms there, so num2words names euro and
/// always spells the cents (`... Thirty-Six Euro, Zero Cents`).
pub fn amount_in_words(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let rupees = rounded.trunc();
    let paise = ((rounded - rupees) * Decimal::ONE_HUNDRED)
        .to_u128()
        .unwrap_or_default();

    let mut words = String::from("Rupees ");
    if amount.is_sign_negative() && !rounded.is_zero() {
        words.push_str("Minus ");
    }
    words.push_str(&integer_words(rupees.to_u128().unwrap_or_default()));
    if paise > 0 {
        words.push_str(" And ");
        words.push_str(&integer_words(paise));
        words.push_str(" Paise");
    }
    words.push_str(" Only");
    words
}

/// Title-cased words for a whole number, worded like num2words' en_IN
/// cardinals after `.title()`: groups separated by commas, `And` before the
/// final tens-and-units.
pub fn integer_words(n: u128) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    let crores = n / CRORE;
    if crores > 0 {
        parts.push(format!("{} Crore", integer_words(crores)));
    }
    let rest = n % CRORE;

    let groups = [
        (rest / LAKH, "Lakh"),
        ((rest % LAKH) / THOUSAND, "Thousand"),
        ((rest % THOUSAND) / 100, "Hundred"),
    ];
    for (count, name) in groups {
        if count > 0 {
            parts.push(format!("{} {}", below_hundred(count), name));
        }
    }

    let groups = parts.join(", ");
    match rest % 100 {
        0 => groups,
        last if groups.is_empty() => below_hundred(last),
        last => format!("{} And {}", groups, below_hundred(last)),
    }
}

fn below_hundred(n: u128) -> String {
    let n = n as usize;
    if n < 20 {
        return ONES[n].to_string();
    }
    match n % 10 {
        0 => TENS[n / 10].to_string(),
        units => format!("{}-{}", TENS[n / 10], ONES[units]),
    }
}
