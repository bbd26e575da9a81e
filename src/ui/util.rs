use rust_decimal::Decimal;

/// Group the integer part in threes and keep two decimals: `-1234.5` → `"-1,234.50"`.
pub(crate) fn format_amount(val: Decimal) -> String {
    let rounded = format!("{:.2}", val.abs());
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if val < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

/// `format_amount` prefixed with the currency code, e.g. `"KES 5,000.00"`.
pub(crate) fn format_money(val: Decimal, currency: &str) -> String {
    if currency.is_empty() {
        return format_amount(val);
    }
    format!("{currency} {}", format_amount(val))
}

/// A text progress bar `width` cells wide, e.g. `"██████░░░░"` for 0.6.
pub(crate) fn ratio_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Cut `s` to at most `max` characters, marking the cut with "…".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max - 1).collect();
    format!("{head}…")
}

/// Mask every character of a secret for display.
pub(crate) fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 >= len {
        return;
    }
    *index += 1;
    let page = page.max(1);
    if *index >= *scroll + page {
        *scroll = *index + 1 - page;
    }
}

pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    *scroll = (*scroll).min(*index);
}

pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len == 0 {
        return;
    }
    *index = len - 1;
    *scroll = len.saturating_sub(page.max(1));
}
