// ABOUTME: Display formatting for dates, prices, and file sizes used by the HTML views
// ABOUTME: Absent values always render as an empty string

use chrono::NaiveDate;

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn format_price(price: Option<f64>) -> String {
    let Some(price) = price else {
        return String::new();
    };

    let formatted = format!("{:.2}", price.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("${}{}.{}", sign, grouped, cents)
}

pub fn format_file_size(size: Option<i64>) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;

    match size {
        None => String::new(),
        Some(n) if n < 1024 => format!("{} B", n),
        Some(n) if n < 1024 * 1024 => format!("{:.1} KB", n as f64 / KB),
        Some(n) => format!("{:.1} MB", n as f64 / MB),
    }
}
