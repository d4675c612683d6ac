// src/utils/formatter.rs

use crate::types::{AlertCandidate, ValueFormat};
use chrono::{DateTime, Utc};

/// Escape text for Telegram's HTML parse mode.
/// See: https://core.telegram.org/bots/api#html-style
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a metric value according to its family's format.
pub fn format_metric_value(value: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Decimals(places) => format!("{:.*}", places as usize, value),
        ValueFormat::Percent(places) => format!("{:.*}%", places as usize, value),
        ValueFormat::BasisPoints => format!("{:.0}bp", value),
        ValueFormat::PercentChange => format!("{:+.1}%", value * 100.0),
    }
}

/// Format timestamp to readable string
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Body of a single-alert notification.
pub fn format_alert_message(alert: &AlertCandidate, sent_at: DateTime<Utc>) -> String {
    let value = format_metric_value(alert.value, alert.metric.value_format());

    format!(
        "{emoji} <b>{headline}</b>\n\n\
         📊 <b>Metric:</b> {metric}\n\
         💰 <b>Current Value:</b> {value}\n\
         📈 <b>Recommendation:</b> {recommendation}\n\
         {severity_emoji} <b>Urgency:</b> {severity}\n\n\
         <i>⏰ {timestamp}</i>",
        emoji = alert.emoji,
        headline = escape_html(&alert.message),
        metric = escape_html(alert.metric.display_name()),
        value = escape_html(&value),
        recommendation = escape_html(&alert.recommendation),
        severity_emoji = alert.severity.emoji(),
        severity = alert.severity.as_str(),
        timestamp = format_timestamp(sent_at),
    )
}

/// Body of a composite notification; alerts are listed in the order given.
pub fn format_escalation_message(alerts: &[AlertCandidate], sent_at: DateTime<Utc>) -> String {
    let mut message = String::from("🚨 <b>URGENT MARKET ALERT</b> 🚨\n\n");
    message.push_str(&format!(
        "<b>{} high-urgency signals detected:</b>\n\n",
        alerts.len()
    ));

    for (index, alert) in alerts.iter().enumerate() {
        message.push_str(&format!(
            "{}. {} <b>{}</b> ({}): {}\n   ↳ {}\n",
            index + 1,
            alert.emoji,
            escape_html(alert.metric.display_name()),
            alert.severity.as_str(),
            escape_html(&alert.message),
            escape_html(&alert.recommendation),
        ));
    }

    message.push_str("\n⚠️ <b>IMMEDIATE ACTION REQUIRED</b> ⚠️\n");
    message.push_str(&format!("<i>⏰ {}</i>", format_timestamp(sent_at)));
    message
}
