//! Server-side HTML for the dashboard and the connection test page.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{
    client::{DashboardData, EndpointCheck},
    model::{Alert, RiskLevel, SimulatorForm, SubmitOutcome, Transaction},
    summary::Summary,
};

const PLACEHOLDER: &str = "—";

/// Everything shown on one render of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub data: DashboardData,
    pub error: Option<String>,
    pub form: SimulatorForm,
    pub result: Option<SubmitOutcome>,
    pub rendered_at: DateTime<Utc>,
}

impl DashboardPage {
    pub fn new(data: DashboardData, error: Option<String>) -> DashboardPage {
        DashboardPage {
            data,
            error,
            form: SimulatorForm::default(),
            result: None,
            rendered_at: Utc::now(),
        }
    }

    pub fn with_submission(mut self, form: SimulatorForm, result: SubmitOutcome) -> DashboardPage {
        self.form = form;
        self.result = Some(result);
        self
    }

    pub fn summary(&self) -> Summary {
        Summary::from_transactions(&self.data.transactions)
    }

    pub fn render(&self) -> String {
        let mut body = String::new();

        body.push_str(&header(&self.rendered_at));
        if let Some(error) = &self.error {
            let _ = write!(body, r#"<div class="error-banner">{}</div>"#, escape(error));
        }
        body.push_str(&stats(&self.summary()));
        body.push_str(r#"<div class="columns"><section class="transactions">"#);
        body.push_str("<h2>Recent Transactions</h2>");
        body.push_str(&transactions_table(&self.data.transactions));
        body.push_str(r#"</section><section class="side"><h2>Alerts</h2>"#);
        body.push_str(&alert_list(&self.data.alerts));
        body.push_str(&simulator(&self.form, self.result.as_ref()));
        body.push_str("</section></div>");

        layout("Fraud Detection Dashboard", &body)
    }
}

/// Connection test page listing the probe of each endpoint.
pub fn connection_test(base_url: &str, checks: &[EndpointCheck]) -> String {
    let mut body = format!(
        r#"<h1>Connection Test</h1><p>Backend: <code>{}</code></p><ul class="checks">"#,
        escape(base_url)
    );
    for check in checks {
        let verdict = if check.is_ok() { "ok" } else { "failed" };
        let detail = match (&check.error, check.status) {
            (Some(error), _) => escape(error),
            (None, Some(status)) => format!("HTTP {}", status),
            (None, None) => PLACEHOLDER.to_string(),
        };
        let _ = write!(
            body,
            r#"<li class="{verdict}"><code>{}</code> {verdict} • {} • {} ms</li>"#,
            escape(&check.url),
            detail,
            check.latency_ms,
        );
    }
    body.push_str(r#"</ul><a href="/">Back to dashboard</a>"#);

    layout("Connection Test", &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>{}</title><style>{}</style></head><body><main>{}</main></body></html>"#,
        escape(title),
        STYLE,
        body
    )
}

fn header(now: &DateTime<Utc>) -> String {
    format!(
        r#"<header><div><h1>Fraud Detection Dashboard</h1><p>Realtime view of transactions, risk scoring, and alerts • {}</p></div><nav><a href="/test">Connection Test</a> <a class="primary" href="/">Refresh</a></nav></header>"#,
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn stats(summary: &Summary) -> String {
    let mut cards = String::from(r#"<div class="stats">"#);
    cards.push_str(&stat_card("Total Transactions", &summary.total.to_string(), None, "blue"));
    cards.push_str(&stat_card(
        "High-Risk Alerts",
        &summary.high_risk.to_string(),
        Some(format!("{}% of tx", summary.alert_rate)),
        "red",
    ));
    cards.push_str(&stat_card(
        "Avg Risk Score",
        &format!("{:.1}", summary.average_risk),
        Some(format!("p95 {}", summary.p95_risk.round())),
        "amber",
    ));
    cards.push_str(&stat_card(
        "Confirmed Fraud",
        &summary.confirmed_fraud.to_string(),
        Some("last 24h".to_string()),
        "green",
    ));
    cards.push_str("</div>");
    cards
}

fn stat_card(label: &str, value: &str, trend: Option<String>, color: &str) -> String {
    let trend = trend
        .map(|t| format!(r#"<span class="trend {}">{}</span>"#, color, escape(&t)))
        .unwrap_or_default();
    format!(
        r#"<div class="card"><div class="label">{}</div><div class="value">{}{}</div></div>"#,
        escape(label),
        escape(value),
        trend
    )
}

fn transactions_table(transactions: &[Transaction]) -> String {
    let mut table = String::from(
        "<table><thead><tr><th>Time</th><th>User</th><th>Amount</th><th>Merchant</th>\
         <th>Country</th><th>Channel</th><th>Risk</th></tr></thead><tbody>",
    );

    if transactions.is_empty() {
        table.push_str(r#"<tr><td class="empty" colspan="7">No transactions yet</td></tr>"#);
    }
    for tx in transactions {
        let _ = write!(
            table,
            "<tr id=\"tx-{}\"><td>{}</td><td>{}</td><td class=\"amount\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(tx.identifier().unwrap_or_default()),
            escape(&format_timestamp(tx.occurred_at())),
            text_or_placeholder(tx.user_id.as_deref()),
            escape(&format_amount(tx.amount, tx.currency.as_deref())),
            text_or_placeholder(tx.merchant.as_deref()),
            text_or_placeholder(tx.country.as_deref()),
            text_or_placeholder(tx.channel.as_deref()),
            risk_pill(tx.score(), tx.risk_level),
        );
    }

    table.push_str("</tbody></table>");
    table
}

fn alert_list(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return r#"<div class="alerts"><div class="empty">No alerts</div></div>"#.to_string();
    }

    let mut list = String::from(r#"<div class="alerts">"#);
    for alert in alerts {
        // a missing level is left blank; the colour falls back to low
        let level = alert
            .risk_level
            .map(|l| l.to_string())
            .unwrap_or_default();
        let mut meta = format!("Score {} • {}", alert.score().round(), level);
        if !alert.tags.is_empty() {
            let _ = write!(meta, " • {}", alert.tags.join(", "));
        }
        let _ = write!(
            list,
            r#"<div class="alert {}" id="alert-{}"><div><div class="reason">{}</div><div class="meta">{}</div></div><div class="time">{}</div></div>"#,
            level_class(alert.risk_level.unwrap_or(RiskLevel::Low)),
            escape(alert.identifier().unwrap_or_default()),
            text_or_placeholder(alert.reason.as_deref()),
            escape(&meta),
            escape(&format_timestamp(alert.created_at.as_deref())),
        );
    }
    list.push_str("</div>");
    list
}

fn simulator(form: &SimulatorForm, result: Option<&SubmitOutcome>) -> String {
    let fields = [
        ("user_id", "User ID", &form.user_id),
        ("amount", "Amount", &form.amount),
        ("currency", "Currency", &form.currency),
        ("merchant", "Merchant", &form.merchant),
        ("merchant_category", "Category", &form.merchant_category),
        ("country", "Country", &form.country),
        ("channel", "Channel", &form.channel),
        ("device_id", "Device ID", &form.device_id),
        ("ip_address", "IP Address", &form.ip_address),
    ];

    let mut html = String::from(
        r#"<div class="simulator"><h3>Simulate Transaction</h3><form method="post" action="/simulate">"#,
    );
    for (name, placeholder, value) in fields {
        let _ = write!(
            html,
            r#"<input name="{name}" placeholder="{placeholder}" value="{}">"#,
            escape(value)
        );
    }
    html.push_str(r#"<button type="submit">Create Transaction</button></form>"#);

    match result {
        Some(SubmitOutcome::Scored {
            risk_score,
            risk_level,
        }) => {
            let level = risk_level.map(|l| l.to_string()).unwrap_or_default();
            let _ = write!(
                html,
                r#"<div class="result">Risk Score: <strong>{}</strong> • {}</div>"#,
                risk_score.round(),
                escape(&level)
            );
        }
        Some(SubmitOutcome::Rejected { error }) => {
            let _ = write!(html, r#"<div class="result error">{}</div>"#, escape(error));
        }
        None => {}
    }

    html.push_str("</div>");
    html
}

fn risk_pill(score: f64, level: Option<RiskLevel>) -> String {
    let level = level.unwrap_or(RiskLevel::Low);
    format!(
        r#"<span class="pill {}">{} • {}</span>"#,
        level_class(level),
        level,
        score.round()
    )
}

fn level_class(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "high",
        RiskLevel::Medium => "medium",
        RiskLevel::Low | RiskLevel::Unknown => "low",
    }
}

fn format_amount(amount: Option<f64>, currency: Option<&str>) -> String {
    let amount = amount
        .map(|a| format!("${:.2}", a))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    match currency {
        Some(currency) => format!("{} {}", amount, currency),
        None => amount,
    }
}

/// RFC 3339 timestamps are normalised to UTC; anything else is shown as sent.
pub fn format_timestamp(timestamp: Option<&str>) -> String {
    match timestamp {
        None => PLACEHOLDER.to_string(),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}

fn text_or_placeholder(text: Option<&str>) -> String {
    match text {
        Some(text) if !text.is_empty() => escape(text),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;background:#f1f5f9;margin:0;padding:24px;color:#111827}\
main{max-width:1152px;margin:0 auto}\
header{display:flex;justify-content:space-between;align-items:center;margin-bottom:24px}\
header p{color:#6b7280;font-size:14px}\
nav a{padding:8px 12px;border-radius:4px;background:#f3f4f6;color:#1f2937;text-decoration:none;font-size:14px}\
nav a.primary{background:#2563eb;color:#fff}\
.error-banner{margin-bottom:16px;padding:12px;border:1px solid #fecdd3;background:#fff1f2;color:#be123c;border-radius:4px;font-size:14px}\
.stats{display:grid;grid-template-columns:repeat(4,1fr);gap:16px}\
.card{padding:16px;border:1px solid #e5e7eb;border-radius:8px;background:#fff}\
.card .label{font-size:14px;color:#6b7280}.card .value{font-size:24px;font-weight:600}\
.trend{font-size:12px;padding:2px 8px;border-radius:4px;margin-left:8px}\
.trend.blue{background:#eff6ff;color:#1d4ed8}.trend.red{background:#fff1f2;color:#be123c}\
.trend.amber{background:#fffbeb;color:#b45309}.trend.green{background:#ecfdf5;color:#047857}\
.columns{display:grid;grid-template-columns:2fr 1fr;gap:24px;margin-top:24px}\
table{width:100%;background:#fff;border:1px solid #e5e7eb;border-radius:8px;font-size:14px;border-collapse:collapse}\
th,td{text-align:left;padding:12px}tbody tr{border-top:1px solid #e5e7eb}\
.empty{padding:24px;text-align:center;color:#6b7280;background:#fff}\
.pill{padding:2px 8px;border-radius:4px;font-size:12px;font-weight:500}\
.pill.high{background:#ffe4e6;color:#be123c}.pill.medium{background:#fef3c7;color:#b45309}.pill.low{background:#d1fae5;color:#047857}\
.alert{display:flex;justify-content:space-between;gap:16px;padding:12px;border-radius:4px;border:1px solid;margin-bottom:8px}\
.alert.high{border-color:#fecdd3;background:#fff1f2}.alert.medium{border-color:#fde68a;background:#fffbeb}.alert.low{border-color:#a7f3d0;background:#ecfdf5}\
.alert .meta,.alert .time{font-size:12px;color:#4b5563}\
.simulator{margin-top:16px;padding:16px;background:#fff;border:1px solid #e5e7eb;border-radius:4px}\
.simulator form{display:grid;grid-template-columns:1fr 1fr;gap:8px}\
.simulator button{grid-column:span 2;background:#2563eb;color:#fff;border:0;border-radius:4px;padding:8px}\
.result{margin-top:12px;font-size:14px;background:#f9fafb;border:1px solid #e5e7eb;border-radius:4px;padding:8px}\
.result.error{color:#e11d48}\
.checks li.ok{color:#047857}.checks li.failed{color:#be123c}";
