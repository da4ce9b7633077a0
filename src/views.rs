// HTML pages. Handlers pass plain data in; every user-supplied value is escaped here.
use axum::response::Html;
use chrono::{DateTime, Utc};
use crate::models::Account;

const AUTH_TEMPLATE: &str = include_str!("../templates/auth.html");
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const LIMIT_TEMPLATE: &str = include_str!("../templates/limit.html");
const DENIED_TEMPLATE: &str = include_str!("../templates/denied.html");
const ADMIN_TEMPLATE: &str = include_str!("../templates/admin.html");

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or("Never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S %Z").to_string())
}

fn format_quota(quota: Option<u32>) -> String {
    quota.map_or("Unlimited".to_string(), |q| q.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthPage {
    Login,
    Register,
}

pub fn auth_page(page: AuthPage, message: &str) -> Html<String> {
    let (title, action, remember, switch) = match page {
        AuthPage::Login => (
            "Login",
            "/login",
            r#"<label><input type="checkbox" name="remember" value="1"> Remember me</label>"#,
            r#"Don't have an account? <a href="/register">Register here</a>"#,
        ),
        AuthPage::Register => (
            "Register",
            "/register",
            "",
            r#"Already have an account? <a href="/login">Login here</a>"#,
        ),
    };

    Html(
        AUTH_TEMPLATE
            .replace("{{title}}", title)
            .replace("{{action}}", action)
            .replace("{{remember}}", remember)
            .replace("{{switch}}", switch)
            .replace("{{message}}", &escape(message)),
    )
}

/// What the main page shows besides the input form.
pub struct IndexView<'a> {
    pub account: &'a Account,
    pub is_admin: bool,
    pub message: &'a str,
    /// Base64-encoded PNG.
    pub chart: Option<&'a str>,
}

pub fn index_page(view: IndexView<'_>) -> Html<String> {
    let chart = view.chart.map_or(String::new(), |encoded| {
        format!(r#"<img class="chart" alt="MACC chart" src="data:image/png;base64,{}">"#, encoded)
    });
    let admin_link = if view.is_admin {
        r#"<a href="/admin">Go to Admin Panel</a>"#
    } else {
        ""
    };

    Html(
        INDEX_TEMPLATE
            .replace("{{email}}", &escape(&view.account.email))
            .replace("{{last_login}}", &format_time(view.account.last_login))
            .replace("{{quota}}", &format_quota(view.account.quota))
            .replace("{{message}}", &escape(view.message))
            .replace("{{chart}}", &chart)
            .replace("{{admin_link}}", admin_link),
    )
}

pub fn limit_page(email: &str) -> Html<String> {
    Html(LIMIT_TEMPLATE.replace("{{email}}", &escape(email)))
}

pub fn denied_page() -> Html<String> {
    Html(DENIED_TEMPLATE.to_string())
}

pub fn admin_page(accounts: &[Account], message: &str) -> Html<String> {
    let users = accounts
        .iter()
        .map(|account| {
            format!(
                "      <li>{} - Quota: {} - Approved: {} - Last login: {}</li>",
                escape(&account.email),
                format_quota(account.quota),
                if account.approved { "Yes" } else { "No" },
                format_time(account.last_login),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Html(
        ADMIN_TEMPLATE
            .replace("{{message}}", &escape(message))
            .replace("{{users}}", &users),
    )
}
