use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    // Checkbox: present only when ticked
    pub remember: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuthPageQuery {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartForm {
    pub project_name: String,
    pub categories: String,
    pub values: String,
    pub widths: String,
    pub line_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminForm {
    pub username: String,
    pub quota: Option<String>,
    pub approve: Option<String>,
    pub reset_password: Option<String>,
}

/// The single action an admin form submission asks for.
#[derive(Debug, PartialEq)]
pub enum AdminAction {
    Approve,
    ResetPassword,
    SetQuota(String),
}

impl AdminForm {
    // Approve wins over reset, which wins over a quota update
    pub fn action(&self) -> AdminAction {
        if self.approve.is_some() {
            AdminAction::Approve
        } else if self.reset_password.is_some() {
            AdminAction::ResetPassword
        } else {
            AdminAction::SetQuota(self.quota.clone().unwrap_or_default())
        }
    }
}
