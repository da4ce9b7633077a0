mod account;
mod forms;

pub use account::{Account, Identity};
pub use forms::{AdminAction, AdminForm, AuthPageQuery, ChartForm, LoginForm, RegisterForm};
