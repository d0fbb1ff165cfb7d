use crate::input::Form;
use std::time::{Duration, Instant};
use wabot_api::auth::Profile;
use wabot_api::{ChatStats, ProductForm};

pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Products,
    Register,
    Connect,
}

pub enum AppAsyncEvent {
    LoginFinished {
        profile: Profile,
        error: Option<String>,
    },
    LoggedOut {
        error: Option<String>,
    },
    StatusLoaded {
        online: bool,
        error: Option<String>,
    },
    StatsLoaded {
        stats: Option<ChatStats>,
        error: Option<String>,
    },
    ApiKeyTested {
        error: Option<String>,
    },
    SettingsSaved {
        error: Option<String>,
    },
    SettingsAutoClose,
    SubscriptionCancelled {
        message: Option<String>,
        error: Option<String>,
    },
    SubscriptionReactivated {
        message: Option<String>,
        error: Option<String>,
    },
    DataDeleted {
        error: Option<String>,
    },
    ProductSaved {
        context: String,
        message: Option<String>,
        error: Option<String>,
    },
    StockUpdated {
        token: String,
        new_stock: Option<i64>,
        error: Option<String>,
    },
    Registered {
        redirect_url: Option<String>,
        error: Option<String>,
    },
    SessionReset {
        error: Option<String>,
    },
    RestartConnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    pub expires_at: Option<Instant>,
}

impl Banner {
    fn timed(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            expires_at: Some(Instant::now() + BANNER_TTL),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::timed(BannerKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::timed(BannerKind::Error, text)
    }

    /// Stays until replaced.
    pub fn sticky(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: BannerKind::Info,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Checking,
    Online,
    Offline,
}

impl BotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BotStatus::Checking => "Checking...",
            BotStatus::Online => "Online",
            BotStatus::Offline => "Offline",
        }
    }

    /// The "bot is not connected" warning.
    pub fn show_warning(&self) -> bool {
        matches!(self, BotStatus::Offline)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub status: BotStatus,
    pub stats: Option<ChatStats>,
    pub refreshed_at: Option<chrono::DateTime<chrono::Local>>,
    pub busy: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            status: BotStatus::Checking,
            stats: None,
            refreshed_at: None,
            busy: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginState {
    pub form: Form,
    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            form: Form::new(&["Phone", "PIN"]).masked(1),
            submitting: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsBusy {
    Testing,
    Saving,
}

#[derive(Debug, Clone)]
pub struct SettingsModal {
    pub form: Form,
    pub reveal: bool,
    pub busy: Option<SettingsBusy>,
    pub status: Option<Banner>,
    pub closing: bool,
}

impl Default for SettingsModal {
    fn default() -> Self {
        Self {
            form: Form::new(&["Gemini API key"]).masked(0),
            reveal: false,
            busy: None,
            status: None,
            closing: false,
        }
    }
}

impl SettingsModal {
    pub fn api_key(&self) -> &str {
        self.form.value(0)
    }
}

#[derive(Debug, Clone)]
pub struct CancelModal {
    pub form: Form,
    pub confirmed: bool,
    pub on_checkbox: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

impl Default for CancelModal {
    fn default() -> Self {
        Self {
            form: Form::new(&["Reason", "Feedback"]),
            confirmed: false,
            on_checkbox: false,
            submitting: false,
            error: None,
        }
    }
}

impl CancelModal {
    /// Tab order: form fields, then the confirmation checkbox.
    pub fn next_focus(&mut self) {
        if self.on_checkbox {
            self.on_checkbox = false;
            self.form.selected = 0;
        } else if self.form.selected + 1 == self.form.fields.len() {
            self.on_checkbox = true;
        } else {
            self.form.next_field();
        }
    }
}

#[derive(Debug, Clone)]
pub enum DashboardModal {
    Settings(SettingsModal),
    Cancel(CancelModal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteData,
    Reactivate,
    ResetSession,
    DeleteProduct(String),
}

impl ConfirmAction {
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::DeleteData => {
                "Delete ALL chat history and AI memory? This cannot be undone.".to_string()
            }
            ConfirmAction::Reactivate => "Reactivate your subscription?".to_string(),
            ConfirmAction::ResetSession => {
                "Log out this WhatsApp session and scan a new QR?".to_string()
            }
            ConfirmAction::DeleteProduct(id) => format!("Delete product {id}?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductMode {
    Add,
    Edit,
    Delete,
    Stock,
}

impl ProductMode {
    pub fn title(&self) -> &'static str {
        match self {
            ProductMode::Add => "Add product",
            ProductMode::Edit => "Edit product",
            ProductMode::Delete => "Delete product",
            ProductMode::Stock => "Adjust stock",
        }
    }
}

const PRODUCT_FIELDS: [&str; 6] = [
    "Name",
    "Price",
    "Stock",
    "Category",
    "Description",
    "Image URL",
];

#[derive(Debug, Clone)]
pub struct ProductsState {
    pub mode: ProductMode,
    pub form: Form,
    pub submitting: bool,
    pub last_stock: Option<i64>,
}

impl Default for ProductsState {
    fn default() -> Self {
        Self {
            mode: ProductMode::Add,
            form: Self::form_for(ProductMode::Add),
            submitting: false,
            last_stock: None,
        }
    }
}

impl ProductsState {
    fn form_for(mode: ProductMode) -> Form {
        match mode {
            ProductMode::Add => Form::new(&PRODUCT_FIELDS),
            ProductMode::Edit => {
                let mut labels = vec!["Product id"];
                labels.extend(PRODUCT_FIELDS);
                Form::new(&labels)
            }
            ProductMode::Delete => Form::new(&["Product id"]),
            ProductMode::Stock => Form::new(&["Remote token", "Item index", "Change (+/-)"]),
        }
    }

    pub fn switch(&mut self, mode: ProductMode) {
        if self.mode != mode {
            self.mode = mode;
            self.form = Self::form_for(mode);
        }
    }

    pub fn product_id(&self) -> Option<&str> {
        match self.mode {
            ProductMode::Edit | ProductMode::Delete => {
                Some(self.form.value(0)).filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }

    /// Product fields of an add or edit form; `None` without a name.
    pub fn product_form(&self) -> Option<ProductForm> {
        let offset = match self.mode {
            ProductMode::Add => 0,
            ProductMode::Edit => 1,
            _ => return None,
        };
        let field = |idx: usize| self.form.value(offset + idx).to_string();
        let form = ProductForm {
            item: field(0),
            price: field(1),
            stock: field(2),
            category: field(3),
            description: field(4),
            image_url: field(5),
        };
        (!form.item.is_empty()).then_some(form)
    }

    /// Token, item index and signed change from the stock form.
    pub fn stock_change(&self) -> Option<StockChange> {
        if self.mode != ProductMode::Stock {
            return None;
        }
        let token = Some(self.form.value(0)).filter(|t| !t.is_empty())?;
        Some(StockChange {
            token: token.to_string(),
            index: self.form.value(1).parse().ok()?,
            change: self.form.value(2).trim_start_matches('+').parse().ok()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub token: String,
    pub index: usize,
    pub change: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_expiry() {
        let banner = Banner::success("ok");
        assert!(!banner.is_expired(Instant::now()));
        assert!(banner.is_expired(Instant::now() + BANNER_TTL));
        assert!(!Banner::sticky("pay").is_expired(Instant::now() + BANNER_TTL * 10));
    }

    #[test]
    fn cancel_focus_reaches_checkbox() {
        let mut modal = CancelModal::default();
        modal.next_focus();
        assert_eq!(modal.form.selected, 1);
        modal.next_focus();
        assert!(modal.on_checkbox);
        modal.next_focus();
        assert!(!modal.on_checkbox);
        assert_eq!(modal.form.selected, 0);
    }

    #[test]
    fn edit_form_carries_id_and_fields() {
        let mut products = ProductsState::default();
        products.switch(ProductMode::Edit);
        products.form.set_value(0, "42");
        products.form.set_value(1, "Kopi Susu");
        products.form.set_value(2, "18000");

        assert_eq!(products.product_id(), Some("42"));
        let form = products.product_form().unwrap();
        assert_eq!(form.item, "Kopi Susu");
        assert_eq!(form.price, "18000");
    }

    #[test]
    fn add_form_requires_name() {
        let products = ProductsState::default();
        assert!(products.product_form().is_none());
        assert!(products.product_id().is_none());
    }

    #[test]
    fn stock_change_accepts_signed_values() {
        let mut products = ProductsState::default();
        products.switch(ProductMode::Stock);
        products.form.set_value(1, "2");
        products.form.set_value(2, "+5");
        assert_eq!(products.stock_change(), None);
        products.form.set_value(0, "a1b2c3d4");
        assert_eq!(
            products.stock_change(),
            Some(StockChange {
                token: "a1b2c3d4".into(),
                index: 2,
                change: 5
            })
        );
        products.form.set_value(2, "-3");
        assert_eq!(products.stock_change().map(|c| c.change), Some(-3));
        products.form.set_value(2, "x");
        assert_eq!(products.stock_change(), None);
    }
}
