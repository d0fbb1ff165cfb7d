use crate::input::Form;
use url::Url;
use wabot_api::{PairingMethod, RegisterRequest, Tier};
use wabot_connect::ConnectPage;

pub const FIELD_NAME: usize = 0;
pub const FIELD_PHONE: usize = 1;
pub const FIELD_CATEGORY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCopy {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button: &'static str,
    pub footer: &'static str,
}

pub fn tier_copy(tier: Tier) -> TierCopy {
    match tier {
        Tier::Trial => TierCopy {
            title: "Try it FREE for 5 days",
            subtitle: "No credit card needed. Your bot is live in 2 minutes!",
            button: "Activate my free bot",
            footer: "Free for 5 days • No credit card • Cancel anytime",
        },
        Tier::Starter => TierCopy {
            title: "Activate the Starter plan",
            subtitle: "Start automating your business with AI (Rp 99k/month)",
            button: "Continue to payment",
            footer: "200 chats/month • AI 24/7 • Full support",
        },
        Tier::Business => TierCopy {
            title: "Activate the Business plan",
            subtitle: "Grow sales with a smarter AI (Rp 199k/month)",
            button: "Continue to payment",
            footer: "Unlimited chats • Payment proof checks • VIP support",
        },
        Tier::Pro => TierCopy {
            title: "Activate the Pro plan",
            subtitle: "The complete autopilot for your business (Rp 349k/month)",
            button: "Continue to payment",
            footer: "Every feature • 5 WhatsApp numbers • API access",
        },
    }
}

#[derive(Debug, Clone)]
pub struct RegisterState {
    pub tier: Tier,
    pub method: PairingMethod,
    pub form: Form,
    pub submitting: bool,
}

impl Default for RegisterState {
    fn default() -> Self {
        Self::new(Tier::default())
    }
}

impl RegisterState {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            method: PairingMethod::default(),
            form: Form::new(&["Store name", "WhatsApp no.", "Category"]),
            submitting: false,
        }
    }

    pub fn copy(&self) -> TierCopy {
        tier_copy(self.tier)
    }

    pub fn button_label(&self) -> &'static str {
        if self.submitting {
            "Processing..."
        } else {
            self.copy().button
        }
    }

    pub fn next_tier(&mut self) {
        self.tier = self.tier.next();
    }

    pub fn toggle_method(&mut self) {
        self.method = self.method.toggle();
    }

    /// `None` until name, phone and category are all filled in.
    pub fn request(&self) -> Option<RegisterRequest> {
        if !self
            .form
            .is_filled(&[FIELD_NAME, FIELD_PHONE, FIELD_CATEGORY])
        {
            return None;
        }
        Some(RegisterRequest {
            phone: self.form.value(FIELD_PHONE).to_string(),
            name: self.form.value(FIELD_NAME).to_string(),
            category: self.form.value(FIELD_CATEGORY).to_string(),
            tier: self.tier,
            pairing_method: self.method,
        })
    }
}

/// Where a successful registration sends the user.
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectTarget {
    /// An activation page on our backend; `share_link` is the page URL.
    Connect { page: ConnectPage, share_link: String },
    /// Anything else, typically a payment page.
    External(String),
}

/// Activation pages live on the dashboard host and carry `order_id`.
/// Pairing pages also carry `method`, and sometimes `session`.
pub fn redirect_target(base: &Url, redirect: &Url, chosen: PairingMethod) -> RedirectTarget {
    let same_host = redirect.host_str() == base.host_str() && redirect.port() == base.port();
    let query = |key: &str| {
        redirect
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    let order_id = match query("order_id") {
        Some(id) if same_host => id,
        _ => return RedirectTarget::External(redirect.to_string()),
    };

    let method = query("method").map(|m| PairingMethod::parse(&m));
    let is_pairing_page = method.is_some() || redirect.path().contains("pairing");
    let page = if is_pairing_page {
        ConnectPage::pairing_for_order(
            &order_id,
            query("session").as_deref(),
            method.unwrap_or(chosen),
        )
    } else {
        ConnectPage::Signup { order_id }
    };

    RedirectTarget::Connect {
        page,
        share_link: redirect.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:5000/").unwrap()
    }

    #[test]
    fn unknown_tier_copy_is_trial() {
        let state = RegisterState::new(Tier::parse("ENTERPRISE"));
        assert_eq!(state.copy(), tier_copy(Tier::Trial));
        assert_eq!(state.button_label(), "Activate my free bot");
    }

    #[test]
    fn paid_tiers_go_to_payment() {
        for tier in [Tier::Starter, Tier::Business, Tier::Pro] {
            assert_eq!(tier_copy(tier).button, "Continue to payment");
        }
    }

    #[test]
    fn request_requires_all_fields() {
        let mut state = RegisterState::default();
        state.form.set_value(FIELD_NAME, "Toko Maju");
        state.form.set_value(FIELD_PHONE, "62811");
        assert!(state.request().is_none());

        state.form.set_value(FIELD_CATEGORY, "retail");
        state.toggle_method();
        let request = state.request().unwrap();
        assert_eq!(request.tier, Tier::Trial);
        assert_eq!(request.pairing_method, PairingMethod::Code);
        assert_eq!(request.name, "Toko Maju");
    }

    #[test]
    fn success_page_redirect_opens_signup_connect() {
        let redirect = base().join("/success?order_id=ORD-1").unwrap();
        match redirect_target(&base(), &redirect, PairingMethod::Qr) {
            RedirectTarget::Connect { page, share_link } => {
                assert_eq!(
                    page,
                    ConnectPage::Signup {
                        order_id: "ORD-1".into()
                    }
                );
                assert!(share_link.ends_with("/success?order_id=ORD-1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pairing_redirect_uses_method_and_session() {
        let redirect = base()
            .join("/success_pairing?order_id=7&method=code&session=session_62811")
            .unwrap();
        let target = redirect_target(&base(), &redirect, PairingMethod::Qr);
        assert!(matches!(
            target,
            RedirectTarget::Connect {
                page: ConnectPage::Pairing { ref session, method: PairingMethod::Code },
                ..
            } if session == "session_62811"
        ));
    }

    #[test]
    fn payment_links_are_external() {
        let redirect = Url::parse("https://pay.example.com/checkout?order_id=7").unwrap();
        assert_eq!(
            redirect_target(&base(), &redirect, PairingMethod::Qr),
            RedirectTarget::External(redirect.to_string())
        );
    }
}
