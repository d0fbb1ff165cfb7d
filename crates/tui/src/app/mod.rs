use crate::input::Form;
use crate::keybinds::Keybinds;
use crate::register::{redirect_target, RedirectTarget, RegisterState};
use crate::Config;
use anyhow::{anyhow, Result};
use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use wabot_api::auth::{Profile, ProfileStore};
use wabot_api::{ApiError, DashboardApi};
use wabot_connect::{ConnectCommand, ConnectEvent, ConnectHandle, ConnectPage};

mod actions;
mod connect;
mod effects;
mod input;
mod render;
mod state;
mod types;

pub use connect::{CodePanel, ConnectView, QrPanel};
pub use state::App;
pub use types::{
    AppAsyncEvent, Banner, BannerKind, BotStatus, CancelModal, ConfirmAction, DashboardModal,
    DashboardState, LoginState, ProductMode, ProductsState, Screen, SettingsBusy, SettingsModal,
    StockChange,
};

pub const SETTINGS_CLOSE_DELAY: Duration = Duration::from_millis(1500);
pub const CONNECT_RESTART_DELAY: Duration = Duration::from_secs(2);

impl App {
    pub(super) fn report_error(&mut self, context: &str, error: impl std::fmt::Display) {
        let message = format!("{context}: {}", Self::redact_sensitive(&error.to_string()));
        self.last_error = Some(message.clone());
        tracing::warn!("{message}");
    }

    /// Backend message for application failures, a generic one otherwise.
    pub(super) fn actionable_error(error: &ApiError) -> String {
        error.display_message()
    }

    pub(super) fn clear_error(&mut self) {
        self.last_error = None;
        self.show_error_details = false;
    }

    fn redact_sensitive(input: &str) -> String {
        let mut out = input.to_string();
        for key in ["pin=", "apiKey=", "key="] {
            if let Some(start) = out.find(key) {
                let value_start = start + key.len();
                let value_end = out[value_start..]
                    .find(['&', ' ', '"'])
                    .map(|i| value_start + i)
                    .unwrap_or(out.len());
                out.replace_range(value_start..value_end, "[REDACTED]");
            }
        }
        out
    }

    pub(super) fn spawn_app_task<F>(&self, future: F)
    where
        F: Future<Output = AppAsyncEvent> + Send + 'static,
    {
        if let Some(tx) = self.app_async_tx.clone() {
            tokio::spawn(async move {
                let event = future.await;
                let _ = tx.send(event);
            });
        }
    }

    pub(super) fn show_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    /// Per-frame housekeeping for timed labels.
    pub fn on_tick(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
        }
        if let Some(DashboardModal::Settings(modal)) = &mut self.modal {
            if modal.status.as_ref().is_some_and(|b| b.is_expired(now)) {
                modal.status = None;
            }
        }
        if let Some(view) = &mut self.connect {
            view.expire_copied(now);
        }
    }
}
