use super::*;

const QR_FILE: &str = "qr.png";

impl App {
    pub async fn init(&mut self) -> Result<()> {
        self.init_with_vars(|key| std::env::var(key).ok()).await
    }

    /// Signs in with the stored profile, or with credentials from `var`
    /// when none is stored.
    pub(super) async fn init_with_vars(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        let stored = match &self.profiles {
            Some(store) => match store.load() {
                Ok(profile) => profile,
                Err(e) => {
                    self.report_error("Failed to read saved profile", e);
                    None
                }
            },
            None => None,
        };

        let base_url = self.api.base_url().to_string();
        let profile = match stored {
            Some(profile) if profile.base_url == base_url => Some(profile),
            Some(profile) => {
                tracing::info!(
                    "Saved profile belongs to {}, not {}; asking for login",
                    profile.base_url,
                    base_url
                );
                self.login.form.set_value(0, profile.phone);
                None
            }
            None => Self::profile_from_vars(&base_url, var),
        };

        if let Some(profile) = profile {
            self.loading_message = "Signing in...".to_string();
            match self.api.login(&profile.phone, &profile.pin).await {
                Ok(()) => self.finish_login(profile),
                Err(e) => {
                    self.login.form.set_value(0, profile.phone.clone());
                    self.login.error = Some(Self::actionable_error(&e));
                    self.report_error("Sign-in failed", e);
                    self.screen = Screen::Login;
                }
            }
        } else {
            self.screen = Screen::Login;
        }

        self.is_loading = false;
        Ok(())
    }

    /// Builds a profile from `WABOT_PHONE`/`WABOT_PIN` (and the optional
    /// `WABOT_REMOTE_TOKEN`) as returned by `var`.
    pub(super) fn profile_from_vars(
        base_url: &str,
        var: impl Fn(&str) -> Option<String>,
    ) -> Option<Profile> {
        let phone = var("WABOT_PHONE")?.trim().to_string();
        let pin = var("WABOT_PIN")?;
        if phone.is_empty() || pin.is_empty() {
            return None;
        }
        Some(Profile {
            base_url: base_url.to_string(),
            phone,
            pin,
            session_name: None,
            remote_token: var("WABOT_REMOTE_TOKEN")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }

    pub(super) fn finish_login(&mut self, profile: Profile) {
        if let Some(store) = &self.profiles {
            if let Err(e) = store.save(&profile) {
                self.report_error("Failed to save profile", e);
            }
        }
        tracing::info!("Signed in as {}", profile.phone);
        self.profile = Some(profile);
        self.login = LoginState::default();
        self.screen = Screen::Dashboard;
        self.clear_error();
        self.refresh_dashboard();
    }

    fn remember_remote_token(&mut self, token: String) {
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        if profile.remote_token.as_deref() == Some(token.as_str()) {
            return;
        }
        profile.remote_token = Some(token);
        let profile = profile.clone();
        if let Some(store) = &self.profiles {
            if let Err(e) = store.save(&profile) {
                self.report_error("Failed to save profile", e);
            }
        }
    }

    fn save_qr(&self, bytes: &[u8]) -> Result<std::path::PathBuf> {
        let dir = self
            .data_dir()
            .ok_or_else(|| anyhow!("No data directory for the QR image"))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(QR_FILE);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    fn apply_connect_event(&mut self, event: ConnectEvent) {
        let Some(view) = self.connect.as_mut() else {
            return;
        };
        if !view.apply(&event) {
            return;
        }
        match event {
            ConnectEvent::QrReady { image } => match self.save_qr(&image.bytes) {
                Ok(path) => {
                    if let Some(view) = self.connect.as_mut() {
                        view.set_qr_path(path);
                    }
                }
                Err(e) => tracing::debug!("QR image not saved: {e}"),
            },
            ConnectEvent::Connected => {
                tracing::info!("WhatsApp session connected");
                self.dashboard.status = BotStatus::Online;
                self.show_banner(Banner::success("WhatsApp connected! Your bot is now active."));
            }
            _ => {}
        }
    }

    pub fn process_events(&mut self) {
        let mut connect_events = Vec::new();
        if let Some(ref mut rx) = self.connect_rx {
            while let Ok(event) = rx.try_recv() {
                connect_events.push(event);
            }
        }
        for event in connect_events {
            self.apply_connect_event(event);
        }

        let mut async_events = Vec::new();
        if let Some(ref mut rx) = self.app_async_rx {
            while let Ok(event) = rx.try_recv() {
                async_events.push(event);
            }
        }
        for event in async_events {
            self.apply_async_event(event);
        }
    }

    pub(super) fn apply_async_event(&mut self, event: AppAsyncEvent) {
        match event {
            AppAsyncEvent::LoginFinished { profile, error } => {
                self.login.submitting = false;
                if let Some(err) = error {
                    self.login.error = Some(err.clone());
                    self.report_error("Sign-in failed", err);
                } else {
                    self.finish_login(profile);
                }
            }
            AppAsyncEvent::LoggedOut { error } => {
                if let Some(err) = error {
                    tracing::debug!("Logout request failed: {err}");
                }
                if let Some(store) = &self.profiles {
                    if let Err(e) = store.clear() {
                        self.report_error("Failed to clear saved profile", e);
                    }
                }
                self.close_connect();
                self.profile = None;
                self.modal = None;
                self.dashboard = DashboardState::default();
                self.screen = Screen::Login;
            }
            AppAsyncEvent::StatusLoaded { online, error } => {
                if let Some(err) = error {
                    tracing::debug!("Status check failed: {err}");
                }
                self.dashboard.status = if online {
                    BotStatus::Online
                } else {
                    BotStatus::Offline
                };
                self.dashboard.refreshed_at = Some(chrono::Local::now());
            }
            AppAsyncEvent::StatsLoaded { stats, error } => {
                if let Some(err) = error {
                    self.report_error("Failed to load chat stats", err);
                } else {
                    self.dashboard.stats = stats;
                }
            }
            AppAsyncEvent::ApiKeyTested { error } => {
                if let Some(DashboardModal::Settings(modal)) = &mut self.modal {
                    modal.busy = None;
                    modal.status = Some(match error {
                        Some(err) => Banner::error(err),
                        None => Banner::success("API key is valid"),
                    });
                }
            }
            AppAsyncEvent::SettingsSaved { error } => {
                let mut schedule_close = false;
                if let Some(DashboardModal::Settings(modal)) = &mut self.modal {
                    modal.busy = None;
                    match error {
                        Some(err) => modal.status = Some(Banner::error(err)),
                        None => {
                            modal.status = Some(Banner::success("Settings saved"));
                            modal.closing = true;
                            schedule_close = true;
                        }
                    }
                }
                if schedule_close {
                    self.spawn_app_task(async {
                        tokio::time::sleep(SETTINGS_CLOSE_DELAY).await;
                        AppAsyncEvent::SettingsAutoClose
                    });
                }
            }
            AppAsyncEvent::SettingsAutoClose => {
                if matches!(&self.modal, Some(DashboardModal::Settings(m)) if m.closing) {
                    self.modal = None;
                }
            }
            AppAsyncEvent::SubscriptionCancelled { message, error } => match error {
                Some(err) => {
                    if let Some(DashboardModal::Cancel(modal)) = &mut self.modal {
                        modal.submitting = false;
                        modal.error = Some(err.clone());
                    }
                    self.report_error("Cancellation failed", &err);
                    self.show_banner(Banner::error(err));
                }
                None => {
                    self.modal = None;
                    self.show_banner(Banner::success(
                        message.unwrap_or_else(|| "Subscription cancelled".to_string()),
                    ));
                }
            },
            AppAsyncEvent::SubscriptionReactivated { message, error } => {
                self.dashboard.busy = false;
                match error {
                    Some(err) => {
                        self.report_error("Reactivation failed", &err);
                        self.show_banner(Banner::error(err));
                    }
                    None => {
                        self.show_banner(Banner::success(
                            message.unwrap_or_else(|| "Subscription reactivated".to_string()),
                        ));
                        self.refresh_dashboard();
                    }
                }
            }
            AppAsyncEvent::DataDeleted { error } => {
                self.dashboard.busy = false;
                match error {
                    Some(err) => {
                        self.report_error("Failed to delete data", &err);
                        self.show_banner(Banner::error(err));
                    }
                    None => self.show_banner(Banner::success(
                        "All chat history and AI memory deleted",
                    )),
                }
            }
            AppAsyncEvent::ProductSaved {
                context,
                message,
                error,
            } => {
                self.products.submitting = false;
                match error {
                    Some(err) => {
                        self.report_error(&context, &err);
                        self.show_banner(Banner::error(err));
                    }
                    None => {
                        self.products.form.clear();
                        self.show_banner(Banner::success(
                            message.filter(|m| !m.is_empty()).unwrap_or(context),
                        ));
                    }
                }
            }
            AppAsyncEvent::StockUpdated {
                token,
                new_stock,
                error,
            } => {
                self.products.submitting = false;
                match error {
                    Some(err) => {
                        self.report_error("Stock update failed", &err);
                        self.show_banner(Banner::error(err));
                    }
                    None => {
                        self.remember_remote_token(token);
                        self.products.last_stock = new_stock;
                        let text = match new_stock {
                            Some(stock) => format!("Stock updated: {stock}"),
                            None => "Stock updated".to_string(),
                        };
                        self.show_banner(Banner::success(text));
                    }
                }
            }
            AppAsyncEvent::Registered {
                redirect_url,
                error,
            } => {
                self.register.submitting = false;
                if let Some(err) = error {
                    self.report_error("Registration failed", &err);
                    self.show_banner(Banner::error(err));
                    return;
                }
                let Some(link) = redirect_url else {
                    return;
                };
                match self.api.resolve(&link) {
                    Ok(url) => {
                        match redirect_target(self.api.base_url(), &url, self.register.method) {
                            RedirectTarget::Connect { page, share_link } => {
                                self.show_banner(Banner::success(
                                    "Registered! Continue with activation.",
                                ));
                                self.open_connect(page, Some(share_link));
                            }
                            RedirectTarget::External(url) => {
                                self.show_banner(Banner::sticky(format!(
                                    "Registered! Complete your payment at {url}"
                                )));
                            }
                        }
                    }
                    Err(e) => self.report_error("Unusable redirect from registration", e),
                }
            }
            AppAsyncEvent::SessionReset { error } => {
                if let Some(view) = &mut self.connect {
                    view.resetting = false;
                }
                match error {
                    Some(err) => {
                        self.report_error("Session reset failed", &err);
                        self.show_banner(Banner::error(err));
                    }
                    None => {
                        self.show_banner(Banner::success("Session reset. Loading a new QR..."));
                        self.spawn_app_task(async {
                            tokio::time::sleep(CONNECT_RESTART_DELAY).await;
                            AppAsyncEvent::RestartConnect
                        });
                    }
                }
            }
            AppAsyncEvent::RestartConnect => {
                if let Some(view) = self.connect.take() {
                    self.open_connect(view.page, view.share_link);
                }
            }
        }
    }
}
