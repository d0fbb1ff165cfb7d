use super::*;
use std::io::Write;
use std::process::{Command, Stdio};
use wabot_api::CancelRequest;

impl App {
    fn phone(&self) -> Option<String> {
        self.profile.as_ref().map(|p| p.phone.clone())
    }

    pub(super) fn submit_login(&mut self) {
        if self.login.submitting {
            return;
        }
        let phone = self.login.form.value(0).to_string();
        let pin = self.login.form.value(1).to_string();
        if phone.is_empty() || pin.is_empty() {
            self.login.error = Some("Enter your phone number and PIN".to_string());
            return;
        }

        self.login.submitting = true;
        self.login.error = None;
        let api = self.api.clone();
        let profile = Profile {
            base_url: self.api.base_url().to_string(),
            phone,
            pin,
            session_name: None,
            remote_token: None,
        };
        self.spawn_app_task(async move {
            let error = api
                .login(&profile.phone, &profile.pin)
                .await
                .err()
                .map(|e| App::actionable_error(&e));
            AppAsyncEvent::LoginFinished { profile, error }
        });
    }

    pub(super) fn logout(&mut self) {
        let api = self.api.clone();
        self.spawn_app_task(async move {
            let error = api.logout().await.err().map(|e| e.to_string());
            AppAsyncEvent::LoggedOut { error }
        });
    }

    pub(super) fn refresh_dashboard(&mut self) {
        self.dashboard.status = BotStatus::Checking;

        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.session_status(None).await {
                Ok(status) => AppAsyncEvent::StatusLoaded {
                    online: status.is_online(),
                    error: None,
                },
                Err(e) => AppAsyncEvent::StatusLoaded {
                    online: false,
                    error: Some(e.to_string()),
                },
            }
        });

        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.chat_stats().await {
                Ok(stats) => AppAsyncEvent::StatsLoaded {
                    stats: Some(stats),
                    error: None,
                },
                Err(e) => AppAsyncEvent::StatsLoaded {
                    stats: None,
                    error: Some(App::actionable_error(&e)),
                },
            }
        });
    }

    pub(super) fn test_api_key(&mut self) {
        let Some(DashboardModal::Settings(modal)) = &mut self.modal else {
            return;
        };
        if modal.busy.is_some() {
            return;
        }
        let key = modal.api_key().to_string();
        if key.is_empty() {
            modal.status = Some(Banner::error("Please enter an API key first"));
            return;
        }
        modal.busy = Some(SettingsBusy::Testing);
        modal.status = None;

        let api = self.api.clone();
        self.spawn_app_task(async move {
            let error = api
                .test_api_key(&key)
                .await
                .err()
                .map(|e| App::actionable_error(&e));
            AppAsyncEvent::ApiKeyTested { error }
        });
    }

    pub(super) fn save_settings(&mut self) {
        let Some(DashboardModal::Settings(modal)) = &mut self.modal else {
            return;
        };
        if modal.busy.is_some() || modal.closing {
            return;
        }
        modal.busy = Some(SettingsBusy::Saving);
        modal.status = None;
        let key = modal.api_key().to_string();

        let api = self.api.clone();
        self.spawn_app_task(async move {
            let error = api
                .save_settings(&key)
                .await
                .err()
                .map(|e| App::actionable_error(&e));
            AppAsyncEvent::SettingsSaved { error }
        });
    }

    pub(super) fn submit_cancel(&mut self) {
        let phone = self.phone().unwrap_or_default();
        let Some(DashboardModal::Cancel(modal)) = &mut self.modal else {
            return;
        };
        if modal.submitting {
            return;
        }
        if !modal.confirmed {
            modal.error = Some("Tick the confirmation box to cancel".to_string());
            return;
        }
        modal.submitting = true;
        modal.error = None;
        let request = CancelRequest::new(&phone, modal.form.value(0), modal.form.value(1));

        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.cancel_subscription(&request).await {
                Ok(message) => AppAsyncEvent::SubscriptionCancelled {
                    message: Some(message).filter(|m| !m.is_empty()),
                    error: None,
                },
                Err(e) => AppAsyncEvent::SubscriptionCancelled {
                    message: None,
                    error: Some(App::actionable_error(&e)),
                },
            }
        });
    }

    pub(super) fn confirm_action(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteData => self.delete_data(),
            ConfirmAction::Reactivate => self.reactivate(),
            ConfirmAction::ResetSession => self.reset_session(),
            ConfirmAction::DeleteProduct(id) => self.delete_product(id),
        }
    }

    fn reactivate(&mut self) {
        if self.dashboard.busy {
            return;
        }
        let Some(phone) = self.phone() else {
            return;
        };
        self.dashboard.busy = true;
        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.reactivate_subscription(&phone).await {
                Ok(message) => AppAsyncEvent::SubscriptionReactivated {
                    message: Some(message).filter(|m| !m.is_empty()),
                    error: None,
                },
                Err(e) => AppAsyncEvent::SubscriptionReactivated {
                    message: None,
                    error: Some(App::actionable_error(&e)),
                },
            }
        });
    }

    fn delete_data(&mut self) {
        if self.dashboard.busy {
            return;
        }
        self.dashboard.busy = true;
        let api = self.api.clone();
        self.spawn_app_task(async move {
            let error = api
                .delete_data()
                .await
                .err()
                .map(|e| App::actionable_error(&e));
            AppAsyncEvent::DataDeleted { error }
        });
    }

    pub(super) fn submit_product(&mut self) {
        if self.products.submitting {
            return;
        }
        match self.products.mode {
            ProductMode::Add => {
                let Some(form) = self.products.product_form() else {
                    self.show_banner(Banner::error("Product name is required"));
                    return;
                };
                self.products.submitting = true;
                let api = self.api.clone();
                self.spawn_app_task(async move {
                    let result = api.add_product(form).await;
                    Self::product_event("Product added", result)
                });
            }
            ProductMode::Edit => {
                let (Some(id), Some(form)) = (
                    self.products.product_id().map(str::to_string),
                    self.products.product_form(),
                ) else {
                    self.show_banner(Banner::error("Product id and name are required"));
                    return;
                };
                self.products.submitting = true;
                let api = self.api.clone();
                self.spawn_app_task(async move {
                    let result = api.edit_product(&id, form).await;
                    Self::product_event("Product updated", result)
                });
            }
            ProductMode::Delete => match self.products.product_id() {
                Some(id) => self.confirm = Some(ConfirmAction::DeleteProduct(id.to_string())),
                None => self.show_banner(Banner::error("Enter the product id to delete")),
            },
            ProductMode::Stock => self.adjust_stock(),
        }
    }

    fn product_event(context: &str, result: wabot_api::ApiResult<String>) -> AppAsyncEvent {
        match result {
            Ok(message) => AppAsyncEvent::ProductSaved {
                context: context.to_string(),
                message: Some(message),
                error: None,
            },
            Err(e) => AppAsyncEvent::ProductSaved {
                context: context.to_string(),
                message: None,
                error: Some(App::actionable_error(&e)),
            },
        }
    }

    fn delete_product(&mut self, id: String) {
        if self.products.submitting {
            return;
        }
        self.products.submitting = true;
        let api = self.api.clone();
        self.spawn_app_task(async move {
            let result = api.delete_product(&id).await;
            Self::product_event("Product deleted", result)
        });
    }

    fn adjust_stock(&mut self) {
        let Some(StockChange {
            token,
            index,
            change,
        }) = self.products.stock_change()
        else {
            self.show_banner(Banner::error(
                "Enter the remote token, an item index and a whole-number change",
            ));
            return;
        };
        let Some(pin) = self.profile.as_ref().map(|p| p.pin.clone()) else {
            return;
        };
        self.products.submitting = true;
        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.adjust_stock(&token, &pin, index, change).await {
                Ok(new_stock) => AppAsyncEvent::StockUpdated {
                    token,
                    new_stock,
                    error: None,
                },
                Err(e) => AppAsyncEvent::StockUpdated {
                    token,
                    new_stock: None,
                    error: Some(App::actionable_error(&e)),
                },
            }
        });
    }

    pub(super) fn submit_register(&mut self) {
        if self.register.submitting {
            return;
        }
        let Some(request) = self.register.request() else {
            self.show_banner(Banner::error("Please fill in every field"));
            return;
        };
        self.register.submitting = true;

        let api = self.api.clone();
        self.spawn_app_task(async move {
            match api.register(&request).await {
                Ok(redirect_url) => AppAsyncEvent::Registered {
                    redirect_url: Some(redirect_url),
                    error: None,
                },
                Err(e) => AppAsyncEvent::Registered {
                    redirect_url: None,
                    error: Some(App::actionable_error(&e)),
                },
            }
        });
    }

    /// Starts a connect controller for `page`, replacing any running one.
    pub(super) fn open_connect(&mut self, page: ConnectPage, share_link: Option<String>) {
        self.close_connect();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = wabot_connect::start(
            Arc::new(self.api.clone()),
            page.clone(),
            &self.config.timings(),
            tx,
        );
        self.connect = Some(ConnectView::new(page, share_link));
        self.connect_handle = Some(handle);
        self.connect_rx = Some(rx);
        self.screen = Screen::Connect;
    }

    pub(super) fn close_connect(&mut self) {
        if let Some(handle) = self.connect_handle.take() {
            handle.stop();
        }
        self.connect_rx = None;
        self.connect = None;
    }

    pub(super) fn retry_connect(&mut self) {
        let Some(view) = &self.connect else {
            return;
        };
        if !view.retry_visible() {
            return;
        }
        let command = match view.method() {
            wabot_api::PairingMethod::Qr => ConnectCommand::RetryQr,
            wabot_api::PairingMethod::Code => ConnectCommand::RetryCode,
        };
        if let Some(handle) = &self.connect_handle {
            if !handle.send(command) {
                tracing::debug!("Retry ignored; connect tasks have stopped");
            }
        }
    }

    pub(super) fn copy_connect(&mut self) {
        let Some(text) = self.connect.as_ref().and_then(ConnectView::copy_text) else {
            return;
        };
        match Self::copy_to_clipboard(&text) {
            Ok(()) => {
                if let Some(view) = &mut self.connect {
                    view.mark_copied(Instant::now());
                }
                self.clear_error();
            }
            Err(e) => self.report_error("Failed to copy to clipboard", e),
        }
    }

    fn reset_session(&mut self) {
        let Some(view) = &mut self.connect else {
            return;
        };
        if view.resetting {
            return;
        }
        view.resetting = true;
        let api = self.api.clone();
        self.spawn_app_task(async move {
            let error = api
                .reset_session()
                .await
                .err()
                .map(|e| App::actionable_error(&e));
            AppAsyncEvent::SessionReset { error }
        });
    }

    fn copy_to_clipboard(text: &str) -> Result<()> {
        #[cfg(target_os = "macos")]
        let mut command = Command::new("pbcopy");
        #[cfg(not(target_os = "macos"))]
        let mut command = {
            let mut command = Command::new("xclip");
            command.arg("-selection").arg("clipboard").arg("-i");
            command
        };

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("clipboard tool exited with {status}"))
        }
    }
}
