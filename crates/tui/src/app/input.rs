use super::*;

fn ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Shared text editing for a focused form. Returns `true` if handled.
fn edit_form(form: &mut Form, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.previous_field(),
        KeyCode::Backspace => form.handle_backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.handle_char(c),
        _ => return false,
    }
    true
}

impl App {
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            _ => Ok(false),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if ctrl(&key, 'q') {
            return Ok(true);
        }

        if key.code == KeyCode::F(1) {
            self.show_help = !self.show_help;
            return Ok(false);
        }

        if self.show_help {
            if key.code == KeyCode::Esc {
                self.show_help = false;
            }
            return Ok(false);
        }

        if self.show_error_details {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('E')) {
                self.show_error_details = false;
            }
            return Ok(false);
        }

        if self.is_loading {
            return Ok(false);
        }

        if let Some(action) = self.confirm.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.confirm = None;
                    self.confirm_action(action);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.confirm = None,
                _ => {}
            }
            return Ok(false);
        }

        if self.modal.is_some() {
            self.handle_modal_key(key);
            return Ok(false);
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Products => self.handle_products_key(key),
            Screen::Register => self.handle_register_key(key),
            Screen::Connect => self.handle_connect_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<bool> {
        if ctrl(&key, 'r') {
            self.register = RegisterState::default();
            self.screen = Screen::Register;
            return Ok(false);
        }
        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Enter => self.submit_login(),
            _ => {
                if !self.login.submitting {
                    edit_form(&mut self.login.form, &key);
                }
            }
        }
        Ok(false)
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('s') => {
                self.modal = Some(DashboardModal::Settings(SettingsModal::default()));
            }
            KeyCode::Char('c') => self.modal = Some(DashboardModal::Cancel(CancelModal::default())),
            KeyCode::Char('r') => self.confirm = Some(ConfirmAction::Reactivate),
            KeyCode::Char('d') => self.confirm = Some(ConfirmAction::DeleteData),
            KeyCode::Char('p') => self.screen = Screen::Products,
            KeyCode::Char('q') => {
                if let Some(session) = self.profile.as_ref().map(Profile::session_name) {
                    self.open_connect(
                        ConnectPage::Pairing {
                            session,
                            method: wabot_api::PairingMethod::Qr,
                        },
                        None,
                    );
                }
            }
            KeyCode::Char('Q') => self.open_connect(ConnectPage::QrScan, None),
            KeyCode::Char('n') => {
                self.register = RegisterState::default();
                self.screen = Screen::Register;
            }
            KeyCode::Char('g') => self.refresh_dashboard(),
            KeyCode::Char('l') => self.logout(),
            KeyCode::Char('E') if self.last_error.is_some() => self.show_error_details = true,
            KeyCode::Esc => return Ok(true),
            _ => {}
        }
        Ok(false)
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match &mut self.modal {
            Some(DashboardModal::Settings(modal)) => {
                if ctrl(&key, 't') {
                    self.test_api_key();
                } else if ctrl(&key, 'e') {
                    modal.reveal = !modal.reveal;
                } else {
                    match key.code {
                        KeyCode::Esc => self.modal = None,
                        KeyCode::Enter => self.save_settings(),
                        _ => {
                            if modal.busy.is_none() {
                                edit_form(&mut modal.form, &key);
                            }
                        }
                    }
                }
            }
            Some(DashboardModal::Cancel(modal)) => match key.code {
                KeyCode::Esc => self.modal = None,
                KeyCode::Enter => self.submit_cancel(),
                KeyCode::Tab | KeyCode::Down => modal.next_focus(),
                KeyCode::Char(' ') if modal.on_checkbox => modal.confirmed = !modal.confirmed,
                _ if modal.on_checkbox || modal.submitting => {}
                _ => {
                    edit_form(&mut modal.form, &key);
                }
            },
            None => {}
        }
    }

    fn handle_products_key(&mut self, key: KeyEvent) -> Result<bool> {
        let switch_to = [
            ('a', ProductMode::Add),
            ('e', ProductMode::Edit),
            ('d', ProductMode::Delete),
            ('s', ProductMode::Stock),
        ]
        .into_iter()
        .find(|(c, _)| ctrl(&key, *c))
        .map(|(_, mode)| mode);

        if let Some(mode) = switch_to {
            if !self.products.submitting {
                self.products.switch(mode);
                let token = self.profile.as_ref().and_then(|p| p.remote_token.clone());
                if let (ProductMode::Stock, Some(token)) = (mode, token) {
                    if self.products.form.value(0).is_empty() {
                        self.products.form.set_value(0, token);
                    }
                }
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Enter => self.submit_product(),
            _ => {
                if !self.products.submitting {
                    edit_form(&mut self.products.form, &key);
                }
            }
        }
        Ok(false)
    }

    fn handle_register_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.register.submitting {
            return Ok(false);
        }
        if ctrl(&key, 't') {
            self.register.next_tier();
            return Ok(false);
        }
        if ctrl(&key, 'p') {
            self.register.toggle_method();
            return Ok(false);
        }
        match key.code {
            KeyCode::Esc => {
                self.screen = if self.profile.is_some() {
                    Screen::Dashboard
                } else {
                    Screen::Login
                };
            }
            KeyCode::Enter => self.submit_register(),
            _ => {
                edit_form(&mut self.register.form, &key);
            }
        }
        Ok(false)
    }

    fn handle_connect_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('r') => self.retry_connect(),
            KeyCode::Char('c') => self.copy_connect(),
            KeyCode::Char('x') => {
                let resettable = |view: &ConnectView| {
                    view.page == ConnectPage::QrScan && !view.resetting
                };
                if self.connect.as_ref().is_some_and(resettable) {
                    self.confirm = Some(ConfirmAction::ResetSession);
                }
            }
            KeyCode::Char('E') if self.last_error.is_some() => self.show_error_details = true,
            KeyCode::Esc => {
                self.close_connect();
                self.screen = if self.profile.is_some() {
                    self.refresh_dashboard();
                    Screen::Dashboard
                } else {
                    Screen::Login
                };
            }
            _ => {}
        }
        Ok(false)
    }
}
