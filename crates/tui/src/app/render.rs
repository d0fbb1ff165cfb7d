use super::*;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

const DASHBOARD_HINT: &str = " [s] Settings  [c] Cancel plan  [r] Reactivate  [d] Delete data  [p] Products  [q] Connect WhatsApp  [n] Register  [g] Refresh  [l] Log out";

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        if self.is_loading {
            self.render_loading(frame, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_topbar(frame, chunks[0]);
        match self.screen {
            Screen::Login => self.render_login(frame, chunks[1]),
            Screen::Dashboard => self.render_dashboard(frame, chunks[1]),
            Screen::Products => self.render_products(frame, chunks[1]),
            Screen::Register => self.render_register(frame, chunks[1]),
            Screen::Connect => self.render_connect(frame, chunks[1]),
        }
        self.render_banner(frame, chunks[2]);

        if let Some(ref modal) = self.modal {
            self.render_modal(frame, area, modal);
        }

        if let Some(ref action) = self.confirm {
            self.render_confirmation_dialog(frame, area, action);
        }

        if self.show_help {
            self.render_help(frame, area);
        }

        if self.show_error_details {
            self.render_error_details(frame, area);
        }
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let text = format!("\n\n  {}  \n\n", self.loading_message);
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(" wabot "))
            .centered();
        frame.render_widget(paragraph, area);
    }

    fn render_topbar(&self, frame: &mut Frame, area: Rect) {
        let who = self
            .profile
            .as_ref()
            .map(|p| format!("Store {}", p.phone))
            .unwrap_or_else(|| "Not signed in".to_string());
        let screen = match self.screen {
            Screen::Login => "Login",
            Screen::Dashboard => "Dashboard",
            Screen::Products => "Products",
            Screen::Register => "Register",
            Screen::Connect => "Connect WhatsApp",
        };
        let line = Line::from(vec![
            Span::styled(" wabot ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("│ {screen} │ {who} │ {} ", self.api.base_url())),
            Span::styled("[F1] help", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match (&self.banner, &self.last_error) {
            (Some(banner), _) => (banner.text.clone(), Self::banner_style(banner.kind)),
            (None, Some(_)) => (
                "Something went wrong. Press [E] for details.".to_string(),
                Style::default().fg(Color::Red),
            ),
            (None, None) => (String::new(), Style::default()),
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(style)
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
    }

    fn banner_style(kind: BannerKind) -> Style {
        match kind {
            BannerKind::Success => Style::default().fg(Color::Green),
            BannerKind::Error => Style::default().fg(Color::Red),
            BannerKind::Info => Style::default().fg(Color::Yellow),
        }
    }

    fn form_text(form: &Form, reveal: bool) -> String {
        form.lines(reveal).join("\n")
    }

    fn render_login(&self, frame: &mut Frame, area: Rect) {
        let mut text = format!(
            "\n  Sign in with your store's WhatsApp number and remote PIN.\n\n{}\n\n",
            Self::form_text(&self.login.form, false)
        );
        if self.login.submitting {
            text.push_str("  Signing in...\n");
        } else if let Some(ref err) = self.login.error {
            text.push_str(&format!("  {err}\n"));
        }
        text.push_str("\n  [Enter] Sign in  [Ctrl+R] Register a new bot  [Esc] Quit");

        let popup = self.centered_rect(60, 60, area);
        frame.render_widget(
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Login ")),
            popup,
        );
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(area);

        let status = self.dashboard.status;
        let status_style = match status {
            BotStatus::Online => Style::default().fg(Color::Green),
            BotStatus::Offline => Style::default().fg(Color::Red),
            BotStatus::Checking => Style::default().fg(Color::Yellow),
        };
        let mut lines = vec![Line::from(vec![
            Span::raw(" Bot status: "),
            Span::styled(
                format!("● {}", status.label()),
                status_style.add_modifier(Modifier::BOLD),
            ),
            Span::raw(
                self.dashboard
                    .refreshed_at
                    .map(|t| format!("  (checked {})", t.format("%H:%M:%S")))
                    .unwrap_or_default(),
            ),
        ])];
        if status.show_warning() {
            lines.push(Line::styled(
                " WhatsApp is not connected. Press [q] to scan the QR code.",
                Style::default().fg(Color::Red),
            ));
        }
        if self.dashboard.busy {
            lines.push(Line::raw(" Working..."));
        }
        lines.push(Line::styled(
            DASHBOARD_HINT,
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Dashboard ")),
            chunks[0],
        );

        self.render_stats(frame, chunks[1]);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Chats, last 7 days ");
        let Some(ref stats) = self.dashboard.stats else {
            frame.render_widget(Paragraph::new(" Loading...").block(block), area);
            return;
        };

        let bars: Vec<Bar> = stats
            .labels
            .iter()
            .zip(stats.data.iter())
            .map(|(label, value)| {
                Bar::default()
                    .label(Line::from(label.clone()))
                    .value(*value)
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .bar_width(6)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Green))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn render_products(&self, frame: &mut Frame, area: Rect) {
        let mode = self.products.mode;
        let mut text = format!("\n{}\n\n", Self::form_text(&self.products.form, true));
        if self.products.submitting {
            text.push_str("  Saving...\n");
        }
        if let (ProductMode::Stock, Some(stock)) = (mode, self.products.last_stock) {
            text.push_str(&format!("  Current stock: {stock}\n"));
        }
        text.push_str(
            "\n  [Ctrl+A] Add  [Ctrl+E] Edit  [Ctrl+D] Delete  [Ctrl+S] Stock  [Enter] Submit  [Esc] Back",
        );
        frame.render_widget(
            Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Products - {} ", mode.title())),
            ),
            area,
        );
    }

    fn render_register(&self, frame: &mut Frame, area: Rect) {
        let state = &self.register;
        let copy = state.copy();
        let text = format!(
            "\n  {}\n  {}\n\n  Plan: {}   Pairing: {}\n\n{}\n\n  [Enter] {}\n\n  {}\n\n  [Ctrl+T] Change plan  [Ctrl+P] QR / pairing code  [Esc] Back",
            copy.title,
            copy.subtitle,
            state.tier.as_str(),
            match state.method {
                wabot_api::PairingMethod::Qr => "Scan QR",
                wabot_api::PairingMethod::Code => "Pairing code",
            },
            Self::form_text(&state.form, true),
            state.button_label(),
            copy.footer,
        );
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Register ")),
            area,
        );
    }

    fn render_connect(&self, frame: &mut Frame, area: Rect) {
        let Some(ref view) = self.connect else {
            return;
        };

        let mut lines = Vec::new();
        if view.connected {
            lines.push(Line::styled(
                " ✓ WhatsApp connected. Your bot is active.",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
        } else {
            lines.push(Line::raw(" Waiting for WhatsApp to connect..."));
            lines.push(Line::raw(""));
            let body = match view.method() {
                wabot_api::PairingMethod::Qr => view.qr_text(),
                wabot_api::PairingMethod::Code => format!(
                    "Pairing code: {}\n On your phone: WhatsApp > Linked devices > Link with phone number.",
                    view.code_text()
                ),
            };
            for line in body.lines() {
                lines.push(Line::raw(format!(" {line}")));
            }
        }
        if let Some(ref link) = view.share_link {
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!(" Activation link: {link}")));
        }
        if view.resetting {
            lines.push(Line::raw(" Resetting session..."));
        }

        let mut keys = Vec::new();
        if view.retry_visible() {
            keys.push("[r] Retry".to_string());
        }
        if view.copy_visible() {
            keys.push(format!("[c] {}", view.copy_label()));
        }
        if view.page == ConnectPage::QrScan {
            keys.push("[x] Reset session".to_string());
        }
        keys.push("[Esc] Back".to_string());
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!(" {}", keys.join("  ")),
            Style::default().fg(Color::DarkGray),
        ));

        let title = match view.page {
            ConnectPage::QrScan => " Scan QR ".to_string(),
            ConnectPage::Signup { ref order_id } => format!(" Activate order {order_id} "),
            ConnectPage::Pairing { ref session, .. } => format!(" Activate {session} "),
        };
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect, modal: &DashboardModal) {
        let popup = self.centered_rect(60, 40, area);
        let (title, text) = match modal {
            DashboardModal::Settings(settings) => {
                let mut text = format!("\n{}\n\n", Self::form_text(&settings.form, settings.reveal));
                match settings.busy {
                    Some(SettingsBusy::Testing) => text.push_str("  Testing...\n"),
                    Some(SettingsBusy::Saving) => text.push_str("  Saving...\n"),
                    None => {}
                }
                if let Some(ref status) = settings.status {
                    text.push_str(&format!("  {}\n", status.text));
                }
                text.push_str("\n  [Ctrl+T] Test  [Ctrl+E] Show/hide  [Enter] Save  [Esc] Close");
                (" Settings ", text)
            }
            DashboardModal::Cancel(cancel) => {
                let checkbox = if cancel.confirmed { "[x]" } else { "[ ]" };
                let marker = if cancel.on_checkbox { ">" } else { " " };
                let mut text = format!(
                    "\n{}\n{marker} {checkbox} I understand my bot will stop replying\n\n",
                    Self::form_text(&cancel.form, true)
                );
                if cancel.submitting {
                    text.push_str("  Processing...\n");
                } else if let Some(ref err) = cancel.error {
                    text.push_str(&format!("  {err}\n"));
                }
                text.push_str("\n  [Tab] Next  [Space] Tick  [Enter] Cancel plan  [Esc] Close");
                (" Cancel subscription ", text)
            }
        };

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(title)),
            popup,
        );
    }

    fn render_confirmation_dialog(&self, frame: &mut Frame, area: Rect, action: &ConfirmAction) {
        let popup = self.centered_rect(50, 20, area);
        let content = format!("\n  {}\n\n  [y] Confirm  [n] Cancel", action.prompt());

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(content)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Confirm ")),
            popup,
        );
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help_text = self.keybinds.help_text();
        let popup_area = self.centered_rect(60, 80, area);

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(help_text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help - Press F1 to close "),
            ),
            popup_area,
        );
    }

    fn render_error_details(&self, frame: &mut Frame, area: Rect) {
        let popup_area = self.centered_rect(60, 20, area);
        let details = self
            .last_error
            .as_deref()
            .unwrap_or("No error details available.");
        let text = format!("{details}\n\n[Esc] or [Enter] to close");

        frame.render_widget(Clear, popup_area);
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Error Details ")),
            popup_area,
        );
    }

    fn centered_rect(&self, percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(200, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        let api = DashboardApi::new("http://127.0.0.1:9").unwrap();
        let mut app = App::new(Config::default(), api);
        app.is_loading = false;
        app
    }

    #[test]
    fn dashboard_lists_connect_and_register_keys() {
        let mut app = app();
        app.screen = Screen::Dashboard;
        let text = screen_text(&mut app);
        assert!(text.contains("[q] Connect WhatsApp"));
        assert!(text.contains("[n] Register"));
    }

    #[tokio::test]
    async fn reset_is_offered_only_for_master_session() {
        let mut app = app();
        app.open_connect(ConnectPage::QrScan, None);
        assert!(screen_text(&mut app).contains("[x] Reset session"));

        app.open_connect(
            ConnectPage::Pairing {
                session: "session_62811".into(),
                method: wabot_api::PairingMethod::Qr,
            },
            None,
        );
        assert!(!screen_text(&mut app).contains("[x] Reset session"));
        app.close_connect();
    }
}
