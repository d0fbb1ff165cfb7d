use super::*;

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub api: DashboardApi,
    pub profiles: Option<ProfileStore>,
    pub profile: Option<Profile>,
    pub screen: Screen,
    pub keybinds: Keybinds,
    pub login: LoginState,
    pub dashboard: DashboardState,
    pub products: ProductsState,
    pub register: RegisterState,
    pub modal: Option<DashboardModal>,
    pub confirm: Option<ConfirmAction>,
    pub connect: Option<ConnectView>,
    pub connect_handle: Option<ConnectHandle>,
    pub connect_rx: Option<mpsc::UnboundedReceiver<ConnectEvent>>,
    pub app_async_tx: Option<mpsc::UnboundedSender<AppAsyncEvent>>,
    pub app_async_rx: Option<mpsc::UnboundedReceiver<AppAsyncEvent>>,
    pub banner: Option<Banner>,
    pub show_help: bool,
    pub is_loading: bool,
    pub loading_message: String,
    pub last_error: Option<String>,
    pub show_error_details: bool,
}

impl App {
    pub fn new(config: Config, api: DashboardApi) -> Self {
        let (app_async_tx, app_async_rx) = mpsc::unbounded_channel();

        Self {
            should_quit: false,
            config,
            api,
            profiles: None,
            profile: None,
            screen: Screen::Login,
            keybinds: Keybinds,
            login: LoginState::default(),
            dashboard: DashboardState::default(),
            products: ProductsState::default(),
            register: RegisterState::default(),
            modal: None,
            confirm: None,
            connect: None,
            connect_handle: None,
            connect_rx: None,
            app_async_tx: Some(app_async_tx),
            app_async_rx: Some(app_async_rx),
            banner: None,
            show_help: false,
            is_loading: true,
            loading_message: "Loading...".to_string(),
            last_error: None,
            show_error_details: false,
        }
    }

    /// Remembers the signed-in profile and stores the QR image under `store`'s directory.
    pub fn with_profile_store(mut self, store: ProfileStore) -> Self {
        self.profiles = Some(store);
        self
    }

    pub(super) fn data_dir(&self) -> Option<&Path> {
        self.profiles.as_ref().map(ProfileStore::dir)
    }
}
