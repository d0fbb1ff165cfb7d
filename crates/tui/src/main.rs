use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use directories::ProjectDirs;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use wabot::{App, Config};
use wabot_api::auth::ProfileStore;

const LOG_FILE: &str = "wabot.log";

fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "wabot", "wabot") {
        proj_dirs.config_dir().join("config.toml")
    } else {
        PathBuf::from("config/default.toml")
    }
}

/// The terminal belongs to the UI, so logs go to a file next to the profile.
fn init_logging(store: Option<&ProfileStore>) {
    let Some(dir) = store.map(ProfileStore::dir) else {
        return;
    };
    if fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join(LOG_FILE)) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = color_eyre::install() {
        eprintln!("Failed to install panic hook: {e}");
    }
    let _ = dotenvy::dotenv();

    let mut config = Config::load_or_default(&get_config_path());
    config.apply_env();
    let store = ProfileStore::default_location().ok();
    init_logging(store.as_ref());

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, config, store);
    ratatui::restore();

    result
}

fn run(
    terminal: &mut ratatui::DefaultTerminal,
    config: Config,
    store: Option<ProfileStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let api = config.build_api()?;
    let mut app = App::new(config, api);
    if let Some(store) = store {
        app = app.with_profile_store(store);
    }

    rt.block_on(async {
        if let Err(e) = app.init().await {
            tracing::error!("Failed to initialize app: {e}");
        }
    });

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            let event = event::read()?;

            if let Event::Key(key) = &event {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
            }

            match app.handle_event(event) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => tracing::warn!("Input handling failed: {e}"),
            }
        }

        app.process_events();
        app.on_tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
