use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Write};

mod api;
mod app;
mod commands;
mod config;
mod error;
mod formatting;
mod mutation;
mod poller;
mod session;
mod state;
mod utils;
mod widgets;

use api::ApiClient;
use app::{App, Focus};
use config::Config;
use error::ApiError;
use session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_logging(&config);

    let session = SessionStore::open(config.session_path());
    let client = ApiClient::new(&config.base_url, session);

    // A 401 anywhere lands back here: the TUI is torn down and the login
    // prompt runs again on plain stdio.
    loop {
        if !ensure_session(&client, &config).await? {
            break;
        }

        let mut app = App::new(config.clone(), client.clone());

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?; // Cursor shown only when a composer is focused

        let res = run_app(&mut terminal, &mut app).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        let expired = app.session_expired;
        app.shutdown().await;
        res?;

        if expired {
            println!("Session ended. Please log in again.");
            continue;
        }
        break;
    }

    Ok(())
}

/// Log to a file in the config dir; stdout belongs to the TUI.
fn init_logging(config: &Config) {
    let _ = std::fs::create_dir_all(&config.config_dir);
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
    {
        let _ = tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }
}

/// Validate a stored credential or run the interactive login prompt.
/// Returns false when the user quits at the prompt.
async fn ensure_session(client: &ApiClient, config: &Config) -> Result<bool> {
    if client.session().is_active() {
        match client.profile().await {
            Ok(profile) => {
                println!("Logged in as {}", profile.username);
                return Ok(true);
            }
            // Stale credential: the gateway already cleared it.
            Err(ApiError::Unauthorized) => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("could not reach the Belay server at {}", config.base_url)
                });
            }
        }
    }
    login_prompt(client).await
}

async fn login_prompt(client: &ApiClient) -> Result<bool> {
    println!("=== Belay ===");
    loop {
        print!("[l]ogin, [s]ignup or [q]uit: ");
        io::stdout().flush()?;
        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        let choice = choice.trim().to_lowercase();

        if choice == "q" {
            return Ok(false);
        }
        if choice != "l" && choice != "s" {
            continue;
        }

        print!("Username: ");
        io::stdout().flush()?;
        let mut username = String::new();
        io::stdin().read_line(&mut username)?;
        let username = username.trim();

        print!("Password: ");
        io::stdout().flush()?;
        let mut password = String::new();
        io::stdin().read_line(&mut password)?;
        let password = password.trim();

        let result = if choice == "l" {
            client.login(username, password).await
        } else {
            client.signup(username, password).await
        };

        match result {
            Ok(creds) => {
                println!("Welcome, {}!", creds.username);
                return Ok(true);
            }
            Err(err) => {
                eprintln!("{}", err);
            }
        }
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Reconcile whatever the pollers delivered since the last pass.
        app.process_sync_updates().await;
        app.tick();

        if app.session_expired || app.should_quit {
            break;
        }

        if app.needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            app.needs_redraw = false;
        }

        if event::poll(std::time::Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => handle_key(app, key).await?,
                Event::Resize(_, _) => app.needs_redraw = true,
                _ => {}
            }
        }
    }

    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Ctrl+Q: Quit
        KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
        }
        // Ctrl+E: Toggle reactions
        KeyCode::Char('e') if ctrl => {
            app.toggle_reactions();
        }
        // Ctrl+T: Toggle timestamps
        KeyCode::Char('t') if ctrl => {
            app.toggle_timestamps();
        }
        // Ctrl+N: Toggle notifications
        KeyCode::Char('n') if ctrl => {
            app.toggle_notifications();
        }
        // Tab: Move focus between channel list, composer, thread
        KeyCode::Tab => {
            app.cycle_focus();
        }
        // Enter: Open the selected channel or send the composed message
        KeyCode::Enter => {
            if app.focus == Focus::ChannelList {
                app.open_selected_channel().await;
            } else {
                app.submit_input().await?;
            }
        }
        // Esc: Close the focused view
        KeyCode::Esc => match app.focus {
            Focus::ThreadComposer => app.close_thread(),
            Focus::Composer => app.close_channel(),
            Focus::ChannelList => {}
        },
        KeyCode::Up => {
            if app.focus == Focus::ChannelList {
                app.select_previous_channel();
            } else {
                app.focused_view_mut().scroll_up();
            }
            app.needs_redraw = true;
        }
        KeyCode::Down => {
            if app.focus == Focus::ChannelList {
                app.select_next_channel();
            } else {
                app.focused_view_mut().scroll_down();
            }
            app.needs_redraw = true;
        }
        KeyCode::PageUp if app.focus != Focus::ChannelList => {
            for _ in 0..10 {
                app.focused_view_mut().scroll_up();
            }
            app.needs_redraw = true;
        }
        KeyCode::PageDown if app.focus != Focus::ChannelList => {
            for _ in 0..10 {
                app.focused_view_mut().scroll_down();
            }
            app.needs_redraw = true;
        }
        KeyCode::End if app.focus != Focus::ChannelList => {
            app.focused_view_mut().move_cursor_end();
            app.needs_redraw = true;
        }
        KeyCode::Left if app.focus != Focus::ChannelList => {
            app.focused_view_mut().move_cursor_left();
            app.needs_redraw = true;
        }
        KeyCode::Right if app.focus != Focus::ChannelList => {
            app.focused_view_mut().move_cursor_right();
            app.needs_redraw = true;
        }
        KeyCode::Home if app.focus != Focus::ChannelList => {
            app.focused_view_mut().move_cursor_home();
            app.needs_redraw = true;
        }
        KeyCode::Backspace if app.focus != Focus::ChannelList => {
            app.focused_view_mut().backspace();
            app.needs_redraw = true;
        }
        KeyCode::Char(c) if app.focus != Focus::ChannelList && !ctrl => {
            app.focused_view_mut().insert_char(c);
            app.needs_redraw = true;
        }
        _ => {}
    }

    Ok(())
}
