use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};
use crate::model::Quality;
use crate::state::{Dialog, Tab, View};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Single-line text editing shared by the search box and the key field.
/// Returns false for keys that are not editing keys.
fn edit_line(text: &mut String, cursor: &mut usize, code: KeyCode) -> bool {
  match code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(text, *cursor);
      text.insert(byte_idx, c);
      *cursor += 1;
    }
    KeyCode::Backspace => {
      if *cursor > 0 {
        *cursor -= 1;
        let byte_idx = char_to_byte_index(text, *cursor);
        text.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if *cursor < text.chars().count() {
        let byte_idx = char_to_byte_index(text, *cursor);
        text.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      *cursor = cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if *cursor < text.chars().count() {
        *cursor += 1;
      }
    }
    KeyCode::Home => {
      *cursor = 0;
    }
    KeyCode::End => {
      *cursor = text.chars().count();
    }
    _ => return false,
  }
  true
}

fn step(selected: Option<usize>, count: usize, down: bool) -> Option<usize> {
  if count == 0 {
    return None;
  }
  Some(match (selected, down) {
    (None, _) => 0,
    (Some(i), true) => (i + 1) % count,
    (Some(0), false) => count - 1,
    (Some(i), false) => i - 1,
  })
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

  if ctrl && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('t') {
    app.next_theme();
    return Ok(());
  }

  if app.state.dialog.is_some() {
    handle_dialog_key(app, key);
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('k') {
    app.state.open_settings();
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('s') {
    if app.player.is_playing() {
      app.player.stop().await.context("Failed to stop playback")?;
    }
    return Ok(());
  }

  if ctrl && key.code == KeyCode::Char('o') {
    open_in_browser(app);
    return Ok(());
  }

  match (app.state.view, app.mode) {
    (View::Player, _) => handle_player_key(app, key).await.context("Failed to handle player key event")?,
    (View::Home, AppMode::Input) => handle_input_key(app, key),
    (View::Home, AppMode::Results) => handle_results_key(app, key).await,
  }
  Ok(())
}

fn open_in_browser(app: &mut App) {
  let Some(video) = app.focused_video() else { return };
  let url = video.web_url.clone().unwrap_or_else(|| video.url.clone());
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(&url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap in the background so no zombie is left behind.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

fn handle_dialog_key(app: &mut App, key: event::KeyEvent) {
  let Some(dialog) = app.state.dialog.as_mut() else { return };
  match dialog {
    Dialog::Settings { draft, cursor } => match key.code {
      KeyCode::Enter => app.save_settings(),
      KeyCode::Esc => app.state.close_dialog(),
      code => {
        edit_line(draft, cursor, code);
      }
    },
    Dialog::Download { choice, .. } => match key.code {
      KeyCode::Down | KeyCode::Char('j') => {
        *choice = step(Some(*choice), Quality::ALL.len(), true).unwrap_or(0);
      }
      KeyCode::Up | KeyCode::Char('k') => {
        *choice = step(Some(*choice), Quality::ALL.len(), false).unwrap_or(0);
      }
      KeyCode::Enter => app.confirm_download(),
      KeyCode::Esc | KeyCode::Char('q') => app.state.close_dialog(),
      _ => {}
    },
    Dialog::Alert(_) => {
      if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
        app.state.close_dialog();
      }
    }
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.state.visible().is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if !app.state.visible().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    code => {
      edit_line(&mut app.input, &mut app.cursor_position, code);
    }
  }
}

async fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.play_selected().await;
    }
    KeyCode::Char('d') => {
      app.request_download();
    }
    KeyCode::Char('t') => {
      app.show_trending();
    }
    KeyCode::Tab => {
      app.toggle_tab();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      let count = app.state.visible().len();
      app.list_state.select(step(app.list_state.selected(), count, true));
    }
    KeyCode::Up | KeyCode::Char('k') => {
      let count = app.state.visible().len();
      app.list_state.select(step(app.list_state.selected(), count, false));
    }
    KeyCode::Char('/') | KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

async fn handle_player_key(app: &mut App, key: event::KeyEvent) -> Result<()> {
  match key.code {
    KeyCode::Char(' ') => {
      if app.player.is_playing()
        && let Err(e) = app.player.toggle_pause().await
      {
        app.set_error(format!("Pause error: {}", e));
      }
    }
    KeyCode::Char('p') => {
      if !app.player.is_playing()
        && let Some(video) = app.state.selected.clone()
      {
        app.start_playback(&video).await;
      }
    }
    KeyCode::Char('d') => {
      app.request_download();
    }
    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
      app.back_to_home().await?;
      if app.state.tab == Tab::Search && app.state.results.is_empty() {
        app.state.tab = Tab::Trending;
      }
    }
    _ => {}
  }
  Ok(())
}
