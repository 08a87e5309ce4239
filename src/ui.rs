use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::model::{Quality, Video, VideoFormat};
use crate::state::{Dialog, Tab, View};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// `m:ss`, with minutes uncapped (`75:00` for 4500 seconds).
pub fn format_duration(secs: u32) -> String {
  format!("{}:{:02}", secs / 60, secs % 60)
}

/// Compact view count: `1.2M`, `3.4K`, or the plain number.
pub fn format_views(views: u64) -> String {
  if views >= 1_000_000 {
    format!("{:.1}M", views as f64 / 1_000_000.0)
  } else if views >= 1_000 {
    format!("{:.1}K", views as f64 / 1_000.0)
  } else {
    views.to_string()
  }
}

fn format_list(formats: &[VideoFormat]) -> String {
  formats.iter().map(|f| f.label()).collect::<Vec<_>>().join("/")
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [area] = Layout::horizontal([Constraint::Length(width.min(area.width))]).flex(Flex::Center).areas(area);
  let [area] = Layout::vertical([Constraint::Length(height.min(area.height))]).flex(Flex::Center).areas(area);
  area
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  match app.state.view {
    View::Player => render_player(frame, app, main_area),
    View::Home => render_home(frame, app, main_area),
  }
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  let area = frame.area();
  if let Some(dialog) = &app.state.dialog {
    render_dialog(frame, theme, dialog, area);
  }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" ▶ StreamFree ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("[{}]", app.backend.name()), Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_home(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.state.needs_key() {
    render_key_prompt(frame, app.theme(), area);
  } else if app.state.loading() {
    render_loading(frame, app, area);
  } else {
    render_list(frame, app, area);
  }
}

fn render_key_prompt(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("⚠  API Key Required", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("StreamFree needs an API key before it can load any videos.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Press Ctrl+K to enter your API key.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(rounded(theme));
  frame.render_widget(paragraph, area);
}

fn render_loading(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let label = match app.state.tab {
    Tab::Search => "Searching videos…",
    Tab::Trending => "Loading trending videos…",
  };
  let text = vec![Line::from(""), Line::from(Span::styled(format!("⏳ {}", label), Style::default().fg(theme.status)))];
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(rounded(theme)), area);
}

fn tab_bar(app: &App) -> Line<'static> {
  let theme = app.theme();
  let tab_style = |active: bool| {
    if active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    }
  };
  let mut spans = vec![Span::styled(" Trending ", tab_style(app.state.tab == Tab::Trending))];
  if !app.state.results.is_empty() {
    spans.push(Span::raw(" "));
    spans.push(Span::styled(" Search Results ", tab_style(app.state.tab == Tab::Search)));
  }
  Line::from(spans)
}

fn list_heading(app: &App) -> (String, String) {
  match app.state.tab {
    Tab::Trending => ("Trending Videos".to_string(), format!("{} trending videos", app.state.trending.len())),
    Tab::Search => (
      format!("Search results: \"{}\"", app.state.query.trim()),
      format!("{} videos found", app.state.results.len()),
    ),
  }
}

fn render_list(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [tabs_area, list_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(2)]).areas(area);
  frame.render_widget(tab_bar(app), tabs_area);

  let (title, count) = list_heading(app);
  let block = rounded(theme)
    .title(format!(" {} ", title))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .title_bottom(Line::from(format!(" {} ", count)).right_aligned().fg(theme.muted));

  let videos = app.state.visible();
  if videos.is_empty() {
    let lines = match app.state.tab {
      Tab::Trending => vec![
        Line::from(""),
        Line::from(Span::styled("No Trending Videos Yet", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("Trending videos appear here once an API key is configured.", theme.muted)),
      ],
      Tab::Search => vec![
        Line::from(""),
        Line::from(Span::styled("No Results", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
          format!("No videos found for \"{}\". Submit an empty search to return to trending.", app.state.query.trim()),
          theme.muted,
        )),
      ],
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center).block(block), list_area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = list_area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = videos
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let right = format!(
        "{}  {} views  {}",
        format_duration(video.duration),
        format_views(video.views),
        video.upload_date
      );
      let right_w = right.chars().count();
      let title = truncate_str(&video.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let border = if app.mode == AppMode::Results { theme.accent } else { theme.border };
  let list = List::new(items)
    .block(block.border_style(Style::default().fg(border)))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, list_area, &mut app.list_state);
}

fn detail_row<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
  Line::from(vec![Span::styled(label, Style::default().fg(theme.muted)), Span::styled(value, Style::default().fg(theme.fg))])
}

fn render_player(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(video) = &app.state.selected else {
    frame.render_widget(rounded(theme), area);
    return;
  };

  let state_label = match (app.player.is_playing(), app.player.paused) {
    (true, true) => "Paused",
    (true, false) => "Playing",
    (false, _) => "Stopped",
  };
  let title = Line::from(vec![
    Span::styled(" Now Playing ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("[{}] ", state_label.to_lowercase()), Style::default().fg(theme.muted)),
  ]);
  let block = rounded(theme).title(title).padding(Padding::horizontal(1));
  let inner_w = area.width.saturating_sub(4) as usize;

  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    detail_row("Duration  ", format_duration(video.duration), theme),
    detail_row("Views     ", format_views(video.views), theme),
    detail_row("Uploaded  ", video.upload_date.clone(), theme),
    detail_row("Type      ", video.kind.clone(), theme),
    detail_row("Quality   ", video.quality.iter().map(|q| q.label()).collect::<Vec<_>>().join(" / "), theme),
    Line::from(""),
  ];
  lines.push(Line::from(Span::styled(video.description.clone(), Style::default().fg(theme.fg))));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    truncate_str(&video.url, inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  )));

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.status))
  } else {
    match (app.player.last_mpv_status(), &app.player.current) {
      (Some(status), _) => (format!(" ♪ {}", status), Style::default().fg(theme.status)),
      (None, Some(video)) => (format!(" ♪ {}", video.title), Style::default().fg(theme.status)),
      (None, None) => (" Ready".to_string(), Style::default().fg(theme.muted)),
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.state.view == View::Home && app.mode == AppMode::Input && app.state.dialog.is_none();
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search videos ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  let is_playing = app.player.is_playing();
  if let Some(dialog) = &app.state.dialog {
    return match dialog {
      Dialog::Settings { .. } => vec![("Enter", "Save"), ("Esc", "Cancel")],
      Dialog::Download { .. } => vec![("↑/↓", "Quality"), ("Enter", "Download"), ("Esc", "Close")],
      Dialog::Alert(_) => vec![("Enter", "OK")],
    };
  }
  match (app.state.view, app.mode) {
    (View::Player, _) => {
      let mut k = Vec::new();
      if is_playing {
        k.push(("Space", if app.player.paused { "Resume" } else { "Pause" }));
        k.push(("^s", "Stop"));
      } else {
        k.push(("p", "Play"));
      }
      k.extend([("d", "Download"), ("^o", "Open"), ("Esc", "Back")]);
      k
    }
    (View::Home, AppMode::Input) => {
      let mut k = vec![("Enter", "Search"), ("^k", "API key"), ("^t", "Theme")];
      if !app.state.visible().is_empty() {
        k.push(("↓", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    (View::Home, AppMode::Results) => {
      vec![("Enter", "Play"), ("j/k", "Navigate"), ("d", "Download"), ("Tab", "Switch tab"), ("t", "Trending"), ("Esc", "Search")]
    }
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

// --- Dialogs ---

fn render_dialog(frame: &mut Frame, theme: &Theme, dialog: &Dialog, area: Rect) {
  match dialog {
    Dialog::Settings { draft, cursor } => render_settings(frame, theme, draft, *cursor, area),
    Dialog::Download { video, choice, pending } => render_download(frame, theme, video, *choice, *pending, area),
    Dialog::Alert(message) => render_alert(frame, theme, message, area),
  }
}

fn dialog_block(theme: &Theme, title: &str) -> Block<'static> {
  Block::bordered()
    .title(format!(" {} ", title))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1))
}

/// Key field contents: masked like a password input.
fn masked(draft: &str) -> String {
  "•".repeat(draft.chars().count())
}

fn render_settings(frame: &mut Frame, theme: &Theme, draft: &str, cursor: usize, area: Rect) {
  let popup = centered(area, 60, 9);
  frame.render_widget(Clear, popup);
  let block = dialog_block(theme, "API Settings");
  let inner = block.inner(popup);
  frame.render_widget(block, popup);

  let field_w = inner.width.saturating_sub(2) as usize;
  let shown = masked(draft);
  let skip = cursor.saturating_sub(field_w.saturating_sub(1));
  let visible: String = shown.chars().skip(skip).take(field_w).collect();

  let lines = vec![
    Line::from(Span::styled("API Key", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(vec![Span::styled("> ", theme.accent), Span::styled(visible, Style::default().fg(theme.fg))]),
    Line::from(""),
    Line::from(Span::styled("An API key is required to access videos. Make sure it is valid and active.", theme.muted)),
  ];
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
  frame.set_cursor_position((inner.x + 2 + (cursor - skip) as u16, inner.y + 1));
}

fn render_download(
  frame: &mut Frame,
  theme: &Theme,
  video: &Video,
  choice: usize,
  pending: Option<Quality>,
  area: Rect,
) {
  let popup = centered(area, 64, 12);
  frame.render_widget(Clear, popup);
  let block = dialog_block(theme, "Download Video");
  let inner = block.inner(popup);
  frame.render_widget(block, popup);

  let inner_w = inner.width as usize;
  let mut lines = vec![
    Line::from(Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(
      format!(
        "Duration: {}   Views: {}   Formats: {}",
        format_duration(video.duration),
        format_views(video.views),
        format_list(&video.formats)
      ),
      theme.muted,
    )),
    Line::from(""),
  ];
  // Tickets are always .mp4 files.
  let container = VideoFormat::Mp4.label();
  for (i, quality) in Quality::ALL.iter().enumerate() {
    let marker = if i == choice { "▶ " } else { "  " };
    let state = if pending == Some(*quality) { "  Downloading…" } else { "" };
    let style = if i == choice {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg)
    };
    lines.push(Line::from(vec![
      Span::styled(format!("{}{:<6}", marker, quality.label()), style),
      Span::styled(format!("  {} • {} • {}{}", container, quality.nominal_size(), quality.nominal_bitrate(), state), theme.muted),
    ]));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled("The download starts after you pick a quality.", theme.muted)));
  frame.render_widget(Paragraph::new(lines), inner);
}

fn render_alert(frame: &mut Frame, theme: &Theme, message: &str, area: Rect) {
  let height = message.lines().count() as u16 + 4;
  let popup = centered(area, 70, height);
  frame.render_widget(Clear, popup);
  let lines: Vec<Line> = message.lines().map(|l| Line::from(Span::styled(l.to_string(), theme.fg))).collect();
  let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(dialog_block(theme, "Notice"));
  frame.render_widget(paragraph, popup);
}
