use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: &[Theme] = &[
  Theme {
    name: "Violet Night",
    bg: Color::Rgb(15, 23, 42),
    fg: Color::Rgb(226, 232, 240),
    accent: Color::Rgb(168, 85, 247),
    muted: Color::Rgb(148, 163, 184),
    border: Color::Rgb(51, 65, 85),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(88, 28, 135),
    stripe_bg: Color::Rgb(22, 31, 52),
    status: Color::Rgb(96, 165, 250),
    error: Color::Rgb(248, 113, 113),
    key_fg: Color::Rgb(15, 23, 42),
    key_bg: Color::Rgb(168, 85, 247),
  },
  Theme {
    name: "Slate",
    bg: Color::Rgb(30, 30, 30),
    fg: Color::Rgb(212, 212, 212),
    accent: Color::Rgb(234, 179, 8),
    muted: Color::Rgb(128, 128, 128),
    border: Color::Rgb(68, 68, 68),
    highlight_fg: Color::Rgb(30, 30, 30),
    highlight_bg: Color::Rgb(234, 179, 8),
    stripe_bg: Color::Rgb(38, 38, 38),
    status: Color::Rgb(52, 211, 153),
    error: Color::Rgb(239, 68, 68),
    key_fg: Color::Rgb(30, 30, 30),
    key_bg: Color::Rgb(160, 160, 160),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 243),
    fg: Color::Rgb(40, 40, 40),
    accent: Color::Rgb(99, 102, 241),
    muted: Color::Rgb(120, 113, 108),
    border: Color::Rgb(214, 211, 209),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(99, 102, 241),
    stripe_bg: Color::Rgb(241, 238, 231),
    status: Color::Rgb(13, 148, 136),
    error: Color::Rgb(220, 38, 38),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(87, 83, 78),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::White,
    accent: Color::Magenta,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Magenta,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];
