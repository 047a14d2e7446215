//! TUI rendering logic

use crate::tui::app::App;
use keyhud_core::{HoldPhase, OverlayRow, OverlaySnapshot, Size, TickScheduler, PROGRESS_MAX};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

/// Cells between the key cap and the label
const GAP: u16 = 1;

/// Render the HUD, or a status hint while the host keeps it hidden
pub fn render<S: TickScheduler>(frame: &mut Frame, app: &App<S>) {
    match app.hud.snapshot() {
        Some(snapshot) => render_overlay(frame, &snapshot),
        None => render_waiting(frame, app),
    }
}

fn render_waiting<S: TickScheduler>(frame: &mut Frame, app: &App<S>) {
    let area = frame.area();
    if area.height == 0 {
        return;
    }
    let line = Line::from(vec![
        Span::styled("keyhud", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " waiting for host on {}  (Ctrl+C quits)",
            app.socket_path.display()
        )),
    ])
    .style(Style::default().fg(Color::DarkGray));
    let bottom = Rect::new(area.x, area.bottom() - 1, area.width, 1);
    frame.render_widget(Paragraph::new(line), bottom);
}

/// Draw the prompt box at its resolved position
pub fn render_overlay(frame: &mut Frame, snapshot: &OverlaySnapshot) {
    if snapshot.rows.is_empty() {
        return;
    }
    let area = overlay_rect(snapshot, frame.area());
    if area.is_empty() {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let cap_width = column_width(snapshot, cap_text);
    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints(snapshot.rows.iter().map(|_| Constraint::Length(1)))
        .split(inner);

    for (row, line) in snapshot.rows.iter().zip(lines.iter()) {
        render_row(frame, row, *line, cap_width);
    }
}

/// Screen rectangle of the prompt box inside `viewport`
pub fn overlay_rect(snapshot: &OverlaySnapshot, viewport: Rect) -> Rect {
    let size = overlay_size(snapshot);
    let width = size.width.min(viewport.width);
    let height = size.height.min(viewport.height);
    let origin = snapshot.placement.origin(
        Size::new(viewport.width, viewport.height),
        Size::new(width, height),
    );
    Rect::new(viewport.x + origin.x, viewport.y + origin.y, width, height)
}

/// Natural size of the prompt box, borders included
pub fn overlay_size(snapshot: &OverlaySnapshot) -> Size {
    let cap_width = column_width(snapshot, cap_text);
    let label_width = column_width(snapshot, label_text);
    let rows = u16::try_from(snapshot.rows.len()).unwrap_or(u16::MAX);
    Size::new(
        (cap_width + GAP + label_width).saturating_add(2),
        rows.saturating_add(2),
    )
}

fn render_row(frame: &mut Frame, row: &OverlayRow, area: Rect, cap_width: u16) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(cap_width),
            Constraint::Length(GAP),
            Constraint::Min(1),
        ])
        .split(area);

    let cap_style = if row.pressed {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(cap_text(row))
            .style(cap_style)
            .centered(),
        chunks[0],
    );

    let label_area = chunks[2];
    frame.render_widget(
        Paragraph::new(label_text(row)).style(Style::default().fg(Color::White)),
        label_area,
    );

    let filled = fill_width(row, label_area.width);
    if filled > 0 {
        let fill_color = match row.phase {
            HoldPhase::Complete => Color::Green,
            _ => Color::Blue,
        };
        let fill = Rect::new(label_area.x, label_area.y, filled, label_area.height);
        frame
            .buffer_mut()
            .set_style(fill, Style::default().bg(fill_color));
    }
}

/// Label cells covered by the progress fill
pub fn fill_width(row: &OverlayRow, width: u16) -> u16 {
    if !row.pressed && row.progress == 0 {
        return 0;
    }
    match row.phase {
        HoldPhase::Instant => width,
        _ => {
            let cells = u32::from(width) * u32::from(row.progress) / u32::from(PROGRESS_MAX);
            u16::try_from(cells).unwrap_or(width)
        }
    }
}

fn cap_text(row: &OverlayRow) -> String {
    format!(" {} ", row.key.cap_label())
}

fn label_text(row: &OverlayRow) -> String {
    match icon_glyph(&row.icon) {
        Some(glyph) => format!(" {} {} ", glyph, row.label),
        None => format!(" {} ", row.label),
    }
}

fn column_width(snapshot: &OverlaySnapshot, text: fn(&OverlayRow) -> String) -> u16 {
    let widest = snapshot
        .rows
        .iter()
        .map(|row| Span::raw(text(row)).width())
        .max()
        .unwrap_or(0);
    u16::try_from(widest).unwrap_or(u16::MAX)
}

/// Terminal stand-in for an icon class such as `"fa fa-bars"` or `"box"`
pub fn icon_glyph(icon: &str) -> Option<&'static str> {
    let name = icon.split_whitespace().last()?;
    let name = name.strip_prefix("fa-").unwrap_or(name);
    let glyph = match name {
        "bars" | "list" | "menu" => "≡",
        "box" | "box-open" | "cube" => "■",
        "hand" | "hand-pointer" => "☛",
        "play" | "caret-right" => "▶",
        "xmark" | "times" | "close" => "✕",
        "check" => "✓",
        "gear" | "cog" => "⚙",
        "door-open" | "door-closed" | "house" | "home" => "⌂",
        "arrow-up" => "↑",
        "arrow-down" => "↓",
        "arrow-left" => "←",
        "arrow-right" => "→",
        "star" => "★",
        "heart" => "♥",
        "" | "fa" => return None,
        _ => "•",
    };
    Some(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhud_core::{
        compose, AnchorPreset, Binding, CompletionPolicy, HoldProgressEngine, KeyId,
        KeyPressTracker, ManualScheduler, PlacementDescriptor,
    };
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn snapshot(position: AnchorPreset, pressed: &[&str]) -> OverlaySnapshot {
        let bindings = vec![
            Binding::new("F1", "Open Menu").with_hold_ms(1000),
            Binding::new("F2", "Inventory"),
        ];
        let mut tracker = KeyPressTracker::new();
        let mut engine = HoldProgressEngine::new(ManualScheduler::new(), CompletionPolicy::Hold);
        for key in pressed {
            let key = KeyId::new(key);
            tracker.press(&key);
            if let Some(binding) = bindings.iter().find(|b| b.key == key) {
                engine.press(binding);
            }
        }
        compose(
            &bindings,
            &tracker,
            &engine,
            &PlacementDescriptor::Preset(position),
        )
    }

    #[test]
    fn test_overlay_size() {
        // " F1 " + gap + " Inventory " / " Open Menu ", plus borders
        let snap = snapshot(AnchorPreset::MiddleBottom, &[]);
        assert_eq!(overlay_size(&snap), Size::new(4 + 1 + 11 + 2, 4));
    }

    #[test]
    fn test_overlay_rect_follows_preset() {
        let viewport = Rect::new(0, 0, 80, 24);
        let bottom = overlay_rect(&snapshot(AnchorPreset::MiddleBottom, &[]), viewport);
        assert_eq!(bottom, Rect::new(31, 20, 18, 4));

        let top_left = overlay_rect(&snapshot(AnchorPreset::TopLeft, &[]), viewport);
        assert_eq!((top_left.x, top_left.y), (0, 0));

        let right = overlay_rect(&snapshot(AnchorPreset::MiddleRight, &[]), viewport);
        assert_eq!((right.x, right.y), (62, 10));
    }

    #[test]
    fn test_overlay_rect_clamped_to_small_viewport() {
        let rect = overlay_rect(
            &snapshot(AnchorPreset::MiddleBottom, &[]),
            Rect::new(0, 0, 10, 3),
        );
        assert_eq!(rect, Rect::new(0, 0, 10, 3));
    }

    #[test]
    fn test_fill_width() {
        let snap = snapshot(AnchorPreset::MiddleBottom, &["F1", "F2"]);
        let mut hold = snap.rows[0].clone();
        assert_eq!(fill_width(&hold, 20), 0);
        hold.progress = 50;
        assert_eq!(fill_width(&hold, 20), 10);
        hold.progress = PROGRESS_MAX;
        assert_eq!(fill_width(&hold, 20), 20);

        // Instant bindings light up fully while pressed
        assert_eq!(snap.rows[1].phase, HoldPhase::Instant);
        assert_eq!(fill_width(&snap.rows[1], 20), 20);
    }

    #[test]
    fn test_icon_glyph() {
        assert_eq!(icon_glyph("fa fa-bars"), Some("≡"));
        assert_eq!(icon_glyph("box"), Some("■"));
        assert_eq!(icon_glyph("fa fa-unknown-thing"), Some("•"));
        assert_eq!(icon_glyph(""), None);
    }

    #[test]
    fn test_render_draws_key_caps() {
        let snap = snapshot(AnchorPreset::TopLeft, &["F1"]);
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|frame| render_overlay(frame, &snap))
            .unwrap();

        let buffer = terminal.backend().buffer();
        // Inside the border: " F1 " starts at column 1 of row 1
        assert_eq!(buffer[(2, 1)].symbol(), "F");
        assert_eq!(buffer[(3, 1)].symbol(), "1");
        assert_eq!(buffer[(2, 1)].bg, Color::Cyan);
        assert_eq!(buffer[(3, 2)].symbol(), "2");
        assert_eq!(buffer[(3, 2)].bg, Color::DarkGray);
    }
}
