/// Rendering layer: all terminal output lives here.
///
/// The simulation works in display pixels; the terminal shows the same
/// area scaled down to character cells. Nothing here mutates game state.
use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use glam::Vec2;

use stormz_day::entities::{healthbar_width, RunState, SpriteId, Surface};
use stormz_day::geometry::Rect;
use stormz_day::session::{GameSession, RunSummary};
use stormz_day::storage::GameStorage;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_WAVE: Color = Color::Cyan;
const C_ARMOR: Color = Color::Blue;
const C_HINT: Color = Color::DarkGrey;

/// Width of the HUD bars, in cells.
const BAR_CELLS: f32 = 15.0;

fn sprite_glyph(sprite: SpriteId) -> (&'static str, Color) {
    match sprite {
        SpriteId::Player => ("@", Color::White),
        SpriteId::Walker => ("z", Color::Green),
        SpriteId::Runner => ("r", Color::Yellow),
        SpriteId::Brute => ("B", Color::Red),
        SpriteId::Spitter => ("s", Color::Magenta),
        SpriteId::Bullet => ("•", Color::Cyan),
        SpriteId::Spit => ("*", Color::Magenta),
    }
}

/// Bar colour for a health fraction, greener when healthier.
pub fn healthbar_color(fraction: f32) -> Color {
    match fraction {
        f if f > 0.8 => Color::DarkGreen,
        f if f > 0.6 => Color::Green,
        f if f > 0.4 => Color::Yellow,
        f if f > 0.2 => Color::DarkYellow,
        _ => Color::Red,
    }
}

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Maps display pixels to the play area inside the border and back.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub world: Rect,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, world: Rect) -> Self {
        Self { cols, rows, world }
    }

    /// Play area: inside the border, between the HUD row and the hint row.
    fn inner(&self) -> (u16, u16, u16, u16) {
        (1, 2, self.cols.saturating_sub(2).max(1), self.rows.saturating_sub(4).max(1))
    }

    pub fn to_cell(&self, p: Vec2) -> Option<(u16, u16)> {
        if !self.world.contains_point(p) {
            return None;
        }
        let (x0, y0, w, h) = self.inner();
        let fx = (p.x - self.world.x as f32) / self.world.w.max(1) as f32;
        let fy = (p.y - self.world.y as f32) / self.world.h.max(1) as f32;
        let col = x0 + ((fx * w as f32) as u16).min(w - 1);
        let row = y0 + ((fy * h as f32) as u16).min(h - 1);
        Some((col, row))
    }

    /// Centre of the pixel area covered by a cell.
    pub fn to_world(&self, col: u16, row: u16) -> Vec2 {
        let (x0, y0, w, h) = self.inner();
        let fx = (col.saturating_sub(x0) as f32 + 0.5) / w as f32;
        let fy = (row.saturating_sub(y0) as f32 + 0.5) / h as f32;
        Vec2::new(
            self.world.x as f32 + fx.clamp(0.0, 1.0) * self.world.w as f32,
            self.world.y as f32 + fy.clamp(0.0, 1.0) * self.world.h as f32,
        )
    }
}

/// Collects blits so they can be queued with error propagation afterwards.
#[derive(Default)]
struct SpriteList(Vec<(SpriteId, Rect)>);

impl Surface for SpriteList {
    fn blit(&mut self, sprite: SpriteId, rect: Rect) {
        self.0.push((sprite, rect));
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    session: &GameSession,
    view: &Viewport,
    summary: Option<&RunSummary>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_hud(out, session, view)?;

    let mut sprites = SpriteList::default();
    session.draw(&mut sprites);
    for (sprite, rect) in &sprites.0 {
        if let Some((col, row)) = view.to_cell(rect.center()) {
            let (glyph, color) = sprite_glyph(*sprite);
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(style::SetForegroundColor(color))?;
            out.queue(Print(glyph))?;
        }
    }
    draw_joystick(out, session, view)?;
    draw_controls_hint(out, view)?;

    if session.state() == RunState::Paused {
        draw_banner(out, view, &[("PAUSED", Color::Yellow), ("P - Resume", Color::White)])?;
    }
    if let Some(summary) = summary {
        draw_game_over(out, view, summary)?;
    }

    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.cols as usize;
    let h = view.rows;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn bar(fraction: f32) -> String {
    let filled = healthbar_width(fraction, BAR_CELLS).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS as usize - filled))
}

fn draw_hud<W: Write>(out: &mut W, session: &GameSession, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>6}", session.score())))?;

    out.queue(style::SetForegroundColor(C_HUD_WAVE))?;
    out.queue(Print(format!("  Wave {}", session.wave_count())))?;

    let Some(player) = session.world.player() else {
        return Ok(());
    };

    let fraction = player.health_fraction();
    let hp_text = format!("HP {}", bar(fraction));
    let mut col = view.cols.saturating_sub(hp_text.chars().count() as u16 + 1);
    if let Some(armor) = player.armor_fraction() {
        let armor_text = format!("AR {} ", bar(armor));
        col = col.saturating_sub(armor_text.chars().count() as u16);
        out.queue(cursor::MoveTo(col, 0))?;
        out.queue(style::SetForegroundColor(C_ARMOR))?;
        out.queue(Print(&armor_text))?;
        col += armor_text.chars().count() as u16;
    }
    out.queue(cursor::MoveTo(col, 0))?;
    out.queue(style::SetForegroundColor(healthbar_color(fraction)))?;
    out.queue(Print(&hp_text))?;

    Ok(())
}

fn draw_joystick<W: Write>(out: &mut W, session: &GameSession, view: &Viewport) -> std::io::Result<()> {
    let Some(joystick) = session.world.player().and_then(|p| p.joystick.as_ref()) else {
        return Ok(());
    };
    out.queue(style::SetForegroundColor(C_HINT))?;
    if let Some((col, row)) = view.to_cell(joystick.start()) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print("○"))?;
    }
    if let Some((col, row)) = view.to_cell(joystick.pos) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print("●"))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(
        "WASD : Move   ARROWS + SPACE / CLICK : Shoot   P : Pause   Q : Quit",
    ))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_banner<W: Write>(out: &mut W, view: &Viewport, lines: &[(&str, Color)]) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}

fn draw_game_over<W: Write>(out: &mut W, view: &Viewport, summary: &RunSummary) -> std::io::Result<()> {
    let (title, color) = if summary.victory {
        ("║    YOU  SURVIVED    ║", Color::Green)
    } else {
        ("║      GAME  OVER     ║", Color::Red)
    };
    let score_line = format!("Score: {}   Wave: {}", summary.score, summary.wave);
    let token_line = format!("Tokens gained: {}", summary.tokens_gained);
    let lines: &[(&str, Color)] = &[
        ("╔═════════════════════╗", color),
        (title, color),
        ("╚═════════════════════╝", color),
        (score_line.as_str(), Color::Yellow),
        (token_line.as_str(), Color::Yellow),
        ("R - Back to menu  Q - Quit", Color::White),
    ];
    draw_banner(out, view, lines)
}

// ── Menu ──────────────────────────────────────────────────────────────────────

pub fn render_menu<W: Write>(
    out: &mut W,
    storage: &GameStorage,
    control: &str,
    alert: Option<&str>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let top = (height / 2).saturating_sub(9);
    let left = cx.saturating_sub(24);

    let title = "☣  STORMZ  DAY  ☣";
    out.queue(cursor::MoveTo(cx.saturating_sub(title.chars().count() as u16 / 2), top))?;
    out.queue(style::SetForegroundColor(Color::Green))?;
    out.queue(Print(title))?;

    let stats = format!(
        "Best Score: {}   Highest Wave: {}   Tokens: {}",
        storage.highscore, storage.highest_wave, storage.tokens
    );
    out.queue(cursor::MoveTo(cx.saturating_sub(stats.chars().count() as u16 / 2), top + 1))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(&stats))?;

    let armor = storage
        .armor_equipped
        .map(|kind| kind.name())
        .unwrap_or("None");
    let lines = [
        format!("Weapon: {}   Armor: {}   Controls: {}", storage.weapon_equipped, armor, control),
        String::new(),
        "[ENTER] Start run".to_string(),
        "[1-4]   Buy/equip Pistol, Rifle, Shotgun, Piercer".to_string(),
        "[5-8]   Buy/equip Light, Balanced, Heavy, Adaptative armor".to_string(),
        "[F] [G] Upgrade weapon Firerate / Damage".to_string(),
        "[V]     Upgrade armor Vitality".to_string(),
        "[C]     Cycle control scheme".to_string(),
        "[Q]     Quit".to_string(),
    ];
    out.queue(style::SetForegroundColor(Color::White))?;
    for (i, line) in lines.iter().enumerate() {
        out.queue(cursor::MoveTo(left, top + 3 + i as u16))?;
        out.queue(Print(line))?;
    }

    if let Some(alert) = alert {
        out.queue(cursor::MoveTo(cx.saturating_sub(alert.chars().count() as u16 / 2), top + 14))?;
        out.queue(style::SetForegroundColor(Color::Magenta))?;
        out.queue(Print(alert))?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}
