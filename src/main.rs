mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stormz_day::armor::ArmorKind;
use stormz_day::audio::SoundCue;
use stormz_day::config::GameConfig;
use stormz_day::entities::RunState;
use stormz_day::input::{ControlScheme, InputEvent, InputSnapshot, Key, MouseButton};
use stormz_day::session::{GameSession, RunSummary};
use stormz_day::storage::{GameStorage, Perk, ShopOutcome};
use stormz_day::weapons::WeaponKind;

use display::Viewport;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events.
const HOLD_WINDOW: u64 = 8;

/// Finger id used when the mouse stands in for a touch.
const MOUSE_FINGER: u64 = 0;

#[derive(Parser, Debug)]
#[command(name = "stormz_day", about = "Top-down zombie survival in the terminal")]
struct Cli {
    /// JSON tuning file; defaults are used for anything missing.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Save file (default: $HOME/.stormz_day.json).
    #[arg(long)]
    storage: Option<PathBuf>,
    /// Mobile, Simple, Mixed or Expert.
    #[arg(long, default_value_t = ControlScheme::Simple)]
    control: ControlScheme,
    /// RNG seed for wave spawns (default: from the clock).
    #[arg(long)]
    seed: Option<u64>,
    /// Log file (default: $HOME/.stormz_day.log).
    #[arg(long)]
    log: Option<PathBuf>,
}

fn home_file(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(name)
}

/// The terminal is in raw alternate-screen mode, so logs go to a file.
fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

// ── Input ─────────────────────────────────────────────────────────────────────

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::W),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::A),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::S),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::D),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(' ') => Some(Key::Space),
        _ => None,
    }
}

fn map_button(button: event::MouseButton) -> MouseButton {
    match button {
        event::MouseButton::Left => MouseButton::Left,
        event::MouseButton::Right => MouseButton::Right,
        event::MouseButton::Middle => MouseButton::Middle,
    }
}

/// Translate a terminal mouse event. In the Mobile scheme the left button
/// acts as a single finger.
fn mouse_input(
    mouse: MouseEvent,
    view: &Viewport,
    control: ControlScheme,
    input: &mut InputSnapshot,
    pending: &mut Vec<InputEvent>,
) {
    let position = view.to_world(mouse.column, mouse.row);
    input.pointer = Some(position);
    let touch = control == ControlScheme::Mobile;
    match mouse.kind {
        MouseEventKind::Down(button) => {
            if touch && button == event::MouseButton::Left {
                input.fingers.insert(MOUSE_FINGER, position);
                pending.push(InputEvent::FingerDown {
                    id: MOUSE_FINGER,
                    position,
                });
            } else {
                input.pointer_pressed |= button == event::MouseButton::Left;
                pending.push(InputEvent::MouseDown {
                    button: map_button(button),
                    position,
                });
            }
        }
        MouseEventKind::Drag(_) => {
            if let Some(at) = input.fingers.get_mut(&MOUSE_FINGER) {
                *at = position;
            }
        }
        MouseEventKind::Up(event::MouseButton::Left) => {
            input.pointer_pressed = false;
            if input.fingers.remove(&MOUSE_FINGER).is_some() {
                pending.push(InputEvent::FingerUp { id: MOUSE_FINGER });
            }
        }
        _ => {}
    }
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn describe(outcome: ShopOutcome, item: &str) -> String {
    match outcome {
        ShopOutcome::Bought { cost } => format!("Bought {item} for {cost} tokens."),
        ShopOutcome::Equipped => format!("Equipped {item}."),
        ShopOutcome::Unequipped => format!("Unequipped {item}."),
    }
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    storage: &mut GameStorage,
    storage_path: &Path,
    session: &mut GameSession,
) -> Result<MenuResult> {
    let mut alert: Option<String> = None;
    loop {
        display::render_menu(out, storage, session.control().name(), alert.as_deref())?;

        let ev = rx.recv().context("input thread stopped")?;
        let Event::Key(KeyEvent { code, kind, .. }) = ev else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }
        let outcome = match code {
            KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(MenuResult::Quit),
            KeyCode::Char(c @ '1'..='4') => {
                let weapon = WeaponKind::ALL[(c as u8 - b'1') as usize];
                storage
                    .weapon_interact(weapon)
                    .map(|outcome| describe(outcome, weapon.name()))
            }
            KeyCode::Char(c @ '5'..='8') => {
                let armor = ArmorKind::ALL[(c as u8 - b'5') as usize];
                storage
                    .armor_interact(armor)
                    .map(|outcome| describe(outcome, armor.name()))
            }
            KeyCode::Char('f') | KeyCode::Char('g') => {
                let perk = if code == KeyCode::Char('f') { Perk::Firerate } else { Perk::Damage };
                let weapon = storage.weapon_equipped;
                storage
                    .upgrade_weapon_perk(weapon, perk)
                    .map(|level| format!("{weapon} {perk:?} is now level {level}."))
            }
            KeyCode::Char('v') => match storage.armor_equipped {
                Some(armor) => storage
                    .upgrade_armor_perk(armor, Perk::Vitality)
                    .map(|level| format!("{armor} Vitality is now level {level}.")),
                None => Ok("Equip an armor first.".to_string()),
            },
            KeyCode::Char('c') => {
                let schemes = ControlScheme::ALL;
                let next = schemes
                    .iter()
                    .position(|&s| s == session.control())
                    .map(|i| schemes[(i + 1) % schemes.len()])
                    .unwrap_or_default();
                session.set_control_scheme(next);
                Ok(format!("Control scheme: {next}"))
            }
            _ => continue,
        };
        alert = Some(match outcome {
            Ok(message) => {
                storage
                    .save_to_file(storage_path)
                    .with_context(|| format!("saving {}", storage_path.display()))?;
                message
            }
            Err(err) => err.to_string(),
        });
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program, `false` → back to menu.
///
/// Held keys are tracked by the frame of their last press/repeat and expire
/// after `HOLD_WINDOW` silent frames, or immediately on release where the
/// terminal reports it.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut GameSession,
    storage: &mut GameStorage,
    storage_path: &Path,
    rx: &mpsc::Receiver<Event>,
) -> Result<bool> {
    let (cols, rows) = terminal::size()?;
    let view = Viewport::new(cols, rows, session.config().display.bounds());

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut input = InputSnapshot::default();
    let mut pending: Vec<InputEvent> = Vec::new();
    let mut summary: Option<RunSummary> = None;
    let mut frame: u64 = 0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mut quit = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind,
                    modifiers,
                    ..
                }) => match kind {
                    KeyEventKind::Press => {
                        key_frame.insert(code, frame);
                        match code {
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => quit = true,
                            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                                quit = true
                            }
                            KeyCode::Char('p') | KeyCode::Char('P') => {
                                if session.state() == RunState::Paused {
                                    session.resume();
                                } else {
                                    session.pause();
                                }
                            }
                            KeyCode::Char('r') | KeyCode::Char('R') if summary.is_some() => {
                                return Ok(false);
                            }
                            KeyCode::Char(' ') => pending.push(InputEvent::KeyDown(Key::Space)),
                            _ => {}
                        }
                    }
                    KeyEventKind::Repeat => {
                        key_frame.insert(code, frame);
                    }
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                    }
                },
                Event::Mouse(mouse) => {
                    mouse_input(mouse, &view, session.control(), &mut input, &mut pending);
                }
                _ => {}
            }
        }

        if quit {
            if summary.is_none() {
                end_run(session, storage, storage_path)?;
            }
            return Ok(true);
        }

        // ── Rebuild the held-key snapshot ─────────────────────────────────────
        input.release_all();
        for code in key_frame.keys() {
            if is_held(&key_frame, code, frame) {
                if let Some(key) = map_key(*code) {
                    input.press(key);
                }
            }
        }

        for event in pending.drain(..) {
            session.handle_event(event, &input)?;
        }

        let now = Instant::now();
        let delta = now.duration_since(last).as_secs_f32() * 60.0;
        last = now;
        session.frame(delta, &input)?;

        if session.drain_sounds().any(|cue| cue == SoundCue::Hit) {
            out.write_all(b"\x07")?;
        }

        if summary.is_none() && session.state().is_over() {
            summary = Some(end_run(session, storage, storage_path)?);
        }

        display::render(out, session, &view, summary.as_ref())?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

fn end_run(session: &mut GameSession, storage: &mut GameStorage, path: &Path) -> Result<RunSummary> {
    let summary = session.finish(storage);
    storage
        .save_to_file(path)
        .with_context(|| format!("saving {}", path.display()))?;
    info!(
        score = summary.score,
        wave = summary.wave,
        tokens = summary.tokens_gained,
        victory = summary.victory,
        "run finished"
    );
    Ok(summary)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log.clone().unwrap_or_else(|| home_file(".stormz_day.log"));
    init_tracing(&log_path)?;

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let storage_path = cli.storage.clone().unwrap_or_else(|| home_file(".stormz_day.json"));
    let mut storage = GameStorage::load_from_file(&storage_path);
    let seed = cli.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    let mut session = GameSession::new(config, seed);
    session.set_control_scheme(cli.control);
    info!(seed, control = %cli.control, "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &mut session, &mut storage, &storage_path);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        error!(%err, "exiting with error");
    }
    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    session: &mut GameSession,
    storage: &mut GameStorage,
    storage_path: &Path,
) -> Result<()> {
    loop {
        match show_menu(out, rx, storage, storage_path, session)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                session.start(storage).context("starting run")?;
                let quit = game_loop(out, session, storage, storage_path, rx)?;
                if quit {
                    break;
                }
            }
        }
    }
    Ok(())
}
