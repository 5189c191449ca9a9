// ============================================
// src/main.rs (メインファイル)
// ============================================

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

// 国データ
mod countries;
use countries::Catalog;

// 設定
mod config;
use config::{ConfigOverrides, Mode, SuggestionPolicy};

mod error;
use error::AppError;

// クイズ進行
mod quiz;
use quiz::{Phase, QuizSession};

mod suggest;
mod timer;

use clap::{ArgAction, Parser};
use console::style;
use dialoguer::{Select, theme::ColorfulTheme};
use log::{error, info};

use crossterm::{
    ExecutableCommand,
    cursor::{Hide, Show},
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

// --------------------------------------------------
// コマンドライン引数
// --------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "flagwiz", version, about = "FLAG WiZ. A world flag quiz for the terminal")]
struct Cli {
    /// ゲームモード (省略すると起動時に選ぶ)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// 設定ファイル (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 国データファイル (JSON)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// コード・別名も正解にする
    #[arg(long, action = ArgAction::Set)]
    lenient: Option<bool>,

    /// 1つの国旗に答えられる回数
    #[arg(long, conflicts_with = "unlimited")]
    max_attempts: Option<u32>,

    /// 回数無制限
    #[arg(long)]
    unlimited: bool,

    /// 候補の出し方 (前方一致 / 部分一致)
    #[arg(long, value_enum)]
    suggestions: Option<SuggestionPolicy>,

    /// 前方一致の候補の最大数
    #[arg(long)]
    max_suggestions: Option<usize>,

    /// 候補の端で反対側へ回り込む
    #[arg(long, action = ArgAction::Set)]
    wrap: Option<bool>,

    /// 結果表示の時間 (ミリ秒、0 で即座に次へ)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// 空欄のまま Enter で判定する
    #[arg(long, action = ArgAction::Set)]
    allow_empty_submit: Option<bool>,

    /// 乱数のシード (出題順を固定する)
    #[arg(long)]
    seed: Option<u64>,

    /// ログの詳細度 (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            lenient_matching: self.lenient,
            // 0 は無制限
            max_attempts: if self.unlimited { Some(0) } else { self.max_attempts },
            suggestion_policy: self.suggestions,
            max_suggestions: self.max_suggestions,
            wrap_suggestion_navigation: self.wrap,
            auto_advance_delay_ms: self.delay_ms,
            allow_empty_submit: self.allow_empty_submit,
            seed: self.seed,
            image_dir: None,
            image_ext: None,
        }
    }
}

// --------------------------------------------------
// メイン関数
// --------------------------------------------------

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = pick_mode(cli.mode)?;

    // プリセット -> 設定ファイル -> CLI
    let file_overrides = match cli.config.clone().or_else(config::default_config_path) {
        Some(path) => {
            info!("loading config from {}", path.display());
            Some(ConfigOverrides::load(&path)?)
        }
        None => None,
    };
    let quiz_config = config::resolve(mode, file_overrides.as_ref(), &cli.overrides())?;
    info!("mode: {:?}, config: {:?}", mode, quiz_config);

    let catalog = match &cli.catalog {
        Some(path) => {
            info!("loading catalog from {}", path.display());
            Catalog::from_json_file(path)?
        }
        None => Catalog::builtin(),
    };

    let mut session = QuizSession::new(&catalog, quiz_config)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut session);
    // 予約中の遷移を取り消してから画面を戻す
    session.shutdown();
    restore_terminal(&mut terminal)?;
    result?;

    print_summary(&session)?;
    Ok(())
}

/// ログはファイルへ (画面は TUI が使うため)
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    let path = config::log_file_path();
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            // 画面を壊さないよう、書けないときはログを捨てる
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

/// モード選択 (引数になければメニューで選ぶ)
fn pick_mode(mode: Option<Mode>) -> Result<Mode, AppError> {
    if let Some(mode) = mode {
        return Ok(mode);
    }
    if !console::Term::stdout().is_term() {
        return Ok(Mode::Lives);
    }

    let modes = [Mode::Lives, Mode::Classic];
    let labels: Vec<&str> = modes.iter().map(|m| m.label()).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("FLAG WiZ - choose a mode")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(modes[index])
}

fn setup_terminal() -> io::Result<Terminal<impl Backend>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?; // 代替スクリーンを使用
    stdout().execute(Hide)?; // カーソルを非表示
    stdout().execute(EnableBracketedPaste)?; // 貼り付けをまとめて受け取る
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal(_terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
    stdout().execute(DisableBracketedPaste)?;
    stdout().execute(Show)?; // カーソルを再表示
    stdout().execute(LeaveAlternateScreen)?; // 代替スクリーンを終了
    disable_raw_mode()?;
    Ok(())
}

fn run_app(terminal: &mut Terminal<impl Backend>, session: &mut QuizSession) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, session))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Paste(text) => {
                    session.set_input(&pasted_input(session.raw_input(), &text));
                }
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    let result = match key_action(key.code, key.modifiers) {
                        KeyAction::Quit => break,
                        KeyAction::Reveal => Some(session.reveal()),
                        KeyAction::Enter => Some(session.enter()),
                        KeyAction::SelectNext => {
                            session.select_next();
                            None
                        }
                        KeyAction::SelectPrev => {
                            session.select_prev();
                            None
                        }
                        KeyAction::Backspace => {
                            session.backspace();
                            None
                        }
                        KeyAction::Input(c) => {
                            session.input_char(c);
                            None
                        }
                        KeyAction::Nothing => None,
                    };
                    if let Some(Err(err)) = result {
                        error!("transition aborted on {:?}: {}", session.current_code(), err);
                    }
                }
                _ => {}
            }
        }

        // 自動遷移のタイマーを進める
        let now = Instant::now();
        if let Err(err) = session.tick(now - last_tick) {
            error!("deferred advance aborted: {}", err);
        }
        last_tick = now;
    }

    Ok(())
}

/// キー入力に対応する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Reveal,
    Enter,
    SelectNext,
    SelectPrev,
    Backspace,
    Input(char),
    Nothing,
}

fn key_action(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if ctrl => KeyAction::Quit,
        KeyCode::Char('r') if ctrl => KeyAction::Reveal,
        KeyCode::Tab => KeyAction::Reveal,
        KeyCode::Enter => KeyAction::Enter,
        KeyCode::Down => KeyAction::SelectNext,
        KeyCode::Up => KeyAction::SelectPrev,
        KeyCode::Backspace => KeyAction::Backspace,
        // Ctrl との組み合わせは文字として入れない
        KeyCode::Char(c) if !ctrl => KeyAction::Input(c),
        _ => KeyAction::Nothing,
    }
}

/// 貼り付けた文字列を入力欄に足す (改行・タブなどの制御文字は捨てる)
fn pasted_input(current: &str, pasted: &str) -> String {
    let mut input = current.to_string();
    input.extend(pasted.chars().filter(|c| !c.is_control()));
    input
}

/// 終了後のリザルト表示
fn print_summary(session: &QuizSession) -> io::Result<()> {
    let term = console::Term::stdout();
    let (seen, total) = session.progress();
    term.write_line(&format!("{}", style("FLAG WiZ").bold().magenta()))?;
    term.write_line(&format!(
        "Score: {}  Correct: {}  Wrong: {}  Rounds: {}",
        style(session.score()).bold().yellow(),
        style(session.correct_count()).green(),
        style(session.wrong_count()).red(),
        session.total_rounds(),
    ))?;
    term.write_line(&format!("Flags seen this cycle: {} / {}", seen, total))?;
    Ok(())
}

// --------------------------------------------------
// UI描画
// --------------------------------------------------

fn ui(f: &mut Frame, session: &QuizSession) {
    let size = f.area();
    // 枠線を描画
    let block = Block::default().borders(Borders::ALL).title("Flag Wiz !");
    let inner_area = block.inner(size);
    f.render_widget(block, size);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // [0] ステータスバー (スコア, ライフ)
            Constraint::Length(1), // [1] 進捗ゲージ
            Constraint::Length(1), // [2] 空白
            Constraint::Length(1), // [3] 国旗
            Constraint::Length(1), // [4] 空白
            Constraint::Length(3), // [5] 入力欄
            Constraint::Length(1), // [6] メッセージ
            Constraint::Min(1),    // [7] 候補
            Constraint::Length(1), // [8] 操作説明
        ])
        .split(inner_area);

    // 0. ステータスバー
    let lives = match (session.attempts_left(), session.max_attempts()) {
        (Some(left), Some(max)) => format!(
            "{}{}",
            "♥".repeat(left as usize),
            "♡".repeat(max.saturating_sub(left) as usize)
        ),
        _ => "∞".to_string(),
    };
    let status = Line::from(vec![
        Span::styled(format!("Score: {}", session.score()), Style::default().fg(Color::Yellow)),
        Span::raw(format!(
            "  Correct: {}  Wrong: {}  Rounds: {}  ",
            session.correct_count(),
            session.wrong_count(),
            session.total_rounds()
        )),
        Span::styled(lives, Style::default().fg(Color::Red)),
    ]);
    f.render_widget(Paragraph::new(status), chunks[0]);

    // 1. 進捗ゲージ
    let (seen, total) = session.progress();
    let ratio = if total > 0 {
        (seen as f64 / total as f64).min(1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::NONE))
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .ratio(ratio)
        .label(format!("Flags {} / {}", seen, total));
    f.render_widget(gauge, chunks[1]);

    // 3. 国旗
    f.render_widget(
        Paragraph::new(session.flag_emoji())
            .style(Style::default().fg(Color::White).bold())
            .centered(),
        chunks[3],
    );

    // 5. 入力欄
    let input = Paragraph::new(Line::from(vec![
        Span::raw(session.raw_input()),
        Span::styled(" ", Style::default().bg(Color::White)), // カーソル代わり
    ]))
    .block(Block::default().borders(Borders::ALL).title("Country"));
    f.render_widget(input, chunks[5]);

    // 6. メッセージ
    if let Some(message) = session.message() {
        let color = if message.starts_with(quiz::CORRECT_MESSAGE) {
            Color::Green
        } else if message.starts_with("Try again") {
            Color::Yellow
        } else {
            Color::Cyan
        };
        let mut text = message.to_string();
        if let Some((remaining, _)) = session.advance_countdown() {
            text.push_str(&format!("  (next flag in {:.1}s)", remaining.as_secs_f64()));
        }
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(color).bold()),
            chunks[6],
        );
    }

    // 7. 候補一覧 (選択中は反転)
    let lines: Vec<Line> = session
        .suggestions()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if session.selected_suggestion() == Some(i) {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(s.label.as_str(), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[7]);

    // 8. 操作説明
    let help = match session.phase() {
        Phase::AwaitingInput => "Enter: answer  ↑↓: choose  Tab: reveal (-1)  Esc: quit",
        Phase::Resolved(_) => "Enter: next flag  Esc: quit",
    };
    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(Color::DarkGray)),
        chunks[8],
    );
}
