// ============================================
// src/quiz.rs
// クイズ進行 (解答判定とラウンド進行の状態機械)
// ============================================

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::config::QuizConfig;
use crate::countries::{self, Catalog, CountryEntry, MatchMode};
use crate::error::{CatalogError, QuizError};
use crate::suggest::{self, Suggestion};
use crate::timer::{TaskId, Timer};

pub const CORRECT_MESSAGE: &str = "Correct!";
pub const RESTART_MESSAGE: &str = "All flags seen, restarting!";

/// タイマーで遅延実行する処理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    AdvanceRound,
}

/// 1回の操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    /// 不正解、同じ国旗で再挑戦 (None は回数無制限)
    IncorrectRetry { attempts_left: Option<u32> },
    /// 不正解で回数を使い切った
    IncorrectExhausted,
    Revealed,
    /// 何も起きなかった (空入力、結果表示中の操作など)
    Ignored,
}

/// 画面の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingInput,
    /// 結果表示中 (次の国旗への自動遷移待ち)
    Resolved(Outcome),
}

/// クイズ1セッションの状態を管理する
pub struct QuizSession<'a> {
    catalog: &'a Catalog, // 国データへの参照
    config: QuizConfig,
    match_mode: MatchMode,
    rng: StdRng,

    /// 表示中の国旗のコード
    current_code: String,
    /// このサイクルで出題済みのコード
    used_codes: HashSet<String>,
    /// 残り回答回数 (None は無制限)
    attempts_left: Option<u32>,

    score: u32,
    correct_count: u32,
    wrong_count: u32,
    total_rounds: u32,

    raw_input: String,
    suggestions: Vec<Suggestion>,
    selected_suggestion: Option<usize>,
    message: Option<String>,

    phase: Phase,
    timer: Timer<Deferred>,
    /// 予約中の自動遷移
    pending_advance: Option<TaskId>,
}

impl<'a> QuizSession<'a> {
    /// セッションを作り、最初の国旗をランダムに選ぶ
    pub fn new(catalog: &'a Catalog, config: QuizConfig) -> Result<Self, QuizError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut session = Self {
            catalog,
            match_mode: MatchMode::from_lenient(config.lenient_matching),
            attempts_left: config.max_attempts,
            config,
            rng,
            current_code: String::new(),
            used_codes: HashSet::new(),
            score: 0,
            correct_count: 0,
            wrong_count: 0,
            total_rounds: 0,
            raw_input: String::new(),
            suggestions: Vec::new(),
            selected_suggestion: None,
            message: None,
            phase: Phase::AwaitingInput,
            timer: Timer::new(),
            pending_advance: None,
        };
        session.current_code = session.draw_next_code()?;
        debug!(
            "first flag: {} ({})",
            session.current_code,
            session.flag_image_path()
        );
        Ok(session)
    }

    // --------------------------------------------------
    // 入力欄の操作
    // --------------------------------------------------

    /// 1文字入力
    pub fn input_char(&mut self, c: char) {
        if self.is_resolved() {
            return;
        }
        self.raw_input.push(c);
        self.input_changed();
    }

    pub fn backspace(&mut self) {
        if self.is_resolved() {
            return;
        }
        self.raw_input.pop();
        self.input_changed();
    }

    /// 入力欄の内容を丸ごと置き換える
    pub fn set_input(&mut self, text: &str) {
        if self.is_resolved() {
            return;
        }
        self.raw_input = text.to_string();
        self.input_changed();
    }

    fn input_changed(&mut self) {
        self.selected_suggestion = None;
        self.refresh_suggestions();
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = suggest::suggest(
            self.catalog,
            &self.raw_input,
            self.config.suggestion_policy,
            self.config.max_suggestions,
            self.match_mode,
        );
    }

    // --------------------------------------------------
    // 候補のキー操作
    // --------------------------------------------------

    /// ArrowDown
    pub fn select_next(&mut self) {
        let len = self.suggestions.len();
        if len == 0 {
            return;
        }
        self.selected_suggestion = Some(match self.selected_suggestion {
            None => 0,
            Some(i) if i + 1 < len => i + 1,
            Some(_) if self.config.wrap_suggestion_navigation => 0,
            Some(_) => len - 1,
        });
    }

    /// ArrowUp
    pub fn select_prev(&mut self) {
        let len = self.suggestions.len();
        if len == 0 {
            return;
        }
        let wrap = self.config.wrap_suggestion_navigation;
        self.selected_suggestion = Some(match self.selected_suggestion {
            None if wrap => len - 1,
            None => 0,
            Some(i) if i > 0 => (i - 1).min(len - 1),
            Some(_) if wrap => len - 1,
            Some(_) => 0,
        });
    }

    /// Enter: 候補を選択中ならそれを、そうでなければ入力欄を送信する
    pub fn enter(&mut self) -> Result<Outcome, QuizError> {
        match self.selected_suggestion {
            Some(i) if !self.is_resolved() && i < self.suggestions.len() => {
                self.pick_suggestion(i)
            }
            _ => self.submit(),
        }
    }

    // --------------------------------------------------
    // 解答
    // --------------------------------------------------

    /// 入力欄の内容で解答する
    ///
    /// 結果表示中に呼ぶと待ち時間を飛ばして次の国旗へ進む。
    pub fn submit(&mut self) -> Result<Outcome, QuizError> {
        if self.is_resolved() {
            self.advance_round(true)?;
            return Ok(Outcome::Ignored);
        }
        if self.raw_input.trim().is_empty() && !self.config.allow_empty_submit {
            return Ok(Outcome::Ignored);
        }
        self.evaluate()
    }

    /// 候補を選んで解答する (判定できれば正誤にかかわらず候補は消える)
    pub fn pick_suggestion(&mut self, index: usize) -> Result<Outcome, QuizError> {
        if self.is_resolved() {
            return Ok(Outcome::Ignored);
        }
        let Some(answer) = self.suggestions.get(index).map(|s| s.answer.clone()) else {
            return Ok(Outcome::Ignored);
        };
        let previous = std::mem::replace(&mut self.raw_input, answer);

        let result = self.evaluate();
        if result.is_err() {
            self.raw_input = previous;
            return result;
        }
        self.suggestions.clear();
        self.selected_suggestion = None;
        result
    }

    /// 答えを見る (スコア -1、0 未満にはならない)
    pub fn reveal(&mut self) -> Result<Outcome, QuizError> {
        if self.is_resolved() {
            return Ok(Outcome::Ignored);
        }
        let entry = self.current_entry()?;

        self.message = Some(format!(
            "This is {} ({})",
            entry.name,
            entry.code.to_uppercase()
        ));
        self.score = self.score.saturating_sub(1);
        self.wrong_count += 1;
        self.total_rounds += 1;
        info!("revealed {}", entry.code);

        self.finish_round(Outcome::Revealed)
    }

    /// 判定本体
    fn evaluate(&mut self) -> Result<Outcome, QuizError> {
        let entry = self.current_entry()?;
        let correct = self
            .catalog
            .matches(&entry.code, &self.raw_input, self.match_mode)?;

        if correct {
            self.score += 1;
            self.correct_count += 1;
            self.total_rounds += 1;
            self.message = Some(CORRECT_MESSAGE.to_string());
            info!("correct: {}", entry.code);
            return self.finish_round(Outcome::Correct);
        }

        // 空入力は不正解扱いにしない (回数も減らさない)
        if self.raw_input.trim().is_empty() {
            self.message = Some("Try again!".to_string());
            self.clear_input();
            debug!("empty answer for {}", entry.code);
            return Ok(Outcome::IncorrectRetry {
                attempts_left: self.attempts_left,
            });
        }

        match self.attempts_left {
            None => {
                self.message = Some("Try again!".to_string());
                self.clear_input();
                info!("wrong answer for {} (unlimited tries)", entry.code);
                Ok(Outcome::IncorrectRetry {
                    attempts_left: None,
                })
            }
            Some(n) => {
                let left = n.saturating_sub(1);
                self.attempts_left = Some(left);
                if left > 0 {
                    self.message = Some(tries_left_message(left));
                    self.clear_input();
                    info!("wrong answer for {}, {} left", entry.code, left);
                    Ok(Outcome::IncorrectRetry {
                        attempts_left: Some(left),
                    })
                } else {
                    self.wrong_count += 1;
                    self.total_rounds += 1;
                    self.message = Some(format!("Out of tries! It was {}.", entry.name));
                    info!("out of tries for {}", entry.code);
                    self.finish_round(Outcome::IncorrectExhausted)
                }
            }
        }
    }

    /// 表示中の国のエントリ (見つからなければ不変条件違反)
    fn current_entry(&self) -> Result<&'a CountryEntry, QuizError> {
        let catalog = self.catalog;
        catalog.lookup(&self.current_code).map_err(|err| {
            error!(
                "current flag {:?} is not in the catalog: {}",
                self.current_code, err
            );
            QuizError::from(err)
        })
    }

    fn clear_input(&mut self) {
        self.raw_input.clear();
        self.suggestions.clear();
        self.selected_suggestion = None;
    }

    // --------------------------------------------------
    // ラウンド進行
    // --------------------------------------------------

    /// ラウンド終了: 待ち時間があれば予約、なければ即座に次へ
    fn finish_round(&mut self, outcome: Outcome) -> Result<Outcome, QuizError> {
        self.clear_input();

        if self.config.auto_advance_delay_ms == 0 {
            self.advance_round(false)?;
        } else {
            let delay = Duration::from_millis(self.config.auto_advance_delay_ms);
            if let Some(old) = self.pending_advance.take() {
                self.timer.cancel(old);
            }
            self.pending_advance = Some(self.timer.schedule(delay, Deferred::AdvanceRound));
            self.phase = Phase::Resolved(outcome.clone());
        }
        Ok(outcome)
    }

    /// 次の国旗へ進む
    fn advance_round(&mut self, clear_message: bool) -> Result<(), QuizError> {
        if let Some(id) = self.pending_advance.take() {
            self.timer.cancel(id);
        }
        if clear_message {
            self.message = None;
        }

        self.current_code = self.draw_next_code()?;
        self.attempts_left = self.config.max_attempts;
        self.clear_input();
        self.phase = Phase::AwaitingInput;

        debug!(
            "next flag: {} ({}), {}/{} seen",
            self.current_code,
            self.flag_image_path(),
            self.used_codes.len(),
            self.catalog.len()
        );
        Ok(())
    }

    /// 未出題のコードから一様に選ぶ。全部出題済みならサイクルをリセットする
    fn draw_next_code(&mut self) -> Result<String, QuizError> {
        let catalog = self.catalog;
        let used = &self.used_codes;
        let mut remaining: Vec<&str> = catalog.all_codes().filter(|c| !used.contains(*c)).collect();

        if remaining.is_empty() {
            info!("all {} flags seen, restarting cycle", catalog.len());
            self.used_codes.clear();
            self.score = 0;
            self.correct_count = 0;
            self.wrong_count = 0;
            self.total_rounds = 0;
            self.message = Some(match self.message.take() {
                Some(prev) => format!("{} {}", prev, RESTART_MESSAGE),
                None => RESTART_MESSAGE.to_string(),
            });
            remaining = catalog.all_codes().collect();
        }

        let code = remaining
            .choose(&mut self.rng)
            .map(|c| c.to_string())
            .ok_or(CatalogError::Empty)?;
        self.used_codes.insert(code.clone());
        Ok(code)
    }

    /// 経過時間を渡してタイマーを進める (メインループから毎回呼ぶ)
    pub fn tick(&mut self, elapsed: Duration) -> Result<(), QuizError> {
        for task in self.timer.advance(elapsed) {
            match task {
                Deferred::AdvanceRound => {
                    self.pending_advance = None;
                    self.advance_round(true)?;
                }
            }
        }
        Ok(())
    }

    /// 終了処理: 予約中の遅延タスクをすべて取り消す
    pub fn shutdown(&mut self) {
        let cancelled = self.timer.cancel_all();
        self.pending_advance = None;
        if cancelled > 0 {
            debug!("cancelled {} pending task(s) on shutdown", cancelled);
        }
    }

    // --------------------------------------------------
    // 表示用
    // --------------------------------------------------

    pub fn current_code(&self) -> &str {
        &self.current_code
    }

    pub fn flag_emoji(&self) -> String {
        countries::flag_emoji(&self.current_code)
    }

    pub fn flag_image_path(&self) -> String {
        countries::flag_image_path(
            &self.config.image_dir,
            &self.current_code,
            &self.config.image_ext,
        )
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn attempts_left(&self) -> Option<u32> {
        self.attempts_left
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.config.max_attempts
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected_suggestion(&self) -> Option<usize> {
        self.selected_suggestion
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, Phase::Resolved(_))
    }

    /// (このサイクルで出題済みの数, 全体の数)
    pub fn progress(&self) -> (usize, usize) {
        (self.used_codes.len(), self.catalog.len())
    }

    /// 自動遷移までの残り時間と全体の待ち時間
    pub fn advance_countdown(&self) -> Option<(Duration, Duration)> {
        let id = self.pending_advance?;
        let remaining = self.timer.remaining(id)?;
        Some((
            remaining,
            Duration::from_millis(self.config.auto_advance_delay_ms),
        ))
    }
}

/// "Try again! 2 tries left" / "Try again! 1 try left"
fn tries_left_message(left: u32) -> String {
    if left == 1 {
        "Try again! 1 try left".to_string()
    } else {
        format!("Try again! {} tries left", left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SuggestionPolicy;
    use proptest::prelude::*;

    fn entry(code: &str, name: &str, aliases: &[&str]) -> CountryEntry {
        CountryEntry {
            code: code.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            entry("fi", "Finland", &["suomi"]),
            entry("ie", "Ireland", &["eire"]),
            entry("is", "Iceland", &[]),
        ])
        .unwrap()
    }

    /// 即時遷移・シード固定のライフ制
    fn lives() -> QuizConfig {
        QuizConfig {
            seed: Some(7),
            auto_advance_delay_ms: 0,
            ..QuizConfig::lives()
        }
    }

    fn classic() -> QuizConfig {
        QuizConfig {
            seed: Some(7),
            ..QuizConfig::classic()
        }
    }

    fn current_name(catalog: &Catalog, session: &QuizSession<'_>) -> String {
        catalog.lookup(session.current_code()).unwrap().name.clone()
    }

    #[test]
    fn new_session_records_first_flag() {
        let catalog = small_catalog();
        let session = QuizSession::new(&catalog, lives()).unwrap();
        assert!(catalog.lookup(session.current_code()).is_ok());
        assert_eq!(session.progress(), (1, 3));
        assert_eq!(session.attempts_left(), Some(3));
        assert_eq!(session.phase(), &Phase::AwaitingInput);
        assert_eq!(session.message(), None);
    }

    #[test]
    fn correct_answer_scores_and_moves_on() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let first = session.current_code().to_string();
        let name = current_name(&catalog, &session);

        session.set_input(&format!("  {}  ", name.to_uppercase()));
        assert_eq!(session.submit().unwrap(), Outcome::Correct);

        assert_eq!(session.score(), 1);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.total_rounds(), 1);
        assert_eq!(session.message(), Some(CORRECT_MESSAGE));
        assert_ne!(session.current_code(), first);
        assert!(session.raw_input().is_empty());
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn three_wrong_answers_exhaust_the_round() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let first = session.current_code().to_string();

        session.set_input("atlantis");
        assert_eq!(
            session.submit().unwrap(),
            Outcome::IncorrectRetry {
                attempts_left: Some(2)
            }
        );
        assert_eq!(session.message(), Some("Try again! 2 tries left"));
        assert_eq!(session.wrong_count(), 0);
        assert!(session.raw_input().is_empty());
        assert_eq!(session.current_code(), first);

        session.set_input("atlantis");
        assert_eq!(
            session.submit().unwrap(),
            Outcome::IncorrectRetry {
                attempts_left: Some(1)
            }
        );
        assert_eq!(session.message(), Some("Try again! 1 try left"));
        assert_eq!(session.wrong_count(), 0);

        let name = current_name(&catalog, &session);
        session.set_input("atlantis");
        assert_eq!(session.submit().unwrap(), Outcome::IncorrectExhausted);
        assert_eq!(session.wrong_count(), 1);
        assert_eq!(session.total_rounds(), 1);
        assert_eq!(session.message(), Some(format!("Out of tries! It was {}.", name).as_str()));

        assert_ne!(session.current_code(), first);
        assert_eq!(session.attempts_left(), Some(3));
    }

    #[test]
    fn unlimited_tries_never_count_as_wrong() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, classic()).unwrap();
        let first = session.current_code().to_string();

        for _ in 0..10 {
            session.set_input("atlantis");
            assert_eq!(
                session.submit().unwrap(),
                Outcome::IncorrectRetry {
                    attempts_left: None
                }
            );
        }
        assert_eq!(session.message(), Some("Try again!"));
        assert_eq!(session.wrong_count(), 0);
        assert_eq!(session.total_rounds(), 0);
        assert_eq!(session.current_code(), first);
    }

    #[test]
    fn reveal_never_drops_score_below_zero() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let code = session.current_code().to_uppercase();
        let name = current_name(&catalog, &session);

        assert_eq!(session.reveal().unwrap(), Outcome::Revealed);
        assert_eq!(session.score(), 0);
        assert_eq!(session.wrong_count(), 1);
        assert_eq!(session.total_rounds(), 1);
        assert_eq!(session.message(), Some(format!("This is {} ({})", name, code).as_str()));
    }

    #[test]
    fn reveal_costs_one_point() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let name = current_name(&catalog, &session);
        session.set_input(&name);
        session.submit().unwrap();
        assert_eq!(session.score(), 1);

        session.reveal().unwrap();
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn empty_submit_is_ignored_when_not_allowed() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        session.set_input("   ");
        assert_eq!(session.submit().unwrap(), Outcome::Ignored);
        assert_eq!(session.attempts_left(), Some(3));
        assert_eq!(session.message(), None);
    }

    #[test]
    fn empty_submit_is_evaluated_when_allowed() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, classic()).unwrap();
        assert_eq!(
            session.submit().unwrap(),
            Outcome::IncorrectRetry {
                attempts_left: None
            }
        );
        assert_eq!(session.wrong_count(), 0);
    }

    #[test]
    fn empty_submit_never_consumes_an_attempt() {
        let catalog = small_catalog();
        let config = QuizConfig {
            allow_empty_submit: true,
            ..lives()
        };
        let mut session = QuizSession::new(&catalog, config).unwrap();
        let first = session.current_code().to_string();

        for _ in 0..5 {
            session.set_input("  ");
            assert_eq!(
                session.submit().unwrap(),
                Outcome::IncorrectRetry {
                    attempts_left: Some(3)
                }
            );
        }
        assert_eq!(session.message(), Some("Try again!"));
        assert_eq!(session.attempts_left(), Some(3));
        assert_eq!(session.wrong_count(), 0);
        assert_eq!(session.total_rounds(), 0);
        assert_eq!(session.current_code(), first);

        // 空入力のあとでも通常の不正解は数える
        session.set_input("atlantis");
        assert_eq!(
            session.submit().unwrap(),
            Outcome::IncorrectRetry {
                attempts_left: Some(2)
            }
        );
    }

    #[test]
    fn strict_mode_rejects_code_and_alias() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let code = session.current_code().to_string();
        session.set_input(&code);
        assert!(matches!(
            session.submit().unwrap(),
            Outcome::IncorrectRetry { .. }
        ));
    }

    #[test]
    fn lenient_mode_accepts_code() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, classic()).unwrap();
        let code = session.current_code().to_uppercase();
        session.set_input(&code);
        assert_eq!(session.submit().unwrap(), Outcome::Correct);
    }

    #[test]
    fn no_repeats_within_a_cycle_then_reset() {
        let catalog = Catalog::builtin();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();

        for _ in 1..catalog.len() {
            let before = session.used_codes.clone();
            session.reveal().unwrap();
            assert!(!before.contains(session.current_code()));
        }
        assert_eq!(session.progress(), (catalog.len(), catalog.len()));
        assert_eq!(session.wrong_count(), catalog.len() as u32 - 1);

        // 全部出題済み -> リセットして続行
        session.reveal().unwrap();
        assert_eq!(session.progress(), (1, catalog.len()));
        assert_eq!(session.score(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.wrong_count(), 0);
        assert_eq!(session.total_rounds(), 0);
        assert!(session.message().unwrap().ends_with(RESTART_MESSAGE));
        assert!(catalog.lookup(session.current_code()).is_ok());
    }

    #[test]
    fn prefix_suggestions_follow_input() {
        let catalog = Catalog::builtin();
        let mut session = QuizSession::new(&catalog, classic()).unwrap();
        for c in "uni".chars() {
            session.input_char(c);
        }
        let labels: Vec<&str> = session.suggestions().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["AE - United Arab Emirates", "GB - United Kingdom", "US - United States"]
        );
        session.backspace();
        session.backspace();
        session.backspace();
        assert!(session.suggestions().is_empty());
    }

    fn nav_session(catalog: &Catalog, wrap: bool) -> QuizSession<'_> {
        let config = QuizConfig {
            suggestion_policy: SuggestionPolicy::Substring,
            wrap_suggestion_navigation: wrap,
            ..lives()
        };
        let mut session = QuizSession::new(catalog, config).unwrap();
        session.set_input("land");
        assert_eq!(session.suggestions().len(), 3);
        session
    }

    #[test]
    fn arrow_down_wraps_to_top() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        session.select_next();
        session.select_next();
        session.select_next();
        assert_eq!(session.selected_suggestion(), Some(2));
        session.select_next();
        assert_eq!(session.selected_suggestion(), Some(0));
        session.select_prev();
        assert_eq!(session.selected_suggestion(), Some(2));
    }

    #[test]
    fn arrow_down_clamps_at_bottom() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, false);
        for _ in 0..3 {
            session.select_next();
        }
        assert_eq!(session.selected_suggestion(), Some(2));
        session.select_next();
        assert_eq!(session.selected_suggestion(), Some(2));
        session.select_prev();
        session.select_prev();
        session.select_prev();
        assert_eq!(session.selected_suggestion(), Some(0));
    }

    #[test]
    fn arrow_up_from_nothing_selected() {
        let catalog = small_catalog();
        let mut wrap = nav_session(&catalog, true);
        wrap.select_prev();
        assert_eq!(wrap.selected_suggestion(), Some(2));

        let mut clamp = nav_session(&catalog, false);
        clamp.select_prev();
        assert_eq!(clamp.selected_suggestion(), Some(0));
    }

    #[test]
    fn typing_resets_selection() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        session.select_next();
        session.input_char('s');
        assert_eq!(session.selected_suggestion(), None);
    }

    #[test]
    fn arrows_do_nothing_without_suggestions() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        session.select_next();
        session.select_prev();
        assert_eq!(session.selected_suggestion(), None);
    }

    #[test]
    fn enter_on_highlighted_suggestion_picks_it() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        let target = session
            .suggestions()
            .iter()
            .position(|s| s.code == session.current_code())
            .unwrap();
        for _ in 0..=target {
            session.select_next();
        }
        assert_eq!(session.enter().unwrap(), Outcome::Correct);
        assert!(session.suggestions().is_empty());
        assert_eq!(session.selected_suggestion(), None);
    }

    #[test]
    fn wrong_pick_still_clears_suggestions() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        let wrong = session
            .suggestions()
            .iter()
            .position(|s| s.code != session.current_code())
            .unwrap();
        assert_eq!(
            session.pick_suggestion(wrong).unwrap(),
            Outcome::IncorrectRetry {
                attempts_left: Some(2)
            }
        );
        assert!(session.suggestions().is_empty());
    }

    #[test]
    fn out_of_range_pick_is_ignored() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        assert_eq!(session.pick_suggestion(9).unwrap(), Outcome::Ignored);
        assert_eq!(session.suggestions().len(), 3);
    }

    #[test]
    fn failed_pick_leaves_input_and_suggestions() {
        let catalog = small_catalog();
        let mut session = nav_session(&catalog, true);
        session.select_next();
        session.current_code = "zz".to_string();

        assert!(session.enter().is_err());
        assert_eq!(session.raw_input(), "land");
        assert_eq!(session.suggestions().len(), 3);
        assert_eq!(session.selected_suggestion(), Some(0));
        assert_eq!(session.attempts_left(), Some(3));
    }

    #[test]
    fn enter_without_selection_submits() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        let name = current_name(&catalog, &session);
        session.set_input(&name);
        assert_eq!(session.enter().unwrap(), Outcome::Correct);
    }

    fn delayed() -> QuizConfig {
        QuizConfig {
            seed: Some(11),
            ..QuizConfig::lives()
        }
    }

    #[test]
    fn delayed_advance_waits_for_the_timer() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, delayed()).unwrap();
        let first = session.current_code().to_string();
        let name = current_name(&catalog, &session);

        session.set_input(&name);
        assert_eq!(session.submit().unwrap(), Outcome::Correct);
        assert_eq!(session.phase(), &Phase::Resolved(Outcome::Correct));
        assert_eq!(session.current_code(), first);

        // 結果表示中の入力・答えを見るは無視
        session.input_char('x');
        assert!(session.raw_input().is_empty());
        assert_eq!(session.reveal().unwrap(), Outcome::Ignored);

        session.tick(Duration::from_millis(1999)).unwrap();
        assert_eq!(session.current_code(), first);
        assert_eq!(session.message(), Some(CORRECT_MESSAGE));
        let (remaining, total) = session.advance_countdown().unwrap();
        assert_eq!(remaining, Duration::from_millis(1));
        assert_eq!(total, Duration::from_millis(2000));

        session.tick(Duration::from_millis(1)).unwrap();
        assert_ne!(session.current_code(), first);
        assert_eq!(session.phase(), &Phase::AwaitingInput);
        assert_eq!(session.message(), None);
        assert_eq!(session.advance_countdown(), None);
    }

    #[test]
    fn enter_skips_the_wait_and_cancels_the_timer() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, delayed()).unwrap();
        session.reveal().unwrap();
        assert!(session.is_resolved());

        assert_eq!(session.enter().unwrap(), Outcome::Ignored);
        assert_eq!(session.phase(), &Phase::AwaitingInput);
        let second = session.current_code().to_string();
        assert_eq!(session.progress().0, 2);

        // 取り消した予約は発火しない
        session.tick(Duration::from_secs(10)).unwrap();
        assert_eq!(session.current_code(), second);
        assert_eq!(session.progress().0, 2);
    }

    #[test]
    fn shutdown_cancels_pending_advance() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, delayed()).unwrap();
        let first = session.current_code().to_string();
        session.reveal().unwrap();

        session.shutdown();
        session.tick(Duration::from_secs(10)).unwrap();
        assert_eq!(session.current_code(), first);
        assert!(session.is_resolved());
    }

    #[test]
    fn missing_current_flag_aborts_without_state_change() {
        let catalog = small_catalog();
        let mut session = QuizSession::new(&catalog, lives()).unwrap();
        session.current_code = "zz".to_string();
        session.set_input("finland");

        assert!(matches!(
            session.submit(),
            Err(QuizError::Catalog(CatalogError::NotFound(_)))
        ));
        assert!(session.reveal().is_err());
        assert_eq!(session.score(), 0);
        assert_eq!(session.wrong_count(), 0);
        assert_eq!(session.attempts_left(), Some(3));
        assert_eq!(session.raw_input(), "finland");
    }

    #[test]
    fn flag_references_use_the_code() {
        let catalog = small_catalog();
        let session = QuizSession::new(&catalog, lives()).unwrap();
        let code = session.current_code().to_string();
        assert_eq!(session.flag_image_path(), format!("images/{}.png", code));
        assert_eq!(session.flag_emoji().chars().count(), 2);
    }

    proptest! {
        #[test]
        fn draws_never_repeat_before_cycle_ends(seed in any::<u64>(), rounds in 1usize..60) {
            let catalog = Catalog::builtin();
            let config = QuizConfig { seed: Some(seed), ..lives() };
            let mut session = QuizSession::new(&catalog, config).unwrap();
            for _ in 0..rounds {
                let before = session.used_codes.clone();
                session.reveal().unwrap();
                prop_assert!(!before.contains(session.current_code()));
                prop_assert!(session.used_codes.contains(session.current_code()));
            }
        }
    }
}
