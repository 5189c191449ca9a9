// ============================================
// src/timer.rs
// 取り消し可能な遅延タスク
// ============================================

use std::time::Duration;

/// 予約したタスクの ID (再利用しない)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    id: TaskId,
    due: Duration,
    payload: T,
}

/// 時間を明示的に進めて動かすタイマー
///
/// 実時間は持たない。呼び出し側が `advance` で経過時間を渡し、
/// 期限が来たタスクの中身だけが返る。テストでは任意の時間を渡せる。
#[derive(Debug)]
pub struct Timer<T> {
    /// タイマー作成からの経過時間
    now: Duration,
    next_id: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            tasks: Vec::new(),
        }
    }

    /// `delay` 後に `payload` を返すよう予約する
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled {
            id,
            due: self.now + delay,
            payload,
        });
        id
    }

    /// 予約を取り消す (既に発火済み・取り消し済みなら false)
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// 全予約を取り消し、取り消した件数を返す
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// 時間を進め、期限が来たタスクを期限順 (同時なら予約順) に返す
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;

        due.sort_by_key(|t| (t.due, t.id.0));
        due.into_iter().map(|t| t.payload).collect()
    }

    /// 発火までの残り時間
    pub fn remaining(&self, id: TaskId) -> Option<Duration> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.due.saturating_sub(self.now))
    }
}
