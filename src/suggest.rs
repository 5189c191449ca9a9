// ============================================
// src/suggest.rs
// 入力途中の文字列から回答候補を作る
// ============================================

use crate::config::SuggestionPolicy;
use crate::countries::{Catalog, CountryEntry, MatchMode, normalize};

/// 部分一致のときの候補数の上限
pub const SUBSTRING_LIMIT: usize = 5;

/// 候補1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub code: String,
    /// 画面に出す文字列
    pub label: String,
    /// 選んだときに入力欄へ入る文字列
    pub answer: String,
}

/// `raw` に一致する候補をカタログ順に返す (並べ替えはしない)
pub fn suggest(
    catalog: &Catalog,
    raw: &str,
    policy: SuggestionPolicy,
    max_suggestions: usize,
    mode: MatchMode,
) -> Vec<Suggestion> {
    let input = normalize(raw);
    if input.is_empty() {
        return Vec::new();
    }

    match policy {
        SuggestionPolicy::Prefix => catalog
            .entries()
            .iter()
            .filter(|e| prefix_hit(e, &input))
            .take(max_suggestions)
            .map(|e| Suggestion {
                code: e.code.clone(),
                label: format!("{} - {}", e.code.to_uppercase(), e.name),
                // 厳密モードではコードは正解にならないので正式名を入れる
                answer: match mode {
                    MatchMode::Lenient => e.code.clone(),
                    MatchMode::Strict => e.name.clone(),
                },
            })
            .collect(),
        SuggestionPolicy::Substring => catalog
            .entries()
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&input))
            .take(SUBSTRING_LIMIT)
            .map(|e| Suggestion {
                code: e.code.clone(),
                label: e.name.clone(),
                answer: e.name.clone(),
            })
            .collect(),
    }
}

fn prefix_hit(entry: &CountryEntry, input: &str) -> bool {
    entry.code.starts_with(input)
        || entry.name.to_lowercase().starts_with(input)
        || entry
            .aliases
            .iter()
            .any(|alias| alias.to_lowercase().starts_with(input))
}
