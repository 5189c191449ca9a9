// ============================================
// src/config.rs
// クイズの設定 (プリセット・設定ファイル・CLI 上書き)
// ============================================

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.json";

/// 候補 (サジェスト) の抽出方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPolicy {
    /// コード・正式名・別名の前方一致 ("US - United States" 形式)
    Prefix,
    /// 正式名の部分一致 (最大5件)
    Substring,
}

/// ゲームモード (プリセット)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// 無制限に再挑戦できるシンプル版
    Classic,
    /// 残りライフ制
    Lives,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Classic => "Classic (unlimited tries, code/alias accepted)",
            Mode::Lives => "Lives (3 tries per flag, exact name only)",
        }
    }
}

/// セッションの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// true: コード・別名も正解 / false: 正式名のみ
    pub lenient_matching: bool,
    /// 1ラウンドあたりの回答回数 (None は無制限)
    pub max_attempts: Option<u32>,
    pub suggestion_policy: SuggestionPolicy,
    /// 前方一致のときの候補数の上限
    pub max_suggestions: usize,
    /// 矢印キーで候補の端から反対側へ回り込むか
    pub wrap_suggestion_navigation: bool,
    /// 結果表示から次の国旗までの待ち時間 (0 なら即座に次へ)
    pub auto_advance_delay_ms: u64,
    /// 空入力の送信を判定にかけるか
    pub allow_empty_submit: bool,
    /// 乱数シード (None は OS から)
    pub seed: Option<u64>,
    pub image_dir: String,
    pub image_ext: String,
}

impl QuizConfig {
    /// シンプル版
    pub fn classic() -> Self {
        Self {
            lenient_matching: true,
            max_attempts: None,
            suggestion_policy: SuggestionPolicy::Prefix,
            max_suggestions: 10,
            wrap_suggestion_navigation: true,
            auto_advance_delay_ms: 0,
            allow_empty_submit: true,
            seed: None,
            image_dir: "images".to_string(),
            image_ext: "png".to_string(),
        }
    }

    /// ライフ制
    pub fn lives() -> Self {
        Self {
            lenient_matching: false,
            max_attempts: Some(3),
            suggestion_policy: SuggestionPolicy::Substring,
            wrap_suggestion_navigation: false,
            auto_advance_delay_ms: 2000,
            allow_empty_submit: false,
            ..Self::classic()
        }
    }

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Classic => Self::classic(),
            Mode::Lives => Self::lives(),
        }
    }

    /// 上書き設定を適用する (Some のものだけ)
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.lenient_matching {
            self.lenient_matching = v;
        }
        if let Some(v) = overrides.max_attempts {
            // 0 は「無制限」
            self.max_attempts = if v == 0 { None } else { Some(v) };
        }
        if let Some(v) = overrides.suggestion_policy {
            self.suggestion_policy = v;
        }
        if let Some(v) = overrides.max_suggestions {
            self.max_suggestions = v;
        }
        if let Some(v) = overrides.wrap_suggestion_navigation {
            self.wrap_suggestion_navigation = v;
        }
        if let Some(v) = overrides.auto_advance_delay_ms {
            self.auto_advance_delay_ms = v;
        }
        if let Some(v) = overrides.allow_empty_submit {
            self.allow_empty_submit = v;
        }
        if let Some(v) = overrides.seed {
            self.seed = Some(v);
        }
        if let Some(v) = &overrides.image_dir {
            self.image_dir = v.clone();
        }
        if let Some(v) = &overrides.image_ext {
            self.image_ext = v.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == Some(0) {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1 (omit it for unlimited)".to_string(),
            ));
        }
        if self.max_suggestions == 0 {
            return Err(ConfigError::Invalid(
                "max_suggestions must be at least 1".to_string(),
            ));
        }
        if self.image_ext.trim().is_empty() {
            return Err(ConfigError::Invalid("image_ext must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self::lives()
    }
}

/// 設定ファイル / CLI からの上書き (未指定は None)
///
/// `max_attempts` は 0 で無制限を表す。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub lenient_matching: Option<bool>,
    pub max_attempts: Option<u32>,
    pub suggestion_policy: Option<SuggestionPolicy>,
    pub max_suggestions: Option<usize>,
    pub wrap_suggestion_navigation: Option<bool>,
    pub auto_advance_delay_ms: Option<u64>,
    pub allow_empty_submit: Option<bool>,
    pub seed: Option<u64>,
    pub image_dir: Option<String>,
    pub image_ext: Option<String>,
}

impl ConfigOverrides {
    pub fn from_json_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 設定ファイルを読み込む
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, path)
    }
}

/// OS ごとの設定ファイルのパス (存在するときだけ返す)
pub fn default_config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("jp", "Fukumoto0141", "FLAG_WIZ")?;
    let path = proj_dirs.config_dir().join(CONFIG_FILE);
    path.exists().then_some(path)
}

/// ログファイルの置き場所 (データディレクトリ、なければカレント)
pub fn log_file_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("jp", "Fukumoto0141", "FLAG_WIZ") {
        let data_dir = proj_dirs.data_dir();
        if fs::create_dir_all(data_dir).is_ok() {
            return data_dir.join("flagwiz.log");
        }
    }
    PathBuf::from("flagwiz.log")
}

/// プリセット → 設定ファイル → CLI の順に重ねて最終的な設定を作る
pub fn resolve(
    mode: Mode,
    file: Option<&ConfigOverrides>,
    cli: &ConfigOverrides,
) -> Result<QuizConfig, ConfigError> {
    let mut config = QuizConfig::for_mode(mode);
    if let Some(file) = file {
        config.apply(file);
    }
    config.apply(cli);
    config.validate()?;
    Ok(config)
}
