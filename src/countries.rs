// ============================================
// src/countries.rs
// 国データ (カタログ) と解答判定
// ============================================

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// 組み込みの国データ (静的テーブル用)
#[derive(Copy, Clone)]
pub struct Country {
    pub code: &'static str,               // "us" など (小文字2文字)
    pub name: &'static str,               // 正式名 (表示用・解答用)
    pub aliases: &'static [&'static str], // 別名 (正解として受け付ける)
}

/// 国データリスト (コード順)
pub const COUNTRY_LIST: &'static [Country] = &[
    Country { code: "ad", name: "Andorra", aliases: &["principality of andorra"] },
    Country { code: "ae", name: "United Arab Emirates", aliases: &["uae", "emirates"] },
    Country { code: "af", name: "Afghanistan", aliases: &[] },
    Country { code: "ag", name: "Antigua and Barbuda", aliases: &["antigua"] },
    Country { code: "ai", name: "Anguilla", aliases: &[] },
    Country { code: "al", name: "Albania", aliases: &["republic of albania"] },
    Country { code: "am", name: "Armenia", aliases: &[] },
    Country { code: "ao", name: "Angola", aliases: &[] },
    Country { code: "aq", name: "Antarctica", aliases: &[] },
    Country { code: "ar", name: "Argentina", aliases: &[] },
    Country { code: "as", name: "American Samoa", aliases: &[] },
    Country { code: "at", name: "Austria", aliases: &[] },
    Country { code: "au", name: "Australia", aliases: &["commonwealth of australia"] },
    Country { code: "aw", name: "Aruba", aliases: &[] },
    Country { code: "ax", name: "Åland Islands", aliases: &["aland islands"] },
    Country { code: "az", name: "Azerbaijan", aliases: &[] },
    Country { code: "ba", name: "Bosnia and Herzegovina", aliases: &["bosnia"] },
    Country { code: "bb", name: "Barbados", aliases: &[] },
    Country { code: "bd", name: "Bangladesh", aliases: &[] },
    Country { code: "be", name: "Belgium", aliases: &[] },
    Country { code: "bf", name: "Burkina Faso", aliases: &[] },
    Country { code: "bg", name: "Bulgaria", aliases: &[] },
    Country { code: "bh", name: "Bahrain", aliases: &[] },
    Country { code: "bi", name: "Burundi", aliases: &[] },
    Country { code: "bj", name: "Benin", aliases: &[] },
    Country { code: "bl", name: "Saint Barthélemy", aliases: &["saint barthelemy"] },
    Country { code: "bm", name: "Bermuda", aliases: &[] },
    Country { code: "bn", name: "Brunei", aliases: &["brunei darussalam"] },
    Country { code: "bo", name: "Bolivia", aliases: &[] },
    Country { code: "bq", name: "Caribbean Netherlands", aliases: &["bonaire"] },
    Country { code: "br", name: "Brazil", aliases: &[] },
    Country { code: "bs", name: "Bahamas", aliases: &[] },
    Country { code: "bt", name: "Bhutan", aliases: &[] },
    Country { code: "bv", name: "Bouvet Island", aliases: &[] },
    Country { code: "bw", name: "Botswana", aliases: &[] },
    Country { code: "by", name: "Belarus", aliases: &[] },
    Country { code: "bz", name: "Belize", aliases: &[] },
    Country { code: "ca", name: "Canada", aliases: &[] },
    Country { code: "cc", name: "Cocos Islands", aliases: &["keeling islands"] },
    Country { code: "cd", name: "Democratic Republic of the Congo", aliases: &["congo"] },
    Country { code: "cf", name: "Central African Republic", aliases: &["car"] },
    Country { code: "cg", name: "Republic of the Congo", aliases: &["congo"] },
    Country { code: "ch", name: "Switzerland", aliases: &["swiss confederation"] },
    Country { code: "ci", name: "Ivory Coast", aliases: &["cote d'ivoire"] },
    Country { code: "ck", name: "Cook Islands", aliases: &[] },
    Country { code: "cl", name: "Chile", aliases: &[] },
    Country { code: "cm", name: "Cameroon", aliases: &[] },
    Country { code: "cn", name: "China", aliases: &["peoples republic of china"] },
    Country { code: "co", name: "Colombia", aliases: &[] },
    Country { code: "cr", name: "Costa Rica", aliases: &[] },
    Country { code: "cu", name: "Cuba", aliases: &[] },
    Country { code: "cv", name: "Cape Verde", aliases: &["cabo verde"] },
    Country { code: "cw", name: "Curaçao", aliases: &["curacao"] },
    Country { code: "cx", name: "Christmas Island", aliases: &[] },
    Country { code: "cy", name: "Cyprus", aliases: &[] },
    Country { code: "cz", name: "Czech Republic", aliases: &["czechia"] },
    Country { code: "de", name: "Germany", aliases: &["deutschland"] },
    Country { code: "dj", name: "Djibouti", aliases: &[] },
    Country { code: "dk", name: "Denmark", aliases: &[] },
    Country { code: "dm", name: "Dominica", aliases: &[] },
    Country { code: "do", name: "Dominican Republic", aliases: &[] },
    Country { code: "dz", name: "Algeria", aliases: &[] },
    Country { code: "ec", name: "Ecuador", aliases: &[] },
    Country { code: "ee", name: "Estonia", aliases: &[] },
    Country { code: "eg", name: "Egypt", aliases: &[] },
    Country { code: "eh", name: "Western Sahara", aliases: &[] },
    Country { code: "er", name: "Eritrea", aliases: &[] },
    Country { code: "es", name: "Spain", aliases: &["españa", "espana"] },
    Country { code: "et", name: "Ethiopia", aliases: &[] },
    Country { code: "fi", name: "Finland", aliases: &[] },
    Country { code: "fj", name: "Fiji", aliases: &[] },
    Country { code: "fk", name: "Falkland Islands", aliases: &["malvinas"] },
    Country { code: "fm", name: "Micronesia", aliases: &[] },
    Country { code: "fo", name: "Faroe Islands", aliases: &[] },
    Country { code: "fr", name: "France", aliases: &["french republic"] },
    Country { code: "ga", name: "Gabon", aliases: &[] },
    Country { code: "gb", name: "United Kingdom", aliases: &["uk", "great britain"] },
    Country { code: "gd", name: "Grenada", aliases: &[] },
    Country { code: "ge", name: "Georgia", aliases: &[] },
    Country { code: "gf", name: "French Guiana", aliases: &[] },
    Country { code: "gg", name: "Guernsey", aliases: &[] },
    Country { code: "gh", name: "Ghana", aliases: &[] },
    Country { code: "gi", name: "Gibraltar", aliases: &[] },
    Country { code: "gl", name: "Greenland", aliases: &[] },
    Country { code: "gm", name: "Gambia", aliases: &[] },
    Country { code: "gn", name: "Guinea", aliases: &[] },
    Country { code: "gp", name: "Guadeloupe", aliases: &[] },
    Country { code: "gq", name: "Equatorial Guinea", aliases: &[] },
    Country { code: "gr", name: "Greece", aliases: &["hellas"] },
    Country { code: "gs", name: "South Georgia", aliases: &["south sandwich islands"] },
    Country { code: "gt", name: "Guatemala", aliases: &[] },
    Country { code: "gu", name: "Guam", aliases: &[] },
    Country { code: "gw", name: "Guinea-Bissau", aliases: &[] },
    Country { code: "gy", name: "Guyana", aliases: &[] },
    Country { code: "hk", name: "Hong Kong", aliases: &[] },
    Country { code: "hm", name: "Heard Island", aliases: &["mcdonald islands"] },
    Country { code: "hn", name: "Honduras", aliases: &[] },
    Country { code: "hr", name: "Croatia", aliases: &[] },
    Country { code: "ht", name: "Haiti", aliases: &[] },
    Country { code: "hu", name: "Hungary", aliases: &[] },
    Country { code: "id", name: "Indonesia", aliases: &[] },
    Country { code: "ie", name: "Ireland", aliases: &[] },
    Country { code: "il", name: "Israel", aliases: &[] },
    Country { code: "im", name: "Isle of Man", aliases: &[] },
    Country { code: "in", name: "India", aliases: &[] },
    Country { code: "io", name: "British Indian Ocean Territory", aliases: &["biot"] },
    Country { code: "iq", name: "Iraq", aliases: &[] },
    Country { code: "ir", name: "Iran", aliases: &[] },
    Country { code: "is", name: "Iceland", aliases: &[] },
    Country { code: "it", name: "Italy", aliases: &["italia"] },
    Country { code: "je", name: "Jersey", aliases: &[] },
    Country { code: "jm", name: "Jamaica", aliases: &[] },
    Country { code: "jo", name: "Jordan", aliases: &[] },
    Country { code: "jp", name: "Japan", aliases: &["nippon"] },
    Country { code: "ke", name: "Kenya", aliases: &[] },
    Country { code: "kg", name: "Kyrgyzstan", aliases: &[] },
    Country { code: "kh", name: "Cambodia", aliases: &[] },
    Country { code: "ki", name: "Kiribati", aliases: &[] },
    Country { code: "km", name: "Comoros", aliases: &[] },
    Country { code: "kn", name: "Saint Kitts and Nevis", aliases: &["saint kitts"] },
    Country { code: "kp", name: "North Korea", aliases: &["dprk"] },
    Country { code: "kr", name: "South Korea", aliases: &["korea"] },
    Country { code: "kw", name: "Kuwait", aliases: &[] },
    Country { code: "ky", name: "Cayman Islands", aliases: &[] },
    Country { code: "kz", name: "Kazakhstan", aliases: &[] },
    Country { code: "la", name: "Laos", aliases: &[] },
    Country { code: "lb", name: "Lebanon", aliases: &[] },
    Country { code: "lc", name: "Saint Lucia", aliases: &[] },
    Country { code: "li", name: "Liechtenstein", aliases: &[] },
    Country { code: "lk", name: "Sri Lanka", aliases: &[] },
    Country { code: "lr", name: "Liberia", aliases: &[] },
    Country { code: "ls", name: "Lesotho", aliases: &[] },
    Country { code: "lt", name: "Lithuania", aliases: &[] },
    Country { code: "lu", name: "Luxembourg", aliases: &[] },
    Country { code: "lv", name: "Latvia", aliases: &[] },
    Country { code: "ly", name: "Libya", aliases: &[] },
    Country { code: "ma", name: "Morocco", aliases: &[] },
    Country { code: "mc", name: "Monaco", aliases: &[] },
    Country { code: "md", name: "Moldova", aliases: &[] },
    Country { code: "me", name: "Montenegro", aliases: &[] },
    Country { code: "mf", name: "Saint Martin", aliases: &[] },
    Country { code: "mg", name: "Madagascar", aliases: &[] },
    Country { code: "mh", name: "Marshall Islands", aliases: &[] },
    Country { code: "mk", name: "North Macedonia", aliases: &["macedonia"] },
    Country { code: "ml", name: "Mali", aliases: &[] },
    Country { code: "mm", name: "Myanmar", aliases: &["burma"] },
    Country { code: "mn", name: "Mongolia", aliases: &[] },
    Country { code: "mo", name: "Macau", aliases: &["macao"] },
    Country { code: "mp", name: "Northern Mariana Islands", aliases: &[] },
    Country { code: "mq", name: "Martinique", aliases: &[] },
    Country { code: "mr", name: "Mauritania", aliases: &[] },
    Country { code: "ms", name: "Montserrat", aliases: &[] },
    Country { code: "mt", name: "Malta", aliases: &[] },
    Country { code: "mu", name: "Mauritius", aliases: &[] },
    Country { code: "mv", name: "Maldives", aliases: &[] },
    Country { code: "mw", name: "Malawi", aliases: &[] },
    Country { code: "mx", name: "Mexico", aliases: &[] },
    Country { code: "my", name: "Malaysia", aliases: &[] },
    Country { code: "mz", name: "Mozambique", aliases: &[] },
    Country { code: "na", name: "Namibia", aliases: &[] },
    Country { code: "nc", name: "New Caledonia", aliases: &[] },
    Country { code: "ne", name: "Niger", aliases: &[] },
    Country { code: "nf", name: "Norfolk Island", aliases: &[] },
    Country { code: "ng", name: "Nigeria", aliases: &[] },
    Country { code: "ni", name: "Nicaragua", aliases: &[] },
    Country { code: "nl", name: "Netherlands", aliases: &["holland"] },
    Country { code: "no", name: "Norway", aliases: &[] },
    Country { code: "np", name: "Nepal", aliases: &[] },
    Country { code: "nr", name: "Nauru", aliases: &[] },
    Country { code: "nu", name: "Niue", aliases: &[] },
    Country { code: "nz", name: "New Zealand", aliases: &[] },
    Country { code: "om", name: "Oman", aliases: &[] },
    Country { code: "pa", name: "Panama", aliases: &[] },
    Country { code: "pe", name: "Peru", aliases: &[] },
    Country { code: "pf", name: "French Polynesia", aliases: &[] },
    Country { code: "pg", name: "Papua New Guinea", aliases: &["png"] },
    Country { code: "ph", name: "Philippines", aliases: &[] },
    Country { code: "pk", name: "Pakistan", aliases: &[] },
    Country { code: "pl", name: "Poland", aliases: &[] },
    Country { code: "pm", name: "Saint Pierre and Miquelon", aliases: &[] },
    Country { code: "pn", name: "Pitcairn Islands", aliases: &[] },
    Country { code: "pr", name: "Puerto Rico", aliases: &[] },
    Country { code: "ps", name: "Palestine", aliases: &[] },
    Country { code: "pt", name: "Portugal", aliases: &[] },
    Country { code: "pw", name: "Palau", aliases: &[] },
    Country { code: "py", name: "Paraguay", aliases: &[] },
    Country { code: "qa", name: "Qatar", aliases: &[] },
    Country { code: "re", name: "Réunion", aliases: &["reunion"] },
    Country { code: "ro", name: "Romania", aliases: &[] },
    Country { code: "rs", name: "Serbia", aliases: &[] },
    Country { code: "ru", name: "Russia", aliases: &["russian federation"] },
    Country { code: "rw", name: "Rwanda", aliases: &[] },
    Country { code: "sa", name: "Saudi Arabia", aliases: &[] },
    Country { code: "sb", name: "Solomon Islands", aliases: &[] },
    Country { code: "sc", name: "Seychelles", aliases: &[] },
    Country { code: "sd", name: "Sudan", aliases: &[] },
    Country { code: "se", name: "Sweden", aliases: &[] },
    Country { code: "sg", name: "Singapore", aliases: &[] },
    Country { code: "sh", name: "Saint Helena", aliases: &[] },
    Country { code: "si", name: "Slovenia", aliases: &[] },
    Country { code: "sj", name: "Svalbard and Jan Mayen", aliases: &[] },
    Country { code: "sk", name: "Slovakia", aliases: &[] },
    Country { code: "sl", name: "Sierra Leone", aliases: &[] },
    Country { code: "sm", name: "San Marino", aliases: &[] },
    Country { code: "sn", name: "Senegal", aliases: &[] },
    Country { code: "so", name: "Somalia", aliases: &[] },
    Country { code: "sr", name: "Suriname", aliases: &[] },
    Country { code: "ss", name: "South Sudan", aliases: &[] },
    Country { code: "st", name: "São Tomé and Príncipe", aliases: &["sao tome"] },
    Country { code: "sv", name: "El Salvador", aliases: &[] },
    Country { code: "sx", name: "Sint Maarten", aliases: &[] },
    Country { code: "sy", name: "Syria", aliases: &[] },
    Country { code: "sz", name: "Eswatini", aliases: &["swaziland"] },
    Country { code: "tc", name: "Turks and Caicos Islands", aliases: &[] },
    Country { code: "td", name: "Chad", aliases: &[] },
    Country { code: "tf", name: "French Southern Territories", aliases: &[] },
    Country { code: "tg", name: "Togo", aliases: &[] },
    Country { code: "th", name: "Thailand", aliases: &[] },
    Country { code: "tj", name: "Tajikistan", aliases: &[] },
    Country { code: "tk", name: "Tokelau", aliases: &[] },
    Country { code: "tl", name: "Timor-Leste", aliases: &["east timor"] },
    Country { code: "tm", name: "Turkmenistan", aliases: &[] },
    Country { code: "tn", name: "Tunisia", aliases: &[] },
    Country { code: "to", name: "Tonga", aliases: &[] },
    Country { code: "tr", name: "Turkey", aliases: &["türkiye", "turkiye"] },
    Country { code: "tt", name: "Trinidad and Tobago", aliases: &["trinidad"] },
    Country { code: "tv", name: "Tuvalu", aliases: &[] },
    Country { code: "tw", name: "Taiwan", aliases: &[] },
    Country { code: "tz", name: "Tanzania", aliases: &[] },
    Country { code: "ua", name: "Ukraine", aliases: &[] },
    Country { code: "ug", name: "Uganda", aliases: &[] },
    Country { code: "um", name: "U.S. Minor Outlying Islands", aliases: &[] },
    Country { code: "us", name: "United States", aliases: &["usa", "united states of america"] },
    Country { code: "uy", name: "Uruguay", aliases: &[] },
    Country { code: "uz", name: "Uzbekistan", aliases: &[] },
    Country { code: "va", name: "Vatican City", aliases: &["holy see"] },
    Country { code: "vc", name: "Saint Vincent and the Grenadines", aliases: &["saint vincent"] },
    Country { code: "ve", name: "Venezuela", aliases: &[] },
    Country { code: "vg", name: "British Virgin Islands", aliases: &[] },
    Country { code: "vi", name: "U.S. Virgin Islands", aliases: &[] },
    Country { code: "vn", name: "Vietnam", aliases: &[] },
    Country { code: "vu", name: "Vanuatu", aliases: &[] },
    Country { code: "wf", name: "Wallis and Futuna", aliases: &[] },
    Country { code: "ws", name: "Samoa", aliases: &[] },
    Country { code: "ye", name: "Yemen", aliases: &[] },
    Country { code: "yt", name: "Mayotte", aliases: &[] },
    Country { code: "za", name: "South Africa", aliases: &[] },
    Country { code: "zm", name: "Zambia", aliases: &[] },
    Country { code: "zw", name: "Zimbabwe", aliases: &[] },
];

/// カタログの1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl From<&Country> for CountryEntry {
    fn from(country: &Country) -> Self {
        Self {
            code: country.code.to_string(),
            name: country.name.to_string(),
            aliases: country.aliases.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CountryEntry {
    /// 正規化済みの入力がこの国の正解か
    fn accepts(&self, normalized: &str, mode: MatchMode) -> bool {
        if normalize(&self.name) == normalized {
            return true;
        }
        match mode {
            MatchMode::Strict => false,
            MatchMode::Lenient => {
                self.code.eq_ignore_ascii_case(normalized)
                    || self.aliases.iter().any(|alias| normalize(alias) == normalized)
            }
        }
    }
}

/// 解答判定のモード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// コード・正式名・別名のどれでも正解
    Lenient,
    /// 正式名のみ正解
    Strict,
}

impl MatchMode {
    pub fn from_lenient(lenient: bool) -> Self {
        if lenient {
            MatchMode::Lenient
        } else {
            MatchMode::Strict
        }
    }
}

/// 入力の正規化 (前後の空白を除去して小文字化)
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 国コードから国旗の絵文字 (Regional Indicator 2文字) を作る
pub fn flag_emoji(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .filter_map(|c| char::from_u32(0x1F1E6 + (c.to_ascii_lowercase() as u32 - 'a' as u32)))
        .collect()
}

/// 国旗画像のパス (例: "images/us.png")
pub fn flag_image_path(image_dir: &str, code: &str, ext: &str) -> String {
    format!("{}/{}.{}", image_dir.trim_end_matches('/'), code.to_lowercase(), ext)
}

/// 国データのカタログ (起動時に一度だけ作り、以後は変更しない)
#[derive(Debug, Clone)]
pub struct Catalog {
    /// 挿入順のエントリ
    entries: Vec<CountryEntry>,
    /// コード -> entries のインデックス
    index: HashMap<String, usize>,
}

impl Catalog {
    /// エントリを検証してカタログを作る
    pub fn new(entries: Vec<CountryEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let valid_code =
                entry.code.len() == 2 && entry.code.chars().all(|c| c.is_ascii_lowercase());
            if !valid_code {
                return Err(CatalogError::InvalidCode(entry.code.clone()));
            }
            if entry.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(entry.code.clone()));
            }
            if index.insert(entry.code.clone(), i).is_some() {
                return Err(CatalogError::DuplicateCode(entry.code.clone()));
            }
        }

        Ok(Self { entries, index })
    }

    /// 組み込みの国データからカタログを作る
    pub fn builtin() -> Self {
        let entries: Vec<CountryEntry> = COUNTRY_LIST.iter().map(CountryEntry::from).collect();
        // 組み込みデータはテストで検証済みなので、ここではインデックスだけ作る
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// JSON ファイル (`[{"code": .., "name": .., "aliases": [..]}]`) から読み込む
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<CountryEntry> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(entries)
    }

    pub fn lookup(&self, code: &str) -> Result<&CountryEntry, CatalogError> {
        self.index
            .get(code)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CatalogError::NotFound(code.to_string()))
    }

    /// 全コード (挿入順)
    pub fn all_codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.code.as_str())
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `candidate` が `code` の国の正解か判定する
    pub fn matches(&self, code: &str, candidate: &str, mode: MatchMode) -> Result<bool, CatalogError> {
        let entry = self.lookup(code)?;
        Ok(entry.accepts(&normalize(candidate), mode))
    }
}
