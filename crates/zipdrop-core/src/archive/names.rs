//! Entry name sanitization.
//!
//! ブラウザから来るファイル名をそのまま ZIP に入れると
//! `../` やフルパスが展開先を汚すので、Pipeline がここを通してから Builder に渡す。

use std::collections::HashSet;

const FALLBACK_NAME: &str = "file";

/// 1 つのファイル名を ZIP エントリ名として安全な形にする
///
/// - `/` と `\` の両方で区切り、最後の要素だけ残す
/// - 制御文字を除く
/// - 空 / `.` / `..` は `file`
pub fn sanitize_entry_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    match cleaned {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        name => name.to_string(),
    }
}

/// 重複した名前に ` (1)`, ` (2)`, ... を付けて一意にする（入力順を保つ）
pub fn unique_entry_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut taken = HashSet::new();
    let mut result = Vec::new();
    for name in names {
        let name = name.as_ref();
        let mut candidate = name.to_string();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = with_counter(name, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }
    result
}

fn with_counter(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({n})"),
    }
}
