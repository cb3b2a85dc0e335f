// SPDX-License-Identifier: MIT

//! The `matches` SQL function used by the front-end's search widget.

use std::sync::{LazyLock, Mutex};

use regex::Regex;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

// Search scans call the function once per cell with the same pattern, so a
// single-entry cache avoids recompiling it for every row.
static REGEX_CACHE: LazyLock<Mutex<Option<(String, Regex)>>> =
    LazyLock::new(|| Mutex::new(None));

/// Register `matches(text, pattern, whole_word, case_sensitive)` on a handle.
///
/// The function is pure and deterministic. A pattern that fails to compile is
/// treated as matching nothing; it must never abort the enclosing statement.
pub(crate) fn register_matcher(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "matches",
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(matches_impl(ctx)),
    )
}

fn matches_impl(ctx: &Context) -> bool {
    let text = match ctx.get_raw(0) {
        ValueRef::Null => "NULL".to_owned(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(v) => String::from_utf8_lossy(v).into_owned(),
        // Blobs never match a textual pattern.
        ValueRef::Blob(_) => return false,
    };
    let Ok(pattern) = ctx.get::<String>(1) else {
        return false;
    };
    let whole_word = ctx.get::<bool>(2).unwrap_or(false);
    let case_sensitive = ctx.get::<bool>(3).unwrap_or(true);

    let mut full = String::with_capacity(pattern.len() + 16);
    if !case_sensitive {
        full.push_str("(?i)");
    }
    full.push_str("(?s)");
    if whole_word {
        full.push_str(r"\b(?:");
        full.push_str(&pattern);
        full.push_str(r")\b");
    } else {
        full.push_str(&pattern);
    }

    let Some(re) = compile_cached(&full) else {
        return false;
    };
    re.is_match(&text)
}

fn compile_cached(pattern: &str) -> Option<Regex> {
    {
        let cache = REGEX_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_pattern, re)) = cache.as_ref() {
            if cached_pattern == pattern {
                return Some(re.clone());
            }
        }
    }

    let re = Regex::new(pattern).ok()?;
    *REGEX_CACHE.lock().unwrap_or_else(|e| e.into_inner()) =
        Some((pattern.to_owned(), re.clone()));
    Some(re)
}
