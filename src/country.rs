//! Country detection and display
//!
//! Node tags usually carry their region as a flag emoji (`🇭🇰 HK 01`), a
//! country name (`Hong Kong 01`, `香港 01`) or a bare code (`JP-02`). The
//! first two-letter ISO 3166-1 code found wins.

struct Country {
    code: &'static str,
    name: &'static str,
    /// Lower case. Latin aliases match whole words, CJK ones any substring.
    aliases: &'static [&'static str],
}

/// Ordered so that more specific names come first (`中国香港` is HK, not CN).
static COUNTRIES: &[Country] = &[
    Country { code: "HK", name: "Hong Kong", aliases: &["hong kong", "hongkong", "香港"] },
    Country { code: "TW", name: "Taiwan", aliases: &["taiwan", "台湾", "臺灣"] },
    Country { code: "MO", name: "Macao", aliases: &["macao", "macau", "澳门"] },
    Country { code: "JP", name: "Japan", aliases: &["japan", "tokyo", "osaka", "日本", "东京", "大阪"] },
    Country { code: "KR", name: "South Korea", aliases: &["korea", "seoul", "韩国", "首尔"] },
    Country { code: "SG", name: "Singapore", aliases: &["singapore", "新加坡", "狮城"] },
    Country { code: "US", name: "United States", aliases: &["united states", "los angeles", "san jose", "seattle", "美国"] },
    Country { code: "GB", name: "United Kingdom", aliases: &["united kingdom", "britain", "london", "英国"] },
    Country { code: "DE", name: "Germany", aliases: &["germany", "frankfurt", "德国"] },
    Country { code: "FR", name: "France", aliases: &["france", "paris", "法国"] },
    Country { code: "NL", name: "Netherlands", aliases: &["netherlands", "amsterdam", "荷兰"] },
    Country { code: "CA", name: "Canada", aliases: &["canada", "加拿大"] },
    Country { code: "AU", name: "Australia", aliases: &["australia", "sydney", "澳大利亚", "澳洲"] },
    Country { code: "RU", name: "Russia", aliases: &["russia", "moscow", "俄罗斯"] },
    Country { code: "IN", name: "India", aliases: &["india", "mumbai", "印度"] },
    Country { code: "TR", name: "Turkey", aliases: &["turkey", "türkiye", "土耳其"] },
    Country { code: "MY", name: "Malaysia", aliases: &["malaysia", "马来西亚"] },
    Country { code: "TH", name: "Thailand", aliases: &["thailand", "泰国"] },
    Country { code: "VN", name: "Vietnam", aliases: &["vietnam", "越南"] },
    Country { code: "PH", name: "Philippines", aliases: &["philippines", "菲律宾"] },
    Country { code: "ID", name: "Indonesia", aliases: &["indonesia", "印尼", "印度尼西亚"] },
    Country { code: "AR", name: "Argentina", aliases: &["argentina", "阿根廷"] },
    Country { code: "BR", name: "Brazil", aliases: &["brazil", "巴西"] },
    Country { code: "CN", name: "China", aliases: &["china", "中国", "回国"] },
];

fn lookup(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Best-effort country code for a node tag.
///
/// Flag emoji first, then names and aliases, then an upper-case code token
/// such as `HK` in `HK-01` or `JP02`.
pub fn detect_country(tag: &str) -> Option<&'static str> {
    if let Some(code) = extract_flag_code(tag) {
        // Flags outside the table fall through to name matching
        if let Some(country) = lookup(&code) {
            return Some(country.code);
        }
    }

    let lower = tag.to_lowercase();
    if let Some(country) = COUNTRIES
        .iter()
        .find(|c| c.aliases.iter().any(|alias| mentions(&lower, alias)))
    {
        return Some(country.code);
    }

    tag.split(|c: char| !c.is_ascii_alphanumeric())
        .map(|token| token.trim_end_matches(|c: char| c.is_ascii_digit()))
        .filter(|token| token.len() == 2 && token.chars().all(|c| c.is_ascii_uppercase()))
        .find_map(|token| lookup(token).map(|c| c.code))
}

/// Whether `alias` occurs in `text`. Aliases spelled with Latin letters must
/// not touch another Latin letter on either side, so `india` misses
/// `Indiana`; digits, spaces and CJK characters all count as boundaries.
fn mentions(text: &str, alias: &str) -> bool {
    if !alias.bytes().any(|b| b.is_ascii_alphabetic()) {
        return text.contains(alias);
    }
    text.match_indices(alias).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + alias.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphabetic())
            && !after.is_some_and(|c| c.is_ascii_alphabetic())
    })
}

/// Display name for a code; unknown codes display as themselves.
pub fn country_name(code: &str) -> String {
    lookup(code)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| code.to_ascii_uppercase())
}

/// `🇭🇰 Hong Kong`
pub fn group_tag(code: &str) -> String {
    match country_code_to_flag(code) {
        Some(flag) => format!("{} {}", flag, country_name(code)),
        None => country_name(code),
    }
}

// ============================================================================
// Flag Emoji
// ============================================================================

const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;
const REGIONAL_INDICATOR_Z: u32 = 0x1F1FF;

/// Country code of the first flag emoji in `text`.
///
/// A flag is a pair of Regional Indicator Symbols, U+1F1E6 (A) to U+1F1FF (Z).
pub fn extract_flag_code(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).find_map(|pair| {
        let first = regional_indicator_to_letter(pair[0])?;
        let second = regional_indicator_to_letter(pair[1])?;
        Some(format!("{}{}", first, second))
    })
}

fn regional_indicator_to_letter(c: char) -> Option<char> {
    let code = c as u32;
    if (REGIONAL_INDICATOR_A..=REGIONAL_INDICATOR_Z).contains(&code) {
        char::from_u32('A' as u32 + (code - REGIONAL_INDICATOR_A))
    } else {
        None
    }
}

fn letter_to_regional_indicator(c: char) -> Option<char> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        char::from_u32(REGIONAL_INDICATOR_A + (upper as u32 - 'A' as u32))
    } else {
        None
    }
}

/// `"US"` becomes `"🇺🇸"`. Anything but two ASCII letters yields `None`.
pub fn country_code_to_flag(code: &str) -> Option<String> {
    let mut chars = code.chars();
    let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
        return None;
    };
    let first = letter_to_regional_indicator(first)?;
    let second = letter_to_regional_indicator(second)?;
    Some(format!("{}{}", first, second))
}
