//! Keyword tables and exclusion patterns.
//!
//! These are data, not control flow: the strategies iterate them in order and
//! never special-case an entry. Everything is compiled once per process.
//!
//! ```
//! use otp_extract::rules::{self, STRICT_KEYWORDS};
//!
//! assert!(STRICT_KEYWORDS.contains(&"验证码"));
//! assert!(rules::strict_keywords().iter().any(|k| k.is_in("Your Verification Code")));
//! ```

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// High-confidence phrases that sit right next to a verification code.
///
/// Iteration order is list order; it does not rank keywords.
pub const STRICT_KEYWORDS: &[&str] = &[
    // Chinese
    "验证码",
    "校验码",
    "动态码",
    "确认码",
    "安全码",
    "认证码",
    "验证码为",
    "验证码是",
    "动态码为",
    "确认码是",
    "临时验证码",
    "邮箱验证码",
    "手机验证码",
    "登录验证码",
    "注册验证码",
    "短信验证码",
    "登录码",
    "注册码",
    "动态密码",
    "一次性密码",
    "激活码",
    "通行码",
    "一次性验证码",
    "验证码如下",
    "验证码为：",
    "验证代码",
    "安全代码",
    // English
    "verification code",
    "verify code",
    "confirmation code",
    "security code",
    "otp",
    "one-time password",
    "one time password",
    "your code",
    "code is",
    "enter code",
    "use code",
    "code:",
    "verification:",
    "confirm with",
    "authenticate with",
    // Other languages
    "código",
    "codigo",
    "kode",
    "código de verificación",
];

/// Lower-confidence phrases, only trusted with a nearby all-digit number.
pub const MEDIUM_KEYWORDS: &[&str] = &[
    "passcode",
    "pin code",
    "auth code",
    "authentication code",
    "access code",
    "temp code",
    "temporary code",
];

/// Words that disqualify a candidate when they appear anywhere in its context.
///
/// Matched as lower-case substrings.
pub const EXCLUDED_CONTEXT_WORDS: &[&str] = &[
    "date", "time", "日期", "时间",
    "order", "订单", "invoice", "发票",
    "transaction", "交易", "payment", "支付",
    "phone", "tel", "电话", "手机",
    "user id", "user-id", "userid", "用户id",
    "account", "账号", "email", "邮箱",
    "price", "价格", "amount", "金额",
    "total", "合计", "balance", "余额",
    "reference", "ref", "参考", "编号",
    "ticket", "工单",
];

/// Named exclusion patterns, tested against a candidate's full context.
///
/// `\w` is spelled out as `[A-Za-z0-9_]` and word boundaries as explicit
/// non-word neighbours so the patterns behave the same on CJK text.
const EXCLUSION_SOURCES: &[(&str, &str)] = &[
    // Dates and times
    ("date", r"[0-9]{4}[年\-/][0-9]{1,2}[月\-/][0-9]{1,2}日?"),
    ("time", r"[0-9]{1,2}[:\-][0-9]{2}[:\-][0-9]{2}"),
    ("year", r"(?:^|[^A-Za-z0-9_])(?:19|20)[0-9]{2}(?:[^A-Za-z0-9_]|$)"),
    // Contact details
    ("phone", r"[0-9]{3}[\-.\s][0-9]{3,4}[\-.\s][0-9]{4}"),
    (
        "international_phone",
        r"\+[0-9]{1,3}[\s\-]?\(?[0-9]{1,4}\)?[\s\-]?[0-9]{1,4}[\s\-]?[0-9]{1,9}",
    ),
    ("area_code_phone", r"\([0-9]{2,4}\)\s*[0-9]{3,4}[\s\-][0-9]{4}"),
    ("zip_code", r"[0-9]{5,6}-[0-9]{4}"),
    // Digits inside email addresses
    ("email_local_digits", r"[A-Za-z0-9_.\-]+[0-9]+[A-Za-z0-9_.\-]*@[A-Za-z0-9_.\-]+"),
    ("email_domain_digits", r"@[A-Za-z0-9_.\-]*[0-9]+"),
    // Money and quantities
    ("dollar_amount", r"\$\s*[0-9]+"),
    ("yen_amount", r"¥\s*[0-9]+"),
    ("euro_amount", r"€\s*[0-9]+"),
    ("cjk_currency", r"[0-9]+\s*(?:元|美元|欧元|英镑)"),
    ("currency_code", r"(?i)[0-9]+\s*(?:USD|EUR|GBP|CNY)"),
    ("quantity", r"[0-9]+\s*(?:件|个|条|次)"),
    // Orders, prices, payments
    ("order", r"(?i)order|订单|invoice|发票|tracking|快递|运单|物流"),
    ("price", r"(?i)price|价格|amount|金额|total|合计"),
    ("payment", r"(?i)transaction|交易|payment|支付"),
    // Identifiers
    ("account", r"(?i)user\s*id|用户id|账号|account"),
    ("ticket", r"(?i)ticket|工单|case\s*#"),
    ("hyphenated_id", r"[0-9]{3,}-[0-9]{3,}"),
    ("underscored_id", r"[0-9]{3,}_[0-9]{3,}"),
    // Links and versions
    ("url_digits", r"(?i)https?://[A-Za-z0-9_./\-]*[0-9]+"),
    ("version", r"(?i)v[0-9]+\.[0-9]+"),
    ("version_word", r"(?i)version\s*[0-9]+"),
];

/// A keyword with its precompiled case-insensitive matcher.
#[derive(Debug)]
pub struct Keyword {
    text: &'static str,
    pattern: Regex,
}

impl Keyword {
    fn compile(text: &'static str) -> Self {
        let pattern = RegexBuilder::new(&regex::escape(text))
            .case_insensitive(true)
            .build()
            .expect("escaped keyword is a valid pattern");
        Self { text, pattern }
    }

    /// The keyword as written in the table.
    #[must_use]
    pub fn text(&self) -> &'static str {
        self.text
    }

    /// Byte offset of the first case-insensitive occurrence in `haystack`.
    #[must_use]
    pub fn find(&self, haystack: &str) -> Option<usize> {
        self.pattern.find(haystack).map(|m| m.start())
    }

    /// Whether the keyword occurs anywhere in `haystack`, ignoring case.
    #[must_use]
    pub fn is_in(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// A named exclusion pattern.
#[derive(Debug)]
pub struct ExclusionPattern {
    name: &'static str,
    regex: Regex,
}

impl ExclusionPattern {
    /// Short identifier used in logs and exclusion reasons.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the pattern occurs anywhere in `context`.
    #[must_use]
    pub fn is_match(&self, context: &str) -> bool {
        self.regex.is_match(context)
    }
}

static STRICT: Lazy<Vec<Keyword>> =
    Lazy::new(|| STRICT_KEYWORDS.iter().copied().map(Keyword::compile).collect());

static MEDIUM: Lazy<Vec<Keyword>> =
    Lazy::new(|| MEDIUM_KEYWORDS.iter().copied().map(Keyword::compile).collect());

static EXCLUSIONS: Lazy<Vec<ExclusionPattern>> = Lazy::new(|| {
    EXCLUSION_SOURCES
        .iter()
        .map(|&(name, source)| ExclusionPattern {
            name,
            regex: Regex::new(source).expect("exclusion patterns are valid"),
        })
        .collect()
});

/// Compiled [`STRICT_KEYWORDS`], in table order.
#[must_use]
pub fn strict_keywords() -> &'static [Keyword] {
    &STRICT
}

/// Compiled [`MEDIUM_KEYWORDS`], in table order.
#[must_use]
pub fn medium_keywords() -> &'static [Keyword] {
    &MEDIUM
}

/// All exclusion patterns, in evaluation order.
#[must_use]
pub fn exclusion_patterns() -> &'static [ExclusionPattern] {
    &EXCLUSIONS
}

/// Whether any strict keyword occurs in `haystack`.
pub(crate) fn has_strict_keyword(haystack: &str) -> bool {
    strict_keywords().iter().any(|k| k.is_in(haystack))
}

/// Whether any strict or medium keyword occurs in `haystack`.
pub(crate) fn has_any_keyword(haystack: &str) -> bool {
    has_strict_keyword(haystack) || medium_keywords().iter().any(|k| k.is_in(haystack))
}

/// First exclusion pattern matching `context`, if any.
pub(crate) fn first_exclusion(context: &str) -> Option<&'static ExclusionPattern> {
    exclusion_patterns().iter().find(|p| p.is_match(context))
}
