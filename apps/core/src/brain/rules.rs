//! Rule matching using hand-authored regex patterns.
//!
//! Rules hold high-precision, policy-sensitive answers (academic integrity, exam
//! conflicts, off-campus library access) and are evaluated before retrieval.
//! They are version-controlled data: definitions are static, compiled once at
//! startup, and never built from user input.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::language::Language;
use super::normalize::normalize;
use crate::error::{AppError, Result};

/// Tag reported when a rule has no tag hint.
pub const DEFAULT_RULE_TAG: &str = "rule_match";

/// Text in both languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub ar: String,
}

impl LocalizedText {
    /// Text for a language, falling back to English when it is empty.
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Arabic if !self.ar.is_empty() => &self.ar,
            _ => &self.en,
        }
    }
}

/// Uncompiled rule, as written in source.
#[derive(Debug, Clone, Copy)]
pub struct RuleDefinition {
    pub name: &'static str,
    pub tag_hint: &'static str,
    pub en: &'static [&'static str],
    pub ar: &'static [&'static str],
    pub response_en: &'static str,
    pub response_ar: &'static str,
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Human identifier, never shown to the user
    pub name: String,
    /// Tag reported as the match
    pub tag_hint: String,
    patterns_en: Vec<Regex>,
    patterns_ar: Vec<Regex>,
    /// Canned reply
    pub response: LocalizedText,
}

impl Rule {
    /// Patterns for a language
    pub fn patterns(&self, lang: Language) -> &[Regex] {
        match lang {
            Language::English => &self.patterns_en,
            Language::Arabic => &self.patterns_ar,
        }
    }

    /// Tag to report for this rule.
    pub fn tag(&self) -> &str {
        if self.tag_hint.is_empty() {
            DEFAULT_RULE_TAG
        } else {
            &self.tag_hint
        }
    }
}

fn compile_patterns(rule: &str, patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|source| AppError::Pattern {
                    rule: rule.to_string(),
                    source,
                })
        })
        .collect()
}

/// Ordered rule list. Order is fixed at construction; first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile rule definitions in declaration order.
    ///
    /// Any invalid pattern fails the whole set: this is a startup-time error.
    pub fn compile(definitions: &[RuleDefinition]) -> Result<Self> {
        let rules = definitions
            .iter()
            .map(|def| {
                Ok(Rule {
                    name: def.name.to_string(),
                    tag_hint: def.tag_hint.to_string(),
                    patterns_en: compile_patterns(def.name, def.en)?,
                    patterns_ar: compile_patterns(def.name, def.ar)?,
                    response: LocalizedText {
                        en: def.response_en.to_string(),
                        ar: def.response_ar.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The built-in university rules.
    pub fn builtin() -> Result<Self> {
        Self::compile(BUILTIN_RULES)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find a rule by its name
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// First rule whose pattern (for `lang`) matches the normalized text.
    pub fn match_rule(&self, text: &str, lang: Language) -> Option<&Rule> {
        let normalized = normalize(text, lang);
        let hit = self
            .rules
            .iter()
            .find(|rule| rule.patterns(lang).iter().any(|p| p.is_match(&normalized)));
        if let Some(rule) = hit {
            debug!(rule = %rule.name, lang = %lang, "Rule matched");
        }
        hit
    }
}

/// Built-in rules, in precedence order.
pub const BUILTIN_RULES: &[RuleDefinition] = &[
    RuleDefinition {
        name: "greeting",
        tag_hint: "greeting",
        en: &[r"^\s*(hi|hello|hey|good (morning|afternoon|evening))\b"],
        ar: &[r"^\s*(مرحبا|اهلا|أهلا|السلام عليكم|صباح الخير|مساء الخير)\b"],
        response_en: "Hi! Ask me about registration, exams, policies/grading, or library resources.",
        response_ar: "مرحباً! اسألني عن التسجيل، الامتحانات، السياسات/الدرجات، أو موارد المكتبة.",
    },
    RuleDefinition {
        name: "integrity",
        tag_hint: "academic_integrity",
        en: &[r"\b(plagiar(ism|ize)|cheat(ing)?|academic integrity|turnitin)\b"],
        ar: &[r"(انتحال|غش|نزاه(ه|ة) اكاديمي(ه|ة)?|turnitin|تورنتن)"],
        response_en: "Academic integrity is serious. Follow your course syllabus and the university integrity policy. If unsure, ask the instructor and always cite sources.",
        response_ar: "النزاهة الأكاديمية أمر مهم. التزم بخطة المقرر ولائحة النزاهة الرسمية. إذا كنت غير متأكد اسأل المدرس ووثّق المصادر دائماً.",
    },
    RuleDefinition {
        name: "exam_conflict",
        tag_hint: "exam_conflict",
        en: &[
            r"\b(exam|final|midterm).*(conflict|clash|overlap)\b",
            r"\b(two|2)\s+(exams|finals|midterms)\b.*\b(same time|same slot)\b",
        ],
        ar: &[
            r"(تعارض|تداخل).*(امتحان|اختبار|نهائي|ميدترم)",
            r"(اختبارين|امتحانين).*(بنفس|نفس).*(الوقت|الفتره|الفترة)",
        ],
        response_en: "For exam conflicts or missed exams, contact the exams office/registrar ASAP. These requests usually have strict deadlines and may require documentation.",
        response_ar: "في حالة تعارض الامتحانات أو الغياب عن اختبار، تواصل فوراً مع شؤون الاختبارات/التسجيل. غالباً توجد مواعيد نهائية صارمة وقد تُطلب وثائق.",
    },
    RuleDefinition {
        name: "library_remote",
        tag_hint: "library_access",
        en: &[r"\b(vpn|proxy|off[\s-]?campus|remote access)\b"],
        ar: &[r"(vpn|بروكسي|خارج الجامعه|خارج الجامعة|وصول خارجي|الوصول من البيت)"],
        response_en: "For off-campus library access, start from the library website and use portal login + VPN/proxy if required.",
        response_ar: "للوصول لمصادر المكتبة خارج الجامعة ابدأ من موقع المكتبة واستخدم تسجيل الدخول وقد تحتاج VPN/Proxy.",
    },
];
