//! Quick-reply suggestions offered after an answer.

use super::language::Language;

/// Upper bound on suggestions returned for a turn.
pub const MAX_SUGGESTIONS: usize = 5;

const REGISTRATION_EN: &[&str] = &[
    "What is the add/drop deadline?",
    "How do I check my registration window?",
    "I have a registration hold",
];
const REGISTRATION_AR: &[&str] = &[
    "آخر موعد للإضافة والحذف؟",
    "كيف أعرف نافذة التسجيل حقي؟",
    "عندي حظر يمنع التسجيل",
];

const EXAMS_EN: &[&str] = &[
    "Where can I find the exam timetable?",
    "I have an exam conflict",
    "I missed an exam, what should I do?",
];
const EXAMS_AR: &[&str] = &[
    "وين ألقى جدول الامتحانات؟",
    "عندي تعارض امتحانين",
    "فاتني الاختبار، وش أسوي؟",
];

const GPA_EN: &[&str] = &[
    "Calculate my semester GPA",
    "How can I raise my GPA?",
    "Does repeating a course affect GPA?",
];
const GPA_AR: &[&str] = &[
    "احسب معدلي الفصلي",
    "كيف أرفع معدلي؟",
    "هل إعادة المادة تؤثر؟",
];

const LIBRARY_EN: &[&str] = &[
    "Off-campus journal access",
    "I get 'Access denied'",
    "Do I need a VPN?",
];
const LIBRARY_AR: &[&str] = &[
    "الوصول للمجلات من البيت",
    "يطلع لي Access denied",
    "هل أحتاج VPN؟",
];

const DEFAULT_EN: &[&str] = &[
    "When does registration open?",
    "How do I contact my advisor?",
    "How is my grade calculated?",
];
const DEFAULT_AR: &[&str] = &[
    "متى يبدأ التسجيل؟",
    "كيف أحجز موعد إرشاد؟",
    "سياسة الدرجات",
];

/// Follow-up prompts for a resolved tag, in the reply language.
pub fn suggestions_for(tag: &str, lang: Language) -> Vec<&'static str> {
    let (en, ar) = match tag {
        "course_registration_deadline" | "course_registration_add_drop" => {
            (REGISTRATION_EN, REGISTRATION_AR)
        }
        "exam_schedule" | "exam_conflict" | "exam_makeup" => (EXAMS_EN, EXAMS_AR),
        "gpa_calculation" => (GPA_EN, GPA_AR),
        "library_access" => (LIBRARY_EN, LIBRARY_AR),
        _ => (DEFAULT_EN, DEFAULT_AR),
    };
    let list = match lang {
        Language::English => en,
        Language::Arabic => ar,
    };
    list.iter().take(MAX_SUGGESTIONS).copied().collect()
}
