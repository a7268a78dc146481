//! Legal-form data tables.
//!
//! Patterns are matched case-insensitively against the cleaned, lowercased
//! name and evaluated longest source first, so compound designators win over
//! the short forms they contain.

/// Abbreviations that are often typed glued to the company name.
pub const FUSED_FORM_CANDIDATES: &[&str] = &[
    "ИП ООО", "АО СП", "ОсОО", "ООО", "АО", "ИП", "ЗАО", "ПАО", "ТОО", "TOO", "ЧП", "ОАО", "ГУП",
    "МУП", "РУП", "ЧТУП", "ЧУП", "ФЛ", "Ф-Л", "СП", "LTD", "LLC", "GMBH", "CO", "SA", "SPA",
    "SRL", "JSC", "LLP", "LP", "GP", "PLC",
];

/// `(pattern, canonical code)`.
pub const LEGAL_FORM_PATTERNS: &[(&str, &str)] = &[
    // CIS, compound and spelled-out forms
    (
        r"\b(Иностранное\s+предприятие\s+общество\s+с\s+ограниченной\s+ответственностью|ИП\s+ООО)\b",
        "ИП ООО",
    ),
    (r"\b(Акционерное\s+Общество\s+Совместное\s+Предприятие|АО\s+СП)\b", "АО СП"),
    (
        r"\b(Общество\s+с\s+Ограниченной\s+Ответственностью|Общество\s+Ограниченной\s+Ответственностью|Общество\s+с\s+ограниченной\s+отстветственностью|Общество\s+с\s+ограниченной\s+ответсвенностью|OOO)\b",
        "ООО",
    ),
    (r"\b(Публичное\s+Акционерное\s+Общество)\b", "ПАО"),
    (r"\b(Закрытое\s+Акционерное\s+Общество|ЗАО)\b", "ЗАО"),
    (r"\b(Индивидуальный\s+Предприниматель)\b", "ИП"),
    (r"\b(Общество\s+с\s+Дополнительной\s+Ответственностью|ОДО)\b", "ОДО"),
    (r"\b(Федеральное\s+Государственное\s+Унитарное\s+Предприятие|ФГУП)\b", "ФГУП"),
    (r"\b(Государственное\s+Унитарное\s+Предприятие|ГУП)\b", "ГУП"),
    (r"\b(Федеральное\s+Государственное\s+Предприятие|ФГП)\b", "ФГП"),
    (r"\b(Муниципальное\s+Унитарное\s+Предприятие|МУП)\b", "МУП"),
    (r"\b(Непубличное\s+Акционерное\s+Общество|НАО)\b", "НАО"),
    (
        r"\b(Товарищество\s+с\s+Ограниченной\s+Ответственностью|Товарищество\s+с\s+Ограниченной\s+Отвественностью|ТОО|TOO)\b",
        "ТОО",
    ),
    (r"\b(Акционерное\s+Общество\s+с\s+Закрытым\s+Акционерным\s+Капиталом|АО\s+ЗАО)\b", "АО ЗАО"),
    (r"\b(Государственное\s+Предприятие|ГП)\b", "ГП"),
    (r"\b(Республиканское\s+Унитарное\s+Предприятие|РУП)\b", "РУП"),
    (r"\b(Коммерческое\s+Унитарное\s+Предприятие|КУП)\b", "КУП"),
    (r"\b(Коллективное\s+Предприятие|КП)\b", "КП"),
    (r"\b(Частное\s+Предприятие|Частное\s+Предриятие|ЧП)\b", "ЧП"),
    (r"\b(Частная\s+Компания|ЧК)\b", "ЧК"),
    // Kyrgyz forms, kept apart from ООО/АО
    (r"\b(ОсОО)\b", "ОсОО"),
    (r"\b(ААТ)\b", "ААТ"),
    (r"\b(Акционерное\s+Общество)\b", "АО"),
    (r"\b(Частное\s+торговое\s+унитарное\s+предприятие|ЧТУП)\b", "ЧТУП"),
    (r"\b(Открытое\s+акционерное\s+общество|ОАО)\b", "ОАО"),
    (r"\b(Частное\s+торгово-производственное\s+унитарное\s+предприятие|ЧТПУП)\b", "ЧТПУП"),
    (r"\b(Частное\s+производственно-торговое\s+унитарное\s+предприятие|ЧПТУП)\b", "ЧПТУП"),
    (r"\b(Частное\s+Унитарное\s+предприятие|ЧУП)\b", "ЧУП"),
    (r"\b(Иностранное\s+унитарное\s+предприятие|ИУП)\b", "ИУП"),
    (r"\b(Унитарное\s+предприятие|УП)\b", "УП"),
    (
        r"\b(Филиал\s+компании|Филиал\s+корпорации|Филиал\s+партнерства\s+с\s+ограниченной\s+ответственностью|ФИЛИАЛ|ФЛ|Ф-Л)\b",
        "ФИЛИАЛ",
    ),
    // CIS, bare abbreviations
    (r"\b(ООО|OOO)\b", "ООО"),
    (r"\b(АО)\b", "АО"),
    (r"\b(ИП)\b", "ИП"),
    (r"\b(ЧДММ)\b", "ЧДММ"),
    (r"\b(ИЧП)\b", "ИЧП"),
    // International
    (r"\b(limited\s+liability\s+company|l[.\s]*l[.\s]*c)\b", "LLC"),
    (r"\b(limited|l[.\s]*t[.\s]*d)\b", "LTD"),
    (r"\b(gesellschaft\s+mit\s+beschränkter\s+haftung|g[.\s]*m[.\s]*b[.\s]*h)\b", "GMBH"),
    (r"\b(c[.\s]*o)\b", "CO"),
    (r"\b(s[.\s]*a)\b", "SA"),
    (r"\b(s[.\s]*r[.\s]*l)\b", "SRL"),
    (r"\b(s[.\s]*p[.\s]*a)\b", "SPA"),
    (r"\b(a[.\s]*s)\b", "AS"),
    (r"\b(d[.\s]*o[.\s]*o)\b", "D.O.O."),
    (r"\b(d[.\s]*d[.\s]*o[.\s]*o)\b", "D.D.O.O."),
    (
        r"\b(s[.\s]*p[.\s]*z[.\s]*o[.\s]*o|spolka\s+z\s+oo|spolka\s+z\s+ograniczona\s+odpowiedzialnoscia)\b",
        "SP ZOO",
    ),
    (r"\b(free\s+zone\s+company|f[.\s]*z[.\s]*c)\b", "FZC"),
    (r"\b(free\s+zone\s+establishment|f[.\s]*z[.\s]*e)\b", "FZE"),
    (
        r"\b(sanayi\s+ve\s+ticaret\s+a\.?\s*s\.?|sanayi\s+ve\s+ticaret\s+a\.?\s*ş\.?)\b",
        "Sanayi ve Ticaret A.Ş.",
    ),
    (r"\b(limited\s+liability\s+partnership|l[.\s]*l[.\s]*p)\b", "LLP"),
    (r"\b(joint\s+stock\s+company|j[.\s]*s[.\s]*c)\b", "JSC"),
    (r"\b(c[.\s]*o[.\s]*r[.\s]*p|corporation)\b", "Corp."),
    (r"\b(limited\s+partnership|l[.\s]*p)\b", "LP"),
    (r"\b(general\s+partnership|g[.\s]*p)\b", "GP"),
    (r"\b(sole\s+prop\.|sole\s+proprietorship|s[.\s]*p)\b", "Sole prop."),
    (r"\b(nonprofit\s+corp\.|nonprofit\s+corporation)\b", "Nonprofit corp."),
    (r"\b(public\s+limited\s+company|p[.\s]*l[.\s]*c)\b", "PLC"),
    (r"\b(sole\s+trader)\b", "Sole Trader"),
    (r"\b(one\s+person\s+company|o[.\s]*p[.\s]*c)\b", "OPC"),
    (r"\b(incorporated|i[.\s]*n[.\s]*c)\b", "INC"),
    (r"\b(s[.\s]*i[.\s]*a)\b", "SIA"),
    (r"\b(s[.\s]*r[.\s]*o)\b", "SRO"),
    (r"\b(s[.\s]*l)\b", "SL"),
    (r"\b(u[.\s]*a[.\s]*b)\b", "UAB"),
    (r"\b(a[.\s]*g)\b", "AG"),
    (r"\b(m[.\s]*c[.\s]*h[.\s]*j)\b", "MCHJ"),
    (r"\b(c[.\s]*j[.\s]*s[.\s]*c)\b", "CJSC"),
    (r"\b(s[.\s]*t[.\s]*i)\b", "STI"),
];

/// Markers after which the real party name follows ("on behalf of").
pub const ON_BEHALF_MARKERS: &[&str] = &[
    "по поручению",
    "по поруч",
    "по пручению",
    "для",
    "for",
    "b/o",
    "by order",
    "by",
];

/// Markers before which the real party name stands ("via").
pub const VIA_MARKERS: &[&str] = &["через"];
