//! Key and synonym dictionaries for attribute extraction.

use serde::{Deserialize, Serialize};

/// A canonical label and the surface forms that map to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub label: String,
    pub synonyms: Vec<String>,
}

impl SynonymGroup {
    fn new(label: &str, synonyms: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// All dictionaries used by [`crate::AttributeExtractor`].
///
/// Order matters everywhere: keys and groups are tried first to last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeTables {
    pub diameter_keys: Vec<String>,
    pub pressure_keys: Vec<String>,
    pub materials: Vec<SynonymGroup>,
    pub product_subtypes: Vec<SynonymGroup>,
    pub seal_types: Vec<SynonymGroup>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AttributeTables {
    fn default() -> Self {
        Self {
            diameter_keys: strings(&[
                "ду", "dn", "дн", "диаметр", "внешний диаметр", "diameter", "du", "диаметром",
                "dn=", "ø", "ду=", "дн=",
            ]),
            pressure_keys: strings(&[
                "ру", "pn", "давление", "условное давление", "pressure", "nominal pressure",
                "давлением", "pn=", "ру=",
            ]),
            materials: vec![
                SynonymGroup::new(
                    "Нержавеющая сталь",
                    &[
                        "нержавеющая сталь", "нержавеющей стали", "aisi 304", "aisi 316",
                        "aisi304", "aisi316", "12х18н10т", "12x18h10t", "08х18н10", "ss316",
                        "ss304", "корозионностойкий", "корозионностойкая", "корозионностойкой",
                        "cf8m",
                    ],
                ),
                SynonymGroup::new(
                    "Углеродистая сталь",
                    &["сталь 20", "углеродистая сталь", "углеродистой стали"],
                ),
                SynonymGroup::new(
                    "Легированная сталь",
                    &["09г2с", "легированная сталь", "легированной стали"],
                ),
                SynonymGroup::new(
                    "Чугун",
                    &[
                        "чугун", "чугунный", "чугуна", "чугунным", "чуг", "ggg40", "gg40",
                        "gjs400", "gs-400", "ggg50", "gg50", "gg25", "32ч24р", "ci/cd",
                    ],
                ),
            ],
            product_subtypes: vec![
                SynonymGroup::new(
                    "Трехэксцентриковый",
                    &[
                        "трехэксцентриковый", "треxэксцентриковые", "треxэксцентриковый",
                        "трехэксцентриковые", "трехэкс", "тройным эксцентриком",
                        "тройным эксцентриситетом", "тройным экcцентриситетом",
                        "тройным смещением диска", "3х-эксц", "3-х эксцентриковый",
                        "triple offset", "triple eccentric", "3/эксц",
                    ],
                ),
                SynonymGroup::new(
                    "Двухэксцентриковый",
                    &[
                        "двухэксцентриковый", "двухэксцентриковые", "двухэкс",
                        "двойным эксцентриком", "двойным эксцентриситетом",
                        "двойным смещением диска", "2х-эксц", "double offset",
                        "double eccentric", "2/эксц",
                    ],
                ),
                SynonymGroup::new(
                    "Безэксцентриковый",
                    &[
                        "безэксцентриковый", "безэкс", "осевой", "бабочка", "без смещения диска",
                        "no offset", "без эксцентриситета", "центрический",
                    ],
                ),
                SynonymGroup::new(
                    "Межфланцевый",
                    &[
                        "межфланцевый", "wafer", "lug", "32ч24р", "межфланцевые", "межфланцевой",
                        "межфланц",
                    ],
                ),
            ],
            seal_types: vec![
                SynonymGroup::new(
                    "Металл-Металл",
                    &["металл по металлу", "металл-металл", "metal to metal"],
                ),
                SynonymGroup::new("EPDM", &["epdm"]),
                SynonymGroup::new("ТРГ", &["трг", "терморасширенный графит", "teg"]),
                SynonymGroup::new("Резина", &["резина"]),
                SynonymGroup::new("NBR", &["nbr", "каучук"]),
            ],
        }
    }
}
