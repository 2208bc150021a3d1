//! English inflection rules used to derive model names, parameter keys and
//! binding names from declared identifiers.
//!
//! Rules are ordered by priority: the first matching rule wins.

use heck::{ToSnakeCase, ToUpperCamelCase};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLURALS: Vec<(Regex, &'static str)> = rules(&[
        (r"(quiz)$", "${1}zes"),
        (r"^(oxen)$", "${1}"),
        (r"^(ox)$", "${1}en"),
        (r"^(m|l)ice$", "${1}ice"),
        (r"^(m|l)ouse$", "${1}ice"),
        (r"(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        (r"(x|ch|ss|sh)$", "${1}es"),
        (r"([^aeiouy]|qu)y$", "${1}ies"),
        (r"(hive)$", "${1}s"),
        (r"(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        (r"sis$", "ses"),
        (r"([ti])a$", "${1}a"),
        (r"([ti])um$", "${1}a"),
        (r"(buffal|tomat)o$", "${1}oes"),
        (r"(bu)s$", "${1}ses"),
        (r"(alias|status)$", "${1}es"),
        (r"(octop|vir)i$", "${1}i"),
        (r"(octop|vir)us$", "${1}i"),
        (r"^(ax|test)is$", "${1}es"),
        (r"s$", "s"),
        (r"$", "s"),
    ]);
    static ref SINGULARS: Vec<(Regex, &'static str)> = rules(&[
        (r"(database)s$", "${1}"),
        (r"(quiz)zes$", "${1}"),
        (r"(matr)ices$", "${1}ix"),
        (r"(vert|ind)ices$", "${1}ex"),
        (r"^(ox)en", "${1}"),
        (r"(alias|status)(es)?$", "${1}"),
        (r"(octop|vir)(us|i)$", "${1}us"),
        (r"^(a)x[ie]s$", "${1}xis"),
        (r"(cris|test)(is|es)$", "${1}is"),
        (r"(shoe)s$", "${1}"),
        (r"(o)es$", "${1}"),
        (r"(bus)(es)?$", "${1}"),
        (r"^(m|l)ice$", "${1}ouse"),
        (r"(x|ch|ss|sh)es$", "${1}"),
        (r"(m)ovies$", "${1}ovie"),
        (r"(s)eries$", "${1}eries"),
        (r"([^aeiouy]|qu)ies$", "${1}y"),
        (r"([lr])ves$", "${1}f"),
        (r"(tive)s$", "${1}"),
        (r"(hive)s$", "${1}"),
        (r"([^f])ves$", "${1}fe"),
        (r"(^analy)(sis|ses)$", "${1}sis"),
        (
            r"((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(sis|ses)$",
            "${1}sis",
        ),
        (r"([ti])a$", "${1}um"),
        (r"(n)ews$", "${1}ews"),
        (r"(ss)$", "${1}"),
        (r"s$", ""),
    ]);
    static ref IRREGULAR_PLURALS: Vec<(Regex, &'static str)> = rules(&[
        (r"(p)eople$", "${1}eople"),
        (r"(m)en$", "${1}en"),
        (r"(c)hildren$", "${1}hildren"),
        (r"(s)exes$", "${1}exes"),
        (r"(m)oves$", "${1}oves"),
        (r"(z)ombies$", "${1}ombies"),
        (r"(p)erson$", "${1}eople"),
        (r"(m)an$", "${1}en"),
        (r"(c)hild$", "${1}hildren"),
        (r"(s)ex$", "${1}exes"),
        (r"(m)ove$", "${1}oves"),
        (r"(z)ombie$", "${1}ombies"),
    ]);
    static ref IRREGULAR_SINGULARS: Vec<(Regex, &'static str)> = rules(&[
        (r"(p)erson$", "${1}erson"),
        (r"(m)an$", "${1}an"),
        (r"(c)hild$", "${1}hild"),
        (r"(s)ex$", "${1}ex"),
        (r"(m)ove$", "${1}ove"),
        (r"(z)ombie$", "${1}ombie"),
        (r"(p)eople$", "${1}erson"),
        (r"(m)en$", "${1}an"),
        (r"(c)hildren$", "${1}hild"),
        (r"(s)exes$", "${1}ex"),
        (r"(m)oves$", "${1}ove"),
        (r"(z)ombies$", "${1}ombie"),
    ]);
}

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

fn rules(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, replacement)| {
            let regex = Regex::new(&format!("(?i){}", pattern)).expect("invalid inflection rule");
            (regex, *replacement)
        })
        .collect()
}

fn is_uncountable(word: &str) -> bool {
    let last = word
        .rsplit(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .unwrap_or(word)
        .to_ascii_lowercase();
    UNCOUNTABLE.contains(&last.as_str())
}

fn apply(word: &str, irregulars: &[(Regex, &str)], rules: &[(Regex, &str)]) -> String {
    if word.is_empty() || is_uncountable(word) {
        return word.to_owned();
    }
    irregulars
        .iter()
        .chain(rules.iter())
        .find(|(regex, _)| regex.is_match(word))
        .map_or_else(
            || word.to_owned(),
            |(regex, replacement)| regex.replace(word, *replacement).into_owned(),
        )
}

/// Returns the plural form of `word`. Plural input stays plural.
pub fn pluralize(word: &str) -> String {
    apply(word, &IRREGULAR_PLURALS, &PLURALS)
}

/// Returns the singular form of `word`. Singular input stays singular.
pub fn singularize(word: &str) -> String {
    apply(word, &IRREGULAR_SINGULARS, &SINGULARS)
}

/// Makes an underscored, lowercase form from a camel-cased name;
/// `::` namespace separators become `/`.
///
/// `underscore("Lottery::PrizeDraw") == "lottery/prize_draw"`
pub fn underscore(word: &str) -> String {
    word.replace("::", "/")
        .split('/')
        .map(|segment| segment.to_snake_case())
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`underscore`]: `camelize("lottery/prize_draw") == "Lottery::PrizeDraw"`.
pub fn camelize(word: &str) -> String {
    word.split('/')
        .map(|segment| segment.to_upper_camel_case())
        .collect::<Vec<_>>()
        .join("::")
}

/// Model name for a (possibly plural, possibly namespaced) identifier.
///
/// `classify("lottery/assignments") == "Lottery::Assignment"`
pub fn classify(identifier: &str) -> String {
    let identifier = identifier.rsplit('.').next().unwrap_or(identifier);
    camelize(&singularize(identifier))
}

/// Strips the namespace: `demodulize("Lottery::Assignment") == "Assignment"`.
pub fn demodulize(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Namespace-flattened parameter key for a model name.
///
/// `var_name("Lottery::Assignment") == "lottery_assignment"`
pub fn var_name(name: &str) -> String {
    underscore(name).replace('/', "_")
}
