//! Field value generation: turns a [`FieldDescriptor`] into a template node.
//!
//! Scalar kinds become [`Placeholder`]s, resolved to concrete values when the
//! template is materialized. Objects and templated arrays become nested record
//! templates. Item-based arrays are generated immediately and returned as a
//! literal array.

use chrono::{DateTime, Utc};
use fake::faker::internet::en::{DomainSuffix, SafeEmail, IPv4, IPv6};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::Name;
use fake::faker::name::zh_cn::Name as ChineseName;
use fake::Fake;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};

use super::pattern;
use super::template::{record_template, Template};
use crate::domain::field::{DEFAULT_CWORD_LENGTH, DEFAULT_STRING_LENGTH};
use crate::domain::{ArrayShape, FieldDescriptor, IpVersion, Locale, StringFormat};

const PHONE_PATTERN: &str = r"1[3-9]\d{9}";
const ID_CARD_PATTERN: &str = r"\d{17}[0-9X]";
const MAC_PATTERN: &str = r"\X{2}:\X{2}:\X{2}:\X{2}:\X{2}:\X{2}";
const MAX_DECIMAL_PLACES: u32 = 10;

const IMAGE_SIZES: &[&str] = &[
    "300x250", "250x250", "240x400", "336x280", "180x150", "720x300", "468x60", "234x60",
    "120x90", "125x125", "728x90", "160x600", "300x600",
];

const COMMON_HAN: &str = "的一是在不了有和人这中大为上个国我以要他时来用们生到作地于出就分对成会可主发年动同工也能下过子说产种面而方后多定行学法所民得经十三之进着等部度家电力里如水化高自二理起小物现实加量都两体制机当使点从业本去把性好应开它合还因由其些然前外天政四日那社义事平形相全表间样与关各重新线内数正心反你明看原又么利比或但质气第向道命此变条只没结解问意建月公无系军很情者最立代想已通并提直题党程展五果料象员革位入常文总次品式活设及管特件长求老头基资边流路级少图山统接知较将组见计别她手角期根论运农指几九区强放决西被干做必战先回则任取据处队南给色光门即保治北造百规热领七海口东导器压志世金增争济阶油思术极交受联什认六共权收证改清己美再采转更单风切打白教速花带安场身车例真务具万每目至达走积示议声报斗完类八离华名确才科张信马节话米整空元况今集温传土许步群广石记需段研界拉林律叫且究观越织装影算低持音众书布复容儿须际商非验连断深难近矿千周委素技备半办青省列习响约支般史感劳便团往酸历市克何除消构府称太准精值号率族维划选标写存候毛亲快效斯院查江型眼王按格养易置派层片始却专状育厂京识适属圆包火住调满县局照参红细引听该铁价严";

/// A scalar value still to be drawn
#[derive(Debug, Clone, PartialEq)]
pub enum Placeholder {
    Str { length: usize },
    ChineseWords { min: usize, max: usize },
    Email,
    Integer { min: i64, max: i64 },
    Float { min: f64, max: f64, dmin: u32, dmax: u32 },
    Boolean,
    Date { format: String },
    Url,
    Color,
    Image,
    Guid,
    Name(Locale),
    Title,
    Sentence,
    ChineseSentence,
    Paragraph,
    ChineseParagraph,
    Pattern(&'static str),
    Ip(IpVersion),
    Pick(Vec<Value>),
    Null,
}

impl Placeholder {
    pub fn render<R: Rng>(&self, rng: &mut R) -> Value {
        match self {
            Placeholder::Str { length } => {
                let s: String = (0..*length)
                    .map(|_| rng.sample(Alphanumeric) as char)
                    .collect();
                json!(s)
            }
            Placeholder::ChineseWords { min, max } => json!(chinese_words(*min, *max, rng)),
            Placeholder::Email => json!(SafeEmail().fake_with_rng::<String, _>(rng)),
            Placeholder::Integer { min, max } => {
                let (lo, hi) = ordered(*min, *max);
                json!(rng.gen_range(lo..=hi))
            }
            Placeholder::Float {
                min,
                max,
                dmin,
                dmax,
            } => json!(random_float(*min, *max, *dmin, *dmax, rng)),
            Placeholder::Boolean => json!(rng.gen_bool(0.5)),
            Placeholder::Date { format } => random_date(format, rng),
            Placeholder::Url => {
                let host: String = Word().fake_with_rng(rng);
                let suffix: String = DomainSuffix().fake_with_rng(rng);
                let path: String = Word().fake_with_rng(rng);
                json!(format!("http://{}.{}/{}", host, suffix, path))
            }
            Placeholder::Color => json!(format!("#{:06x}", rng.gen_range(0..=0xFF_FFFFu32))),
            Placeholder::Image => {
                let size = IMAGE_SIZES.choose(rng).copied().unwrap_or("300x250");
                let bg = format!("{:06x}", rng.gen_range(0..=0xFF_FFFFu32));
                json!(format!("http://dummyimage.com/{}/{}", size, bg))
            }
            Placeholder::Guid => {
                let bytes: [u8; 16] = rng.gen();
                json!(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            Placeholder::Name(Locale::Zh) => json!(ChineseName().fake_with_rng::<String, _>(rng)),
            Placeholder::Name(Locale::En) => json!(Name().fake_with_rng::<String, _>(rng)),
            Placeholder::Title => {
                let words: Vec<String> = Words(3..8).fake_with_rng(rng);
                let title: Vec<String> = words.iter().map(|w| capitalize(w)).collect();
                json!(title.join(" "))
            }
            Placeholder::Sentence => json!(Sentence(12..19).fake_with_rng::<String, _>(rng)),
            Placeholder::ChineseSentence => json!(chinese_sentence(rng)),
            Placeholder::Paragraph => json!(Paragraph(3..8).fake_with_rng::<String, _>(rng)),
            Placeholder::ChineseParagraph => {
                let n = rng.gen_range(3..=7);
                let text: String = (0..n).map(|_| chinese_sentence(rng)).collect();
                json!(text)
            }
            Placeholder::Pattern(p) => json!(pattern::expand(p, rng)),
            Placeholder::Ip(IpVersion::V4) => json!(IPv4().fake_with_rng::<String, _>(rng)),
            Placeholder::Ip(IpVersion::V6) => json!(IPv6().fake_with_rng::<String, _>(rng)),
            Placeholder::Pick(choices) => choices.choose(rng).cloned().unwrap_or(Value::Null),
            Placeholder::Null => Value::Null,
        }
    }
}

/// Maps field descriptors to template nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGenerator;

impl FieldGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn template_for<R: Rng>(&self, field: &FieldDescriptor, rng: &mut R) -> Template {
        let placeholder = match field {
            FieldDescriptor::Enum(choices) => Placeholder::Pick(choices.clone()),
            FieldDescriptor::String {
                length,
                format,
                locale,
            } => match (format, locale) {
                (StringFormat::Email, _) => Placeholder::Email,
                (_, Some(Locale::Zh)) => {
                    let n = length.unwrap_or(DEFAULT_CWORD_LENGTH);
                    Placeholder::ChineseWords { min: n, max: n }
                }
                _ => Placeholder::Str {
                    length: length.unwrap_or(DEFAULT_STRING_LENGTH),
                },
            },
            FieldDescriptor::Number { min, max } => Placeholder::Integer {
                min: *min,
                max: *max,
            },
            FieldDescriptor::Float {
                min,
                max,
                dmin,
                dmax,
            } => Placeholder::Float {
                min: *min,
                max: *max,
                dmin: *dmin,
                dmax: *dmax,
            },
            FieldDescriptor::Boolean => Placeholder::Boolean,
            FieldDescriptor::Date { format } => Placeholder::Date {
                format: format.clone(),
            },
            FieldDescriptor::Url => Placeholder::Url,
            FieldDescriptor::Color => Placeholder::Color,
            FieldDescriptor::Image => Placeholder::Image,
            FieldDescriptor::Identifier => Placeholder::Guid,
            FieldDescriptor::Name { locale } => {
                Placeholder::Name(locale.unwrap_or(Locale::Zh))
            }
            FieldDescriptor::Title { locale } => match locale {
                Some(Locale::Zh) => Placeholder::ChineseWords { min: 3, max: 7 },
                _ => Placeholder::Title,
            },
            FieldDescriptor::Sentence { locale } => match locale {
                Some(Locale::Zh) => Placeholder::ChineseSentence,
                _ => Placeholder::Sentence,
            },
            FieldDescriptor::Paragraph { locale } => match locale {
                Some(Locale::Zh) => Placeholder::ChineseParagraph,
                _ => Placeholder::Paragraph,
            },
            FieldDescriptor::Phone => Placeholder::Pattern(PHONE_PATTERN),
            FieldDescriptor::IdCard => Placeholder::Pattern(ID_CARD_PATTERN),
            FieldDescriptor::Ip(version) => Placeholder::Ip(*version),
            FieldDescriptor::MacAddress => Placeholder::Pattern(MAC_PATTERN),
            FieldDescriptor::Object(fields) => return record_template(self, fields, rng),
            FieldDescriptor::Array(shape) => return self.array_template(shape, rng),
            FieldDescriptor::Unknown(_) => Placeholder::Null,
        };
        Template::Placeholder(placeholder)
    }

    fn array_template<R: Rng>(&self, shape: &ArrayShape, rng: &mut R) -> Template {
        match shape {
            ArrayShape::Records { fields, length } => Template::List(
                (0..*length)
                    .map(|_| record_template(self, fields, rng))
                    .collect(),
            ),
            ArrayShape::Items { item, long } => {
                let values = (0..*long)
                    .map(|_| self.template_for(item, rng).materialize(rng))
                    .collect();
                Template::Literal(Value::Array(values))
            }
            ArrayShape::Empty => Template::Literal(Value::Array(Vec::new())),
        }
    }

    /// Generate one concrete value for a descriptor
    pub fn value_for<R: Rng>(&self, field: &FieldDescriptor, rng: &mut R) -> Value {
        self.template_for(field, rng).materialize(rng)
    }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn random_float<R: Rng>(min: f64, max: f64, dmin: u32, dmax: u32, rng: &mut R) -> f64 {
    let (lo, hi) = ordered(min, max);
    let (dlo, dhi) = ordered(dmin.min(MAX_DECIMAL_PLACES), dmax.min(MAX_DECIMAL_PLACES));
    let places = rng.gen_range(dlo..=dhi);
    // interpolate so spans wider than f64::MAX stay finite
    let t: f64 = rng.gen();
    let raw = if lo < hi { lo * (1.0 - t) + hi * t } else { lo };
    let factor = 10f64.powi(places as i32);
    let scaled = raw * factor;
    let rounded = if scaled.is_finite() { scaled.round() / factor } else { raw };
    rounded.clamp(lo, hi)
}

fn chinese_words<R: Rng>(min: usize, max: usize, rng: &mut R) -> String {
    let pool: Vec<char> = COMMON_HAN.chars().collect();
    let (lo, hi) = ordered(min, max);
    let n = rng.gen_range(lo..=hi);
    (0..n).filter_map(|_| pool.choose(rng)).collect()
}

fn chinese_sentence<R: Rng>(rng: &mut R) -> String {
    let mut s = chinese_words(12, 18, rng);
    s.push('。');
    s
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn random_date<R: Rng>(format: &str, rng: &mut R) -> Value {
    let latest = Utc::now().timestamp().max(1);
    let secs = rng.gen_range(0..latest);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| json!(dt.format(&to_strftime(format)).to_string()))
        .unwrap_or(Value::Null)
}

/// Translate a `yyyy-MM-dd HH:mm:ss` style pattern into a chrono format string
pub fn to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let spec = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', _) => Some("%m"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('S', _) => Some("%3f"),
            ('A', _) => Some("%p"),
            ('a', _) => Some("%P"),
            _ => None,
        };

        match spec {
            Some(s) => out.push_str(s),
            None => {
                for _ in 0..run {
                    if c == '%' {
                        out.push_str("%%");
                    } else {
                        out.push(c);
                    }
                }
            }
        }
        i += run;
    }

    out
}
