//! Scalar field extraction via ordered pattern rules.
//!
//! Each field owns a list of rules tried in priority order: labeled rules
//! ("Property Manager: X") first, bare heuristics last. The first rule whose
//! capture cleans to a non-empty value wins. Fields are independent of each
//! other, so a miss on one never blocks another.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use roofscan_core::text::{collapse_whitespace, truncate_chars};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Longest value kept for a free-text field.
const MAX_FIELD_LEN: usize = 150;

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

static DATE: Lazy<String> = Lazy::new(|| {
    format!(
        r"(?:{m}[ \t]+\d{{1,2}}(?:st|nd|rd|th)?,?[ \t]+\d{{4}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|\d{{1,2}}-\d{{1,2}}-\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}})",
        m = MONTH
    )
});

const PHONE: &str = r"(\(?\d{3}\)?[ .\-]?\d{3}[ .\-]\d{4})";

/// Scalar fields pulled from a report. Empty string / zero means "not found".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFields {
    pub property_name: String,
    pub address: String,
    pub client: String,
    pub property_manager_name: String,
    pub property_manager_phone: String,
    pub market: String,
    pub report_type: String,
    pub report_date: String,
    pub inspecting_company: String,
    /// Square feet.
    pub roof_area: u64,
    pub roof_system: String,
    pub manufacturer: String,
    pub warranty: String,
    pub warranty_expiration: String,
    pub installing_contractor: String,
}

/// Text fields with their own rule lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PropertyName,
    Address,
    Client,
    PropertyManagerName,
    PropertyManagerPhone,
    Market,
    ReportType,
    ReportDate,
    InspectingCompany,
    RoofSystem,
    Manufacturer,
    Warranty,
    WarrantyExpiration,
    InstallingContractor,
}

/// One pattern rule. Capture group 1 holds the value.
#[derive(Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub pattern: Regex,
    /// Applied to the parsed number (roof area rules only).
    pub multiplier: u64,
}

impl FieldRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self::scaled(name, pattern, 1)
    }

    fn scaled(name: &'static str, pattern: &str, multiplier: u64) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("field rule pattern must compile"),
            multiplier,
        }
    }

    /// A `Label: value` rule. Labels may start a line or follow a column gap.
    fn labeled(name: &'static str, labels: &str) -> Self {
        Self::new(
            name,
            &format!(r"(?im)(?:^|[ \t]{{3,}}|\t)[ \t]*(?:{})[ \t]*[:#][ \t]*(.+)$", labels),
        )
    }

    /// Cleaned capture of the first match, if any.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = clean_value(caps.get(1)?.as_str());
        (!value.is_empty()).then_some(value)
    }
}

static FIELD_RULES: Lazy<HashMap<Field, Vec<FieldRule>>> = Lazy::new(|| {
    let date = DATE.as_str();
    let mut m = HashMap::new();

    m.insert(
        Field::PropertyName,
        vec![
            FieldRule::labeled(
                "property_label",
                r"property[ \t]+name|property|building[ \t]+name|building|facility[ \t]+name|facility|site[ \t]+name|project[ \t]+name|project",
            ),
            FieldRule::new(
                "report_for_title",
                r"(?im)^[ \t]*(?:roof[ \t]+)?(?:inspection|assessment|survey)[ \t]+(?:report[ \t]+)?(?:for|of)[ \t]*:?[ \t]*(.+)$",
            ),
            FieldRule::new(
                "dashed_title",
                r"(?im)^[ \t]*(\S.{2,79}?)[ \t]+[-–—][ \t]+(?:roof[ \t]+)?(?:inspection|assessment|survey|condition)\b",
            ),
        ],
    );

    m.insert(
        Field::Address,
        vec![
            FieldRule::labeled(
                "address_label",
                r"property[ \t]+address|site[ \t]+address|street[ \t]+address|property[ \t]+location|site[ \t]+location|address",
            ),
            FieldRule::new(
                "street_address",
                r"(?i)\b(\d{2,6}[ \t]+(?:[a-z0-9.]+[ \t]+){0,4}?(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|parkway|pkwy|highway|hwy|court|ct|place|pl|circle|cir|freeway|fwy|trail|trl)\.?(?:,?[ \t]+(?:suite|ste\.?|#)[ \t]*[a-z0-9\-]+)?(?:,[ \t]*[a-z .]+,[ \t]*[a-z]{2}[ \t]+\d{5}(?:-\d{4})?)?)\b",
            ),
        ],
    );

    m.insert(
        Field::Client,
        vec![FieldRule::labeled(
            "client_label",
            r"client[ \t]+name|client|prepared[ \t]+for|customer|owner",
        )],
    );

    m.insert(
        Field::PropertyManagerName,
        vec![FieldRule::new(
            "manager_label",
            r"(?im)(?:^|[ \t]{3,}|\t)[ \t]*(?:property[ \t]+manager|building[ \t]+manager|site[ \t]+contact|contact)(?:[ \t]+name)?[ \t]*:[ \t]*([a-z][a-z.'\- ]*[a-z.])",
        )],
    );

    m.insert(
        Field::PropertyManagerPhone,
        vec![
            FieldRule::new(
                "manager_line_phone",
                &format!(
                    r"(?i)(?:property[ \t]+manager|building[ \t]+manager|site[ \t]+contact|contact)[^\n]*?{}",
                    PHONE
                ),
            ),
            FieldRule::new(
                "phone_label",
                &format!(
                    r"(?im)^[ \t]*(?:manager[ \t]+phone|pm[ \t]+phone|contact[ \t]+phone|phone|tel(?:ephone)?)[ \t]*[:.#]?[ \t]*{}",
                    PHONE
                ),
            ),
        ],
    );

    m.insert(
        Field::Market,
        vec![FieldRule::labeled(
            "market_label",
            r"market[ \t]+area|market|region|territory",
        )],
    );

    m.insert(
        Field::ReportType,
        vec![
            FieldRule::labeled(
                "report_type_label",
                r"report[ \t]+type|inspection[ \t]+type|type[ \t]+of[ \t]+inspection|type[ \t]+of[ \t]+report",
            ),
            FieldRule::new(
                "caps_title",
                r"(?m)^[ \t]*([A-Z][A-Z0-9 /&\-]*(?:INSPECTION|ASSESSMENT|SURVEY)(?:[ \t]+REPORT)?)[ \t]*$",
            ),
            FieldRule::new(
                "report_title",
                r"(?im)^[ \t]*((?:[a-z\-]+[ \t]+){0,4}(?:inspection|assessment|survey)[ \t]+report)[ \t]*$",
            ),
        ],
    );

    m.insert(
        Field::ReportDate,
        vec![
            FieldRule::labeled(
                "report_date_label",
                r"report[ \t]+date|inspection[ \t]+date|date[ \t]+of[ \t]+inspection|date[ \t]+inspected|date[ \t]+of[ \t]+report|date",
            ),
            FieldRule::new("first_date", &format!(r"(?i)\b({})", date)),
        ],
    );

    m.insert(
        Field::InspectingCompany,
        vec![
            FieldRule::labeled(
                "company_label",
                r"inspecting[ \t]+company|inspection[ \t]+company|inspected[ \t]+by|prepared[ \t]+by|inspector|consultant",
            ),
            FieldRule::new(
                "company_name",
                r"\b([A-Z][A-Za-z&'.\-]*(?:[ \t]+[A-Z&][A-Za-z&'.\-]*){0,4}[ \t]+(?:Roofing|Roof[ \t]+Consultants|Consultants|Consulting|Engineering|Inspections|Inspection[ \t]+Services|Building[ \t]+Sciences?)(?:,?[ \t]+(?:LLC|Inc\.?|Corp\.?|Co\.?|Ltd\.?))?)",
            ),
        ],
    );

    m.insert(
        Field::RoofSystem,
        vec![
            FieldRule::labeled(
                "roof_system_label",
                r"roof[ \t]+system|roof[ \t]+type|roofing[ \t]+system|system[ \t]+type|membrane[ \t]+type|roof[ \t]+covering",
            ),
            FieldRule::new(
                "known_system",
                r"(?i)\b(TPO|EPDM|PVC|modified[ \t]+bitumen|mod[ \t]+bit|built[ \t\-]up(?:[ \t]+roof)?|BUR|standing[ \t]+seam(?:[ \t]+metal)?|metal[ \t]+(?:panel|roof)|asphalt[ \t]+shingles?|spray[ \t]+(?:polyurethane[ \t]+)?foam|SPF|coal[ \t]+tar[ \t]+pitch|clay[ \t]+tile|concrete[ \t]+tile|slate)\b",
            ),
        ],
    );

    m.insert(
        Field::Manufacturer,
        vec![
            FieldRule::labeled(
                "manufacturer_label",
                r"membrane[ \t]+manufacturer|roof[ \t]+manufacturer|manufacturer|mfr\.?",
            ),
            FieldRule::new(
                "known_brand",
                r"(?i)\b(GAF|Carlisle(?:[ \t]+SynTec)?|Firestone|Johns[ \t]+Manville|Sika[ \t]+Sarnafil|Sarnafil|Versico|Duro-Last|Mule-Hide|Tremco|Garland|CertainTeed|Owens[ \t]+Corning|IKO|Siplast|Soprema|Polyglass|GenFlex)\b",
            ),
        ],
    );

    m.insert(
        Field::Warranty,
        vec![
            FieldRule::labeled(
                "warranty_label",
                r"warranty[ \t]+type|warranty[ \t]+information|warranty[ \t]+info|warranty[ \t]+status|warranty",
            ),
            FieldRule::new(
                "term_warranty",
                r"(?i)\b(\d{1,2}[ \t\-]*(?:year|yr)[ \t\-]+(?:[a-z']+[ \t]+){0,3}warranty)\b",
            ),
            FieldRule::new(
                "kind_warranty",
                r"(?i)\b((?:NDL|no[ \t]+dollar[ \t]+limit|manufacturer'?s?|system|labor|material)[ \t]+warranty)\b",
            ),
        ],
    );

    m.insert(
        Field::WarrantyExpiration,
        vec![
            FieldRule::labeled(
                "expiration_label",
                r"warranty[ \t]+expiration(?:[ \t]+date)?|warranty[ \t]+expires|expiration[ \t]+date|expiration",
            ),
            FieldRule::new(
                "warranty_through",
                &format!(
                    r"(?i)warranty[^\n.]{{0,80}}?(?:expires?|expiring|expiration|valid[ \t]+(?:through|until)|through|until|thru)[ \t]*(?:on)?[ \t]*:?[ \t]*({}|\d{{4}})",
                    date
                ),
            ),
        ],
    );

    m.insert(
        Field::InstallingContractor,
        vec![
            FieldRule::labeled(
                "contractor_label",
                r"installing[ \t]+contractor|installer|installed[ \t]+by|roofing[ \t]+contractor|repairing[ \t]+contractor|repaired[ \t]+by|contractor",
            ),
            FieldRule::new(
                "installed_by",
                r"(?m)(?i:installed|repaired|replaced)[ \t]+by[ \t]+([A-Z][A-Za-z0-9&'\-]*(?:[ \t]+[A-Z&][A-Za-z0-9&'.\-]*)*)",
            ),
        ],
    );

    m
});

static ROOF_AREA_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        // "Roof Area 1 - North" names a section, so a bare number after the
        // label needs a colon or a unit to count as an area.
        FieldRule::new(
            "area_label",
            r"(?i)(?:total[ \t]+)?(?:roof[ \t]+area|roof[ \t]+size|square[ \t]+footage|total[ \t]+area)[ \t]*(?:\(sq\.?[ \t]*ft\.?\))?[ \t]*:[ \t]*(?:approx(?:imately|\.)?[ \t]*)?(\d[\d,]*(?:\.\d+)?)",
        ),
        FieldRule::new(
            "area_label_unit",
            r"(?i)(?:total[ \t]+)?(?:roof[ \t]+area|roof[ \t]+size|square[ \t]+footage|total[ \t]+area)[ \t]*-?[ \t]*(?:approx(?:imately|\.)?[ \t]*)?(\d[\d,]*(?:\.\d+)?)[ \t]*(?:sq\.?[ \t]*ft\.?|square[ \t]+feet|sf)\b",
        ),
        FieldRule::new(
            "square_feet",
            r"(?i)\b(\d[\d,]{2,}(?:\.\d+)?)[ \t]*(?:sq\.?[ \t]*ft\.?|square[ \t]+feet|sf)\b",
        ),
        FieldRule::scaled(
            "roofing_squares",
            r"(?i)\b(\d[\d,]*(?:\.\d+)?)[ \t]+(?:roofing[ \t]+)?squares\b",
            100,
        ),
    ]
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i){}", DATE.as_str())).expect("date pattern"));
static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{3,}|\t").expect("gap pattern"));
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").expect("ordinal pattern"));

/// Rules for a field, in priority order.
pub fn rules(field: Field) -> &'static [FieldRule] {
    FIELD_RULES.get(&field).map(Vec::as_slice).unwrap_or(&[])
}

/// First non-empty value produced by the field's rules, or `""`.
pub fn extract_field(text: &str, field: Field) -> String {
    rules(field)
        .iter()
        .find_map(|rule| {
            let value = rule.apply(text)?;
            debug!(field = ?field, rule = rule.name, "Field rule matched");
            Some(value)
        })
        .unwrap_or_default()
}

/// Roof area in square feet, `0` when absent.
pub fn extract_roof_area(text: &str) -> u64 {
    ROOF_AREA_RULES
        .iter()
        .find_map(|rule| {
            let caps = rule.pattern.captures(text)?;
            let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            let area = (number * rule.multiplier as f64).round();
            if area < 1.0 {
                return None;
            }
            debug!(rule = rule.name, area, "Roof area matched");
            Some(area as u64)
        })
        .unwrap_or(0)
}

/// Extract every scalar field.
pub fn extract_fields(text: &str) -> ReportFields {
    ReportFields {
        property_name: extract_field(text, Field::PropertyName),
        address: extract_field(text, Field::Address),
        client: extract_field(text, Field::Client),
        property_manager_name: extract_field(text, Field::PropertyManagerName),
        property_manager_phone: extract_field(text, Field::PropertyManagerPhone),
        market: extract_field(text, Field::Market),
        report_type: extract_field(text, Field::ReportType),
        report_date: extract_field(text, Field::ReportDate),
        inspecting_company: extract_field(text, Field::InspectingCompany),
        roof_area: extract_roof_area(text),
        roof_system: extract_field(text, Field::RoofSystem),
        manufacturer: extract_field(text, Field::Manufacturer),
        warranty: extract_field(text, Field::Warranty),
        warranty_expiration: extract_field(text, Field::WarrantyExpiration),
        installing_contractor: extract_field(text, Field::InstallingContractor),
    }
}

/// Best-effort calendar date from free-text report date.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let found = DATE_RE.find(raw)?.as_str();
    let cleaned = ORDINAL.replace_all(found, "$1").replace(['.', ','], "");
    let cleaned = collapse_whitespace(&cleaned);

    const FORMATS: &[&str] = &[
        "%B %d %Y", "%b %d %Y", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Cut at the first column gap, collapse whitespace, strip trailing separators.
fn clean_value(raw: &str) -> String {
    let first_column = COLUMN_GAP.split(raw).next().unwrap_or("");
    let collapsed = collapse_whitespace(first_column);
    let trimmed = collapsed.trim_end_matches(|c: char| ",;:|-".contains(c) || c.is_whitespace());
    truncate_chars(trimmed, MAX_FIELD_LEN).trim_end().to_string()
}
