use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "he")]
    Hebrew,
    #[serde(rename = "en")]
    English,
}

impl Locale {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "he" | "hebrew" | "he-il" => Ok(Self::Hebrew),
            "en" | "english" | "en-us" => Ok(Self::English),
            other => Err(anyhow!("invalid locale `{other}`: use `he` or `en`")),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Hebrew => "he",
            Self::English => "en",
        }
    }
}

const HEBREW_MONTHS: [&str; 12] = [
    "ינואר", "פברואר", "מרץ", "אפריל", "מאי", "יוני", "יולי", "אוגוסט", "ספטמבר", "אוקטובר",
    "נובמבר", "דצמבר",
];

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Display label for a month number, or the number itself outside 1..=12.
pub fn month_label(locale: Locale, month: u32) -> Cow<'static, str> {
    let table = match locale {
        Locale::Hebrew => &HEBREW_MONTHS,
        Locale::English => &ENGLISH_MONTHS,
    };
    match month {
        1..=12 => Cow::Borrowed(table[(month - 1) as usize]),
        _ => Cow::Owned(month.to_string()),
    }
}

/// Every user-visible status line the two components can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Notice {
    SiteTitle,
    LoadingYears,
    WrongPasscode,
    MissingFields,
    Uploading,
    UploadFailed,
    SaveFailed,
    Uploaded,
}

impl Notice {
    pub fn text(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Hebrew, Self::SiteTitle) => "רשת בני יוסף",
            (Locale::Hebrew, Self::LoadingYears) => "טוען שנים...",
            (Locale::Hebrew, Self::WrongPasscode) => "סיסמה שגויה",
            (Locale::Hebrew, Self::MissingFields) => "אנא מלא את כל השדות ובחר קובץ.",
            (Locale::Hebrew, Self::Uploading) => "מעלה קובץ...",
            (Locale::Hebrew, Self::UploadFailed) => "שגיאה בהעלאת הקובץ.",
            (Locale::Hebrew, Self::SaveFailed) => "שגיאה בשמירת הנתונים במסד.",
            (Locale::Hebrew, Self::Uploaded) => "העיתון הועלה בהצלחה!",
            (Locale::English, Self::SiteTitle) => "Bnei Yosef Network",
            (Locale::English, Self::LoadingYears) => "Loading years...",
            (Locale::English, Self::WrongPasscode) => "Wrong passcode",
            (Locale::English, Self::MissingFields) => "Please fill in all fields and choose a file.",
            (Locale::English, Self::Uploading) => "Uploading file...",
            (Locale::English, Self::UploadFailed) => "Error uploading the file.",
            (Locale::English, Self::SaveFailed) => "Error saving the record to the database.",
            (Locale::English, Self::Uploaded) => "The newspaper was uploaded successfully!",
        }
    }
}
