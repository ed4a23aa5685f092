//! Prompt text sent to the gateway.

use chrono::NaiveDate;
use homevault_types::ItemSnapshot;
use rust_decimal::Decimal;

/// Sentinel for an unset attribute.
const NOT_SET: &str = "לא הוגדר";

/// Sentinel for absent free text (manual link, notes).
const NONE: &str = "אין";

/// Fallback MIME type for images without one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// System prompt for photo identification.
pub const IDENTIFY_SYSTEM_PROMPT: &str = "אתה מזהה מוצרים בתמונות. כשמקבלים תמונה, תחזיר 3-5 הצעות לשם המוצר בעברית. השמות צריכים להיות תמציתיים וברורים, כמו: מקרר סמסונג, טלוויזיה LG 55 אינץ, מכונת כביסה בוש. אם אתה לא מצליח לזהות את המוצר, תחזיר מערך ריק.";

/// User text accompanying the photo.
pub const IDENTIFY_USER_PROMPT: &str = "מה המוצר בתמונה? תן 3-5 הצעות לשם.";

fn text_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

fn price(value: Option<Decimal>) -> String {
    match value {
        Some(p) if !p.is_zero() => format!("₪{}", p.normalize()),
        _ => NOT_SET.to_string(),
    }
}

fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| NOT_SET.to_string(), |d| d.to_string())
}

/// Render one numbered prompt line. `position` is 1-based.
pub fn render_item_line(position: usize, item: &ItemSnapshot) -> String {
    format!(
        "{position}. \"{name}\" | חדר: {room} | קטגוריה: {category} | מחיר: {price} | תאריך רכישה: {purchased} | אחריות עד: {warranty} | טלפון שירות: {phone} | הוראות: {manual} | הערות: {notes} | מזהה: {id}",
        name = item.name,
        room = text_or(item.room.as_deref(), NOT_SET),
        category = text_or(item.category.as_deref(), NOT_SET),
        price = price(item.purchase_price),
        purchased = date(item.purchase_date),
        warranty = date(item.warranty_end_date),
        phone = text_or(item.service_phone.as_deref(), NOT_SET),
        manual = text_or(item.manual_url.as_deref(), NONE),
        notes = text_or(item.notes.as_deref(), NONE),
        id = item.id,
    )
}

/// Render every item, one line each, in the given order.
pub fn render_items(items: &[ItemSnapshot]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| render_item_line(i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt for an inventory question asked on `today`.
pub fn ask_system_prompt(items: &[ItemSnapshot], today: NaiveDate) -> String {
    format!(
        "אתה עוזר חכם למערכת ניהול מוצרי בית. להלן רשימת המוצרים של המשתמש/ת:

{items}

כללים:
- ענה בעברית, בקצרה ובבהירות
- אם השאלה מתייחסת למוצר ספציפי, תן מידע רלוונטי
- אם יש כמה מוצרים שיכולים להתאים לשאלה ולא ברור לאיזה, תחזיר את התשובה עם רשימת המוצרים האפשריים בפורמט JSON מיוחד
- כשאתה מציין מוצרים אפשריים, הוסף בסוף התשובה שורה מיוחדת: [ITEMS:id1,id2,id3] עם המזהים
- אם השאלה לא קשורה למוצרים, ענה בנימוס שאתה עוזר רק לשאלות על מוצרי הבית
- התאריך היום: {today}",
        items = render_items(items),
        today = today.format("%Y-%m-%d"),
    )
}

/// `data:` URI for an inline base64 image.
pub fn image_data_uri(mime_type: Option<&str>, image_base64: &str) -> String {
    format!(
        "data:{};base64,{image_base64}",
        text_or(mime_type, DEFAULT_IMAGE_MIME)
    )
}
