//! Spreadsheet rendering for the viewing-record export.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};

use crm_core::serde::format_rfc3339_ms;
use crm_domain::viewing::ViewingStatus;

use crate::domain::types::{StatusCounts, ViewingRecord};

/// Column title and width.
const COLUMNS: [(&str, f64); 18] = [
    ("Tenant", 16.0),
    ("Primary phone", 16.0),
    ("Backup phone", 16.0),
    ("WeChat", 16.0),
    ("Viewing date", 18.0),
    ("Property", 20.0),
    ("Room address", 24.0),
    ("Preferred location", 20.0),
    ("Budget", 14.0),
    ("Requirements", 30.0),
    ("Status", 12.0),
    ("Business type", 14.0),
    ("Source", 12.0),
    ("Channel", 16.0),
    ("Agent", 14.0),
    ("Remarks", 30.0),
    ("Feedback", 30.0),
    ("Created at", 26.0),
];

const STATUS_COLUMN: u16 = 10;

fn status_color(status: ViewingStatus) -> Color {
    match status {
        ViewingStatus::Pending => Color::RGB(0xFFF2CC),
        ViewingStatus::Confirmed => Color::RGB(0xDDEBF7),
        ViewingStatus::Completed => Color::RGB(0xE2EFDA),
        ViewingStatus::Cancelled => Color::RGB(0xF2F2F2),
    }
}

fn status_format(status: ViewingStatus) -> Format {
    Format::new()
        .set_background_color(status_color(status))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
}

fn format_date(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Render `records` as an `.xlsx` workbook: styled header, colour-coded
/// status column, frozen header row and a summary block below the data.
pub fn render_viewing_records(
    records: &[ViewingRecord],
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x1F4E78))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let cell = Format::new().set_border(FormatBorder::Thin);
    let bold = Format::new().set_bold();
    let status_formats: Vec<(ViewingStatus, Format)> = ViewingStatus::ALL
        .into_iter()
        .map(|s| (s, status_format(s)))
        .collect();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Viewing records")?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    let mut counts = StatusCounts::default();
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        counts.add(record.viewing_status, 1);

        let values: [String; 18] = [
            record.tenant_name.clone(),
            record.primary_phone.clone().unwrap_or_default(),
            record.backup_phone.clone().unwrap_or_default(),
            record.wechat.clone().unwrap_or_default(),
            format_date(record.viewing_date),
            record.property_name.clone().unwrap_or_default(),
            record.room_address.clone().unwrap_or_default(),
            record.preferred_location.clone().unwrap_or_default(),
            record.budget_range.clone().unwrap_or_default(),
            record.requirements.clone().unwrap_or_default(),
            record.viewing_status.label().to_owned(),
            record.business_type.label().to_owned(),
            record.source.label().to_owned(),
            record.channel_name.clone().unwrap_or_default(),
            record.agent_name.clone().unwrap_or_default(),
            record.remarks.clone().unwrap_or_default(),
            record.viewing_feedback.clone().unwrap_or_default(),
            format_date(Some(record.created_at)),
        ];
        for (col, value) in values.into_iter().enumerate() {
            let col = col as u16;
            let format = if col == STATUS_COLUMN {
                status_formats
                    .iter()
                    .find(|(s, _)| *s == record.viewing_status)
                    .map(|(_, f)| f)
                    .unwrap_or(&cell)
            } else {
                &cell
            };
            sheet.write_string_with_format(row, col, value, format)?;
        }
    }

    if !records.is_empty() {
        let last_col = COLUMNS.len() as u16 - 1;
        sheet.autofilter(0, 0, records.len() as u32, last_col)?;
    }

    // Summary block, one blank row below the data.
    let mut row = records.len() as u32 + 2;
    sheet.write_string_with_format(row, 0, "Total", &bold)?;
    sheet.write_number(row, 1, counts.total() as f64)?;
    for status in ViewingStatus::ALL {
        row += 1;
        sheet.write_string(row, 0, status.label())?;
        sheet.write_number(row, 1, counts.get(status) as f64)?;
    }
    row += 1;
    sheet.write_string_with_format(row, 0, "Generated at", &bold)?;
    sheet.write_string(row, 1, format_rfc3339_ms(&generated_at))?;

    workbook.save_to_buffer()
}
