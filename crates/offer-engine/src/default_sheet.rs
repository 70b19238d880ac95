//! Built-in offer layout used when no template is configured.
//!
//! Positions are fixed, so no header discovery takes place.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};
use shared_types::{LineItem, PartyProfile};

use crate::error::OfferError;
use crate::placeholders::substitute;
use crate::vocabulary::{
    ADDRESS_TOKEN, COMPANY_NAME_TOKEN, PHONE_TOKEN, RESPONSIBLE_PERSON_TOKEN, TAX_ID_TOKEN,
};

pub const SHEET_NAME: &str = "КП";
pub const TITLE: &str = "Коммерческое предложение";
/// Zero-based row of the column headers (Excel row 10).
pub const HEADER_ROW: u32 = 9;
pub const HEADERS: [&str; 5] = ["Наименование", "Количество", "Ед. измерения", "Цена", "Сумма"];
pub const TOTAL_LABEL: &str = "Итого";

fn number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// A rendered default layout.
#[derive(Debug, Clone)]
pub struct DefaultSheet {
    pub bytes: Vec<u8>,
    /// Party block lines that had a placeholder filled.
    pub placeholders_replaced: usize,
    /// Zero-based row holding the total label and the grand total.
    pub total_row: usize,
}

/// Render the default layout: title, party block, header, one row per item and the total.
///
/// The grand total sits one blank row below the last item, in the amount column.
pub fn build_default_workbook(
    items: &[LineItem],
    profile: &PartyProfile,
    grand_total: Decimal,
) -> Result<DefaultSheet, OfferError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");
    let money_bold = Format::new().set_num_format("#,##0.00").set_bold();

    sheet.write_string_with_format(0, 0, TITLE, &bold)?;

    let party_lines = [
        format!("Компания: {COMPANY_NAME_TOKEN}"),
        format!("ИНН: {TAX_ID_TOKEN}"),
        format!("Адрес: {ADDRESS_TOKEN}"),
        format!("Телефон: {PHONE_TOKEN}"),
        format!("Руководитель: {RESPONSIBLE_PERSON_TOKEN}"),
    ];
    let mut placeholders_replaced = 0;
    for (offset, line) in party_lines.iter().enumerate() {
        let text = match substitute(line, profile) {
            Some(text) => {
                placeholders_replaced += 1;
                text
            }
            None => line.clone(),
        };
        sheet.write_string(2 + offset as u32, 0, &text)?;
    }

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(HEADER_ROW, col as u16, *header, &bold)?;
    }

    let mut row = HEADER_ROW + 1;
    for item in items {
        sheet.write_string(row, 0, item.name())?;
        sheet.write_number(row, 1, number(item.quantity()))?;
        sheet.write_string(row, 2, item.unit())?;
        sheet.write_number_with_format(row, 3, number(item.unit_price()), &money)?;
        sheet.write_number_with_format(row, 4, number(item.amount()), &money)?;
        row += 1;
    }

    let total_row = row + 1;
    sheet.write_string_with_format(total_row, 0, TOTAL_LABEL, &bold)?;
    sheet.write_number_with_format(total_row, 4, number(grand_total), &money_bold)?;

    sheet.set_column_width(0, 48)?;
    sheet.set_column_width(2, 14)?;
    sheet.set_column_width(3, 14)?;
    sheet.set_column_width(4, 16)?;

    Ok(DefaultSheet {
        bytes: workbook.save_to_buffer()?,
        placeholders_replaced,
        total_row: total_row as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholders::sample_profile;
    use crate::table::TableView;
    use crate::xlsx::XlsxWorkbook;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_layout_positions() {
        let items = vec![
            LineItem::new("Бумага", dec!(2), "пачка", dec!(300)).unwrap(),
            LineItem::new("Ручка", dec!(10), "шт", dec!(15.5)).unwrap(),
        ];
        let sheet = build_default_workbook(&items, &sample_profile(), dec!(755)).unwrap();
        assert_eq!(sheet.placeholders_replaced, 5);
        assert_eq!(sheet.total_row, 13);

        let mut workbook = XlsxWorkbook::from_bytes(&sheet.bytes).unwrap();
        let grid = workbook.grid().unwrap();
        assert_eq!(grid.cell_text(0, 0).as_deref(), Some(TITLE));
        assert_eq!(grid.cell_text(2, 0).as_deref(), Some("Компания: ООО «Ромашка»"));
        assert_eq!(grid.cell_text(6, 0).as_deref(), Some("Руководитель: Иванов И.И."));
        assert_eq!(grid.cell_text(9, 2).as_deref(), Some("Ед. измерения"));
        assert_eq!(grid.cell_text(10, 0).as_deref(), Some("Бумага"));
        assert_eq!(grid.cell_text(11, 4).as_deref(), Some("155"));
        assert_eq!(grid.cell_text(12, 0), None);
        assert_eq!(grid.cell_text(13, 0).as_deref(), Some(TOTAL_LABEL));
        assert_eq!(grid.cell_number(13, 4), Some(dec!(755)));
    }

    #[test]
    fn test_default_layout_without_items() {
        let sheet = build_default_workbook(&[], &sample_profile(), Decimal::ZERO).unwrap();
        assert_eq!(sheet.total_row, 11);
        let mut workbook = XlsxWorkbook::from_bytes(&sheet.bytes).unwrap();
        let grid = workbook.grid().unwrap();
        assert_eq!(grid.cell_text(11, 0).as_deref(), Some(TOTAL_LABEL));
    }
}
