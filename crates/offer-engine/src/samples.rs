//! Sample templates shipped with the generator.
//!
//! Both carry the party placeholders, a goods header, one sample row and an "Итого" row,
//! which is everything the renderers expect from a template.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::OfferError;
use crate::package::{OfficePackage, CONTENT_TYPES_PART};
use crate::vocabulary::{
    ADDRESS_TOKEN, COMPANY_NAME_TOKEN, PHONE_TOKEN, RESPONSIBLE_PERSON_TOKEN, TAX_ID_TOKEN,
};

pub const DOCX_TEMPLATE_NAME: &str = "template_kp.docx";
pub const XLSX_TEMPLATE_NAME: &str = "template_kp.xlsx";

const DOCX_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const DOCX_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Wrap body XML (`w:` prefixed, without the `w:body` element) into a minimal docx package.
pub fn docx_package_from_body(body_xml: &str) -> OfficePackage {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
    );
    let mut package = OfficePackage::new();
    package.set_part(CONTENT_TYPES_PART, DOCX_CONTENT_TYPES.as_bytes().to_vec());
    package.set_part("_rels/.rels", DOCX_ROOT_RELS.as_bytes().to_vec());
    package.set_part("word/document.xml", document.into_bytes());
    package
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn paragraph(text: &str, centered: bool, bold: bool) -> String {
    let ppr = if centered {
        r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#
    } else {
        ""
    };
    if text.is_empty() {
        return format!("<w:p>{ppr}</w:p>");
    }
    let rpr = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:p>{ppr}<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

fn table_row(cells: &[&str], bold: bool) -> String {
    let cells: String = cells
        .iter()
        .map(|text| format!(r#"<w:tc><w:tcPr><w:tcW w:w="1870" w:type="dxa"/></w:tcPr>{}</w:tc>"#, paragraph(text, false, bold)))
        .collect();
    format!("<w:tr>{cells}</w:tr>")
}

/// Body of the sample Word template.
pub fn sample_docx_body() -> String {
    let mut body = String::new();
    body.push_str(&paragraph("Коммерческое предложение", true, true));
    body.push_str(&paragraph("", false, false));
    for line in [
        format!("Компания: {COMPANY_NAME_TOKEN}"),
        format!("ИНН: {TAX_ID_TOKEN}"),
        format!("Адрес: {ADDRESS_TOKEN}"),
        format!("Телефон: {PHONE_TOKEN}"),
        format!("Руководитель: {RESPONSIBLE_PERSON_TOKEN}"),
    ] {
        body.push_str(&paragraph(&line, false, false));
    }
    body.push_str(&paragraph("", false, false));

    let border = |side: &str| format!(r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#);
    let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .into_iter()
        .map(border)
        .collect();
    body.push_str(&format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>{borders}</w:tblBorders></w:tblPr><w:tblGrid>{}</w:tblGrid>"#,
        r#"<w:gridCol w:w="1870"/>"#.repeat(5)
    ));
    body.push_str(&table_row(
        &["Наименование", "Количество", "Ед. изм.", "Цена, руб", "Сумма, руб"],
        true,
    ));
    body.push_str(&table_row(&["Пример товара", "1", "шт", "100,00", "100,00"], false));
    body.push_str(&table_row(&["", "", "", "", ""], false));
    body.push_str(&table_row(&["Итого", "", "", "", "0,00"], true));
    body.push_str("</w:tbl>");
    body.push_str(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="850" w:bottom="1134" w:left="1701" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#);
    body
}

pub fn sample_docx_template() -> Result<Vec<u8>, OfferError> {
    docx_package_from_body(&sample_docx_body()).to_bytes()
}

pub fn sample_xlsx_template() -> Result<Vec<u8>, OfferError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("КП")?;

    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    sheet.write_string_with_format(0, 0, "Коммерческое предложение", &bold)?;
    sheet.write_string(2, 0, format!("Компания: {COMPANY_NAME_TOKEN}"))?;
    sheet.write_string(3, 0, format!("ИНН: {TAX_ID_TOKEN}"))?;
    sheet.write_string(4, 0, format!("Адрес: {ADDRESS_TOKEN}"))?;
    sheet.write_string(5, 0, format!("Телефон: {PHONE_TOKEN}"))?;
    sheet.write_string(6, 0, format!("Руководитель: {RESPONSIBLE_PERSON_TOKEN}"))?;

    for (col, header) in ["Наименование", "Количество", "Ед. измерения", "Цена", "Сумма"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(9, col as u16, *header, &bold)?;
    }
    sheet.write_string(10, 0, "Пример позиции")?;
    sheet.write_number(10, 1, 1.0)?;
    sheet.write_string(10, 2, "шт")?;
    sheet.write_number_with_format(10, 3, 100.0, &money)?;
    sheet.write_number_with_format(10, 4, 100.0, &money)?;
    sheet.write_string_with_format(11, 0, "Итого", &bold)?;
    sheet.write_number_with_format(11, 4, 0.0, &money)?;
    sheet.set_column_width(0, 48)?;

    Ok(workbook.save_to_buffer()?)
}

/// Write both sample templates into `dir`, creating it when needed.
pub fn write_sample_templates(dir: &Path) -> Result<(PathBuf, PathBuf), OfferError> {
    std::fs::create_dir_all(dir)?;
    let docx = dir.join(DOCX_TEMPLATE_NAME);
    let xlsx = dir.join(XLSX_TEMPLATE_NAME);
    std::fs::write(&docx, sample_docx_template()?)?;
    std::fs::write(&xlsx, sample_xlsx_template()?)?;
    info!(docx = %docx.display(), xlsx = %xlsx.display(), "sample templates written");
    Ok((docx, xlsx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::DocxDocument;
    use crate::table::TableView;
    use crate::xlsx::XlsxWorkbook;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_docx_structure() {
        let mut doc = DocxDocument::from_bytes(&sample_docx_template().unwrap()).unwrap();
        assert_eq!(doc.table_count(), 1);
        let table = doc.table_mut(0).unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.cell_text(3, 0).as_deref(), Some("Итого"));
        assert!(doc.body_text().contains("{{INN}}"));
    }

    #[test]
    fn test_sample_xlsx_structure() {
        let mut workbook = XlsxWorkbook::from_bytes(&sample_xlsx_template().unwrap()).unwrap();
        let grid = workbook.grid().unwrap();
        assert_eq!(grid.cell_text(9, 0).as_deref(), Some("Наименование"));
        assert_eq!(grid.cell_text(11, 0).as_deref(), Some("Итого"));
    }

    #[test]
    fn test_write_sample_templates() {
        let dir = tempfile::tempdir().unwrap();
        let (docx, xlsx) = write_sample_templates(&dir.path().join("templates")).unwrap();
        assert!(docx.ends_with(DOCX_TEMPLATE_NAME));
        assert!(xlsx.exists());
    }
}
