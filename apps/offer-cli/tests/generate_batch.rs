//! Price list in, one offer per variant out.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use offer_cli::{Batch, CompanyStore, Config};
use offer_engine::samples::write_sample_templates;
use offer_engine::TableSynthesisEngine;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;

const COMPANIES: &str = r#"{"companies": [
    {"id": "alpha", "name": "ООО «Альфа»", "inn": "7701234567", "address": "Москва",
     "phone": "+7 495 000-00-00", "ceo": "Иванов И.И."},
    {"id": "beta", "name": "ИП Бета", "inn": "500100732259", "address": "Тула",
     "phone": "", "ceo": "Бетов Б.Б."}
]}"#;

const CONFIG: &str = r#"
[[variants]]
company_id = "alpha"

[[variants]]
company_id = "beta"
percent_up = 10
rounding_step = 10
"#;

fn write_price_list(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["Наименование", "Кол-во", "Ед.", "Цена", "Сумма"].iter().enumerate() {
        sheet.write_string(2, col as u16, *header).unwrap();
    }
    sheet.write_string(3, 0, "Бумага А4").unwrap();
    sheet.write_number(3, 1, 2.0).unwrap();
    sheet.write_string(3, 2, "пачка").unwrap();
    sheet.write_number(3, 3, 300.0).unwrap();
    sheet.write_number(3, 4, 600.0).unwrap();
    sheet.write_string(4, 0, "Ручка").unwrap();
    sheet.write_number(4, 1, 10.0).unwrap();
    sheet.write_string(4, 2, "шт").unwrap();
    sheet.write_number(4, 3, 15.5).unwrap();
    workbook.save(path).unwrap();
}

fn cell(range: &calamine::Range<Data>, row: u32, col: u32) -> Data {
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

fn number(data: &Data) -> f64 {
    match data {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        other => panic!("expected a number, got {other:?}"),
    }
}

#[test]
fn test_price_list_to_spreadsheet_offers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("price.xlsx");
    write_price_list(&input);
    let companies = dir.path().join("companies.json");
    std::fs::write(&companies, COMPANIES).unwrap();
    let (_, xlsx_template) = write_sample_templates(&dir.path().join("templates")).unwrap();
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    let mut config = Config::from_str(CONFIG).unwrap();
    config.templates.xlsx = Some(xlsx_template);
    config.validate().unwrap();

    let store = CompanyStore::load(&companies).unwrap();
    let items = price_extract::read_items(&input, &config.vocabulary).unwrap();
    assert_eq!(items.len(), 2);

    let template = config.templates.source(None).unwrap();
    let engine = TableSynthesisEngine::new(config.vocabulary.clone(), config.vat_policy());
    let outputs = Batch {
        engine: &engine,
        store: &store,
        items: &items,
        template: &template,
        out_dir: &out_dir,
        timestamp: "20240501_101500".to_string(),
        seed: Some(1),
        parallel: true,
    }
    .run(&config.enabled_variants())
    .unwrap();

    let names: Vec<String> = outputs
        .iter()
        .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "КП_ООО_Альфа_20240501_101500_v1.xlsx".to_string(),
            "КП_ИП_Бета_20240501_101500_v2.xlsx".to_string(),
        ]
    );

    let mut workbook = open_workbook_auto(&outputs[0].path).unwrap();
    let range = workbook.worksheet_range("КП").unwrap();
    assert_eq!(cell(&range, 2, 0), Data::String("Компания: ООО «Альфа»".to_string()));
    assert_eq!(cell(&range, 10, 0), Data::String("Бумага А4".to_string()));
    assert_eq!(cell(&range, 11, 0), Data::String("Ручка".to_string()));
    assert_eq!(number(&cell(&range, 11, 4)), 155.0);
    assert_eq!(cell(&range, 12, 0), Data::String("Итого".to_string()));
    assert_eq!(number(&cell(&range, 12, 4)), 755.0);

    // 330 * 2 + 20 * 10 after a 10% markup rounded to tens
    let mut workbook = open_workbook_auto(&outputs[1].path).unwrap();
    let range = workbook.worksheet_range("КП").unwrap();
    assert_eq!(number(&cell(&range, 12, 4)), 860.0);
}

#[test]
fn test_unsupported_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("price.csv");
    std::fs::write(&input, "a;b").unwrap();
    let err = price_extract::read_items(&input, &Config::default().vocabulary).unwrap_err();
    assert!(err.to_string().contains("csv"));
}
