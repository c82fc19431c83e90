//! XLSX rendering of a stock summary, plus the import template.

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

use estoque_counts::StockSummary;

use crate::ReportError;

const HEADER_BG: Color = Color::RGB(0x366092);
const SUBTOTAL_BG: Color = Color::RGB(0xD9E2F3);
const TOTAL_BG: Color = Color::RGB(0xB4C6E7);

/// Render the summary as a two-sheet workbook: the detail table and an info
/// sheet with generation metadata.
pub fn render_excel(summary: &StockSummary) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();

    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(HEADER_BG)
        .set_align(FormatAlign::Center);
    let subtotal = Format::new().set_bold().set_background_color(SUBTOTAL_BG);
    let total = Format::new().set_bold().set_background_color(TOTAL_BG);

    let sheet = workbook.add_worksheet();
    sheet.set_name("Relatório de Estoque")?;

    for (col, title) in ["Código", "Nome do Produto", "Lote", "Validade", "Quantidade"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    let mut row: u32 = 1;
    for item in &summary.items {
        let code = item.product.code.as_str();
        if item.entries.is_empty() {
            sheet.write_string(row, 0, code)?;
            sheet.write_string(row, 1, item.product.name.as_str())?;
            sheet.write_string(row, 2, "-")?;
            sheet.write_string(row, 3, "-")?;
            sheet.write_number(row, 4, 0.0)?;
            row += 1;
        } else {
            for entry in &item.entries {
                sheet.write_string(row, 0, code)?;
                sheet.write_string(row, 1, item.product.name.as_str())?;
                sheet.write_string(row, 2, entry.batch.as_str())?;
                sheet.write_string(row, 3, &entry.expiry.to_string())?;
                sheet.write_number(row, 4, entry.quantity as f64)?;
                row += 1;
            }
        }

        sheet.write_string_with_format(row, 0, code, &subtotal)?;
        sheet.write_string_with_format(row, 1, "Subtotal", &subtotal)?;
        sheet.write_string_with_format(row, 2, "", &subtotal)?;
        sheet.write_string_with_format(row, 3, "", &subtotal)?;
        sheet.write_number_with_format(row, 4, item.total_quantity as f64, &subtotal)?;
        row += 1;
    }

    sheet.write_string_with_format(row, 0, "", &total)?;
    sheet.write_string_with_format(row, 1, "TOTAL GERAL", &total)?;
    sheet.write_string_with_format(row, 2, "", &total)?;
    sheet.write_string_with_format(row, 3, "", &total)?;
    sheet.write_number_with_format(row, 4, summary.total_quantity as f64, &total)?;

    sheet.set_column_width(0, 10)?;
    sheet.set_column_width(1, 40)?;
    sheet.set_column_width(2, 15)?;
    sheet.set_column_width(3, 12)?;
    sheet.set_column_width(4, 12)?;

    let info = workbook.add_worksheet();
    info.set_name("Informações")?;
    let title = Format::new().set_bold().set_font_size(14);
    let filter = if summary.include_zero_stock {
        "Todos os itens"
    } else {
        "Apenas itens com estoque"
    };
    info.write_string_with_format(0, 0, "Relatório de Estoque", &title)?;
    info.write_string(
        1,
        0,
        &format!("Gerado em: {}", summary.generated_at.format("%d/%m/%Y %H:%M")),
    )?;
    info.write_string(2, 0, &format!("Filtro: {filter}"))?;
    info.write_string(3, 0, &format!("Total de produtos: {}", summary.product_count))?;
    info.write_string(
        4,
        0,
        &format!("Total geral: {} unidades", summary.total_quantity),
    )?;
    info.set_column_width(0, 50)?;

    Ok(workbook.save_to_buffer()?)
}

/// Template workbook for the product bulk import (codigo/nome columns with
/// example rows).
pub fn import_template() -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.write_string_with_format(0, 0, "codigo", &header)?;
    sheet.write_string_with_format(0, 1, "nome", &header)?;
    for (i, (codigo, nome)) in [
        ("1", "PRODUTO EXEMPLO 1"),
        ("2", "PRODUTO EXEMPLO 2"),
        ("3", "PRODUTO EXEMPLO 3"),
    ]
    .iter()
    .enumerate()
    {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, *codigo)?;
        sheet.write_string(row, 1, *nome)?;
    }
    sheet.set_column_width(0, 10)?;
    sheet.set_column_width(1, 40)?;

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estoque_counts::{summarize, Batch, CountRecord, Expiry};
    use estoque_products::{Product, ProductCode, ProductName};

    #[test]
    fn renders_a_zip_container() {
        let product = Product::new(
            ProductCode::parse("7").unwrap(),
            ProductName::parse("Widget").unwrap(),
        );
        let count = CountRecord::new(
            product.id,
            Batch::parse("A1").unwrap(),
            Expiry::new(6, 2025).unwrap(),
            10,
        );
        let summary = summarize(vec![product], vec![count], true);
        let bytes = render_excel(&summary).unwrap();
        // XLSX is a zip archive.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn template_is_a_zip_container() {
        let bytes = import_template().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
