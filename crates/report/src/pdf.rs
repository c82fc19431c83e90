//! PDF rendering of a stock summary.
//!
//! One detail line per count entry, a subtotal line per product, and a grand
//! total at the end — the same shape as the spreadsheet report.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use estoque_counts::StockSummary;

use crate::ReportError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP_Y: f32 = 270.0;
const BOTTOM_Y: f32 = 15.0;
const LINE_STEP: f32 = 6.0;

// Column x positions (mm): código, nome, lote, validade, quantidade.
const COLS: [f32; 5] = [15.0, 38.0, 110.0, 145.0, 178.0];

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "conteudo");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP_Y,
        })
    }

    fn next_line(&mut self) {
        self.y -= LINE_STEP;
        if self.y < BOTTOM_Y {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "conteudo");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP_Y + LINE_STEP;
        }
    }

    fn row(&mut self, cells: [&str; 5], bold: bool) {
        self.next_line();
        let font = if bold { &self.bold } else { &self.regular };
        for (text, x) in cells.iter().zip(COLS) {
            self.layer.use_text(*text, 9.0, Mm(x), Mm(self.y), font);
        }
    }

    fn text(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }
}

/// Render the summary as a PDF document.
pub fn render_pdf(summary: &StockSummary) -> Result<Vec<u8>, ReportError> {
    let mut w = PdfWriter::new("Relatório de Estoque")?;

    w.y = 282.0;
    w.text("Relatório de Estoque", 16.0, 70.0, true);
    w.y = 276.0;
    let generated = summary.generated_at.format("%d/%m/%Y %H:%M");
    w.text(&format!("Gerado em: {generated}"), 10.0, 75.0, false);
    w.y = 271.0;
    let filter = if summary.include_zero_stock {
        "Todos os itens"
    } else {
        "Apenas itens com estoque"
    };
    w.text(
        &format!("Detalhado por lote ({filter})"),
        10.0,
        70.0,
        false,
    );
    w.y = 266.0;

    w.row(["Código", "Nome do Produto", "Lote", "Validade", "Qtd"], true);

    for item in &summary.items {
        let code = item.product.code.as_str();
        if item.entries.is_empty() {
            w.row([code, item.product.name.as_str(), "-", "-", "0"], false);
        } else {
            for entry in &item.entries {
                w.row(
                    [
                        code,
                        item.product.name.as_str(),
                        entry.batch.as_str(),
                        &entry.expiry.to_string(),
                        &entry.quantity.to_string(),
                    ],
                    false,
                );
            }
        }
        w.row([code, "Subtotal", "", "", &item.total_quantity.to_string()], true);
    }

    w.row(
        ["", "TOTAL GERAL", "", "", &summary.total_quantity.to_string()],
        true,
    );

    Ok(w.doc.save_to_bytes()?)
}
