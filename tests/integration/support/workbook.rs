//! Minimal spreadsheet container builder for import tests.
//!
//! Produces just enough of an xlsx package for the import pipeline: one
//! worksheet with inline strings plus, when requested, a drawing part with
//! row-anchored pictures and their relationship entries.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

const WORKBOOK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>";

const WORKBOOK_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
</Relationships>";

pub struct WorkbookBuilder {
    rows: Vec<Vec<String>>,
    /// `(zero-based drawing anchor row, image bytes)` pairs.
    images: Vec<(u32, Vec<u8>)>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        let header = ["Question", "A", "B", "C", "D", "Answer"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            rows: vec![header],
            images: Vec::new(),
        }
    }

    /// Appends a data row with exactly four options.
    pub fn row(self, question: &str, options: [&str; 4], answer: &str) -> Self {
        let mut cells = vec![question.to_string()];
        cells.extend(options.iter().map(|o| o.to_string()));
        cells.push(answer.to_string());
        self.raw_row_owned(cells)
    }

    /// Appends a row with arbitrary cells (for malformed inputs).
    pub fn raw_row(self, cells: &[&str]) -> Self {
        self.raw_row_owned(cells.iter().map(|c| c.to_string()).collect())
    }

    fn raw_row_owned(mut self, cells: Vec<String>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Anchors `bytes` as a picture on the given one-based sheet row.
    pub fn image_at(mut self, sheet_row: u32, bytes: &[u8]) -> Self {
        self.images.push((sheet_row - 1, bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        entry(&mut zip, "[Content_Types].xml", self.content_types().as_bytes());
        entry(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes());
        entry(&mut zip, "xl/workbook.xml", WORKBOOK.as_bytes());
        entry(&mut zip, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes());
        entry(&mut zip, "xl/worksheets/sheet1.xml", self.sheet().as_bytes());
        if !self.images.is_empty() {
            entry(&mut zip, "xl/drawings/drawing1.xml", self.drawing().as_bytes());
            entry(
                &mut zip,
                "xl/drawings/_rels/drawing1.xml.rels",
                self.drawing_rels().as_bytes(),
            );
            for (idx, (_, bytes)) in self.images.iter().enumerate() {
                entry(&mut zip, &format!("xl/media/image{}.png", idx + 1), bytes);
            }
        }
        zip.finish().expect("failed to finish workbook").into_inner()
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Default Extension=\"png\" ContentType=\"image/png\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
        );
        if !self.images.is_empty() {
            xml.push_str(
                "<Override PartName=\"/xl/drawings/drawing1.xml\" \
                 ContentType=\"application/vnd.openxmlformats-officedocument.drawing+xml\"/>",
            );
        }
        xml.push_str("</Types>");
        xml
    }

    fn sheet(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
             <sheetData>",
        );
        for (row_idx, cells) in self.rows.iter().enumerate() {
            let row_number = row_idx + 1;
            xml.push_str(&format!("<row r=\"{row_number}\">"));
            for (col_idx, cell) in cells.iter().enumerate() {
                xml.push_str(&format!(
                    "<c r=\"{}{row_number}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    column_letter(col_idx),
                    escape(cell)
                ));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    fn drawing(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <xdr:wsDr xmlns:xdr=\"http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing\" \
             xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
        );
        for (idx, (anchor_row, _)) in self.images.iter().enumerate() {
            let id = idx + 1;
            xml.push_str(&format!(
                "<xdr:oneCellAnchor>\
                 <xdr:from><xdr:col>6</xdr:col><xdr:colOff>0</xdr:colOff>\
                 <xdr:row>{anchor_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>\
                 <xdr:ext cx=\"190500\" cy=\"190500\"/>\
                 <xdr:pic><xdr:nvPicPr><xdr:cNvPr id=\"{id}\" name=\"Picture {id}\"/><xdr:cNvPicPr/></xdr:nvPicPr>\
                 <xdr:blipFill><a:blip r:embed=\"rId{id}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>\
                 <xdr:spPr/></xdr:pic><xdr:clientData/>\
                 </xdr:oneCellAnchor>"
            ));
        }
        xml.push_str("</xdr:wsDr>");
        xml
    }

    fn drawing_rels(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for idx in 0..self.images.len() {
            let id = idx + 1;
            xml.push_str(&format!(
                "<Relationship Id=\"rId{id}\" \
                 Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" \
                 Target=\"../media/image{id}.png\"/>"
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

fn entry(zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]) {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)
        .unwrap_or_else(|e| panic!("failed to start zip entry {name}: {e}"));
    zip.write_all(data)
        .unwrap_or_else(|e| panic!("failed to write zip entry {name}: {e}"));
}

fn column_letter(index: usize) -> char {
    (b'A' + index as u8) as char
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
