// The executive report. Assembled with lopdf in document-construction mode:
// a line-oriented layout on A4 pages with manual overflow.

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use snafu::prelude::*;

use crate::pipeline::io_common::truncate_chars;
use crate::pipeline::report::recommendations;
use crate::pipeline::*;
use initiative_scoring::{PriorityTier, ScoringResult};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 72;
const BOTTOM_MARGIN: i64 = 60;

const BODY_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

// Helvetica under WinAnsi covers the Latin-1 range of the survey text;
// anything beyond it degrades to a close ASCII stand-in.
fn pdf_text(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| {
            let cp = c as u32;
            if cp < 256 {
                cp as u8
            } else {
                match c {
                    '\u{2013}' | '\u{2014}' => b'-',
                    '\u{201c}' | '\u{201d}' => b'"',
                    '\u{2018}' | '\u{2019}' => b'\'',
                    _ => b'?',
                }
            }
        })
        .collect();
    Object::String(bytes, lopdf::StringFormat::Literal)
}

// Accumulates text lines into pages, breaking when the cursor reaches the
// bottom margin.
struct PageComposer {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl PageComposer {
    fn new() -> PageComposer {
        PageComposer {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn line(&mut self, font: &str, size: i64, indent: i64, text: &str) {
        if self.y < BOTTOM_MARGIN {
            self.break_page();
        }
        self.current.push(Operation::new("BT", vec![]));
        self.current
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.current.push(Operation::new(
            "Td",
            vec![(MARGIN + indent).into(), self.y.into()],
        ));
        self.current.push(Operation::new("Tj", vec![pdf_text(text)]));
        self.current.push(Operation::new("ET", vec![]));
        self.y -= size + 6;
    }

    fn gap(&mut self, dy: i64) {
        self.y -= dy;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn tier_row(result: &ScoringResult, tier: PriorityTier, note: &str) -> String {
    let breakdown = &result.tier_breakdown;
    format!(
        "{} priority: {} ({:.1}%)  -  {}",
        tier.label(),
        breakdown.count(tier),
        breakdown.percentage(tier),
        note
    )
}

fn compose(title: &str, result: &ScoringResult) -> Vec<Vec<Operation>> {
    let mut page = PageComposer::new();

    page.line(BOLD_FONT, 20, 0, "EXECUTIVE REPORT");
    page.line(BOLD_FONT, 14, 0, title);
    page.gap(8);
    page.line(
        BODY_FONT,
        11,
        0,
        &format!("Report date: {}", Local::now().format("%Y-%m-%d")),
    );
    page.gap(14);

    page.line(BOLD_FONT, 14, 0, "EXECUTIVE SUMMARY");
    page.gap(4);
    page.line(
        BODY_FONT,
        11,
        0,
        &format!(
            "Total initiatives: {}  -  mean score {:.2}/5.0",
            result.initiatives.len(),
            result.mean_score
        ),
    );
    page.line(
        BODY_FONT,
        11,
        0,
        &tier_row(result, PriorityTier::High, "for immediate implementation"),
    );
    page.line(
        BODY_FONT,
        11,
        0,
        &tier_row(result, PriorityTier::Medium, "need further analysis"),
    );
    page.line(
        BODY_FONT,
        11,
        0,
        &tier_row(result, PriorityTier::Low, "for long-term review"),
    );
    page.gap(14);

    page.line(BOLD_FONT, 14, 0, "TOP 5 RECOMMENDED INITIATIVES");
    page.gap(4);
    for (idx, s) in result.initiatives.iter().take(5).enumerate() {
        page.line(
            BOLD_FONT,
            12,
            0,
            &format!("{}. {}", idx + 1, s.record.initiative),
        );
        page.line(
            BODY_FONT,
            11,
            12,
            &format!("Proposed by: {} ({})", s.record.proposer, s.record.area),
        );
        page.line(
            BODY_FONT,
            11,
            12,
            &format!(
                "Score: {:.2}/5.0  -  Priority: {}  -  Quadrant: {}",
                s.weighted,
                s.tier.label(),
                s.quadrant.label()
            ),
        );
        if !s.record.problem.is_empty() {
            page.line(
                BODY_FONT,
                11,
                12,
                &format!("Problem addressed: {}", truncate_chars(&s.record.problem, 150)),
            );
        }
        if !s.record.proposal.is_empty() {
            page.line(
                BODY_FONT,
                11,
                12,
                &format!("Proposal: {}", truncate_chars(&s.record.proposal, 150)),
            );
        }
        page.gap(8);
    }
    page.gap(6);

    page.line(BOLD_FONT, 14, 0, "STRATEGIC RECOMMENDATIONS");
    page.gap(4);
    for rec in recommendations(result) {
        page.line(BODY_FONT, 11, 0, &format!("- {}", rec));
    }

    page.finish()
}

/// Writes the executive report for a scored result.
pub fn write_pdf_report(path: &str, title: &str, result: &ScoringResult) -> AnalysisResult<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            BODY_FONT => body_font_id,
            BOLD_FONT => bold_font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in compose(title, result) {
        let content = Content { operations };
        let encoded = content.encode().context(PdfBuildSnafu {})?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save(path)
        .map_err(lopdf::Error::from)
        .context(PdfBuildSnafu {})?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use initiative_scoring::{Builder, ScoringRules};

    fn sample_result() -> ScoringResult {
        let mut builder = Builder::new(&ScoringRules::DEFAULT_RULES)
            .unwrap()
            .headers(&[
                "proposer",
                "initiative",
                "area",
                "strategic_value",
                "impact",
                "feasibility",
                "cost_benefit",
                "innovation",
                "scalability",
                "implementation_time",
            ]);
        builder.add_row(&["Ana Garc\u{ed}a", "CRM con IA", "IT", "5", "5", "4", "4", "3", "3", "2"]);
        builder.score().unwrap()
    }

    #[test]
    fn writes_a_parsable_pdf() {
        let mut path = std::env::temp_dir();
        path.push(format!("inirank-test-{}-report.pdf", std::process::id()));
        let path_s = path.to_str().unwrap();
        write_pdf_report(path_s, "Innovation portfolio", &sample_result()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        // Round-trip through the library to make sure the structure holds.
        let doc = Document::load(path_s).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn non_latin_text_degrades_gracefully() {
        match pdf_text("ñ — ✅") {
            Object::String(bytes, _) => {
                assert_eq!(bytes, vec![0xf1, b' ', b'-', b' ', b'?']);
            }
            other => panic!("unexpected object {:?}", other),
        }
    }
}
